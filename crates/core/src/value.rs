//! Numeric literals with engineering suffixes.
//!
//! `<mantissa>[e[+-]<exp>]<suffix>?<trailing-letters>?`, case-insensitive.
//! Everything after the suffix is decorative unit text (`10kHz`).

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{opt, recognize, value},
    sequence::{pair, tuple},
    IResult, Parser,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Suffix {
    Tera,
    Giga,
    /// `meg` suffix in spice.
    Mega,
    Kilo,
    Mil,
    /// `m` suffix in spice.
    Milli,
    Micro,
    Nano,
    Pico,
    Femto,
}

impl Suffix {
    pub fn factor(&self) -> f64 {
        match self {
            Suffix::Tera => 1e12,
            Suffix::Giga => 1e9,
            Suffix::Mega => 1e6,
            Suffix::Kilo => 1e3,
            Suffix::Mil => 25.4e-6,
            Suffix::Milli => 1e-3,
            Suffix::Micro => 1e-6,
            Suffix::Nano => 1e-9,
            Suffix::Pico => 1e-12,
            Suffix::Femto => 1e-15,
        }
    }

    pub fn value(&self, coeff: f64) -> f64 {
        self.factor() * coeff
    }

    /// Canonical spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            Suffix::Tera => "T",
            Suffix::Giga => "G",
            Suffix::Mega => "Meg",
            Suffix::Kilo => "k",
            Suffix::Mil => "mil",
            Suffix::Milli => "m",
            Suffix::Micro => "u",
            Suffix::Nano => "n",
            Suffix::Pico => "p",
            Suffix::Femto => "f",
        }
    }
}

/// 数字字面量的分解形式
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberParts {
    pub mantissa: String,
    pub exponent: Option<String>,
    pub suffix: Option<Suffix>,
    pub trailing: String,
}

impl NumberParts {
    /// Mantissa with the exponent applied, suffix not applied.
    pub fn base(&self) -> f64 {
        let text = match &self.exponent {
            Some(exponent) => format!("{}{}", self.mantissa, exponent),
            None => self.mantissa.clone(),
        };
        // the grammar only admits digits, one dot and a well-formed exponent
        text.parse().unwrap_or(f64::NAN)
    }

    /// Value scaled by the suffix.
    pub fn value(&self) -> f64 {
        match &self.suffix {
            Some(suffix) => suffix.value(self.base()),
            None => self.base(),
        }
    }

    /// Integral value, when the literal is a plain integer.
    pub fn integer(&self) -> Option<i64> {
        if self.exponent.is_none()
            && self.suffix.is_none()
            && self.trailing.is_empty()
            && !self.mantissa.contains('.')
        {
            self.mantissa.parse().ok()
        } else {
            None
        }
    }
}

fn parse_mantissa(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((digit1, char('.'), digit0))),
        recognize(pair(char('.'), digit1)),
        digit1,
    ))
    .parse(input)
}

fn parse_exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1))).parse(input)
}

/// `meg` and `mil` must be tried before `m`.
fn parse_suffix(input: &str) -> IResult<&str, Suffix> {
    alt((
        value(Suffix::Mega, tag_no_case("meg")),
        value(Suffix::Mil, tag_no_case("mil")),
        value(Suffix::Tera, tag_no_case("t")),
        value(Suffix::Giga, tag_no_case("g")),
        value(Suffix::Kilo, tag_no_case("k")),
        value(Suffix::Milli, tag_no_case("m")),
        value(Suffix::Micro, tag_no_case("u")),
        value(Suffix::Nano, tag_no_case("n")),
        value(Suffix::Pico, tag_no_case("p")),
        value(Suffix::Femto, tag_no_case("f")),
    ))
    .parse(input)
}

/// Parses the longest numeric literal at the start of `input`.
pub fn number_literal(input: &str) -> IResult<&str, NumberParts> {
    let (rest, (mantissa, exponent, suffix, trailing)) = tuple((
        parse_mantissa,
        opt(parse_exponent),
        opt(parse_suffix),
        take_while(|c: char| c.is_ascii_alphabetic()),
    ))
    .parse(input)?;

    Ok((
        rest,
        NumberParts {
            mantissa: mantissa.to_string(),
            exponent: exponent.map(str::to_string),
            suffix,
            trailing: trailing.to_string(),
        },
    ))
}

/// Reads a whole string as a number, e.g. `"1.5Meg"`; `None` if anything is
/// left over.
pub fn to_number(text: &str) -> Option<f64> {
    match number_literal(text) {
        Ok(("", parts)) => Some(parts.value()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_number() {
        assert_eq!(to_number("32k"), Some(32000.));
        // 科学计数法+后缀
        assert_eq!(to_number("32e3m"), Some(32.));
        // 易混淆：Meg (1e6) 和 m (1e-3)
        assert_eq!(to_number("1meg"), Some(1e6));
        assert_eq!(to_number("1m"), Some(1e-3));
        assert_eq!(to_number("1mil"), Some(25.4e-6));
        assert_eq!(to_number("2.5n"), Some(2.5e-9));
        assert_eq!(to_number("5Meg"), Some(5e6));
    }

    #[test]
    fn test_number_double() {
        assert_eq!(to_number("1"), Some(1.));
        assert_eq!(to_number(".1"), Some(0.1));
        assert_eq!(to_number("1."), Some(1.));
        assert_eq!(to_number("1.e2"), Some(100.));
    }

    /// 数字解析器不区分大小写。
    #[test]
    fn test_number_case_insensitive() {
        assert_eq!(to_number("1.5MEgohM"), Some(1.5e6));
        assert_eq!(to_number("1.5M"), Some(1.5e-3));
    }

    #[test]
    fn test_number_with_garbage() {
        assert_eq!(to_number("1.5mohm"), Some(1.5e-3));
        assert_eq!(to_number("1.5megohm"), Some(1.5e6));
        assert_eq!(to_number("1.5ohm"), Some(1.5));
        assert_eq!(to_number("1.5_ohm"), None);
    }

    #[test]
    fn test_decomposition() {
        let (rest, parts) = number_literal("10kHz rest").unwrap();
        assert_eq!(rest, " rest");
        assert_eq!(parts.mantissa, "10");
        assert_eq!(parts.suffix, Some(Suffix::Kilo));
        assert_eq!(parts.trailing, "Hz");
        assert_eq!(parts.value(), 10e3);
        assert_eq!(parts.integer(), None);

        let (_, parts) = number_literal("10").unwrap();
        assert_eq!(parts.integer(), Some(10));

        // dangling exponent marker is unit text
        let (_, parts) = number_literal("1eV").unwrap();
        assert_eq!(parts.exponent, None);
        assert_eq!(parts.trailing, "eV");

        let (_, parts) = number_literal("1e-3").unwrap();
        assert_eq!(parts.exponent.as_deref(), Some("e-3"));
        assert_eq!(parts.integer(), None);
    }
}
