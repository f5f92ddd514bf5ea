//! 器件描述表
//!
//! Every device class is a plain struct carrying `#[derive(Device)]`; the
//! derive emits a static [`DeviceClass`] table (pins plus parameter
//! descriptors) and a typed constructor from a bound [`Element`].

use serde::{Serialize, Serializer};

use crate::{
    ast::{Ast, GroupKind, ListKind, UnaryOperator},
    error::{SpiceError, SpiceResult},
};

mod bind;
pub mod catalog;
mod registry;

pub use bind::bind_element;
pub use registry::{element_letter_meaning, DeviceRegistry, ElementData, ELEMENT_LETTERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinDefinition {
    pub position: usize,
    pub name: &'static str,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum ParameterKind {
    /// Supplied by position after the pins; `key_parameter` slots may be
    /// left out or given as `attribute=value` instead.
    Positional { position: usize, key_parameter: bool },
    /// `name=value`
    Keyword { spice_name: &'static str },
    /// Bare `name`
    Flag { spice_name: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Coercion {
    Float,
    Int,
    Bool,
    Text,
    Expression,
    Model,
    ElementName,
    FloatPair,
    FloatTriplet,
    InitialState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    /// Name of the field in the device struct.
    pub attribute: &'static str,
    pub kind: ParameterKind,
    pub coercion: Coercion,
    /// Default, written as SPICE source text.
    pub default: Option<&'static str>,
}

impl ParameterDescriptor {
    pub fn position(&self) -> Option<usize> {
        match self.kind {
            ParameterKind::Positional { position, .. } => Some(position),
            _ => None,
        }
    }

    pub fn is_positional(&self) -> bool {
        self.position().is_some()
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, ParameterKind::Flag { .. })
    }

    /// Whether a positional slot may be missing from the line.
    pub fn is_optional_positional(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::Positional {
                key_parameter: true,
                ..
            }
        )
    }

    /// Name this parameter answers to in `name=value` form.
    pub fn keyword(&self) -> Option<&'static str> {
        match self.kind {
            ParameterKind::Keyword { spice_name } => Some(spice_name),
            ParameterKind::Positional {
                key_parameter: true,
                ..
            } => Some(self.attribute),
            _ => None,
        }
    }

    pub fn flag_name(&self) -> Option<&'static str> {
        match self.kind {
            ParameterKind::Flag { spice_name } => Some(spice_name),
            _ => None,
        }
    }
}

/// 一个器件类的静态描述
#[derive(Debug, PartialEq, Serialize)]
pub struct DeviceClass {
    pub name: &'static str,
    pub letter: char,
    pub pins: &'static [PinDefinition],
    /// Any number of pins (subcircuit instances).
    pub variadic_pins: bool,
    pub parameters: &'static [ParameterDescriptor],
    /// Unknown `key=value` pairs are kept instead of rejected.
    pub open_keywords: bool,
    /// Surplus positionals fold into the last slot as source text
    /// (`V1 1 0 DC 5 AC 1`).
    pub merge_trailing: bool,
}

impl DeviceClass {
    pub fn required_pins(&self) -> usize {
        self.pins.iter().filter(|pin| !pin.optional).count()
    }

    pub fn max_pins(&self) -> usize {
        if self.variadic_pins {
            usize::MAX
        } else {
            self.pins.len()
        }
    }

    pub fn has_variable_pins(&self) -> bool {
        self.variadic_pins || self.pins.iter().any(|pin| pin.optional)
    }

    /// Positional descriptors in slot order.
    pub fn positionals(&self) -> Vec<&'static ParameterDescriptor> {
        let mut positionals = self
            .parameters
            .iter()
            .filter(|parameter| parameter.is_positional())
            .collect::<Vec<_>>();
        positionals.sort_by_key(|parameter| parameter.position());
        positionals
    }

    /// Positional slots that must be present.
    pub fn positional_min(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.is_positional() && !parameter.is_optional_positional())
            .count()
    }

    pub fn positional_max(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.is_positional())
            .count()
    }

    pub fn has_optionals(&self) -> bool {
        self.open_keywords
            || self
                .parameters
                .iter()
                .any(|parameter| !parameter.is_positional())
    }

    pub fn has_flag(&self) -> bool {
        self.parameters.iter().any(ParameterDescriptor::is_flag)
    }

    pub fn flag(&self, name: &str) -> Option<&'static ParameterDescriptor> {
        self.parameters
            .iter()
            .find(|parameter| parameter.flag_name().is_some_and(|flag| flag.eq_ignore_ascii_case(name)))
    }

    pub fn keyword(&self, name: &str) -> Option<&'static ParameterDescriptor> {
        self.parameters.iter().find(|parameter| {
            parameter
                .keyword()
                .is_some_and(|keyword| keyword.eq_ignore_ascii_case(name))
        })
    }
}

pub(crate) fn serialize_class_name<S: Serializer>(
    class: &&'static DeviceClass,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(class.name)
}

/// 经过检查和转换的参数值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    /// `{...}` or `'...'` kept as source text, evaluated by the simulator.
    Expression(String),
    List(Vec<ParameterValue>),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(value) => Some(*value),
            ParameterValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(text) | ParameterValue::Expression(text) => Some(text),
            _ => None,
        }
    }
}

fn literal_value(ast: &Ast) -> Option<f64> {
    match ast {
        Ast::Unary {
            op: UnaryOperator::Negation,
            operand,
        } => literal_value(operand).map(|value| -value),
        _ => ast.as_f64(),
    }
}

fn is_expression_group(ast: &Ast) -> bool {
    matches!(
        ast,
        Ast::Group {
            kind: GroupKind::Brace | GroupKind::Quote,
            ..
        }
    )
}

impl Coercion {
    /// Converts a value node. In `strict` mode expression groups are not
    /// accepted where a number is expected; class selection uses this to
    /// prefer behavioral classes for `{...}` values.
    pub fn coerce(&self, ast: &Ast, strict: bool) -> Result<ParameterValue, String> {
        let lenient_expression = !strict && is_expression_group(ast);
        match self {
            Coercion::Float => match literal_value(ast) {
                Some(value) => Ok(ParameterValue::Float(value)),
                None if lenient_expression => Ok(ParameterValue::Expression(ast.to_string())),
                None => Err("expected a number".to_string()),
            },
            Coercion::Int => match literal_value(ast) {
                Some(value) if value.fract() == 0.0 => Ok(ParameterValue::Int(value as i64)),
                Some(_) => Err("expected an integer".to_string()),
                None if lenient_expression => Ok(ParameterValue::Expression(ast.to_string())),
                None => Err("expected an integer".to_string()),
            },
            Coercion::Bool => match ast {
                Ast::Integer(0) => Ok(ParameterValue::Bool(false)),
                Ast::Integer(1) => Ok(ParameterValue::Bool(true)),
                Ast::Id(name) => match name.to_ascii_lowercase().as_str() {
                    "true" | "on" | "yes" => Ok(ParameterValue::Bool(true)),
                    "false" | "off" | "no" => Ok(ParameterValue::Bool(false)),
                    _ => Err("expected a boolean".to_string()),
                },
                _ => Err("expected a boolean".to_string()),
            },
            Coercion::Text | Coercion::Model | Coercion::ElementName => ast
                .leaf_text()
                .map(ParameterValue::Text)
                .ok_or_else(|| "expected a name".to_string()),
            Coercion::Expression => Ok(ParameterValue::Expression(ast.to_string())),
            Coercion::FloatPair => coerce_list(ast, 2),
            Coercion::FloatTriplet => coerce_list(ast, 3),
            Coercion::InitialState => match ast.as_id().map(str::to_ascii_lowercase).as_deref() {
                Some("on") => Ok(ParameterValue::Bool(true)),
                Some("off") => Ok(ParameterValue::Bool(false)),
                _ => Err("expected `on' or `off'".to_string()),
            },
        }
    }
}

fn coerce_list(ast: &Ast, len: usize) -> Result<ParameterValue, String> {
    let items = match ast {
        Ast::List {
            kind: ListKind::Comma,
            items,
        }
        | Ast::Tuple(items) => items,
        _ => return Err(format!("expected {} comma separated values", len)),
    };
    if items.len() != len {
        return Err(format!(
            "expected {} comma separated values, found {}",
            len,
            items.len()
        ));
    }
    items
        .iter()
        .map(|item| Coercion::Float.coerce(item, false))
        .collect::<Result<Vec<_>, _>>()
        .map(ParameterValue::List)
}

/// 绑定后的器件实例
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub letter: char,
    /// Name after the letter, `1` for `R1`.
    pub name: String,
    #[serde(serialize_with = "serialize_class_name")]
    pub class: &'static DeviceClass,
    /// Node names with the ground node already rewritten to `0`.
    pub nodes: Vec<String>,
    /// Coerced values keyed by attribute, in declaration order.
    pub parameters: Vec<(&'static str, ParameterValue)>,
    /// `key=value` pairs accepted by classes with open keywords.
    pub overrides: Vec<(String, Ast)>,
    /// Tokens that could not be assigned to any parameter.
    pub raw: Vec<String>,
}

impl Element {
    /// Full element name as written, e.g. `R1`.
    pub fn reference(&self) -> String {
        format!("{}{}", self.letter, self.name)
    }

    pub fn value(&self, attribute: &str) -> Option<&ParameterValue> {
        self.parameters
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, value)| value)
    }

    pub fn optional(&self, attribute: &str) -> Option<ParameterValue> {
        self.value(attribute).cloned()
    }

    pub fn required(&self, attribute: &str) -> SpiceResult<ParameterValue> {
        self.optional(attribute).ok_or_else(|| {
            SpiceError::parameter(
                self.class.name,
                attribute,
                self.reference(),
                "missing required parameter",
            )
        })
    }

    pub fn flag(&self, attribute: &str) -> bool {
        matches!(self.value(attribute), Some(ParameterValue::Bool(true)))
    }

    /// Model or subcircuit name, when the class has one.
    pub fn model(&self) -> Option<&str> {
        self.class
            .parameters
            .iter()
            .find(|parameter| matches!(parameter.coercion, Coercion::Model))
            .or_else(|| {
                self.class
                    .parameters
                    .iter()
                    .find(|parameter| parameter.attribute == "subcircuit_name")
            })
            .and_then(|parameter| self.value(parameter.attribute))
            .and_then(ParameterValue::as_str)
    }
}

/// A statically declared device class.
pub trait Device: Sized {
    fn class() -> &'static DeviceClass;

    /// Typed view of a bound element of this class.
    fn from_element(element: &Element) -> SpiceResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_expression;

    fn coerce(coercion: Coercion, text: &str, strict: bool) -> Result<ParameterValue, String> {
        coercion.coerce(&parse_expression(text).unwrap(), strict)
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce(Coercion::Float, "1k", true), Ok(ParameterValue::Float(1000.)));
        assert_eq!(coerce(Coercion::Float, "-5", true), Ok(ParameterValue::Float(-5.)));
        assert_eq!(coerce(Coercion::Int, "4", true), Ok(ParameterValue::Int(4)));
        assert!(coerce(Coercion::Int, "4.5", true).is_err());
        assert!(coerce(Coercion::Float, "abc", false).is_err());
    }

    #[test]
    fn test_coerce_expression_groups() {
        assert!(coerce(Coercion::Float, "{rval}", true).is_err());
        assert_eq!(
            coerce(Coercion::Float, "{rval*2}", false),
            Ok(ParameterValue::Expression("{rval * 2}".to_string()))
        );
        assert_eq!(
            coerce(Coercion::Expression, "v(a)*2", true),
            Ok(ParameterValue::Expression("v(a) * 2".to_string()))
        );
    }

    #[test]
    fn test_coerce_other() {
        assert_eq!(coerce(Coercion::Bool, "1", true), Ok(ParameterValue::Bool(true)));
        assert_eq!(coerce(Coercion::InitialState, "OFF", true), Ok(ParameterValue::Bool(false)));
        assert_eq!(
            coerce(Coercion::Model, "QMOD", true),
            Ok(ParameterValue::Text("QMOD".to_string()))
        );
        assert_eq!(
            coerce(Coercion::FloatPair, "(0.6, 5)", true),
            Ok(ParameterValue::List(vec![
                ParameterValue::Float(0.6),
                ParameterValue::Float(5.)
            ]))
        );
        assert!(coerce(Coercion::FloatTriplet, "(0.6, 5)", true).is_err());
    }
}
