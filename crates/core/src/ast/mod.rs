//! 抽象语法树
//!
//! 每一条逻辑行解析为一个 [`Ast::Command`] 或 [`Ast::DotCommand`]。
//! 节点的子节点个数由变体固定，构造时检查。

use std::fmt;

use serde::Serialize;

use crate::{
    error::{SpiceError, SpiceResult},
    lexer::Token,
    value::{NumberParts, Suffix},
};

mod display;
pub mod operator;

pub use operator::{BinaryOperator, UnaryOperator};

/// Dot-commands whose argument is free text rather than an expression.
pub const TEXT_COMMANDS: [&str; 4] = [".title", ".include", ".inc", ".lib"];

pub fn is_text_command(name: &str) -> bool {
    TEXT_COMMANDS
        .iter()
        .any(|command| command.eq_ignore_ascii_case(name))
}

/// 带单位后缀的数字
///
/// 注意：相等不比较原始拼写
#[derive(Debug, Clone, Serialize)]
pub struct Number {
    /// Mantissa with the exponent applied.
    pub value: f64,
    pub suffix: Option<Suffix>,
    /// Decorative unit text after the suffix, e.g. `Hz`.
    pub unit: String,
    #[serde(skip)]
    raw: String,
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.suffix == other.suffix && self.unit == other.unit
    }
}

impl Number {
    pub fn new(value: f64, suffix: Option<Suffix>, unit: &str) -> Self {
        let raw = format!(
            "{}{}{}",
            value,
            suffix.map(|suffix| suffix.symbol()).unwrap_or_default(),
            unit
        );
        Self {
            value,
            suffix,
            unit: unit.to_string(),
            raw,
        }
    }

    pub fn from_parts(parts: &NumberParts, raw: &str) -> Self {
        Self {
            value: parts.base(),
            suffix: parts.suffix,
            unit: parts.trailing.clone(),
            raw: raw.to_string(),
        }
    }

    /// Value with the suffix applied.
    pub fn scaled(&self) -> f64 {
        match &self.suffix {
            Some(suffix) => suffix.value(self.value),
            None => self.value,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn negated(&self) -> Self {
        let raw = match self.raw.strip_prefix('-') {
            Some(raw) => raw.to_string(),
            None => format!("-{}", self.raw),
        };
        Self {
            value: -self.value,
            suffix: self.suffix,
            unit: self.unit.clone(),
            raw,
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::new(value, None, "")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    Parenthesis,
    Brace,
    Quote,
    Bracket,
}

impl GroupKind {
    pub fn delimiters(&self) -> (&'static str, &'static str) {
        match self {
            GroupKind::Parenthesis => ("(", ")"),
            GroupKind::Brace => ("{", "}"),
            GroupKind::Quote => ("'", "'"),
            GroupKind::Bracket => ("[", "]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListKind {
    Space,
    Comma,
}

impl ListKind {
    pub fn separator(&self) -> &'static str {
        match self {
            ListKind::Space => " ",
            ListKind::Comma => ", ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Ast {
    Integer(i64),
    Number(Number),
    Id(String),
    /// Quoted string (without the quotes) or free text.
    Text(String),
    /// `name#branch`
    Branch(String),
    /// `@device[parameter]`
    InnerParameter { device: String, parameter: String },
    /// `%name`
    PortTypeModifier(String),
    /// `~name` or `~number`
    InvertedInput(Box<Ast>),
    Unary {
        op: UnaryOperator,
        operand: Box<Ast>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    If {
        condition: Box<Ast>,
        then: Box<Ast>,
        otherwise: Box<Ast>,
    },
    Group {
        kind: GroupKind,
        inner: Box<Ast>,
    },
    List {
        kind: ListKind,
        items: Vec<Ast>,
    },
    /// `(a, b, ...)`
    Tuple(Vec<Ast>),
    Function {
        name: String,
        arguments: Box<Ast>,
    },
    PortModifierFunction {
        port: String,
        arguments: Box<Ast>,
    },
    PortModifierVector {
        port: String,
        arguments: Box<Ast>,
    },
    Set {
        key: Box<Ast>,
        value: Box<Ast>,
    },
    Command {
        name: String,
        children: Vec<Ast>,
    },
    DotCommand {
        name: String,
        children: Vec<Ast>,
    },
}

impl Ast {
    pub fn id(name: &str) -> Self {
        Ast::Id(name.to_string())
    }

    pub fn text(text: &str) -> Self {
        Ast::Text(text.to_string())
    }

    pub fn number(value: f64, suffix: Option<Suffix>) -> Self {
        Ast::Number(Number::new(value, suffix, ""))
    }

    /// Literal from an `Integer` or `Number` token.
    pub fn literal(token: &Token) -> Option<Self> {
        let parts = token.number.as_ref()?;
        Some(match parts.integer() {
            Some(value) => Ast::Integer(value),
            None => Ast::Number(Number::from_parts(parts, &token.raw)),
        })
    }

    pub fn unary(op: UnaryOperator, operand: Ast) -> Self {
        Ast::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, lhs: Ast, rhs: Ast) -> Self {
        Ast::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn conditional(condition: Ast, then: Ast, otherwise: Ast) -> Self {
        Ast::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Builds an operator node from its spelling, checking the operand count.
    ///
    /// `-` takes one or two operands, `?` takes three.
    pub fn operator(symbol: &str, operands: Vec<Ast>) -> SpiceResult<Self> {
        let found = operands.len();
        let arity = |expected: usize| SpiceError::Arity {
            node: symbol.to_string(),
            expected,
            found,
        };

        if symbol == "?" {
            let [condition, then, otherwise]: [Ast; 3] =
                operands.try_into().map_err(|_| arity(3))?;
            return Ok(Ast::conditional(condition, then, otherwise));
        }

        let unary = match symbol {
            "-" => Some(UnaryOperator::Negation),
            "!" => Some(UnaryOperator::Not),
            _ => None,
        };
        let binary = BinaryOperator::from_symbol(symbol);

        match (found, unary, binary) {
            (1, Some(op), _) => {
                let operand = operands.into_iter().next().ok_or_else(|| arity(1))?;
                Ok(Ast::unary(op, operand))
            }
            (2, _, Some(op)) => {
                let mut operands = operands.into_iter();
                match (operands.next(), operands.next()) {
                    (Some(lhs), Some(rhs)) => Ok(Ast::binary(op, lhs, rhs)),
                    _ => Err(arity(2)),
                }
            }
            (_, _, Some(_)) => Err(arity(2)),
            (_, Some(_), None) => Err(arity(1)),
            (_, None, None) => Err(SpiceError::Syntax {
                reason: format!("unknown operator `{}'", symbol),
                position: None,
            }),
        }
    }

    pub fn group(kind: GroupKind, inner: Ast) -> Self {
        Ast::Group {
            kind,
            inner: Box::new(inner),
        }
    }

    pub fn brace(inner: Ast) -> Self {
        Ast::group(GroupKind::Brace, inner)
    }

    /// `[...]` group; the items go through [`repair_vector`] first.
    pub fn bracket(items: Vec<Ast>) -> Self {
        Ast::group(
            GroupKind::Bracket,
            Ast::list(ListKind::Space, repair_vector(items)),
        )
    }

    pub fn list(kind: ListKind, items: Vec<Ast>) -> Self {
        Ast::List { kind, items }
    }

    pub fn function(name: &str, arguments: Ast) -> Self {
        Ast::Function {
            name: name.to_string(),
            arguments: Box::new(arguments),
        }
    }

    /// `key = value`, where the key is an identifier, a function form
    /// such as `v(out)`, or the `{expr}` of a `TABLE` form.
    pub fn set(key: Ast, value: Ast) -> SpiceResult<Self> {
        match key {
            Ast::Id(_)
            | Ast::Function { .. }
            | Ast::Group {
                kind: GroupKind::Brace,
                ..
            } => Ok(Ast::Set {
                key: Box::new(key),
                value: Box::new(value),
            }),
            _ => Err(SpiceError::Syntax {
                reason: format!("`{}' cannot be assigned", key),
                position: None,
            }),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Ast::Integer(_) | Ast::Number(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Ast::Set { .. })
    }

    pub fn as_id(&self) -> Option<&str> {
        match self {
            Ast::Id(name) => Some(name),
            _ => None,
        }
    }

    /// Numeric value of a literal, suffix applied.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Ast::Integer(value) => Some(*value as f64),
            Ast::Number(number) => Some(number.scaled()),
            _ => None,
        }
    }

    /// Source spelling of a leaf usable as a name (node, model, device).
    pub fn leaf_text(&self) -> Option<String> {
        match self {
            Ast::Id(name) | Ast::Text(name) => Some(name.clone()),
            Ast::Integer(value) => Some(value.to_string()),
            Ast::Number(number) => Some(number.raw().to_string()),
            _ => None,
        }
    }

    /// Key of a `Set` node as written (`ic`, `v(out)`).
    pub fn key_name(&self) -> Option<String> {
        match self {
            Ast::Set { key, .. } => match key.as_ref() {
                Ast::Id(name) => Some(name.clone()),
                other => Some(other.to_string()),
            },
            _ => None,
        }
    }

    /// Name of a `Command`/`DotCommand` root.
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Ast::Command { name, .. } | Ast::DotCommand { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Children of a `Command`/`DotCommand` root.
    pub fn children(&self) -> &[Ast] {
        match self {
            Ast::Command { children, .. } | Ast::DotCommand { children, .. } => children,
            _ => &[],
        }
    }

    /// Negates a literal in place of its source form.
    fn negated_literal(&self) -> Option<Ast> {
        match self {
            Ast::Integer(value) => Some(match value.checked_neg() {
                Some(value) => Ast::Integer(value),
                None => Ast::Number(Number::from(-(*value as f64))),
            }),
            Ast::Number(number) => Some(Ast::Number(number.negated())),
            _ => None,
        }
    }
}

/// `a - b - c` with literal operands only, flattened to `[a, -b, -c]`.
fn flatten_negated(node: &Ast) -> Option<Vec<Ast>> {
    match node {
        Ast::Integer(_) | Ast::Number(_) => Some(vec![node.clone()]),
        Ast::Binary {
            op: BinaryOperator::Subtraction,
            lhs,
            rhs,
        } => {
            let mut items = flatten_negated(lhs)?;
            items.push(rhs.negated_literal()?);
            Some(items)
        }
        _ => None,
    }
}

/// 方括号内的向量修复
///
/// Whitespace does not separate tokens from the grammar's point of view, so
/// `[0.1 -0.2]` reads as `[0.1 - 0.2]`. Subtraction chains made only of
/// numeric literals are split back into separate, negated items. Anything
/// else is left alone.
pub fn repair_vector(items: Vec<Ast>) -> Vec<Ast> {
    let mut repaired = Vec::with_capacity(items.len());
    for item in items {
        let flattened = match &item {
            Ast::Binary {
                op: BinaryOperator::Subtraction,
                ..
            } => flatten_negated(&item),
            _ => None,
        };
        match flattened {
            Some(flattened) => repaired.extend(flattened),
            None => repaired.push(item),
        }
    }
    repaired
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_arity() {
        assert_eq!(
            Ast::operator("-", vec![Ast::Integer(1)]),
            Ok(Ast::unary(UnaryOperator::Negation, Ast::Integer(1)))
        );
        assert_eq!(
            Ast::operator("^", vec![Ast::Integer(2), Ast::Integer(3)]),
            Ok(Ast::binary(
                BinaryOperator::Power,
                Ast::Integer(2),
                Ast::Integer(3)
            ))
        );
        assert!(matches!(
            Ast::operator("*", vec![Ast::Integer(2)]),
            Err(SpiceError::Arity {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            Ast::operator("!", vec![Ast::Integer(2), Ast::Integer(3)]),
            Err(SpiceError::Arity { expected: 1, .. })
        ));
        assert!(matches!(
            Ast::operator("?", vec![Ast::Integer(2)]),
            Err(SpiceError::Arity { expected: 3, .. })
        ));
        assert!(Ast::operator("?", vec![Ast::id("a"), Ast::Integer(1), Ast::Integer(0)]).is_ok());
    }

    #[test]
    fn test_set_key() {
        assert!(Ast::set(Ast::id("ic"), Ast::Integer(0)).is_ok());
        assert!(Ast::set(
            Ast::function("v", Ast::list(ListKind::Comma, vec![Ast::id("out")])),
            Ast::Integer(0)
        )
        .is_ok());
        assert!(Ast::set(Ast::Integer(1), Ast::Integer(0)).is_err());
    }

    #[test]
    fn test_number_equality_ignores_spelling() {
        let a = Number::from_parts(
            &crate::value::number_literal("0.10").unwrap().1,
            "0.10",
        );
        assert_eq!(a, Number::from(0.1));
        assert_eq!(a.raw(), "0.10");
        assert_eq!(a.negated().raw(), "-0.10");
        assert_eq!(a.negated().negated().raw(), "0.10");
        assert_eq!(Number::from(50.0).raw(), "50");
        assert_eq!(Number::new(2.5, Some(Suffix::Micro), "F").raw(), "2.5uF");
        assert_eq!(Ast::number(5.0, Some(Suffix::Kilo)).to_string(), "5k");
    }

    #[test]
    fn test_repair_vector() {
        let chain = Ast::binary(
            BinaryOperator::Subtraction,
            Ast::binary(
                BinaryOperator::Subtraction,
                Ast::Integer(1),
                Ast::Integer(2),
            ),
            Ast::number(3.0, Some(Suffix::Milli)),
        );
        assert_eq!(
            repair_vector(vec![Ast::id("a"), chain]),
            vec![
                Ast::id("a"),
                Ast::Integer(1),
                Ast::Integer(-2),
                Ast::number(-3.0, Some(Suffix::Milli)),
            ]
        );

        // a non-literal operand keeps the subtraction
        let mixed = Ast::binary(BinaryOperator::Subtraction, Ast::id("a"), Ast::Integer(1));
        assert_eq!(repair_vector(vec![mixed.clone()]), vec![mixed]);
    }
}
