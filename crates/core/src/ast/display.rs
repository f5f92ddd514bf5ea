//! 序列化回 SPICE 源码
//!
//! Re-parsing the output yields an equal tree.

use std::fmt::{self, Display, Formatter};

use super::{is_text_command, Ast};

fn join(f: &mut Formatter<'_>, items: &[Ast], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn command(f: &mut Formatter<'_>, name: &str, children: &[Ast]) -> fmt::Result {
    f.write_str(name)?;
    let text = is_text_command(name);
    let title = name.eq_ignore_ascii_case(".title");
    for child in children {
        match child {
            // free text goes back unquoted, paths with blanks quoted
            Ast::Text(raw) if text && (title || !raw.contains(char::is_whitespace)) => {
                write!(f, " {}", raw)?
            }
            _ => write!(f, " {}", child)?,
        }
    }
    Ok(())
}

impl Display for Ast {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Integer(value) => write!(f, "{}", value),
            Ast::Number(number) => write!(f, "{}", number),
            Ast::Id(name) => f.write_str(name),
            Ast::Text(text) => write!(f, "\"{}\"", text),
            Ast::Branch(name) => write!(f, "{}#branch", name),
            Ast::InnerParameter { device, parameter } => write!(f, "@{}[{}]", device, parameter),
            Ast::PortTypeModifier(port) => write!(f, "%{}", port),
            Ast::InvertedInput(inner) => write!(f, "~{}", inner),
            Ast::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Ast::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Ast::If {
                condition,
                then,
                otherwise,
            } => write!(f, "{} ? {} : {}", condition, then, otherwise),
            Ast::Group { kind, inner } => {
                let (open, close) = kind.delimiters();
                write!(f, "{}{}{}", open, inner, close)
            }
            Ast::List { kind, items } => join(f, items, kind.separator()),
            Ast::Tuple(items) => {
                f.write_str("(")?;
                join(f, items, ", ")?;
                f.write_str(")")
            }
            Ast::Function { name, arguments } => write!(f, "{}({})", name, arguments),
            Ast::PortModifierFunction { port, arguments } => {
                write!(f, "%{}({})", port, arguments)
            }
            Ast::PortModifierVector { port, arguments } => write!(f, "%{}[{}]", port, arguments),
            Ast::Set { key, value } => write!(f, "{}={}", key, value),
            Ast::Command { name, children } | Ast::DotCommand { name, children } => {
                command(f, name, children)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ast::{Ast, BinaryOperator, ListKind},
        value::Suffix,
    };

    #[test]
    fn test_display_expression() {
        let ast = Ast::brace(Ast::binary(
            BinaryOperator::Addition,
            Ast::number(5.0, Some(Suffix::Kilo)),
            Ast::binary(
                BinaryOperator::Multiplication,
                Ast::Integer(50),
                Ast::id("TEMPER"),
            ),
        ));
        assert_eq!(ast.to_string(), "{5k + 50 * TEMPER}");
    }

    #[test]
    fn test_display_command() {
        let ast = Ast::Command {
            name: "M1".to_string(),
            children: vec![
                Ast::id("d"),
                Ast::set(
                    Ast::id("ic"),
                    Ast::list(ListKind::Comma, vec![Ast::Integer(1), Ast::Integer(2)]),
                )
                .unwrap(),
            ],
        };
        assert_eq!(ast.to_string(), "M1 d ic=1, 2");

        let ast = Ast::DotCommand {
            name: ".include".to_string(),
            children: vec![Ast::text("models/bjt.lib")],
        };
        assert_eq!(ast.to_string(), ".include models/bjt.lib");

        let ast = Ast::DotCommand {
            name: ".lib".to_string(),
            children: vec![Ast::text("my lib.lib"), Ast::text("tt")],
        };
        assert_eq!(ast.to_string(), ".lib \"my lib.lib\" tt");
    }
}
