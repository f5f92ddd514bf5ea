use serde::Serialize;

use crate::lexer::TokenKind;

/// 一元运算符，优先级最高
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Negation,
    Not,
}

impl UnaryOperator {
    pub const PRECEDENCE: u8 = 7;

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negation => "-",
            UnaryOperator::Not => "!",
        }
    }

    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Minus => Some(UnaryOperator::Negation),
            TokenKind::Not => Some(UnaryOperator::Not),
            _ => None,
        }
    }
}

/// 二元运算符
///
/// Precedence, lowest first: `||`, `&&`, comparisons, `+ -`,
/// `* / % \`, power. The ternary sits below all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    IntegerDivision,
    Power,
}

impl BinaryOperator {
    pub const LOWEST: u8 = 1;
    pub const HIGHEST: u8 = 6;

    pub fn precedence(&self) -> u8 {
        use BinaryOperator::*;
        match self {
            Or => 1,
            And => 2,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => 3,
            Addition | Subtraction => 4,
            Multiplication | Division | Modulo | IntegerDivision => 5,
            Power => 6,
        }
    }

    /// Comparisons do not chain.
    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }

    pub fn symbol(&self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Or => "||",
            And => "&&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Addition => "+",
            Subtraction => "-",
            Multiplication => "*",
            Division => "/",
            Modulo => "%",
            IntegerDivision => "\\",
            Power => "**",
        }
    }

    pub fn from_token(kind: TokenKind) -> Option<Self> {
        use BinaryOperator::*;
        let op = match kind {
            TokenKind::Or => Or,
            TokenKind::And => And,
            TokenKind::Equal => Equal,
            TokenKind::NotEqual => NotEqual,
            TokenKind::Less => Less,
            TokenKind::LessEqual => LessEqual,
            TokenKind::Greater => Greater,
            TokenKind::GreaterEqual => GreaterEqual,
            TokenKind::Plus => Addition,
            TokenKind::Minus => Subtraction,
            TokenKind::Multiply => Multiplication,
            TokenKind::Divide => Division,
            TokenKind::Modulo => Modulo,
            TokenKind::IntDivide => IntegerDivision,
            TokenKind::Power => Power,
            _ => return None,
        };
        Some(op)
    }

    /// Looks up an operator by its source spelling; `^` is power too.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOperator::*;
        [
            Or,
            And,
            Equal,
            NotEqual,
            Less,
            LessEqual,
            Greater,
            GreaterEqual,
            Addition,
            Subtraction,
            Multiplication,
            Division,
            Modulo,
            IntegerDivision,
            Power,
        ]
        .into_iter()
        .find(|op| op.symbol() == symbol)
        .or_else(|| (symbol == "^").then_some(Power))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ladder() {
        assert!(BinaryOperator::Or.precedence() < BinaryOperator::And.precedence());
        assert!(BinaryOperator::And.precedence() < BinaryOperator::Less.precedence());
        assert!(BinaryOperator::Less.precedence() < BinaryOperator::Addition.precedence());
        assert!(
            BinaryOperator::Subtraction.precedence() < BinaryOperator::IntegerDivision.precedence()
        );
        assert!(BinaryOperator::Modulo.precedence() < BinaryOperator::Power.precedence());
        assert!(BinaryOperator::Power.precedence() < UnaryOperator::PRECEDENCE);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(BinaryOperator::from_symbol("^"), Some(BinaryOperator::Power));
        assert_eq!(BinaryOperator::from_symbol("**"), Some(BinaryOperator::Power));
        assert_eq!(BinaryOperator::from_symbol("\\"), Some(BinaryOperator::IntegerDivision));
        assert_eq!(BinaryOperator::from_symbol("=="), Some(BinaryOperator::Equal));
        assert_eq!(BinaryOperator::from_symbol("="), None);
    }
}
