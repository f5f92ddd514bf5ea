//! Spice 词法解析器
//!
//! 只处理一条逻辑行；续行和注释由 [`crate::source`] 预先处理。

use serde::Serialize;

use crate::{
    error::{SpiceError, SpiceResult},
    value::{number_literal, NumberParts},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Id,
    DotCommand,
    Integer,
    Number,
    String,
    Power,
    Multiply,
    Divide,
    Modulo,
    IntDivide,
    Plus,
    Minus,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
    Question,
    Colon,
    Set,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Quote,
    At,
    Tilde,
    Branch,
}

/// 源代码中的片段
///
/// 注意：相等只比较类型和字符串内容
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    /// Byte span inside the line.
    pub column: (usize, usize),
    /// Decomposed form, only for `Integer` and `Number`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<NumberParts>,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.raw == other.raw
    }
}

impl Token {
    pub fn new(kind: TokenKind, raw: &str, column: (usize, usize)) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            column,
            number: None,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Integer | TokenKind::Number)
    }
}

/// 两个字符的运算符必须先于单字符匹配
const DOUBLE_OPERATORS: [(&str, TokenKind); 7] = [
    ("**", TokenKind::Power),
    ("==", TokenKind::Equal),
    ("!=", TokenKind::NotEqual),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
];

const BRANCH: &str = "#branch";

fn single_operator(c: char) -> Option<TokenKind> {
    let kind = match c {
        '^' => TokenKind::Power,
        '*' => TokenKind::Multiply,
        '/' => TokenKind::Divide,
        '%' => TokenKind::Modulo,
        '\\' => TokenKind::IntDivide,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        '=' => TokenKind::Set,
        '!' => TokenKind::Not,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        ',' => TokenKind::Comma,
        '\'' => TokenKind::Quote,
        '@' => TokenKind::At,
        '~' => TokenKind::Tilde,
        '&' => TokenKind::And,
        '|' => TokenKind::Or,
        _ => return None,
    };
    Some(kind)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `[A-Za-z_0-9]+(\.[A-Za-z_0-9.]+)?`
fn identifier_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && is_word(bytes[i]) {
        i += 1;
    }
    if i == 0 {
        return 0;
    }
    if i + 1 < bytes.len() && bytes[i] == b'.' && (is_word(bytes[i + 1]) || bytes[i + 1] == b'.')
    {
        i += 1;
        while i < bytes.len() && (is_word(bytes[i]) || bytes[i] == b'.') {
            i += 1;
        }
    }
    i
}

/// Spice 词法解析器
///
/// ```
/// use spice_netlist_core::lexer::{Lexer, TokenKind};
///
/// let kinds = Lexer::new("key=10kHz")
///     .map(|token| token.map(|token| token.kind))
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(kinds, vec![TokenKind::Id, TokenKind::Set, TokenKind::Number]);
/// ```
pub struct Lexer<'a> {
    text: &'a str,
    offset: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            failed: false,
        }
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.offset;
        self.offset += len;
        Token::new(kind, &self.text[start..self.offset], (start, self.offset))
    }

    fn fail(&mut self, character: char, offset: usize) -> SpiceError {
        self.failed = true;
        SpiceError::Lex { character, offset }
    }

    /// Identifier or numeric literal, whichever is longer; numbers win ties.
    fn word(&mut self, rest: &str) -> Option<Token> {
        let ident = identifier_len(rest);
        let starts_number = rest.starts_with(|c: char| c.is_ascii_digit())
            || (rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()));

        if starts_number {
            if let Ok((remain, parts)) = number_literal(rest) {
                let len = rest.len() - remain.len();
                if len >= ident {
                    let kind = if parts.integer().is_some() {
                        TokenKind::Integer
                    } else {
                        TokenKind::Number
                    };
                    let mut token = self.token(kind, len);
                    token.number = Some(parts);
                    return Some(token);
                }
            }
        }

        if ident > 0 {
            Some(self.token(TokenKind::Id, ident))
        } else {
            None
        }
    }

    fn string(&mut self, rest: &str) -> SpiceResult<Token> {
        let mut escaped = false;
        for (i, c) in rest.char_indices().skip(1) {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => return Ok(self.token(TokenKind::String, i + 1)),
                _ => escaped = false,
            }
        }
        let offset = self.offset;
        Err(self.fail('"', offset))
    }
}

impl Iterator for Lexer<'_> {
    type Item = SpiceResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let text = self.text;
        let rest = text[self.offset..].trim_start_matches([' ', '\t']);
        self.offset = text.len() - rest.len();
        let c = rest.chars().next()?;

        if let Some(token) = self.word(rest) {
            return Some(Ok(token));
        }

        if c == '.' {
            let len = 1 + rest[1..]
                .bytes()
                .take_while(|b| is_word(*b))
                .count();
            if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                return Some(Ok(self.token(TokenKind::DotCommand, len)));
            }
        }

        if c == '"' {
            return Some(self.string(rest));
        }

        if rest
            .get(..BRANCH.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(BRANCH))
        {
            return Some(Ok(self.token(TokenKind::Branch, BRANCH.len())));
        }

        for (op, kind) in DOUBLE_OPERATORS {
            if rest.starts_with(op) {
                return Some(Ok(self.token(kind, op.len())));
            }
        }

        if let Some(kind) = single_operator(c) {
            return Some(Ok(self.token(kind, c.len_utf8())));
        }

        let offset = self.offset;
        Some(Err(self.fail(c, offset)))
    }
}

/// 解析整行词法
pub fn tokenize(line: &str) -> SpiceResult<Vec<Token>> {
    Lexer::new(line).collect()
}
