//! 语法解析工具
//!
//! 一条逻辑行 → 一个 [`Ast::Command`] / [`Ast::DotCommand`]。

use crate::{
    ast::{is_text_command, Ast, BinaryOperator, GroupKind, ListKind, UnaryOperator},
    error::{SpiceError, SpiceResult},
    lexer::{tokenize, Token, TokenKind},
};

pub trait TryParse<T> {
    fn try_parse(&mut self) -> SpiceResult<T>;
}

pub trait Snapshot {
    type State;
    fn snapshot(&self) -> Self::State;
    fn restore(&mut self, state: Self::State);
}

pub trait TokenStream: Snapshot {
    /// 返回总 Token 数量
    fn len(&self) -> usize;
    /// 返回当前 Token 位置
    fn position(&self) -> usize;
    /// 返回指定位置的 Token
    fn get(&self, index: usize) -> Option<&Token>;
    /// 前进到下一个 Token
    fn consume(&mut self);

    /// 返回当前 Token，如果 EOF 则返回错误
    fn token(&self) -> SpiceResult<Token> {
        self.get(self.position())
            .cloned()
            .ok_or_else(SpiceError::unexpected_eof)
    }

    /// 当前 Token 的类型
    fn kind(&self) -> Option<TokenKind> {
        self.get(self.position()).map(|token| token.kind)
    }

    /// 检测当前 Token 是否匹配
    fn matches(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    /// 如果匹配则前进到下一个 Token
    fn matches_consume(&mut self, kind: TokenKind) -> bool {
        if self.matches(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// 检测是否 EOF
    fn is_eof(&self) -> bool {
        self.position() >= self.len()
    }

    /// 断言当前 Token 的类型，`what` 用于错误信息
    fn expect(&mut self, kind: TokenKind, what: &str) -> SpiceResult<Token> {
        let actual = self.token()?;
        if actual.kind != kind {
            return Err(SpiceError::unexpected(what, &actual.raw, actual.column));
        }
        self.consume();
        Ok(actual)
    }

    /// 断言 EOF
    fn expect_eof(&self) -> SpiceResult<()> {
        match self.get(self.position()) {
            None => Ok(()),
            Some(token) => Err(SpiceError::unexpected(
                "end of line",
                &token.raw,
                token.column,
            )),
        }
    }
}

/// 表达式文法，按优先级从低到高
///
/// Every [`TokenStream`] gets these rules for free.
pub trait Grammar: TokenStream {
    /// `cond ? then : else`, left associative.
    fn ternary(&mut self) -> SpiceResult<Ast> {
        let mut condition = self.binary(BinaryOperator::LOWEST)?;
        while self.matches_consume(TokenKind::Question) {
            let then = self.ternary()?;
            self.expect(TokenKind::Colon, "`:'")?;
            let otherwise = self.binary(BinaryOperator::LOWEST)?;
            condition = Ast::conditional(condition, then, otherwise);
        }
        Ok(condition)
    }

    fn binary(&mut self, level: u8) -> SpiceResult<Ast> {
        if level > BinaryOperator::HIGHEST {
            return self.unary();
        }

        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self
            .kind()
            .and_then(BinaryOperator::from_token)
            .filter(|op| op.precedence() == level)
        {
            self.consume();
            let rhs = self.binary(level + 1)?;
            lhs = Ast::binary(op, lhs, rhs);

            if op.is_comparison() {
                if let Some(next) = self.get(self.position()) {
                    if BinaryOperator::from_token(next.kind).is_some_and(|op| op.is_comparison()) {
                        return Err(SpiceError::unexpected(
                            "a single comparison",
                            &next.raw,
                            next.column,
                        ));
                    }
                }
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> SpiceResult<Ast> {
        match self.kind().and_then(UnaryOperator::from_token) {
            Some(op) => {
                self.consume();
                Ok(Ast::unary(op, self.unary()?))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> SpiceResult<Ast> {
        let token = self.token()?;
        match token.kind {
            TokenKind::Integer | TokenKind::Number => {
                self.consume();
                Ast::literal(&token)
                    .ok_or_else(|| SpiceError::unexpected("number", &token.raw, token.column))
            }
            TokenKind::String => {
                self.consume();
                let inner = &token.raw[1..token.raw.len() - 1];
                Ok(Ast::text(inner))
            }
            TokenKind::Id => {
                self.consume();
                if self.matches_consume(TokenKind::Branch) {
                    Ok(Ast::Branch(token.raw))
                } else if self.matches_consume(TokenKind::LeftParen) {
                    let arguments = self.arguments(TokenKind::RightParen)?;
                    Ok(Ast::function(&token.raw, arguments))
                } else {
                    Ok(Ast::Id(token.raw))
                }
            }
            TokenKind::At => {
                self.consume();
                let device = self.expect(TokenKind::Id, "device name")?;
                self.expect(TokenKind::LeftBracket, "`['")?;
                let parameter = self.expect(TokenKind::Id, "parameter name")?;
                self.expect(TokenKind::RightBracket, "`]'")?;
                Ok(Ast::InnerParameter {
                    device: device.raw,
                    parameter: parameter.raw,
                })
            }
            TokenKind::Tilde => {
                self.consume();
                let inner = self.token()?;
                let leaf = match inner.kind {
                    TokenKind::Id => Ast::Id(inner.raw.clone()),
                    TokenKind::Integer | TokenKind::Number => Ast::literal(&inner)
                        .ok_or_else(|| SpiceError::unexpected("number", &inner.raw, inner.column))?,
                    _ => {
                        return Err(SpiceError::unexpected(
                            "identifier or number after `~'",
                            &inner.raw,
                            inner.column,
                        ))
                    }
                };
                self.consume();
                Ok(Ast::InvertedInput(Box::new(leaf)))
            }
            TokenKind::Modulo => {
                self.consume();
                let port = self.expect(TokenKind::Id, "port type")?.raw;
                if self.matches_consume(TokenKind::LeftParen) {
                    let arguments = Box::new(self.arguments(TokenKind::RightParen)?);
                    Ok(Ast::PortModifierFunction { port, arguments })
                } else if self.matches_consume(TokenKind::LeftBracket) {
                    let arguments = Box::new(self.arguments(TokenKind::RightBracket)?);
                    Ok(Ast::PortModifierVector { port, arguments })
                } else {
                    Ok(Ast::PortTypeModifier(port))
                }
            }
            TokenKind::LeftParen => {
                self.consume();
                let first = self.ternary()?;
                if self.matches(TokenKind::Comma) {
                    let mut items = vec![first];
                    while self.matches_consume(TokenKind::Comma) {
                        items.push(self.ternary()?);
                    }
                    self.expect(TokenKind::RightParen, "`)'")?;
                    Ok(Ast::Tuple(items))
                } else {
                    self.expect(TokenKind::RightParen, "`)'")?;
                    Ok(Ast::group(GroupKind::Parenthesis, first))
                }
            }
            TokenKind::LeftBrace => {
                self.consume();
                let inner = self.ternary()?;
                self.expect(TokenKind::RightBrace, "`}'")?;
                Ok(Ast::group(GroupKind::Brace, inner))
            }
            TokenKind::Quote => {
                self.consume();
                let inner = self.ternary()?;
                self.expect(TokenKind::Quote, "closing `''")?;
                Ok(Ast::group(GroupKind::Quote, inner))
            }
            TokenKind::LeftBracket => {
                self.consume();
                let mut items = Vec::new();
                while !self.matches_consume(TokenKind::RightBracket) {
                    items.push(self.item(false)?);
                }
                Ok(Ast::bracket(items))
            }
            _ => Err(SpiceError::unexpected(
                "expression",
                &token.raw,
                token.column,
            )),
        }
    }

    /// Argument list after the opening delimiter, up to and including
    /// `close`. Either comma or space separated, never both.
    fn arguments(&mut self, close: TokenKind) -> SpiceResult<Ast> {
        let mut items = Vec::new();
        if self.matches_consume(close) {
            return Ok(Ast::list(ListKind::Comma, items));
        }

        items.push(self.item(false)?);
        let kind = if self.matches(TokenKind::Comma) || self.matches(close) {
            ListKind::Comma
        } else {
            ListKind::Space
        };

        while !self.matches_consume(close) {
            match kind {
                ListKind::Comma => {
                    self.expect(TokenKind::Comma, "`,'")?;
                }
                ListKind::Space => {
                    if let Some(token) = self.get(self.position()) {
                        if token.kind == TokenKind::Comma {
                            return Err(SpiceError::unexpected(
                                "space separated argument",
                                &token.raw,
                                token.column,
                            ));
                        }
                    }
                }
            }
            items.push(self.item(false)?);
        }
        Ok(Ast::list(kind, items))
    }

    /// An expression, or `key=value` (with `key=a, b` pairs if `pair`).
    fn item(&mut self, pair: bool) -> SpiceResult<Ast> {
        let expression = self.ternary()?;
        if !self.matches(TokenKind::Set) {
            return Ok(expression);
        }

        let token = self.token()?;
        let table = matches!(
            expression,
            Ast::Group {
                kind: GroupKind::Brace,
                ..
            }
        );
        if !table && !matches!(expression, Ast::Id(_) | Ast::Function { .. }) {
            return Err(SpiceError::unexpected(
                "identifier before `='",
                &token.raw,
                token.column,
            ));
        }
        self.consume();
        if table {
            let points = self.points()?;
            return Ast::set(expression, points);
        }

        let mut value = self.ternary()?;
        if pair && self.matches_consume(TokenKind::Comma) {
            value = Ast::list(ListKind::Comma, vec![value, self.ternary()?]);
        }
        Ast::set(expression, value)
    }

    /// `(x, y) (x, y) ...` after `TABLE {expr} =`.
    fn points(&mut self) -> SpiceResult<Ast> {
        let mut points = Vec::new();
        loop {
            let token = self.token()?;
            if token.kind != TokenKind::LeftParen {
                return Err(SpiceError::unexpected("`(x, y)' point", &token.raw, token.column));
            }
            points.push(self.primary()?);
            if !self.matches(TokenKind::LeftParen) {
                break;
            }
        }
        Ok(Ast::list(ListKind::Space, points))
    }

    /// `PARAMS:` separating subcircuit nodes from defaults.
    fn params_marker(&mut self) -> bool {
        let state = self.snapshot();
        let is_params = self
            .get(self.position())
            .is_some_and(|token| token.kind == TokenKind::Id && token.raw.eq_ignore_ascii_case("params"));
        if is_params {
            self.consume();
            if self.matches_consume(TokenKind::Colon) {
                return true;
            }
        }
        self.restore(state);
        false
    }

    /// 一条完整的语句
    fn statement(&mut self) -> SpiceResult<Ast> {
        let head = self.token()?;
        let dot = match head.kind {
            TokenKind::DotCommand => true,
            TokenKind::Id => false,
            _ => {
                return Err(SpiceError::unexpected(
                    "element name or dot-command",
                    &head.raw,
                    head.column,
                ))
            }
        };
        self.consume();

        let mut children = Vec::new();
        while !self.is_eof() {
            if self.params_marker() {
                continue;
            }
            children.push(self.item(true)?);
        }

        let name = head.raw;
        Ok(if dot {
            Ast::DotCommand { name, children }
        } else {
            Ast::Command { name, children }
        })
    }
}

impl<T: TokenStream> Grammar for T {}

impl<P: TokenStream> TryParse<Ast> for P {
    fn try_parse(&mut self) -> SpiceResult<Ast> {
        self.ternary()
    }
}

pub struct SpiceLineParser<'a> {
    vec: &'a [Token],
    position: usize,
}

impl<'a> SpiceLineParser<'a> {
    pub fn new(vec: &'a [Token]) -> Self {
        Self { vec, position: 0 }
    }
}

impl Snapshot for SpiceLineParser<'_> {
    type State = usize;

    fn snapshot(&self) -> Self::State {
        self.position
    }

    fn restore(&mut self, state: Self::State) {
        self.position = state;
    }
}

impl TokenStream for SpiceLineParser<'_> {
    fn len(&self) -> usize {
        self.vec.len()
    }

    fn position(&self) -> usize {
        self.position
    }

    fn get(&self, index: usize) -> Option<&Token> {
        self.vec.get(index)
    }

    fn consume(&mut self) {
        self.position += 1;
    }
}

/// `.lib path [entry]`; a quoted path may contain blanks.
fn library_arguments(rest: &str) -> Vec<Ast> {
    let (path, entry) = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split_once('"').unwrap_or((quoted, "")),
        None => rest.rsplit_once(' ').unwrap_or((rest, "")),
    };
    let mut children = vec![Ast::text(path.trim())];
    let entry = entry.trim();
    if !entry.is_empty() {
        children.push(Ast::text(entry));
    }
    children
}

/// `.title`, `.include` and `.lib` take free text, not expressions.
fn parse_text_command(line: &str) -> Option<Ast> {
    let line = line.trim();
    let (name, rest) = match line.split_once([' ', '\t']) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    if !is_text_command(name) {
        return None;
    }

    let children = if rest.is_empty() {
        Vec::new()
    } else if name.eq_ignore_ascii_case(".title") {
        vec![Ast::text(rest)]
    } else if name.eq_ignore_ascii_case(".lib") {
        library_arguments(rest)
    } else {
        vec![Ast::text(rest.trim_matches('"'))]
    };

    Some(Ast::DotCommand {
        name: name.to_string(),
        children,
    })
}

/// 解析一条逻辑行
///
/// ```
/// use spice_netlist_core::{ast::Ast, parse::parse_line};
///
/// let ast = parse_line("R1 1 2 1k").unwrap();
/// assert_eq!(ast.command_name(), Some("R1"));
/// assert_eq!(ast.children()[2], Ast::number(1., Some(spice_netlist_core::value::Suffix::Kilo)));
/// ```
pub fn parse_line(line: &str) -> SpiceResult<Ast> {
    if let Some(ast) = parse_text_command(line) {
        return Ok(ast);
    }
    let tokens = tokenize(line)?;
    let mut parser = SpiceLineParser::new(&tokens);
    let ast = parser.statement()?;
    parser.expect_eof()?;
    Ok(ast)
}

/// 解析单独的表达式，例如 `{5k + 50*TEMPER}`
pub fn parse_expression(text: &str) -> SpiceResult<Ast> {
    let tokens = tokenize(text)?;
    let mut parser = SpiceLineParser::new(&tokens);
    let ast = parser.try_parse()?;
    parser.expect_eof()?;
    Ok(ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BinaryOperator::*, Number},
        spice_test_err, spice_test_ok,
        value::Suffix,
    };

    fn id(name: &str) -> Ast {
        Ast::id(name)
    }

    fn int(value: i64) -> Ast {
        Ast::Integer(value)
    }

    #[test]
    fn test_brace_expression() {
        spice_test_ok!(
            "{5k + 50*TEMPER}",
            Ast::brace(Ast::binary(
                Addition,
                Ast::number(5., Some(Suffix::Kilo)),
                Ast::binary(Multiplication, int(50), id("TEMPER"))
            ))
        );
    }

    #[test]
    fn test_bracket_vector() {
        spice_test_ok!(
            "[0.1 -0.2]",
            Ast::group(
                GroupKind::Bracket,
                Ast::list(
                    ListKind::Space,
                    vec![
                        Ast::Number(Number::from(0.1)),
                        Ast::Number(Number::from(-0.2))
                    ]
                )
            )
        );
        // explicit subtraction of names is kept
        spice_test_ok!(
            "[a - b]",
            Ast::bracket(vec![Ast::binary(Subtraction, id("a"), id("b"))])
        );
        // outside brackets `-` is always a subtraction
        spice_test_ok!("1 -2", Ast::binary(Subtraction, int(1), int(2)));
    }

    #[test]
    fn test_precedence() {
        spice_test_ok!(
            "2*3-4/5",
            Ast::binary(
                Subtraction,
                Ast::binary(Multiplication, int(2), int(3)),
                Ast::binary(Division, int(4), int(5))
            )
        );
        spice_test_ok!(
            "a || b && c == d + e * f ** g",
            Ast::binary(
                Or,
                id("a"),
                Ast::binary(
                    And,
                    id("b"),
                    Ast::binary(
                        Equal,
                        id("c"),
                        Ast::binary(
                            Addition,
                            id("d"),
                            Ast::binary(
                                Multiplication,
                                id("e"),
                                Ast::binary(Power, id("f"), id("g"))
                            )
                        )
                    )
                )
            )
        );
        // unary binds tighter than power, power is left associative
        spice_test_ok!(
            "-2^3^2",
            Ast::binary(
                Power,
                Ast::binary(
                    Power,
                    Ast::unary(UnaryOperator::Negation, int(2)),
                    int(3)
                ),
                int(2)
            )
        );
        spice_test_ok!(
            "7 \\ 2 % 3",
            Ast::binary(Modulo, Ast::binary(IntegerDivision, int(7), int(2)), int(3))
        );
    }

    #[test]
    fn test_comparison_nonassoc() {
        spice_test_ok!("a < b", Ast::binary(Less, id("a"), id("b")));
        spice_test_err!("a < b < c");
        spice_test_err!("a == b != c");
    }

    #[test]
    fn test_ternary() {
        spice_test_ok!(
            "a ? b ? 1 : 2 : 3",
            Ast::conditional(
                id("a"),
                Ast::conditional(id("b"), int(1), int(2)),
                int(3)
            )
        );
        spice_test_ok!(
            "a ? 1 : b ? 2 : 3",
            Ast::conditional(Ast::conditional(id("a"), int(1), id("b")), int(2), int(3))
        );
        spice_test_err!("a ? 1");
    }

    #[test]
    fn test_special_references() {
        spice_test_ok!("vin#branch", Ast::Branch("vin".to_string()));
        spice_test_ok!(
            "@m1[gm]",
            Ast::InnerParameter {
                device: "m1".to_string(),
                parameter: "gm".to_string()
            }
        );
        spice_test_ok!("~a", Ast::InvertedInput(Box::new(id("a"))));
        spice_test_ok!("~1", Ast::InvertedInput(Box::new(int(1))));
        spice_test_err!("~(a)");
    }

    #[test]
    fn test_functions() {
        spice_test_ok!(
            "sin(3.14)",
            Ast::function(
                "sin",
                Ast::list(ListKind::Comma, vec![Ast::Number(Number::from(3.14))])
            )
        );
        spice_test_ok!(
            "limit(x, 0, 1)",
            Ast::function(
                "limit",
                Ast::list(ListKind::Comma, vec![id("x"), int(0), int(1)])
            )
        );
        spice_test_ok!(
            "SIN (0 1 1k)",
            Ast::function(
                "SIN",
                Ast::list(
                    ListKind::Space,
                    vec![int(0), int(1), Ast::number(1., Some(Suffix::Kilo))]
                )
            )
        );
        spice_test_ok!("f()", Ast::function("f", Ast::list(ListKind::Comma, vec![])));
        spice_test_err!("f(a, b c)");
        spice_test_err!("f(a b, c)");
    }

    #[test]
    fn test_port_modifiers() {
        spice_test_ok!("%vd", Ast::PortTypeModifier("vd".to_string()));
        spice_test_ok!(
            "%vd(1 2)",
            Ast::PortModifierFunction {
                port: "vd".to_string(),
                arguments: Box::new(Ast::list(ListKind::Space, vec![int(1), int(2)]))
            }
        );
        spice_test_ok!(
            "%v [a b]",
            Ast::PortModifierVector {
                port: "v".to_string(),
                arguments: Box::new(Ast::list(ListKind::Space, vec![id("a"), id("b")]))
            }
        );
    }

    #[test]
    fn test_groups() {
        spice_test_ok!(
            "(1, 2)",
            Ast::Tuple(vec![int(1), int(2)])
        );
        spice_test_ok!("(a)", Ast::group(GroupKind::Parenthesis, id("a")));
        spice_test_ok!("'a+1'", Ast::group(GroupKind::Quote, Ast::binary(Addition, id("a"), int(1))));
        spice_test_ok!("\"hello world\"", Ast::text("hello world"));
        spice_test_err!("{a");
        spice_test_err!("");
    }

    #[test]
    fn test_element_line() {
        assert_eq!(
            parse_line("R1 1 2 1k"),
            Ok(Ast::Command {
                name: "R1".to_string(),
                children: vec![int(1), int(2), Ast::number(1., Some(Suffix::Kilo))]
            })
        );
        assert_eq!(
            parse_line("D1 a k ic=0.6, 5"),
            Ok(Ast::Command {
                name: "D1".to_string(),
                children: vec![
                    id("a"),
                    id("k"),
                    Ast::set(
                        id("ic"),
                        Ast::list(ListKind::Comma, vec![Ast::Number(Number::from(0.6)), int(5)])
                    )
                    .unwrap()
                ]
            })
        );
    }

    #[test]
    fn test_dot_commands() {
        let ast = parse_line(".model D1N4148 D (is=2.52n n=1.752)").unwrap();
        assert_eq!(ast.command_name(), Some(".model"));
        assert!(matches!(&ast.children()[2], Ast::Function { name, .. } if name == "D"));

        let ast = parse_line(".ic v(cc)=0").unwrap();
        assert_eq!(ast.children()[0].key_name().as_deref(), Some("v(cc)"));

        let ast = parse_line(".subckt opamp in out PARAMS: gain=10").unwrap();
        assert_eq!(ast.children().len(), 4);
        assert!(ast.children()[3].is_set());

        assert!(matches!(parse_line("1 2 3"), Err(SpiceError::Syntax { .. })));
        assert!(matches!(parse_line("R1 1 + "), Err(SpiceError::Syntax { position: None, .. })));
        assert!(matches!(parse_line("R1 1 = 2"), Err(SpiceError::Syntax { .. })));
    }

    #[test]
    fn test_text_commands() {
        assert_eq!(
            parse_line(".include \"models/my lib.cir\""),
            Ok(Ast::DotCommand {
                name: ".include".to_string(),
                children: vec![Ast::text("models/my lib.cir")]
            })
        );
        assert_eq!(
            parse_line(".lib /opt/pdk/models.lib tt"),
            Ok(Ast::DotCommand {
                name: ".lib".to_string(),
                children: vec![Ast::text("/opt/pdk/models.lib"), Ast::text("tt")]
            })
        );
        assert_eq!(
            parse_line(".lib \"my lib.lib\""),
            Ok(Ast::DotCommand {
                name: ".lib".to_string(),
                children: vec![Ast::text("my lib.lib")]
            })
        );
        assert_eq!(
            parse_line(".lib \"my lib.lib\" tt"),
            Ok(Ast::DotCommand {
                name: ".lib".to_string(),
                children: vec![Ast::text("my lib.lib"), Ast::text("tt")]
            })
        );
        assert_eq!(
            parse_line(".lib models.lib"),
            Ok(Ast::DotCommand {
                name: ".lib".to_string(),
                children: vec![Ast::text("models.lib")]
            })
        );
        assert_eq!(
            parse_line(".TITLE a (weird) title; 100%"),
            Ok(Ast::DotCommand {
                name: ".TITLE".to_string(),
                children: vec![Ast::text("a (weird) title; 100%")]
            })
        );
    }

    #[test]
    fn test_table() {
        let point = |x: i64, y: i64| Ast::Tuple(vec![int(x), int(y)]);
        assert_eq!(
            parse_line("E1 out 0 TABLE {V(in)} = (0,0) (1,1)"),
            Ok(Ast::Command {
                name: "E1".to_string(),
                children: vec![
                    id("out"),
                    int(0),
                    id("TABLE"),
                    Ast::set(
                        Ast::brace(Ast::function(
                            "V",
                            Ast::list(ListKind::Comma, vec![id("in")])
                        )),
                        Ast::list(ListKind::Space, vec![point(0, 0), point(1, 1)])
                    )
                    .unwrap(),
                ]
            })
        );
        assert!(parse_line("E1 out 0 TABLE {V(in)} = 0 1").is_err());
        assert!(parse_line("R1 1 2 (a)=1").is_err());
    }

    #[test]
    fn test_round_trip() {
        let lines = [
            "R1 1 2 1k",
            "V1 in 0 SIN(0 1 1k)",
            "B1 out 0 v={V(in) * 2 > 1 ? 1 : -1}",
            "D1 a k ic=0.6, 5",
            ".model QMOD NPN (bf=50 is=1e-13 vaf=100)",
            ".param x=-2**2 y='x*2' z=a\\b%c",
            ".func f(a, b) {a + b}",
            "A1 [0.1 -0.2 3] %vd(1 2) ~in out amod",
            ".ic v(cc)=0 i(vin)=@m1[id]",
            ".print tran vin#branch !x",
            ".lib /opt/pdk/models.lib tt",
            "E1 3 0 5 0 10kHz",
            "E2 out 0 TABLE {V(in)} = (0,0) (1, 2.5)",
            ".lib \"my lib.lib\" tt",
        ];
        for line in lines {
            let ast = parse_line(line).unwrap();
            let text = ast.to_string();
            assert_eq!(parse_line(&text), Ok(ast), "{} -> {}", line, text);
        }
    }
}
