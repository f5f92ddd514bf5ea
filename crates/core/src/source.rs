//! 逻辑行预处理与整文件解析
//!
//! Physical lines are folded into [`SpiceLine`]s first: `+` continuations are
//! merged, `*` comments grouped, `$`/`;` end-of-line comments split off. Each
//! logical line is then parsed, classified and fed to the [`NetlistBuilder`].

use serde::Serialize;

use crate::{
    ast::Ast,
    command::{classify, Command},
    config::ParserOptions,
    device::DeviceRegistry,
    error::{Diagnostic, SpiceError, SpiceResult},
    netlist::{Netlist, NetlistBuilder},
    parse::parse_line,
};

/// 一条逻辑行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpiceLine {
    /// First physical line (0-based).
    pub start: usize,
    /// Last physical line, inclusive.
    pub stop: usize,
    /// Command text, whitespace collapsed. Empty on comment lines.
    pub command: String,
    pub comment: Option<String>,
    pub is_title: bool,
}

impl SpiceLine {
    pub fn is_comment(&self) -> bool {
        self.command.is_empty()
    }

    pub fn is_dot_command(&self) -> bool {
        !self.is_title && self.command.starts_with('.')
    }

    pub fn is_element(&self) -> bool {
        !self.is_title
            && self
                .command
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric())
    }

    /// `.subckt` for `.subckt foo 1 2`.
    pub fn dot_command(&self) -> Option<&str> {
        if !self.is_dot_command() {
            return None;
        }
        self.command.split(' ').next()
    }

    pub fn lines(&self) -> (usize, usize) {
        (self.start, self.stop)
    }

    fn append_comment(&mut self, comment: &str) {
        match &mut self.comment {
            Some(text) => {
                text.push('\n');
                text.push_str(comment);
            }
            None => self.comment = Some(comment.to_string()),
        }
    }
}

/// Whitespace inside `"..."` is kept as is.
fn collapse(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut quoted = false;
    let mut pending = false;
    for c in text.trim().chars() {
        if c.is_whitespace() && !quoted {
            pending = true;
            continue;
        }
        if pending {
            result.push(' ');
            pending = false;
        }
        if c == '"' {
            quoted = !quoted;
        }
        result.push(c);
    }
    result
}

/// Splits at the first `$` or `;` outside a quoted string.
fn split_comment(text: &str) -> (String, Option<String>) {
    let mut quoted = false;
    let at = text.char_indices().find_map(|(at, c)| match c {
        '"' => {
            quoted = !quoted;
            None
        }
        '$' | ';' if !quoted => Some(at),
        _ => None,
    });
    match at {
        Some(at) => {
            let comment = text[at + 1..].trim();
            (
                collapse(&text[..at]),
                (!comment.is_empty()).then(|| comment.to_string()),
            )
        }
        None => (collapse(text), None),
    }
}

fn starts_library(command: &str) -> bool {
    let name = command.split(' ').next().unwrap_or_default();
    name.eq_ignore_ascii_case(".model") || name.eq_ignore_ascii_case(".subckt")
}

/// 把物理行合并为逻辑行
///
/// ```
/// use spice_netlist_core::{config::ParserOptions, source::read_lines};
///
/// let lines = read_lines(["test", "R1 1 2", "+ 1k ; load"], &ParserOptions::default()).unwrap();
/// assert_eq!(lines[1].command, "R1 1 2 1k");
/// assert_eq!(lines[1].comment.as_deref(), Some("load"));
/// assert_eq!(lines[1].lines(), (1, 2));
/// ```
pub fn read_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    options: &ParserOptions,
) -> SpiceResult<Vec<SpiceLine>> {
    let mut result: Vec<SpiceLine> = Vec::new();
    let mut last_command: Option<usize> = None;
    // Entry touched by the previous non-blank line.
    let mut previous: Option<usize> = None;
    let mut expect_title = options.title_line;

    for (index, raw) in lines.into_iter().enumerate() {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(rest) = text.strip_prefix('+') {
            let Some(target) = last_command else {
                return Err(SpiceError::Scope(format!(
                    "continuation on line {} follows no command",
                    index + 1
                )));
            };
            let (command, comment) = split_comment(rest);
            let line = &mut result[target];
            if !command.is_empty() {
                line.command.push(' ');
                line.command.push_str(&command);
            }
            if let Some(comment) = comment {
                line.append_comment(&comment);
            }
            line.stop = index;
            previous = Some(target);
            continue;
        }

        if let Some(comment) = text.strip_prefix('*') {
            previous = Some(push_comment(&mut result, previous, index, comment.trim()));
            continue;
        }

        let (command, comment) = split_comment(text);
        if command.is_empty() {
            let comment = comment.as_deref().unwrap_or_default();
            previous = Some(push_comment(&mut result, previous, index, comment));
            continue;
        }

        if expect_title {
            expect_title = false;
            if !starts_library(&command) {
                last_command = Some(result.len());
                previous = last_command;
                result.push(SpiceLine {
                    start: index,
                    stop: index,
                    command: text.to_string(),
                    comment: None,
                    is_title: true,
                });
                continue;
            }
        }

        last_command = Some(result.len());
        previous = last_command;
        result.push(SpiceLine {
            start: index,
            stop: index,
            command,
            comment,
            is_title: false,
        });
    }
    Ok(result)
}

/// Consecutive comment-only lines share one [`SpiceLine`]; blank lines
/// between them do not break the run. Returns the index of the entry.
fn push_comment(
    result: &mut Vec<SpiceLine>,
    previous: Option<usize>,
    index: usize,
    comment: &str,
) -> usize {
    if let Some(at) = previous.filter(|at| *at + 1 == result.len()) {
        let last = &mut result[at];
        if last.is_comment() {
            last.append_comment(comment);
            last.stop = index;
            return at;
        }
    }
    result.push(SpiceLine {
        start: index,
        stop: index,
        command: String::new(),
        comment: Some(comment.to_string()),
        is_title: false,
    });
    result.len() - 1
}

/// 逻辑行及其解析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedLine {
    pub line: SpiceLine,
    /// `None` for comments, the title, control-block lines and failures.
    pub ast: Option<Ast>,
    pub failed: bool,
}

/// 解析后的源文件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpiceSource {
    lines: Vec<ParsedLine>,
    netlist: Netlist,
}

fn in_control_passthrough(line: &SpiceLine) -> bool {
    !matches!(
        line.dot_command().map(str::to_ascii_lowercase).as_deref(),
        Some(".endc" | ".end")
    )
}

impl SpiceSource {
    /// 解析整个文件
    ///
    /// Errors confined to one line are recorded as diagnostics and the line
    /// is skipped. Scope errors and unknown element letters abort.
    ///
    /// ```
    /// use spice_netlist_core::{config::ParserOptions, device::DeviceRegistry, source::SpiceSource};
    ///
    /// let text = "divider\nR1 in out 1k\nR2 out 0 1k\n.op\n.end\n";
    /// let source = SpiceSource::parse(text, DeviceRegistry::shared(), &ParserOptions::default()).unwrap();
    /// assert_eq!(source.netlist().title.as_deref(), Some("divider"));
    /// assert_eq!(source.netlist().elements().count(), 2);
    /// ```
    pub fn parse(
        text: &str,
        registry: &DeviceRegistry,
        options: &ParserOptions,
    ) -> SpiceResult<Self> {
        let mut builder = NetlistBuilder::new();
        let mut diagnostics = Vec::new();
        let mut lines = Vec::new();

        for line in read_lines(text.lines(), options)? {
            if line.is_comment() {
                lines.push(ParsedLine {
                    line,
                    ast: None,
                    failed: false,
                });
                continue;
            }
            if line.is_title {
                builder.push(Command::Title(line.command.clone()))?;
                lines.push(ParsedLine {
                    line,
                    ast: None,
                    failed: false,
                });
                continue;
            }
            if builder.in_control() && in_control_passthrough(&line) {
                builder.push(Command::ControlCommand(line.command.clone()))?;
                lines.push(ParsedLine {
                    line,
                    ast: None,
                    failed: false,
                });
                continue;
            }

            let parsed = parse_line(&line.command)
                .and_then(|ast| classify(&ast, registry, options).map(|command| (ast, command)));
            match parsed {
                Ok((ast, command)) => {
                    log::debug!("line {}: {}", line.start + 1, ast);
                    builder.push(command)?;
                    lines.push(ParsedLine {
                        line,
                        ast: Some(ast),
                        failed: false,
                    });
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    log::error!("line {}: {}", line.start + 1, error);
                    diagnostics.push(Diagnostic::error(line.lines(), error));
                    lines.push(ParsedLine {
                        line,
                        ast: None,
                        failed: true,
                    });
                }
            }
            if builder.is_finished() {
                break;
            }
        }

        Ok(Self {
            lines,
            netlist: builder.finish(diagnostics),
        })
    }

    pub fn lines(&self) -> &[ParsedLine] {
        &self.lines
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    pub fn into_netlist(self) -> Netlist {
        self.netlist
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.netlist.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::Statement;

    fn read(lines: &[&str]) -> SpiceResult<Vec<SpiceLine>> {
        read_lines(lines.iter().copied(), &ParserOptions::default())
    }

    fn parse(text: &str) -> SpiceResult<SpiceSource> {
        SpiceSource::parse(text, DeviceRegistry::shared(), &ParserOptions::default())
    }

    #[test]
    fn test_continuation() {
        let lines = read(&["title", "V1 in 0", "* note", "+ DC   5 $ supply", "+ AC 1 ; small"]).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].command, "V1 in 0 DC 5 AC 1");
        assert_eq!(lines[1].comment.as_deref(), Some("supply\nsmall"));
        assert_eq!(lines[1].lines(), (1, 4));
        assert!(lines[2].is_comment());

        let mut options = ParserOptions::default();
        options.title_line = false;
        assert!(matches!(
            read_lines(["* head", "+ R1 1 2 1k"], &options),
            Err(SpiceError::Scope(_))
        ));
    }

    #[test]
    fn test_comments() {
        let lines = read(&["* first", "  * second", "; third", "", "* fourth"]).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].comment.as_deref(), Some("first\nsecond\nthird\nfourth"));
        assert_eq!(lines[0].lines(), (0, 4));

        let lines = read(&["t", "* one", "", "* two", "R1 1 0 1k"]).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_comment());
        assert_eq!(lines[1].comment.as_deref(), Some("one\ntwo"));
        assert_eq!(lines[1].lines(), (1, 3));
        assert!(lines[2].is_element());

        // a continuation between two comments ends the run
        let lines = read(&["t", "R1 1 0", "* one", "+ 1k", "* two"]).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].command, "R1 1 0 1k");
        assert_eq!(lines[2].comment.as_deref(), Some("one"));
        assert_eq!(lines[3].comment.as_deref(), Some("two"));
    }

    #[test]
    fn test_quoted_text() {
        let lines = read(&["t", ".include \"a  b.cir\"", ".lib \"x;y.lib\" tt ; corner"]).unwrap();
        assert_eq!(lines[1].command, ".include \"a  b.cir\"");
        assert_eq!(lines[2].command, ".lib \"x;y.lib\" tt");
        assert_eq!(lines[2].comment.as_deref(), Some("corner"));

        let source = parse("t\n.include   \"a  b.cir\"\n.end\n").unwrap();
        assert!(source.diagnostics().is_empty());
        assert_eq!(source.netlist().includes, ["a  b.cir"]);
    }

    #[test]
    fn test_title() {
        let lines = read(&["* header", "My   amplifier ; v2", "R1 1 2 1k"]).unwrap();
        assert!(lines[1].is_title);
        assert_eq!(lines[1].command, "My   amplifier ; v2");
        assert!(!lines[1].is_element());
        assert!(lines[2].is_element());

        let lines = read(&[".SUBCKT inv a y", ".ends"]).unwrap();
        assert!(!lines[0].is_title);
        assert_eq!(lines[0].dot_command(), Some(".SUBCKT"));
        assert!(lines[0].is_dot_command());
    }

    #[test]
    fn test_parse_file() {
        let source = parse(
            "test circuit\n\
             .include models.cir\n\
             R1 in out 1k\n\
             C1 out 0 1u ic=0\n\
             .control\n\
             run\n\
             plot v(out)\n\
             .endc\n\
             .tran 1u 1m\n\
             .end\n\
             R2 ignored 0 1k\n",
        )
        .unwrap();
        let netlist = source.netlist();
        assert_eq!(netlist.titles, ["test circuit"]);
        assert_eq!(netlist.includes, ["models.cir"]);
        assert_eq!(netlist.elements().count(), 2);
        assert!(source.diagnostics().is_empty());
        let control = netlist
            .statements
            .iter()
            .find_map(|statement| match statement {
                Statement::Control(statements) => Some(statements),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            control,
            &[
                Statement::Command(Command::ControlCommand("run".to_string())),
                Statement::Command(Command::ControlCommand("plot v(out)".to_string())),
            ]
        );
    }

    #[test]
    fn test_line_errors_are_recorded() {
        let source = parse("title\nR1 1 2 1k\nQ1 c b bjt\nR2 1 2 (\nR3 1 0 2k\n").unwrap();
        let diagnostics = source.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(diagnostics[0].error, SpiceError::PinCount { .. }));
        assert_eq!(diagnostics[0].lines, (2, 2));
        assert!(matches!(diagnostics[1].error, SpiceError::Syntax { .. }));
        assert_eq!(source.netlist().elements().count(), 2);
        assert!(source.lines()[2].failed);
    }

    #[test]
    fn test_fatal_errors() {
        assert!(matches!(
            parse("title\n.ends\n"),
            Err(SpiceError::Scope(_))
        ));
        assert!(matches!(
            parse("title\n9R1 1 2 1k\n"),
            Err(SpiceError::ElementLetter { .. })
        ));
        assert!(parse("title\n.subckt foo 1 2\n.end\n").is_ok());
    }

    #[test]
    fn test_ground() {
        let mut options = ParserOptions::default();
        options.ground = "GND".to_string();
        let source = SpiceSource::parse("t\nR1 in gnd 1k\n", DeviceRegistry::shared(), &options).unwrap();
        let element = source.netlist().elements().next().unwrap();
        assert_eq!(element.nodes, ["in", "0"]);
    }
}
