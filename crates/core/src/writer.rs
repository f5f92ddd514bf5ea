//! 规范化输出
//!
//! Parsed lines are written back from their AST; comment, title, control
//! and failed lines are written as read.

use crate::{ast::is_text_command, config::WriterOptions, source::SpiceSource};

/// Splits `text` at the last space that keeps each physical line within
/// `width`. A word longer than the room stays whole.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    let mut prefix = "";
    loop {
        let room = width.saturating_sub(prefix.len());
        if rest.len() <= room {
            lines.push(format!("{}{}", prefix, rest));
            break;
        }
        let split = rest
            .char_indices()
            .take_while(|(at, _)| *at <= room)
            .filter(|(at, c)| *c == ' ' && *at > 0)
            .last()
            .map(|(at, _)| at)
            .or_else(|| rest.find(' '));
        let Some(at) = split else {
            lines.push(format!("{}{}", prefix, rest));
            break;
        };
        lines.push(format!("{}{}", prefix, &rest[..at]));
        rest = rest[at..].trim_start();
        prefix = "+ ";
    }
    lines
}

fn never_wrapped(text: &str) -> bool {
    text.split(' ').next().is_some_and(is_text_command)
}

impl SpiceSource {
    /// 输出规范化的网表文本
    ///
    /// ```
    /// use spice_netlist_core::{config::{ParserOptions, WriterOptions}, device::DeviceRegistry, source::SpiceSource};
    ///
    /// let text = "rc\nR1   in out   1k ; load\n+ m=2\n.end\n";
    /// let source = SpiceSource::parse(text, DeviceRegistry::shared(), &ParserOptions::default()).unwrap();
    /// assert_eq!(source.to_spice(&WriterOptions::default()), "rc\nR1 in out 1k m=2 ; load\n.end\n");
    /// ```
    pub fn to_spice(&self, options: &WriterOptions) -> String {
        let mut output = String::new();
        for parsed in self.lines() {
            let line = &parsed.line;
            if line.is_comment() {
                if options.comments {
                    for comment in line.comment.iter().flat_map(|text| text.lines()) {
                        output.push_str("* ");
                        output.push_str(comment);
                        output.push('\n');
                    }
                }
                continue;
            }

            let text = match &parsed.ast {
                Some(ast) => ast.to_string(),
                None => line.command.clone(),
            };
            let mut physical = match options.line_length_max {
                Some(width) if parsed.ast.is_some() && !never_wrapped(&text) => wrap(&text, width),
                _ => vec![text],
            };

            if let Some(comment) = line.comment.as_deref().filter(|_| options.comments) {
                let comment = comment.lines().collect::<Vec<_>>().join(" ");
                let fits = match (options.line_length_max, physical.last()) {
                    (Some(width), Some(last)) => last.len() + comment.len() + 3 <= width,
                    _ => true,
                };
                if fits {
                    if let Some(last) = physical.last_mut() {
                        last.push_str(" ; ");
                        last.push_str(&comment);
                    }
                } else {
                    output.push_str("* ");
                    output.push_str(&comment);
                    output.push('\n');
                }
            }

            for text in physical {
                output.push_str(&text);
                output.push('\n');
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ParserOptions, device::DeviceRegistry};

    fn parse(text: &str) -> SpiceSource {
        SpiceSource::parse(text, DeviceRegistry::shared(), &ParserOptions::default()).unwrap()
    }

    fn asts(source: &SpiceSource) -> Vec<crate::ast::Ast> {
        source
            .lines()
            .iter()
            .filter_map(|parsed| parsed.ast.clone())
            .collect()
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("R1 1 2 1k", 20), ["R1 1 2 1k"]);
        assert_eq!(wrap("M1 d g s b nch w=1u l=2u", 12), ["M1 d g s b", "+ nch w=1u", "+ l=2u"]);
        assert_eq!(wrap("averyveryverylongword tail", 8), ["averyveryverylongword", "+ tail"]);
        assert_eq!(wrap("single", 3), ["single"]);
    }

    #[test]
    fn test_round_trip() {
        let text = "* amplifier\n\
                    * second comment\n\
                    amp\n\
                    .param gain={2*rval} rval=1k\n\
                    .subckt stage in out params: r=1k\n\
                    R1 in out {r} tc1=0.01\n\
                    .ends stage\n\
                    X1 a b stage r=2k\n\
                    Q1 c b e 0 npn area=2 off\n\
                    V1 a 0 SIN(0 1m 1k) $ drive\n\
                    .model npn NPN (bf=100 is=1e-15)\n\
                    .tran 1n 10u 0 1n\n\
                    .end\n";
        let source = parse(text);
        assert!(source.diagnostics().is_empty());
        for width in [None, Some(16), Some(30)] {
            let options = WriterOptions {
                line_length_max: width,
                ..WriterOptions::default()
            };
            let written = source.to_spice(&options);
            let reparsed = parse(&written);
            assert_eq!(asts(&reparsed), asts(&source), "{}", written);
            assert_eq!(reparsed.netlist().titles, source.netlist().titles);
        }
    }

    #[test]
    fn test_limit_respected() {
        let source = parse("t\nR1 in out 1k m=2 temp=27 dtemp=1 scale=1.5\n.tran 1n 10u\n");
        let written = source.to_spice(&WriterOptions {
            comments: false,
            line_length_max: Some(14),
        });
        assert!(source.diagnostics().is_empty());
        assert!(written.lines().all(|line| line.len() <= 14), "{}", written);
        assert!(written.lines().filter(|line| line.starts_with("+ ")).count() > 1);
    }

    #[test]
    fn test_text_commands_and_comments() {
        let source = parse("* head\nt\n.include /very/long/path/to/models.lib\nR1 1 0 1k ; load\n");
        let written = source.to_spice(&WriterOptions {
            comments: true,
            line_length_max: Some(10),
        });
        assert!(written.contains(".include /very/long/path/to/models.lib\n"));
        assert!(written.contains("* load\n"));

        let written = source.to_spice(&WriterOptions {
            comments: false,
            line_length_max: None,
        });
        assert_eq!(written, "t\n.include /very/long/path/to/models.lib\nR1 1 0 1k\n");
    }
}
