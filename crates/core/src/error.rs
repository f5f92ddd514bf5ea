//! 错误类型与诊断信息

use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic as Report, Label};
use serde::Serialize;
use thiserror::Error;

/// Every failure the parsing stack can produce.
///
/// `Lex`, `Syntax`, `PinCount` and `Parameter` only invalidate the line they
/// occur on. `Scope` and `ElementLetter` abort the whole parse.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum SpiceError {
    #[error("illegal character `{character}' at offset {offset}")]
    Lex { character: char, offset: usize },

    #[error("syntax error: {reason}")]
    Syntax {
        reason: String,
        position: Option<(usize, usize)>,
    },

    #[error("no device class is registered for element letter `{letter}' ({meaning})")]
    ElementLetter { letter: char, meaning: String },

    #[error("{device} `{element}' expects {expected} node(s), found {found}")]
    PinCount {
        device: String,
        element: String,
        expected: String,
        found: usize,
    },

    #[error("{device}: invalid parameter `{parameter}' (`{text}'): {reason}")]
    Parameter {
        device: String,
        parameter: String,
        text: String,
        reason: String,
    },

    #[error("scope error: {0}")]
    Scope(String),

    #[error("`{node}' takes {expected} operand(s), got {found}")]
    Arity {
        node: String,
        expected: usize,
        found: usize,
    },
}

pub type SpiceResult<T> = Result<T, SpiceError>;

impl SpiceError {
    pub fn unexpected_eof() -> Self {
        SpiceError::Syntax {
            reason: "unexpected end of input".to_string(),
            position: None,
        }
    }

    pub fn unexpected(expect: &str, actual: &str, position: (usize, usize)) -> Self {
        SpiceError::Syntax {
            reason: format!("expect {}, found `{}'", expect, actual),
            position: Some(position),
        }
    }

    pub fn parameter(
        device: &str,
        parameter: &str,
        text: impl ToString,
        reason: impl ToString,
    ) -> Self {
        SpiceError::Parameter {
            device: device.to_string(),
            parameter: parameter.to_string(),
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Errors after which the scope stack can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpiceError::Scope(_) | SpiceError::ElementLetter { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// 某一逻辑行上记录下来的错误
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// First and last physical source line (0-based, inclusive).
    pub lines: (usize, usize),
    pub error: SpiceError,
}

impl Diagnostic {
    pub fn error(lines: (usize, usize), error: SpiceError) -> Self {
        Self {
            severity: Severity::Error,
            lines,
            error,
        }
    }

    pub fn warning(lines: (usize, usize), error: SpiceError) -> Self {
        Self {
            severity: Severity::Warning,
            lines,
            error,
        }
    }

    /// Converts into a `codespan_reporting` diagnostic labelled over `range`,
    /// the byte range of the offending lines in the file `file_id`.
    pub fn to_report<FileId: Copy>(&self, file_id: FileId, range: Range<usize>) -> Report<FileId> {
        let report = match self.severity {
            Severity::Error => Report::error(),
            Severity::Warning => Report::warning(),
        };
        let mut label = Label::primary(file_id, range.clone());
        if let SpiceError::Lex { offset, .. } = &self.error {
            let at = range.start + offset;
            if at < range.end {
                label = Label::primary(file_id, at..at + 1);
            }
        }
        report
            .with_message(self.error.to_string())
            .with_labels(vec![label])
    }
}
