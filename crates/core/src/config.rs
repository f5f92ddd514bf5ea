use serde::{Deserialize, Serialize};

/// 解析选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Node name rewritten to `0` on every element pin.
    pub ground: String,
    /// Treat the first non-comment line as the netlist title.
    pub title_line: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            ground: "0".to_string(),
            title_line: true,
        }
    }
}

/// 输出选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Keep comments in the normalized output.
    pub comments: bool,
    /// Wrap longer lines with `+` continuations.
    pub line_length_max: Option<usize>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            comments: true,
            line_length_max: None,
        }
    }
}
