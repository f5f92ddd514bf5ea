//! Spice 网表解析器核心库
//!
//! 处理流程：[`source`] 合并续行与注释，[`lexer`] 和 [`parse`] 把每条逻辑行
//! 解析成 [`ast::Ast`]，[`command`] 借助 [`device`] 注册表把它归类，
//! [`netlist`] 用作用域栈组装成层次化网表，[`writer`] 再输出规范化文本。

/// 抽象语法树
pub mod ast;
/// 命令归类
pub mod command;
/// 解析与输出选项
pub mod config;
/// 器件描述与注册表
pub mod device;
/// 错误类型
pub mod error;
/// 词法解析器
pub mod lexer;
/// 作用域与网表模型
pub mod netlist;
/// 语法解析工具
pub mod parse;
/// 逻辑行预处理
pub mod source;
/// 值解析
pub mod value;
/// 规范化输出
pub mod writer;

pub use parse::{parse_expression, parse_line};

use config::ParserOptions;
use device::DeviceRegistry;
use error::SpiceResult;
use netlist::Netlist;
use source::SpiceSource;

/// 用内置器件表和默认选项解析整个网表
///
/// ```
/// let netlist = spice_netlist_core::parse_netlist("rc\nR1 in out 1k\nC1 out 0 1u\n.end\n").unwrap();
/// assert_eq!(netlist.elements().count(), 2);
/// assert!(netlist.diagnostics.is_empty());
/// ```
pub fn parse_netlist(text: &str) -> SpiceResult<Netlist> {
    SpiceSource::parse(text, DeviceRegistry::shared(), &ParserOptions::default())
        .map(SpiceSource::into_netlist)
}

#[cfg(test)]
#[macro_export]
macro_rules! spice_test_ok {
    ($text:expr, $expected:expr) => {{
        use $crate::parse::{TokenStream, TryParse};
        let tokens = $crate::lexer::tokenize($text).unwrap();
        let mut parser = $crate::parse::SpiceLineParser::new(&tokens);
        let result: $crate::error::SpiceResult<$crate::ast::Ast> = parser.try_parse();
        assert_eq!(result, Ok($expected));
        assert!(parser.is_eof());
    }};
}

#[cfg(test)]
#[macro_export]
macro_rules! spice_test_err {
    ($text:expr) => {{
        use $crate::parse::{TokenStream, TryParse};
        let failed = match $crate::lexer::tokenize($text) {
            Err(_) => true,
            Ok(tokens) => {
                let mut parser = $crate::parse::SpiceLineParser::new(&tokens);
                let result: $crate::error::SpiceResult<$crate::ast::Ast> = parser.try_parse();
                result.is_err() || !parser.is_eof()
            }
        };
        assert!(failed, "`{}' should not parse", $text);
    }};
}
