//! 语句分类
//!
//! Each parsed logical line becomes exactly one [`Command`]. Structural
//! commands (`.subckt`, `.ends`, `.control`, `.if`, ...) are interpreted by
//! the scope builder in [`crate::netlist`]; everything else ends up as a
//! statement of the current scope.

use serde::Serialize;

use crate::{
    ast::{Ast, ListKind},
    config::ParserOptions,
    device::{bind_element, DeviceRegistry, Element},
    error::{SpiceError, SpiceResult},
};

/// 可识别的点命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DotCommandKind {
    Ac,
    Control,
    Csparam,
    Dc,
    Disto,
    Else,
    Elseif,
    End,
    Endc,
    Endif,
    Ends,
    Four,
    Func,
    Global,
    Ic,
    If,
    Include,
    Lib,
    Meas,
    Model,
    Nodeset,
    Noise,
    Op,
    Options,
    Param,
    Plot,
    Print,
    Probe,
    Pss,
    Pz,
    Save,
    Sens,
    Subckt,
    Temp,
    Tf,
    Title,
    Tran,
    Width,
}

impl DotCommandKind {
    pub const ALL: [DotCommandKind; 38] = [
        Self::Ac,
        Self::Control,
        Self::Csparam,
        Self::Dc,
        Self::Disto,
        Self::Else,
        Self::Elseif,
        Self::End,
        Self::Endc,
        Self::Endif,
        Self::Ends,
        Self::Four,
        Self::Func,
        Self::Global,
        Self::Ic,
        Self::If,
        Self::Include,
        Self::Lib,
        Self::Meas,
        Self::Model,
        Self::Nodeset,
        Self::Noise,
        Self::Op,
        Self::Options,
        Self::Param,
        Self::Plot,
        Self::Print,
        Self::Probe,
        Self::Pss,
        Self::Pz,
        Self::Save,
        Self::Sens,
        Self::Subckt,
        Self::Temp,
        Self::Tf,
        Self::Title,
        Self::Tran,
        Self::Width,
    ];

    /// Canonical spelling, with the leading dot.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ac => ".ac",
            Self::Control => ".control",
            Self::Csparam => ".csparam",
            Self::Dc => ".dc",
            Self::Disto => ".disto",
            Self::Else => ".else",
            Self::Elseif => ".elseif",
            Self::End => ".end",
            Self::Endc => ".endc",
            Self::Endif => ".endif",
            Self::Ends => ".ends",
            Self::Four => ".four",
            Self::Func => ".func",
            Self::Global => ".global",
            Self::Ic => ".ic",
            Self::If => ".if",
            Self::Include => ".include",
            Self::Lib => ".lib",
            Self::Meas => ".meas",
            Self::Model => ".model",
            Self::Nodeset => ".nodeset",
            Self::Noise => ".noise",
            Self::Op => ".op",
            Self::Options => ".options",
            Self::Param => ".param",
            Self::Plot => ".plot",
            Self::Print => ".print",
            Self::Probe => ".probe",
            Self::Pss => ".pss",
            Self::Pz => ".pz",
            Self::Save => ".save",
            Self::Sens => ".sens",
            Self::Subckt => ".subckt",
            Self::Temp => ".temp",
            Self::Tf => ".tf",
            Self::Title => ".title",
            Self::Tran => ".tran",
            Self::Width => ".width",
        }
    }

    /// Case-insensitive lookup, accepting `.inc`, `.option`, `.opt`,
    /// `.fourier` and `.measure` as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let name = match name.as_str() {
            ".inc" => ".include",
            ".option" | ".opt" => ".options",
            ".fourier" => ".four",
            ".measure" => ".meas",
            other => other,
        };
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// `.model <name> <type> [(] <key>=<value>* [)]`
///
/// e.g.
///
/// - `.model D1N4148 D (is=2.52n rs=0.568 n=1.752)`
/// - `.model QMOD NPN BF=50 IS=1e-13`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: String,
    pub kind: String,
    pub parameters: Vec<(String, Ast)>,
}

/// `.subckt <name> <node>* [params:] <key>=<value>*`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcircuitHeader {
    pub name: String,
    pub nodes: Vec<String>,
    pub defaults: Vec<(String, Ast)>,
}

/// 函数定义
///
/// - `.func <name>(<arg>*) {<body>}`
/// - `.func <name>(<arg>*) = {<body>}`
///
/// e.g.
///
/// - `.func TRIWAV(x) {ACOS(COS(x))/3.14159}`
/// - `.func MIN3(A,B,C) {MIN(A,MIN(B,C))}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub variables: Vec<String>,
    pub expression: Ast,
}

/// `.lib <path> [<entry>]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Library {
    pub path: String,
    pub entry: Option<String>,
}

/// 一条已分类的逻辑行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    Element(Element),
    Model(Model),
    Subcircuit(SubcircuitHeader),
    /// `.ends [<name>]`
    EndSubcircuit(Option<String>),
    /// `.param` / `.csparam`
    Parameters {
        kind: DotCommandKind,
        assignments: Vec<(String, Ast)>,
    },
    Function(FunctionDefinition),
    Global(Vec<String>),
    Include(String),
    Library(Library),
    Title(String),
    Temperature(Vec<Ast>),
    If(Ast),
    ElseIf(Ast),
    Else,
    EndIf,
    Control,
    EndControl,
    End,
    /// Analyses, output requests, options, initial conditions.
    DotCommand {
        kind: DotCommandKind,
        arguments: Vec<Ast>,
    },
    /// A line of a `.control` block, kept as written.
    ControlCommand(String),
    /// Dot-command this parser does not know, kept as is.
    Unknown {
        name: String,
        arguments: Vec<Ast>,
    },
}

fn syntax(reason: String) -> SpiceError {
    SpiceError::Syntax {
        reason,
        position: None,
    }
}

fn assignment(command: &str, ast: &Ast) -> SpiceResult<(String, Ast)> {
    match ast {
        Ast::Set { key, value } => {
            let key = match key.as_ref() {
                Ast::Id(name) => name.clone(),
                other => other.to_string(),
            };
            Ok((key, value.as_ref().clone()))
        }
        other => Err(syntax(format!(
            "{} expects `name=value', found `{}'",
            command, other
        ))),
    }
}

fn assignments(command: &str, items: &[Ast]) -> SpiceResult<Vec<(String, Ast)>> {
    items.iter().map(|item| assignment(command, item)).collect()
}

fn name(command: &str, what: &str, ast: Option<&Ast>) -> SpiceResult<String> {
    ast.and_then(Ast::leaf_text)
        .ok_or_else(|| syntax(format!("{} expects {}", command, what)))
}

fn nodes(command: &str, items: &[Ast]) -> SpiceResult<Vec<String>> {
    items
        .iter()
        .map(|item| name(command, "node names", Some(item)))
        .collect()
}

fn condition(command: &str, children: &[Ast]) -> SpiceResult<Ast> {
    match children {
        [condition] => Ok(condition.clone()),
        _ => Err(syntax(format!("{} expects a single condition", command))),
    }
}

fn model(children: &[Ast]) -> SpiceResult<Model> {
    let name = name(".model", "a model name", children.first())?;
    let (kind, parameters) = match children.get(1) {
        // `.model name TYPE(...)`, with or without a space
        Some(Ast::Function { name, arguments }) => {
            let items = match arguments.as_ref() {
                Ast::List { items, .. } => items.as_slice(),
                other => std::slice::from_ref(other),
            };
            (name.clone(), assignments(".model", items)?)
        }
        Some(Ast::Id(kind)) => {
            let rest = &children[2..];
            let items = match rest {
                [Ast::Group { inner, .. }] => match inner.as_ref() {
                    Ast::List {
                        kind: ListKind::Space,
                        items,
                    } => assignments(".model", items)?,
                    single => vec![assignment(".model", single)?],
                },
                _ => assignments(".model", rest)?,
            };
            (kind.clone(), items)
        }
        _ => return Err(syntax(".model expects a device type".to_string())),
    };
    Ok(Model {
        name,
        kind,
        parameters,
    })
}

fn subcircuit(children: &[Ast]) -> SpiceResult<SubcircuitHeader> {
    let name = name(".subckt", "a subcircuit name", children.first())?;
    let rest = children.get(1..).unwrap_or_default();
    let split = rest.iter().position(Ast::is_set).unwrap_or(rest.len());
    Ok(SubcircuitHeader {
        name,
        nodes: nodes(".subckt", &rest[..split])?,
        defaults: assignments(".subckt", &rest[split..])?,
    })
}

fn function(children: &[Ast]) -> SpiceResult<FunctionDefinition> {
    let (signature, expression) = match children {
        [signature, expression] => (signature, expression.clone()),
        [Ast::Set { key, value }] => (key.as_ref(), value.as_ref().clone()),
        _ => return Err(syntax(".func expects a signature and a body".to_string())),
    };
    let Ast::Function { name, arguments } = signature else {
        return Err(syntax(format!(".func expects `name(args)', found `{}'", signature)));
    };
    let variables = match arguments.as_ref() {
        Ast::List { items, .. } => nodes(".func", items)?,
        other => vec![self::name(".func", "variable names", Some(other))?],
    };
    Ok(FunctionDefinition {
        name: name.clone(),
        variables,
        expression,
    })
}

/// 对一条点命令或元件行分类
///
/// Element lines are bound against `registry` here, so device errors
/// (`ElementLetter`, `PinCount`, `Parameter`) surface from this call.
pub fn classify(
    ast: &Ast,
    registry: &DeviceRegistry,
    options: &ParserOptions,
) -> SpiceResult<Command> {
    let (command_name, children) = match ast {
        Ast::Command { .. } => return bind_element(ast, registry, options).map(Command::Element),
        Ast::DotCommand { name, children } => (name.as_str(), children.as_slice()),
        other => return Err(syntax(format!("`{}' is not a statement", other))),
    };

    let Some(kind) = DotCommandKind::from_name(command_name) else {
        log::warn!("unknown dot-command `{}', kept as is", command_name);
        return Ok(Command::Unknown {
            name: command_name.to_string(),
            arguments: children.to_vec(),
        });
    };

    use DotCommandKind as K;
    let command = match kind {
        K::Model => Command::Model(model(children)?),
        K::Subckt => Command::Subcircuit(subcircuit(children)?),
        K::Ends => Command::EndSubcircuit(children.first().and_then(Ast::leaf_text)),
        K::Param | K::Csparam => Command::Parameters {
            kind,
            assignments: assignments(kind.name(), children)?,
        },
        K::Func => Command::Function(function(children)?),
        K::Global => Command::Global(nodes(".global", children)?),
        K::Include => Command::Include(name(".include", "a path", children.first())?),
        K::Lib => Command::Library(Library {
            path: name(".lib", "a path", children.first())?,
            entry: children.get(1).and_then(Ast::leaf_text),
        }),
        K::Title => Command::Title(
            children
                .first()
                .and_then(Ast::leaf_text)
                .unwrap_or_default(),
        ),
        K::Temp => Command::Temperature(children.to_vec()),
        K::If => Command::If(condition(".if", children)?),
        K::Elseif => Command::ElseIf(condition(".elseif", children)?),
        K::Else => Command::Else,
        K::Endif => Command::EndIf,
        K::Control => Command::Control,
        K::Endc => Command::EndControl,
        K::End => Command::End,
        K::Ac
        | K::Dc
        | K::Disto
        | K::Four
        | K::Ic
        | K::Meas
        | K::Nodeset
        | K::Noise
        | K::Op
        | K::Options
        | K::Plot
        | K::Print
        | K::Probe
        | K::Pss
        | K::Pz
        | K::Save
        | K::Sens
        | K::Tf
        | K::Tran
        | K::Width => Command::DotCommand {
            kind,
            arguments: children.to_vec(),
        },
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_line;

    fn classify_line(line: &str) -> SpiceResult<Command> {
        classify(
            &parse_line(line).unwrap(),
            DeviceRegistry::shared(),
            &ParserOptions::default(),
        )
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DotCommandKind::from_name(".TRAN"), Some(DotCommandKind::Tran));
        assert_eq!(DotCommandKind::from_name(".inc"), Some(DotCommandKind::Include));
        assert_eq!(DotCommandKind::from_name(".opt"), Some(DotCommandKind::Options));
        assert_eq!(DotCommandKind::from_name(".measure"), Some(DotCommandKind::Meas));
        assert_eq!(DotCommandKind::from_name(".endl"), None);
        for kind in DotCommandKind::ALL {
            assert_eq!(DotCommandKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_model() {
        let Ok(Command::Model(model)) = classify_line(".model D1N4148 D (is=2.52n n=1.752)") else {
            panic!("not a model");
        };
        assert_eq!(model.name, "D1N4148");
        assert_eq!(model.kind, "D");
        assert_eq!(model.parameters.len(), 2);
        assert_eq!(model.parameters[0].0, "is");

        let Ok(Command::Model(model)) = classify_line(".model QMOD NPN BF=50 IS=1e-13") else {
            panic!("not a model");
        };
        assert_eq!(model.kind, "NPN");
        assert_eq!(model.parameters[0], ("BF".to_string(), Ast::Integer(50)));

        assert!(classify_line(".model QMOD").is_err());
    }

    #[test]
    fn test_subcircuit_and_func() {
        assert_eq!(
            classify_line(".subckt opamp in out vdd PARAMS: gain=10"),
            Ok(Command::Subcircuit(SubcircuitHeader {
                name: "opamp".to_string(),
                nodes: vec!["in".to_string(), "out".to_string(), "vdd".to_string()],
                defaults: vec![("gain".to_string(), Ast::Integer(10))],
            }))
        );
        assert_eq!(
            classify_line(".ends opamp"),
            Ok(Command::EndSubcircuit(Some("opamp".to_string())))
        );

        let Ok(Command::Function(function)) = classify_line(".func MIN3(A,B,C) {MIN(A,MIN(B,C))}") else {
            panic!("not a function");
        };
        assert_eq!(function.name, "MIN3");
        assert_eq!(function.variables, ["A", "B", "C"]);
        assert!(matches!(function.expression, Ast::Group { .. }));
    }

    #[test]
    fn test_misc_commands() {
        assert_eq!(
            classify_line(".lib /opt/models.lib tt"),
            Ok(Command::Library(Library {
                path: "/opt/models.lib".to_string(),
                entry: Some("tt".to_string())
            }))
        );
        assert_eq!(
            classify_line(".lib \"/opt/my models.lib\" ff"),
            Ok(Command::Library(Library {
                path: "/opt/my models.lib".to_string(),
                entry: Some("ff".to_string())
            }))
        );
        assert_eq!(
            classify_line(".include models.cir"),
            Ok(Command::Include("models.cir".to_string()))
        );
        assert_eq!(
            classify_line(".global vdd vss"),
            Ok(Command::Global(vec!["vdd".to_string(), "vss".to_string()]))
        );
        assert!(matches!(
            classify_line(".tran 1n 10u"),
            Ok(Command::DotCommand { kind: DotCommandKind::Tran, arguments }) if arguments.len() == 2
        ));
        assert!(matches!(classify_line(".if (a == 1)"), Ok(Command::If(_))));
        assert!(classify_line(".param a").is_err());
        assert!(matches!(classify_line(".frobnicate 1 2"), Ok(Command::Unknown { .. })));
        assert!(matches!(classify_line("R1 1 2 1k"), Ok(Command::Element(_))));
    }
}
