//! 作用域栈与网表模型
//!
//! The builder keeps an explicit stack of open scopes. The bottom frame is
//! the top level and is never popped; `.subckt`, `.control` and `.if` push,
//! their closing commands pop and attach the finished block to the parent.

use serde::Serialize;

use crate::{
    ast::Ast,
    command::{Command, Library, Model, SubcircuitHeader},
    device::Element,
    error::{Diagnostic, SpiceError, SpiceResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    TopLevel,
    Subcircuit,
    ControlBlock,
    ConditionalBlock,
}

/// 子电路定义
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subcircuit {
    pub name: String,
    pub nodes: Vec<String>,
    pub defaults: Vec<(String, Ast)>,
    pub statements: Vec<Statement>,
}

/// One arm of an `.if` block; `.else` has no condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub condition: Option<Ast>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Statement {
    /// Never one of the structural commands.
    Command(Command),
    Subcircuit(Subcircuit),
    Control(Vec<Statement>),
    Conditional(Vec<Branch>),
}

enum Frame {
    TopLevel(Vec<Statement>),
    Subcircuit(Subcircuit),
    Control(Vec<Statement>),
    Conditional(Vec<Branch>),
}

impl Frame {
    fn kind(&self) -> ScopeKind {
        match self {
            Frame::TopLevel(_) => ScopeKind::TopLevel,
            Frame::Subcircuit(_) => ScopeKind::Subcircuit,
            Frame::Control(_) => ScopeKind::ControlBlock,
            Frame::Conditional(_) => ScopeKind::ConditionalBlock,
        }
    }

    fn statements(&mut self) -> &mut Vec<Statement> {
        match self {
            Frame::TopLevel(statements) | Frame::Control(statements) => statements,
            Frame::Subcircuit(subcircuit) => &mut subcircuit.statements,
            Frame::Conditional(branches) => {
                if branches.is_empty() {
                    branches.push(Branch {
                        condition: None,
                        statements: Vec::new(),
                    });
                }
                let last = branches.len() - 1;
                &mut branches[last].statements
            }
        }
    }
}

/// 作用域栈
pub struct NetlistBuilder {
    stack: Vec<Frame>,
    title: Option<String>,
    titles: Vec<String>,
    includes: Vec<String>,
    libraries: Vec<Library>,
    models: Vec<Model>,
    subcircuits: Vec<String>,
    finished: bool,
}

impl Default for NetlistBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetlistBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![Frame::TopLevel(Vec::new())],
            title: None,
            titles: Vec::new(),
            includes: Vec::new(),
            libraries: Vec::new(),
            models: Vec::new(),
            subcircuits: Vec::new(),
            finished: false,
        }
    }

    pub fn scope(&self) -> ScopeKind {
        self.stack
            .last()
            .map_or(ScopeKind::TopLevel, Frame::kind)
    }

    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Lines of a `.control` block are not SPICE syntax.
    pub fn in_control(&self) -> bool {
        self.scope() == ScopeKind::ControlBlock
    }

    /// Set once `.end` has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn append(&mut self, statement: Statement) {
        if let Some(frame) = self.stack.last_mut() {
            frame.statements().push(statement);
        }
    }

    fn pop(&mut self, expected: ScopeKind, command: &str) -> SpiceResult<Frame> {
        if self.stack.len() > 1 && self.scope() == expected {
            if let Some(frame) = self.stack.pop() {
                log::debug!("leave {:?} with `{}'", expected, command);
                return Ok(frame);
            }
        }
        Err(SpiceError::Scope(format!(
            "`{}' in {:?} scope, expected {:?}",
            command,
            self.scope(),
            expected
        )))
    }

    fn open(&mut self, frame: Frame) {
        log::debug!("enter {:?}", frame.kind());
        self.stack.push(frame);
    }

    /// Feeds one classified line into the current scope.
    pub fn push(&mut self, command: Command) -> SpiceResult<()> {
        if self.finished {
            return Ok(());
        }
        match command {
            Command::Subcircuit(SubcircuitHeader {
                name,
                nodes,
                defaults,
            }) => {
                self.subcircuits.push(name.clone());
                self.open(Frame::Subcircuit(Subcircuit {
                    name,
                    nodes,
                    defaults,
                    statements: Vec::new(),
                }));
            }
            Command::EndSubcircuit(name) => {
                let Frame::Subcircuit(subcircuit) = self.pop(ScopeKind::Subcircuit, ".ends")? else {
                    return Err(SpiceError::Scope("unbalanced scope stack".to_string()));
                };
                if let Some(name) = name {
                    if !name.eq_ignore_ascii_case(&subcircuit.name) {
                        return Err(SpiceError::Scope(format!(
                            "`.ends {}' closes subcircuit `{}'",
                            name, subcircuit.name
                        )));
                    }
                }
                self.append(Statement::Subcircuit(subcircuit));
            }
            Command::Control => self.open(Frame::Control(Vec::new())),
            Command::EndControl => {
                let Frame::Control(statements) = self.pop(ScopeKind::ControlBlock, ".endc")? else {
                    return Err(SpiceError::Scope("unbalanced scope stack".to_string()));
                };
                self.append(Statement::Control(statements));
            }
            Command::If(condition) => self.open(Frame::Conditional(vec![Branch {
                condition: Some(condition),
                statements: Vec::new(),
            }])),
            Command::ElseIf(condition) => self.branch(".elseif", Some(condition))?,
            Command::Else => self.branch(".else", None)?,
            Command::EndIf => {
                let Frame::Conditional(branches) =
                    self.pop(ScopeKind::ConditionalBlock, ".endif")?
                else {
                    return Err(SpiceError::Scope("unbalanced scope stack".to_string()));
                };
                self.append(Statement::Conditional(branches));
            }
            Command::End => {
                if self.depth() > 0 {
                    log::debug!("`.end' with {} open scope(s)", self.depth());
                }
                self.finished = true;
            }
            command => {
                match &command {
                    Command::Title(title) => {
                        self.title.get_or_insert_with(|| title.clone());
                        self.titles.push(title.clone());
                    }
                    Command::Include(path) => self.includes.push(path.clone()),
                    Command::Library(library) => self.libraries.push(library.clone()),
                    Command::Model(model) => self.models.push(model.clone()),
                    _ => {}
                }
                self.append(Statement::Command(command));
            }
        }
        Ok(())
    }

    fn branch(&mut self, command: &str, condition: Option<Ast>) -> SpiceResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Conditional(branches)) => {
                if branches.last().is_some_and(|branch| branch.condition.is_none()) {
                    return Err(SpiceError::Scope(format!("`{}' after `.else'", command)));
                }
                branches.push(Branch {
                    condition,
                    statements: Vec::new(),
                });
                Ok(())
            }
            _ => Err(SpiceError::Scope(format!(
                "`{}' outside of an `.if' block",
                command
            ))),
        }
    }

    /// Closes the build. Scopes still open (a file ending, or `.end`,
    /// inside `.subckt`) are folded into their parents.
    pub fn finish(mut self, diagnostics: Vec<Diagnostic>) -> Netlist {
        while self.stack.len() > 1 {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            let statement = match frame {
                Frame::TopLevel(_) => continue,
                Frame::Subcircuit(subcircuit) => Statement::Subcircuit(subcircuit),
                Frame::Control(statements) => Statement::Control(statements),
                Frame::Conditional(branches) => Statement::Conditional(branches),
            };
            self.append(statement);
        }
        let statements = match self.stack.pop() {
            Some(Frame::TopLevel(statements)) => statements,
            _ => Vec::new(),
        };
        Netlist {
            title: self.title,
            statements,
            titles: self.titles,
            includes: self.includes,
            libraries: self.libraries,
            models: self.models,
            subcircuits: self.subcircuits,
            diagnostics,
        }
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Netlist {
    pub title: Option<String>,
    pub statements: Vec<Statement>,
    /// Every `.title` and the title line, at any depth.
    pub titles: Vec<String>,
    pub includes: Vec<String>,
    pub libraries: Vec<Library>,
    pub models: Vec<Model>,
    /// Names of all defined subcircuits, at any depth.
    pub subcircuits: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Receives the netlist content, once per element, model and subcircuit.
pub trait CircuitBuilder {
    type Error;

    fn element(&mut self, element: &Element) -> Result<(), Self::Error>;

    fn model(&mut self, _model: &Model) -> Result<(), Self::Error> {
        Ok(())
    }

    fn enter_subcircuit(&mut self, _subcircuit: &Subcircuit) -> Result<(), Self::Error> {
        Ok(())
    }

    fn leave_subcircuit(&mut self, _subcircuit: &Subcircuit) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn visit_statements<B: CircuitBuilder>(
    statements: &[Statement],
    builder: &mut B,
) -> Result<(), B::Error> {
    for statement in statements {
        match statement {
            Statement::Command(Command::Element(element)) => builder.element(element)?,
            Statement::Command(Command::Model(model)) => builder.model(model)?,
            Statement::Command(_) | Statement::Control(_) => {}
            Statement::Subcircuit(subcircuit) => {
                builder.enter_subcircuit(subcircuit)?;
                visit_statements(&subcircuit.statements, builder)?;
                builder.leave_subcircuit(subcircuit)?;
            }
            Statement::Conditional(branches) => {
                for branch in branches {
                    visit_statements(&branch.statements, builder)?;
                }
            }
        }
    }
    Ok(())
}

impl Netlist {
    /// Depth-first walk over elements, models and subcircuits.
    pub fn visit<B: CircuitBuilder>(&self, builder: &mut B) -> Result<(), B::Error> {
        visit_statements(&self.statements, builder)
    }

    /// Top-level elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Command(Command::Element(element)) => Some(element),
            _ => None,
        })
    }

    /// Top-level subcircuit definitions.
    pub fn subcircuit_definitions(&self) -> impl Iterator<Item = &Subcircuit> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Subcircuit(subcircuit) => Some(subcircuit),
            _ => None,
        })
    }

    pub fn subcircuit(&self, name: &str) -> Option<&Subcircuit> {
        self.subcircuit_definitions()
            .find(|subcircuit| subcircuit.name.eq_ignore_ascii_case(name))
    }

    /// A library of subcircuits: no top-level element or model.
    pub fn is_only_subcircuit(&self) -> bool {
        self.subcircuit_definitions().next().is_some()
            && self.elements().next().is_none()
            && !self.has_top_level_model()
    }

    /// A library of models: no element and no subcircuit.
    pub fn is_only_model(&self) -> bool {
        self.has_top_level_model()
            && self.elements().next().is_none()
            && self.subcircuit_definitions().next().is_none()
    }

    fn has_top_level_model(&self) -> bool {
        self.statements
            .iter()
            .any(|statement| matches!(statement, Statement::Command(Command::Model(_))))
    }
}
