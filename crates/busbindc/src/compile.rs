//! Element event router and binding model builder.
//!
//! Consumes the tokenizer's enter/exit event stream, maintains the open
//! element stack for parent lookup, and drives the assembler. One pass,
//! fully synchronous; the only state is the node scope stack and the
//! method/signal scratch value consumed at the owning exit event.

use std::collections::BTreeMap;
use std::fmt;

use crate::assemble;
use crate::diagnostics::{Diagnostic, Report, Stage};
use crate::model::{
    Argument, BindingModel, Direction, MethodSpec, NodeBindingSet, PropertyAccess, PropertySpec,
    SignalSpec, TypeExpression,
};
use crate::signature::{decode_signature, SignatureError};
use crate::xml::{self, ElementEvent};

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Class-name stem substituted when a node carries no `cppname`.
    pub placeholder_stem: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            placeholder_stem: "NONAME_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Unterminated or unparsable document.
    Document,
    /// Malformed wire type signature; no partial model is useful.
    Signature,
}

impl CompileErrorKind {
    /// Diagnostic stage a fatal error of this kind is reported under.
    pub fn stage(self) -> Stage {
        match self {
            CompileErrorKind::Document => Stage::Parse,
            CompileErrorKind::Signature => Stage::Signature,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub line: Option<u64>,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub model: BindingModel,
    pub report: Report,
}

/// Compile one interface-description document into its binding model.
pub fn compile_document(
    xml_text: &str,
    options: &CompileOptions,
) -> Result<CompileOutput, CompileError> {
    let events = xml::read_document(xml_text).map_err(|err| CompileError {
        kind: CompileErrorKind::Document,
        message: err.message,
        line: err.line,
    })?;

    let mut compiler = Compiler::new(options);
    for event in events {
        compiler.handle(event)?;
    }
    Ok(compiler.finish())
}

pub(crate) struct MethodScratch {
    pub name: String,
    pub args: Vec<Argument>,
    pub ret: Option<TypeExpression>,
    pub ret_name: String,
    pub ordinal: usize,
}

pub(crate) struct SignalScratch {
    pub name: String,
    pub args: Vec<Argument>,
    pub ordinal: usize,
}

pub(crate) enum Unit {
    Method(MethodScratch),
    Signal(SignalScratch),
}

/// Everything accumulated for one open `node` element.
pub(crate) struct NodeScope {
    pub set: NodeBindingSet,
    pub interface: String,
    pub proxy_ctor: crate::model::Constructor,
    pub adapter_ctor: crate::model::Constructor,
    pub unit: Option<Unit>,
}

struct Compiler<'a> {
    options: &'a CompileOptions,
    stack: Vec<String>,
    scopes: Vec<NodeScope>,
    nodes: Vec<NodeBindingSet>,
    diagnostics: Vec<Diagnostic>,
}

fn attr<'m>(attrs: &'m BTreeMap<String, String>, name: &str) -> Option<&'m str> {
    attrs.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

fn underscored(name: &str) -> String {
    name.replace('.', "_")
}

impl<'a> Compiler<'a> {
    fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            scopes: Vec::new(),
            nodes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn warn(&mut self, code: &str, message: impl Into<String>, line: u64) {
        self.diagnostics
            .push(Diagnostic::warning(code, Stage::Model, message, Some(line)));
    }

    fn error(&mut self, code: &str, message: impl Into<String>, line: u64) {
        self.diagnostics
            .push(Diagnostic::error(code, Stage::Model, message, Some(line)));
    }

    fn handle(&mut self, event: ElementEvent) -> Result<(), CompileError> {
        match event {
            ElementEvent::Enter { name, attrs, line } => {
                let parent = self.stack.last().cloned();
                self.stack.push(name.clone());
                match name.as_str() {
                    "node" => self.enter_node(&attrs, line),
                    "interface" => self.enter_interface(&attrs, line),
                    "method" => self.enter_method(&attrs, line),
                    "signal" => self.enter_signal(&attrs, line),
                    "arg" => self.enter_arg(parent.as_deref(), &attrs, line)?,
                    "property" => self.enter_property(&attrs, line)?,
                    _ => {}
                }
            }
            ElementEvent::Exit { name, .. } => {
                self.stack.pop();
                match name.as_str() {
                    "method" => {
                        if let Some(scope) = self.scopes.last_mut() {
                            match scope.unit.take() {
                                Some(Unit::Method(m)) => assemble::finish_method(
                                    scope,
                                    MethodSpec {
                                        name: m.name,
                                        args: m.args,
                                        ret: m.ret,
                                        ret_name: m.ret_name,
                                    },
                                ),
                                other => scope.unit = other,
                            }
                        }
                    }
                    "signal" => {
                        if let Some(scope) = self.scopes.last_mut() {
                            match scope.unit.take() {
                                Some(Unit::Signal(s)) => assemble::finish_signal(
                                    scope,
                                    SignalSpec {
                                        name: s.name,
                                        args: s.args,
                                    },
                                ),
                                other => scope.unit = other,
                            }
                        }
                    }
                    "node" => {
                        if let Some(scope) = self.scopes.pop() {
                            self.nodes.push(assemble::finish_node(scope));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn enter_node(&mut self, attrs: &BTreeMap<String, String>, line: u64) {
        let namespace = attr(attrs, "gen-namespace").map(str::to_string);
        let destination = attr(attrs, "dest").map(str::to_string);
        if destination.is_none() {
            self.warn("BBC-NODE-0001", "no 'dest' attribute found on node", line);
        }
        let path = attr(attrs, "name")
            .or_else(|| attr(attrs, "path"))
            .map(str::to_string);
        if path.is_none() {
            self.warn(
                "BBC-NODE-0002",
                "no 'path' or 'name' attribute found on node",
                line,
            );
        }
        let stem = match attr(attrs, "cppname") {
            Some(cppname) => underscored(cppname),
            None => {
                self.warn(
                    "BBC-NODE-0003",
                    format!(
                        "no 'cppname' attribute found on node, using placeholder '{}'",
                        self.options.placeholder_stem
                    ),
                    line,
                );
                self.options.placeholder_stem.clone()
            }
        };
        self.scopes
            .push(assemble::start_node(&stem, namespace, destination, path));
    }

    fn enter_interface(&mut self, attrs: &BTreeMap<String, String>, line: u64) {
        let Some(name) = attr(attrs, "name") else {
            // The in-scope interface name is left as-is (empty at node
            // start), so later wiring registers against "".
            self.warn("BBC-IFACE-0001", "no name for interface found", line);
            return;
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.interface = name.to_string();
        }
    }

    fn enter_method(&mut self, attrs: &BTreeMap<String, String>, line: u64) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        scope.unit = None;
        let Some(name) = attr(attrs, "name") else {
            self.error("BBC-METHOD-0001", "no name for method found; ignoring", line);
            return;
        };
        let name = underscored(name);
        if let Some(scope) = self.scopes.last_mut() {
            scope.unit = Some(Unit::Method(MethodScratch {
                name,
                args: Vec::new(),
                ret: None,
                ret_name: String::new(),
                ordinal: 0,
            }));
        }
    }

    fn enter_signal(&mut self, attrs: &BTreeMap<String, String>, line: u64) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        scope.unit = None;
        let Some(name) = attr(attrs, "name") else {
            self.error("BBC-SIGNAL-0001", "no name for signal found; ignoring", line);
            return;
        };
        let name = underscored(name);
        if let Some(scope) = self.scopes.last_mut() {
            scope.unit = Some(Unit::Signal(SignalScratch {
                name,
                args: Vec::new(),
                ordinal: 0,
            }));
        }
    }

    fn enter_arg(
        &mut self,
        parent: Option<&str>,
        attrs: &BTreeMap<String, String>,
        line: u64,
    ) -> Result<(), CompileError> {
        let under_method = parent == Some("method");
        let under_signal = parent == Some("signal");
        if !under_method && !under_signal {
            return Ok(());
        }
        // A skipped (nameless) method or signal, or an arg outside any
        // node, contributes nothing; its events are ignored wholesale.
        let unit_matches = match self.scopes.last().and_then(|s| s.unit.as_ref()) {
            Some(Unit::Method(_)) => under_method,
            Some(Unit::Signal(_)) => under_signal,
            None => false,
        };
        if !unit_matches {
            return Ok(());
        }

        if under_method && attrs.get("direction").is_none() {
            self.warn(
                "BBC-ARG-0001",
                "no direction for arg found (assuming in)",
                line,
            );
        }
        let direction = attrs
            .get("direction")
            .and_then(|v| Direction::parse(v))
            .unwrap_or(Direction::In);

        let Some(type_attr) = attr(attrs, "type") else {
            self.error("BBC-ARG-0002", "no type for arg found; ignoring", line);
            return Ok(());
        };
        let ty = self.decode_type(type_attr, line)?;
        let name_attr = attr(attrs, "name").map(str::to_string);

        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        match (&mut scope.unit, under_method) {
            (Some(Unit::Method(m)), true) => {
                if direction == Direction::Out {
                    // Last out argument wins; its name only when present.
                    m.ret = Some(ty);
                    if let Some(name) = &name_attr {
                        m.ret_name = name.clone();
                    }
                } else {
                    let name = name_attr.unwrap_or_else(|| format!("arg{}", m.ordinal));
                    m.args.push(Argument { name, ty });
                }
                m.ordinal += 1;
            }
            (Some(Unit::Signal(s)), false) => {
                let name = name_attr.unwrap_or_else(|| format!("arg{}", s.ordinal));
                s.args.push(Argument { name, ty });
                s.ordinal += 1;
            }
            _ => {}
        }
        Ok(())
    }

    fn enter_property(
        &mut self,
        attrs: &BTreeMap<String, String>,
        line: u64,
    ) -> Result<(), CompileError> {
        if self.scopes.is_empty() {
            return Ok(());
        }

        let name = attr(attrs, "name").map(str::to_string);
        let type_attr = attr(attrs, "type").map(str::to_string);
        let access = attr(attrs, "access").map(str::to_string);
        if name.is_none() {
            self.error("BBC-PROP-0001", "no name found for property; ignoring", line);
        }
        if type_attr.is_none() {
            self.error("BBC-PROP-0002", "no type found for property; ignoring", line);
        }
        if access.is_none() {
            self.error(
                "BBC-PROP-0003",
                "no access found for property; ignoring",
                line,
            );
        }
        let (Some(name), Some(type_attr), Some(access)) = (name, type_attr, access) else {
            return Ok(());
        };

        let ty = self.decode_type(&type_attr, line)?;
        let Some(access) = PropertyAccess::parse(&access) else {
            self.warn(
                "BBC-PROP-0004",
                format!("unknown access {access:?} for property '{name}'"),
                line,
            );
            return Ok(());
        };

        if let Some(scope) = self.scopes.last_mut() {
            assemble::finish_property(scope, PropertySpec { name, ty, access });
        }
        Ok(())
    }

    /// Decode one type attribute. A malformed signature aborts the whole
    /// compilation; extra sibling types only draw a warning and the first
    /// type is used.
    fn decode_type(&mut self, signature: &str, line: u64) -> Result<TypeExpression, CompileError> {
        let decoded = decode_signature(signature).map_err(|err: SignatureError| CompileError {
            kind: CompileErrorKind::Signature,
            message: format!("in signature {signature:?}: {err}"),
            line: Some(line),
        })?;
        if decoded.types.len() > 1 {
            self.warn(
                "BBC-TYPE-0001",
                format!(
                    "signature {signature:?} holds {} top-level types, using the first",
                    decoded.types.len()
                ),
                line,
            );
        }
        if let Some(scope) = self.scopes.last_mut() {
            assemble::add_type_requires(scope, &decoded.requires);
        }
        let mut types = decoded.types;
        Ok(types.remove(0))
    }

    fn finish(self) -> CompileOutput {
        CompileOutput {
            model: BindingModel::new(self.nodes),
            report: Report::ok().with_diagnostics(self.diagnostics),
        }
    }
}
