//! Build-graph writer contract.
//!
//! Toolchains describe variables, rules and build statements; a
//! [`BuildWriter`] records them. [`NinjaWriter`] renders ninja syntax and
//! [`Recorder`] keeps everything in memory.

use std::collections::HashSet;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolchainError};
use crate::flags::FlagSet;

/// A variable value: a scalar or a token list joined by spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl Value {
    /// The value as it appears on the right of `name = `.
    pub fn render(&self) -> String {
        match self {
            Value::Scalar(s) => s.clone(),
            Value::List(tokens) => tokens.join(" "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Scalar(s) => s.is_empty(),
            Value::List(tokens) => tokens.is_empty(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<FlagSet> for Value {
    fn from(flags: FlagSet) -> Self {
        Value::List(flags.into_vec())
    }
}

impl From<Vec<String>> for Value {
    fn from(tokens: Vec<String>) -> Self {
        Value::List(tokens)
    }
}

/// A named value exported to the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBinding {
    pub name: String,
    pub value: Value,
}

/// An ordered set of bindings in which each name appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings(Vec<VariableBinding>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`; binding a name that is already bound is an error.
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.get(name).is_some() {
            return Err(ToolchainError::DuplicateVariable { name: name.into() });
        }
        self.0.push(VariableBinding {
            name: name.into(),
            value: value.into(),
        });
        Ok(())
    }

    /// Bind `name` only when `flags` is non-empty.
    pub fn bind_flags(&mut self, name: &str, flags: FlagSet) -> Result<()> {
        if flags.is_empty() {
            return Ok(());
        }
        self.bind(name, flags)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|b| b.name == name).map(|b| &b.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableBinding> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a VariableBinding;
    type IntoIter = std::slice::Iter<'a, VariableBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A command template with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    /// Command with `$name` substitutions.
    pub command: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depfile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<String>,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            description: description.into(),
            depfile: None,
            deps: None,
        }
    }

    /// Attach a gcc-style dependency file.
    pub fn with_depfile(mut self, depfile: impl Into<String>, deps: impl Into<String>) -> Self {
        self.depfile = Some(depfile.into());
        self.deps = Some(deps.into());
        self
    }
}

/// One build statement: outputs produced by a rule from inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatement {
    pub outputs: Vec<String>,
    pub rule: String,
    pub inputs: Vec<String>,
    pub implicit: Vec<String>,
    /// Statement-scoped variable overrides.
    pub variables: Bindings,
}

/// Receiver of toolchain variables, rules and build statements.
pub trait BuildWriter {
    fn variable(&mut self, name: &str, value: &Value) -> Result<()>;

    fn rule(&mut self, rule: &Rule) -> Result<()>;

    fn build(&mut self, statement: &BuildStatement) -> Result<()>;

    /// Visual separator between sections. No-op by default.
    fn newline(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Escape a path for a ninja `build` line.
pub fn escape_path(path: &str) -> String {
    path.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

/// Renders ninja syntax to any `io::Write`.
#[derive(Debug)]
pub struct NinjaWriter<W: Write> {
    out: W,
    variables: HashSet<String>,
    rules: HashSet<String>,
}

impl<W: Write> NinjaWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            variables: HashSet::new(),
            rules: HashSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render `value`, which ninja requires to fit on one line.
fn single_line(name: &str, value: &Value) -> Result<String> {
    let text = value.render();
    if text.contains(['\n', '\r']) {
        return Err(ToolchainError::MultilineValue { name: name.into() });
    }
    Ok(text)
}

impl<W: Write> BuildWriter for NinjaWriter<W> {
    fn variable(&mut self, name: &str, value: &Value) -> Result<()> {
        let text = single_line(name, value)?;
        if !self.variables.insert(name.to_string()) {
            return Err(ToolchainError::DuplicateVariable { name: name.into() });
        }
        writeln!(self.out, "{name} = {text}")?;
        Ok(())
    }

    fn rule(&mut self, rule: &Rule) -> Result<()> {
        if !self.rules.insert(rule.name.clone()) {
            return Err(ToolchainError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
        writeln!(self.out, "rule {}", rule.name)?;
        writeln!(self.out, "  command = {}", rule.command)?;
        if let Some(depfile) = &rule.depfile {
            writeln!(self.out, "  depfile = {depfile}")?;
        }
        if let Some(deps) = &rule.deps {
            writeln!(self.out, "  deps = {deps}")?;
        }
        writeln!(self.out, "  description = {}", rule.description)?;
        Ok(())
    }

    fn build(&mut self, statement: &BuildStatement) -> Result<()> {
        let join = |paths: &[String]| {
            paths
                .iter()
                .map(|p| escape_path(p))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let mut line = format!("build {}: {}", join(&statement.outputs), statement.rule);
        if !statement.inputs.is_empty() {
            line.push(' ');
            line.push_str(&join(&statement.inputs));
        }
        if !statement.implicit.is_empty() {
            line.push_str(" | ");
            line.push_str(&join(&statement.implicit));
        }
        for binding in &statement.variables {
            let text = single_line(&binding.name, &binding.value)?;
            line.push_str(&format!("\n  {} = {text}", binding.name));
        }
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn newline(&mut self) -> Result<()> {
        writeln!(self.out)?;
        Ok(())
    }
}

/// Keeps everything written in memory, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recorder {
    pub variables: Bindings,
    pub rules: Vec<Rule>,
    pub builds: Vec<BuildStatement>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule_named(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// The statement producing `output`.
    pub fn build_for(&self, output: &str) -> Option<&BuildStatement> {
        self.builds
            .iter()
            .find(|b| b.outputs.iter().any(|o| o == output))
    }
}

impl BuildWriter for Recorder {
    fn variable(&mut self, name: &str, value: &Value) -> Result<()> {
        self.variables.bind(name, value.clone())
    }

    fn rule(&mut self, rule: &Rule) -> Result<()> {
        if self.rule_named(&rule.name).is_some() {
            return Err(ToolchainError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
        self.rules.push(rule.clone());
        Ok(())
    }

    fn build(&mut self, statement: &BuildStatement) -> Result<()> {
        self.builds.push(statement.clone());
        Ok(())
    }
}
