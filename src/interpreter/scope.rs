use std::collections::{BTreeMap, HashMap};

use super::error::{Result, RuntimeError};
use super::graph::DependencyGraph;
use super::value::Value;

/// One frame: the program itself or a single function activation.
///
/// A name can be declared without a value; reading it then is an
/// [`RuntimeError::UninitializedVariable`], which is distinct from reading a
/// name that was never declared.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Option<Value>>,
    graph: DependencyGraph,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str) -> Result<()> {
        if self.vars.contains_key(name) {
            return Err(RuntimeError::DuplicateDeclaration { name: name.to_string() });
        }
        self.vars.insert(name.to_string(), None);
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn read(&self, name: &str) -> Result<&Value> {
        match self.vars.get(name) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(RuntimeError::UninitializedVariable { name: name.to_string() }),
            None => Err(RuntimeError::UndefinedVariable { name: name.to_string() }),
        }
    }

    /// Current value without error reporting; `None` if unset or undeclared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name).and_then(Option::as_ref)
    }

    pub fn write(&mut self, name: &str, value: Value) -> Result<()> {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(RuntimeError::UndefinedVariable { name: name.to_string() }),
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    /// Every declared name with its value, sorted by name.
    pub fn values(&self) -> BTreeMap<String, Option<Value>> {
        self.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
