//! Leaf vertices and labels of the workflow graph.

use std::fmt;

/// A named vertex of the state graph. Equality is by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
  id: String,
}

impl State {
  pub(crate) fn new(id: impl Into<String>) -> Self {
    Self { id: id.into() }
  }

  pub fn id(&self) -> &str {
    &self.id
  }
}

impl fmt::Display for State {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.id)
  }
}

/// A label that can trigger a transition. Equality is by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event {
  name: String,
}

impl Event {
  pub(crate) fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)
  }
}

/// A boolean flag declared by a workflow.
///
/// Each instance keeps its own value, starting from `initial_value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
  name: String,
  initial_value: bool,
}

impl Variable {
  pub(crate) fn new(name: impl Into<String>, initial_value: bool) -> Self {
    Self {
      name: name.into(),
      initial_value,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn initial_value(&self) -> bool {
    self.initial_value
  }
}
