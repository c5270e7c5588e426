use serde::{Deserialize, Serialize};

use crate::action::ActionDef;
use crate::condition::ConditionDef;

/// A lifecycle definition as authored, before it is built into a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  #[serde(default)]
  pub name: String,
  pub states: Vec<StateDef>,
  #[serde(default)]
  pub variables: Vec<VariableDef>,
  pub events: Vec<EventDef>,
  #[serde(default)]
  pub transitions: Vec<TransitionDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDef {
  pub id: String,
  /// Exactly one state of a definition must be initial.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub initial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDef {
  pub name: String,
  /// Default value for new instances.
  #[serde(default)]
  pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
  pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
  pub source: String,
  pub destination: String,
  pub event: String,
  #[serde(default)]
  pub conditions: Vec<ConditionDef>,
  #[serde(default)]
  pub actions: Vec<ActionDef>,
  /// Advisory flag: callers should serialize invocations of this transition
  /// per subject.
  #[serde(default)]
  pub synchronized: bool,
}

impl StateDef {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      initial: false,
    }
  }

  pub fn initial(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      initial: true,
    }
  }
}

impl TransitionDef {
  pub fn new(
    source: impl Into<String>,
    event: impl Into<String>,
    destination: impl Into<String>,
  ) -> Self {
    Self {
      source: source.into(),
      destination: destination.into(),
      event: event.into(),
      conditions: Vec::new(),
      actions: Vec::new(),
      synchronized: false,
    }
  }

  pub fn with_condition(mut self, condition: ConditionDef) -> Self {
    self.conditions.push(condition);
    self
  }

  pub fn with_action(mut self, action: ActionDef) -> Self {
    self.actions.push(action);
    self
  }

  pub fn synchronized(mut self) -> Self {
    self.synchronized = true;
    self
  }
}
