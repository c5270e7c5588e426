//! Side effects run when a transition fires.

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::instance::WorkflowInstance;

/// An operation run, in declaration order, when its transition fires.
///
/// Actions may change variable values on the instance or reach out to
/// external systems. They run before the state changes, so a failing action
/// leaves the instance in its source state.
#[async_trait]
pub trait Action: fmt::Debug + Send + Sync {
  async fn execute(&self, instance: &mut WorkflowInstance) -> Result<()>;
}

/// Assigns a boolean value to a workflow variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignAction {
  variable: String,
  value: bool,
}

impl AssignAction {
  pub fn new(variable: impl Into<String>, value: bool) -> Self {
    Self {
      variable: variable.into(),
      value,
    }
  }

  pub fn variable(&self) -> &str {
    &self.variable
  }

  pub fn value(&self) -> bool {
    self.value
  }
}

#[async_trait]
impl Action for AssignAction {
  async fn execute(&self, instance: &mut WorkflowInstance) -> Result<()> {
    instance.set_value(&self.variable, self.value)
  }
}

/// Emits the expression text as a log line. Registered as `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAction {
  message: String,
}

impl LogAction {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[async_trait]
impl Action for LogAction {
  async fn execute(&self, instance: &mut WorkflowInstance) -> Result<()> {
    info!(
      workflow_id = %instance.workflow().workflow_id(),
      state = %instance.current_state(),
      "{}",
      self.message
    );
    Ok(())
  }
}
