use std::sync::Arc;

use crate::action::Action;
use crate::condition::Condition;
use crate::error::Result;
use crate::instance::WorkflowInstance;
use crate::model::{Event, State};
use crate::situation::Situation;

/// A guarded, labeled edge between two states.
#[derive(Debug, Clone)]
pub struct Transition {
  source: State,
  destination: State,
  event: Event,
  conditions: Vec<Arc<dyn Condition>>,
  actions: Vec<Arc<dyn Action>>,
  synchronized: bool,
}

impl Transition {
  pub(crate) fn new(
    source: State,
    destination: State,
    event: Event,
    conditions: Vec<Arc<dyn Condition>>,
    actions: Vec<Arc<dyn Action>>,
    synchronized: bool,
  ) -> Self {
    Self {
      source,
      destination,
      event,
      conditions,
      actions,
      synchronized,
    }
  }

  pub fn source(&self) -> &State {
    &self.source
  }

  pub fn destination(&self) -> &State {
    &self.destination
  }

  pub fn event(&self) -> &Event {
    &self.event
  }

  pub fn conditions(&self) -> &[Arc<dyn Condition>] {
    &self.conditions
  }

  pub fn actions(&self) -> &[Arc<dyn Action>] {
    &self.actions
  }

  /// Whether callers should hold the subject lock while invoking this
  /// transition.
  pub fn is_synchronized(&self) -> bool {
    self.synchronized
  }

  /// Evaluate the conditions in order, stopping at the first that does not
  /// hold. No conditions means the transition can always fire.
  pub fn can_fire(&self, situation: &Situation, instance: &WorkflowInstance) -> Result<bool> {
    for condition in &self.conditions {
      if !condition.is_complied(situation, instance)? {
        return Ok(false);
      }
    }
    Ok(true)
  }
}
