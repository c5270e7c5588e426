//! The live state of one subject within a workflow.
//!
//! ```text
//! WorkflowInstance
//! ├── executable_events(situation) - events whose transition guards hold
//! ├── invoke(situation, event)     - actions → state change → listeners
//! └── value(name) / set_value(...) - per-instance variable slots
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ExecutionError, LookupError, Result};
use crate::model::{Event, State};
use crate::situation::Situation;
use crate::transition::Transition;
use crate::workflow::Workflow;

/// Observer notified after every fired transition.
///
/// Listeners run synchronously, in registration order, once the new state is
/// in place. An error from a listener is returned from
/// [`WorkflowInstance::invoke`]; the instance stays in the new state.
#[async_trait]
pub trait WorkflowListener: Send + Sync {
  async fn transition_fired(
    &self,
    instance: &WorkflowInstance,
    situation: &Situation,
    event: &Event,
  ) -> Result<()>;
}

/// Runtime state of one subject: current state, variable values and
/// listeners.
///
/// Not internally synchronized. Callers serialize `invoke` per subject (see
/// [`SubjectLocks`](crate::SubjectLocks)).
pub struct WorkflowInstance {
  workflow: Arc<Workflow>,
  current_state: State,
  values: HashMap<String, bool>,
  listeners: Vec<Arc<dyn WorkflowListener>>,
}

impl WorkflowInstance {
  /// A fresh instance in the initial state with default variable values.
  pub fn new(workflow: Arc<Workflow>) -> Self {
    let current_state = workflow.initial_state().clone();
    let values = workflow
      .variables()
      .map(|v| (v.name().to_string(), v.initial_value()))
      .collect();

    Self {
      workflow,
      current_state,
      values,
      listeners: Vec::new(),
    }
  }

  /// Rebuild an instance from persisted data.
  ///
  /// `state` of `None` falls back to the initial state. Variables missing
  /// from `values` keep their defaults; persisted values for variables the
  /// workflow no longer declares are dropped.
  pub fn restore(
    workflow: Arc<Workflow>,
    state: Option<&str>,
    values: &BTreeMap<String, bool>,
  ) -> Result<Self, LookupError> {
    let mut instance = Self::new(workflow);

    if let Some(state_id) = state {
      instance.current_state = instance.workflow.state(state_id)?.clone();
    }

    for (name, value) in values {
      match instance.values.get_mut(name) {
        Some(slot) => *slot = *value,
        None => warn!(
          workflow_id = %instance.workflow.workflow_id(),
          variable = %name,
          "dropping persisted value of undeclared variable"
        ),
      }
    }

    Ok(instance)
  }

  pub fn workflow(&self) -> &Arc<Workflow> {
    &self.workflow
  }

  pub fn current_state(&self) -> &State {
    &self.current_state
  }

  /// Current value of a variable.
  pub fn value(&self, name: &str) -> Result<bool, LookupError> {
    self
      .values
      .get(name)
      .copied()
      .ok_or_else(|| LookupError::Variable(name.to_string()))
  }

  /// Overwrite a variable. Meant for actions.
  pub fn set_value(&mut self, name: &str, value: bool) -> Result<()> {
    let slot = self
      .values
      .get_mut(name)
      .ok_or_else(|| LookupError::Variable(name.to_string()))?;
    *slot = value;
    Ok(())
  }

  /// All variables with their current values, ordered by name.
  pub fn values(&self) -> BTreeMap<String, bool> {
    self
      .values
      .iter()
      .map(|(name, value)| (name.clone(), *value))
      .collect()
  }

  pub fn add_listener(&mut self, listener: Arc<dyn WorkflowListener>) {
    self.listeners.push(listener);
  }

  /// Remove a previously added listener. Returns whether it was registered.
  pub fn remove_listener(&mut self, listener: &Arc<dyn WorkflowListener>) -> bool {
    let before = self.listeners.len();
    self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    self.listeners.len() != before
  }

  /// Events that can be invoked from the current state in `situation`.
  ///
  /// An event is included when every condition of a transition labeled
  /// with it holds. The result follows declaration order without
  /// duplicates.
  pub fn executable_events(&self, situation: &Situation) -> Result<Vec<Event>> {
    let mut events: Vec<Event> = Vec::new();
    for transition in self.workflow.leaving_transitions(&self.current_state) {
      if events.contains(transition.event()) {
        continue;
      }
      let can_fire = transition.can_fire(situation, self)?;
      debug!(
        state = %self.current_state,
        event = %transition.event(),
        can_fire,
        "evaluated transition"
      );
      if can_fire {
        events.push(transition.event().clone());
      }
    }
    Ok(events)
  }

  /// Whether callers should serialize invocations of `event` per subject.
  pub fn is_synchronized(&self, event: &Event) -> Result<bool> {
    Ok(self.transition_for(event)?.is_synchronized())
  }

  /// Fire the transition for `event`.
  ///
  /// Actions run first, in declaration order; then the state moves to the
  /// destination; then every listener is notified. Nothing is rolled back:
  /// a failing action leaves the source state with earlier actions' effects
  /// applied, and a failing listener leaves the destination state in place.
  pub async fn invoke(&mut self, situation: &Situation, event: &Event) -> Result<()> {
    if !self.executable_events(situation)?.contains(event) {
      return Err(
        ExecutionError::NotInvokable {
          state: self.current_state.id().to_string(),
          event: event.name().to_string(),
        }
        .into(),
      );
    }

    let workflow = Arc::clone(&self.workflow);
    let transition = Self::unique_transition(&workflow, &self.current_state, event)?;

    for action in transition.actions() {
      action
        .execute(self)
        .await
        .map_err(|source| ExecutionError::Action {
          action: format!("{:?}", action),
          source: Box::new(source),
        })?;
    }

    let source = std::mem::replace(&mut self.current_state, transition.destination().clone());
    info!(
      workflow_id = %workflow.workflow_id(),
      from = %source,
      event = %event,
      to = %self.current_state,
      "transition fired"
    );

    let listeners = self.listeners.clone();
    for listener in listeners {
      listener.transition_fired(self, situation, event).await?;
    }

    Ok(())
  }

  fn transition_for(&self, event: &Event) -> Result<&Transition> {
    Self::unique_transition(&self.workflow, &self.current_state, event)
  }

  fn unique_transition<'w>(
    workflow: &'w Workflow,
    state: &State,
    event: &Event,
  ) -> Result<&'w Transition> {
    let mut matching = workflow.transitions_for(state, event);
    match matching.len() {
      1 => Ok(matching.remove(0)),
      0 => Err(
        ExecutionError::NoTransition {
          state: state.id().to_string(),
          event: event.name().to_string(),
        }
        .into(),
      ),
      count => Err(
        ExecutionError::AmbiguousTransition {
          state: state.id().to_string(),
          event: event.name().to_string(),
          count,
        }
        .into(),
      ),
    }
  }
}

impl std::fmt::Debug for WorkflowInstance {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WorkflowInstance")
      .field("workflow_id", &self.workflow.workflow_id())
      .field("current_state", &self.current_state)
      .field("values", &self.values())
      .field("listeners", &self.listeners.len())
      .finish()
  }
}
