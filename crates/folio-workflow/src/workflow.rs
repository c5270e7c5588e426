use std::collections::{BTreeMap, HashMap};

use crate::error::LookupError;
use crate::model::{Event, State, Variable};
use crate::transition::Transition;

/// A built workflow graph.
///
/// Only [`WorkflowBuilder`](crate::WorkflowBuilder) can construct one; after
/// that it is read-only and meant to be shared through an `Arc` by every
/// instance of the workflow.
#[derive(Debug)]
pub struct Workflow {
  workflow_id: String,
  name: String,
  initial_state: State,
  /// States in declaration order.
  states: Vec<State>,
  events: BTreeMap<String, Event>,
  variables: BTreeMap<String, Variable>,
  /// Transitions in declaration order.
  transitions: Vec<Transition>,
  /// Adjacency list: state id -> indexes of transitions leaving it.
  leaving: HashMap<String, Vec<usize>>,
}

impl Workflow {
  pub(crate) fn new(
    workflow_id: String,
    name: String,
    initial_state: State,
    states: Vec<State>,
    events: BTreeMap<String, Event>,
    variables: BTreeMap<String, Variable>,
    transitions: Vec<Transition>,
  ) -> Self {
    let mut leaving: HashMap<String, Vec<usize>> = HashMap::new();
    for state in &states {
      leaving.entry(state.id().to_string()).or_default();
    }
    for (index, transition) in transitions.iter().enumerate() {
      leaving
        .entry(transition.source().id().to_string())
        .or_default()
        .push(index);
    }

    Self {
      workflow_id,
      name,
      initial_state,
      states,
      events,
      variables,
      transitions,
      leaving,
    }
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn initial_state(&self) -> &State {
    &self.initial_state
  }

  pub fn states(&self) -> &[State] {
    &self.states
  }

  pub fn events(&self) -> impl Iterator<Item = &Event> {
    self.events.values()
  }

  pub fn variables(&self) -> impl Iterator<Item = &Variable> {
    self.variables.values()
  }

  pub fn transitions(&self) -> &[Transition] {
    &self.transitions
  }

  /// Get a state by id.
  pub fn state(&self, id: &str) -> Result<&State, LookupError> {
    self
      .states
      .iter()
      .find(|s| s.id() == id)
      .ok_or_else(|| LookupError::State(id.to_string()))
  }

  /// Get an event by name.
  pub fn event(&self, name: &str) -> Result<&Event, LookupError> {
    self
      .events
      .get(name)
      .ok_or_else(|| LookupError::Event(name.to_string()))
  }

  /// Get a variable by name.
  pub fn variable(&self, name: &str) -> Result<&Variable, LookupError> {
    self
      .variables
      .get(name)
      .ok_or_else(|| LookupError::Variable(name.to_string()))
  }

  /// Transitions leaving `state`, in declaration order.
  pub fn leaving_transitions<'a>(
    &'a self,
    state: &State,
  ) -> impl Iterator<Item = &'a Transition> + use<'a> {
    let transitions = &self.transitions;
    self
      .leaving
      .get(state.id())
      .map(|v| v.as_slice())
      .unwrap_or(&[])
      .iter()
      .map(move |&index| &transitions[index])
  }

  /// Transitions leaving `state` labeled with `event`.
  pub fn transitions_for(&self, state: &State, event: &Event) -> Vec<&Transition> {
    self
      .leaving_transitions(state)
      .filter(|t| t.event() == event)
      .collect()
  }

  /// A terminal state has no leaving transitions.
  pub fn is_terminal(&self, state: &State) -> bool {
    self.leaving_transitions(state).next().is_none()
  }
}
