use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use folio_config::{ActionDef, TransitionDef, WorkflowDef};
use tracing::debug;

use crate::action::{Action, AssignAction};
use crate::condition::Condition;
use crate::error::DefinitionError;
use crate::model::{Event, State, Variable};
use crate::registry::Registry;
use crate::transition::Transition;
use crate::workflow::Workflow;

/// Builds a [`Workflow`] graph from a [`WorkflowDef`].
///
/// This process:
/// 1. Materializes states, variables and events, rejecting duplicates
/// 2. Checks that exactly one state is initial
/// 3. Materializes transitions, resolving every reference against step 1 and
///    instantiating conditions and actions through the registry
/// 4. Rejects two transitions leaving the same state on the same event
pub struct WorkflowBuilder<'r> {
  registry: &'r Registry,
}

impl<'r> WorkflowBuilder<'r> {
  pub fn new(registry: &'r Registry) -> Self {
    Self { registry }
  }

  /// Parse a JSON definition and build it.
  pub fn build_json(&self, json: &str) -> Result<Workflow, DefinitionError> {
    let def: WorkflowDef = serde_json::from_str(json)?;
    self.build(def)
  }

  pub fn build(&self, def: WorkflowDef) -> Result<Workflow, DefinitionError> {
    let mut states: Vec<State> = Vec::with_capacity(def.states.len());
    let mut initial_state: Option<State> = None;
    for state_def in &def.states {
      if states.iter().any(|s| s.id() == state_def.id) {
        return Err(DefinitionError::Duplicate {
          kind: "state",
          id: state_def.id.clone(),
        });
      }
      let state = State::new(state_def.id.as_str());
      if state_def.initial {
        if let Some(first) = &initial_state {
          return Err(DefinitionError::MultipleInitialStates {
            first: first.id().to_string(),
            second: state.id().to_string(),
          });
        }
        initial_state = Some(state.clone());
      }
      states.push(state);
    }
    let initial_state = initial_state.ok_or(DefinitionError::NoInitialState)?;

    let mut variables: BTreeMap<String, Variable> = BTreeMap::new();
    for variable_def in &def.variables {
      let variable = Variable::new(variable_def.name.as_str(), variable_def.value);
      if variables.insert(variable_def.name.clone(), variable).is_some() {
        return Err(DefinitionError::Duplicate {
          kind: "variable",
          id: variable_def.name.clone(),
        });
      }
    }

    let mut events: BTreeMap<String, Event> = BTreeMap::new();
    for event_def in &def.events {
      if events
        .insert(event_def.id.clone(), Event::new(event_def.id.as_str()))
        .is_some()
      {
        return Err(DefinitionError::Duplicate {
          kind: "event",
          id: event_def.id.clone(),
        });
      }
    }

    let state_index: HashMap<&str, &State> = states.iter().map(|s| (s.id(), s)).collect();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut transitions = Vec::with_capacity(def.transitions.len());
    for transition_def in &def.transitions {
      let transition =
        self.build_transition(transition_def, &state_index, &events, &variables)?;

      if !seen.insert((transition_def.source.clone(), transition_def.event.clone())) {
        return Err(DefinitionError::AmbiguousTransition {
          state: transition_def.source.clone(),
          event: transition_def.event.clone(),
        });
      }
      transitions.push(transition);
    }

    debug!(
      workflow_id = %def.workflow_id,
      states = states.len(),
      events = events.len(),
      transitions = transitions.len(),
      "workflow built"
    );

    Ok(Workflow::new(
      def.workflow_id,
      def.name,
      initial_state,
      states,
      events,
      variables,
      transitions,
    ))
  }

  fn build_transition(
    &self,
    def: &TransitionDef,
    states: &HashMap<&str, &State>,
    events: &BTreeMap<String, Event>,
    variables: &BTreeMap<String, Variable>,
  ) -> Result<Transition, DefinitionError> {
    let lookup_state = |id: &str| {
      states
        .get(id)
        .map(|s| (*s).clone())
        .ok_or_else(|| DefinitionError::UnknownState {
          from: def.source.clone(),
          event: def.event.clone(),
          to: def.destination.clone(),
          state: id.to_string(),
        })
    };
    let source = lookup_state(&def.source)?;
    let destination = lookup_state(&def.destination)?;
    let event = events
      .get(&def.event)
      .cloned()
      .ok_or_else(|| DefinitionError::UnknownEvent {
        from: def.source.clone(),
        event: def.event.clone(),
      })?;

    let conditions = def
      .conditions
      .iter()
      .map(|c| self.registry.create_condition(&c.condition, &c.expression))
      .collect::<Result<Vec<Arc<dyn Condition>>, _>>()?;
    for condition in &conditions {
      if let Some(variable) = condition
        .variables()
        .iter()
        .find(|v| !variables.contains_key(v.as_str()))
      {
        return Err(DefinitionError::UnknownVariable {
          variable: variable.clone(),
        });
      }
    }

    let actions = def
      .actions
      .iter()
      .map(|a| match a {
        ActionDef::Assign { variable, value } => {
          if !variables.contains_key(variable) {
            return Err(DefinitionError::UnknownVariable {
              variable: variable.clone(),
            });
          }
          Ok(Arc::new(AssignAction::new(variable.as_str(), *value)) as Arc<dyn Action>)
        }
        ActionDef::Invoke { action, expression } => {
          self.registry.create_action(action, expression)
        }
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Transition::new(
      source,
      destination,
      event,
      conditions,
      actions,
      def.synchronized,
    ))
  }
}
