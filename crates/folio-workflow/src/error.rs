use thiserror::Error;

/// Convenience result type for workflow operations.
pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;

/// Errors raised by the workflow engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("invalid workflow definition: {0}")]
  Definition(#[from] DefinitionError),

  #[error("lookup failed: {0}")]
  Lookup(#[from] LookupError),

  #[error("execution failed: {0}")]
  Execution(#[from] ExecutionError),

  #[error("persistence failed: {0}")]
  Persistence(#[from] PersistenceError),
}

/// A malformed or inconsistent definition. The workflow cannot be built.
#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("no state is marked initial")]
  NoInitialState,

  #[error("more than one initial state: {first}, {second}")]
  MultipleInitialStates { first: String, second: String },

  #[error("duplicate {kind} id: {id}")]
  Duplicate { kind: &'static str, id: String },

  #[error("transition {from} --{event}--> {to} references unknown state '{state}'")]
  UnknownState {
    from: String,
    event: String,
    to: String,
    state: String,
  },

  #[error("transition from '{from}' references unknown event '{event}'")]
  UnknownEvent { from: String, event: String },

  #[error("assign action references unknown variable '{variable}'")]
  UnknownVariable { variable: String },

  #[error("more than one transition leaves '{state}' on event '{event}'")]
  AmbiguousTransition { state: String, event: String },

  #[error("condition '{0}' is not registered")]
  UnknownCondition(String),

  #[error("action '{0}' is not registered")]
  UnknownAction(String),

  #[error("invalid expression '{expression}': {message}")]
  InvalidExpression { expression: String, message: String },

  #[error("failed to parse definition: {0}")]
  Parse(#[from] serde_json::Error),
}

/// A referenced id does not exist in the live workflow.
#[derive(Debug, Error)]
pub enum LookupError {
  #[error("workflow '{0}' not found")]
  Workflow(String),

  #[error("state '{0}' not found")]
  State(String),

  #[error("event '{0}' not found")]
  Event(String),

  #[error("variable '{0}' not found")]
  Variable(String),
}

/// An invocation that could not be carried out.
#[derive(Debug, Error)]
pub enum ExecutionError {
  #[error("event '{event}' is not invokable in state '{state}'")]
  NotInvokable { state: String, event: String },

  #[error("no transition leaves '{state}' on event '{event}'")]
  NoTransition { state: String, event: String },

  #[error("{count} transitions leave '{state}' on event '{event}'")]
  AmbiguousTransition {
    state: String,
    event: String,
    count: usize,
  },

  #[error("action {action} failed: {source}")]
  Action {
    action: String,
    #[source]
    source: Box<WorkflowError>,
  },

  #[error("{0}")]
  Failed(String),
}

/// A durable-store failure. Never retried by the engine.
#[derive(Debug, Error)]
pub enum PersistenceError {
  #[error("history at '{0}' is not initialized")]
  NotInitialized(String),

  #[error("history at '{0}' already exists")]
  AlreadyInitialized(String),

  #[error("invalid history location '{0}'")]
  InvalidLocation(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}
