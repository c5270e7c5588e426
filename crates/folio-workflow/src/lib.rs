//! Folio Workflow
//!
//! This crate provides the lifecycle state machine for Folio: the built
//! workflow graph and the per-subject instance that walks it.
//!
//! Key pieces:
//! - [`WorkflowBuilder`] turns a `folio-config` definition into a read-only
//!   [`Workflow`], resolving conditions and actions through a [`Registry`]
//! - [`WorkflowInstance`] holds one subject's current state and variable
//!   values, reports which events are executable and fires transitions
//! - [`WorkflowListener`] observers are notified after each transition;
//!   `folio-history` uses this to persist versions
//!
//! # Usage
//!
//! ```ignore
//! let registry = Registry::with_builtins();
//! let workflow = Arc::new(WorkflowBuilder::new(&registry).build(def)?);
//!
//! let mut instance = WorkflowInstance::new(workflow);
//! let situation = Situation::for_actor("alice");
//! for event in instance.executable_events(&situation)? {
//!   println!("{}", event);
//! }
//! instance.invoke(&situation, &submit).await?;
//! ```

mod action;
mod builder;
mod catalog;
mod condition;
mod error;
mod instance;
mod locks;
mod model;
mod registry;
mod situation;
mod transition;
mod workflow;

pub use action::{Action, AssignAction, LogAction};
pub use builder::WorkflowBuilder;
pub use catalog::{WorkflowCatalog, WorkflowSource};
pub use condition::{BooleanVariableCondition, Condition, ConstantCondition, RoleCondition};
pub use error::{
  DefinitionError, ExecutionError, LookupError, PersistenceError, Result, WorkflowError,
};
pub use instance::{WorkflowInstance, WorkflowListener};
pub use locks::{SubjectGuard, SubjectLocks};
pub use model::{Event, State, Variable};
pub use registry::{ActionFactory, ConditionFactory, Registry};
pub use situation::Situation;
pub use transition::Transition;
pub use workflow::Workflow;
