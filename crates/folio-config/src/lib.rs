//! Folio Config
//!
//! This crate contains the serializable workflow definition types for Folio.
//! These types represent a lifecycle definition before it is built into a
//! workflow graph by `folio-workflow`.
//!
//! Definitions can be loaded from:
//! - JSON files (via CLI from the `workflows/` data directory)
//! - Any other store holding JSON blobs
//!
//! The builder takes these definition types, checks every reference, resolves
//! conditions and actions through a registry, and produces a read-only graph.

mod action;
mod condition;
mod workflow;

pub use action::ActionDef;
pub use condition::ConditionDef;
pub use workflow::{EventDef, StateDef, TransitionDef, VariableDef, WorkflowDef};
