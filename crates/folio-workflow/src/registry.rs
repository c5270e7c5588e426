//! Named factories for conditions and actions.
//!
//! A definition refers to conditions and actions by identifier plus a
//! free-form expression. The builder looks the identifier up here and hands
//! the expression to the factory, which may reject it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::{Action, LogAction};
use crate::condition::{BooleanVariableCondition, Condition, ConstantCondition, RoleCondition};
use crate::error::DefinitionError;

/// Builds a condition from its expression.
pub type ConditionFactory =
  Arc<dyn Fn(&str) -> Result<Arc<dyn Condition>, DefinitionError> + Send + Sync>;

/// Builds an action from its expression.
pub type ActionFactory = Arc<dyn Fn(&str) -> Result<Arc<dyn Action>, DefinitionError> + Send + Sync>;

/// Registry of condition and action implementations, keyed by identifier.
#[derive(Clone, Default)]
pub struct Registry {
  conditions: HashMap<String, ConditionFactory>,
  actions: HashMap<String, ActionFactory>,
}

impl Registry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with the built-in implementations:
  ///
  /// | identifier         | kind      | expression                     |
  /// |--------------------|-----------|--------------------------------|
  /// | `true`             | condition | ignored                        |
  /// | `false`            | condition | ignored                        |
  /// | `boolean_variable` | condition | `name == true` / `name = false`|
  /// | `role`             | condition | comma-separated roles          |
  /// | `log`              | action    | message                        |
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    registry.register_condition("true", |_| Ok(Arc::new(ConstantCondition(true))));
    registry.register_condition("false", |_| Ok(Arc::new(ConstantCondition(false))));
    registry.register_condition("boolean_variable", |expression| {
      Ok(Arc::new(BooleanVariableCondition::parse(expression)?))
    });
    registry.register_condition("role", |expression| {
      Ok(Arc::new(RoleCondition::parse(expression)?))
    });
    registry.register_action("log", |expression| Ok(Arc::new(LogAction::new(expression))));
    registry
  }

  /// Register a condition factory. Replaces any factory with the same name.
  pub fn register_condition<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
  where
    F: Fn(&str) -> Result<Arc<dyn Condition>, DefinitionError> + Send + Sync + 'static,
  {
    self.conditions.insert(name.into(), Arc::new(factory));
    self
  }

  /// Register an action factory. Replaces any factory with the same name.
  pub fn register_action<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
  where
    F: Fn(&str) -> Result<Arc<dyn Action>, DefinitionError> + Send + Sync + 'static,
  {
    self.actions.insert(name.into(), Arc::new(factory));
    self
  }

  pub fn create_condition(
    &self,
    name: &str,
    expression: &str,
  ) -> Result<Arc<dyn Condition>, DefinitionError> {
    let factory = self
      .conditions
      .get(name)
      .ok_or_else(|| DefinitionError::UnknownCondition(name.to_string()))?;
    factory(expression)
  }

  pub fn create_action(
    &self,
    name: &str,
    expression: &str,
  ) -> Result<Arc<dyn Action>, DefinitionError> {
    let factory = self
      .actions
      .get(name)
      .ok_or_else(|| DefinitionError::UnknownAction(name.to_string()))?;
    factory(expression)
  }
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut conditions: Vec<_> = self.conditions.keys().collect();
    let mut actions: Vec<_> = self.actions.keys().collect();
    conditions.sort();
    actions.sort();
    f.debug_struct("Registry")
      .field("conditions", &conditions)
      .field("actions", &actions)
      .finish()
  }
}
