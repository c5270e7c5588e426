//! Transition guards.
//!
//! A [`Condition`] is a predicate over the caller's [`Situation`] and the
//! current [`WorkflowInstance`]. Conditions are built from a definition's
//! `(identifier, expression)` pair by the [`Registry`](crate::Registry); the
//! built-in ones live here.

use std::fmt;

use tracing::debug;

use crate::error::{DefinitionError, Result};
use crate::instance::WorkflowInstance;
use crate::situation::Situation;

/// A predicate that must hold for a transition to fire.
pub trait Condition: fmt::Debug + Send + Sync {
  /// Evaluate against the caller's situation and the instance.
  ///
  /// Returns an error only for hard failures such as an unknown variable;
  /// a condition that simply does not hold returns `Ok(false)`.
  fn is_complied(&self, situation: &Situation, instance: &WorkflowInstance) -> Result<bool>;

  /// Workflow variables the condition reads. The builder rejects a
  /// definition whose conditions name an undeclared variable.
  fn variables(&self) -> &[String] {
    &[]
  }
}

/// Holds (or never holds) regardless of context. Registered as `true` and
/// `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantCondition(pub bool);

impl Condition for ConstantCondition {
  fn is_complied(&self, _situation: &Situation, _instance: &WorkflowInstance) -> Result<bool> {
    Ok(self.0)
  }
}

/// Compares a workflow variable against an expected value.
///
/// Accepted expressions: `approved == true`, `approved = false`, or a bare
/// `approved` (meaning `approved == true`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanVariableCondition {
  variable: String,
  expected: bool,
}

impl BooleanVariableCondition {
  pub fn new(variable: impl Into<String>, expected: bool) -> Self {
    Self {
      variable: variable.into(),
      expected,
    }
  }

  pub fn parse(expression: &str) -> Result<Self, DefinitionError> {
    let invalid = |message: &str| DefinitionError::InvalidExpression {
      expression: expression.to_string(),
      message: message.to_string(),
    };

    let (name, value) = match expression.split_once("==").or_else(|| expression.split_once('=')) {
      Some((name, value)) => (name.trim(), Some(value.trim())),
      None => (expression.trim(), None),
    };

    if name.is_empty() || name.chars().any(char::is_whitespace) {
      return Err(invalid("expected a variable name"));
    }

    let expected = match value {
      None | Some("true") => true,
      Some("false") => false,
      Some(_) => return Err(invalid("expected 'true' or 'false'")),
    };

    Ok(Self::new(name, expected))
  }

  pub fn variable(&self) -> &str {
    &self.variable
  }

  pub fn expected(&self) -> bool {
    self.expected
  }
}

impl Condition for BooleanVariableCondition {
  fn is_complied(&self, _situation: &Situation, instance: &WorkflowInstance) -> Result<bool> {
    let value = instance.value(&self.variable)?;
    debug!(variable = %self.variable, value, expected = self.expected, "boolean variable condition");
    Ok(value == self.expected)
  }

  fn variables(&self) -> &[String] {
    std::slice::from_ref(&self.variable)
  }
}

/// Holds when the situation carries at least one of the listed roles.
///
/// The expression is a comma-separated role list, e.g. `editor, reviewer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCondition {
  roles: Vec<String>,
}

impl RoleCondition {
  pub fn parse(expression: &str) -> Result<Self, DefinitionError> {
    let roles: Vec<String> = expression
      .split(',')
      .map(str::trim)
      .filter(|r| !r.is_empty())
      .map(str::to_string)
      .collect();

    if roles.is_empty() {
      return Err(DefinitionError::InvalidExpression {
        expression: expression.to_string(),
        message: "expected at least one role".to_string(),
      });
    }

    Ok(Self { roles })
  }

  pub fn roles(&self) -> &[String] {
    &self.roles
  }
}

impl Condition for RoleCondition {
  fn is_complied(&self, situation: &Situation, _instance: &WorkflowInstance) -> Result<bool> {
    Ok(self.roles.iter().any(|role| situation.has_role(role)))
  }
}
