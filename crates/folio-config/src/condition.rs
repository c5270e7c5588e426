use serde::{Deserialize, Serialize};

/// Reference to a condition implementation in the registry.
///
/// ```json
/// { "condition": "boolean_variable", "expression": "approved == true" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDef {
  /// Registry identifier, e.g. "boolean_variable" or "role"
  pub condition: String,

  /// Free-form expression handed to the condition factory.
  #[serde(default)]
  pub expression: String,
}

impl ConditionDef {
  pub fn new(condition: impl Into<String>, expression: impl Into<String>) -> Self {
    Self {
      condition: condition.into(),
      expression: expression.into(),
    }
  }
}
