use serde::{Deserialize, Serialize};

/// An action run when a transition fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDef {
  /// Assign a boolean value to a workflow variable.
  Assign { variable: String, value: bool },

  /// Run an action registered under `action`, configured by `expression`.
  Invoke {
    action: String,
    #[serde(default)]
    expression: String,
  },
}

impl ActionDef {
  pub fn assign(variable: impl Into<String>, value: bool) -> Self {
    ActionDef::Assign {
      variable: variable.into(),
      value,
    }
  }

  pub fn invoke(action: impl Into<String>, expression: impl Into<String>) -> Self {
    ActionDef::Invoke {
      action: action.into(),
      expression: expression.into(),
    }
  }
}
