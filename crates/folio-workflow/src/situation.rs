use serde::{Deserialize, Serialize};

/// Caller context for an invocation: who acts, in which roles, with what
/// extra data.
///
/// The engine passes it unchanged to conditions and listeners and never
/// interprets it itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Situation {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actor: Option<String>,
  #[serde(default)]
  pub roles: Vec<String>,
  #[serde(default)]
  pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Situation {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn for_actor(actor: impl Into<String>) -> Self {
    Self {
      actor: Some(actor.into()),
      ..Self::default()
    }
  }

  pub fn with_role(mut self, role: impl Into<String>) -> Self {
    self.roles.push(role.into());
    self
  }

  pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
    self.attributes.insert(key.into(), value);
    self
  }

  pub fn has_role(&self, role: &str) -> bool {
    self.roles.iter().any(|r| r == role)
  }
}
