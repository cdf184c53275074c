use serde::{Deserialize, Serialize};

/// Status an agent reports while online and accepting chats.
pub const STATUS_ONLINE: &str = "online";

/// Authority granted to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
  Administrator,
  ServiceManager,
  CustomerSupportAgent,
  ChatbotTrainer,
  Analyst,
  Unauthenticated,
  /// A role this client does not know, kept verbatim
  Other(String),
}

impl Role {
  pub fn code(&self) -> &str {
    match self {
      Role::Administrator => "ROLE_ADMINISTRATOR",
      Role::ServiceManager => "ROLE_SERVICE_MANAGER",
      Role::CustomerSupportAgent => "ROLE_CUSTOMER_SUPPORT_AGENT",
      Role::ChatbotTrainer => "ROLE_CHATBOT_TRAINER",
      Role::Analyst => "ROLE_ANALYST",
      Role::Unauthenticated => "ROLE_UNAUTHENTICATED",
      Role::Other(code) => code,
    }
  }

  pub fn label(&self) -> &str {
    match self {
      Role::Administrator => "Administrator",
      Role::ServiceManager => "Service manager",
      Role::CustomerSupportAgent => "Customer support agent",
      Role::ChatbotTrainer => "Chatbot trainer",
      Role::Analyst => "Analyst",
      Role::Unauthenticated => "Unauthenticated",
      Role::Other(code) => code,
    }
  }
}

impl From<String> for Role {
  fn from(code: String) -> Self {
    match code.as_str() {
      "ROLE_ADMINISTRATOR" => Role::Administrator,
      "ROLE_SERVICE_MANAGER" => Role::ServiceManager,
      "ROLE_CUSTOMER_SUPPORT_AGENT" => Role::CustomerSupportAgent,
      "ROLE_CHATBOT_TRAINER" => Role::ChatbotTrainer,
      "ROLE_ANALYST" => Role::Analyst,
      "ROLE_UNAUTHENTICATED" => Role::Unauthenticated,
      _ => Role::Other(code),
    }
  }
}

impl From<Role> for String {
  fn from(role: Role) -> Self {
    match role {
      Role::Other(code) => code,
      known => known.code().to_string(),
    }
  }
}

/// A customer support account as returned by the accounts service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id_code: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub display_name: Option<String>,
  pub csa_title: Option<String>,
  pub csa_email: Option<String>,
  #[serde(default)]
  pub authorities: Vec<Role>,
  pub customer_support_status: Option<String>,
}

impl User {
  /// "first last", missing parts left out.
  pub fn full_name(&self) -> String {
    format!(
      "{} {}",
      self.first_name.as_deref().unwrap_or_default(),
      self.last_name.as_deref().unwrap_or_default()
    )
    .trim()
    .to_string()
  }

  pub fn role_labels(&self) -> Vec<String> {
    self
      .authorities
      .iter()
      .map(|role| role.label().to_string())
      .collect()
  }

  pub fn is_online(&self) -> bool {
    self.customer_support_status.as_deref() == Some(STATUS_ONLINE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_deserialize_user() {
    let user: User = serde_json::from_value(json!({
      "idCode": "EE38001085718",
      "firstName": "Jane",
      "lastName": "Doe",
      "displayName": "Jane",
      "csaTitle": "Agent",
      "csaEmail": "jane@example.com",
      "authorities": ["ROLE_ADMINISTRATOR", "ROLE_SOMETHING_NEW"],
      "customerSupportStatus": "online"
    }))
    .unwrap();

    assert_eq!(user.id_code, "EE38001085718");
    assert_eq!(user.full_name(), "Jane Doe");
    assert_eq!(
      user.authorities,
      vec![
        Role::Administrator,
        Role::Other("ROLE_SOMETHING_NEW".to_string())
      ]
    );
    assert!(user.is_online());
  }

  #[test]
  fn test_deserialize_minimal_user() {
    let user: User = serde_json::from_value(json!({ "idCode": "A1" })).unwrap();

    assert_eq!(user.full_name(), "");
    assert!(user.authorities.is_empty());
    assert!(!user.is_online());
  }

  #[test]
  fn test_role_round_trips_as_code() {
    let value = serde_json::to_value(Role::ServiceManager).unwrap();
    assert_eq!(value, json!("ROLE_SERVICE_MANAGER"));
  }

  #[test]
  fn test_role_labels() {
    let user = User {
      authorities: vec![Role::CustomerSupportAgent, Role::Analyst],
      ..User::default()
    };
    assert_eq!(user.role_labels(), vec!["Customer support agent", "Analyst"]);
  }
}
