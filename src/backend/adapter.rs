//! Per-backend response adapters.
//!
//! Some API instances wrap every payload in `{"response": ...}`. The router
//! runs each raw payload through the adapter of the backend it came from,
//! so the cache only ever stores normalized JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

/// `{"response": ...}` envelope.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
  response: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseAdapter {
  /// Payload is used as-is
  #[serde(rename = "passthrough")]
  Passthrough,
  /// Payload must be an envelope; its `response` field is returned
  #[serde(rename = "response")]
  UnwrapResponse,
  /// Envelopes are unwrapped, anything else passes through
  #[serde(rename = "response-if-present")]
  UnwrapResponseIfPresent,
}

impl ResponseAdapter {
  /// Normalize a raw payload.
  ///
  /// An empty body (`null`) is returned unchanged by every adapter.
  pub fn adapt(self, raw: Value) -> Result<Value, QueryError> {
    if raw.is_null() {
      return Ok(raw);
    }

    match self {
      ResponseAdapter::Passthrough => Ok(raw),
      ResponseAdapter::UnwrapResponse => {
        let envelope: ResponseEnvelope = serde_json::from_value(raw)
          .map_err(|e| QueryError::Decode(format!("expected response envelope: {}", e)))?;
        Ok(envelope.response)
      }
      ResponseAdapter::UnwrapResponseIfPresent => match raw {
        Value::Object(mut map) if map.contains_key("response") => {
          Ok(map.remove("response").unwrap_or(Value::Null))
        }
        other => Ok(other),
      },
    }
  }
}
