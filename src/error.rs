//! Error type shared by the router, the query cache and the mutation pipeline.

use thiserror::Error;

/// Errors surfaced to query subscribers and mutation callers.
///
/// The type is `Clone` because a single in-flight fetch result is handed to
/// every subscriber waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
  /// Network, DNS or timeout failure before a response arrived
  #[error("Network error: {0}")]
  Transport(String),

  /// HTTP 409, translated to a user-facing message
  #[error("{message}")]
  Conflict {
    message: String,
    server_message: String,
  },

  /// Any other non-2xx response
  #[error("Server error {status}: {message}")]
  Server { status: u16, message: String },

  /// The request identity cannot be routed to a backend
  #[error("Routing error: {0}")]
  Routing(String),

  /// The payload did not have the expected shape
  #[error("Decode error: {0}")]
  Decode(String),

  /// The cache was torn down while the caller was waiting
  #[error("Query cache closed")]
  Closed,

  /// A fetch was needed but no tokio runtime is running on this thread
  #[error("No async runtime to run the fetch on")]
  NoRuntime,
}

impl QueryError {
  /// HTTP status carried by the error, if it came from a server response.
  pub fn status(&self) -> Option<u16> {
    match self {
      QueryError::Conflict { .. } => Some(409),
      QueryError::Server { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Short machine-readable kind, used as a log field.
  pub fn kind(&self) -> &'static str {
    match self {
      QueryError::Transport(_) => "transport",
      QueryError::Conflict { .. } => "conflict",
      QueryError::Server { .. } => "server",
      QueryError::Routing(_) => "routing",
      QueryError::Decode(_) => "decode",
      QueryError::Closed => "closed",
      QueryError::NoRuntime => "no_runtime",
    }
  }
}

impl From<serde_json::Error> for QueryError {
  fn from(err: serde_json::Error) -> Self {
    QueryError::Decode(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_conflict_displays_user_message_only() {
    let err = QueryError::Conflict {
      message: "Someone else changed this record".to_string(),
      server_message: "duplicate key value".to_string(),
    };
    assert_eq!(err.to_string(), "Someone else changed this record");
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.kind(), "conflict");
  }

  #[test]
  fn test_server_error_keeps_message_verbatim() {
    let err = QueryError::Server {
      status: 500,
      message: "Internal Server Error".to_string(),
    };
    assert_eq!(err.to_string(), "Server error 500: Internal Server Error");
    assert_eq!(err.status(), Some(500));
  }

  #[test]
  fn test_transport_error_has_no_status() {
    let err = QueryError::Transport("connection refused".to_string());
    assert_eq!(err.status(), None);
    assert_eq!(err.kind(), "transport");
  }

  #[test]
  fn test_from_serde_error() {
    let err: QueryError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
    assert!(matches!(err, QueryError::Decode(_)));
  }
}
