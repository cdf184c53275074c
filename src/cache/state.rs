//! Observable state of a cache entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::QueryError;

/// Status of a cache entry, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  Idle,
  Loading,
  Success,
  Error,
}

/// The state of a query.
///
/// `Loading` and `Error` keep the last successful payload (if any) so a view
/// can keep showing it while a refetch runs or after it fails.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// No fetch has been started
  Idle,
  /// A fetch is in flight
  Loading { stale: Option<T> },
  /// The latest fetch succeeded
  Success { data: T, updated_at: DateTime<Utc> },
  /// The latest fetch failed
  Error { error: QueryError, stale: Option<T> },
}

impl<T> QueryState<T> {
  pub fn status(&self) -> QueryStatus {
    match self {
      QueryState::Idle => QueryStatus::Idle,
      QueryState::Loading { .. } => QueryStatus::Loading,
      QueryState::Success { .. } => QueryStatus::Success,
      QueryState::Error { .. } => QueryStatus::Error,
    }
  }

  pub fn is_idle(&self) -> bool {
    matches!(self, QueryState::Idle)
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading { .. })
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success { .. })
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error { .. })
  }

  /// Success or error: nothing is pending any more.
  pub fn is_settled(&self) -> bool {
    self.is_success() || self.is_error()
  }

  /// The freshest payload available, including stale data kept while
  /// loading or after an error.
  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Idle => None,
      QueryState::Loading { stale } | QueryState::Error { stale, .. } => stale.as_ref(),
      QueryState::Success { data, .. } => Some(data),
    }
  }

  pub fn error(&self) -> Option<&QueryError> {
    match self {
      QueryState::Error { error, .. } => Some(error),
      _ => None,
    }
  }

  /// When the current payload was fetched (success only).
  pub fn updated_at(&self) -> Option<DateTime<Utc>> {
    match self {
      QueryState::Success { updated_at, .. } => Some(*updated_at),
      _ => None,
    }
  }

  fn try_map<U, E>(self, f: impl Fn(T) -> Result<U, E>) -> Result<QueryState<U>, E> {
    Ok(match self {
      QueryState::Idle => QueryState::Idle,
      QueryState::Loading { stale } => QueryState::Loading {
        stale: stale.map(&f).transpose()?,
      },
      QueryState::Success { data, updated_at } => QueryState::Success {
        data: f(data)?,
        updated_at,
      },
      QueryState::Error { error, stale } => QueryState::Error {
        error,
        stale: stale.map(&f).transpose()?,
      },
    })
  }
}

impl QueryState<Arc<Value>> {
  /// Deserialize the payload into a typed state.
  pub fn decode<T: DeserializeOwned>(&self) -> Result<QueryState<T>, QueryError> {
    self
      .clone()
      .try_map(|value| serde_json::from_value::<T>((*value).clone()).map_err(QueryError::from))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_predicates() {
    let idle: QueryState<i32> = QueryState::Idle;
    assert!(idle.is_idle());
    assert!(!idle.is_settled());
    assert_eq!(idle.status(), QueryStatus::Idle);

    let loading: QueryState<i32> = QueryState::Loading { stale: None };
    assert!(loading.is_loading());
    assert!(!loading.is_settled());

    let success = QueryState::Success {
      data: 42,
      updated_at: Utc::now(),
    };
    assert!(success.is_success());
    assert!(success.is_settled());
    assert!(success.updated_at().is_some());

    let error: QueryState<i32> = QueryState::Error {
      error: QueryError::Transport("offline".to_string()),
      stale: None,
    };
    assert!(error.is_error());
    assert!(error.is_settled());
    assert_eq!(error.status(), QueryStatus::Error);
  }

  #[test]
  fn test_data_includes_stale_payload() {
    let loading = QueryState::Loading { stale: Some(1) };
    assert_eq!(loading.data(), Some(&1));

    let error = QueryState::Error {
      error: QueryError::Closed,
      stale: Some(2),
    };
    assert_eq!(error.data(), Some(&2));
    assert_eq!(error.error(), Some(&QueryError::Closed));

    let idle: QueryState<i32> = QueryState::Idle;
    assert_eq!(idle.data(), None);
  }

  #[test]
  fn test_decode() {
    let state = QueryState::Success {
      data: Arc::new(json!([1, 2, 3])),
      updated_at: Utc::now(),
    };
    let decoded: QueryState<Vec<u32>> = state.decode().unwrap();
    assert_eq!(decoded.data(), Some(&vec![1, 2, 3]));

    let loading = QueryState::Loading {
      stale: Some(Arc::new(json!("x"))),
    };
    assert!(loading.decode::<u32>().is_err());
  }
}
