use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::QueryError;
use crate::identity::RequestIdentity;

use super::client::QueryClient;
use super::state::QueryState;

/// A live interest in one cache entry.
///
/// Views read [`state`](Self::state) when rendering and await
/// [`changed`](Self::changed) or [`settled`](Self::settled) to learn about
/// new data. Dropping the subscription unsubscribes; the in-flight fetch,
/// if any, keeps running.
pub struct QuerySubscription {
  identity: RequestIdentity,
  generation: u64,
  client: QueryClient,
  receiver: watch::Receiver<QueryState<Arc<Value>>>,
}

impl QuerySubscription {
  pub(super) fn new(
    identity: RequestIdentity,
    generation: u64,
    client: QueryClient,
    receiver: watch::Receiver<QueryState<Arc<Value>>>,
  ) -> Self {
    Self {
      identity,
      generation,
      client,
      receiver,
    }
  }

  pub fn identity(&self) -> &RequestIdentity {
    &self.identity
  }

  /// Snapshot of the entry's current state.
  pub fn state(&self) -> QueryState<Arc<Value>> {
    self.receiver.borrow().clone()
  }

  /// Current state decoded into `T`.
  pub fn state_as<T: DeserializeOwned>(&self) -> Result<QueryState<T>, QueryError> {
    self.receiver.borrow().decode()
  }

  /// Wait for the next state change.
  pub async fn changed(&mut self) -> Result<QueryState<Arc<Value>>, QueryError> {
    self
      .receiver
      .changed()
      .await
      .map_err(|_| QueryError::Closed)?;
    Ok(self.state())
  }

  /// Wait until nothing is pending and return the outcome.
  ///
  /// Returns immediately when the entry already holds data or an error.
  pub async fn settled(&mut self) -> Result<Arc<Value>, QueryError> {
    let state = self
      .receiver
      .wait_for(QueryState::is_settled)
      .await
      .map_err(|_| QueryError::Closed)?
      .clone();

    match state {
      QueryState::Success { data, .. } => Ok(data),
      QueryState::Error { error, .. } => Err(error),
      QueryState::Idle | QueryState::Loading { .. } => Err(QueryError::Closed),
    }
  }

  /// Like [`settled`](Self::settled), decoding the payload.
  pub async fn settled_as<T: DeserializeOwned>(&mut self) -> Result<T, QueryError> {
    let data = self.settled().await?;
    Ok(serde_json::from_value((*data).clone())?)
  }
}

impl Drop for QuerySubscription {
  fn drop(&mut self) {
    self.client.release(&self.identity, self.generation);
  }
}

impl fmt::Debug for QuerySubscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("QuerySubscription")
      .field("identity", &self.identity)
      .field("status", &self.receiver.borrow().status())
      .finish_non_exhaustive()
  }
}
