//! Bookkeeping for a single cached identity.

use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::watch;

use crate::backend::ResolvedRequest;
use crate::error::QueryError;

use super::state::QueryState;

pub(super) type FetchResult = Result<Arc<Value>, QueryError>;

/// An in-flight fetch that any number of waiters can await.
pub(super) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// What happened to a fetch resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Resolution {
  /// Newest fetch; the entry settled
  Applied,
  /// Newer than what is shown but a later fetch is still pending; the
  /// payload refreshes the stale data and the entry stays loading
  Superseded,
  /// Older than what is already applied
  Discarded,
}

pub(super) struct Entry {
  /// Distinguishes this entry from earlier ones for the same identity
  pub generation: u64,
  pub request: ResolvedRequest,
  pub state: watch::Sender<QueryState<Arc<Value>>>,
  pub subscribers: usize,
  /// Bumped every time the subscriber count drops to zero
  pub idle_epoch: u64,
  /// Sequence number of the most recently started fetch
  pub started_seq: u64,
  /// Sequence number of the most recently applied resolution
  pub applied_seq: u64,
  pub in_flight: Option<SharedFetch>,
}

impl Entry {
  pub fn new(generation: u64, request: ResolvedRequest) -> Self {
    let (state, _) = watch::channel(QueryState::Idle);
    Self {
      generation,
      request,
      state,
      subscribers: 0,
      idle_epoch: 0,
      started_seq: 0,
      applied_seq: 0,
      in_flight: None,
    }
  }

  /// A new subscriber triggers a fetch only when nothing usable is cached
  /// and nothing is pending.
  pub fn needs_fetch(&self) -> bool {
    if self.in_flight.is_some() {
      return false;
    }
    matches!(*self.state.borrow(), QueryState::Idle | QueryState::Error { .. })
  }

  pub fn begin_fetch(&mut self, seq: u64, fetch: SharedFetch) {
    self.started_seq = seq;
    self.in_flight = Some(fetch);

    let stale = self.state.borrow().data().cloned();
    self.state.send_replace(QueryState::Loading { stale });
  }

  /// Settle the entry with `error` without fetching, keeping stale data.
  pub fn fail(&mut self, error: QueryError) {
    let stale = self.state.borrow().data().cloned();
    self.state.send_replace(QueryState::Error { error, stale });
  }

  pub fn resolve(&mut self, seq: u64, outcome: FetchResult) -> Resolution {
    if seq <= self.applied_seq {
      return Resolution::Discarded;
    }

    if seq < self.started_seq {
      // A later fetch is pending; only a successful payload is worth keeping
      return match outcome {
        Ok(data) => {
          self.applied_seq = seq;
          self.state.send_replace(QueryState::Loading { stale: Some(data) });
          Resolution::Superseded
        }
        Err(_) => Resolution::Discarded,
      };
    }

    self.applied_seq = seq;
    self.in_flight = None;

    let next = match outcome {
      Ok(data) => QueryState::Success {
        data,
        updated_at: Utc::now(),
      },
      Err(error) => QueryState::Error {
        error,
        stale: self.state.borrow().data().cloned(),
      },
    };
    self.state.send_replace(next);
    Resolution::Applied
  }
}
