//! Scripted transport for tests.
//!
//! Responses are queued per `(method, url)` and consumed in order. A
//! deferred response lets a test decide when (and in which order) in-flight
//! requests resolve.
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.respond_json(Method::GET, "http://legacy.test/accounts", json!([]));
//! let release = transport.defer(Method::GET, "http://legacy.test/chats");
//! // ... later
//! let _ = release.send(Ok(json!([])));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::QueryError;

use super::{Transport, TransportRequest};

enum MockResponse {
  Ready(Result<Value, QueryError>),
  Deferred(oneshot::Receiver<Result<Value, QueryError>>),
}

#[derive(Default)]
struct MockState {
  responses: HashMap<(Method, String), VecDeque<MockResponse>>,
  calls: Vec<TransportRequest>,
}

/// Transport that answers from a queue of scripted responses.
#[derive(Clone, Default)]
pub struct MockTransport {
  state: Arc<Mutex<MockState>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a response for the next request to `url`.
  pub fn respond(&self, method: Method, url: &str, result: Result<Value, QueryError>) {
    self.push(method, url, MockResponse::Ready(result));
  }

  pub fn respond_json(&self, method: Method, url: &str, value: Value) {
    self.respond(method, url, Ok(value));
  }

  /// Queue a response that resolves when the returned sender fires.
  ///
  /// Dropping the sender resolves the request with a transport error.
  pub fn defer(&self, method: Method, url: &str) -> oneshot::Sender<Result<Value, QueryError>> {
    let (tx, rx) = oneshot::channel();
    self.push(method, url, MockResponse::Deferred(rx));
    tx
  }

  /// Every request sent so far, in order.
  pub fn calls(&self) -> Vec<TransportRequest> {
    self.lock().calls.clone()
  }

  pub fn call_count(&self, method: &Method, url: &str) -> usize {
    self
      .lock()
      .calls
      .iter()
      .filter(|call| {
        &call.method == method && call.url().map(|u| u.as_str() == url).unwrap_or(false)
      })
      .count()
  }

  fn push(&self, method: Method, url: &str, response: MockResponse) {
    self
      .lock()
      .responses
      .entry((method, url.to_string()))
      .or_default()
      .push_back(response);
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Transport for MockTransport {
  fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<Value, QueryError>> {
    let url = match request.url() {
      Ok(url) => url.to_string(),
      Err(e) => return futures::future::ready(Err(e)).boxed(),
    };

    let response = {
      let mut state = self.lock();
      state.calls.push(request.clone());
      state
        .responses
        .get_mut(&(request.method.clone(), url.clone()))
        .and_then(VecDeque::pop_front)
    };

    async move {
      match response {
        Some(MockResponse::Ready(result)) => result,
        Some(MockResponse::Deferred(rx)) => rx
          .await
          .unwrap_or_else(|_| Err(QueryError::Transport("mock response dropped".to_string()))),
        None => Err(QueryError::Transport(format!(
          "no mock response for {} {}",
          request.method, url
        ))),
      }
    }
    .boxed()
  }
}
