//! Mutation pipeline for creating, updating and deleting resources.
//!
//! A mutation is a one-off write routed like a query. Nothing is cached and
//! cached data is never edited optimistically: after the server confirms the
//! write, the identities it affects are invalidated so subscribed views
//! refetch.
//!
//! # Example
//!
//! ```ignore
//! let mutation = Mutation::post(RequestIdentity::legacy("accounts/delete"))
//!   .with_body(json!({ "userIdCode": "A1" }))
//!   .invalidates(RequestIdentity::legacy("accounts/customer-support-agents"))
//!   .notify_success("Notification", "User deleted")
//!   .on_success(|_| modal.close());
//!
//! pipeline.mutate(mutation).await?;
//! ```

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::QueryClient;
use crate::error::QueryError;
use crate::identity::RequestIdentity;
use crate::notify::{Notification, Notifier};

type SuccessCallback = Box<dyn FnOnce(&Value) + Send>;
type ErrorCallback = Box<dyn FnOnce(&QueryError) + Send>;

const DEFAULT_ERROR_TITLE: &str = "Error";

/// What to invalidate once a mutation succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
  /// A single identity
  Identity(RequestIdentity),
  /// Every variant of a resource path
  Resource(String),
}

/// A write operation plus what should happen after it.
pub struct Mutation {
  method: Method,
  target: RequestIdentity,
  body: Option<Value>,
  invalidates: Vec<Invalidation>,
  success_notice: Option<Notification>,
  error_title: String,
  on_success: Option<SuccessCallback>,
  on_error: Option<ErrorCallback>,
}

impl Mutation {
  pub fn new(method: Method, target: RequestIdentity) -> Self {
    Self {
      method,
      target,
      body: None,
      invalidates: Vec::new(),
      success_notice: None,
      error_title: DEFAULT_ERROR_TITLE.to_string(),
      on_success: None,
      on_error: None,
    }
  }

  pub fn post(target: RequestIdentity) -> Self {
    Self::new(Method::POST, target)
  }

  pub fn put(target: RequestIdentity) -> Self {
    Self::new(Method::PUT, target)
  }

  pub fn delete(target: RequestIdentity) -> Self {
    Self::new(Method::DELETE, target)
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  /// Invalidate `identity` after a successful write.
  pub fn invalidates(mut self, identity: RequestIdentity) -> Self {
    self.invalidates.push(Invalidation::Identity(identity));
    self
  }

  /// Invalidate every variant of `resource_path` after a successful write.
  pub fn invalidates_resource(mut self, resource_path: impl Into<String>) -> Self {
    self
      .invalidates
      .push(Invalidation::Resource(resource_path.into()));
    self
  }

  pub fn notify_success(mut self, title: impl Into<String>, message: impl Into<String>) -> Self {
    self.success_notice = Some(Notification::success(title, message));
    self
  }

  /// Title of the error notification; the message is the error itself.
  pub fn error_title(mut self, title: impl Into<String>) -> Self {
    self.error_title = title.into();
    self
  }

  pub fn on_success<F>(mut self, callback: F) -> Self
  where
    F: FnOnce(&Value) + Send + 'static,
  {
    self.on_success = Some(Box::new(callback));
    self
  }

  pub fn on_error<F>(mut self, callback: F) -> Self
  where
    F: FnOnce(&QueryError) + Send + 'static,
  {
    self.on_error = Some(Box::new(callback));
    self
  }

  pub fn target(&self) -> &RequestIdentity {
    &self.target
  }

  pub fn invalidations(&self) -> &[Invalidation] {
    &self.invalidates
  }
}

impl fmt::Debug for Mutation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Mutation")
      .field("method", &self.method)
      .field("target", &self.target)
      .field("body", &self.body)
      .field("invalidates", &self.invalidates)
      .finish_non_exhaustive()
  }
}

/// Progress of a mutation, for views that show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState<T> {
  /// Mutation is idle (not yet started).
  Idle,
  /// Mutation is in progress.
  Loading,
  /// Mutation succeeded with a result.
  Success(T),
  /// Mutation failed with an error.
  Error(String),
}

impl<T> MutationState<T> {
  pub fn from_result(result: &Result<T, QueryError>) -> Self
  where
    T: Clone,
  {
    match result {
      Ok(data) => MutationState::Success(data.clone()),
      Err(e) => MutationState::Error(e.to_string()),
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, MutationState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, MutationState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, MutationState::Error(_))
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Runs mutations against the client's backends and keeps its cache honest.
#[derive(Clone)]
pub struct MutationPipeline {
  client: QueryClient,
  notifier: Arc<dyn Notifier>,
}

impl MutationPipeline {
  pub fn new(client: QueryClient, notifier: Arc<dyn Notifier>) -> Self {
    Self { client, notifier }
  }

  pub fn client(&self) -> &QueryClient {
    &self.client
  }

  /// Perform the write.
  ///
  /// On success the declared identities are invalidated, then the success
  /// notification and callback run. On failure the error notification and
  /// callback run and the cache is left untouched. Either way the outcome
  /// is returned to the caller as well.
  pub async fn mutate(&self, mutation: Mutation) -> Result<Value, QueryError> {
    let Mutation {
      method,
      target,
      body,
      invalidates,
      success_notice,
      error_title,
      on_success,
      on_error,
    } = mutation;

    debug!(%method, %target, "mutation started");
    let result = match self.client.router().resolve(&target) {
      Ok(resolved) => {
        resolved
          .execute(self.client.transport(), method.clone(), body)
          .await
      }
      Err(e) => Err(e),
    };

    match result {
      Ok(value) => {
        for invalidation in &invalidates {
          match invalidation {
            Invalidation::Identity(identity) => self.client.invalidate(identity),
            Invalidation::Resource(path) => self.client.invalidate_resource(path),
          };
        }
        debug!(%method, %target, invalidated = invalidates.len(), "mutation succeeded");

        if let Some(notice) = success_notice {
          self.notifier.notify(notice);
        }
        if let Some(callback) = on_success {
          callback(&value);
        }
        Ok(value)
      }
      Err(error) => {
        warn!(%method, %target, kind = error.kind(), %error, "mutation failed");
        self
          .notifier
          .notify(Notification::error(error_title, error.to_string()));
        if let Some(callback) = on_error {
          callback(&error);
        }
        Err(error)
      }
    }
  }
}

impl fmt::Debug for MutationPipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MutationPipeline")
      .field("client", &self.client)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::{Backend, BackendKind, BackendRouter, ResponseAdapter};
  use crate::notify::{ChannelNotifier, NotificationKind};
  use crate::transport::mock::MockTransport;
  use serde_json::json;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::time::Duration;
  use url::Url;

  const LIST: &str = "http://legacy.test/accounts/customer-support-agents";
  const DELETE: &str = "http://legacy.test/accounts/delete";

  fn setup() -> (
    MockTransport,
    MutationPipeline,
    tokio::sync::mpsc::UnboundedReceiver<Notification>,
  ) {
    let transport = MockTransport::new();
    let router = BackendRouter::new(
      Backend::new(
        BackendKind::Default,
        Url::parse("http://default.test/").unwrap(),
        ResponseAdapter::Passthrough,
      ),
      Backend::new(
        BackendKind::Legacy,
        Url::parse("http://legacy.test/").unwrap(),
        ResponseAdapter::UnwrapResponseIfPresent,
      ),
      Backend::new(
        BackendKind::Alternate,
        Url::parse("http://alternate.test/").unwrap(),
        ResponseAdapter::UnwrapResponse,
      ),
    );
    let client = QueryClient::new(router, Arc::new(transport.clone()), Duration::ZERO);
    let (notifier, rx) = ChannelNotifier::new();
    (transport, MutationPipeline::new(client, Arc::new(notifier)), rx)
  }

  fn list() -> RequestIdentity {
    RequestIdentity::legacy("accounts/customer-support-agents")
  }

  fn delete(id: &str) -> Mutation {
    Mutation::post(RequestIdentity::legacy("accounts/delete"))
      .with_body(json!({ "userIdCode": id }))
      .invalidates(list())
      .notify_success("Notification", "User deleted")
  }

  #[tokio::test]
  async fn test_success_invalidates_after_response() {
    let (transport, pipeline, mut rx) = setup();
    transport.respond_json(Method::GET, LIST, json!([{ "idCode": "A1" }]));
    transport.respond_json(Method::GET, LIST, json!([]));
    let release = transport.defer(Method::POST, DELETE);

    let mut sub = pipeline.client().subscribe(list()).unwrap();
    sub.settled().await.unwrap();

    let pending = tokio::spawn({
      let pipeline = pipeline.clone();
      async move { pipeline.mutate(delete("A1")).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Not invalidated while the write is pending
    assert_eq!(transport.call_count(&Method::GET, LIST), 1);
    assert!(sub.state().is_success());

    release.send(Ok(Value::Null)).unwrap();
    assert_eq!(pending.await.unwrap(), Ok(Value::Null));

    assert_eq!(*sub.settled().await.unwrap(), json!([]));
    assert_eq!(transport.call_count(&Method::GET, LIST), 2);
    assert_eq!(
      rx.recv().await,
      Some(Notification::success("Notification", "User deleted"))
    );

    let calls = transport.calls();
    let write = calls.iter().find(|c| c.method == Method::POST).unwrap();
    assert_eq!(write.body, Some(json!({ "userIdCode": "A1" })));
  }

  #[tokio::test]
  async fn test_failure_leaves_cache_untouched() {
    let (transport, pipeline, mut rx) = setup();
    transport.respond_json(Method::GET, LIST, json!([{ "idCode": "A1" }]));
    transport.respond(
      Method::POST,
      DELETE,
      Err(QueryError::Server {
        status: 500,
        message: "Internal Server Error".to_string(),
      }),
    );

    let mut sub = pipeline.client().subscribe(list()).unwrap();
    sub.settled().await.unwrap();

    let failed = Arc::new(AtomicBool::new(false));
    let flag = failed.clone();
    let result = pipeline
      .mutate(delete("A1").on_error(move |_| flag.store(true, Ordering::SeqCst)))
      .await;

    assert_eq!(result.unwrap_err().status(), Some(500));
    assert!(failed.load(Ordering::SeqCst));
    assert_eq!(transport.call_count(&Method::GET, LIST), 1);
    assert_eq!(*sub.settled().await.unwrap(), json!([{ "idCode": "A1" }]));

    let notification = rx.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.title, "Error");
    assert_eq!(notification.message, "Server error 500: Internal Server Error");
  }

  #[tokio::test]
  async fn test_success_callback_receives_payload() {
    let (transport, pipeline, _rx) = setup();
    transport.respond_json(
      Method::POST,
      "http://legacy.test/accounts/add",
      json!({ "response": { "idCode": "B2" } }),
    );

    let (tx, rx) = tokio::sync::oneshot::channel();
    let mutation = Mutation::post(RequestIdentity::legacy("accounts/add"))
      .with_body(json!({ "idCode": "B2" }))
      .on_success(move |value| {
        let _ = tx.send(value.clone());
      });

    pipeline.mutate(mutation).await.unwrap();
    assert_eq!(rx.await.unwrap(), json!({ "idCode": "B2" }));
  }

  #[tokio::test]
  async fn test_routing_error_reaches_error_callback() {
    let (transport, pipeline, mut rx) = setup();

    let result = pipeline
      .mutate(Mutation::delete(RequestIdentity::legacy("")).error_title("Delete failed"))
      .await;

    assert!(matches!(result, Err(QueryError::Routing(_))));
    assert!(transport.calls().is_empty());
    let notification = rx.recv().await.unwrap();
    assert_eq!(notification.title, "Delete failed");
  }

  #[test]
  fn test_mutation_state() {
    let ok: MutationState<u32> = MutationState::from_result(&Ok(1));
    assert!(ok.is_success());

    let err: MutationState<u32> =
      MutationState::from_result(&Err(QueryError::Transport("offline".to_string())));
    assert!(err.is_error());
    assert_eq!(err.error(), Some("Network error: offline"));

    assert!(MutationState::<u32>::Loading.is_loading());
  }
}
