//! Transport collaborator: sends one JSON request to a target origin.
//!
//! The query cache and the mutation pipeline never talk HTTP directly; they
//! hand a [`TransportRequest`] to a [`Transport`] and get JSON or a
//! [`QueryError`] back. [`HttpTransport`] is the reqwest implementation,
//! [`mock::MockTransport`] a scripted one for tests.

mod http;
pub mod mock;

use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::QueryError;

pub use http::HttpTransport;

/// A single request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
  pub method: Method,
  pub base_url: Url,
  pub path: String,
  pub body: Option<Value>,
}

impl TransportRequest {
  pub fn new(method: Method, base_url: Url, path: impl Into<String>) -> Self {
    Self {
      method,
      base_url,
      path: path.into(),
      body: None,
    }
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  /// Full request URL.
  ///
  /// The path is always appended below the base URL (`http://host/api` +
  /// `users` is `http://host/api/users`); an absolute path replaces the
  /// base entirely.
  pub fn url(&self) -> Result<Url, QueryError> {
    let mut base = self.base_url.clone();
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    base
      .join(self.path.trim_start_matches('/'))
      .map_err(|e| QueryError::Routing(format!("invalid path '{}': {}", self.path, e)))
  }
}

/// Capability to send a request and decode the JSON answer.
///
/// Implementations map non-2xx responses to [`QueryError::Server`] (or
/// [`QueryError::Conflict`] for 409) and network failures to
/// [`QueryError::Transport`]. Timeouts are the implementation's concern.
pub trait Transport: Send + Sync {
  fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<Value, QueryError>>;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(base: &str, path: &str) -> TransportRequest {
    TransportRequest::new(Method::GET, Url::parse(base).unwrap(), path)
  }

  #[test]
  fn test_url_appends_below_base_path() {
    let url = request("http://localhost:8080/api", "accounts/customer-support-agents")
      .url()
      .unwrap();
    assert_eq!(
      url.as_str(),
      "http://localhost:8080/api/accounts/customer-support-agents"
    );
  }

  #[test]
  fn test_url_ignores_leading_slash() {
    let url = request("http://localhost:8080/api/", "/cs-get-all-active-chats")
      .url()
      .unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/api/cs-get-all-active-chats");
  }

  #[test]
  fn test_url_absolute_path_replaces_base() {
    let url = request("http://localhost:8080/", "https://other.example.com/status")
      .url()
      .unwrap();
    assert_eq!(url.as_str(), "https://other.example.com/status");
  }

  #[test]
  fn test_with_body() {
    let req = request("http://localhost/", "accounts/delete")
      .with_body(serde_json::json!({ "userIdCode": "A1" }));
    assert_eq!(req.body, Some(serde_json::json!({ "userIdCode": "A1" })));
  }
}
