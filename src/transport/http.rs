use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::QueryError;

use super::{Transport, TransportRequest};

/// reqwest-backed transport shared by every backend.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
  conflict_message: String,
}

impl HttpTransport {
  pub fn new(config: &TransportConfig, conflict_message: impl Into<String>) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    // Session cookies are how the console authenticates against every backend
    let client = reqwest::Client::builder()
      .default_headers(headers)
      .cookie_store(true)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      conflict_message: conflict_message.into(),
    })
  }
}

impl Transport for HttpTransport {
  fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<Value, QueryError>> {
    let client = self.client.clone();
    let conflict_message = self.conflict_message.clone();

    async move {
      let url = request.url()?;
      debug!(method = %request.method, %url, "sending request");

      let mut builder = client.request(request.method.clone(), url.clone());
      if let Some(body) = &request.body {
        builder = builder.json(body);
      }

      let response = builder
        .send()
        .await
        .map_err(|e| QueryError::Transport(e.to_string()))?;

      let status = response.status();
      debug!(method = %request.method, %url, status = status.as_u16(), "received response");

      if status.is_success() {
        let bytes = response
          .bytes()
          .await
          .map_err(|e| QueryError::Transport(e.to_string()))?;
        if bytes.is_empty() {
          return Ok(Value::Null);
        }
        return Ok(serde_json::from_slice(&bytes)?);
      }

      let body = response.text().await.unwrap_or_default();
      Err(classify_status(status.as_u16(), &body, &conflict_message))
    }
    .boxed()
  }
}

/// Map a non-2xx status and its body to an error.
pub(crate) fn classify_status(status: u16, body: &str, conflict_message: &str) -> QueryError {
  let server_message = server_message(status, body);
  if status == 409 {
    return QueryError::Conflict {
      message: conflict_message.to_string(),
      server_message,
    };
  }
  QueryError::Server {
    status,
    message: server_message,
  }
}

/// Best-effort message from an error body: a JSON `message`/`error` field,
/// else the raw text, else a generic status line.
fn server_message(status: u16, body: &str) -> String {
  if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
    for field in ["message", "error"] {
      if let Some(Value::String(message)) = map.get(field) {
        return message.clone();
      }
    }
  }

  let text = body.trim();
  if text.is_empty() {
    format!("Request failed with status code {}", status)
  } else {
    text.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_conflict_uses_configured_message() {
    let err = classify_status(409, r#"{"message":"already exists"}"#, "Conflict, reload");
    assert_eq!(
      err,
      QueryError::Conflict {
        message: "Conflict, reload".to_string(),
        server_message: "already exists".to_string(),
      }
    );
  }

  #[test]
  fn test_server_error_json_message() {
    let err = classify_status(500, r#"{"error":"database down"}"#, "conflict");
    assert_eq!(
      err,
      QueryError::Server {
        status: 500,
        message: "database down".to_string(),
      }
    );
  }

  #[test]
  fn test_server_error_plain_text() {
    let err = classify_status(403, "Forbidden\n", "conflict");
    assert_eq!(
      err,
      QueryError::Server {
        status: 403,
        message: "Forbidden".to_string(),
      }
    );
  }

  #[test]
  fn test_server_error_empty_body() {
    let err = classify_status(502, "", "conflict");
    assert_eq!(err.to_string(), "Server error 502: Request failed with status code 502");
  }

  #[test]
  fn test_new_builds_client() {
    let transport = HttpTransport::new(&TransportConfig::default(), "conflict");
    assert!(transport.is_ok());
  }
}
