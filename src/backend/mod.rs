//! Backend router: maps a [`RequestIdentity`] to a concrete request against
//! one of the configured API instances.

mod adapter;

use std::fmt;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::BackendsConfig;
use crate::error::QueryError;
use crate::identity::{RequestIdentity, RoutingTarget};
use crate::transport::{Transport, TransportRequest};

pub use adapter::ResponseAdapter;

/// Which configured backend serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
  Default,
  Legacy,
  Alternate,
}

impl fmt::Display for BackendKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BackendKind::Default => write!(f, "default"),
      BackendKind::Legacy => write!(f, "legacy"),
      BackendKind::Alternate => write!(f, "alternate"),
    }
  }
}

/// A configured API instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Backend {
  pub kind: BackendKind,
  pub base_url: Url,
  pub adapter: ResponseAdapter,
}

impl Backend {
  pub fn new(kind: BackendKind, base_url: Url, adapter: ResponseAdapter) -> Self {
    Self {
      kind,
      base_url,
      adapter,
    }
  }
}

/// Outcome of routing an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
  pub backend: BackendKind,
  pub base_url: Url,
  pub path: String,
  pub adapter: ResponseAdapter,
}

impl ResolvedRequest {
  /// Full URL the request goes to.
  pub fn url(&self) -> Result<Url, QueryError> {
    self.request(Method::GET).url()
  }

  fn request(&self, method: Method) -> TransportRequest {
    TransportRequest::new(method, self.base_url.clone(), self.path.clone())
  }

  /// Send the request and run the payload through the backend's adapter.
  pub fn execute(
    &self,
    transport: &dyn Transport,
    method: Method,
    body: Option<Value>,
  ) -> BoxFuture<'static, Result<Value, QueryError>> {
    let mut request = self.request(method);
    request.body = body;

    let adapter = self.adapter;
    let pending = transport.send(request);
    async move { adapter.adapt(pending.await?) }.boxed()
  }
}

/// Resolves identities against the default, legacy and alternate backends.
#[derive(Debug, Clone)]
pub struct BackendRouter {
  default: Backend,
  legacy: Backend,
  alternate: Backend,
}

impl BackendRouter {
  pub fn new(default: Backend, legacy: Backend, alternate: Backend) -> Self {
    Self {
      default,
      legacy,
      alternate,
    }
  }

  /// Build the router from configuration.
  ///
  /// Unless overridden, the alternate backend strictly unwraps its
  /// `response` envelope and the legacy backend unwraps it when present.
  pub fn from_config(config: &BackendsConfig) -> Self {
    Self::new(
      Backend::new(
        BackendKind::Default,
        config.default.url.clone(),
        config.default.envelope.unwrap_or(ResponseAdapter::Passthrough),
      ),
      Backend::new(
        BackendKind::Legacy,
        config.legacy.url.clone(),
        config
          .legacy
          .envelope
          .unwrap_or(ResponseAdapter::UnwrapResponseIfPresent),
      ),
      Backend::new(
        BackendKind::Alternate,
        config.alternate.url.clone(),
        config
          .alternate
          .envelope
          .unwrap_or(ResponseAdapter::UnwrapResponse),
      ),
    )
  }

  pub fn backend(&self, kind: BackendKind) -> &Backend {
    match kind {
      BackendKind::Default => &self.default,
      BackendKind::Legacy => &self.legacy,
      BackendKind::Alternate => &self.alternate,
    }
  }

  /// Resolve an identity to a backend and URL.
  ///
  /// Deterministic: equal identities always resolve to equal requests.
  pub fn resolve(&self, identity: &RequestIdentity) -> Result<ResolvedRequest, QueryError> {
    if identity.resource_path().is_empty() {
      return Err(QueryError::Routing(format!(
        "empty resource path for {} backend",
        identity.target().label()
      )));
    }

    let (backend, base_url) = match identity.target() {
      RoutingTarget::Legacy => (&self.legacy, self.legacy.base_url.clone()),
      RoutingTarget::AlternateShape => (&self.alternate, self.alternate.base_url.clone()),
      RoutingTarget::AbsoluteUrl(origin) => (&self.default, origin.clone()),
      RoutingTarget::Default => (&self.default, self.default.base_url.clone()),
    };

    let resolved = ResolvedRequest {
      backend: backend.kind,
      base_url,
      path: identity.resource_path().to_string(),
      adapter: backend.adapter,
    };

    // Invalid URLs fail here, not in the transport
    let url = resolved.url()?;
    debug!(%identity, backend = %resolved.backend, %url, "resolved request");

    Ok(resolved)
  }

  /// Resolve and fetch an identity with GET.
  pub fn fetch(
    &self,
    transport: &dyn Transport,
    identity: &RequestIdentity,
  ) -> BoxFuture<'static, Result<Value, QueryError>> {
    match self.resolve(identity) {
      Ok(resolved) => resolved.execute(transport, Method::GET, None),
      Err(e) => futures::future::ready(Err(e)).boxed(),
    }
  }
}
