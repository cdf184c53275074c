//! Request identities: what data is wanted and which backend serves it.

use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::QueryError;

/// Backend selection attached to a [`RequestIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoutingTarget {
  /// The console's own API
  Default,
  /// The legacy API instance (variant `"prod"`)
  Legacy,
  /// The API instance whose payloads are wrapped in a `response` envelope
  /// (variant `"prod-2"`)
  AlternateShape,
  /// Default-backend conventions against an arbitrary origin
  AbsoluteUrl(Url),
}

impl RoutingTarget {
  /// Parse the string variant used by console pages.
  ///
  /// - `None` selects the default backend
  /// - `"prod"` selects the legacy backend
  /// - `"prod-2"` selects the alternate-shape backend
  /// - anything starting with `"http"` is an absolute origin
  ///
  /// Every other variant is a routing error.
  pub fn from_variant(variant: Option<&str>) -> Result<Self, QueryError> {
    match variant {
      None => Ok(Self::Default),
      Some("prod") => Ok(Self::Legacy),
      Some("prod-2") => Ok(Self::AlternateShape),
      Some(v) if v.starts_with("http") => Url::parse(v)
        .map(Self::AbsoluteUrl)
        .map_err(|e| QueryError::Routing(format!("invalid origin '{}': {}", v, e))),
      Some(v) => Err(QueryError::Routing(format!("unknown variant '{}'", v))),
    }
  }

  /// Short label for logs and descriptions.
  pub fn label(&self) -> &str {
    match self {
      Self::Default => "default",
      Self::Legacy => "legacy",
      Self::AlternateShape => "alternate",
      Self::AbsoluteUrl(url) => url.as_str(),
    }
  }
}

/// Normalized key for a data request.
///
/// Equality and hashing cover both the resource path and the routing
/// target, so `("accounts", Legacy)` and `("accounts", AlternateShape)` are
/// distinct cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestIdentity {
  resource_path: String,
  target: RoutingTarget,
}

impl RequestIdentity {
  pub fn new(resource_path: impl Into<String>, target: RoutingTarget) -> Self {
    Self {
      resource_path: normalize_path(&resource_path.into()),
      target,
    }
  }

  /// Identity against the default backend.
  pub fn default_backend(resource_path: impl Into<String>) -> Self {
    Self::new(resource_path, RoutingTarget::Default)
  }

  pub fn legacy(resource_path: impl Into<String>) -> Self {
    Self::new(resource_path, RoutingTarget::Legacy)
  }

  pub fn alternate(resource_path: impl Into<String>) -> Self {
    Self::new(resource_path, RoutingTarget::AlternateShape)
  }

  /// Build an identity from the `(path, variant)` pair used by console pages.
  pub fn from_variant(
    resource_path: impl Into<String>,
    variant: Option<&str>,
  ) -> Result<Self, QueryError> {
    Ok(Self::new(resource_path, RoutingTarget::from_variant(variant)?))
  }

  pub fn resource_path(&self) -> &str {
    &self.resource_path
  }

  pub fn target(&self) -> &RoutingTarget {
    &self.target
  }

  /// Stable fixed-length hash of the identity, used as a log label.
  pub fn query_hash(&self) -> String {
    let origin = match &self.target {
      RoutingTarget::AbsoluteUrl(url) => Some(url.as_str()),
      _ => None,
    };
    let input = serde_json::json!([self.target_tag(), origin, self.resource_path]).to_string();

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn target_tag(&self) -> &'static str {
    match self.target {
      RoutingTarget::Default => "default",
      RoutingTarget::Legacy => "legacy",
      RoutingTarget::AlternateShape => "alternate",
      RoutingTarget::AbsoluteUrl(_) => "absolute",
    }
  }
}

impl fmt::Display for RequestIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}]", self.resource_path, self.target.label())
  }
}

/// Trim surrounding whitespace so `" accounts "` and `"accounts"` share an entry.
fn normalize_path(path: &str) -> String {
  path.trim().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_from_variant_known_values() {
    assert_eq!(RoutingTarget::from_variant(None), Ok(RoutingTarget::Default));
    assert_eq!(
      RoutingTarget::from_variant(Some("prod")),
      Ok(RoutingTarget::Legacy)
    );
    assert_eq!(
      RoutingTarget::from_variant(Some("prod-2")),
      Ok(RoutingTarget::AlternateShape)
    );
  }

  #[test]
  fn test_from_variant_absolute_url() {
    let target = RoutingTarget::from_variant(Some("https://ruuter.example.com/v1/")).unwrap();
    match target {
      RoutingTarget::AbsoluteUrl(url) => assert_eq!(url.host_str(), Some("ruuter.example.com")),
      other => panic!("unexpected target {:?}", other),
    }
  }

  #[test]
  fn test_from_variant_rejects_unknown() {
    let err = RoutingTarget::from_variant(Some("staging")).unwrap_err();
    assert!(matches!(err, QueryError::Routing(_)));

    let err = RoutingTarget::from_variant(Some("http//missing-colon")).unwrap_err();
    assert!(matches!(err, QueryError::Routing(_)));
  }

  #[test]
  fn test_variant_isolation() {
    let legacy = RequestIdentity::from_variant("accounts", Some("prod")).unwrap();
    let alternate = RequestIdentity::from_variant("accounts", Some("prod-2")).unwrap();
    let default = RequestIdentity::from_variant("accounts", None).unwrap();

    let set: HashSet<_> = [legacy.clone(), alternate.clone(), default.clone()]
      .into_iter()
      .collect();
    assert_eq!(set.len(), 3);
    assert_ne!(legacy.query_hash(), alternate.query_hash());
    assert_ne!(legacy.query_hash(), default.query_hash());
  }

  #[test]
  fn test_structural_equality() {
    let a = RequestIdentity::legacy("accounts/customer-support-agents");
    let b = RequestIdentity::from_variant(" accounts/customer-support-agents ", Some("prod")).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.query_hash(), b.query_hash());
    assert_eq!(a.query_hash().len(), 64);
  }

  #[test]
  fn test_display() {
    let id = RequestIdentity::alternate("chats/active");
    assert_eq!(id.to_string(), "chats/active [alternate]");
  }
}
