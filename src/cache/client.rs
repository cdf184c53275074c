//! Query client: the shared cache that views subscribe to.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::FutureExt;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::backend::BackendRouter;
use crate::config::Config;
use crate::error::QueryError;
use crate::identity::RequestIdentity;
use crate::transport::{HttpTransport, Transport};

use super::entry::{Entry, FetchResult, Resolution};
use super::state::QueryState;
use super::subscription::QuerySubscription;

struct ClientInner {
  router: BackendRouter,
  transport: Arc<dyn Transport>,
  /// How long an unsubscribed entry is kept around
  gc_time: Duration,
  entries: Mutex<HashMap<RequestIdentity, Entry>>,
  next_seq: AtomicU64,
  next_generation: AtomicU64,
}

impl ClientInner {
  fn entries(&self) -> MutexGuard<'_, HashMap<RequestIdentity, Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn finish_fetch(&self, identity: &RequestIdentity, generation: u64, seq: u64, outcome: FetchResult) {
    let mut entries = self.entries();
    let entry = match entries.get_mut(identity) {
      Some(entry) if entry.generation == generation => entry,
      _ => {
        debug!(%identity, seq, "entry evicted, discarding fetch result");
        return;
      }
    };

    let failed = outcome.as_ref().err().map(|e| e.to_string());
    match entry.resolve(seq, outcome) {
      Resolution::Applied => match failed {
        Some(error) => info!(%identity, seq, %error, "fetch failed"),
        None => debug!(%identity, seq, "fetch applied"),
      },
      Resolution::Superseded => debug!(%identity, seq, "fetch superseded by a newer request"),
      Resolution::Discarded => debug!(%identity, seq, "stale fetch result discarded"),
    }
  }

  fn collect(&self, identity: &RequestIdentity, generation: u64, idle_epoch: u64) {
    let mut entries = self.entries();
    let expired = entries.get(identity).is_some_and(|entry| {
      entry.generation == generation && entry.subscribers == 0 && entry.idle_epoch == idle_epoch
    });
    if expired {
      entries.remove(identity);
      debug!(%identity, "evicted unused entry");
    }
  }
}

/// Start a fetch for `entry` on `runtime`, superseding any fetch already in
/// flight.
fn start_fetch(
  inner: &Arc<ClientInner>,
  runtime: &Handle,
  identity: &RequestIdentity,
  entry: &mut Entry,
) {
  let seq = inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
  let fetch = entry
    .request
    .execute(inner.transport.as_ref(), Method::GET, None)
    .map(|result| result.map(Arc::new))
    .boxed()
    .shared();

  entry.begin_fetch(seq, fetch.clone());
  debug!(%identity, hash = %identity.query_hash(), seq, "fetch started");

  let weak: Weak<ClientInner> = Arc::downgrade(inner);
  let identity = identity.clone();
  let generation = entry.generation;
  runtime.spawn(async move {
    let outcome = fetch.await;
    if let Some(inner) = weak.upgrade() {
      inner.finish_fetch(&identity, generation, seq, outcome);
    }
  });
}

/// Cache of fetched data keyed by [`RequestIdentity`].
///
/// The client is an explicitly constructed handle; clones share the same
/// cache. It owns the backend router and the transport, deduplicates
/// in-flight fetches and refetches subscribed entries on invalidation.
///
/// ```ignore
/// let client = QueryClient::from_config(&config)?;
/// let mut users = client.subscribe(RequestIdentity::legacy("accounts/customer-support-agents"))?;
/// let data = users.settled().await?;
/// ```
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<ClientInner>,
}

impl QueryClient {
  pub fn new(router: BackendRouter, transport: Arc<dyn Transport>, gc_time: Duration) -> Self {
    Self {
      inner: Arc::new(ClientInner {
        router,
        transport,
        gc_time,
        entries: Mutex::new(HashMap::new()),
        next_seq: AtomicU64::new(0),
        next_generation: AtomicU64::new(0),
      }),
    }
  }

  /// Build a client talking HTTP to the configured backends.
  pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
    let transport = HttpTransport::new(&config.transport, config.messages.conflict.clone())?;
    Ok(Self::new(
      BackendRouter::from_config(&config.backends),
      Arc::new(transport),
      config.cache.gc_time(),
    ))
  }

  pub fn router(&self) -> &BackendRouter {
    &self.inner.router
  }

  pub fn transport(&self) -> &dyn Transport {
    self.inner.transport.as_ref()
  }

  /// Register interest in an identity.
  ///
  /// Starts a fetch unless the entry already holds data or has one in
  /// flight; cached data is served as-is. Routing errors surface here,
  /// before anything is sent. A fetch needs a tokio runtime on the calling
  /// thread; without one this fails with [`QueryError::NoRuntime`] and
  /// nothing is registered. Dropping the returned handle unsubscribes.
  pub fn subscribe(&self, identity: RequestIdentity) -> Result<QuerySubscription, QueryError> {
    let runtime = Handle::try_current().ok();
    let mut entries = self.inner.entries();

    let entry = match entries.entry(identity.clone()) {
      MapEntry::Occupied(occupied) => occupied.into_mut(),
      MapEntry::Vacant(vacant) => {
        let request = self.inner.router.resolve(&identity)?;
        if runtime.is_none() {
          return Err(QueryError::NoRuntime);
        }
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(%identity, generation, "cache entry created");
        vacant.insert(Entry::new(generation, request))
      }
    };

    if entry.needs_fetch() {
      let Some(runtime) = &runtime else {
        return Err(QueryError::NoRuntime);
      };
      start_fetch(&self.inner, runtime, &identity, entry);
    }

    entry.subscribers += 1;
    let receiver = entry.state.subscribe();
    let generation = entry.generation;

    Ok(QuerySubscription::new(
      identity,
      generation,
      self.clone(),
      receiver,
    ))
  }

  /// Fetch an identity once: serves cached data or waits for the fetch.
  pub async fn fetch(&self, identity: RequestIdentity) -> Result<Arc<Value>, QueryError> {
    let mut subscription = self.subscribe(identity)?;
    subscription.settled().await
  }

  /// Like [`fetch`](Self::fetch), decoding the payload.
  pub async fn fetch_as<T: DeserializeOwned>(&self, identity: RequestIdentity) -> Result<T, QueryError> {
    let data = self.fetch(identity).await?;
    Ok(serde_json::from_value((*data).clone())?)
  }

  /// Current state of an identity, if it has an entry.
  pub fn state(&self, identity: &RequestIdentity) -> Option<QueryState<Arc<Value>>> {
    self
      .inner
      .entries()
      .get(identity)
      .map(|entry| entry.state.borrow().clone())
  }

  pub fn subscriber_count(&self, identity: &RequestIdentity) -> usize {
    self
      .inner
      .entries()
      .get(identity)
      .map(|entry| entry.subscribers)
      .unwrap_or(0)
  }

  /// Number of live entries.
  pub fn len(&self) -> usize {
    self.inner.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Invalidate one identity. Returns the number of refetches started.
  pub fn invalidate(&self, identity: &RequestIdentity) -> usize {
    self.invalidate_matching(|candidate| candidate == identity)
  }

  /// Invalidate every variant of a resource path.
  pub fn invalidate_resource(&self, resource_path: &str) -> usize {
    let resource_path = resource_path.trim();
    self.invalidate_matching(|candidate| candidate.resource_path() == resource_path)
  }

  /// Invalidate every identity matching `predicate`.
  ///
  /// Subscribed entries refetch immediately (superseding any fetch in
  /// flight); unsubscribed entries are dropped and fetched again on the
  /// next subscription. Outside a tokio runtime subscribed entries settle
  /// with [`QueryError::NoRuntime`] instead. Returns the number of
  /// refetches started.
  pub fn invalidate_matching<P>(&self, predicate: P) -> usize
  where
    P: Fn(&RequestIdentity) -> bool,
  {
    let runtime = Handle::try_current().ok();
    let mut entries = self.inner.entries();
    let mut refetched = 0;
    let mut dropped = Vec::new();

    for (identity, entry) in entries.iter_mut() {
      if !predicate(identity) {
        continue;
      }
      match &runtime {
        _ if entry.subscribers == 0 => dropped.push(identity.clone()),
        Some(runtime) => {
          start_fetch(&self.inner, runtime, identity, entry);
          refetched += 1;
        }
        None => {
          warn!(%identity, "no runtime to refetch invalidated entry");
          entry.fail(QueryError::NoRuntime);
        }
      }
    }

    for identity in &dropped {
      entries.remove(identity);
    }

    info!(refetched, dropped = dropped.len(), "cache invalidated");
    refetched
  }

  /// Drop every entry. Waiting subscribers observe [`QueryError::Closed`].
  pub fn clear(&self) {
    let mut entries = self.inner.entries();
    let count = entries.len();
    entries.clear();
    info!(count, "query cache cleared");
  }

  pub(super) fn release(&self, identity: &RequestIdentity, generation: u64) {
    let mut entries = self.inner.entries();
    let entry = match entries.get_mut(identity) {
      Some(entry) if entry.generation == generation => entry,
      _ => return,
    };

    entry.subscribers = entry.subscribers.saturating_sub(1);
    if entry.subscribers > 0 {
      return;
    }
    entry.idle_epoch += 1;
    let idle_epoch = entry.idle_epoch;

    let gc_time = self.inner.gc_time;
    let runtime = tokio::runtime::Handle::try_current();
    match runtime {
      Ok(handle) if !gc_time.is_zero() => {
        let weak = Arc::downgrade(&self.inner);
        let identity = identity.clone();
        handle.spawn(async move {
          tokio::time::sleep(gc_time).await;
          if let Some(inner) = weak.upgrade() {
            inner.collect(&identity, generation, idle_epoch);
          }
        });
      }
      _ => {
        entries.remove(identity);
        debug!(%identity, "evicted entry without subscribers");
      }
    }
  }
}

impl fmt::Debug for QueryClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("QueryClient")
      .field("router", &self.inner.router)
      .field("gc_time", &self.inner.gc_time)
      .field("entries", &self.len())
      .finish_non_exhaustive()
  }
}
