//! In-memory query cache.
//!
//! Inspired by TanStack Query, this module keeps one entry per
//! [`RequestIdentity`](crate::identity::RequestIdentity):
//! - concurrent subscribers share a single in-flight fetch
//! - cached data is served without refetching until invalidated
//! - invalidation refetches subscribed entries and drops the rest
//! - fetches are sequence-tagged so a slow response never overwrites a
//!   newer one

mod client;
mod entry;
mod state;
mod subscription;

pub use client::QueryClient;
pub use state::{QueryState, QueryStatus};
pub use subscription::QuerySubscription;
