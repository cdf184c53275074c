//! Client-side data layer for a multi-backend administrative console.
//!
//! - [`backend`] routes a [`RequestIdentity`] to one of several API
//!   instances and normalizes their response envelopes
//! - [`cache`] deduplicates, caches and invalidates fetched data
//! - [`mutation`] runs writes and invalidates what they affect
//! - [`table`] filters, sorts and paginates rows for display
//! - [`accounts`] is the customer support accounts console built on top

pub mod accounts;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod modal;
pub mod mutation;
pub mod notify;
pub mod render;
pub mod table;
pub mod transport;

pub use cache::{QueryClient, QueryState, QueryStatus, QuerySubscription};
pub use error::QueryError;
pub use identity::{RequestIdentity, RoutingTarget};
pub use mutation::{Mutation, MutationPipeline};
