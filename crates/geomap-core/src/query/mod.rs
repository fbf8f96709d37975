//! Cache-synchronized query layer.
//!
//! This module provides the `QueryClient`, which wraps a `CompanyApi` in a
//! keyed cache. The list of companies stays fresh for five minutes; after
//! that it is served stale while a background refetch replaces it.
//!
//! Mutations patch the cache only after the server accepts them, then
//! invalidate and refetch the list so the server's copy always wins.

pub mod client;
pub mod keys;
pub mod state;

pub use client::QueryClient;
pub use keys::{CacheEvent, QueryKey};
pub use state::{age_display, QueryOptions, QueryStatus, DETAIL_STALE_SECS, LIST_STALE_SECS};
