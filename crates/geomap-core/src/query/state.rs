use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::api::ApiError;
use crate::error::Error;
use crate::models::Company;

/// How long a list read stays fresh before it is revalidated.
/// Company locations change rarely; five minutes keeps the map snappy.
pub const LIST_STALE_SECS: u64 = 5 * 60;

/// Detail reads revalidate on every access by default.
pub const DETAIL_STALE_SECS: u64 = 0;

/// Freshness windows for the query cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub list_stale_time: Duration,
    pub detail_stale_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            list_stale_time: Duration::from_secs(LIST_STALE_SECS),
            detail_stale_time: Duration::from_secs(DETAIL_STALE_SECS),
        }
    }
}

/// Lifecycle of a single query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing cached and nothing requested.
    Empty,
    /// A fetch is in flight. Previously cached data, if any, is still served.
    Loading,
    /// Data is cached and within its freshness window.
    Fulfilled,
    /// Data is cached but past its window or invalidated by a mutation.
    Stale,
    /// The last fetch failed and there is no data to fall back on.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CacheValue {
    List(Vec<Company>),
    Detail(Company),
}

impl CacheValue {
    pub fn into_list(self) -> Result<Vec<Company>, Error> {
        match self {
            CacheValue::List(list) => Ok(list),
            CacheValue::Detail(c) => Err(mismatch("list", c.id)),
        }
    }

    pub fn into_detail(self) -> Result<Company, Error> {
        match self {
            CacheValue::Detail(company) => Ok(company),
            CacheValue::List(_) => Err(mismatch("company", -1)),
        }
    }
}

// Keys and values are paired on insert, so this only fires on a bug.
fn mismatch(expected: &str, id: i64) -> Error {
    Error::Api(Arc::new(ApiError::Decode(format!(
        "cache held the wrong value type (expected {}, id {})",
        expected, id
    ))))
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Entry {
    pub value: Option<CacheValue>,
    pub updated_at: Option<Instant>,
    pub invalidated: bool,
    pub error: Option<Arc<ApiError>>,
}

impl Entry {
    pub fn fulfilled(value: CacheValue) -> Self {
        Self {
            value: Some(value),
            updated_at: Some(Instant::now()),
            invalidated: false,
            error: None,
        }
    }

    pub fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        if self.invalidated {
            return true;
        }
        match self.updated_at {
            Some(at) => now.saturating_duration_since(at) >= stale_time,
            None => true,
        }
    }
}

/// Render the age of cached data for status lines.
pub fn age_display(age: Duration) -> String {
    let minutes = age.as_secs() / 60;
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}
