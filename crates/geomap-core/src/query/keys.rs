use std::fmt;

/// Address of one cache entry. Equal keys name the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The full company collection.
    List,
    /// A single company by id.
    Detail(i64),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::List => write!(f, "companies/list"),
            QueryKey::Detail(id) => write!(f, "companies/detail/{}", id),
        }
    }
}

/// Change notifications broadcast to subscribers of a `QueryClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// The entry now holds new data.
    Updated(QueryKey),
    /// The entry was evicted.
    Removed(QueryKey),
    /// A fetch for the entry failed; any previous data is still cached.
    Failed(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> QueryKey {
        match self {
            CacheEvent::Updated(key) | CacheEvent::Removed(key) | CacheEvent::Failed(key) => *key,
        }
    }
}
