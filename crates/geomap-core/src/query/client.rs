//! Query client: a keyed, stale-while-revalidate cache over `CompanyApi`.
//!
//! Reads are served from the cache while fresh. Once stale, the cached value
//! is returned immediately and a background refetch replaces it. Concurrent
//! reads of the same key share one request.
//!
//! Mutations go to the server first. Only after a mutation succeeds is the
//! cache patched (append, replace or remove), and the list key is then
//! invalidated and refetched so the server's answer overwrites the local
//! patch. Every key carries a generation number that invalidation bumps; a
//! fetch that started under an older generation completes for its callers
//! but never writes to the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, CompanyApi};
use crate::error::Error;
use crate::models::{Company, CreateCompanyData, DeleteResponse, UpdateCompanyData};
use crate::validation::{CompanyForm, UpdateCompanyForm};

use super::keys::{CacheEvent, QueryKey};
use super::state::{CacheValue, Entry, QueryOptions, QueryStatus};

/// Buffer size for the change notification channel.
/// Subscribers that fall further behind than this see a `Lagged` error.
const EVENT_CHANNEL_CAPACITY: usize = 64;

type FetchResult = Result<CacheValue, Arc<ApiError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct Store {
    entries: HashMap<QueryKey, Entry>,
    in_flight: HashMap<QueryKey, InFlight>,
    generations: HashMap<QueryKey, u64>,
    closed: bool,
}

impl Store {
    fn generation(&self, key: QueryKey) -> u64 {
        self.generations.get(&key).copied().unwrap_or(0)
    }

    fn bump(&mut self, key: QueryKey) {
        *self.generations.entry(key).or_insert(0) += 1;
    }

    fn is_fetching(&self, key: QueryKey) -> bool {
        self.in_flight
            .get(&key)
            .is_some_and(|f| f.generation == self.generation(key))
    }

    fn list_mut(&mut self) -> Option<&mut Vec<Company>> {
        match self.entries.get_mut(&QueryKey::List) {
            Some(Entry {
                value: Some(CacheValue::List(list)),
                ..
            }) => Some(list),
            _ => None,
        }
    }
}

struct Inner {
    api: Arc<dyn CompanyApi>,
    options: QueryOptions,
    store: Mutex<Store>,
    events: broadcast::Sender<CacheEvent>,
}

impl Inner {
    fn stale_time(&self, key: QueryKey) -> Duration {
        match key {
            QueryKey::List => self.options.list_stale_time,
            QueryKey::Detail(_) => self.options.detail_stale_time,
        }
    }

    fn notify(&self, events: impl IntoIterator<Item = CacheEvent>) {
        for event in events {
            // No receivers is fine: nobody is watching.
            let _ = self.events.send(event);
        }
    }

    /// Return the in-flight fetch for `key` or start a new one.
    /// Must be called with the store locked; the fetch itself runs unlocked.
    /// A new fetch is spawned so it settles even if every caller goes away.
    fn start_fetch(self: &Arc<Self>, store: &mut Store, key: QueryKey) -> SharedFetch {
        let generation = store.generation(key);
        if let Some(in_flight) = store.in_flight.get(&key) {
            if in_flight.generation == generation {
                debug!(%key, "Joining in-flight fetch");
                return in_flight.future.clone();
            }
        }

        debug!(%key, generation, "Starting fetch");
        let inner = Arc::clone(self);
        let future = async move {
            let result = match key {
                QueryKey::List => inner.api.list_companies().await.map(CacheValue::List),
                QueryKey::Detail(id) => inner.api.get_company(id).await.map(CacheValue::Detail),
            }
            .map_err(Arc::new);
            inner.settle(key, generation, &result);
            result
        }
        .boxed()
        .shared();

        store.in_flight.insert(
            key,
            InFlight {
                generation,
                future: future.clone(),
            },
        );
        tokio::spawn(future.clone());
        future
    }

    /// Write a completed fetch into the cache, unless the key has moved on
    /// to a newer generation or the client was torn down.
    fn settle(&self, key: QueryKey, generation: u64, result: &FetchResult) {
        let event = {
            let mut store = self.store.lock();
            if store
                .in_flight
                .get(&key)
                .is_some_and(|f| f.generation == generation)
            {
                store.in_flight.remove(&key);
            }
            if store.closed {
                debug!(%key, "Client torn down, discarding fetch result");
                return;
            }
            if store.generation(key) != generation {
                debug!(%key, generation, "Discarding superseded fetch result");
                return;
            }

            let entry = store.entries.entry(key).or_default();
            match result {
                Ok(value) => {
                    *entry = Entry::fulfilled(value.clone());
                    CacheEvent::Updated(key)
                }
                Err(e) => {
                    if entry.value.is_some() {
                        // Keep serving the previous data; the entry stays
                        // stale so the next read tries again.
                        warn!(%key, error = %e, "Refetch failed, keeping cached data");
                    } else {
                        error!(%key, error = %e, "Fetch failed");
                    }
                    entry.error = Some(Arc::clone(e));
                    CacheEvent::Failed(key)
                }
            }
        };
        self.notify([event]);
    }
}

/// Cache-backed access to the company service.
///
/// Created once at application start and handed to every consumer.
/// Clone is cheap - all clones share one cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new(api: impl CompanyApi + 'static) -> Self {
        Self::with_options(api, QueryOptions::default())
    }

    pub fn with_options(api: impl CompanyApi + 'static, options: QueryOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                api: Arc::new(api),
                options,
                store: Mutex::new(Store::default()),
                events,
            }),
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.inner.options
    }

    /// Receive a `CacheEvent` for every change to the cache.
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All companies, served from cache when possible.
    pub async fn companies(&self) -> Result<Vec<Company>, Error> {
        self.read(QueryKey::List).await?.into_list()
    }

    /// One company, served from cache when possible. A missing company is
    /// an `ApiError::Status` with status 404.
    pub async fn company(&self, id: i64) -> Result<Company, Error> {
        self.read(QueryKey::Detail(id)).await?.into_detail()
    }

    /// Fetch the list now, bypassing freshness. Concurrent callers share the
    /// request. On failure the previously cached list stays in place.
    pub async fn refetch_companies(&self) -> Result<Vec<Company>, Error> {
        let pending = {
            let mut store = self.inner.store.lock();
            self.inner.start_fetch(&mut store, QueryKey::List)
        };
        pending.await.map_err(Error::Api)?.into_list()
    }

    async fn read(&self, key: QueryKey) -> Result<CacheValue, Error> {
        let pending = {
            let mut store = self.inner.store.lock();
            let now = Instant::now();
            let stale_time = self.inner.stale_time(key);

            let cached = store
                .entries
                .get(&key)
                .and_then(|e| e.value.clone().map(|v| (v, e.is_stale(now, stale_time))));

            match cached {
                Some((value, false)) => {
                    debug!(%key, "Cache hit");
                    return Ok(value);
                }
                Some((value, true)) => {
                    if !store.is_fetching(key) {
                        debug!(%key, "Serving stale data, revalidating in background");
                        let _ = self.inner.start_fetch(&mut store, key);
                    }
                    return Ok(value);
                }
                None => self.inner.start_fetch(&mut store, key),
            }
        };
        pending.await.map_err(Error::Api)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a company and append it to the cached list.
    pub async fn create_company(&self, data: &CreateCompanyData) -> Result<Company, Error> {
        let created = match self.inner.api.create_company(data).await {
            Ok(company) => company,
            Err(e) => {
                error!(error = %e, name = %data.name, "Failed to create company");
                return Err(e.into());
            }
        };
        info!(id = created.id, name = %created.name, "Company created");

        self.commit(|store| {
            if let Some(list) = store.list_mut() {
                list.push(created.clone());
                vec![CacheEvent::Updated(QueryKey::List)]
            } else {
                Vec::new()
            }
        });
        Ok(created)
    }

    /// Update a company and replace it in the list and detail caches.
    pub async fn update_company(
        &self,
        id: i64,
        data: &UpdateCompanyData,
    ) -> Result<Company, Error> {
        let updated = match self.inner.api.update_company(id, data).await {
            Ok(company) => company,
            Err(e) => {
                error!(error = %e, id, "Failed to update company");
                return Err(e.into());
            }
        };
        info!(id = updated.id, "Company updated");

        self.commit(|store| {
            let mut events = Vec::new();
            if let Some(list) = store.list_mut() {
                if let Some(slot) = list.iter_mut().find(|c| c.id == updated.id) {
                    *slot = updated.clone();
                    events.push(CacheEvent::Updated(QueryKey::List));
                }
            }

            let detail = QueryKey::Detail(updated.id);
            store.bump(detail);
            store
                .entries
                .insert(detail, Entry::fulfilled(CacheValue::Detail(updated.clone())));
            events.push(CacheEvent::Updated(detail));
            events
        });
        Ok(updated)
    }

    /// Delete a company, drop it from the cached list and evict its detail.
    pub async fn delete_company(&self, id: i64) -> Result<DeleteResponse, Error> {
        let response = match self.inner.api.delete_company(id).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, id, "Failed to delete company");
                return Err(e.into());
            }
        };
        info!(id, "Company deleted");

        self.commit(|store| {
            let mut events = Vec::new();
            if let Some(list) = store.list_mut() {
                let before = list.len();
                list.retain(|c| c.id != id);
                if list.len() != before {
                    events.push(CacheEvent::Updated(QueryKey::List));
                }
            }

            let detail = QueryKey::Detail(id);
            store.bump(detail);
            if store.entries.remove(&detail).is_some() {
                events.push(CacheEvent::Removed(detail));
            }
            events
        });
        Ok(response)
    }

    /// Validate a create form, then create the company.
    /// Invalid input never reaches the server.
    pub async fn submit_company(&self, form: &CompanyForm) -> Result<Company, Error> {
        let data = form.validate()?;
        self.create_company(&data).await
    }

    /// Validate an edit form, then update the company.
    pub async fn submit_update(&self, id: i64, form: &UpdateCompanyForm) -> Result<Company, Error> {
        let data = form.validate()?;
        self.update_company(id, &data).await
    }

    /// Apply a successful mutation's cache patch, then invalidate the list
    /// and start its reconciling refetch. All writes happen under one lock.
    fn commit(&self, patch: impl FnOnce(&mut Store) -> Vec<CacheEvent>) {
        let events = {
            let mut store = self.inner.store.lock();
            if store.closed {
                debug!("Client torn down, skipping cache update");
                return;
            }
            let events = patch(&mut store);

            store.bump(QueryKey::List);
            let refetch = match store.entries.get_mut(&QueryKey::List) {
                Some(entry) => {
                    entry.invalidated = true;
                    entry.value.is_some()
                }
                None => false,
            };
            if refetch {
                debug!("Reconciling company list");
                let _ = self.inner.start_fetch(&mut store, QueryKey::List);
            }
            events
        };

        self.inner.notify(events);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Cached list without triggering a fetch.
    pub fn cached_companies(&self) -> Option<Vec<Company>> {
        let store = self.inner.store.lock();
        match store.entries.get(&QueryKey::List) {
            Some(Entry {
                value: Some(CacheValue::List(list)),
                ..
            }) => Some(list.clone()),
            _ => None,
        }
    }

    /// Cached company without triggering a fetch.
    pub fn cached_company(&self, id: i64) -> Option<Company> {
        let store = self.inner.store.lock();
        match store.entries.get(&QueryKey::Detail(id)) {
            Some(Entry {
                value: Some(CacheValue::Detail(company)),
                ..
            }) => Some(company.clone()),
            _ => None,
        }
    }

    pub fn status(&self, key: QueryKey) -> QueryStatus {
        let store = self.inner.store.lock();
        if store.is_fetching(key) {
            return QueryStatus::Loading;
        }
        match store.entries.get(&key) {
            Some(entry) if entry.value.is_some() => {
                if entry.is_stale(Instant::now(), self.inner.stale_time(key)) {
                    QueryStatus::Stale
                } else {
                    QueryStatus::Fulfilled
                }
            }
            Some(entry) if entry.error.is_some() => QueryStatus::Failed,
            _ => QueryStatus::Empty,
        }
    }

    pub fn is_fetching(&self, key: QueryKey) -> bool {
        self.inner.store.lock().is_fetching(key)
    }

    /// Error from the most recent failed fetch of `key`, cleared on success.
    pub fn last_error(&self, key: QueryKey) -> Option<Arc<ApiError>> {
        let store = self.inner.store.lock();
        store.entries.get(&key).and_then(|e| e.error.clone())
    }

    /// Time since `key` was last written.
    pub fn age(&self, key: QueryKey) -> Option<Duration> {
        let store = self.inner.store.lock();
        store
            .entries
            .get(&key)
            .and_then(|e| e.updated_at)
            .map(|at| at.elapsed())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark `key` stale so the next read revalidates it.
    pub fn invalidate(&self, key: QueryKey) {
        let mut store = self.inner.store.lock();
        store.bump(key);
        if let Some(entry) = store.entries.get_mut(&key) {
            entry.invalidated = true;
        }
    }

    /// Drop every cached entry. Results of requests still in flight, and of
    /// mutations that complete afterwards, are discarded.
    pub fn teardown(&self) {
        let mut store = self.inner.store.lock();
        store.closed = true;
        store.entries.clear();
        store.in_flight.clear();
        info!("Query client torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.store.lock().closed
    }
}
