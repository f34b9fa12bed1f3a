//! Immutable query handles over the remote catalog.
//!
//! A [`FileQuery`] represents one canonical `(filters, sort)` pair and
//! mediates all paged access to that query's result rows. Handles are
//! value objects: two handles built from the same logical query compare
//! equal and hash identically no matter which order their filters were
//! supplied in, and every map or set keyed by a query uses that canonical
//! identity, never pointer identity.
//!
//! Cloning a handle is cheap and shares the underlying row cache and
//! memoized total count, so a query's cache is effectively per-distinct-
//! query, shared by every consumer. Callers must not assume exclusive
//! ownership.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use futures_util::future;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use horizon_catalog_core::{Filter, IndexRange, RowCache, SortOrder};

use crate::error::FetchError;
use crate::record::FileRecord;
use crate::source::RecordSource;

/// Default bound on the number of rows a query keeps cached.
pub const DEFAULT_ROW_CACHE_CAPACITY: usize = 1000;

struct QueryState {
    filters: Vec<Filter>,
    sort: Vec<SortOrder>,
    key: String,
    source: Arc<dyn RecordSource>,
    total_count: OnceCell<u64>,
    cache: Mutex<RowCache<Arc<FileRecord>>>,
}

/// An immutable handle on one filtered, sorted view of the remote catalog.
///
/// # Example
///
/// ```ignore
/// use horizon_catalog::FileQuery;
/// use horizon_catalog_core::{Filter, SortOrder};
///
/// let query = FileQuery::new(
///     source,
///     vec![Filter::equals("Cell Line", "AICS-0".into())],
///     vec![SortOrder::descending("Uploaded")],
/// );
///
/// let total = query.total_count().await?;
/// let first_page = query.fetch_range(0, 50).await?;
/// ```
#[derive(Clone)]
pub struct FileQuery {
    state: Arc<QueryState>,
}

impl FileQuery {
    /// Creates a handle for the given filters and sort against `source`,
    /// with the default row cache capacity.
    pub fn new(source: Arc<dyn RecordSource>, filters: Vec<Filter>, sort: Vec<SortOrder>) -> Self {
        Self::with_cache_capacity(source, filters, sort, DEFAULT_ROW_CACHE_CAPACITY)
    }

    /// Creates a handle with an explicit row cache capacity.
    pub fn with_cache_capacity(
        source: Arc<dyn RecordSource>,
        mut filters: Vec<Filter>,
        sort: Vec<SortOrder>,
        cache_capacity: usize,
    ) -> Self {
        // Filters are kept in canonical order so the key, equality, and the
        // superset test are all insensitive to construction order.
        filters.sort_by_key(|f| f.canonical_token());
        let key = Self::build_key(&filters, &sort);
        Self {
            state: Arc::new(QueryState {
                filters,
                sort,
                key,
                source,
                total_count: OnceCell::new(),
                cache: Mutex::new(RowCache::new(cache_capacity)),
            }),
        }
    }

    fn build_key(filters: &[Filter], sort: &[SortOrder]) -> String {
        let filter_part: Vec<String> = filters.iter().map(Filter::canonical_token).collect();
        let sort_part: Vec<String> = sort.iter().map(SortOrder::canonical_token).collect();
        format!("{}#{}", filter_part.join("&"), sort_part.join("&"))
    }

    /// The deterministic, filter-order-independent serialization of this
    /// query. Identical for any two handles over the same logical query.
    pub fn canonical_key(&self) -> &str {
        &self.state.key
    }

    /// The filter set, in canonical order.
    pub fn filters(&self) -> &[Filter] {
        &self.state.filters
    }

    /// The sort order list, in application order.
    pub fn sort(&self) -> &[SortOrder] {
        &self.state.sort
    }

    /// The record source this handle fetches from.
    pub fn source(&self) -> &Arc<dyn RecordSource> {
        &self.state.source
    }

    /// Derives a handle scoped by additional filters, keeping this
    /// handle's sort and source. Used to form folder queries from an
    /// ancestor path.
    pub fn scoped(&self, extra_filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters = self.state.filters.clone();
        filters.extend(extra_filters);
        Self::new(
            Arc::clone(&self.state.source),
            filters,
            self.state.sort.clone(),
        )
    }

    /// Returns true if this handle's filter set is a superset of (or equal
    /// to) the given filters.
    ///
    /// This is the "is this folder beneath that filter scope" test: it
    /// lets a collapsed ancestor folder match selections nested somewhere
    /// below it without requiring exact query equality.
    pub fn matches(&self, filters: &[Filter]) -> bool {
        filters.iter().all(|f| self.state.filters.contains(f))
    }

    /// The total number of rows this query resolves to.
    ///
    /// Queried from the source once per distinct canonical key and
    /// memoized on the handle; concurrent callers awaiting the same
    /// in-flight request share one network call. A failed attempt is not
    /// memoized, so a later call retries.
    pub async fn total_count(&self) -> Result<u64, FetchError> {
        self.state
            .total_count
            .get_or_try_init(|| async {
                tracing::debug!(
                    target: "horizon_catalog::query",
                    "Counting rows for '{}'",
                    self.state.key
                );
                self.state
                    .source
                    .count_matching(&self.state.filters)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            target: "horizon_catalog::query",
                            "Count for '{}' failed: {e}",
                            self.state.key
                        );
                        FetchError::new(self.state.key.clone(), e)
                    })
            })
            .await
            .copied()
    }

    /// The memoized total count, if it has already been fetched.
    pub fn total_count_cached(&self) -> Option<u64> {
        self.state.total_count.get().copied()
    }

    /// Fetches the half-open index window `[start, end)` from the source
    /// and caches each returned row by its index.
    ///
    /// The full window is always requested from the source, even when some
    /// of its rows are already cached; only the cache write is idempotent.
    /// Overlapping windows may race, and the cache write is last-write-wins
    /// per index, which is acceptable because rows for a fixed (filters, sort,
    /// index) are stable for the lifetime of the handle.
    pub async fn fetch_range(&self, start: u64, end: u64) -> Result<Vec<Arc<FileRecord>>, FetchError> {
        if start >= end {
            return Ok(Vec::new());
        }

        tracing::debug!(
            target: "horizon_catalog::query",
            "Fetching rows [{start}, {end}) for '{}'",
            self.state.key
        );

        let records = self
            .state
            .source
            .get_page(&self.state.filters, &self.state.sort, start, end - start)
            .await
            .map_err(|e| {
                tracing::error!(
                    target: "horizon_catalog::query",
                    "Fetch of [{start}, {end}) for '{}' failed: {e}",
                    self.state.key
                );
                FetchError::new(self.state.key.clone(), e)
            })?;

        let records: Vec<Arc<FileRecord>> = records.into_iter().map(Arc::new).collect();

        let mut cache = self.state.cache.lock();
        for (offset, record) in records.iter().enumerate() {
            cache.insert(start + offset as u64, Arc::clone(record));
        }

        Ok(records)
    }

    /// Fetches an inclusive index range in bounded batches, awaiting all
    /// of them before returning.
    ///
    /// Bulk selections (a shift-click across a large span) resolve through
    /// this so a selection is never reported resolved while only partially
    /// populated. Batches are issued concurrently.
    pub async fn fetch_range_batched(
        &self,
        range: IndexRange,
        batch_size: u64,
    ) -> Result<Vec<Arc<FileRecord>>, FetchError> {
        let batch_size = batch_size.max(1);

        let mut windows = Vec::new();
        let mut cursor = range.min();
        loop {
            let remaining = range.max() - cursor + 1;
            let take = remaining.min(batch_size);
            windows.push((cursor, cursor + take));
            if take == remaining {
                break;
            }
            cursor += take;
        }

        let batches = future::try_join_all(
            windows
                .into_iter()
                .map(|(start, end)| self.fetch_range(start, end)),
        )
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    /// Cache-only lookup of a row by index. Never triggers a fetch;
    /// returns `None` if the row has not been loaded (or was evicted).
    pub fn file_by_index(&self, index: u64) -> Option<Arc<FileRecord>> {
        self.state.cache.lock().get(index).map(Arc::clone)
    }

    /// Returns true if the row at `index` is currently cached.
    pub fn is_loaded(&self, index: u64) -> bool {
        self.state.cache.lock().contains(index)
    }
}

impl PartialEq for FileQuery {
    fn eq(&self, other: &Self) -> bool {
        self.state.key == other.state.key
    }
}

impl Eq for FileQuery {}

impl Hash for FileQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.key.hash(state);
    }
}

impl fmt::Debug for FileQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileQuery")
            .field("key", &self.state.key)
            .field("total_count", &self.state.total_count.get())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FileQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.state.key)
    }
}
