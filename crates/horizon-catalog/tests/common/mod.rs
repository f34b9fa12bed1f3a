//! Shared in-memory catalog fixture.
//!
//! Implements both collaborator traits over a fixed record list so tests
//! can exercise the full model without any transport. Filtering, sorting,
//! paging, and distinct-value listing follow the documented source
//! contracts, and count traffic is instrumented so tests can observe
//! caching behavior.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use horizon_catalog::{
    FileRecord, Filter, FilterMode, GroupingValueSource, RecordSource, SortDirection, SortOrder,
    SourceError,
};

/// An in-memory record and grouping-value source.
pub struct StaticCatalog {
    files: Vec<FileRecord>,
    /// Filters whose presence makes any call fail, for error-path tests.
    failing: Vec<Filter>,
    count_calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self {
            files,
            failing: Vec::new(),
            count_calls: AtomicUsize::new(0),
        }
    }

    /// Makes every call that includes `filter` fail with a server error.
    pub fn failing_on(mut self, filter: Filter) -> Self {
        self.failing.push(filter);
        self
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, filters: &[Filter]) -> Result<(), SourceError> {
        if self.failing.iter().any(|f| filters.contains(f)) {
            return Err(SourceError::Server {
                status: 503,
                message: Some("backend unavailable".into()),
            });
        }
        Ok(())
    }

    fn matching(&self, filters: &[Filter]) -> Vec<&FileRecord> {
        self.files
            .iter()
            .filter(|record| filters.iter().all(|f| filter_matches(record, f)))
            .collect()
    }
}

fn filter_matches(record: &FileRecord, filter: &Filter) -> bool {
    let value = record.annotations.get(filter.name());
    match filter.mode() {
        FilterMode::Equals => value == Some(filter.value()),
        FilterMode::Contains => match (value, filter.value()) {
            (Some(Value::String(hay)), Value::String(needle)) => hay.contains(needle),
            _ => false,
        },
        FilterMode::AnyValue => value.is_some_and(|v| !v.is_null()),
        FilterMode::NoValue => value.is_none_or(|v| v.is_null()),
    }
}

fn sort_key(record: &FileRecord, column: &str) -> String {
    if column == "File Name" {
        return record.name.clone();
    }
    record
        .annotations
        .get(column)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn compare(a: &FileRecord, b: &FileRecord, sort: &SortOrder) -> CmpOrdering {
    let ordering = sort_key(a, sort.column()).cmp(&sort_key(b, sort.column()));
    match sort.direction() {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

#[async_trait]
impl RecordSource for StaticCatalog {
    async fn count_matching(&self, filters: &[Filter]) -> Result<u64, SourceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(filters)?;
        Ok(self.matching(filters).len() as u64)
    }

    async fn get_page(
        &self,
        filters: &[Filter],
        sort: &[SortOrder],
        page_start: u64,
        limit: u64,
    ) -> Result<Vec<FileRecord>, SourceError> {
        self.check_failure(filters)?;
        let mut rows = self.matching(filters);
        // Later sort orders break ties of earlier ones; a stable sort
        // applied in reverse order gives exactly that.
        for order in sort.iter().rev() {
            rows.sort_by(|a, b| compare(a, b, order));
        }
        Ok(rows
            .into_iter()
            .skip(page_start as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GroupingValueSource for StaticCatalog {
    async fn fetch_root_values(
        &self,
        dimensions: &[String],
        filters: &[Filter],
    ) -> Result<Vec<Value>, SourceError> {
        self.check_failure(filters)?;
        Ok(self.distinct_values(&dimensions[0], filters, &[]))
    }

    async fn fetch_values_under_path(
        &self,
        dimensions: &[String],
        path: &[(String, Value)],
        filters: &[Filter],
    ) -> Result<Vec<Value>, SourceError> {
        self.check_failure(filters)?;
        Ok(self.distinct_values(&dimensions[path.len()], filters, path))
    }
}

impl StaticCatalog {
    fn distinct_values(
        &self,
        dimension: &str,
        filters: &[Filter],
        path: &[(String, Value)],
    ) -> Vec<Value> {
        let mut scoped = filters.to_vec();
        for (name, value) in path {
            if value.is_null() {
                scoped.push(Filter::no_value(name.clone()));
            } else {
                scoped.push(Filter::equals(name.clone(), value.clone()));
            }
        }

        let mut values: Vec<Value> = Vec::new();
        for record in self.matching(&scoped) {
            if let Some(value) = record.annotations.get(dimension) {
                if !value.is_null() && !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        values.sort_by_key(std::string::ToString::to_string);
        values
    }
}

/// Installs a subscriber so `RUST_LOG=horizon_catalog=debug` surfaces
/// fetch and traversal traffic while debugging tests.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Builds a record with the given annotations.
pub fn file(id: &str, name: &str, annotations: &[(&str, Value)]) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        name: name.to_string(),
        path: format!("/catalog/{name}"),
        size: Some(1024),
        uploaded: None,
        thumbnail: None,
        annotations: annotations
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect::<HashMap<_, _>>(),
    }
}
