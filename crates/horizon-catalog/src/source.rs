//! Collaborator traits for remote data access.
//!
//! The model layer never talks to a server directly; it consumes two
//! narrow, object-safe async traits. HTTP transport, authentication,
//! retry, and backoff all live behind implementations of these traits:
//! by the time data reaches this crate it is already decoded.
//!
//! The one contract implementations must honor: for a fixed canonical
//! `(filters, sort)` pair, repeated calls return rows in a stable order.
//! Row indices are only meaningful against a stable order, and every
//! selection in this crate is index-based.

use async_trait::async_trait;
use horizon_catalog_core::{Filter, SortOrder};
use serde_json::Value;

use crate::error::SourceError;
use crate::record::FileRecord;

/// Remote source of file records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Counts the records matching the given filter set.
    async fn count_matching(&self, filters: &[Filter]) -> Result<u64, SourceError>;

    /// Fetches one page of records.
    ///
    /// `page_start` is the offset of the first row to return under the
    /// given filters and sort; `limit` is the maximum number of rows.
    async fn get_page(
        &self,
        filters: &[Filter],
        sort: &[SortOrder],
        page_start: u64,
        limit: u64,
    ) -> Result<Vec<FileRecord>, SourceError>;
}

/// Remote source of distinct grouping values.
///
/// Used by the hierarchical traversal to discover which folders exist at
/// each level. Values are returned as a flat ordered list per call; the
/// traversal preserves that order in the tree.
#[async_trait]
pub trait GroupingValueSource: Send + Sync {
    /// Fetches the distinct values of the first grouping dimension,
    /// restricted by the given filters.
    async fn fetch_root_values(
        &self,
        dimensions: &[String],
        filters: &[Filter],
    ) -> Result<Vec<Value>, SourceError>;

    /// Fetches the distinct values of the dimension below `path`,
    /// restricted to records matching every `(dimension, value)` pair on
    /// the path plus the given filters.
    async fn fetch_values_under_path(
        &self,
        dimensions: &[String],
        path: &[(String, Value)],
        filters: &[Filter],
    ) -> Result<Vec<Value>, SourceError>;
}
