//! Error types for the catalog model.
//!
//! Two families live here. [`SelectionError`] and the range errors from
//! `horizon-catalog-core` are programming-contract violations: fatal to
//! the operation that caused them, surfaced synchronously, never retried.
//! [`SourceError`] and [`FetchError`] are expected at runtime (network
//! flakiness); they are caught at the query-handle or tree-node boundary
//! and converted into per-node error state rather than crashing the tree.
//! Retry, if wanted, belongs in a `RecordSource` implementation; nothing
//! in this crate retries.

use horizon_catalog_core::RangeError;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised by a Record Source or Grouping Value Source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with an error status.
    #[error("server returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server {
        /// The HTTP status code.
        status: u16,
        /// Optional error message from the response body.
        message: Option<String>,
    },

    /// The response arrived but could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// A source call failed while serving a specific query.
///
/// Always carries the originating query's canonical key so a failure seen
/// in a log or an error affordance can be traced to the exact
/// (filters, sort) pair that produced it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("fetch for query '{key}' failed: {source}")]
pub struct FetchError {
    key: String,
    #[source]
    source: SourceError,
}

impl FetchError {
    /// Wraps a source error with the canonical key of the failing query.
    pub fn new(key: impl Into<String>, source: SourceError) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }

    /// The canonical key of the query whose fetch failed.
    pub fn canonical_key(&self) -> &str {
        &self.key
    }

    /// The underlying source failure.
    pub fn source_error(&self) -> &SourceError {
        &self.source
    }
}

/// Errors from selection and focus operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// A global focus index was outside `[0, count())`.
    #[error("focus index {index} is out of bounds for a selection of {count} rows")]
    IndexOutOfBounds {
        /// The offending global index.
        index: u64,
        /// The total number of selected rows.
        count: u64,
    },

    /// The referenced `(query, index)` pair is not currently selected.
    #[error("row {index} of query '{key}' is not selected")]
    NotSelected {
        /// Canonical key of the referenced query.
        key: String,
        /// The row index within that query.
        index: u64,
    },
}

/// A grouping traversal was superseded (or its owner torn down) before it
/// finished; its partial results were discarded rather than applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("grouping traversal was cancelled before completion")]
pub struct Cancelled;

/// The top-level error type for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A remote fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A selection or focus operation violated its contract.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A range operation violated its contract.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// A grouping traversal was cancelled mid-flight.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_canonical_key() {
        let err = FetchError::new(
            "Gene=\"LMNB1\"#Uploaded:desc",
            SourceError::Server {
                status: 503,
                message: Some("backend unavailable".into()),
            },
        );
        assert_eq!(err.canonical_key(), "Gene=\"LMNB1\"#Uploaded:desc");
        let rendered = err.to_string();
        assert!(rendered.contains("Gene=\"LMNB1\""));
        assert!(rendered.contains("503"));
    }

    #[test]
    fn test_server_error_without_message() {
        let err = SourceError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(err.to_string(), "server returned HTTP 500");
    }
}
