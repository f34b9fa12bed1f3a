//! Horizon Catalog - a client-side model for browsing large remote file catalogs.
//!
//! A catalog may hold millions of file records; this crate maintains a
//! correct, immutable model of "which rows exist" and "which rows are
//! selected" without ever materializing the whole collection. The
//! collection is partitioned into many independently paged, independently
//! sorted folder queries, fetched lazily and out of order, and reshaped by
//! grouping/filter/sort changes that must not corrupt in-flight or
//! already-resolved selections.
//!
//! # Components
//!
//! - [`FileQuery`]: an immutable handle on one canonical (filters, sort)
//!   pair, with paged fetch, a bounded per-row cache, and a memoized
//!   total count
//! - [`FileSelection`]: a copy-on-write ledger of selected row ranges
//!   across query handles, plus the single focused row
//! - [`GroupTraversal`]: the recursive async algorithm turning grouping
//!   dimensions into a pruned tree of folder queries
//! - [`RecordSource`] / [`GroupingValueSource`]: the narrow collaborator
//!   traits behind which transport, auth, and retry live
//!
//! Value types (index ranges, filters, sort orders, the row cache) come
//! from `horizon-catalog-core` and are re-exported here.
//!
//! # Example
//!
//! ```ignore
//! use horizon_catalog::prelude::*;
//! use std::sync::Arc;
//!
//! let query = FileQuery::new(
//!     source,
//!     vec![Filter::equals("Cell Line", "AICS-0".into())],
//!     vec![SortOrder::ascending("File Name")],
//! );
//!
//! // Select the first fifty rows, then walk the focus down one.
//! let selection = FileSelection::new()
//!     .select(&query, IndexRange::new(0, 49), 0)
//!     .focus(FocusDirection::Next);
//!
//! // Resolve the selection in bounded batches before a bulk operation.
//! let records = selection.hydrate(100).await?;
//! ```
//!
//! # Logging
//!
//! This crate instruments itself with the `tracing` crate; install a
//! subscriber (e.g. `tracing_subscriber::fmt::init()`) to see fetch and
//! traversal diagnostics. See [`targets`] for filterable target names.

pub use horizon_catalog_core::{
    Filter, FilterMode, IndexRange, RangeError, RowCache, SortDirection, SortOrder,
};

mod error;
mod grouping;
mod query;
mod record;
mod selection;
mod source;

pub mod prelude;

pub use error::{CatalogError, Cancelled, FetchError, Result, SelectionError, SourceError};
pub use grouping::{GroupNode, GroupTraversal, NodeChildren, TraversalToken};
pub use query::{DEFAULT_ROW_CACHE_CAPACITY, FileQuery};
pub use record::FileRecord;
pub use selection::{FileSelection, FocusDirection, FocusedItem, SelectionItem};
pub use source::{GroupingValueSource, RecordSource};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Query handle fetch and count traffic.
    pub const QUERY: &str = "horizon_catalog::query";
    /// Grouping tree construction and pruning.
    pub const GROUPING: &str = "horizon_catalog::grouping";
}
