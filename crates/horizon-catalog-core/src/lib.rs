//! Core value types for Horizon Catalog.
//!
//! This crate provides the synchronous foundations of the Horizon Catalog
//! browsing model:
//!
//! - **Index Ranges**: Inclusive integer intervals with set-like algebra
//!   (union, intersection, adjacency, compaction, splitting)
//! - **Filters**: Named annotation filters with four matching modes and
//!   stable canonical tokens
//! - **Sort Orders**: Column/direction pairs with canonical tokens
//! - **Row Cache**: A bounded least-recently-used cache for fetched rows
//!
//! Everything here is pure and in-memory: no I/O, no async, no locking.
//! The async query and selection layers live in the `horizon-catalog`
//! crate and build on these types.
//!
//! # Range Algebra Example
//!
//! ```
//! use horizon_catalog_core::IndexRange;
//!
//! let selected = vec![
//!     IndexRange::new(0, 4),
//!     IndexRange::new(5, 9),   // abuts the first
//!     IndexRange::new(20, 30),
//! ];
//!
//! // Compaction produces the minimal disjoint cover, which is the form
//! // sent to the server for bulk operations.
//! let minimal = IndexRange::compact(selected);
//! assert_eq!(minimal, vec![IndexRange::new(0, 9), IndexRange::new(20, 30)]);
//! ```
//!
//! # Canonical Token Example
//!
//! ```
//! use horizon_catalog_core::{Filter, SortOrder};
//!
//! // Filters and sorts serialize to stable tokens; queries built from the
//! // same logical filter set compare equal regardless of insertion order.
//! let filter = Filter::equals("Cell Line", "AICS-0".into());
//! let sort = SortOrder::descending("Uploaded");
//! assert_eq!(filter.canonical_token(), "Cell Line=\"AICS-0\"");
//! assert_eq!(sort.canonical_token(), "Uploaded:desc");
//! ```

mod cache;
mod error;
mod filter;
mod range;
mod sort;

pub use cache::RowCache;
pub use error::{RangeError, Result};
pub use filter::{Filter, FilterMode};
pub use range::IndexRange;
pub use sort::{SortDirection, SortOrder};
