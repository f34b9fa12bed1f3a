//! Prelude module for Horizon Catalog.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_catalog::prelude::*;
//! ```

// ============================================================================
// Value Types
// ============================================================================

pub use horizon_catalog_core::{Filter, FilterMode, IndexRange, SortDirection, SortOrder};

// ============================================================================
// Query and Selection Model
// ============================================================================

pub use crate::query::FileQuery;
pub use crate::record::FileRecord;
pub use crate::selection::{FileSelection, FocusDirection, FocusedItem, SelectionItem};

// ============================================================================
// Grouping Tree
// ============================================================================

pub use crate::grouping::{GroupNode, GroupTraversal, NodeChildren};

// ============================================================================
// Collaborators and Errors
// ============================================================================

pub use crate::error::{CatalogError, FetchError, SelectionError, SourceError};
pub use crate::source::{GroupingValueSource, RecordSource};
