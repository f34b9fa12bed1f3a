//! Immutable selection ledger across query handles.
//!
//! [`FileSelection`] tracks which rows are selected as unions of index
//! ranges across arbitrarily many [`FileQuery`] handles, plus the single
//! focused row used for detail display. Values are copy-on-write: every
//! mutation returns a new selection and never touches the receiver, so a
//! selection held by an in-flight operation stays valid no matter what
//! the UI does next.
//!
//! Indices are always relative to the current sort order of their query.
//! A changed sort order produces a different canonical key and therefore
//! a different handle, which deliberately invalidates index-based
//! selections made under the old order.
//!
//! # Example
//!
//! ```ignore
//! use horizon_catalog::{FileSelection, FocusDirection};
//! use horizon_catalog_core::IndexRange;
//!
//! let selection = FileSelection::new()
//!     .select(&folder_a, IndexRange::new(0, 9), 0)
//!     .select(&folder_b, 4u64, 1);
//!
//! assert_eq!(selection.count(), 11);
//! // Focus follows the most recent selection and can walk the global
//! // order, hopping across query boundaries.
//! let selection = selection.focus(FocusDirection::Previous);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future;

use horizon_catalog_core::{Filter, IndexRange};

use crate::error::{FetchError, SelectionError};
use crate::query::FileQuery;
use crate::record::FileRecord;

/// Directional focus movement through the selection's global row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    /// The globally first selected row.
    First,
    /// One row back; clamps at the first row.
    Previous,
    /// One row forward; clamps at the last row.
    Next,
    /// The globally last selected row.
    Last,
}

/// One contiguous selected range within one query handle.
///
/// `sort_order` is an externally supplied ordinal (typically the position
/// of the backing folder in the tree) used only to order items belonging
/// to different handles relative to one another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    query: FileQuery,
    range: IndexRange,
    sort_order: u32,
}

impl SelectionItem {
    /// The query handle the rows belong to.
    pub fn query(&self) -> &FileQuery {
        &self.query
    }

    /// The selected index range within the handle.
    pub fn range(&self) -> IndexRange {
        self.range
    }

    /// The inter-handle ordering ordinal.
    pub fn sort_order(&self) -> u32 {
        self.sort_order
    }
}

/// The single row designated for detail display.
///
/// Derived state: a focused item always lies inside some selection item,
/// and both of its positional indices are recomputed whenever the
/// selection changes shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedItem {
    query: FileQuery,
    index_within_query: u64,
    index_across_selection: u64,
}

impl FocusedItem {
    /// The query handle containing the focused row.
    pub fn query(&self) -> &FileQuery {
        &self.query
    }

    /// The focused row's index within its query handle.
    pub fn index_within_query(&self) -> u64 {
        self.index_within_query
    }

    /// The focused row's position in the selection's global row order.
    pub fn index_across_selection(&self) -> u64 {
        self.index_across_selection
    }
}

/// An immutable ledger of selected row ranges across query handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    /// Sorted: items from different handles order by `sort_order`, items
    /// from the same handle by `range.min`.
    items: Vec<SelectionItem>,
    focused: Option<FocusedItem>,
}

impl FileSelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The total number of selected rows.
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| item.range.len()).sum()
    }

    /// The number of selected rows within one query handle.
    pub fn count_for(&self, query: &FileQuery) -> u64 {
        self.items
            .iter()
            .filter(|item| item.query == *query)
            .map(|item| item.range.len())
            .sum()
    }

    /// The number of selected rows across every handle whose filter set
    /// is a superset of `filters`, i.e. everything nested under that scope.
    pub fn count_matching(&self, filters: &[Filter]) -> u64 {
        self.items
            .iter()
            .filter(|item| item.query.matches(filters))
            .map(|item| item.range.len())
            .sum()
    }

    /// Returns true if the given row of the given handle is selected.
    pub fn is_selected(&self, query: &FileQuery, index: u64) -> bool {
        self.items
            .iter()
            .any(|item| item.query == *query && item.range.contains(index))
    }

    /// Returns true if the given row of the given handle is focused.
    pub fn is_focused(&self, query: &FileQuery, index: u64) -> bool {
        self.focused
            .as_ref()
            .is_some_and(|f| f.query == *query && f.index_within_query == index)
    }

    /// Returns true if the focused row lives anywhere beneath the given
    /// filter scope.
    ///
    /// Matches by [`FileQuery::matches`] rather than handle equality; this
    /// is what lets a collapsed ancestor folder indicate that something
    /// below it holds the focus.
    pub fn is_focused_within(&self, filters: &[Filter]) -> bool {
        self.focused
            .as_ref()
            .is_some_and(|f| f.query.matches(filters))
    }

    /// The focused item, if any rows are selected.
    pub fn focused(&self) -> Option<&FocusedItem> {
        self.focused.as_ref()
    }

    /// The selection items in global order.
    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    /// Returns, per handle, the minimal disjoint set of ranges covering
    /// that handle's selected rows.
    ///
    /// This is the form for server-side selection payloads: no two
    /// returned ranges for a handle intersect or abut.
    pub fn group_by_query(&self) -> HashMap<FileQuery, Vec<IndexRange>> {
        let mut grouped: HashMap<FileQuery, Vec<IndexRange>> = HashMap::new();
        for item in &self.items {
            grouped
                .entry(item.query.clone())
                .or_default()
                .push(item.range);
        }
        grouped
            .into_iter()
            .map(|(query, ranges)| (query, IndexRange::compact(ranges)))
            .collect()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selects a range of rows within a query handle, focusing the last
    /// row of the new range.
    ///
    /// Returns a new selection; the receiver is unchanged. Existing items
    /// for the same handle are trimmed against the new range so no two
    /// items ever overlap and no row is counted twice. The most recent
    /// `sort_order` wins for every item of the handle.
    pub fn select(
        &self,
        query: &FileQuery,
        range: impl Into<IndexRange>,
        sort_order: u32,
    ) -> Self {
        let range = range.into();
        let items = self.items_with(query, range, sort_order);
        let focused = Self::locate(&items, query, range.max());
        Self { items, focused }
    }

    /// Selects a range of rows, focusing an explicit row instead of the
    /// range's last row.
    ///
    /// Fails if `index_to_focus` is not selected once the new range is
    /// applied.
    pub fn select_focusing(
        &self,
        query: &FileQuery,
        range: impl Into<IndexRange>,
        sort_order: u32,
        index_to_focus: u64,
    ) -> Result<Self, SelectionError> {
        let range = range.into();
        let items = self.items_with(query, range, sort_order);
        let focused =
            Self::locate(&items, query, index_to_focus).ok_or(SelectionError::NotSelected {
                key: query.canonical_key().to_string(),
                index: index_to_focus,
            })?;
        Ok(Self {
            items,
            focused: Some(focused),
        })
    }

    /// Deselects a range of rows within a query handle.
    ///
    /// The range must lie wholly within one existing selection item; the
    /// item is shrunk or split (into at most two items) around it. If no
    /// item contains the range, the call is a silent no-op and returns an
    /// equivalent copy. Focus is recomputed per the rules in the module
    /// docs.
    pub fn deselect(&self, query: &FileQuery, range: impl Into<IndexRange>) -> Self {
        let range = range.into();
        let Some(position) = self
            .items
            .iter()
            .position(|item| item.query == *query && item.range.contains_range(&range))
        else {
            return self.clone();
        };

        let removed = self.items[position].clone();
        let mut items = self.items.clone();
        items.remove(position);
        if removed.range.min() < range.min() {
            items.push(SelectionItem {
                query: removed.query.clone(),
                range: IndexRange::new(removed.range.min(), range.min() - 1),
                sort_order: removed.sort_order,
            });
        }
        if removed.range.max() > range.max() {
            items.push(SelectionItem {
                query: removed.query.clone(),
                range: IndexRange::new(range.max() + 1, removed.range.max()),
                sort_order: removed.sort_order,
            });
        }
        Self::sort_items(&mut items);

        let focused = match &self.focused {
            None => None,
            Some(f) if !(f.query == *query && range.contains(f.index_within_query)) => {
                // The focused row survived; only its global position can
                // have shifted.
                Self::locate(&items, &f.query, f.index_within_query)
            }
            Some(_) => {
                // The focused row was deselected. Rows preceding the
                // removed range keep their global indices, so the removed
                // range's old global start addresses its predecessor.
                self.global_index_of(query, range.min())
                    .and_then(|start| Self::locate_by_global(&items, start.saturating_sub(1)))
            }
        };

        Self { items, focused }
    }

    /// Returns an empty selection.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Moves focus through the global row order, hopping across query
    /// handle boundaries as needed.
    ///
    /// `Previous` at the first row and `Next` at the last row clamp in
    /// place; every direction is a no-op on an empty selection.
    pub fn focus(&self, direction: FocusDirection) -> Self {
        if self.items.is_empty() {
            return self.clone();
        }
        let count = self.count();
        let target = match direction {
            FocusDirection::First => 0,
            FocusDirection::Last => count - 1,
            FocusDirection::Previous => self
                .focused
                .as_ref()
                .map_or(0, |f| f.index_across_selection.saturating_sub(1)),
            FocusDirection::Next => self
                .focused
                .as_ref()
                .map_or(0, |f| (f.index_across_selection + 1).min(count - 1)),
        };
        Self {
            items: self.items.clone(),
            focused: Self::locate_by_global(&self.items, target),
        }
    }

    /// Focuses the row at a global index across the whole selection.
    ///
    /// Fails if `index` is outside `[0, count())`.
    pub fn focus_by_index(&self, index: u64) -> Result<Self, SelectionError> {
        let count = self.count();
        if index >= count {
            return Err(SelectionError::IndexOutOfBounds { index, count });
        }
        Ok(Self {
            items: self.items.clone(),
            focused: Self::locate_by_global(&self.items, index),
        })
    }

    /// Focuses a specific row of a specific query handle.
    ///
    /// Fails if that row is not currently selected.
    pub fn focus_by_query(&self, query: &FileQuery, index: u64) -> Result<Self, SelectionError> {
        let focused =
            Self::locate(&self.items, query, index).ok_or(SelectionError::NotSelected {
                key: query.canonical_key().to_string(),
                index,
            })?;
        Ok(Self {
            items: self.items.clone(),
            focused: Some(focused),
        })
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Fetches every selected row, in global order, batching each item's
    /// range into bounded windows and awaiting all of them.
    ///
    /// Bulk consumers (download, aggregate stats) call this so they never
    /// observe a partially populated selection.
    pub async fn hydrate(&self, batch_size: u64) -> Result<Vec<Arc<FileRecord>>, FetchError> {
        let fetches = self
            .items
            .iter()
            .map(|item| item.query.fetch_range_batched(item.range, batch_size));
        let batches = future::try_join_all(fetches).await?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Fetches the focused row's record for detail display.
    ///
    /// Serves from the handle's cache when possible; fetches the single
    /// row otherwise. Returns `None` when nothing is focused.
    pub async fn focused_file(&self) -> Result<Option<Arc<FileRecord>>, FetchError> {
        let Some(f) = &self.focused else {
            return Ok(None);
        };
        if let Some(record) = f.query.file_by_index(f.index_within_query) {
            return Ok(Some(record));
        }
        let fetched = f
            .query
            .fetch_range(f.index_within_query, f.index_within_query + 1)
            .await?;
        Ok(fetched.into_iter().next())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Builds the item list that results from selecting `range` in
    /// `query`: same-handle items wholly inside the new range drop out,
    /// partially overlapping ones are trimmed, and the new item is
    /// appended before re-sorting.
    fn items_with(&self, query: &FileQuery, range: IndexRange, sort_order: u32) -> Vec<SelectionItem> {
        let mut items: Vec<SelectionItem> = Vec::with_capacity(self.items.len() + 1);
        for item in &self.items {
            if item.query != *query {
                items.push(item.clone());
                continue;
            }
            let mut item = item.clone();
            item.sort_order = sort_order;
            if range.contains_range(&item.range) {
                continue;
            }
            if !range.intersects(&item.range) {
                items.push(item);
                continue;
            }
            if item.range.min() < range.min() {
                items.push(SelectionItem {
                    query: item.query.clone(),
                    range: IndexRange::new(item.range.min(), range.min() - 1),
                    sort_order,
                });
            }
            if item.range.max() > range.max() {
                items.push(SelectionItem {
                    query: item.query.clone(),
                    range: IndexRange::new(range.max() + 1, item.range.max()),
                    sort_order,
                });
            }
        }
        items.push(SelectionItem {
            query: query.clone(),
            range,
            sort_order,
        });
        Self::sort_items(&mut items);
        items
    }

    fn sort_items(items: &mut [SelectionItem]) {
        items.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.query.canonical_key().cmp(b.query.canonical_key()))
                .then_with(|| a.range.min().cmp(&b.range.min()))
        });
    }

    /// Finds the focused-item view of `(query, index)`, if selected.
    fn locate(items: &[SelectionItem], query: &FileQuery, index: u64) -> Option<FocusedItem> {
        let mut offset = 0u64;
        for item in items {
            if item.query == *query && item.range.contains(index) {
                return Some(FocusedItem {
                    query: item.query.clone(),
                    index_within_query: index,
                    index_across_selection: offset + (index - item.range.min()),
                });
            }
            offset += item.range.len();
        }
        None
    }

    /// Finds the row at a global index across all items.
    fn locate_by_global(items: &[SelectionItem], global: u64) -> Option<FocusedItem> {
        let mut offset = 0u64;
        for item in items {
            let len = item.range.len();
            if global < offset + len {
                return Some(FocusedItem {
                    query: item.query.clone(),
                    index_within_query: item.range.min() + (global - offset),
                    index_across_selection: global,
                });
            }
            offset += len;
        }
        None
    }

    /// The global index `(query, index)` occupies in this selection.
    fn global_index_of(&self, query: &FileQuery, index: u64) -> Option<u64> {
        Self::locate(&self.items, query, index).map(|f| f.index_across_selection)
    }
}
