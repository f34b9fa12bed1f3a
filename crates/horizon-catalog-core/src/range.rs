//! Inclusive integer index ranges with set-like algebra.
//!
//! [`IndexRange`] represents a contiguous, non-empty run of row indices.
//! Selections over very large result sets are stored as unions of these
//! ranges rather than as individual indices, so the algebra here (union,
//! intersection, adjacency, compaction, splitting) is what keeps those
//! unions minimal.
//!
//! # Example
//!
//! ```
//! use horizon_catalog_core::IndexRange;
//!
//! let a = IndexRange::new(0, 4);
//! let b = IndexRange::new(5, 9);
//!
//! // Touching end-to-end counts as adjacent, so compaction merges them.
//! assert!(a.abuts(&b));
//! assert_eq!(IndexRange::compact(vec![a, b]), vec![IndexRange::new(0, 9)]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// An immutable, inclusive range of row indices.
///
/// A range always covers at least one index: a single index is the range
/// `[i, i]`. Every operation returns a new value; nothing mutates in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    min: u64,
    max: u64,
}

impl IndexRange {
    /// Creates a range spanning both endpoints, inclusive.
    ///
    /// The endpoints may be given in either order; the smaller becomes
    /// `min` and the larger `max`.
    pub fn new(a: u64, b: u64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a range covering exactly one index.
    pub fn single(index: u64) -> Self {
        Self {
            min: index,
            max: index,
        }
    }

    /// The smallest index in the range.
    pub fn min(&self) -> u64 {
        self.min
    }

    /// The largest index in the range.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// The number of indices covered, inclusive of both endpoints.
    pub fn len(&self) -> u64 {
        self.max - self.min + 1
    }

    /// Returns true if the range covers exactly one index.
    pub fn is_single(&self) -> bool {
        self.min == self.max
    }

    /// Returns true if `index` lies within the range.
    pub fn contains(&self, index: u64) -> bool {
        index >= self.min && index <= self.max
    }

    /// Returns true if every index of `other` lies within this range.
    pub fn contains_range(&self, other: &Self) -> bool {
        other.min >= self.min && other.max <= self.max
    }

    /// Returns true if the two ranges share at least one index.
    ///
    /// Touching at a single shared index counts as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Returns true if the ranges are disjoint but separated by exactly
    /// zero indices, e.g. `[0, 4]` and `[5, 9]`.
    pub fn abuts(&self, other: &Self) -> bool {
        self.max.checked_add(1) == Some(other.min) || other.max.checked_add(1) == Some(self.min)
    }

    /// Returns the envelope `[min(both), max(both)]`.
    ///
    /// Callers are expected to union only ranges that intersect or abut;
    /// unioning disjoint ranges silently covers the gap between them.
    /// Gap-aware merging belongs to [`IndexRange::compact`].
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Collapses a set of ranges into the minimal set of disjoint,
    /// non-abutting ranges covering the same indices.
    ///
    /// Duplicate, overlapping, and adjacent ranges are merged. The result
    /// is sorted by `min`; callers that need a different order sort it
    /// themselves.
    pub fn compact(mut ranges: Vec<Self>) -> Vec<Self> {
        if ranges.len() < 2 {
            return ranges;
        }

        ranges.sort_unstable_by_key(|r| (r.min, r.max));

        let mut compacted: Vec<Self> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match compacted.last_mut() {
                Some(last) if last.intersects(&range) || last.abuts(&range) => {
                    *last = last.union(&range);
                }
                _ => compacted.push(range),
            }
        }
        compacted
    }

    /// Removes `index` from the range, returning the one or two sub-ranges
    /// that remain.
    ///
    /// Partitioning at an exact boundary shrinks the range by one index;
    /// partitioning in the interior splits it in two. Fails if `index` is
    /// outside the range, or if the range is a single index (nothing would
    /// remain on either side).
    pub fn partition_at(&self, index: u64) -> Result<Vec<Self>, RangeError> {
        if !self.contains(index) {
            return Err(RangeError::OutsideRange {
                index,
                min: self.min,
                max: self.max,
            });
        }
        if self.is_single() {
            return Err(RangeError::SingleIndexPartition { index });
        }

        if index == self.min {
            return Ok(vec![Self::new(self.min + 1, self.max)]);
        }
        if index == self.max {
            return Ok(vec![Self::new(self.min, self.max - 1)]);
        }
        Ok(vec![
            Self::new(self.min, index - 1),
            Self::new(index + 1, self.max),
        ])
    }
}

impl From<u64> for IndexRange {
    fn from(index: u64) -> Self {
        Self::single(index)
    }
}

impl std::fmt::Display for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single() {
            write!(f, "[{}]", self.min)
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_normalize() {
        let range = IndexRange::new(9, 3);
        assert_eq!(range.min(), 3);
        assert_eq!(range.max(), 9);
        assert_eq!(range.len(), 7);
    }

    #[test]
    fn test_single_index_range() {
        let range = IndexRange::single(5);
        assert!(range.is_single());
        assert_eq!(range.len(), 1);
        assert!(range.contains(5));
        assert!(!range.contains(4));
    }

    #[test]
    fn test_contains_range() {
        let outer = IndexRange::new(0, 10);
        assert!(outer.contains_range(&IndexRange::new(3, 7)));
        assert!(outer.contains_range(&outer));
        assert!(!outer.contains_range(&IndexRange::new(8, 11)));
    }

    #[test]
    fn test_intersects_at_shared_endpoint() {
        let a = IndexRange::new(0, 5);
        let b = IndexRange::new(5, 9);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_disjoint_ranges_do_not_intersect() {
        let a = IndexRange::new(0, 3);
        let b = IndexRange::new(5, 9);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_abuts() {
        let a = IndexRange::new(0, 4);
        let b = IndexRange::new(5, 9);
        assert!(a.abuts(&b));
        assert!(b.abuts(&a));

        // Overlapping ranges touch but do not abut.
        assert!(!a.abuts(&IndexRange::new(4, 9)));
        // A one-index gap is not adjacency.
        assert!(!a.abuts(&IndexRange::new(6, 9)));
    }

    #[test]
    fn test_abuts_at_u64_max() {
        let a = IndexRange::new(u64::MAX - 1, u64::MAX);
        let b = IndexRange::new(0, 3);
        assert!(!a.abuts(&b));
    }

    #[test]
    fn test_union_contains_both_operands() {
        let a = IndexRange::new(2, 6);
        let b = IndexRange::new(4, 11);
        let merged = a.union(&b);
        assert!(merged.contains_range(&a));
        assert!(merged.contains_range(&b));
        assert_eq!(merged, IndexRange::new(2, 11));
    }

    #[test]
    fn test_compact_deduplicates() {
        let a = IndexRange::new(3, 8);
        assert_eq!(IndexRange::compact(vec![a, a]), vec![a]);
    }

    #[test]
    fn test_compact_merges_overlap_and_adjacency() {
        let merged = IndexRange::compact(vec![
            IndexRange::new(6, 9),
            IndexRange::new(0, 4),
            IndexRange::new(3, 5),
        ]);
        assert_eq!(merged, vec![IndexRange::new(0, 9)]);
    }

    #[test]
    fn test_compact_preserves_disjoint_ranges_in_any_input_order() {
        let a = IndexRange::new(0, 2);
        let b = IndexRange::new(4, 6);
        let c = IndexRange::new(8, 10);
        for input in [vec![c, a, b], vec![b, c, a], vec![a, b, c]] {
            let compacted = IndexRange::compact(input);
            assert_eq!(compacted, vec![a, b, c]);
        }
    }

    #[test]
    fn test_partition_at_interior_splits() {
        let range = IndexRange::new(0, 10);
        let parts = range.partition_at(4).unwrap();
        assert_eq!(parts, vec![IndexRange::new(0, 3), IndexRange::new(5, 10)]);
    }

    #[test]
    fn test_partition_at_boundary_shrinks() {
        let range = IndexRange::new(0, 10);
        assert_eq!(range.partition_at(0).unwrap(), vec![IndexRange::new(1, 10)]);
        assert_eq!(range.partition_at(10).unwrap(), vec![IndexRange::new(0, 9)]);
    }

    #[test]
    fn test_partition_at_outside_point_fails() {
        let range = IndexRange::new(2, 5);
        assert!(matches!(
            range.partition_at(9),
            Err(RangeError::OutsideRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_partition_single_index_range_fails() {
        let range = IndexRange::single(7);
        assert!(matches!(
            range.partition_at(7),
            Err(RangeError::SingleIndexPartition { index: 7 })
        ));
    }
}
