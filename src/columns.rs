//! Sparse mod-2 columns stored as packed, strictly ascending row indices.

use itertools::{merge_join_by, EitherOrBoth};

/// A sparse column over GF(2): the set of row indices holding a 1.
///
/// Rows are kept strictly ascending, so the pivot (the largest row index)
/// sits at the back where it can be read, popped and reinstated in O(1), and
/// addition is a single merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedColumn {
    rows: Vec<usize>,
}

impl SortedColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a column from a collection of row indices. The input is
    /// treated as a set: duplicates collapse to a single entry.
    pub fn from_rows(mut rows: Vec<usize>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ascending iterator over the rows holding a 1.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().copied()
    }

    /// The pivot, or `None` for an empty column.
    pub fn low(&self) -> Option<usize> {
        self.rows.last().copied()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.binary_search(&row).is_ok()
    }

    /// Idempotently inserts `row`.
    pub fn insert(&mut self, row: usize) {
        if let Err(pos) = self.rows.binary_search(&row) {
            self.rows.insert(pos, row);
        }
    }

    /// Removes `row` if present; a no-op otherwise.
    pub fn remove(&mut self, row: usize) {
        if let Ok(pos) = self.rows.binary_search(&row) {
            self.rows.remove(pos);
        }
    }

    /// Pops the pivot off the column.
    pub fn pop_low(&mut self) -> Option<usize> {
        self.rows.pop()
    }

    /// Reinstates a pivot previously taken with [`pop_low`](Self::pop_low).
    /// `row` must exceed every remaining entry.
    pub fn push_low(&mut self, row: usize) {
        debug_assert!(self.rows.last().map_or(true, |&r| r < row));
        self.rows.push(row);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// In-place symmetric difference with `other`: one merge pass in which
    /// rows present in both columns cancel.
    pub fn add(&mut self, other: &SortedColumn) {
        self.add_rows(&other.rows);
    }

    /// As [`add`](Self::add), but skips `other`'s pivot. Valid only when
    /// this column's pivot has just been popped and equalled `other`'s
    /// pivot, so the pair would have cancelled anyway.
    pub fn add_skipping_low(&mut self, other: &SortedColumn) {
        debug_assert!(!other.rows.is_empty());
        let keep = other.rows.len() - 1;
        self.add_rows(&other.rows[..keep]);
    }

    fn add_rows(&mut self, other: &[usize]) {
        let lhs = std::mem::take(&mut self.rows);
        self.rows = merge_join_by(lhs, other.iter().copied(), Ord::cmp)
            .filter_map(|pair| match pair {
                EitherOrBoth::Left(row) | EitherOrBoth::Right(row) => Some(row),
                EitherOrBoth::Both(_, _) => None,
            })
            .collect();
    }
}
