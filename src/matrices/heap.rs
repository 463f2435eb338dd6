//! The lazy-heap column backend.
//!
//! Columns are max-heaps of row indices in which duplicates are permitted
//! and cancel in pairs on extraction: a pair of equal entries is 1 + 1 = 0.
//! Addition is therefore a plain sequence of heap pushes; a column is pruned
//! back to one entry per surviving row once the number of inserts since the
//! last prune exceeds half its length. The permuted variant keeps stored
//! indices in the original coordinate system and routes every comparison
//! through the current row permutation, which is why the sift helpers take a
//! key function instead of relying on `std::collections::BinaryHeap`.

use std::cell::RefCell;

use itertools::{merge_join_by, EitherOrBoth};

use crate::matrices::{check_col, check_row, pair_mut, LazyColumns, Mod2Matrix, RowSwaps};
use crate::MatrixError;

thread_local! {
    // reusable drain buffer for pruning; thread-scoped, never process-global
    static SCRATCH: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

fn natural_order(row: usize) -> usize {
    row
}

fn sift_up<K: Fn(usize) -> usize>(col: &mut [usize], mut pos: usize, key: &K) {
    while pos > 0 {
        let parent = (pos - 1) / 2;
        if key(col[parent]) >= key(col[pos]) {
            break;
        }
        col.swap(parent, pos);
        pos = parent;
    }
}

fn sift_down<K: Fn(usize) -> usize>(col: &mut [usize], mut pos: usize, key: &K) {
    let len = col.len();
    loop {
        let left = 2 * pos + 1;
        if left >= len {
            break;
        }
        let mut largest = if key(col[left]) > key(col[pos]) { left } else { pos };
        let right = left + 1;
        if right < len && key(col[right]) > key(col[largest]) {
            largest = right;
        }
        if largest == pos {
            break;
        }
        col.swap(pos, largest);
        pos = largest;
    }
}

fn heapify<K: Fn(usize) -> usize>(col: &mut [usize], key: &K) {
    for pos in (0..col.len() / 2).rev() {
        sift_down(col, pos, key);
    }
}

fn heap_push<K: Fn(usize) -> usize>(col: &mut Vec<usize>, row: usize, key: &K) {
    col.push(row);
    let last = col.len() - 1;
    sift_up(col, last, key);
}

fn heap_pop<K: Fn(usize) -> usize>(col: &mut Vec<usize>, key: &K) -> Option<usize> {
    if col.is_empty() {
        return None;
    }
    let last = col.len() - 1;
    col.swap(0, last);
    let top = col.pop();
    if !col.is_empty() {
        sift_down(col, 0, key);
    }
    top
}

/// Pops the maximum of `col`, cancelling duplicate pairs on the way: the
/// returned value is the largest row with odd multiplicity, or `None`.
fn pop_pivot<K: Fn(usize) -> usize>(col: &mut Vec<usize>, key: &K) -> Option<usize> {
    let mut max = heap_pop(col, key)?;
    loop {
        match col.first().copied() {
            Some(front) if front == max => {
                // the pair cancels; the next entry becomes the candidate
                heap_pop(col, key);
                max = heap_pop(col, key)?;
            }
            _ => return Some(max),
        }
    }
}

/// Drains `col` through [`pop_pivot`] and rebuilds it with one entry per
/// surviving row, then restores the heap property under `key`. The explicit
/// re-heapify is required: the drain order is only trustworthy when the
/// column was a valid heap to begin with, and after a row transposition it
/// may not be.
fn prune_col<K: Fn(usize) -> usize>(col: &mut Vec<usize>, key: &K) {
    SCRATCH.with(|scratch| {
        let mut buf = scratch.borrow_mut();
        buf.clear();
        while let Some(row) = pop_pivot(col, key) {
            buf.push(row);
        }
        col.extend_from_slice(&buf);
        heapify(col, key);
    });
}

fn symmetric_difference_sorted(target: &mut Vec<usize>, source: &[usize]) {
    let lhs = std::mem::take(target);
    *target = merge_join_by(lhs, source.iter().copied(), Ord::cmp)
        .filter_map(|pair| match pair {
            EitherOrBoth::Left(row) | EitherOrBoth::Right(row) => Some(row),
            EitherOrBoth::Both(_, _) => None,
        })
        .collect();
}

/// Shared column storage of the heap backends: the columns themselves plus
/// the per-column insert counters driving the prune heuristic.
#[derive(Debug, Clone, Default)]
struct HeapColumns {
    columns: Vec<Vec<usize>>,
    inserts_since_last_prune: Vec<usize>,
}

impl HeapColumns {
    fn with_cols(cols: usize) -> Self {
        Self {
            columns: vec![Vec::new(); cols],
            inserts_since_last_prune: vec![0; cols],
        }
    }

    fn width(&self) -> usize {
        self.columns.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.columns.reserve(additional);
        self.inserts_since_last_prune.reserve(additional);
    }

    fn front(&self, idx: usize) -> Option<usize> {
        self.columns[idx].first().copied()
    }

    fn entry_parity(&self, idx: usize, raw: usize) -> bool {
        self.columns[idx].iter().filter(|&&row| row == raw).count() % 2 == 1
    }

    fn push_entry<K: Fn(usize) -> usize>(&mut self, idx: usize, raw: usize, key: &K) {
        heap_push(&mut self.columns[idx], raw, key);
    }

    fn remove_all<K: Fn(usize) -> usize>(&mut self, idx: usize, raw: usize, key: &K) {
        let col = &mut self.columns[idx];
        let before = col.len();
        col.retain(|&row| row != raw);
        if col.len() != before {
            heapify(col, key);
        }
    }

    fn pop_pivot_at<K: Fn(usize) -> usize>(&mut self, idx: usize, key: &K) -> Option<usize> {
        pop_pivot(&mut self.columns[idx], key)
    }

    fn peek_pivot_at<K: Fn(usize) -> usize>(&mut self, idx: usize, key: &K) -> Option<usize> {
        let pivot = pop_pivot(&mut self.columns[idx], key);
        if let Some(row) = pivot {
            heap_push(&mut self.columns[idx], row, key);
        }
        pivot
    }

    fn prune<K: Fn(usize) -> usize>(&mut self, idx: usize, key: &K) {
        prune_col(&mut self.columns[idx], key);
        self.inserts_since_last_prune[idx] = 0;
    }

    /// Heap-pushes the entries of column `src` (minus its first `skip`
    /// entries) onto column `tgt`, then prunes `tgt` if insertions have
    /// outgrown half its length.
    fn add_to<K: Fn(usize) -> usize>(&mut self, src: usize, tgt: usize, skip: usize, key: &K) {
        let (src_col, tgt_col) = pair_mut(&mut self.columns, src, tgt);
        let inserted = src_col.len().saturating_sub(skip);
        for &row in src_col.iter().skip(skip) {
            heap_push(tgt_col, row, key);
        }
        self.inserts_since_last_prune[tgt] += inserted;
        if 2 * self.inserts_since_last_prune[tgt] > self.columns[tgt].len() {
            self.prune(tgt, key);
        }
    }

    fn add_from<K: Fn(usize) -> usize>(
        &mut self,
        other: &HeapColumns,
        src: usize,
        tgt: usize,
        skip: usize,
        key: &K,
    ) {
        let src_col = &other.columns[src];
        let tgt_col = &mut self.columns[tgt];
        let inserted = src_col.len().saturating_sub(skip);
        for &row in src_col.iter().skip(skip) {
            heap_push(tgt_col, row, key);
        }
        self.inserts_since_last_prune[tgt] += inserted;
        if 2 * self.inserts_since_last_prune[tgt] > self.columns[tgt].len() {
            self.prune(tgt, key);
        }
    }

    fn append_from(&mut self, other: &mut HeapColumns, src: usize) {
        self.columns.push(std::mem::take(&mut other.columns[src]));
        self.inserts_since_last_prune.push(0);
        other.inserts_since_last_prune[src] = 0;
    }

    fn move_from(&mut self, other: &mut HeapColumns, src: usize, tgt: usize) {
        self.columns[tgt] = std::mem::take(&mut other.columns[src]);
        self.inserts_since_last_prune[tgt] = 0;
        other.inserts_since_last_prune[src] = 0;
    }

    fn clear_col(&mut self, idx: usize) {
        self.columns[idx].clear();
        self.inserts_since_last_prune[idx] = 0;
    }

    fn swap_cols(&mut self, a: usize, b: usize) {
        self.columns.swap(a, b);
        self.inserts_since_last_prune.swap(a, b);
    }
}

/// Mod-2 matrix with lazy heap columns in the natural row order.
///
/// Preferred over [`ColumnMatrix`](crate::matrices::ColumnMatrix) for large,
/// dense-growth reductions where amortised pruning beats merge-based
/// addition.
#[derive(Debug, Clone, Default)]
pub struct HeapMatrix {
    cols: HeapColumns,
    num_rows: usize,
}

impl HeapMatrix {
    /// All-zero matrix of the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols: HeapColumns::with_cols(cols),
            num_rows: rows,
        }
    }

    /// Builds a matrix from one row-index set per column; every column
    /// comes out finalised.
    pub fn from_columns(rows: usize, cols: Vec<Vec<usize>>) -> Result<Self, MatrixError> {
        let mut mat = Self::new(rows, cols.len());
        for (j, col) in cols.into_iter().enumerate() {
            for &row in &col {
                check_row(row, rows)?;
            }
            let mut rows_j = col;
            rows_j.sort_unstable();
            rows_j.dedup();
            // descending is already a valid max-heap with the pivot in front
            rows_j.reverse();
            mat.cols.columns[j] = rows_j;
        }
        Ok(mat)
    }

    /// Clears every entry of column `col`.
    pub fn clear_column(&mut self, col: usize) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        self.cols.clear_col(col);
        Ok(())
    }

    /// Rewrites the stored row indices of `col` through `new_rows` and
    /// restores the heap property.
    pub fn reindex_column(&mut self, col: usize, new_rows: &[usize]) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        let column = &mut self.cols.columns[col];
        for row in column.iter_mut() {
            *row = new_rows[*row];
        }
        heapify(column, &natural_order);
        Ok(())
    }

    // ---- sorted-mode operations -------------------------------------
    //
    // Presentation minimisation works on sorted columns rather than lazy
    // heaps. `sort_col` leaves heap mode; the `_sorted` queries and the
    // sorted addition are only valid until the next heap-mode mutation.

    /// Sorts column `col` ascending.
    pub fn sort_col(&mut self, col: usize) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        self.cols.columns[col].sort_unstable();
        Ok(())
    }

    /// Symmetric difference of two sorted columns, written into `tgt`.
    pub fn add_column_sorted(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.cols.width())?;
        check_col(tgt, self.cols.width())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        let (src_col, tgt_col) = pair_mut(&mut self.cols.columns, src, tgt);
        symmetric_difference_sorted(tgt_col, src_col);
        Ok(())
    }

    /// Membership test on a sorted column.
    pub fn entry_sorted(&self, row: usize, col: usize) -> Result<bool, MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.cols.width())?;
        Ok(self.cols.columns[col].binary_search(&row).is_ok())
    }

    /// Pivot of a sorted column.
    pub fn low_sorted(&self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        Ok(self.cols.columns[col].last().copied())
    }
}

impl Mod2Matrix for HeapMatrix {
    fn height(&self) -> usize {
        self.num_rows
    }

    fn width(&self) -> usize {
        self.cols.width()
    }

    fn set(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.cols.width())?;
        if !self.cols.entry_parity(col, row) {
            self.cols.push_entry(col, row, &natural_order);
        }
        Ok(())
    }

    fn clear(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.cols.width())?;
        self.cols.remove_all(col, row, &natural_order);
        Ok(())
    }

    fn entry(&self, row: usize, col: usize) -> Result<bool, MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.cols.width())?;
        Ok(self.cols.entry_parity(col, row))
    }

    fn low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        Ok(self.cols.peek_pivot_at(col, &natural_order))
    }

    fn add_column(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.cols.width())?;
        check_col(tgt, self.cols.width())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        self.cols.add_to(src, tgt, 0, &natural_order);
        Ok(())
    }
}

impl LazyColumns for HeapMatrix {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols)
    }

    fn identity(size: usize) -> Self {
        let mut mat = Self::new(size, size);
        for (j, col) in mat.cols.columns.iter_mut().enumerate() {
            col.push(j);
        }
        mat
    }

    fn reserve_cols(&mut self, additional: usize) {
        self.cols.reserve(additional);
    }

    fn low_finalized(&self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        Ok(self.cols.front(col))
    }

    fn remove_low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        Ok(self.cols.pop_pivot_at(col, &natural_order))
    }

    fn push_low(&mut self, col: usize, row: usize) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        check_row(row, self.num_rows)?;
        self.cols.push_entry(col, row, &natural_order);
        Ok(())
    }

    fn add_column_from(
        &mut self,
        other: &Self,
        src: usize,
        tgt: usize,
    ) -> Result<(), MatrixError> {
        check_col(src, other.cols.width())?;
        check_col(tgt, self.cols.width())?;
        debug_assert!(other.num_rows <= self.num_rows);
        self.cols.add_from(&other.cols, src, tgt, 0, &natural_order);
        Ok(())
    }

    fn add_column_popped(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.cols.width())?;
        check_col(tgt, self.cols.width())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        // the source pivot sits at offset 0, so the addition starts at 1
        self.cols.add_to(src, tgt, 1, &natural_order);
        Ok(())
    }

    fn finalize(&mut self, col: usize) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        self.cols.prune(col, &natural_order);
        Ok(())
    }

    fn append_col_from(&mut self, other: &mut Self, src: usize) -> Result<(), MatrixError> {
        check_col(src, other.cols.width())?;
        self.cols.append_from(&mut other.cols, src);
        Ok(())
    }

    fn move_col(&mut self, other: &mut Self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, other.cols.width())?;
        check_col(tgt, self.cols.width())?;
        self.cols.move_from(&mut other.cols, src, tgt);
        Ok(())
    }
}

/// Heap-column matrix with implicitly permuted rows.
///
/// Stored indices stay in the original coordinate system; `perm` maps
/// original to current row positions and `mrep` is its inverse. Every
/// comparison goes through `perm`, every returned row index is translated
/// through `perm`, and every accepted row index through `mrep`, so a row
/// transposition is a pure permutation update that never touches a column.
#[derive(Debug, Clone)]
pub struct PermutedHeapMatrix {
    cols: HeapColumns,
    perm: Vec<usize>,
    mrep: Vec<usize>,
}

impl PermutedHeapMatrix {
    /// All-zero matrix with the identity row permutation.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols: HeapColumns::with_cols(cols),
            perm: (0..rows).collect(),
            mrep: (0..rows).collect(),
        }
    }

    /// Square identity matrix with the identity row permutation.
    pub fn identity(size: usize) -> Self {
        let mut mat = Self::new(size, size);
        for (j, col) in mat.cols.columns.iter_mut().enumerate() {
            col.push(j);
        }
        mat
    }

    /// Installs a whole row order at once: `row_order[i]` is the current
    /// position of original row `i`.
    pub fn set_perm(&mut self, row_order: &[usize]) {
        debug_assert_eq!(row_order.len(), self.perm.len());
        self.perm.copy_from_slice(row_order);
        for (current, &original) in row_order.iter().enumerate() {
            self.mrep[original] = current;
        }
    }

    /// The original-to-current row permutation.
    pub fn row_perm(&self) -> &[usize] {
        &self.perm
    }

    /// The current-to-original inverse permutation.
    pub fn row_perm_inverse(&self) -> &[usize] {
        &self.mrep
    }

    /// Installs column `col` from row indices remapped through `row_map`;
    /// rows mapped to `None` are dropped.
    pub fn set_col_permuted(
        &mut self,
        col: usize,
        rows: &[usize],
        row_map: &[Option<usize>],
    ) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |row: usize| perm[row];
        let column = &mut cols.columns[col];
        column.clear();
        column.reserve(rows.len());
        for &row in rows {
            if let Some(mapped) = row_map.get(row).copied().flatten() {
                column.push(mapped);
            }
        }
        heapify(column, &key);
        cols.inserts_since_last_prune[col] = 0;
        Ok(())
    }

    /// The pivot of `col`, assuming the column holds no duplicate entries.
    pub fn low_finalized(&self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        Ok(self.cols.front(col).map(|raw| self.perm[raw]))
    }

    /// Pops the pivot off `col` and returns its current position.
    pub fn remove_low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |row: usize| perm[row];
        Ok(cols.pop_pivot_at(col, &key).map(|raw| perm[raw]))
    }

    /// Reinstates a pivot previously taken with
    /// [`remove_low`](Self::remove_low); `row` is a current position.
    pub fn push_low(&mut self, col: usize, row: usize) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        check_row(row, self.perm.len())?;
        let raw = self.mrep[row];
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |r: usize| perm[r];
        cols.push_entry(col, raw, &key);
        Ok(())
    }

    /// Adds column `src` into column `tgt`, skipping `src`'s pivot; see
    /// [`LazyColumns::add_column_popped`](crate::matrices::LazyColumns::add_column_popped).
    pub fn add_column_popped(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.cols.width())?;
        check_col(tgt, self.cols.width())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |row: usize| perm[row];
        cols.add_to(src, tgt, 1, &key);
        Ok(())
    }

    /// Restores the canonical duplicate-free form of `col`.
    pub fn finalize(&mut self, col: usize) -> Result<(), MatrixError> {
        check_col(col, self.cols.width())?;
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |row: usize| perm[row];
        cols.prune(col, &key);
        Ok(())
    }
}

impl Mod2Matrix for PermutedHeapMatrix {
    fn height(&self) -> usize {
        self.perm.len()
    }

    fn width(&self) -> usize {
        self.cols.width()
    }

    fn set(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.perm.len())?;
        check_col(col, self.cols.width())?;
        let raw = self.mrep[row];
        if !self.cols.entry_parity(col, raw) {
            let (cols, perm) = (&mut self.cols, &self.perm);
            let key = |r: usize| perm[r];
            cols.push_entry(col, raw, &key);
        }
        Ok(())
    }

    fn clear(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.perm.len())?;
        check_col(col, self.cols.width())?;
        let raw = self.mrep[row];
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |r: usize| perm[r];
        cols.remove_all(col, raw, &key);
        Ok(())
    }

    fn entry(&self, row: usize, col: usize) -> Result<bool, MatrixError> {
        check_row(row, self.perm.len())?;
        check_col(col, self.cols.width())?;
        Ok(self.cols.entry_parity(col, self.mrep[row]))
    }

    fn low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.cols.width())?;
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |row: usize| perm[row];
        Ok(cols.peek_pivot_at(col, &key).map(|raw| perm[raw]))
    }

    fn add_column(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.cols.width())?;
        check_col(tgt, self.cols.width())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        let (cols, perm) = (&mut self.cols, &self.perm);
        let key = |row: usize| perm[row];
        cols.add_to(src, tgt, 0, &key);
        Ok(())
    }
}

impl RowSwaps for PermutedHeapMatrix {
    fn swap_rows(&mut self, i: usize) -> Result<(), MatrixError> {
        check_row(i + 1, self.perm.len())?;
        let a = self.mrep[i];
        let b = self.mrep[i + 1];
        self.perm[a] = i + 1;
        self.perm[b] = i;
        self.mrep.swap(i, i + 1);
        Ok(())
    }

    fn swap_columns(&mut self, j: usize) -> Result<(), MatrixError> {
        check_col(j + 1, self.cols.width())?;
        self.cols.swap_cols(j, j + 1);
        Ok(())
    }

    fn find_low(&mut self, low: usize) -> Result<Option<usize>, MatrixError> {
        check_row(low, self.perm.len())?;
        for j in 0..self.cols.width() {
            if self.low(j)? == Some(low) {
                return Ok(Some(j));
            }
        }
        Ok(None)
    }
}
