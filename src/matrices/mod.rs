//! Column-major sparse matrices over GF(2).
//!
//! Two storage backends implement the shared capability traits: packed
//! sorted columns ([`ColumnMatrix`]) and lazy max-heap columns
//! ([`HeapMatrix`]). The permuted variants ([`PermutedMatrix`],
//! [`PermutedHeapMatrix`]) layer an implicit row permutation on top and
//! expose the vineyard transposition surface; [`RowPriorityMatrix`] is the
//! transposed representation used for the upper-triangular record of an
//! RU-decomposition.

pub mod heap;
pub mod list;
pub mod permuted;
#[cfg(test)]
mod tests;

pub use heap::{HeapMatrix, PermutedHeapMatrix};
pub use list::ColumnMatrix;
pub use permuted::{PermutedMatrix, RowPriorityMatrix};

use crate::MatrixError;

/// The core mod-2 column-matrix contract shared by every backend.
pub trait Mod2Matrix {
    fn height(&self) -> usize;

    fn width(&self) -> usize;

    /// Idempotently sets entry (row, col) to 1.
    fn set(&mut self, row: usize, col: usize) -> Result<(), MatrixError>;

    /// Sets entry (row, col) to 0; a no-op when it already is.
    fn clear(&mut self, row: usize, col: usize) -> Result<(), MatrixError>;

    fn entry(&self, row: usize, col: usize) -> Result<bool, MatrixError>;

    /// The pivot of `col`, i.e. its largest row index. Heap backends cancel
    /// duplicate pairs while peeking, hence `&mut self`.
    fn low(&mut self, col: usize) -> Result<Option<usize>, MatrixError>;

    fn column_is_empty(&mut self, col: usize) -> Result<bool, MatrixError> {
        Ok(self.low(col)?.is_none())
    }

    /// Adds column `src` into column `tgt` (symmetric difference); `src` is
    /// left unchanged.
    fn add_column(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError>;
}

/// The lazy-pivot extension used by the bigraded kernel reduction.
///
/// The `low_finalized` / `remove_low` / `push_low` / `add_column_popped`
/// family implements the deferred-pop optimisation: when a pivot is about to
/// be cancelled, it is popped up front, the source column is added minus its
/// own (equal) pivot, and the surviving pivot is read off the top without
/// restoring the column in between. `low_finalized` is only valid between
/// [`finalize`](Self::finalize) calls.
pub trait LazyColumns: Mod2Matrix + Sized {
    /// All-zero matrix of the given dimensions.
    fn zeros(rows: usize, cols: usize) -> Self;

    /// Square identity matrix.
    fn identity(size: usize) -> Self;

    fn reserve_cols(&mut self, additional: usize);

    /// The pivot of `col`, assuming the column holds no duplicate entries.
    fn low_finalized(&self, col: usize) -> Result<Option<usize>, MatrixError>;

    /// Pops the pivot off `col` and returns it.
    fn remove_low(&mut self, col: usize) -> Result<Option<usize>, MatrixError>;

    /// Reinstates a pivot previously taken with
    /// [`remove_low`](Self::remove_low).
    fn push_low(&mut self, col: usize, row: usize) -> Result<(), MatrixError>;

    /// Adds column `src` of `other` into column `tgt` of this matrix.
    fn add_column_from(&mut self, other: &Self, src: usize, tgt: usize)
        -> Result<(), MatrixError>;

    /// Adds column `src` into column `tgt`, skipping `src`'s pivot. Assumes
    /// `tgt`'s pivot has been popped, equalled `src`'s pivot, and `src` is
    /// finalised.
    fn add_column_popped(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError>;

    /// Restores the canonical duplicate-free form of `col`.
    fn finalize(&mut self, col: usize) -> Result<(), MatrixError>;

    /// Steals column `src` of `other` and appends it to this matrix,
    /// leaving the source column empty.
    fn append_col_from(&mut self, other: &mut Self, src: usize) -> Result<(), MatrixError>;

    /// Moves column `src` of `other` into column `tgt` of this matrix,
    /// overwriting the previous contents of `tgt`.
    fn move_col(&mut self, other: &mut Self, src: usize, tgt: usize) -> Result<(), MatrixError>;
}

/// The vineyard transposition surface of the row-permuted backends.
pub trait RowSwaps: Mod2Matrix {
    /// Transposes rows `i` and `i + 1` by updating the permutation only;
    /// stored columns are not rewritten. The caller is responsible for
    /// restoring the reduced property when the swap breaks it.
    fn swap_rows(&mut self, i: usize) -> Result<(), MatrixError>;

    /// Transposes columns `j` and `j + 1` in place.
    fn swap_columns(&mut self, j: usize) -> Result<(), MatrixError>;

    /// A column whose pivot equals `low`, or `None`. Linear scan over the
    /// columns; maintaining an inverse pivot array through every column
    /// mutation has not paid for itself yet.
    fn find_low(&mut self, low: usize) -> Result<Option<usize>, MatrixError>;
}

pub(crate) fn check_row(row: usize, rows: usize) -> Result<(), MatrixError> {
    if row < rows {
        Ok(())
    } else {
        Err(MatrixError::RowOutOfRange { row, rows })
    }
}

pub(crate) fn check_col(col: usize, cols: usize) -> Result<(), MatrixError> {
    if col < cols {
        Ok(())
    } else {
        Err(MatrixError::ColumnOutOfRange { col, cols })
    }
}

/// Disjoint (&source, &mut target) borrows of two columns of one matrix.
pub(crate) fn pair_mut<T>(items: &mut [T], src: usize, tgt: usize) -> (&T, &mut T) {
    debug_assert_ne!(src, tgt);
    if src < tgt {
        let (head, tail) = items.split_at_mut(tgt);
        (&head[src], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(src);
        (&tail[0], &mut head[tgt])
    }
}
