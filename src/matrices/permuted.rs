//! Implicitly row-permuted matrices and the row-priority operation record.

use crate::matrices::{check_col, check_row, ColumnMatrix, LazyColumns, Mod2Matrix, RowSwaps};
use crate::MatrixError;

/// Sorted-column matrix with an implicit row permutation.
///
/// Stored row indices remain in the original coordinate system; `perm` maps
/// original to current positions and `mrep` is its inverse, so transposing
/// two rows is a pure permutation update. The price is that stored columns
/// are no longer sorted in the permuted order, so the pivot query scans the
/// column. A `col_perm` history records column transpositions for callers
/// that must recover original column indices.
#[derive(Debug, Clone)]
pub struct PermutedMatrix {
    inner: ColumnMatrix,
    perm: Vec<usize>,
    mrep: Vec<usize>,
    col_perm: Vec<usize>,
}

impl PermutedMatrix {
    /// All-zero matrix with identity permutations.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            inner: ColumnMatrix::new(rows, cols),
            perm: (0..rows).collect(),
            mrep: (0..rows).collect(),
            col_perm: (0..cols).collect(),
        }
    }

    /// Square identity matrix with identity permutations.
    pub fn identity(size: usize) -> Self {
        Self {
            inner: <ColumnMatrix as LazyColumns>::identity(size),
            perm: (0..size).collect(),
            mrep: (0..size).collect(),
            col_perm: (0..size).collect(),
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

    /// The column transposition history: `col_perm()[j]` is the original
    /// index of the column currently at position `j`.
    pub fn col_perm(&self) -> &[usize] {
        &self.col_perm
    }
}

impl Mod2Matrix for PermutedMatrix {
    fn height(&self) -> usize {
        self.perm.len()
    }

    fn width(&self) -> usize {
        self.inner.width()
    }

    fn set(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.perm.len())?;
        self.inner.set(self.mrep[row], col)
    }

    fn clear(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.perm.len())?;
        self.inner.clear(self.mrep[row], col)
    }

    fn entry(&self, row: usize, col: usize) -> Result<bool, MatrixError> {
        check_row(row, self.perm.len())?;
        self.inner.entry(self.mrep[row], col)
    }

    // no fast path: stored indices are not sorted in the permuted order
    fn low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        let column = self.inner.column(col)?;
        Ok(column.iter().map(|row| self.perm[row]).max())
    }

    fn add_column(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        self.inner.add_column(src, tgt)
    }
}

impl RowSwaps for PermutedMatrix {
    fn swap_rows(&mut self, i: usize) -> Result<(), MatrixError> {
        check_row(i + 1, self.perm.len())?;
        let a = self.mrep[i];
        let b = self.mrep[i + 1];
        self.perm.swap(a, b);
        self.mrep.swap(i, i + 1);
        Ok(())
    }

    fn swap_columns(&mut self, j: usize) -> Result<(), MatrixError> {
        check_col(j + 1, self.inner.width())?;
        self.inner.swap_columns(j, j + 1)?;
        self.col_perm.swap(j, j + 1);
        Ok(())
    }

    fn find_low(&mut self, low: usize) -> Result<Option<usize>, MatrixError> {
        check_row(low, self.perm.len())?;
        for j in 0..self.inner.width() {
            if self.low(j)? == Some(low) {
                return Ok(Some(j));
            }
        }
        Ok(None)
    }
}

/// Row-priority sparse matrix: the upper-triangular operation record U of an
/// RU-decomposition.
///
/// Storage is column-major over U's rows, so a row operation on U is a
/// column operation on its storage. `perm`/`mrep` permute U's columns for
/// vineyard column transpositions, while a row transposition swaps two
/// storage columns outright.
#[derive(Debug, Clone)]
pub struct RowPriorityMatrix {
    // storage column i holds row i of U
    storage: ColumnMatrix,
    perm: Vec<usize>,
    mrep: Vec<usize>,
}

impl RowPriorityMatrix {
    /// The n-by-n identity.
    pub fn identity(size: usize) -> Self {
        Self {
            storage: <ColumnMatrix as LazyColumns>::identity(size),
            perm: (0..size).collect(),
            mrep: (0..size).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.storage.height()
    }

    pub fn height(&self) -> usize {
        self.storage.width()
    }

    /// Idempotently sets entry (row, col) to 1.
    pub fn set(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.height())?;
        check_col(col, self.perm.len())?;
        self.storage.set(self.mrep[col], row)
    }

    /// Sets entry (row, col) to 0.
    pub fn clear(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.height())?;
        check_col(col, self.perm.len())?;
        self.storage.clear(self.mrep[col], row)
    }

    pub fn entry(&self, row: usize, col: usize) -> Result<bool, MatrixError> {
        check_row(row, self.height())?;
        check_col(col, self.perm.len())?;
        self.storage.entry(self.mrep[col], row)
    }

    /// Adds row `src` into row `tgt` (symmetric difference); a column
    /// operation on the storage.
    pub fn add_row(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        self.storage.add_column(src, tgt)
    }

    /// Transposes rows `i` and `i + 1`: a storage column swap.
    pub fn swap_rows(&mut self, i: usize) -> Result<(), MatrixError> {
        check_row(i + 1, self.height())?;
        self.storage.swap_columns(i, i + 1)
    }

    /// Transposes columns `j` and `j + 1`: a pure permutation update.
    pub fn swap_columns(&mut self, j: usize) -> Result<(), MatrixError> {
        check_col(j + 1, self.perm.len())?;
        let a = self.mrep[j];
        let b = self.mrep[j + 1];
        self.perm.swap(a, b);
        self.mrep.swap(j, j + 1);
        Ok(())
    }
}
