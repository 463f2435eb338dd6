//! The packed sorted-column backend.

use crate::columns::SortedColumn;
use crate::matrices::{check_col, check_row, pair_mut, LazyColumns, Mod2Matrix};
use crate::MatrixError;

/// Column-major mod-2 matrix whose columns are packed ascending row-index
/// vectors.
///
/// Sorted columns keep the pivot readable in O(1) and make addition a single
/// merge pass, which is the dominant operation of every reduction here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMatrix {
    columns: Vec<SortedColumn>,
    num_rows: usize,
}

impl ColumnMatrix {
    /// All-zero matrix of the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            columns: vec![SortedColumn::new(); cols],
            num_rows: rows,
        }
    }

    /// Builds a matrix from one row-index set per column.
    pub fn from_columns(rows: usize, cols: Vec<Vec<usize>>) -> Result<Self, MatrixError> {
        let mut mat = Self::new(rows, cols.len());
        for (j, col) in cols.into_iter().enumerate() {
            for &row in &col {
                check_row(row, rows)?;
            }
            mat.columns[j] = SortedColumn::from_rows(col);
        }
        Ok(mat)
    }

    pub fn column(&self, col: usize) -> Result<&SortedColumn, MatrixError> {
        check_col(col, self.columns.len())?;
        Ok(&self.columns[col])
    }

    /// Swaps columns `j` and `k` in place.
    pub fn swap_columns(&mut self, j: usize, k: usize) -> Result<(), MatrixError> {
        check_col(j, self.columns.len())?;
        check_col(k, self.columns.len())?;
        self.columns.swap(j, k);
        Ok(())
    }

    /// Clears every entry of column `col`.
    pub fn clear_column(&mut self, col: usize) -> Result<(), MatrixError> {
        check_col(col, self.columns.len())?;
        self.columns[col].clear();
        Ok(())
    }
}

impl Mod2Matrix for ColumnMatrix {
    fn height(&self) -> usize {
        self.num_rows
    }

    fn width(&self) -> usize {
        self.columns.len()
    }

    fn set(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.columns.len())?;
        self.columns[col].insert(row);
        Ok(())
    }

    fn clear(&mut self, row: usize, col: usize) -> Result<(), MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.columns.len())?;
        self.columns[col].remove(row);
        Ok(())
    }

    fn entry(&self, row: usize, col: usize) -> Result<bool, MatrixError> {
        check_row(row, self.num_rows)?;
        check_col(col, self.columns.len())?;
        Ok(self.columns[col].contains(row))
    }

    fn low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.columns.len())?;
        Ok(self.columns[col].low())
    }

    fn add_column(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.columns.len())?;
        check_col(tgt, self.columns.len())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        let (src_col, tgt_col) = pair_mut(&mut self.columns, src, tgt);
        tgt_col.add(src_col);
        Ok(())
    }
}

impl LazyColumns for ColumnMatrix {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols)
    }

    fn identity(size: usize) -> Self {
        let mut mat = Self::new(size, size);
        for (j, col) in mat.columns.iter_mut().enumerate() {
            col.push_low(j);
        }
        mat
    }

    fn reserve_cols(&mut self, additional: usize) {
        self.columns.reserve(additional);
    }

    fn low_finalized(&self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.columns.len())?;
        Ok(self.columns[col].low())
    }

    fn remove_low(&mut self, col: usize) -> Result<Option<usize>, MatrixError> {
        check_col(col, self.columns.len())?;
        Ok(self.columns[col].pop_low())
    }

    fn push_low(&mut self, col: usize, row: usize) -> Result<(), MatrixError> {
        check_col(col, self.columns.len())?;
        check_row(row, self.num_rows)?;
        self.columns[col].push_low(row);
        Ok(())
    }

    fn add_column_from(
        &mut self,
        other: &Self,
        src: usize,
        tgt: usize,
    ) -> Result<(), MatrixError> {
        check_col(src, other.columns.len())?;
        check_col(tgt, self.columns.len())?;
        debug_assert!(other.num_rows <= self.num_rows);
        self.columns[tgt].add(&other.columns[src]);
        Ok(())
    }

    fn add_column_popped(&mut self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, self.columns.len())?;
        check_col(tgt, self.columns.len())?;
        if src == tgt {
            return Err(MatrixError::SelfAddition { col: src });
        }
        let (src_col, tgt_col) = pair_mut(&mut self.columns, src, tgt);
        tgt_col.add_skipping_low(src_col);
        Ok(())
    }

    // sorted columns are always in canonical form
    fn finalize(&mut self, col: usize) -> Result<(), MatrixError> {
        check_col(col, self.columns.len())?;
        Ok(())
    }

    fn append_col_from(&mut self, other: &mut Self, src: usize) -> Result<(), MatrixError> {
        check_col(src, other.columns.len())?;
        self.columns.push(std::mem::take(&mut other.columns[src]));
        Ok(())
    }

    fn move_col(&mut self, other: &mut Self, src: usize, tgt: usize) -> Result<(), MatrixError> {
        check_col(src, other.columns.len())?;
        check_col(tgt, self.columns.len())?;
        self.columns[tgt] = std::mem::take(&mut other.columns[src]);
        Ok(())
    }
}
