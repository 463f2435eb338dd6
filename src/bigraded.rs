//! Bigraded matrices and the kernel reduction.
//!
//! A bigraded matrix assigns every column a position in a two-dimensional
//! grade grid. The kernel computation runs the standard reduction one
//! bigrade at a time, with the pivot table shared across bigrades, while a
//! slave identity matrix records which combinations of input columns were
//! applied; whenever a column zeroes out, its slave column is a kernel
//! generator born at the bigrade under consideration.

use log::debug;

use crate::grades::{Bigrade, IndexMatrix};
use crate::matrices::{check_row, HeapMatrix, LazyColumns};
use crate::MatrixError;

/// A matrix paired with the index of its column bigrades, columns grouped
/// with the y-grade outermost (colex order).
#[derive(Debug, Clone)]
pub struct BigradedMatrix<M = HeapMatrix> {
    pub mat: M,
    pub ind: IndexMatrix,
}

/// The lex-ordered variant (x-grade outermost): the accumulator used while
/// the kernel is assembled grade column by grade column.
#[derive(Debug, Clone)]
pub struct LexBigradedMatrix<M = HeapMatrix> {
    pub mat: M,
    pub ind: IndexMatrix,
}

impl<M: LazyColumns> LexBigradedMatrix<M> {
    pub fn new(rows: usize, cols: usize, y_grades: usize, x_grades: usize) -> Self {
        Self {
            mat: M::zeros(rows, cols),
            ind: IndexMatrix::new(y_grades, x_grades),
        }
    }
}

impl<M: LazyColumns> BigradedMatrix<M> {
    pub fn new(rows: usize, cols: usize, y_grades: usize, x_grades: usize) -> Self {
        Self {
            mat: M::zeros(rows, cols),
            ind: IndexMatrix::new(y_grades, x_grades),
        }
    }

    pub fn x_grades(&self) -> usize {
        self.ind.width()
    }

    pub fn y_grades(&self) -> usize {
        self.ind.height()
    }

    /// Builds a bigraded matrix from `(bigrade, rows)` pairs in arbitrary
    /// order: the columns are sorted colex, finalised, and indexed.
    pub fn from_graded_columns(
        rows: usize,
        x_grades: usize,
        y_grades: usize,
        mut columns: Vec<(Bigrade, Vec<usize>)>,
    ) -> Result<Self, MatrixError> {
        for (grade, col) in &columns {
            if grade.x >= x_grades || grade.y >= y_grades {
                return Err(MatrixError::BigradeOutOfRange {
                    x: grade.x,
                    y: grade.y,
                    x_grades,
                    y_grades,
                });
            }
            for &row in col {
                check_row(row, rows)?;
            }
        }
        columns.sort_by_key(|(grade, _)| grade.colex_key());

        let mut mat = M::zeros(rows, columns.len());
        for (j, (_, rows_j)) in columns.iter().enumerate() {
            for &row in rows_j {
                mat.set(row, j)?;
            }
            mat.finalize(j)?;
        }

        let mut ind = IndexMatrix::new(y_grades, x_grades);
        let mut placed = 0;
        for y in 0..y_grades {
            for x in 0..x_grades {
                while placed < columns.len() && columns[placed].0.colex_key() == (y, x) {
                    placed += 1;
                }
                ind.set(y, x, placed.checked_sub(1));
            }
        }
        Ok(Self { mat, ind })
    }

    /// Regroups a lex-accumulated matrix into colex order, consuming it.
    pub fn from_lex(mut lex: LexBigradedMatrix<M>) -> Result<Self, MatrixError> {
        let mut mat = M::zeros(lex.mat.height(), lex.mat.width());
        let mut ind = IndexMatrix::new(lex.ind.height(), lex.ind.width());
        let mut current = 0;
        for y in 0..ind.height() {
            for x in 0..ind.width() {
                let first = lex.ind.start_index_lex(y, x);
                if let Some(last) = lex.ind.get(y, x) {
                    for j in first..=last {
                        mat.move_col(&mut lex.mat, j, current)?;
                        current += 1;
                    }
                }
                ind.set(y, x, current.checked_sub(1));
            }
        }
        Ok(Self { mat, ind })
    }

    /// Computes a colex-ordered bigraded basis of the kernel of the
    /// underlying linear map, processing bigrades in lex order.
    ///
    /// The underlying matrix is reduced in place as a side effect.
    pub fn kernel(&mut self) -> Result<BigradedMatrix<M>, MatrixError> {
        debug!(
            "computing the kernel of a {}x{} matrix over a {}x{} grade grid",
            self.mat.height(),
            self.mat.width(),
            self.ind.width(),
            self.ind.height(),
        );

        let mut ker: LexBigradedMatrix<M> = LexBigradedMatrix::new(
            self.mat.width(),
            0,
            self.ind.height(),
            self.ind.width(),
        );
        ker.mat.reserve_cols(self.mat.width());

        // records the combinations of input columns applied while reducing
        let mut slave = M::identity(self.mat.width());
        let mut lows: Vec<Option<usize>> = vec![None; self.mat.height()];

        for x in 0..self.ind.width() {
            for y in 0..self.ind.height() {
                self.kernel_one_bigrade(&mut slave, &mut ker, x, y, &mut lows)?;
            }
        }

        let ker = BigradedMatrix::from_lex(ker)?;
        debug!("kernel has {} generators", ker.mat.width());
        Ok(ker)
    }

    /// Reduces the columns of grade row `y` up to x-grade `x` against the
    /// shared pivot table, emitting a kernel generator for every column that
    /// zeroes out at exactly this bigrade.
    fn kernel_one_bigrade(
        &mut self,
        slave: &mut M,
        ker: &mut LexBigradedMatrix<M>,
        x: usize,
        y: usize,
        lows: &mut [Option<usize>],
    ) -> Result<(), MatrixError> {
        let first_col = self.ind.start_index(y, 0);
        let first_col_here = self.ind.start_index(y, x);

        if let Some(last_col) = self.ind.get(y, x) {
            for j in first_col..=last_col {
                let mut changing_column = false;
                let mut low = self.mat.low_finalized(j)?;

                if let Some(pivot) = low {
                    if lows[pivot].is_some_and(|col| col < j) {
                        // the column is about to change: defer its pivot
                        // while the chain of additions runs
                        changing_column = true;
                        self.mat.remove_low(j)?;
                    }
                }

                while let Some(pivot) = low {
                    let Some(col) = lows[pivot].filter(|&col| col < j) else {
                        break;
                    };
                    self.mat.add_column_popped(col, j)?;
                    slave.add_column(col, j)?;
                    low = self.mat.remove_low(j)?;
                }

                match low {
                    Some(pivot) => {
                        lows[pivot] = Some(j);
                        if changing_column {
                            self.mat.push_low(j, pivot)?;
                            self.mat.finalize(j)?;
                        }
                    }
                    None if changing_column => {
                        // zeroed out just now: the slave column is a kernel
                        // generator born at (x, y)
                        slave.finalize(j)?;
                        ker.mat.append_col_from(slave, j)?;
                    }
                    None => {
                        if j >= first_col_here {
                            // an untouched zero column introduced at exactly
                            // this bigrade
                            ker.mat.append_col_from(slave, j)?;
                        }
                    }
                }
            }
        }

        // record the bigrade of the generators added above; empty bigrades
        // repeat the previous terminal
        ker.ind.set(y, x, ker.mat.width().checked_sub(1));
        Ok(())
    }
}
