//! Sparse mod-2 matrix engine for two-parameter persistent homology.
//!
//! Everything here is linear algebra over GF(2) on column-sparse matrices:
//! addition is symmetric difference and the only interesting statistic of a
//! column is its pivot (largest row index). Two storage backends implement a
//! shared capability set, packed sorted columns ([`matrices::ColumnMatrix`])
//! and lazy max-heap columns ([`matrices::HeapMatrix`]), with implicitly
//! row-permuted variants for vineyard-style transpositions. On top of the
//! backends sit the standard
//! persistence reduction ([`reduction::col_reduce`]), the RU-decomposition
//! ([`reduction::decompose_ru`]) and the bigraded kernel computation
//! ([`bigraded::BigradedMatrix::kernel`]).

pub mod bigraded;
pub mod columns;
pub mod grades;
pub mod matrices;
pub mod reduction;

use thiserror::Error;

/// Errors surfaced by the matrix operations.
///
/// Every failing operation checks its arguments before touching storage, so
/// an error leaves the matrix unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("row {row} out of range for a matrix with {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("column {col} out of range for a matrix with {cols} columns")]
    ColumnOutOfRange { col: usize, cols: usize },
    #[error("cannot add column {col} to itself")]
    SelfAddition { col: usize },
    #[error("bigrade ({x}, {y}) outside a {x_grades}x{y_grades} grade grid")]
    BigradeOutOfRange {
        x: usize,
        y: usize,
        x_grades: usize,
        y_grades: usize,
    },
}
