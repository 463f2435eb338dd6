//! RU-decomposition: reduction with an operation record.

use log::debug;

use crate::matrices::{Mod2Matrix, RowPriorityMatrix};
use crate::MatrixError;

/// Reduces `r` in place and returns the row-priority upper-triangular matrix
/// U accumulating the column operations, so that the original matrix equals
/// R · U⁻¹ over GF(2), or equivalently R = M · U.
///
/// Every `add_column(c, j)` applied to R is mirrored as `add_row(j, c)` on
/// U, which is a column operation on U's row-priority storage. Both sides of
/// each step are pure symmetric differences on in-range indices, so a
/// failure can only come from the initial dimension checks.
pub fn decompose_ru<M: Mod2Matrix>(r: &mut M) -> Result<RowPriorityMatrix, MatrixError> {
    let mut u = RowPriorityMatrix::identity(r.width());
    let mut low_col: Vec<Option<usize>> = vec![None; r.height()];
    let mut additions = 0usize;
    for j in 0..r.width() {
        while let Some(low) = r.low(j)? {
            let Some(col) = low_col[low] else { break };
            r.add_column(col, j)?;
            u.add_row(j, col)?;
            additions += 1;
        }
        if let Some(low) = r.low(j)? {
            low_col[low] = Some(j);
        }
    }
    debug!(
        "RU-decomposition of a {}x{} matrix used {} column additions",
        r.height(),
        r.width(),
        additions
    );
    Ok(u)
}

#[cfg(test)]
mod tests {
    use super::decompose_ru;
    use crate::matrices::{ColumnMatrix, Mod2Matrix, PermutedHeapMatrix, RowSwaps};

    #[test]
    fn identity_decomposes_trivially() {
        use crate::matrices::LazyColumns;
        let mut r = ColumnMatrix::identity(2);
        let u = decompose_ru(&mut r).unwrap();
        assert_eq!(r, ColumnMatrix::identity(2));
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(u.entry(i, j).unwrap(), i == j);
            }
        }
    }

    #[test]
    fn records_the_single_cancellation() {
        let mut r = ColumnMatrix::from_columns(2, vec![vec![0, 1], vec![1]]).unwrap();
        let u = decompose_ru(&mut r).unwrap();
        assert_eq!(r.low(0).unwrap(), Some(1));
        assert_eq!(r.low(1).unwrap(), Some(0));
        // U row 0 picked up row 1
        assert!(u.entry(0, 0).unwrap());
        assert!(u.entry(0, 1).unwrap());
        assert!(!u.entry(1, 0).unwrap());
        assert!(u.entry(1, 1).unwrap());
    }

    #[test]
    fn works_on_permuted_heap_matrices() {
        let mut r = PermutedHeapMatrix::new(3, 3);
        for (j, col) in [vec![0, 1], vec![1, 2], vec![2]].iter().enumerate() {
            for &i in col {
                r.set(i, j).unwrap();
            }
        }
        r.swap_rows(1).unwrap();
        // a transposition leaves the stored heaps ordered by the old
        // permutation; columns touching the swapped rows must be finalised
        // before their pivots are consumed
        for j in 0..3 {
            r.finalize(j).unwrap();
        }
        let _u = decompose_ru(&mut r).unwrap();
        let mut seen = vec![false; r.height()];
        for j in 0..r.width() {
            if let Some(low) = r.low(j).unwrap() {
                assert!(!seen[low]);
                seen[low] = true;
            }
        }
    }
}
