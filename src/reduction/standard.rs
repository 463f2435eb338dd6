//! The standard persistence column reduction.

use crate::matrices::Mod2Matrix;
use crate::MatrixError;

/// Reduces `matrix` in place, in column order.
///
/// On return distinct nonempty columns have distinct pivots. Every inner
/// step strictly decreases the pivot of the working column, so the loop
/// terminates after at most `height` additions per column.
pub fn col_reduce<M: Mod2Matrix>(matrix: &mut M) -> Result<(), MatrixError> {
    let mut lows: Vec<Option<usize>> = vec![None; matrix.height()];
    for j in 0..matrix.width() {
        while let Some(low) = matrix.low(j)? {
            match lows[low] {
                Some(col) => matrix.add_column(col, j)?,
                None => break,
            }
        }
        if let Some(low) = matrix.low(j)? {
            lows[low] = Some(j);
        }
    }
    Ok(())
}
