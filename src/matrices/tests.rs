// ======== Cross-backend tests ================================

use proptest::prelude::*;

use crate::columns::SortedColumn;
use crate::matrices::{
    ColumnMatrix, HeapMatrix, LazyColumns, Mod2Matrix, PermutedHeapMatrix, PermutedMatrix,
    RowPriorityMatrix, RowSwaps,
};
use crate::reduction::{col_reduce, decompose_ru};
use crate::MatrixError;

fn sparse<M: Mod2Matrix>(mat: &M) -> Vec<Vec<usize>> {
    (0..mat.width())
        .map(|j| (0..mat.height()).filter(|&i| mat.entry(i, j).unwrap()).collect())
        .collect()
}

fn permuted_from(rows: usize, cols: &[&[usize]]) -> PermutedMatrix {
    let mut mat = PermutedMatrix::new(rows, cols.len());
    for (j, col) in cols.iter().enumerate() {
        for &i in *col {
            mat.set(i, j).unwrap();
        }
    }
    mat
}

fn check_set_clear_entry<M: Mod2Matrix>(mat: &mut M) {
    mat.set(2, 0).unwrap();
    mat.set(0, 0).unwrap();
    assert!(mat.entry(2, 0).unwrap());
    assert!(mat.entry(0, 0).unwrap());
    assert!(!mat.entry(1, 0).unwrap());

    // set is idempotent
    mat.set(2, 0).unwrap();
    assert!(mat.entry(2, 0).unwrap());
    assert_eq!(mat.low(0).unwrap(), Some(2));

    mat.clear(2, 0).unwrap();
    assert!(!mat.entry(2, 0).unwrap());
    assert_eq!(mat.low(0).unwrap(), Some(0));
    // clearing an absent entry is a no-op
    mat.clear(1, 0).unwrap();
    assert_eq!(sparse(mat), vec![vec![0], vec![]]);
}

#[test]
fn set_clear_entry_on_every_backend() {
    check_set_clear_entry(&mut ColumnMatrix::new(3, 2));
    check_set_clear_entry(&mut HeapMatrix::new(3, 2));
    check_set_clear_entry(&mut PermutedMatrix::new(3, 2));
    check_set_clear_entry(&mut PermutedHeapMatrix::new(3, 2));
}

#[test]
fn out_of_range_indices_are_rejected() {
    let mut mat = HeapMatrix::new(2, 2);
    assert_eq!(
        mat.set(2, 0),
        Err(MatrixError::RowOutOfRange { row: 2, rows: 2 })
    );
    assert_eq!(
        mat.entry(0, 5),
        Err(MatrixError::ColumnOutOfRange { col: 5, cols: 2 })
    );
    assert_eq!(
        mat.low(2),
        Err(MatrixError::ColumnOutOfRange { col: 2, cols: 2 })
    );
    assert_eq!(
        mat.add_column(0, 3),
        Err(MatrixError::ColumnOutOfRange { col: 3, cols: 2 })
    );
    // a failed operation leaves the matrix unchanged
    assert_eq!(sparse(&mat), vec![vec![], vec![]]);
}

#[test]
fn self_addition_is_rejected() {
    let mut list = ColumnMatrix::new(2, 2);
    assert_eq!(
        list.add_column(1, 1),
        Err(MatrixError::SelfAddition { col: 1 })
    );
    let mut heap = HeapMatrix::new(2, 2);
    assert_eq!(
        heap.add_column(0, 0),
        Err(MatrixError::SelfAddition { col: 0 })
    );
}

#[test]
fn addition_is_symmetric_difference() {
    let cols = vec![vec![0, 2, 5], vec![1, 2, 5, 7]];
    let mut list = ColumnMatrix::from_columns(8, cols.clone()).unwrap();
    let mut heap = HeapMatrix::from_columns(8, cols).unwrap();
    list.add_column(0, 1).unwrap();
    heap.add_column(0, 1).unwrap();
    assert_eq!(sparse(&list)[1], vec![0, 1, 7]);
    assert_eq!(sparse(&heap)[1], vec![0, 1, 7]);
}

#[test]
fn double_addition_cancels_on_the_heap() {
    let mut heap = HeapMatrix::from_columns(3, vec![vec![0, 1, 2], vec![2]]).unwrap();
    heap.add_column(0, 1).unwrap();
    heap.add_column(0, 1).unwrap();
    assert_eq!(heap.low(1).unwrap(), Some(2));
    assert_eq!(sparse(&heap)[1], vec![2]);
}

#[test]
fn identity_reduction_is_a_noop() {
    let mut mat = ColumnMatrix::identity(2);
    col_reduce(&mut mat).unwrap();
    assert_eq!(mat, ColumnMatrix::identity(2));
}

#[test]
fn two_column_cancellation() {
    // column 1 reduces against column 0, leaving pivot rows {1, 0}
    for backend in 0..2 {
        let cols = vec![vec![0, 1], vec![1]];
        let (low0, low1, col1) = if backend == 0 {
            let mut mat = ColumnMatrix::from_columns(2, cols).unwrap();
            col_reduce(&mut mat).unwrap();
            (mat.low(0).unwrap(), mat.low(1).unwrap(), sparse(&mat)[1].clone())
        } else {
            let mut mat = HeapMatrix::from_columns(2, cols).unwrap();
            col_reduce(&mut mat).unwrap();
            (mat.low(0).unwrap(), mat.low(1).unwrap(), sparse(&mat)[1].clone())
        };
        assert_eq!(low0, Some(1));
        assert_eq!(low1, Some(0));
        assert_eq!(col1, vec![0]);
    }
}

#[test]
fn popped_addition_matches_plain_addition() {
    // columns share pivot 4; reduce one against the other both ways
    let cols = vec![vec![1, 4], vec![0, 2, 4]];

    let mut plain = HeapMatrix::from_columns(5, cols.clone()).unwrap();
    plain.add_column(0, 1).unwrap();

    let mut popped = HeapMatrix::from_columns(5, cols.clone()).unwrap();
    assert_eq!(popped.remove_low(1).unwrap(), Some(4));
    popped.add_column_popped(0, 1).unwrap();
    popped.finalize(1).unwrap();
    assert_eq!(sparse(&plain), sparse(&popped));

    let mut list = ColumnMatrix::from_columns(5, cols).unwrap();
    assert_eq!(list.remove_low(1).unwrap(), Some(4));
    list.add_column_popped(0, 1).unwrap();
    assert_eq!(sparse(&list)[1], vec![0, 1, 2]);
}

#[test]
fn finalize_agrees_with_the_lazy_pivot() {
    let mut heap = HeapMatrix::from_columns(6, vec![vec![1, 5], vec![2, 5]]).unwrap();
    // pile duplicates onto column 1
    heap.add_column(0, 1).unwrap();
    heap.add_column(0, 1).unwrap();
    heap.add_column(0, 1).unwrap();
    let lazy = heap.low(1).unwrap();
    heap.finalize(1).unwrap();
    assert_eq!(heap.low_finalized(1).unwrap(), lazy);
    assert_eq!(sparse(&heap)[1], vec![1, 2]);
}

#[test]
fn remove_and_push_low_roundtrip() {
    let mut heap = HeapMatrix::from_columns(5, vec![vec![0, 3]]).unwrap();
    let pivot = heap.remove_low(0).unwrap().unwrap();
    assert_eq!(pivot, 3);
    assert_eq!(heap.low(0).unwrap(), Some(0));
    heap.push_low(0, pivot).unwrap();
    assert_eq!(heap.low_finalized(0).unwrap(), Some(3));
}

#[test]
fn appending_steals_the_source_column() {
    let mut ker = HeapMatrix::new(4, 0);
    let mut slave = HeapMatrix::identity(4);
    ker.append_col_from(&mut slave, 2).unwrap();
    assert_eq!(ker.width(), 1);
    assert_eq!(sparse(&ker), vec![vec![2]]);
    assert!(slave.column_is_empty(2).unwrap());
}

#[test]
fn moving_overwrites_the_target_column() {
    let mut src = ColumnMatrix::from_columns(3, vec![vec![0, 1]]).unwrap();
    let mut dst = ColumnMatrix::from_columns(3, vec![vec![2]]).unwrap();
    dst.move_col(&mut src, 0, 0).unwrap();
    assert_eq!(sparse(&dst), vec![vec![0, 1]]);
    assert!(src.column_is_empty(0).unwrap());
}

#[test]
fn cross_matrix_addition() {
    let other = HeapMatrix::from_columns(4, vec![vec![0, 3]]).unwrap();
    let mut mat = HeapMatrix::from_columns(4, vec![vec![3]]).unwrap();
    mat.add_column_from(&other, 0, 0).unwrap();
    assert_eq!(sparse(&mat), vec![vec![0]]);
}

// ---- permuted backends ----------------------------------------------

#[test]
fn swapping_rows_moves_the_pivot() {
    let mut mat = permuted_from(3, &[&[0, 2]]);
    assert_eq!(mat.low(0).unwrap(), Some(2));
    mat.swap_rows(1).unwrap();
    // row 2 moved up to position 1
    assert_eq!(mat.low(0).unwrap(), Some(1));
    assert!(mat.entry(1, 0).unwrap());
    assert!(!mat.entry(2, 0).unwrap());
}

#[test]
fn swap_rows_twice_restores_everything() {
    let mut mat = permuted_from(4, &[&[1, 3], &[0, 2]]);
    let before = sparse(&mat);
    mat.swap_rows(1).unwrap();
    mat.swap_rows(1).unwrap();
    assert_eq!(sparse(&mat), before);
    assert_eq!(mat.row_perm(), &[0, 1, 2, 3]);
    assert_eq!(mat.row_perm_inverse(), &[0, 1, 2, 3]);
}

#[test]
fn permutations_stay_mutually_inverse() {
    let mut mat = PermutedHeapMatrix::new(5, 0);
    for &i in &[0, 3, 1, 2, 0, 3] {
        mat.swap_rows(i).unwrap();
    }
    let perm = mat.row_perm();
    let mrep = mat.row_perm_inverse();
    for i in 0..5 {
        assert_eq!(perm[mrep[i]], i);
        assert_eq!(mrep[perm[i]], i);
    }
}

#[test]
fn vineyard_swap_needs_one_restoring_addition() {
    // reduced 3x3 matrix: pivots 1, 2, 0 in columns 0, 1, 2
    let mut mat = permuted_from(3, &[&[0, 1], &[1, 2], &[2]]);
    col_reduce(&mut mat).unwrap();
    assert_eq!(sparse(&mat), vec![vec![0, 1], vec![1, 2], vec![0]]);

    mat.swap_rows(0).unwrap();
    // columns 0 and 2 now collide on pivot 1
    assert_eq!(mat.low(0).unwrap(), Some(1));
    assert_eq!(mat.low(2).unwrap(), Some(1));

    // one addition of the earlier column restores the reduced state
    mat.add_column(0, 2).unwrap();
    let mut lows = [mat.low(0).unwrap(), mat.low(1).unwrap(), mat.low(2).unwrap()];
    lows.sort();
    assert_eq!(lows, [Some(0), Some(1), Some(2)]);
}

#[test]
fn find_low_scans_the_columns() {
    let mut mat = permuted_from(3, &[&[0, 1], &[2]]);
    assert_eq!(mat.find_low(1).unwrap(), Some(0));
    assert_eq!(mat.find_low(2).unwrap(), Some(1));
    assert_eq!(mat.find_low(0).unwrap(), None);
    assert_eq!(
        mat.find_low(3),
        Err(MatrixError::RowOutOfRange { row: 3, rows: 3 })
    );
}

#[test]
fn swap_columns_tracks_history() {
    let mut mat = permuted_from(2, &[&[0], &[1], &[]]);
    mat.swap_columns(0).unwrap();
    mat.swap_columns(1).unwrap();
    assert_eq!(mat.col_perm(), &[1, 2, 0]);
    assert_eq!(sparse(&mat), vec![vec![1], vec![], vec![0]]);
}

#[test]
fn permuted_heap_keeps_original_coordinates() {
    let mut mat = PermutedHeapMatrix::new(3, 2);
    mat.set(0, 0).unwrap();
    mat.set(2, 0).unwrap();
    mat.swap_rows(1).unwrap();
    // original row 2 now sits at position 1; nothing stored changed
    assert_eq!(mat.row_perm(), &[0, 2, 1]);
    assert!(mat.entry(0, 0).unwrap());
    assert!(mat.entry(1, 0).unwrap());
    assert!(!mat.entry(2, 0).unwrap());
    assert_eq!(mat.low(0).unwrap(), Some(1));
    assert_eq!(mat.low_finalized(0).unwrap(), Some(1));
}

#[test]
fn set_perm_installs_a_whole_order() {
    let mut mat = PermutedHeapMatrix::new(3, 1);
    mat.set(1, 0).unwrap();
    mat.set_perm(&[2, 0, 1]);
    // stored row 1 now reads as position 0
    assert_eq!(mat.low(0).unwrap(), Some(0));
    assert!(mat.entry(0, 0).unwrap());
    let perm = mat.row_perm();
    let mrep = mat.row_perm_inverse();
    for i in 0..3 {
        assert_eq!(perm[mrep[i]], i);
    }
}

#[test]
fn set_col_permuted_remaps_and_skips() {
    let mut mat = PermutedHeapMatrix::new(4, 1);
    // rows 0 and 2 survive the mapping, row 1 is deleted
    mat.set_col_permuted(0, &[0, 1, 2], &[Some(3), None, Some(1), Some(0)])
        .unwrap();
    assert_eq!(sparse(&mat), vec![vec![1, 3]]);
}

#[test]
fn sorted_mode_operations() {
    let mut mat = HeapMatrix::from_columns(6, vec![vec![0, 4, 2], vec![4, 5]]).unwrap();
    mat.sort_col(0).unwrap();
    mat.sort_col(1).unwrap();
    assert!(mat.entry_sorted(4, 0).unwrap());
    assert!(!mat.entry_sorted(3, 0).unwrap());
    assert_eq!(mat.low_sorted(1).unwrap(), Some(5));
    mat.add_column_sorted(0, 1).unwrap();
    assert_eq!(sparse(&mat)[1], vec![0, 2, 5]);
}

#[test]
fn reindexing_rewrites_a_column() {
    let mut mat = HeapMatrix::from_columns(4, vec![vec![0, 2]]).unwrap();
    mat.reindex_column(0, &[3, 2, 1, 0]).unwrap();
    assert_eq!(sparse(&mat), vec![vec![1, 3]]);
}

// ---- the row-priority record ----------------------------------------

#[test]
fn row_priority_matrix_is_transposed_storage() {
    let mut u = RowPriorityMatrix::identity(3);
    u.set(0, 2).unwrap();
    assert!(u.entry(0, 2).unwrap());
    assert!(u.entry(1, 1).unwrap());
    assert!(!u.entry(2, 0).unwrap());
    u.clear(0, 2).unwrap();
    assert!(!u.entry(0, 2).unwrap());
}

#[test]
fn add_row_sums_rows() {
    let mut u = RowPriorityMatrix::identity(3);
    u.add_row(2, 0).unwrap();
    // row 0 is now e0 + e2
    assert!(u.entry(0, 0).unwrap());
    assert!(u.entry(0, 2).unwrap());
    assert!(!u.entry(2, 0).unwrap());
}

#[test]
fn row_priority_swaps() {
    let mut u = RowPriorityMatrix::identity(2);
    u.swap_rows(0).unwrap();
    assert!(u.entry(0, 1).unwrap());
    assert!(u.entry(1, 0).unwrap());
    u.swap_columns(0).unwrap();
    assert!(u.entry(0, 0).unwrap());
    assert!(u.entry(1, 1).unwrap());
}

/// Explicit product M · U, reading U entrywise.
fn multiply_mu(m: &ColumnMatrix, u: &RowPriorityMatrix) -> ColumnMatrix {
    let mut out = ColumnMatrix::new(m.height(), u.height());
    for j in 0..u.height() {
        let mut acc = SortedColumn::new();
        for i in 0..u.width() {
            if u.entry(i, j).unwrap() {
                acc.add(m.column(i).unwrap());
            }
        }
        for row in acc.iter() {
            out.set(row, j).unwrap();
        }
    }
    out
}

#[test]
fn ru_identity_on_a_fixed_matrix() {
    let original = ColumnMatrix::from_columns(
        7,
        vec![
            vec![],
            vec![],
            vec![],
            vec![0, 1],
            vec![1, 2],
            vec![0, 2],
            vec![3, 4, 5],
        ],
    )
    .unwrap();
    let mut r = original.clone();
    let u = decompose_ru(&mut r).unwrap();
    assert_eq!(multiply_mu(&original, &u), r);
}

// ---- property tests --------------------------------------------------

fn small_columns() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..8usize, 0..6), 1..8)
}

proptest! {
    #[test]
    fn prop_double_addition_is_identity(cols in small_columns()) {
        prop_assume!(cols.len() >= 2);
        let mut list = ColumnMatrix::from_columns(8, cols.clone()).unwrap();
        let mut heap = HeapMatrix::from_columns(8, cols).unwrap();
        let before_list = sparse(&list);
        let before_heap = sparse(&heap);
        list.add_column(0, 1).unwrap();
        list.add_column(0, 1).unwrap();
        heap.add_column(0, 1).unwrap();
        heap.add_column(0, 1).unwrap();
        prop_assert_eq!(sparse(&list), before_list);
        prop_assert_eq!(sparse(&heap), before_heap);
    }

    #[test]
    fn prop_backends_reduce_identically(cols in small_columns()) {
        let mut list = ColumnMatrix::from_columns(8, cols.clone()).unwrap();
        let mut heap = HeapMatrix::from_columns(8, cols).unwrap();
        col_reduce(&mut list).unwrap();
        col_reduce(&mut heap).unwrap();
        prop_assert_eq!(sparse(&list), sparse(&heap));
    }

    #[test]
    fn prop_reduction_leaves_distinct_pivots(cols in small_columns()) {
        let mut mat = ColumnMatrix::from_columns(8, cols).unwrap();
        col_reduce(&mut mat).unwrap();
        let mut seen = vec![false; mat.height()];
        for j in 0..mat.width() {
            if let Some(low) = mat.low(j).unwrap() {
                prop_assert!(!seen[low]);
                seen[low] = true;
            }
        }
    }

    #[test]
    fn prop_ru_identity(cols in small_columns()) {
        let original = ColumnMatrix::from_columns(8, cols).unwrap();
        let mut r = original.clone();
        let u = decompose_ru(&mut r).unwrap();
        prop_assert_eq!(multiply_mu(&original, &u), r);
    }

    #[test]
    fn prop_swaps_preserve_the_inverse_pair(swaps in prop::collection::vec(0..7usize, 0..40)) {
        let mut mat = PermutedHeapMatrix::new(8, 0);
        for &i in &swaps {
            mat.swap_rows(i).unwrap();
        }
        let perm = mat.row_perm().to_vec();
        let mrep = mat.row_perm_inverse().to_vec();
        for i in 0..8 {
            prop_assert_eq!(perm[mrep[i]], i);
            prop_assert_eq!(mrep[perm[i]], i);
        }
    }
}
