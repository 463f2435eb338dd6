//! Reduction algorithms over the mod-2 matrix backends.
//!
//! [`col_reduce`] is the standard persistence reduction; [`decompose_ru`]
//! additionally records every column operation in an upper-triangular
//! matrix, so that callers can maintain the decomposition across vineyard
//! transpositions.

pub mod ru;
pub mod standard;

pub use ru::decompose_ru;
pub use standard::col_reduce;
