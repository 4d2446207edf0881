//! Bifiltered simplicial complexes stored in a simplex tree.
//!
//! Every simplex carries a birth multi-index `(time, dist)`, recorded as a pair of positions into
//! two sorted [`GradeList`](grades::GradeList)s.
//! After construction (see [`rips`]) and a call to [`SimplexTree::reindex`](simplex_tree::SimplexTree::reindex),
//! the tree can be sliced at any multi-index to produce boundary, merge and split matrices (see [`extract`]).
//! Those matrices are what a reduction algorithm consumes; this crate does not reduce them itself.

use thiserror::Error;

pub mod extract;
pub mod fields;
pub mod grades;
pub mod matrices;
pub mod rips;
pub mod simplex_tree;

pub use grades::{Axis, GradeList};
pub use simplex_tree::{MultiIndex, SimplexData, SimplexTree};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BifilError {
    #[error("cannot insert a simplex with no vertices")]
    EmptySimplex,
    #[error("vertex {vertex} appears more than once in the simplex")]
    DuplicateVertex { vertex: usize },
    #[error("vertex {vertex} is out of range, the tree only admits labels below {bound}")]
    VertexOutOfRange { vertex: usize, bound: usize },
    #[error("global indices are stale, call reindex() after mutating the tree")]
    StaleIndices,
    #[error("no simplex has global index {ordinal}")]
    UnknownOrdinal { ordinal: usize },
    #[error("{axis} index {index} is out of range, only {len} values are registered")]
    GradeOutOfRange { axis: Axis, index: usize, len: usize },
    #[error("face with global index {ordinal} is missing from the supplied row order")]
    FaceNotInOrder { ordinal: usize },
    #[error("cofaces must all have the same dimension")]
    CofaceDimensionMismatch,
    #[error("column is not in the domain of this matrix")]
    NotInDomain,
    #[error("simplex with global index {ordinal} is not in the codomain of this map")]
    NotInCodomain { ordinal: usize },
    #[error("entry ({row}, {col}) lies outside a {n_rows} x {n_cols} matrix")]
    EntryOutOfBounds {
        row: usize,
        col: usize,
        n_rows: usize,
        n_cols: usize,
    },
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },
}
