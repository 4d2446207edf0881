//! Matrices obtained by slicing the simplex tree at a multi-index.
//!
//! Every extractor works in two steps.
//! First it finds the simplices alive at the relevant multi-indices with [`SimplexTree::simplices_at`] and orders them by global index,
//! then it emits one sparse column per simplex.
//! The result is a [`SliceMatrix`], which also records which global index each local row and column stands for,
//! so that results can be translated back with [`SimplexTree::get_simplex_data`].
//!
//! Boundary columns use the orientation convention that the face obtained by dropping the `i`-th vertex (in increasing label order)
//! has coefficient `(-1)^i`, in whatever field `CF` the caller picks.

use std::iter;
use std::marker::PhantomData;

use log::trace;
use rustc_hash::FxHashMap;

use crate::{
    fields::NonZeroCoefficient,
    matrices::{implementors::SparseMatrix, MatrixOracle},
    simplex_tree::{MultiIndex, SimplexTree},
    BifilError,
};

// ====== Boundary oracle over global indices ==

/// The full boundary matrix of the tree, indexed by global index on both sides.
///
/// Columns are computed on demand by walking the tree, nothing is stored.
pub struct BoundaryOracle<'a, CF: NonZeroCoefficient> {
    tree: &'a SimplexTree,
    phantom: PhantomData<CF>,
}

impl<CF: NonZeroCoefficient> Clone for BoundaryOracle<'_, CF> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<CF: NonZeroCoefficient> Copy for BoundaryOracle<'_, CF> {}

impl<CF: NonZeroCoefficient> MatrixOracle for BoundaryOracle<'_, CF> {
    type CoefficientField = CF;

    type ColT = usize;

    type RowT = usize;

    fn column(
        &self,
        col: Self::ColT,
    ) -> Result<impl Iterator<Item = (Self::CoefficientField, Self::RowT)>, BifilError> {
        let id = self.tree.node_of_ordinal(col)?;
        let vertices = self.tree.vertices_of(id);
        if vertices.len() == 1 {
            return Ok(Vec::new().into_iter());
        }
        let mut entries = Vec::with_capacity(vertices.len());
        let mut face = Vec::with_capacity(vertices.len() - 1);
        for i in 0..vertices.len() {
            face.clear();
            face.extend(
                vertices
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, &v)| v),
            );
            // Face closure guarantees the face is present
            let face_id = self
                .tree
                .find_node(&face)
                .ok_or(BifilError::NotInCodomain { ordinal: col })?;
            entries.push((CF::parity(i), self.tree.node(face_id).ordinal));
        }
        Ok(entries.into_iter())
    }
}

// ====== Sliced matrices ======================

/// A matrix extracted at some multi-index, together with its local-to-global translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceMatrix<CF: NonZeroCoefficient> {
    pub matrix: SparseMatrix<CF>,
    /// `rows[i]` is the global index of the simplex standing for local row `i`.
    pub rows: Vec<usize>,
    /// `cols[j]` is the global index of the simplex standing for local column `j`.
    /// For merge and split matrices a simplex can appear twice, once per summand.
    pub cols: Vec<usize>,
    /// Number of leading columns belonging to the first summand `B`.
    /// Equal to `cols.len()` for boundary matrices.
    pub first_block: usize,
}

impl<CF: NonZeroCoefficient> SliceMatrix<CF> {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.cols.len()
    }

    /// Global indices of the columns of the second summand `C`.
    pub fn second_block(&self) -> &[usize] {
        &self.cols[self.first_block..]
    }
}

fn local_order(globals: &[usize]) -> FxHashMap<usize, usize> {
    globals
        .iter()
        .enumerate()
        .map(|(local, &global)| (global, local))
        .collect()
}

/// Inclusion columns: each simplex of `domain` maps to its own row in `codomain`, or to zero if it is absent there.
fn inclusion_columns<CF: NonZeroCoefficient>(
    matrix: &mut SparseMatrix<CF>,
    domain: &[usize],
    codomain_order: &FxHashMap<usize, usize>,
    require_present: bool,
) -> Result<(), BifilError> {
    for &ordinal in domain {
        match codomain_order.get(&ordinal) {
            Some(&row) => matrix.push_column([(CF::one(), row)])?,
            None if require_present => return Err(BifilError::NotInCodomain { ordinal }),
            None => matrix.push_column(iter::empty())?,
        };
    }
    Ok(())
}

impl SimplexTree {
    pub fn boundary_oracle<CF: NonZeroCoefficient>(&self) -> BoundaryOracle<'_, CF> {
        BoundaryOracle {
            tree: self,
            phantom: PhantomData,
        }
    }

    /// Live `dim`-simplices at `grade`, where `None` stands for a grade below zero (the empty complex).
    fn complex_at(&self, dim: usize, grade: Option<MultiIndex>) -> Result<Vec<usize>, BifilError> {
        match grade {
            Some(grade) => self.simplices_at(dim, grade),
            None => Ok(vec![]),
        }
    }

    /// Boundary matrix from `dim`-simplices to `(dim-1)`-simplices, restricted to the complex at `(time, dist)`.
    ///
    /// Rows and columns are ordered by global index.
    /// Fails if the ordinals are stale or either index is not a registered grade.
    /// A dimension with no simplices yields a matrix with no columns.
    pub fn get_boundary_mx<CF: NonZeroCoefficient>(
        &self,
        time: usize,
        dist: usize,
        dim: usize,
    ) -> Result<SliceMatrix<CF>, BifilError> {
        self.ensure_current()?;
        let grade = MultiIndex::new(time, dist);
        self.check_grade(grade)?;

        let cofaces = self.simplices_at(dim, grade)?;
        let faces = match dim.checked_sub(1) {
            Some(face_dim) => self.simplices_at(face_dim, grade)?,
            None => vec![],
        };
        let face_order = local_order(&faces);
        let mut slice = self.get_boundary_mx_with_orders(&cofaces, &face_order)?;
        // Same order, but skip re-deriving it from the map
        slice.rows = faces;
        trace!(
            "boundary matrix at {grade} in dim {dim}: {} x {}",
            slice.n_rows(),
            slice.n_cols()
        );
        Ok(slice)
    }

    /// Boundary matrix with caller supplied orders.
    ///
    /// Column `j` is the boundary of the simplex with global index `coface_global[j]`.
    /// Each face with global index `g` lands in row `face_order[g]`, so `face_order` must be a bijection onto `0..face_order.len()`
    /// and must cover every face of every coface.
    pub fn get_boundary_mx_with_orders<CF: NonZeroCoefficient>(
        &self,
        coface_global: &[usize],
        face_order: &FxHashMap<usize, usize>,
    ) -> Result<SliceMatrix<CF>, BifilError> {
        self.ensure_current()?;

        let n_rows = face_order.len();
        let mut rows = vec![usize::MAX; n_rows];
        for (&global, &local) in face_order {
            match rows.get_mut(local) {
                Some(slot) if *slot == usize::MAX => *slot = global,
                _ => {
                    return Err(BifilError::InvalidParameter {
                        message: format!(
                            "face order sends {global} to {local}, which is not a free position below {n_rows}"
                        ),
                    })
                }
            }
        }

        let mut dim = None;
        for &coface in coface_global {
            let coface_dim = self.get_simplex_data(coface)?.dim;
            if *dim.get_or_insert(coface_dim) != coface_dim {
                return Err(BifilError::CofaceDimensionMismatch);
            }
        }

        let oracle = self.boundary_oracle::<CF>();
        let mut matrix = SparseMatrix::new(n_rows, 0);
        for &coface in coface_global {
            let column = oracle
                .column(coface)?
                .map(|(coeff, face)| {
                    face_order
                        .get(&face)
                        .map(|&row| (coeff, row))
                        .ok_or(BifilError::FaceNotInOrder { ordinal: face })
                })
                .collect::<Result<Vec<_>, _>>()?;
            matrix.push_column(column)?;
        }

        Ok(SliceMatrix {
            matrix,
            rows,
            cols: coface_global.to_vec(),
            first_block: coface_global.len(),
        })
    }

    /// Matrix of the map `B ⊕ C -> D` induced by inclusions of `dim`-simplices, where
    /// `D` is the complex at `(time, dist)`, `B` at `(time - 1, dist)` and `C` at `(time, dist - 1)`.
    ///
    /// Rows enumerate `D`, columns enumerate `B` then `C`.
    /// A simplex lying in both `B` and `C` gives two columns with their entry in the same row.
    pub fn get_merge_mx<CF: NonZeroCoefficient>(
        &self,
        time: usize,
        dist: usize,
        dim: usize,
    ) -> Result<SliceMatrix<CF>, BifilError> {
        self.ensure_current()?;
        let grade = MultiIndex::new(time, dist);
        self.check_grade(grade)?;

        let simplices_b = self.complex_at(dim, grade.prev_time())?;
        let simplices_c = self.complex_at(dim, grade.prev_dist())?;
        let simplices_d = self.simplices_at(dim, grade)?;

        let order_d = local_order(&simplices_d);
        let mut matrix = SparseMatrix::new(simplices_d.len(), 0);
        inclusion_columns(&mut matrix, &simplices_b, &order_d, true)?;
        inclusion_columns(&mut matrix, &simplices_c, &order_d, true)?;
        trace!(
            "merge matrix at {grade} in dim {dim}: {} + {} -> {}",
            simplices_b.len(),
            simplices_c.len(),
            simplices_d.len()
        );

        let first_block = simplices_b.len();
        let mut cols = simplices_b;
        cols.extend(simplices_c);
        Ok(SliceMatrix {
            matrix,
            rows: simplices_d,
            cols,
            first_block,
        })
    }

    /// Matrix relating `A` to `B ⊕ C` for `dim`-simplices, where
    /// `A` is the complex at `(time - 1, dist - 1)`, `B` at `(time - 1, dist)` and `C` at `(time, dist - 1)`.
    ///
    /// Rows enumerate `A`, columns enumerate `B` then `C`; the entry is one exactly where the column's simplex is the row's simplex.
    /// This is the transpose of the diagonal inclusion `A -> B ⊕ C`.
    pub fn get_split_mx<CF: NonZeroCoefficient>(
        &self,
        time: usize,
        dist: usize,
        dim: usize,
    ) -> Result<SliceMatrix<CF>, BifilError> {
        self.ensure_current()?;
        let grade = MultiIndex::new(time, dist);
        self.check_grade(grade)?;

        let simplices_a = self.complex_at(dim, grade.prev_time().and_then(MultiIndex::prev_dist))?;
        let simplices_b = self.complex_at(dim, grade.prev_time())?;
        let simplices_c = self.complex_at(dim, grade.prev_dist())?;

        let order_a = local_order(&simplices_a);
        let mut matrix = SparseMatrix::new(simplices_a.len(), 0);
        inclusion_columns(&mut matrix, &simplices_b, &order_a, false)?;
        inclusion_columns(&mut matrix, &simplices_c, &order_a, false)?;
        trace!(
            "split matrix at {grade} in dim {dim}: {} -> {} + {}",
            simplices_a.len(),
            simplices_b.len(),
            simplices_c.len()
        );

        let first_block = simplices_b.len();
        let mut cols = simplices_b;
        cols.extend(simplices_c);
        Ok(SliceMatrix {
            matrix,
            rows: simplices_a,
            cols,
            first_block,
        })
    }
}
