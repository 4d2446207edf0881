// ======== Combinators ========================================

// ====== Product ==============================

use crate::BifilError;

use super::{MatrixOracle, MatrixRef};

/// The composite `left * right`, evaluated lazily one column at a time.
/// Columns of the product are not consolidated, see [`MatrixOracle::consolidated_column`].
pub fn product<M1: MatrixRef, M2: MatrixRef>(left: M1, right: M2) -> Product<M1, M2>
where
    M2: MatrixOracle<CoefficientField = M1::CoefficientField, RowT = M1::ColT>,
{
    Product { left, right }
}

#[derive(Clone, Copy)]
pub struct Product<M1: MatrixRef, M2: MatrixRef> {
    left: M1,
    right: M2,
}

impl<M1: MatrixRef, M2: MatrixRef> MatrixOracle for Product<M1, M2>
where
    M2: MatrixOracle<CoefficientField = M1::CoefficientField, RowT = M1::ColT>,
{
    type CoefficientField = M1::CoefficientField;

    type ColT = M2::ColT;

    type RowT = M1::RowT;

    fn column(
        &self,
        col: Self::ColT,
    ) -> Result<impl Iterator<Item = (Self::CoefficientField, Self::RowT)>, BifilError> {
        // This tells us what linear combination of columns in the left matrix
        // should be formed to yield the product column
        let right_col: Vec<_> = self.right.column(col)?.collect();
        let mut output = Vec::new();
        for (right_coeff, right_row_index) in right_col {
            let left_col = self.left.column(right_row_index)?;
            output.extend(
                left_col.map(|(left_coeff, left_row_index)| (left_coeff * right_coeff, left_row_index)),
            );
        }
        Ok(output.into_iter())
    }
}

// ====== Consolidator =========================

pub fn consolidate<M: MatrixRef>(oracle: M) -> Consolidator<M> {
    Consolidator { oracle }
}

/// Wraps an oracle so that every column comes out consolidated: each row at most once, in ascending order.
#[derive(Clone, Copy)]
pub struct Consolidator<M: MatrixRef> {
    oracle: M,
}

impl<M: MatrixRef> MatrixOracle for Consolidator<M> {
    type CoefficientField = M::CoefficientField;
    type ColT = M::ColT;
    type RowT = M::RowT;

    fn column(
        &self,
        col: Self::ColT,
    ) -> Result<impl Iterator<Item = (Self::CoefficientField, Self::RowT)>, BifilError> {
        Ok(self.oracle.consolidated_column(col)?.into_iter())
    }
}
