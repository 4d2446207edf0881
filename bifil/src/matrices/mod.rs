//! Column oracles for sparse matrices.
//!
//! Every matrix produced by [`extract`](crate::extract) is handed over as a [`SparseMatrix`](implementors::SparseMatrix),
//! but reduction routines only need the [`MatrixOracle`] view: a way to ask for a column and iterate over its non-zero entries.

use std::collections::BTreeMap;

use crate::{fields::NonZeroCoefficient, BifilError};

pub mod combinators;
pub mod implementors;

// ========= Traits for matrix indices =========================

pub trait BasisElement: Ord + Copy {}

impl BasisElement for usize {}

// ======== Abstract matrix oracle trait =======================

pub trait MatrixOracle {
    type CoefficientField: NonZeroCoefficient;
    type ColT: BasisElement;
    type RowT: BasisElement;

    /// Produce the non-zero entries of `col`, possibly with repeated rows that should be summed.
    /// If you are unable to produce a column, please return [`BifilError::NotInDomain`].
    fn column(
        &self,
        col: Self::ColT,
    ) -> Result<impl Iterator<Item = (Self::CoefficientField, Self::RowT)>, BifilError>;

    /// Sums repeated rows and drops entries that cancel, yielding rows in ascending order.
    fn consolidated_column(
        &self,
        col: Self::ColT,
    ) -> Result<Vec<(Self::CoefficientField, Self::RowT)>, BifilError> {
        let mut sums: BTreeMap<Self::RowT, Option<Self::CoefficientField>> = BTreeMap::new();
        for (coeff, row) in self.column(col)? {
            let entry = sums.entry(row).or_insert(None);
            *entry = coeff + *entry;
        }
        Ok(sums
            .into_iter()
            .filter_map(|(row, coeff)| Some((coeff?, row)))
            .collect())
    }

    /// Whether `col` agrees in both matrices once consolidated.
    fn eq_on_col<M2>(&self, other: &M2, col: Self::ColT) -> Result<bool, BifilError>
    where
        M2: MatrixOracle<
            CoefficientField = Self::CoefficientField,
            ColT = Self::ColT,
            RowT = Self::RowT,
        >,
    {
        Ok(self.consolidated_column(col)? == other.consolidated_column(col)?)
    }
}

// ======== Copyable handles ===================================

/// Oracles cheap enough to copy into combinators, typically references.
pub trait MatrixRef: MatrixOracle + Copy {}

impl<M> MatrixRef for M where M: MatrixOracle + Copy {}

impl<M: MatrixOracle> MatrixOracle for &M {
    type CoefficientField = M::CoefficientField;
    type ColT = M::ColT;
    type RowT = M::RowT;

    fn column(
        &self,
        col: Self::ColT,
    ) -> Result<impl Iterator<Item = (Self::CoefficientField, Self::RowT)>, BifilError> {
        (*self).column(col)
    }
}
