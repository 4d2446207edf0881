// ======== Default matrix oracles =============================

use std::fmt::{self, Debug, Display};

use crate::{
    fields::{NonZeroCoefficient, Z2},
    BifilError,
};

use super::MatrixOracle;

// ====== SparseMatrix =========================

/// Column-oriented sparse matrix with a fixed number of rows.
///
/// Each column holds `(coefficient, row)` pairs with strictly increasing rows, so an entry is never repeated and never zero.
#[derive(Clone, PartialEq, Eq)]
pub struct SparseMatrix<CF: NonZeroCoefficient> {
    n_rows: usize,
    columns: Vec<Vec<(CF, usize)>>,
}

impl<CF: NonZeroCoefficient> SparseMatrix<CF> {
    /// The zero matrix of the given shape.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            columns: vec![vec![]; n_cols],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn column_entries(&self, col: usize) -> Option<&[(CF, usize)]> {
        self.columns.get(col).map(Vec::as_slice)
    }

    pub fn entry(&self, row: usize, col: usize) -> Option<CF> {
        let column = self.columns.get(col)?;
        let pos = column.binary_search_by_key(&row, |&(_, r)| r).ok()?;
        Some(column[pos].0)
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), BifilError> {
        if row >= self.n_rows || col >= self.n_cols() {
            return Err(BifilError::EntryOutOfBounds {
                row,
                col,
                n_rows: self.n_rows,
                n_cols: self.n_cols(),
            });
        }
        Ok(())
    }

    /// Overwrites entry `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, coeff: CF) -> Result<(), BifilError> {
        self.check_bounds(row, col)?;
        let column = &mut self.columns[col];
        match column.binary_search_by_key(&row, |&(_, r)| r) {
            Ok(pos) => column[pos].0 = coeff,
            Err(pos) => column.insert(pos, (coeff, row)),
        }
        Ok(())
    }

    /// Adds `coeff` to entry `(row, col)`, removing the entry if the sum is zero.
    pub fn add_to_entry(&mut self, row: usize, col: usize, coeff: CF) -> Result<(), BifilError> {
        self.check_bounds(row, col)?;
        let column = &mut self.columns[col];
        match column.binary_search_by_key(&row, |&(_, r)| r) {
            Ok(pos) => match coeff + column[pos].0 {
                Some(sum) => column[pos].0 = sum,
                None => {
                    column.remove(pos);
                }
            },
            Err(pos) => column.insert(pos, (coeff, row)),
        }
        Ok(())
    }

    /// Appends a new column built from arbitrary `(coeff, row)` pairs, summing repeated rows.
    pub fn push_column(
        &mut self,
        entries: impl IntoIterator<Item = (CF, usize)>,
    ) -> Result<usize, BifilError> {
        let col = self.columns.len();
        self.columns.push(vec![]);
        for (coeff, row) in entries {
            if let Err(err) = self.add_to_entry(row, col, coeff) {
                self.columns.pop();
                return Err(err);
            }
        }
        Ok(col)
    }

    /// Column `k` += column `j`.
    pub fn add_column(&mut self, j: usize, k: usize) -> Result<(), BifilError> {
        self.add_scaled_column(j, k, CF::one())
    }

    /// Column `k` += `scale` * column `j`.
    pub fn add_scaled_column(&mut self, j: usize, k: usize, scale: CF) -> Result<(), BifilError> {
        if j >= self.n_cols() || k >= self.n_cols() {
            return Err(BifilError::EntryOutOfBounds {
                row: 0,
                col: j.max(k),
                n_rows: self.n_rows,
                n_cols: self.n_cols(),
            });
        }
        let source = self.columns[j].clone();
        let target = std::mem::take(&mut self.columns[k]);

        // Merge two sorted columns
        let mut merged = Vec::with_capacity(source.len() + target.len());
        let mut source = source.into_iter().map(|(c, r)| (c * scale, r)).peekable();
        let mut target = target.into_iter().peekable();
        loop {
            match (source.peek(), target.peek()) {
                (Some(&(sc, sr)), Some(&(tc, tr))) => {
                    if sr < tr {
                        merged.push((sc, sr));
                        source.next();
                    } else if tr < sr {
                        merged.push((tc, tr));
                        target.next();
                    } else {
                        if let Some(sum) = sc + tc {
                            merged.push((sum, sr));
                        }
                        source.next();
                        target.next();
                    }
                }
                (Some(_), None) => merged.extend(source.by_ref()),
                (None, Some(_)) => merged.extend(target.by_ref()),
                (None, None) => break,
            }
        }
        self.columns[k] = merged;
        Ok(())
    }

    /// Row index of the lowest non-zero entry in `col`, if any.
    pub fn low(&self, col: usize) -> Option<usize> {
        self.columns.get(col)?.last().map(|&(_, row)| row)
    }
}

impl<CF: NonZeroCoefficient> MatrixOracle for SparseMatrix<CF> {
    type CoefficientField = CF;

    type ColT = usize;

    type RowT = usize;

    fn column(
        &self,
        col: Self::ColT,
    ) -> Result<impl Iterator<Item = (Self::CoefficientField, Self::RowT)>, BifilError> {
        Ok(self
            .columns
            .get(col)
            .ok_or(BifilError::NotInDomain)?
            .iter()
            .copied())
    }
}

impl<CF: NonZeroCoefficient> Debug for SparseMatrix<CF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMatrix")
            .field("n_rows", &self.n_rows)
            .field("columns", &self.columns)
            .finish()
    }
}

/// Dense grid of representatives, one row per line.
impl<CF: NonZeroCoefficient> Display for SparseMatrix<CF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.n_rows == 0 || self.columns.is_empty() {
            return writeln!(
                f,
                "(empty matrix: {} rows by {} columns)",
                self.n_rows,
                self.n_cols()
            );
        }
        let mut grid = vec![vec![0_i64; self.n_cols()]; self.n_rows];
        for (col, entries) in self.columns.iter().enumerate() {
            for &(coeff, row) in entries {
                grid[row][col] = coeff.representative();
            }
        }
        for row in grid {
            write!(f, "|")?;
            for value in row {
                write!(f, " {value:>2}")?;
            }
            writeln!(f, " |")?;
        }
        Ok(())
    }
}

/// Builds a Z2 matrix from the row indices of each column.
/// A row listed twice in the same column cancels, and rows must lie below `n_rows`.
#[allow(non_snake_case)]
pub fn simple_Z2_matrix(
    n_rows: usize,
    cols: Vec<Vec<usize>>,
) -> Result<SparseMatrix<Z2>, BifilError> {
    let mut matrix = SparseMatrix::new(n_rows, 0);
    for col in cols {
        matrix.push_column(col.into_iter().map(|row| (Z2::one(), row)))?;
    }
    Ok(matrix)
}
