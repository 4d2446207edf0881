//! Sorted, deduplicated lists of filtration values.
//!
//! Births are stored in the simplex tree as positions into these lists rather than as real numbers,
//! so a multi-index is just a pair of `usize`s.

use std::fmt;

use ordered_float::NotNan;

use crate::BifilError;

/// The two filtration parameters of a bifiltration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Time,
    Dist,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Time => f.write_str("time"),
            Axis::Dist => f.write_str("dist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeList {
    axis: Axis,
    values: Vec<NotNan<f64>>,
}

/// Outcome of [`GradeList::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// The value was already present at this index.
    Existing(usize),
    /// The value was inserted at this index; every index `>=` it now refers to the next larger value.
    Inserted(usize),
}

impl Registered {
    pub fn index(self) -> usize {
        match self {
            Registered::Existing(index) | Registered::Inserted(index) => index,
        }
    }

    /// First index whose value moved up by one, if the insertion moved previously registered values.
    pub fn shift_start(self, len_after: usize) -> Option<usize> {
        match self {
            Registered::Inserted(index) if index + 1 < len_after => Some(index),
            _ => None,
        }
    }
}

impl GradeList {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            values: vec![],
        }
    }

    /// Bulk construction, sorting and deduplicating `values`.
    pub fn from_values(axis: Axis, values: impl IntoIterator<Item = NotNan<f64>>) -> Self {
        let mut values: Vec<_> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self { axis, values }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[NotNan<f64>] {
        &self.values
    }

    /// Inserts `value` if absent, keeping the list sorted.
    pub fn register(&mut self, value: NotNan<f64>) -> Registered {
        match self.values.binary_search(&value) {
            Ok(index) => Registered::Existing(index),
            Err(index) => {
                self.values.insert(index, value);
                Registered::Inserted(index)
            }
        }
    }

    /// Position of `value`, or `None` if it was never registered.
    pub fn index_of(&self, value: NotNan<f64>) -> Option<usize> {
        self.values.binary_search(&value).ok()
    }

    pub fn value_of(&self, index: usize) -> Result<NotNan<f64>, BifilError> {
        self.values
            .get(index)
            .copied()
            .ok_or(BifilError::GradeOutOfRange {
                axis: self.axis,
                index,
                len: self.values.len(),
            })
    }

    /// Checks that `index` is a valid position.
    pub fn check(&self, index: usize) -> Result<(), BifilError> {
        self.value_of(index).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::NotNan;

    use super::{Axis, GradeList, Registered};
    use crate::BifilError;

    fn nn(x: f64) -> NotNan<f64> {
        NotNan::new(x).unwrap()
    }

    #[test]
    fn test_register_sorted_unique() {
        let mut grades = GradeList::new(Axis::Dist);
        assert_eq!(grades.register(nn(1.0)), Registered::Inserted(0));
        assert_eq!(grades.register(nn(3.0)), Registered::Inserted(1));
        assert_eq!(grades.register(nn(1.0)), Registered::Existing(0));
        assert_eq!(grades.register(nn(2.0)), Registered::Inserted(1));
        assert_eq!(grades.values(), &[nn(1.0), nn(2.0), nn(3.0)]);
    }

    #[test]
    fn test_shift_detection() {
        let mut grades = GradeList::from_values(Axis::Time, [nn(0.0), nn(2.0)]);
        let at_end = grades.register(nn(5.0));
        assert_eq!(at_end.shift_start(grades.len()), None);
        let in_middle = grades.register(nn(1.0));
        assert_eq!(in_middle.shift_start(grades.len()), Some(1));
        assert_eq!(grades.register(nn(1.0)).shift_start(grades.len()), None);
    }

    #[test]
    fn test_lookup_misses() {
        let grades = GradeList::from_values(Axis::Dist, [nn(1.4), nn(0.0), nn(1.0), nn(1.0)]);
        assert_eq!(grades.len(), 3);
        assert_eq!(grades.index_of(nn(1.4)), Some(2));
        assert_eq!(grades.index_of(nn(0.5)), None);
        assert_eq!(grades.value_of(1), Ok(nn(1.0)));
        assert_eq!(
            grades.value_of(3),
            Err(BifilError::GradeOutOfRange {
                axis: Axis::Dist,
                index: 3,
                len: 3
            })
        );
    }
}
