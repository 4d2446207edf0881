//! Vietoris–Rips bifiltrations.
//!
//! Each point carries a birth time; a simplex is born at the latest birth time among its vertices
//! and at the largest pairwise distance among its vertices.
//! Cliques are enumerated by extending each simplex with vertices of larger label,
//! so every simplex is created exactly once, directly below its largest proper prefix.

use itertools::Itertools;
use log::{debug, info};
use ordered_float::NotNan;

use crate::{
    grades::{Axis, GradeList},
    simplex_tree::{MultiIndex, NodeId, SimplexTree, ROOT},
    BifilError,
};

// ====== Distance sources =====================

/// Anything that can report the distance between two points, addressed by label.
pub trait PairwiseDistance {
    fn n_points(&self) -> usize;

    fn distance(&self, i: usize, j: usize) -> NotNan<f64>;

    /// Checks that `distance(i, j)` is defined for all `i, j < n_points()`.
    fn validate(&self) -> Result<(), BifilError> {
        Ok(())
    }
}

/// A precomputed, symmetric distance matrix.
impl PairwiseDistance for Vec<Vec<NotNan<f64>>> {
    fn n_points(&self) -> usize {
        self.len()
    }

    fn validate(&self) -> Result<(), BifilError> {
        match self.iter().position(|row| row.len() != self.len()) {
            Some(i) => Err(invalid(format!(
                "row {i} of the distance matrix has {} entries, expected {}",
                self[i].len(),
                self.len()
            ))),
            None => Ok(()),
        }
    }

    fn distance(&self, i: usize, j: usize) -> NotNan<f64> {
        self[i][j]
    }
}

impl<D: PairwiseDistance + ?Sized> PairwiseDistance for &D {
    fn n_points(&self) -> usize {
        (**self).n_points()
    }

    fn distance(&self, i: usize, j: usize) -> NotNan<f64> {
        (**self).distance(i, j)
    }

    fn validate(&self) -> Result<(), BifilError> {
        (**self).validate()
    }
}

/// Distances computed on demand from a point slice and a metric callback.
pub struct MetricDistances<'a, P, F> {
    points: &'a [P],
    metric: F,
}

impl<'a, P, F> MetricDistances<'a, P, F>
where
    F: Fn(&P, &P) -> NotNan<f64>,
{
    pub fn new(points: &'a [P], metric: F) -> Self {
        Self { points, metric }
    }
}

impl<P, F> PairwiseDistance for MetricDistances<'_, P, F>
where
    F: Fn(&P, &P) -> NotNan<f64>,
{
    fn n_points(&self) -> usize {
        self.points.len()
    }

    fn distance(&self, i: usize, j: usize) -> NotNan<f64> {
        (self.metric)(&self.points[i], &self.points[j])
    }
}

/// A point in Euclidean space that only appears from time `birth` onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BirthPoint {
    pub coords: Vec<f64>,
    pub birth: NotNan<f64>,
}

impl BirthPoint {
    pub fn new(coords: Vec<f64>, birth: NotNan<f64>) -> Self {
        Self { coords, birth }
    }
}

/// Euclidean distance between two coordinate slices of equal length.
/// Returns `None` if the result is NaN, e.g. when a coordinate is NaN.
pub fn euclidean(a: &[f64], b: &[f64]) -> Option<NotNan<f64>> {
    let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    NotNan::new(squared.sqrt()).ok()
}

// ====== Parameters ===========================

/// Parameters of a Vietoris–Rips build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RipsParams {
    /// Largest simplex dimension to construct.
    pub max_dim: usize,
    /// Pairs further apart than this are never joined by an edge.
    pub max_dist: NotNan<f64>,
    /// Points born after this time are left out.
    pub max_time: NotNan<f64>,
    /// When set, birth coordinates are rounded up to a multiple of `step` (then clamped to the bounds).
    pub step: Option<NotNan<f64>>,
}

impl Default for RipsParams {
    fn default() -> Self {
        Self {
            max_dim: 1,
            max_dist: NotNan::new(f64::INFINITY).unwrap(),
            max_time: NotNan::new(f64::INFINITY).unwrap(),
            step: None,
        }
    }
}

impl RipsParams {
    pub fn with_max_dim(mut self, max_dim: usize) -> Self {
        self.max_dim = max_dim;
        self
    }

    pub fn with_max_dist(mut self, max_dist: NotNan<f64>) -> Self {
        self.max_dist = max_dist;
        self
    }

    pub fn with_max_time(mut self, max_time: NotNan<f64>) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_step(mut self, step: NotNan<f64>) -> Self {
        self.step = Some(step);
        self
    }

    fn validate(&self) -> Result<(), BifilError> {
        if *self.max_dist < 0.0 {
            return Err(invalid(format!(
                "max_dist must be non-negative, got {}",
                self.max_dist
            )));
        }
        if *self.max_time < 0.0 {
            return Err(invalid(format!(
                "max_time must be non-negative, got {}",
                self.max_time
            )));
        }
        if let Some(step) = self.step {
            if !(*step > 0.0 && step.is_finite()) {
                return Err(invalid(format!("step must be positive and finite, got {step}")));
            }
        }
        Ok(())
    }

    /// Rounds `value` up to the grid, never past `bound`.
    fn snap(&self, value: NotNan<f64>, bound: NotNan<f64>) -> NotNan<f64> {
        let Some(step) = self.step else {
            return value;
        };
        let snapped = (*value / *step).ceil() * *step;
        // Finite inputs and a finite positive step give a finite product
        NotNan::new(snapped).map_or(value, |snapped| snapped.min(bound))
    }
}

fn invalid(message: String) -> BifilError {
    BifilError::InvalidParameter { message }
}

// ====== Builder ==============================

/// Per-build lookup tables, all in grade indices.
struct Grid {
    /// Time index of each point, `None` if the point is born after `max_time`.
    vertex_time: Vec<Option<usize>>,
    /// Dist index of each edge, `None` if it is too long or an endpoint is excluded.
    edge_dist: Vec<Vec<Option<usize>>>,
    max_dim: usize,
}

impl Grid {
    fn n_points(&self) -> usize {
        self.vertex_time.len()
    }
}

/// Builds the Vietoris–Rips bifiltration of points with the given `births` and pairwise `distances`.
///
/// Point `i` becomes vertex `i`; points born after `params.max_time` are skipped.
/// Every simplex up to `params.max_dim` whose vertices are pairwise within `params.max_dist` is stored,
/// born at the latest vertex birth and the largest edge length.
/// The returned tree is already re-indexed.
pub fn build_rips_tree<D: PairwiseDistance>(
    births: &[NotNan<f64>],
    distances: &D,
    params: &RipsParams,
) -> Result<SimplexTree, BifilError> {
    params.validate()?;
    let n_points = births.len();
    if distances.n_points() != n_points {
        return Err(invalid(format!(
            "{n_points} birth times but the distance source has {} points",
            distances.n_points()
        )));
    }
    distances.validate()?;

    // Snapped birth times of the points that make it in
    let vertex_times: Vec<Option<NotNan<f64>>> = births
        .iter()
        .map(|&birth| {
            if birth < NotNan::default() {
                Err(invalid(format!("birth times must be non-negative, got {birth}")))
            } else if birth <= params.max_time {
                Ok(Some(params.snap(birth, params.max_time)))
            } else {
                Ok(None)
            }
        })
        .collect::<Result<_, _>>()?;

    // Snapped lengths of the edges that make it in
    let mut edge_lengths = vec![vec![None; n_points]; n_points];
    if params.max_dim >= 1 {
        let eligible = (0..n_points).filter(|&i| vertex_times[i].is_some());
        for (i, j) in eligible.tuple_combinations() {
            let length = distances.distance(i, j);
            if length < NotNan::default() {
                return Err(invalid(format!(
                    "distance between {i} and {j} is negative ({length})"
                )));
            }
            if length <= params.max_dist {
                let snapped = params.snap(length, params.max_dist);
                edge_lengths[i][j] = Some(snapped);
                edge_lengths[j][i] = Some(snapped);
            }
        }
    }

    let times = GradeList::from_values(Axis::Time, vertex_times.iter().flatten().copied());
    let dists = GradeList::from_values(
        Axis::Dist,
        std::iter::once(NotNan::default()).chain(edge_lengths.iter().flatten().flatten().copied()),
    );
    debug!(
        "rips grades: {} times and {} dists over {n_points} points",
        times.len(),
        dists.len()
    );

    // Every value below was registered above, so the lookups cannot miss
    let grid = Grid {
        vertex_time: vertex_times
            .iter()
            .map(|time| time.and_then(|time| times.index_of(time)))
            .collect(),
        edge_dist: edge_lengths
            .iter()
            .map(|row| {
                row.iter()
                    .map(|length| length.and_then(|length| dists.index_of(length)))
                    .collect()
            })
            .collect(),
        max_dim: params.max_dim,
    };

    let mut tree = SimplexTree::with_grades(times, dists, Some(n_points));
    let mut simplex = Vec::with_capacity(params.max_dim.saturating_add(1).min(n_points));
    for v in 0..n_points {
        let Some(time) = grid.vertex_time[v] else {
            continue;
        };
        let birth = MultiIndex::new(time, 0);
        let node = tree.append_child(ROOT, v, birth);
        simplex.push(v);
        add_cofacets(&mut tree, &grid, &mut simplex, node, birth);
        simplex.pop();
    }
    tree.reindex();

    info!(
        "built rips bifiltration with simplex counts {:?} on a {} x {} grade grid",
        tree.simplex_counts(),
        tree.num_times(),
        tree.num_dists()
    );
    Ok(tree)
}

/// Builds the Vietoris–Rips bifiltration of points in Euclidean space.
pub fn build_rips_tree_from_points(
    points: &[BirthPoint],
    params: &RipsParams,
) -> Result<SimplexTree, BifilError> {
    if let Some(point) = points
        .iter()
        .find(|point| point.coords.len() != points[0].coords.len())
    {
        return Err(invalid(format!(
            "points have mixed dimensions {} and {}",
            points[0].coords.len(),
            point.coords.len()
        )));
    }
    if points.iter().any(|point| point.coords.iter().any(|x| !x.is_finite())) {
        return Err(invalid("point coordinates must be finite".to_string()));
    }
    let births: Vec<_> = points.iter().map(|point| point.birth).collect();
    let distances = MetricDistances::new(points, |a: &BirthPoint, b: &BirthPoint| {
        // Finite coordinates never produce NaN
        euclidean(&a.coords, &b.coords).unwrap_or_default()
    });
    build_rips_tree(&births, &distances, params)
}

/// Appends every coface of `simplex` obtained by adding vertices above its largest label, recursively.
fn add_cofacets(
    tree: &mut SimplexTree,
    grid: &Grid,
    simplex: &mut Vec<usize>,
    node: NodeId,
    birth: MultiIndex,
) {
    let prev_dimension = simplex.len() - 1;
    if prev_dimension >= grid.max_dim {
        return;
    }
    let Some(&max_element) = simplex.last() else {
        return;
    };
    for w in (max_element + 1)..grid.n_points() {
        let Some(time) = grid.vertex_time[w] else {
            continue;
        };
        // Longest new edge, or None if some new edge is missing
        let Some(dist) = simplex
            .iter()
            .map(|&u| grid.edge_dist[u][w])
            .fold_options(0, usize::max)
        else {
            continue;
        };
        let new_birth = birth.join(MultiIndex::new(time, dist));
        let child = tree.append_child(node, w, new_birth);
        simplex.push(w);
        add_cofacets(tree, grid, simplex, child, new_birth);
        simplex.pop();
    }
}
