//! The bifiltered simplex tree.
//!
//! Every simplex `{v_0 < v_1 < ... < v_k}` is stored as the node reached from the root by following the labels `v_0, v_1, ..., v_k`.
//! Nodes live in an arena and refer to their parent and children by [`NodeId`].
//! The tree keeps two invariants:
//! * **Face closure** - every face of a stored simplex is stored, and is born no later than the simplex.
//! * **Indexing** - after [`SimplexTree::reindex`], the global indices (ordinals) are exactly `0..num_simplices()` and increase with dimension.
//!
//! Any mutation marks the ordinals stale; queries that hand out ordinals refuse to run until the tree is re-indexed.

mod display;
mod indexing;
mod node;

use itertools::Itertools;
use log::trace;
use ordered_float::NotNan;

use crate::{
    grades::{Axis, GradeList},
    BifilError,
};

pub use node::MultiIndex;
pub(crate) use node::{Node, NodeId, ROOT};

/// Dimension and birth of a single simplex, see [`SimplexTree::get_simplex_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplexData {
    pub dim: usize,
    pub birth: MultiIndex,
}

impl SimplexData {
    pub fn time(&self) -> usize {
        self.birth.time
    }

    pub fn dist(&self) -> usize {
        self.birth.dist
    }
}

#[derive(Debug, Clone)]
pub struct SimplexTree {
    nodes: Vec<Node>,
    times: GradeList,
    dists: GradeList,
    by_ordinal: Vec<NodeId>,
    stale: bool,
    vertex_bound: Option<usize>,
}

impl Default for SimplexTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SimplexTree {
    /// An empty tree accepting any `usize` vertex label.
    pub fn new() -> Self {
        Self::with_grades(
            GradeList::new(Axis::Time),
            GradeList::new(Axis::Dist),
            None,
        )
    }

    /// An empty tree only accepting vertex labels in `0..n_vertices`.
    pub fn with_vertex_bound(n_vertices: usize) -> Self {
        Self::with_grades(
            GradeList::new(Axis::Time),
            GradeList::new(Axis::Dist),
            Some(n_vertices),
        )
    }

    pub(crate) fn with_grades(
        times: GradeList,
        dists: GradeList,
        vertex_bound: Option<usize>,
    ) -> Self {
        Self {
            nodes: vec![Node::root()],
            times,
            dists,
            by_ordinal: vec![],
            stale: false,
            vertex_bound,
        }
    }

    // ======== Grade registry ===================================

    fn grades(&self, axis: Axis) -> &GradeList {
        match axis {
            Axis::Time => &self.times,
            Axis::Dist => &self.dists,
        }
    }

    /// Registers a filtration value on `axis` and returns its index.
    ///
    /// If the value lands in the middle of the list, every stored birth index on that axis at or above it is shifted up,
    /// so stored births keep denoting the same real value, and the ordinals are marked stale.
    pub fn register(&mut self, axis: Axis, value: NotNan<f64>) -> usize {
        let registered = match axis {
            Axis::Time => self.times.register(value),
            Axis::Dist => self.dists.register(value),
        };
        let len_after = self.grades(axis).len();
        if let Some(from) = registered.shift_start(len_after) {
            trace!("registering {value} on {axis} shifts births from index {from}");
            for node in self.nodes.iter_mut().skip(1) {
                let coord = match axis {
                    Axis::Time => &mut node.birth.time,
                    Axis::Dist => &mut node.birth.dist,
                };
                if *coord >= from {
                    *coord += 1;
                }
            }
            self.stale = true;
        }
        registered.index()
    }

    pub fn register_time(&mut self, value: NotNan<f64>) -> usize {
        self.register(Axis::Time, value)
    }

    pub fn register_dist(&mut self, value: NotNan<f64>) -> usize {
        self.register(Axis::Dist, value)
    }

    /// Index of a time value, or `None` if it was never registered.
    pub fn time_index(&self, value: NotNan<f64>) -> Option<usize> {
        self.times.index_of(value)
    }

    pub fn get_time(&self, index: usize) -> Result<NotNan<f64>, BifilError> {
        self.times.value_of(index)
    }

    /// Index of a distance value, or `None` if it was never registered.
    pub fn dist_index(&self, value: NotNan<f64>) -> Option<usize> {
        self.dists.index_of(value)
    }

    pub fn get_dist(&self, index: usize) -> Result<NotNan<f64>, BifilError> {
        self.dists.value_of(index)
    }

    pub fn num_times(&self) -> usize {
        self.times.len()
    }

    pub fn num_dists(&self) -> usize {
        self.dists.len()
    }

    pub fn times(&self) -> &GradeList {
        &self.times
    }

    pub fn dists(&self) -> &GradeList {
        &self.dists
    }

    /// Checks that both coordinates of `grade` are registered positions.
    pub fn check_grade(&self, grade: MultiIndex) -> Result<(), BifilError> {
        self.times.check(grade.time)?;
        self.dists.check(grade.dist)
    }

    // ======== Insertion ========================================

    /// Sorts `vertices` and rejects empty sets, repeated labels and labels outside the vertex bound.
    fn validate_simplex(&self, vertices: &[usize]) -> Result<Vec<usize>, BifilError> {
        if vertices.is_empty() {
            return Err(BifilError::EmptySimplex);
        }
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        if let Some((&vertex, _)) = sorted.iter().tuple_windows().find(|(a, b)| a == b) {
            return Err(BifilError::DuplicateVertex { vertex });
        }
        if let Some(bound) = self.vertex_bound {
            if let Some(&vertex) = sorted.last().filter(|&&v| v >= bound) {
                return Err(BifilError::VertexOutOfRange { vertex, bound });
            }
        }
        Ok(sorted)
    }

    /// Adds the simplex on `vertices` (in any order) born at `(time, dist)`, together with all of its faces.
    ///
    /// Every face, the simplex included, ends up born at the coordinatewise minimum of its previous birth (if any) and `(time, dist)`.
    /// Input is validated before the tree is touched, so on error the tree is unchanged.
    /// Both indices must already be registered, see [`SimplexTree::register`].
    ///
    /// The ordinals are marked stale; call [`SimplexTree::reindex`] once after a batch of insertions.
    pub fn insert(&mut self, vertices: &[usize], time: usize, dist: usize) -> Result<(), BifilError> {
        let simplex = self.validate_simplex(vertices)?;
        let birth = MultiIndex::new(time, dist);
        self.check_grade(birth)?;

        trace!("inserting {simplex:?} at {birth}");
        // Faces in order of increasing size, so every prefix of a face is already present
        for size in 1..=simplex.len() {
            for face in simplex.iter().copied().combinations(size) {
                self.descend_or_create(&face, birth);
            }
        }
        self.stale = true;
        Ok(())
    }

    /// Walks the label path `face`, creating missing nodes, and lowers the birth of the final node to meet `birth`.
    fn descend_or_create(&mut self, face: &[usize], birth: MultiIndex) -> NodeId {
        let mut current = ROOT;
        for &label in face {
            current = match self.child_position(current, label) {
                Ok(pos) => self.nodes[current.0].children[pos],
                Err(pos) => self.create_child(current, pos, label, birth),
            };
        }
        let node = &mut self.nodes[current.0];
        node.birth = node.birth.meet(birth);
        current
    }

    fn create_child(&mut self, parent: NodeId, pos: usize, label: usize, birth: MultiIndex) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(Node {
            label,
            birth,
            ordinal: usize::MAX,
            depth,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.insert(pos, id);
        id
    }

    /// Appends a child with a label larger than all existing children of `parent`.
    /// Used by builders that generate cofaces in increasing label order and already guarantee face closure.
    pub(crate) fn append_child(&mut self, parent: NodeId, label: usize, birth: MultiIndex) -> NodeId {
        debug_assert!(self.nodes[parent.0]
            .children
            .last()
            .map_or(true, |&last| self.nodes[last.0].label < label));
        let pos = self.nodes[parent.0].children.len();
        self.stale = true;
        self.create_child(parent, pos, label, birth)
    }

    // ======== Lookup ===========================================

    fn child_position(&self, parent: NodeId, label: usize) -> Result<usize, usize> {
        self.nodes[parent.0]
            .children
            .binary_search_by_key(&label, |&child| self.nodes[child.0].label)
    }

    pub(crate) fn child(&self, parent: NodeId, label: usize) -> Option<NodeId> {
        let pos = self.child_position(parent, label).ok()?;
        Some(self.nodes[parent.0].children[pos])
    }

    /// Follows a sorted label path from the root.
    pub(crate) fn find_node(&self, sorted_vertices: &[usize]) -> Option<NodeId> {
        if sorted_vertices.is_empty() {
            return None;
        }
        sorted_vertices
            .iter()
            .try_fold(ROOT, |node, &label| self.child(node, label))
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Vertex labels of a node, in increasing order.
    pub(crate) fn vertices_of(&self, id: NodeId) -> Vec<usize> {
        let mut vertices = Vec::with_capacity(self.nodes[id.0].depth);
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            vertices.push(self.nodes[current.0].label);
            current = parent;
        }
        vertices.reverse();
        vertices
    }

    pub(crate) fn ensure_current(&self) -> Result<(), BifilError> {
        if self.stale {
            Err(BifilError::StaleIndices)
        } else {
            Ok(())
        }
    }

    pub(crate) fn node_of_ordinal(&self, ordinal: usize) -> Result<NodeId, BifilError> {
        self.ensure_current()?;
        self.by_ordinal
            .get(ordinal)
            .copied()
            .ok_or(BifilError::UnknownOrdinal { ordinal })
    }

    /// Global index of the simplex on `vertices`, or `None` if it is not in the tree.
    /// Fails only if the ordinals are stale.
    pub fn find_index(&self, vertices: &[usize]) -> Result<Option<usize>, BifilError> {
        self.ensure_current()?;
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        Ok(self
            .find_node(&sorted)
            .map(|id| self.nodes[id.0].ordinal))
    }

    /// Whether the simplex on `vertices` is stored, regardless of whether ordinals are current.
    pub fn contains(&self, vertices: &[usize]) -> bool {
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        self.find_node(&sorted).is_some()
    }

    /// Birth of the simplex on `vertices`, regardless of whether ordinals are current.
    pub fn birth_of(&self, vertices: &[usize]) -> Option<MultiIndex> {
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        self.find_node(&sorted).map(|id| self.nodes[id.0].birth)
    }

    /// The sorted vertex labels of the simplex with global index `ordinal`.
    pub fn find_vertices(&self, ordinal: usize) -> Result<Vec<usize>, BifilError> {
        let id = self.node_of_ordinal(ordinal)?;
        Ok(self.vertices_of(id))
    }

    pub fn get_simplex_data(&self, ordinal: usize) -> Result<SimplexData, BifilError> {
        let node = self.node(self.node_of_ordinal(ordinal)?);
        Ok(SimplexData {
            dim: node.dimension(),
            birth: node.birth,
        })
    }

    /// Global indices, in ascending order, of the `dim`-simplices born at or before `grade`.
    ///
    /// Subtrees rooted at a simplex born after `grade` are pruned, since by face closure none of their simplices exist at `grade` either.
    pub fn simplices_at(&self, dim: usize, grade: MultiIndex) -> Result<Vec<usize>, BifilError> {
        self.ensure_current()?;
        let Some(target_depth) = dim.checked_add(1) else {
            return Ok(vec![]);
        };
        let mut found = vec![];
        let mut stack: Vec<NodeId> = self.nodes[ROOT.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if !(node.birth <= grade) {
                continue;
            }
            if node.depth == target_depth {
                found.push(node.ordinal);
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found.sort_unstable();
        Ok(found)
    }

    // ======== Counts ===========================================

    pub fn num_simplices(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Dimension of the largest simplex, `None` for an empty tree.
    pub fn max_dimension(&self) -> Option<usize> {
        self.nodes.iter().skip(1).map(Node::dimension).max()
    }

    /// Number of simplices in each dimension, starting from vertices.
    pub fn simplex_counts(&self) -> Vec<usize> {
        let mut counts = vec![];
        for node in self.nodes.iter().skip(1) {
            let dim = node.dimension();
            if counts.len() <= dim {
                counts.resize(dim + 1, 0);
            }
            counts[dim] += 1;
        }
        counts
    }

    /// Whether ordinals need to be recomputed by [`SimplexTree::reindex`].
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::NotNan;

    use super::{MultiIndex, SimplexTree};
    use crate::BifilError;

    fn nn(x: f64) -> NotNan<f64> {
        NotNan::new(x).unwrap()
    }

    /// A tree with times `0..n_times` and distances `0..n_dists` registered.
    fn grid_tree(n_times: usize, n_dists: usize) -> SimplexTree {
        let mut tree = SimplexTree::new();
        for t in 0..n_times {
            tree.register_time(nn(t as f64));
        }
        for d in 0..n_dists {
            tree.register_dist(nn(d as f64));
        }
        tree
    }

    #[test]
    fn test_insert_closes_faces() {
        let mut tree = grid_tree(3, 6);
        tree.insert(&[3, 1, 2], 2, 5).unwrap();
        assert_eq!(tree.num_simplices(), 7);
        assert_eq!(tree.simplex_counts(), vec![3, 3, 1]);
        for face in [vec![1], vec![2], vec![3], vec![1, 2], vec![1, 3], vec![2, 3]] {
            assert_eq!(tree.birth_of(&face), Some(MultiIndex::new(2, 5)));
        }
    }

    #[test]
    fn test_existing_face_keeps_earlier_birth() {
        let mut tree = grid_tree(3, 6);
        tree.insert(&[1, 2], 1, 3).unwrap();
        tree.insert(&[1, 2, 3], 2, 5).unwrap();
        assert_eq!(tree.birth_of(&[1, 2]), Some(MultiIndex::new(1, 3)));
        assert_eq!(tree.birth_of(&[1]), Some(MultiIndex::new(1, 3)));
        assert_eq!(tree.birth_of(&[3]), Some(MultiIndex::new(2, 5)));
        assert_eq!(tree.birth_of(&[1, 2, 3]), Some(MultiIndex::new(2, 5)));
    }

    #[test]
    fn test_reinsertion_lowers_to_meet() {
        let mut tree = grid_tree(4, 4);
        tree.insert(&[0, 1], 2, 1).unwrap();
        tree.insert(&[0, 1], 1, 3).unwrap();
        assert_eq!(tree.birth_of(&[0, 1]), Some(MultiIndex::new(1, 1)));
        assert_eq!(tree.num_simplices(), 3);
    }

    #[test]
    fn test_malformed_input_leaves_tree_untouched() {
        let mut tree = SimplexTree::with_vertex_bound(4);
        tree.register_time(nn(0.0));
        tree.register_dist(nn(0.0));
        tree.insert(&[0, 1], 0, 0).unwrap();
        tree.reindex();

        assert_eq!(tree.insert(&[], 0, 0), Err(BifilError::EmptySimplex));
        assert_eq!(
            tree.insert(&[2, 3, 2], 0, 0),
            Err(BifilError::DuplicateVertex { vertex: 2 })
        );
        assert_eq!(
            tree.insert(&[2, 4], 0, 0),
            Err(BifilError::VertexOutOfRange { vertex: 4, bound: 4 })
        );
        assert!(matches!(
            tree.insert(&[2, 3], 1, 0),
            Err(BifilError::GradeOutOfRange { index: 1, .. })
        ));
        assert_eq!(tree.num_simplices(), 3);
        assert!(!tree.is_stale());
    }

    #[test]
    fn test_find_index_and_vertices() {
        let mut tree = grid_tree(1, 1);
        tree.insert(&[0, 1, 2], 0, 0).unwrap();
        tree.insert(&[2, 3], 0, 0).unwrap();
        assert_eq!(tree.find_index(&[0]), Err(BifilError::StaleIndices));
        tree.reindex();

        assert_eq!(tree.find_index(&[0]).unwrap(), Some(0));
        assert_eq!(tree.find_index(&[3]).unwrap(), Some(3));
        assert_eq!(tree.find_index(&[1, 0]).unwrap(), Some(4));
        assert_eq!(tree.find_index(&[0, 1, 2]).unwrap(), Some(8));
        assert_eq!(tree.find_index(&[0, 3]).unwrap(), None);
        assert_eq!(tree.find_index(&[]).unwrap(), None);

        assert_eq!(tree.find_vertices(7).unwrap(), vec![2, 3]);
        assert_eq!(
            tree.find_vertices(9),
            Err(BifilError::UnknownOrdinal { ordinal: 9 })
        );
        let data = tree.get_simplex_data(8).unwrap();
        assert_eq!(data.dim, 2);
        assert_eq!(data.birth, MultiIndex::new(0, 0));
    }

    #[test]
    fn test_simplices_at_prunes_late_subtrees() {
        let mut tree = grid_tree(3, 3);
        tree.insert(&[0, 1], 0, 1).unwrap();
        tree.insert(&[1, 2], 1, 0).unwrap();
        tree.insert(&[0, 2], 2, 2).unwrap();
        tree.insert(&[0, 1, 2], 2, 2).unwrap();
        tree.reindex();

        let edge = |v: &[usize]| tree.find_index(v).unwrap().unwrap();
        assert_eq!(
            tree.simplices_at(1, MultiIndex::new(0, 1)).unwrap(),
            vec![edge(&[0, 1])]
        );
        assert_eq!(
            tree.simplices_at(1, MultiIndex::new(1, 1)).unwrap(),
            vec![edge(&[0, 1]), edge(&[1, 2])]
        );
        assert!(tree.simplices_at(2, MultiIndex::new(2, 1)).unwrap().is_empty());
        assert_eq!(tree.simplices_at(2, MultiIndex::new(2, 2)).unwrap().len(), 1);
        assert_eq!(tree.simplices_at(0, MultiIndex::new(0, 0)).unwrap().len(), 1);
        assert_eq!(tree.simplices_at(0, MultiIndex::new(0, 1)).unwrap().len(), 2);
        assert!(tree.simplices_at(7, MultiIndex::new(2, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_register_in_middle_shifts_births() {
        let mut tree = SimplexTree::new();
        tree.register_time(nn(0.0));
        tree.register_dist(nn(0.0));
        tree.register_dist(nn(2.0));
        tree.insert(&[0], 0, 0).unwrap();
        tree.insert(&[1], 0, 0).unwrap();
        tree.insert(&[0, 1], 0, 1).unwrap();
        tree.reindex();

        // Appending at the end shifts nothing
        assert_eq!(tree.register_dist(nn(3.0)), 2);
        assert!(!tree.is_stale());
        assert_eq!(tree.birth_of(&[0, 1]), Some(MultiIndex::new(0, 1)));

        // Inserting below 2.0 moves it to index 2
        assert_eq!(tree.register_dist(nn(1.0)), 1);
        assert!(tree.is_stale());
        assert_eq!(tree.birth_of(&[0, 1]), Some(MultiIndex::new(0, 2)));
        assert_eq!(tree.birth_of(&[0]), Some(MultiIndex::new(0, 0)));
        assert_eq!(tree.get_dist(2).unwrap(), nn(2.0));
        assert_eq!(tree.dist_index(nn(1.5)), None);
    }
}
