use std::cmp::Ordering;
use std::fmt;

/// Birth grade of a simplex: positions into the time and distance grade lists.
///
/// Ordered coordinatewise, so two multi-indices may be incomparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MultiIndex {
    pub time: usize,
    pub dist: usize,
}

impl MultiIndex {
    pub fn new(time: usize, dist: usize) -> Self {
        Self { time, dist }
    }

    /// Coordinatewise minimum.
    pub fn meet(self, other: Self) -> Self {
        Self {
            time: self.time.min(other.time),
            dist: self.dist.min(other.dist),
        }
    }

    /// Coordinatewise maximum.
    pub fn join(self, other: Self) -> Self {
        Self {
            time: self.time.max(other.time),
            dist: self.dist.max(other.dist),
        }
    }

    /// The grade one step earlier in time, `None` below zero.
    pub fn prev_time(self) -> Option<Self> {
        Some(Self::new(self.time.checked_sub(1)?, self.dist))
    }

    /// The grade one step earlier in distance, `None` below zero.
    pub fn prev_dist(self) -> Option<Self> {
        Some(Self::new(self.time, self.dist.checked_sub(1)?))
    }
}

impl PartialOrd for MultiIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.time.cmp(&other.time), self.dist.cmp(&other.dist)) {
            (t, d) if t == d => Some(t),
            (Ordering::Equal, d) => Some(d),
            (t, Ordering::Equal) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for MultiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time, self.dist)
    }
}

impl From<(usize, usize)> for MultiIndex {
    fn from((time, dist): (usize, usize)) -> Self {
        Self { time, dist }
    }
}

/// Handle into the node arena of a [`SimplexTree`](super::SimplexTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

pub(crate) const ROOT: NodeId = NodeId(0);

/// One simplex. The vertex set is the label path from the root down to this node.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) label: usize,
    pub(crate) birth: MultiIndex,
    /// Only meaningful while the tree is not stale.
    pub(crate) ordinal: usize,
    /// Number of vertices, so `depth - 1` is the dimension. The root has depth 0.
    pub(crate) depth: usize,
    pub(crate) parent: Option<NodeId>,
    /// Sorted by label, all labels greater than this node's.
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self {
            label: usize::MAX,
            birth: MultiIndex::default(),
            ordinal: usize::MAX,
            depth: 0,
            parent: None,
            children: vec![],
        }
    }

    pub(crate) fn dimension(&self) -> usize {
        self.depth - 1
    }
}
