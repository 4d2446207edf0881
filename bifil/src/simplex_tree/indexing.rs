use log::debug;

use super::{NodeId, SimplexTree, ROOT};

impl SimplexTree {
    /// Recomputes the global index of every simplex.
    ///
    /// Vertices come first, then edges, and so on; within a dimension simplices are numbered in lexicographic order of their vertex lists.
    /// Must be called after any batch of insertions (or grade registrations that shift births) before ordinals are used again.
    pub fn reindex(&mut self) {
        let mut levels: Vec<Vec<NodeId>> = vec![];

        // Preorder traversal visits each level in lexicographic order
        let mut stack: Vec<NodeId> = self.nodes[ROOT.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            let dim = node.dimension();
            if levels.len() <= dim {
                levels.resize_with(dim + 1, Vec::new);
            }
            levels[dim].push(id);
            stack.extend(node.children.iter().rev().copied());
        }

        self.by_ordinal = levels.into_iter().flatten().collect();
        for (ordinal, id) in self.by_ordinal.iter().enumerate() {
            self.nodes[id.0].ordinal = ordinal;
        }
        self.stale = false;
        debug!("re-indexed {} simplices", self.by_ordinal.len());
    }
}
