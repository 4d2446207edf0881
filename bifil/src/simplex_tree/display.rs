use std::fmt;

use super::{NodeId, SimplexTree, ROOT};

impl SimplexTree {
    fn fmt_subtree(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        let node = &self.nodes[id.0];
        let indent = 2 * node.dimension();
        write!(
            f,
            "{:indent$}[{}] birth {} dim {}",
            "",
            node.label,
            node.birth,
            node.dimension()
        )?;
        if self.stale {
            writeln!(f)?;
        } else {
            writeln!(f, " index {}", node.ordinal)?;
        }
        for &child in &node.children {
            self.fmt_subtree(f, child)?;
        }
        Ok(())
    }
}

/// Human readable dump for debugging, one simplex per line, indented by dimension.
/// Not a stable format.
impl fmt::Display for SimplexTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simplex tree: {} simplices, {} times, {} dists{}",
            self.num_simplices(),
            self.num_times(),
            self.num_dists(),
            if self.stale { " (stale indices)" } else { "" }
        )?;
        for &child in &self.nodes[ROOT.0].children {
            self.fmt_subtree(f, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::NotNan;

    use crate::SimplexTree;

    #[test]
    fn test_dump() {
        let mut tree = SimplexTree::new();
        tree.register_time(NotNan::new(0.5).unwrap());
        tree.register_dist(NotNan::new(0.0).unwrap());
        tree.register_dist(NotNan::new(1.0).unwrap());
        tree.insert(&[0], 0, 0).unwrap();
        tree.insert(&[1], 0, 0).unwrap();
        tree.insert(&[0, 1], 0, 1).unwrap();

        let stale = tree.to_string();
        assert!(stale.starts_with("simplex tree: 3 simplices, 1 times, 2 dists (stale indices)\n"));

        tree.reindex();
        assert_eq!(
            tree.to_string(),
            "simplex tree: 3 simplices, 1 times, 2 dists\n\
             [0] birth (0, 0) dim 0 index 0\n  \
             [1] birth (0, 1) dim 1 index 2\n\
             [1] birth (0, 0) dim 0 index 1\n"
        );
    }
}
