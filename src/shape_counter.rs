//! Counts occurrences of distinct `(hash, weight)` shapes across a tree
//! (spec.md §4.B), used by the top-down matcher to tell whether a subtree
//! is unique or has duplicates elsewhere in the same tree.

use rustc_hash::FxHashMap;

use crate::tree::AstNode;

pub struct ShapeCounter {
    counts: FxHashMap<(u64, usize), usize>,
}

impl ShapeCounter {
    pub fn build(root: &AstNode) -> Self {
        let mut counts = FxHashMap::default();
        for node in root.dfs() {
            *counts.entry((node.hash, node.weight)).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// How many nodes in the tree this counter was built from share `node`'s shape.
    pub fn count(&self, node: &AstNode) -> usize {
        self.counts.get(&(node.hash, node.weight)).copied().unwrap_or(0)
    }

    pub fn is_unique(&self, node: &AstNode) -> bool {
        self.count(node) <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::ShapeCounter;
    use crate::test_utils::ctx;

    #[test]
    fn duplicated_subtrees_are_counted() {
        let ctx = ctx();
        let tree = ctx.parse_python("a = [1, 1, 1]");
        let counter = ShapeCounter::build(tree);
        let literal_one = tree
            .dfs()
            .find(|n| n.grammar_name == "integer")
            .expect("an integer literal");
        assert!(counter.count(literal_one) >= 3);
    }

    #[test]
    fn unique_subtree_has_count_one() {
        let ctx = ctx();
        let tree = ctx.parse_python("a = 1");
        let counter = ShapeCounter::build(tree);
        assert!(counter.is_unique(tree));
    }
}
