//! The height-priority heap used by the top-down isomorph matcher
//! (spec.md §4.B, §4.C).
//!
//! Grounded on mergiraf's `tree_matcher/priority_list.rs` for the overall
//! shape (a binary heap of entries, `push`/`peek_max`/`pop`/`open`), but
//! with the fuller deterministic tie-break spec.md (and the original
//! `examples/original_source/code_diff/gumtree/isomap.py`'s
//! `HeightPriorityHeap`, entries `(-height, hash, element_count, seed,
//! node)`) requires: `(height, hash, push_order, sibling_index)`, not
//! just `(height, source_text)` as mergiraf's simpler version does.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::tree::AstNode;

struct Entry<'a> {
    height: i32,
    hash: u64,
    push_order: u64,
    sibling_index: usize,
    node: &'a AstNode<'a>,
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key() == other.cmp_key()
    }
}
impl Eq for Entry<'_> {}
impl PartialOrd for Entry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key().cmp(&other.cmp_key())
    }
}

impl Entry<'_> {
    /// `BinaryHeap` is a max-heap; this tuple is ordered so that the greatest
    /// value is the one spec.md's `(-height, hash, push-order, sibling-index)`
    /// would sort first, i.e. the tallest node, with ties broken deterministically.
    fn cmp_key(&self) -> (i32, u64, u64, usize) {
        (self.height, self.hash, self.push_order, self.sibling_index)
    }
}

/// A height-priority heap: pops every node at the current maximum height in one go.
pub struct PriorityList<'a> {
    heap: BinaryHeap<Entry<'a>>,
    next_push_order: u64,
}

impl<'a> PriorityList<'a> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_push_order: 0,
        }
    }

    pub fn push(&mut self, node: &'a AstNode<'a>, sibling_index: usize) {
        self.heap.push(Entry {
            height: node.height,
            hash: node.hash,
            push_order: self.next_push_order,
            sibling_index,
            node,
        });
        self.next_push_order += 1;
    }

    /// The current maximum height, or 0 if the heap is empty.
    pub fn peek_max(&self) -> i32 {
        self.heap.peek().map_or(0, |e| e.height)
    }

    /// Pops every node whose height equals the current maximum.
    pub fn pop(&mut self) -> Vec<&'a AstNode<'a>> {
        let Some(max_height) = self.heap.peek().map(|e| e.height) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.height != max_height {
                break;
            }
            result.push(self.heap.pop().unwrap().node);
        }
        result
    }

    /// Pushes all direct children of `node`.
    pub fn open(&mut self, node: &'a AstNode<'a>) {
        for (i, child) in node.children.iter().enumerate() {
            self.push(child, i);
        }
    }
}

impl Default for PriorityList<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::PriorityList;
    use crate::test_utils::ctx;

    #[test]
    fn pops_in_descending_height_order() {
        let ctx = ctx();
        let tree = ctx.parse_python("if x:\n    y = 1\n");
        let mut list = PriorityList::new();
        list.push(tree, 0);
        let first_batch = list.pop();
        assert_eq!(first_batch.len(), 1);
        assert_eq!(first_batch[0].id, tree.id);
        assert_eq!(list.peek_max(), 0);
    }

    #[test]
    fn open_pushes_all_children() {
        let ctx = ctx();
        let tree = ctx.parse_python("x = 1");
        let mut list = PriorityList::new();
        list.open(tree);
        let mut popped = 0;
        while list.peek_max() > 0 {
            popped += list.pop().len();
        }
        assert_eq!(popped, tree.children.len());
    }
}
