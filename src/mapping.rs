//! A bidirectional node mapping, `M ⊆ Src × Dst` (spec.md §3, §4.B).
//!
//! Grounded on mergiraf's `matching.rs` for the two-hashmap shape, and on
//! `examples/original_source/code_diff/gumtree/utils.py`'s `NodeMapping`
//! and `subtree_dice` for the exact dice-similarity formula: the original
//! counts *distinct mapped descendants*, not weighted descendant mass
//! (mergiraf's own `Matching::dice` uses `own_weight()`-weighted mass
//! instead — a different, newer formula we deliberately do not follow
//! here, since spec.md's literal formula in §4.C is count-based; see
//! DESIGN.md).

use rustc_hash::FxHashMap;

use crate::tree::AstNode;

/// A partial one-to-one correspondence between nodes of a source tree and
/// nodes of a target tree, indexed by node id for O(1) lookup on either side.
#[derive(Debug, Default)]
pub struct Matching<'s, 't> {
    src_to_dst: FxHashMap<usize, &'t AstNode<'t>>,
    dst_to_src: FxHashMap<usize, &'s AstNode<'s>>,
}

impl<'s, 't> Matching<'s, 't> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.src_to_dst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src_to_dst.is_empty()
    }

    /// Adds `(src, dst)` to the mapping. Idempotent: re-adding an existing pair changes nothing.
    pub fn add(&mut self, src: &'s AstNode<'s>, dst: &'t AstNode<'t>) {
        self.src_to_dst.insert(src.id, dst);
        self.dst_to_src.insert(dst.id, src);
    }

    pub fn are_matched(&self, src: &AstNode<'s>, dst: &AstNode<'t>) -> bool {
        self.src_to_dst.get(&src.id).is_some_and(|d| d.id == dst.id)
    }

    pub fn get_dst(&self, src: &AstNode<'s>) -> Option<&'t AstNode<'t>> {
        self.src_to_dst.get(&src.id).copied()
    }

    pub fn get_src(&self, dst: &AstNode<'t>) -> Option<&'s AstNode<'s>> {
        self.dst_to_src.get(&dst.id).copied()
    }

    pub fn src_is_mapped(&self, src: &AstNode<'s>) -> bool {
        self.src_to_dst.contains_key(&src.id)
    }

    pub fn dst_is_mapped(&self, dst: &AstNode<'t>) -> bool {
        self.dst_to_src.contains_key(&dst.id)
    }

    /// Recursively adds `(s, t)` and every descendant pair reached by walking both subtrees
    /// positionally in lockstep. Only valid when `s.isomorphic_to(t)`.
    pub fn add_isomorphic_subtrees(&mut self, s: &'s AstNode<'s>, t: &'t AstNode<'t>) {
        self.add(s, t);
        for (cs, ct) in s.children.iter().zip(t.children.iter()) {
            self.add_isomorphic_subtrees(cs, ct);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'s AstNode<'s>, &'t AstNode<'t>)> + '_ {
        self.dst_to_src.values().map(|&s| (s, self.src_to_dst[&s.id]))
    }

    /// Dice similarity of `a` and `b` under this mapping: twice the number of `a`'s
    /// descendants whose mapped partner is a descendant of `b`, divided by the sum of
    /// the two descendant-set sizes. 1.0 when both sides have no descendants.
    pub fn dice(&self, a: &'s AstNode<'s>, b: &'t AstNode<'t>) -> f32 {
        let desc_a: Vec<_> = a.descendants().collect();
        let desc_b_ids: std::collections::HashSet<usize> = b.descendants().map(|n| n.id).collect();
        let norm = desc_a.len() + desc_b_ids.len();
        if norm == 0 {
            return 1.0;
        }
        let mapped = desc_a
            .iter()
            .filter(|n| self.get_dst(n).is_some_and(|d| desc_b_ids.contains(&d.id)))
            .count();
        2.0 * mapped as f32 / norm as f32
    }
}

#[cfg(test)]
mod tests {
    use crate::{mapping::Matching, test_utils::ctx};

    #[test]
    fn add_and_lookup_are_bidirectional() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 1");
        let mut m = Matching::new();
        m.add(a, b);
        assert!(m.are_matched(a, b));
        assert_eq!(m.get_dst(a).unwrap().id, b.id);
        assert_eq!(m.get_src(b).unwrap().id, a.id);
    }

    #[test]
    fn dice_of_fully_mapped_isomorphic_trees_is_one() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 1");
        let mut m = Matching::new();
        m.add_isomorphic_subtrees(a, b);
        assert_eq!(m.dice(a, b), 1.0);
    }

    #[test]
    fn dice_of_unmapped_trees_is_zero() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("y = 2");
        let m: Matching = Matching::new();
        assert_eq!(m.dice(a, b), 0.0);
    }
}
