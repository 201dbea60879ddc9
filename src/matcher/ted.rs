//! A minimal-edit-distance refinement over already-truncated candidate subtrees, used by the
//! bottom-up matcher to recover node-level matches inside a matched container (spec.md §4.D).
//!
//! Grounded on mergiraf's `tree_matcher.rs`, which wraps `AstNode` in a small owned tree
//! (`TEDTree`) implementing the `tree_edit_distance` crate's `Node`/`Tree` traits, runs
//! `tree_edit_distance::diff`, and walks the resulting edit script back into node pairs
//! (`convert_tree_edits_to_matches`). Already-matched descendants are stripped to leaves first,
//! exactly as mergiraf's `strip_matched_subtrees` does, so the edit distance computed here is
//! over the part of the subtree the top-down phase left unmatched.

use tree_edit_distance::{diff, Edit};

use crate::{mapping::Matching, tree::AstNode};

/// A copy of part of a tree for `tree_edit_distance` to walk: subtrees already claimed by the
/// mapping are stripped down to a single leaf, `matched_to_id` recording what they were claimed
/// by (so the comparison never re-proposes a pair that conflicts with an existing match).
struct Stripped<'a> {
    node: &'a AstNode<'a>,
    matched_to_id: Option<usize>,
    children: Vec<Stripped<'a>>,
    weight: u64,
}

fn strip<'a>(node: &'a AstNode<'a>, is_src: bool, mapping: &Matching) -> Stripped<'a> {
    let matched = if is_src { mapping.get_dst(node) } else { mapping.get_src(node) };
    let children = if matched.is_some() {
        Vec::new()
    } else {
        node.children.iter().map(|c| strip(c, is_src, mapping)).collect()
    };
    let weight = matched.map_or(1, |m| m.weight as u64);
    Stripped { node, matched_to_id: matched.map(|m| m.id), children, weight }
}

impl<'a> tree_edit_distance::Node for Stripped<'a> {
    type Kind = (&'static str, Option<&'a str>, Option<usize>);

    fn kind(&self) -> Self::Kind {
        let leaf_source = if self.children.is_empty() { Some(self.node.source) } else { None };
        // the leaf source and matched-partner id both narrow `kind` equality so that a leaf
        // only equates to a leaf with the same text, and a claimed node only equates to its
        // own partner, never to an unrelated node that merely shares a grammar type.
        (self.node.grammar_name, leaf_source, self.matched_to_id)
    }

    type Weight = u64;
    fn weight(&self) -> Self::Weight {
        self.weight
    }
}

impl tree_edit_distance::Tree for Stripped<'_> {
    type Children<'c>
        = std::slice::Iter<'c, Self>
    where
        Self: 'c;

    fn children(&self) -> Self::Children<'_> {
        self.children.iter()
    }
}

/// Runs APTED-style minimal edit matching between the unmatched parts of `src` and `dst`,
/// adding every resulting pair whose grammar types agree and whose endpoints are still
/// unclaimed on both sides.
pub fn refine<'s, 't>(src: &'s AstNode<'s>, dst: &'t AstNode<'t>, mapping: &mut Matching<'s, 't>) {
    let src_stripped = strip(src, true, mapping);
    let dst_stripped = strip(dst, false, mapping);
    let (edits, _cost) = diff(&src_stripped, &dst_stripped);

    let left_nodes = [src_stripped];
    let right_nodes = [dst_stripped];
    collect(&left_nodes, &right_nodes, &edits, mapping);
}

fn collect<'s, 't>(left_nodes: &[Stripped<'s>], right_nodes: &[Stripped<'t>], edits: &[Edit], mapping: &mut Matching<'s, 't>) {
    let mut left_iter = left_nodes.iter();
    let mut right_iter = right_nodes.iter();
    let mut left_cursor = left_iter.next();
    let mut right_cursor = right_iter.next();

    for edit in edits {
        match edit {
            Edit::Replace(child_edits) => {
                let (Some(l), Some(r)) = (left_cursor, right_cursor) else {
                    break;
                };
                if l.node.grammar_name == r.node.grammar_name && !mapping.src_is_mapped(l.node) && !mapping.dst_is_mapped(r.node) {
                    mapping.add(l.node, r.node);
                }
                collect(&l.children, &r.children, child_edits, mapping);
                left_cursor = left_iter.next();
                right_cursor = right_iter.next();
            }
            Edit::Insert => right_cursor = right_iter.next(),
            Edit::Remove => left_cursor = left_iter.next(),
        }
    }
}
