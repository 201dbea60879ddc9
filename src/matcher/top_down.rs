//! Top-down isomorph matching (spec.md §4.C), grounded on
//! `examples/original_source/code_diff/gumtree/isomap.py`'s
//! `gumtree_isomap` and mergiraf's `tree_matcher.rs` `top_down_match`
//! for the overall two-heap shape.

use std::collections::HashSet;

use log::trace;

use crate::{mapping::Matching, priority_list::PriorityList, shape_counter::ShapeCounter, tree::AstNode};

/// How much a line of difference outweighs a column of difference when picking between
/// ambiguous candidate pairs at the same dice similarity; mirrors `isomap.py`'s
/// `MAX_TOKEN_MOVER_DISTANCE`.
const MAX_TOKEN_MOVER_DISTANCE: i64 = 1000;

/// Runs the top-down phase, restarting with a lower height floor each time it produces an
/// empty mapping, down to a floor of zero (spec.md §4.C's termination rule).
pub fn top_down_match<'s, 't>(src: &'s AstNode<'s>, dst: &'t AstNode<'t>, min_height: i32) -> Matching<'s, 't> {
    let mut h_min = min_height;
    loop {
        let mapping = top_down_match_once(src, dst, h_min);
        if !mapping.is_empty() || h_min == 0 {
            return mapping;
        }
        trace!("top-down: empty mapping at min_height {h_min}, retrying at {}", h_min - 1);
        h_min -= 1;
    }
}

fn top_down_match_once<'s, 't>(src: &'s AstNode<'s>, dst: &'t AstNode<'t>, h_min: i32) -> Matching<'s, 't> {
    let cnt_src = ShapeCounter::build(src);
    let cnt_dst = ShapeCounter::build(dst);

    let mut heap_src = PriorityList::new();
    let mut heap_dst = PriorityList::new();
    heap_src.push(src, 0);
    heap_dst.push(dst, 0);

    let mut mapping = Matching::new();
    let mut candidates: Vec<(&'s AstNode<'s>, &'t AstNode<'t>)> = Vec::new();

    while std::cmp::max(heap_src.peek_max(), heap_dst.peek_max()) > h_min {
        match heap_src.peek_max().cmp(&heap_dst.peek_max()) {
            std::cmp::Ordering::Greater => {
                for n in heap_src.pop() {
                    heap_src.open(n);
                }
                continue;
            }
            std::cmp::Ordering::Less => {
                for n in heap_dst.pop() {
                    heap_dst.open(n);
                }
                continue;
            }
            std::cmp::Ordering::Equal => {}
        }

        let cs = heap_src.pop();
        let ct = heap_dst.pop();
        let mut matched_src = HashSet::new();
        let mut matched_dst = HashSet::new();

        for &s in &cs {
            for &t in &ct {
                if !s.isomorphic_to(t) {
                    continue;
                }
                if cnt_src.count(s) > 1 || cnt_dst.count(t) > 1 {
                    candidates.push((s, t));
                } else {
                    mapping.add_isomorphic_subtrees(s, t);
                }
                matched_src.insert(s.id);
                matched_dst.insert(t.id);
            }
        }

        for &s in &cs {
            if !matched_src.contains(&s.id) {
                heap_src.open(s);
            }
        }
        for &t in &ct {
            if !matched_dst.contains(&t.id) {
                heap_dst.open(t);
            }
        }
    }

    resolve_ambiguous(candidates, &mut mapping);
    mapping
}

/// Greedily resolves ambiguous (duplicated-shape) candidate pairs, preferring the pair with
/// the highest dice similarity under the mapping built so far, breaking ties by how close the
/// two nodes sit in their respective source texts (spec.md §4.C; `isomap.py`'s
/// `_source_distance` heuristic).
fn resolve_ambiguous<'s, 't>(mut candidates: Vec<(&'s AstNode<'s>, &'t AstNode<'t>)>, mapping: &mut Matching<'s, 't>) {
    candidates.sort_by(|a, b| {
        let dice_a = mapping.dice(a.0, a.1);
        let dice_b = mapping.dice(b.0, b.1);
        dice_b
            .partial_cmp(&dice_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| position_distance(b.0, b.1).cmp(&position_distance(a.0, a.1)))
    });

    let mut used_src = HashSet::new();
    let mut used_dst = HashSet::new();
    for (s, t) in candidates {
        if used_src.contains(&s.id) || used_dst.contains(&t.id) || mapping.src_is_mapped(s) || mapping.dst_is_mapped(t) {
            continue;
        }
        mapping.add_isomorphic_subtrees(s, t);
        used_src.insert(s.id);
        used_dst.insert(t.id);
    }
}

/// A non-positive number that grows towards zero as `s` and `t` sit closer together in their
/// respective texts, so that the closest pair sorts highest among ties.
fn position_distance(s: &AstNode, t: &AstNode) -> i64 {
    let line_diff = s.start_point.0 as i64 - t.end_point.0 as i64;
    let line_component = line_diff * MAX_TOKEN_MOVER_DISTANCE;
    if line_component != 0 {
        return -line_component.abs();
    }
    let col_diff = (s.start_point.1 as i64 - t.start_point.1 as i64).abs();
    -col_diff.min(MAX_TOKEN_MOVER_DISTANCE - 1)
}

#[cfg(test)]
mod tests {
    use super::top_down_match;
    use crate::test_utils::ctx;

    #[test]
    fn matches_identical_trees_completely() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1 + 2");
        let b = ctx.parse_python("x = 1 + 2");
        let mapping = top_down_match(a, b, 2);
        assert_eq!(mapping.len(), a.dfs().count());
    }

    #[test]
    fn restarts_with_lower_floor_when_trees_are_small() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 1");
        // a height floor above the whole tree's height would produce an empty match on the
        // first attempt; the restart loop must still find the full match.
        let mapping = top_down_match(a, b, a.height + 5);
        assert!(!mapping.is_empty());
    }

    #[test]
    fn does_not_match_unrelated_trees() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("def f():\n    pass\n");
        let mapping = top_down_match(a, b, 2);
        assert!(!mapping.are_matched(a, b));
    }
}
