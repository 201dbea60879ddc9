//! Bottom-up container matching (spec.md §4.D): for every unmatched, non-leaf source node,
//! find the best-similarity unmatched destination node among the ancestors of its already
//! matched descendants, then refine the pair with minimal edit distance.
//!
//! Grounded on `examples/original_source/code_diff/gumtree/__init__.py`'s container-matching
//! pass and on mergiraf's `tree_matcher.rs` `TreeMatcher::match_trees` bottom-up loop for the
//! candidate-ancestor walk.

use log::{debug, trace};
use rustc_hash::FxHashSet;

use super::ted;
use crate::{mapping::Matching, options::DiffOptions, tree::AstNode};

pub fn run<'s, 't>(src: &'s AstNode<'s>, dst: &'t AstNode<'t>, mapping: &mut Matching<'s, 't>, opts: &DiffOptions) {
    for s in src.postorder() {
        if s.is_leaf() || mapping.src_is_mapped(s) {
            continue;
        }

        let candidates = find_candidates(s, mapping);
        let best = candidates
            .into_iter()
            .map(|t| (t, mapping.dice(s, t)))
            .filter(|(t, dice)| {
                let above_threshold = *dice > opts.min_dice;
                if !above_threshold {
                    trace!("bottom-up: rejecting candidate {} (dice {dice} <= {})", t.grammar_name, opts.min_dice);
                }
                above_threshold
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((t, dice)) = best {
            debug!("bottom-up: matched {} <-> {} (dice {dice})", s.grammar_name, t.grammar_name);
            mapping.add(s, t);
            if s.weight <= opts.max_size && t.weight <= opts.max_size {
                ted::refine(s, t, mapping);
            } else {
                debug!("bottom-up: skipping APTED refinement, subtree exceeds max_size ({} / {})", s.weight, t.weight);
            }
        } else if s.is_root() {
            // the two roots always match, regardless of similarity: there is always exactly
            // one top-level diff to report.
            mapping.add(s, dst);
            ted::refine(s, dst, mapping);
        }
    }
}

/// Destination nodes reachable by walking up from the matched partner of each descendant of
/// `s`, stopping at the destination root and at the first repeated ancestor (a node can only
/// be reached once per descendant walk, since the ancestor chain is linear).
fn find_candidates<'s, 't>(s: &'s AstNode<'s>, mapping: &Matching<'s, 't>) -> Vec<&'t AstNode<'t>> {
    let mut seen = FxHashSet::default();
    let mut candidates = Vec::new();
    for desc in s.descendants() {
        let Some(seed) = mapping.get_dst(desc) else {
            continue;
        };
        let mut ancestor = seed.parent();
        while let Some(a) = ancestor {
            if a.is_root() || !seen.insert(a.id) {
                break;
            }
            if a.grammar_name == s.grammar_name && !mapping.dst_is_mapped(a) {
                candidates.push(a);
            }
            ancestor = a.parent();
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::{mapping::Matching, matcher::top_down::top_down_match, options::DiffOptions, test_utils::ctx};

    #[test]
    fn matches_a_renamed_but_structurally_similar_function() {
        let ctx = ctx();
        let a = ctx.parse_python("def compute(x, y):\n    total = x + y\n    other = x - y\n    return total\n");
        let b = ctx.parse_python("def compute(x, y):\n    total = x + y\n    other = x * y\n    return total\n");
        let opts = DiffOptions::default();
        let mut mapping = top_down_match(a, b, opts.min_height);
        run(a, b, &mut mapping, &opts);
        let func_a = a.dfs().find(|n| n.grammar_name == "function_definition").unwrap();
        assert!(mapping.are_matched(func_a, mapping.get_dst(func_a).unwrap()));
    }

    #[test]
    fn roots_always_match() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1\n");
        let b = ctx.parse_python("y = 2\ny = 3\n");
        let opts = DiffOptions::default();
        let mut mapping: Matching = top_down_match(a, b, opts.min_height);
        run(a, b, &mut mapping, &opts);
        assert!(mapping.are_matched(a, b));
    }
}
