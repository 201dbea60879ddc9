//! The Chawathe edit-script synthesizer (spec.md §3, §4.E): given a node mapping between a
//! source and a target tree, produces the ordered `Insert`/`Update`/`Move`/`Delete` script
//! that turns the source into the target.
//!
//! Grounded on `examples/original_source/code_diff/gumtree/chawathe.py`: `WorkingTree`,
//! `WorkingNode`, `InsertNode`, `_align_children` and `_longest_common_subsequence`, and the
//! breadth-first `compute_chawathe_edit_script` driver. Translated from the original's
//! copy-on-write node model (a dict from delegate node to a lazily-created `WorkingNode`
//! shim) into three explicit overlay maps (`mod_parent`, `mod_children`, `mod_text`) keyed by
//! [`NodeRef`], since Rust has no free `__getattr__`-style proxy to fall back to the
//! underlying `AstNode` on a cache miss.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    edit_script::{EditOperation, EditScript, NodeRef},
    mapping::Matching,
    tree::AstNode,
};

/// Mutable overlay on top of an immutable source tree, tracking every edit applied so far so
/// that later steps of the synthesis see a consistent, already-edited tree.
struct WorkingTree<'s, 't> {
    mapping: Matching<'s, 't>,
    source_of_target: FxHashMap<usize, NodeRef<'s>>,
    target_of_source: FxHashMap<NodeRef<'s>, &'t AstNode<'t>>,
    mod_parent: FxHashMap<NodeRef<'s>, NodeRef<'s>>,
    mod_children: FxHashMap<NodeRef<'s>, Vec<NodeRef<'s>>>,
    mod_text: FxHashMap<NodeRef<'s>, String>,
    insert_grammar: FxHashMap<u64, &'static str>,
    inorder_working: FxHashSet<NodeRef<'s>>,
    inorder_target: FxHashSet<usize>,
    next_insert_id: u64,
    root: NodeRef<'s>,
}

impl<'s, 't> WorkingTree<'s, 't> {
    fn new(mapping: Matching<'s, 't>, source_root: &'s AstNode<'s>) -> Self {
        let mut source_of_target = FxHashMap::default();
        let mut target_of_source = FxHashMap::default();
        for (s, t) in mapping.iter() {
            let sref = NodeRef::Source(s);
            source_of_target.insert(t.id, sref);
            target_of_source.insert(sref, t);
        }
        Self {
            mapping,
            source_of_target,
            target_of_source,
            mod_parent: FxHashMap::default(),
            mod_children: FxHashMap::default(),
            mod_text: FxHashMap::default(),
            insert_grammar: FxHashMap::default(),
            inorder_working: FxHashSet::default(),
            inorder_target: FxHashSet::default(),
            next_insert_id: 0,
            root: NodeRef::Source(source_root),
        }
    }

    fn grammar_name(&self, n: NodeRef<'s>) -> &'static str {
        match n {
            NodeRef::Source(node) => node.grammar_name,
            NodeRef::Inserted(id) => self.insert_grammar[&id],
        }
    }

    fn text(&self, n: NodeRef<'s>) -> Option<String> {
        if let Some(t) = self.mod_text.get(&n) {
            return Some(t.clone());
        }
        match n {
            NodeRef::Source(node) if node.is_leaf() => Some(node.source.to_string()),
            _ => None,
        }
    }

    fn parent(&self, n: NodeRef<'s>) -> Option<NodeRef<'s>> {
        if let Some(&p) = self.mod_parent.get(&n) {
            return Some(p);
        }
        match n {
            NodeRef::Source(node) => node.parent().map(NodeRef::Source),
            NodeRef::Inserted(_) => None,
        }
    }

    fn children(&self, n: NodeRef<'s>) -> Vec<NodeRef<'s>> {
        if let Some(c) = self.mod_children.get(&n) {
            return c.clone();
        }
        self.raw_children(n)
    }

    fn raw_children(&self, n: NodeRef<'s>) -> Vec<NodeRef<'s>> {
        match n {
            NodeRef::Source(node) => node.children.iter().map(|c| NodeRef::Source(c)).collect(),
            NodeRef::Inserted(_) => Vec::new(),
        }
    }

    /// Ensures `mod_children[parent]` exists, seeded from the underlying tree if necessary,
    /// then returns a mutable handle to it. Splitting this from `children()` avoids borrowing
    /// `self` both mutably (for the map entry) and immutably (to compute the fallback) at once.
    fn children_mut(&mut self, parent: NodeRef<'s>) -> &mut Vec<NodeRef<'s>> {
        if !self.mod_children.contains_key(&parent) {
            let base = self.raw_children(parent);
            self.mod_children.insert(parent, base);
        }
        self.mod_children.get_mut(&parent).unwrap()
    }

    /// The working-tree partner of a source-side node: the target node mapped to it, if any.
    fn partner_of_working(&self, n: NodeRef<'s>) -> Option<&'t AstNode<'t>> {
        self.target_of_source.get(&n).copied()
    }

    /// The working-tree partner of a target-side node: the source-side node mapped to it, if any.
    fn partner_of_target(&self, t: &'t AstNode<'t>) -> Option<NodeRef<'s>> {
        self.source_of_target.get(&t.id).copied()
    }

    fn record_match(&mut self, n: NodeRef<'s>, t: &'t AstNode<'t>) {
        self.source_of_target.insert(t.id, n);
        self.target_of_source.insert(n, t);
    }

    fn index_of(&self, parent: NodeRef<'s>, child: NodeRef<'s>) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Returns the position `Insert`/`Move` should place `target_node` at in its (working-tree)
    /// partner's child list, per `chawathe.py`'s `WorkingTree.position`.
    fn position(&self, target_node: &'t AstNode<'t>) -> usize {
        let Some(parent) = target_node.parent() else {
            return 0;
        };
        let Some(n) = parent.children.iter().position(|&c| std::ptr::eq(c, target_node)) else {
            return 0;
        };

        if parent.children[..n].iter().all(|c| !self.inorder_target.contains(&c.id)) {
            return 0;
        }

        let mut left_index = n;
        loop {
            left_index -= 1;
            if self.inorder_target.contains(&parent.children[left_index].id) {
                break;
            }
        }
        let left_child = parent.children[left_index];
        let Some(left_partner) = self.partner_of_target(left_child) else {
            return 0;
        };
        let Some(left_partner_parent) = self.parent(left_partner) else {
            return 0;
        };
        let siblings = self.children(left_partner_parent);
        let Some(m) = siblings.iter().position(|&c| c == left_partner) else {
            return 0;
        };
        siblings[..m].iter().filter(|&&c| self.inorder_working.contains(&c)).count() + 1
    }

    fn apply(&mut self, op: &EditOperation<'s>) -> NodeRef<'s> {
        match op {
            EditOperation::Insert { parent, grammar_name, text, position, insert_id } => {
                let node = NodeRef::Inserted(*insert_id);
                self.insert_grammar.insert(*insert_id, grammar_name);
                if let Some(t) = text {
                    self.mod_text.insert(node, t.clone());
                }
                self.mod_parent.insert(node, *parent);
                let siblings = self.children_mut(*parent);
                let pos = (*position).min(siblings.len());
                siblings.insert(pos, node);
                node
            }
            EditOperation::Update { node, text } => {
                self.mod_text.insert(*node, text.clone());
                *node
            }
            EditOperation::Move { node, parent, position } => {
                self.delete_from_parent(*node);
                self.mod_parent.insert(*node, *parent);
                let siblings = self.children_mut(*parent);
                let pos = (*position).min(siblings.len());
                siblings.insert(pos, *node);
                *node
            }
            EditOperation::Delete { node } => {
                self.delete_from_parent(*node);
                *node
            }
        }
    }

    fn delete_from_parent(&mut self, node: NodeRef<'s>) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.children_mut(parent).retain(|&c| c != node);
    }

    fn next_insert_id(&mut self) -> u64 {
        let id = self.next_insert_id;
        self.next_insert_id += 1;
        id
    }
}

/// Synthesizes the edit script turning `source` into `target`, given the node mapping found
/// by the matcher.
pub fn edit_script<'s, 't>(source: &'s AstNode<'s>, target: &'t AstNode<'t>, mapping: Matching<'s, 't>) -> EditScript<'s> {
    let mut script = Vec::new();
    let mut wt = WorkingTree::new(mapping, source);
    wt.record_match(wt.root, target);

    for target_node in bfs(target) {
        let parent = target_node.parent().unwrap_or(target);
        let source_partner = wt.partner_of_target(target_node);
        let parent_partner = if std::ptr::eq(parent, target) { Some(wt.root) } else { wt.partner_of_target(parent) };

        match (source_partner, parent_partner) {
            (None, Some(parent_partner)) => {
                let position = wt.position(target_node);
                let insert_id = wt.next_insert_id();
                let op = EditOperation::Insert {
                    parent: parent_partner,
                    grammar_name: target_node.grammar_name,
                    text: target_node.is_leaf().then(|| target_node.source.to_string()),
                    position,
                    insert_id,
                };
                let node = wt.apply(&op);
                wt.record_match(node, target_node);
                script.push(op);
            }
            (Some(source_partner), _) if !std::ptr::eq(target_node, target) => {
                if target_node.is_leaf() {
                    let target_text = Some(target_node.source.to_string());
                    if wt.text(source_partner) != target_text {
                        let op = EditOperation::Update { node: source_partner, text: target_node.source.to_string() };
                        wt.apply(&op);
                        script.push(op);
                    }
                }

                let partner_parent = wt.parent(source_partner);
                let parent_already_matched =
                    partner_parent.is_some() && parent_partner.is_some() && partner_parent == parent_partner;

                if !parent_already_matched {
                    if let Some(parent_partner) = parent_partner {
                        let position = wt.position(target_node);
                        let op = EditOperation::Move { node: source_partner, parent: parent_partner, position };
                        wt.apply(&op);
                        script.push(op);
                    }
                }
            }
            _ => {}
        }

        wt.inorder_target.insert(target_node.id);
        align_children(target_node, &mut wt, &mut script);
    }

    for node in postorder_source(source) {
        let wnode = NodeRef::Source(node);
        if wt.partner_of_working(wnode).is_none() {
            let op = EditOperation::Delete { node: wnode };
            wt.apply(&op);
            script.push(op);
        }
    }

    EditScript(script)
}

/// Aligns the children of `target_node`'s working-tree partner against `target_node`'s own
/// children by longest common subsequence, emitting a `Move` for every child that is mapped
/// but falls outside the LCS alignment; mirrors `chawathe.py`'s `_align_children`.
fn align_children<'s, 't>(
    target_node: &'t AstNode<'t>,
    wt: &mut WorkingTree<'s, 't>,
    script: &mut Vec<EditOperation<'s>>,
) {
    let Some(source_partner) = wt.partner_of_target(target_node) else {
        return;
    };

    let source_children = wt.children(source_partner);
    for &c in &source_children {
        wt.inorder_working.remove(&c);
    }
    for c in &target_node.children {
        wt.inorder_target.remove(&c.id);
    }

    let s1: Vec<NodeRef<'s>> = source_children
        .iter()
        .copied()
        .filter(|&c| wt.partner_of_working(c).is_some_and(|p| std::ptr::eq(p, target_node)))
        .collect();
    let t2: Vec<&'t AstNode<'t>> = target_node
        .children
        .iter()
        .copied()
        .filter(|&c| wt.partner_of_target(c).is_some_and(|p| p == source_partner))
        .collect();

    let lcs = longest_common_subsequence(&s1, &t2, |s, t| wt.partner_of_working(*s).is_some_and(|p| std::ptr::eq(p, t)));

    let mut aligned = FxHashSet::default();
    for &(s, t) in &lcs {
        wt.inorder_working.insert(s);
        wt.inorder_target.insert(t.id);
        aligned.insert((s, t.id));
    }

    for &s in &s1 {
        for &t in &t2 {
            if wt.partner_of_working(s).is_some_and(|p| std::ptr::eq(p, t)) && !aligned.contains(&(s, t.id)) {
                let position = wt.position(t);
                let op = EditOperation::Move { node: s, parent: source_partner, position };
                wt.apply(&op);
                script.push(op);
                wt.inorder_working.insert(s);
                wt.inorder_target.insert(t.id);
                aligned.insert((s, t.id));
            }
        }
    }
}

/// Longest common subsequence of `source` and `target` under `equal`, preferring to keep
/// terminal (leaf) source nodes in the subsequence when a tie must be broken; mirrors
/// `chawathe.py`'s `_longest_common_subsequence`.
fn longest_common_subsequence<'s, 't>(
    source: &[NodeRef<'s>],
    target: &[&'t AstNode<'t>],
    equal: impl Fn(&NodeRef<'s>, &'t AstNode<'t>) -> bool,
) -> Vec<(NodeRef<'s>, &'t AstNode<'t>)> {
    let n = source.len();
    let m = target.len();
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in 0..n {
        for j in 0..m {
            lengths[i + 1][j + 1] = if equal(&source[i], target[j]) {
                lengths[i][j] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut result = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if equal(&source[i - 1], target[j - 1]) {
            result.push((source[i - 1], target[j - 1]));
            i -= 1;
            j -= 1;
        } else if lengths[i][j - 1] > lengths[i - 1][j] {
            j -= 1;
        } else if lengths[i][j - 1] == lengths[i - 1][j] {
            // prefer keeping terminal (leaf) source nodes in the alignment
            match source[i - 1] {
                NodeRef::Source(node) if !node.is_leaf() => j -= 1,
                _ => i -= 1,
            }
        } else {
            i -= 1;
        }
    }
    result.reverse();
    result
}

fn bfs<'t>(root: &'t AstNode<'t>) -> Vec<&'t AstNode<'t>> {
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(root);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        queue.extend(node.children.iter().copied());
    }
    order
}

fn postorder_source<'s>(root: &'s AstNode<'s>) -> Vec<&'s AstNode<'s>> {
    root.postorder().collect()
}

#[cfg(test)]
mod tests {
    use super::edit_script;
    use crate::{matcher::match_trees, options::DiffOptions, test_utils::ctx};

    #[test]
    fn identical_trees_produce_an_empty_script() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1 + 2");
        let b = ctx.parse_python("x = 1 + 2");
        let mapping = match_trees(a, b, &DiffOptions::default());
        let script = edit_script(a, b, mapping);
        assert!(script.is_empty());
    }

    #[test]
    fn a_single_literal_change_produces_one_update() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 2");
        let mapping = match_trees(a, b, &DiffOptions::default());
        let script = edit_script(a, b, mapping);
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn an_appended_statement_produces_only_insertions() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1\n");
        let b = ctx.parse_python("x = 1\ny = 2\n");
        let mapping = match_trees(a, b, &DiffOptions::default());
        let script = edit_script(a, b, mapping);
        assert!(!script.is_empty());
        assert!(script.iter().all(|op| matches!(op, crate::edit_script::EditOperation::Insert { .. })));
    }
}
