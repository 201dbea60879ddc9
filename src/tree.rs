//! Immutable AST nodes, built bottom-up from a tree-sitter parse.
//!
//! Grounded on mergiraf's `ast.rs`/`tree.rs`, stripped of everything
//! merge-specific (commutative parents, signatures, language injection):
//! this tree only needs to support isomorphism checks, height-priority
//! matching, and the Chawathe synthesizer.

use std::{
    cell::UnsafeCell,
    hash::{Hash, Hasher},
};

use rustc_hash::FxHashMap;
use tree_sitter::{Parser, TreeCursor};
use typed_arena::Arena;

use crate::lang_profile::LangProfile;

/// A position in the source text, as (line, column), both zero-indexed.
pub type Point = (usize, usize);

/// A node in a syntax tree.
///
/// Nodes are allocated in an arena and never mutated after construction;
/// the `parent` link is the only field that cannot be set before the
/// children exist, so it is threaded through an `UnsafeCell` and written
/// exactly once, immediately after a node's children are allocated. This
/// is the "arena + index-based back-links" approach spec.md's design
/// notes call for in place of truly bidirectional owning references.
#[derive(Debug)]
pub struct AstNode<'a> {
    /// A Merkle-style hash over (label, ordered child hashes); equal for any two isomorphic subtrees.
    pub hash: u64,
    /// 1 + the max height of the children, or 1 for leaves.
    pub height: i32,
    /// 1 + the sum of the children's weights.
    pub weight: usize,
    /// The children of this node (empty if this is a leaf).
    pub children: Vec<&'a Self>,
    /// The children indexed by the grammar field name they were parsed under.
    field_to_children: FxHashMap<&'a str, Vec<&'a Self>>,
    /// The source text this node spans. Only meaningful as node "text" when this is a leaf.
    pub source: &'a str,
    /// The tree-sitter grammar type of this node.
    pub grammar_name: &'static str,
    /// The field name via which this node can be accessed from its parent, if any.
    pub field_name: Option<&'static str>,
    pub start_point: Point,
    pub end_point: Point,
    /// A node id, unique within the tree it was built in.
    pub id: usize,
    parent: UnsafeCell<Option<&'a Self>>,
    dfs: UnsafeCell<Option<&'a [&'a Self]>>,
    pub lang_profile: &'a LangProfile,
}

impl<'a> AstNode<'a> {
    /// Parses `source` with the given language profile, allocating nodes in `arena` and
    /// the precomputed DFS order in `ref_arena`.
    pub fn parse(
        source: &'a str,
        lang_profile: &'a LangProfile,
        arena: &'a Arena<Self>,
        ref_arena: &'a Arena<&'a Self>,
    ) -> Result<&'a Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&lang_profile.language)
            .map_err(|err| format!("Error loading {} grammar: {err}", lang_profile.name))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| "tree-sitter failed to produce a parse tree".to_string())?;
        let mut next_node_id = 1;
        let root = Self::internal_new(&mut tree.walk(), source, lang_profile, arena, &mut next_node_id)?;
        root.internal_precompute_root_dfs(ref_arena);
        Ok(root)
    }

    fn internal_new<'b>(
        cursor: &mut TreeCursor<'b>,
        global_source: &'a str,
        lang_profile: &'a LangProfile,
        arena: &'a Arena<Self>,
        next_node_id: &mut usize,
    ) -> Result<&'a Self, String> {
        let field_name = cursor.field_name();
        let node = cursor.node();
        let atomic = lang_profile.is_atomic_node_type(node.grammar_name());

        let mut children = Vec::new();
        let mut field_to_children: FxHashMap<&'a str, Vec<&'a Self>> = FxHashMap::default();

        if !atomic && cursor.goto_first_child() {
            let mut child_available = true;
            while child_available {
                if cursor.node().grammar_name() == "comment" {
                    child_available = cursor.goto_next_sibling();
                    continue;
                }
                let child =
                    Self::internal_new(cursor, global_source, lang_profile, arena, next_node_id)?;
                children.push(child);
                if let Some(field_name) = cursor.field_name() {
                    field_to_children.entry(field_name).or_default().push(child);
                }
                child_available = cursor.goto_next_sibling();
            }
            cursor.goto_parent();
        }

        if node.is_error() {
            let range = node.range();
            return Err(format!(
                "parse error at {}:{}..{}:{}",
                range.start_point.row, range.start_point.column, range.end_point.row, range.end_point.column
            ));
        }

        let range = node.byte_range();
        let local_source = &global_source[range.start..range.end];
        let grammar_name = node.grammar_name();

        let mut hasher = crate::fxhasher();
        grammar_name.hash(&mut hasher);
        if children.is_empty() {
            local_source.hash(&mut hasher);
        } else {
            for child in &children {
                child.hash.hash(&mut hasher);
            }
        }
        let hash = hasher.finish();

        let height = children.iter().map(|c| c.height).max().map_or(1, |h| h + 1);
        let weight = 1 + children.iter().map(|c| c.weight).sum::<usize>();

        let result = arena.alloc(Self {
            hash,
            height,
            weight,
            children,
            field_to_children,
            source: local_source,
            grammar_name,
            field_name,
            start_point: (node.start_position().row, node.start_position().column),
            end_point: (node.end_position().row, node.end_position().column),
            id: *next_node_id,
            parent: UnsafeCell::new(None),
            dfs: UnsafeCell::new(None),
            lang_profile,
        });
        *next_node_id += 1;
        result.internal_set_parent_on_children();
        Ok(result)
    }

    fn internal_set_parent_on_children(&'a self) {
        for child in &self.children {
            // SAFETY: `child` has just been allocated by this call and has not been
            // handed out yet, so no other reference to `child.parent` can be live.
            unsafe { *child.parent.get() = Some(self) }
        }
    }

    fn internal_precompute_root_dfs(&'a self, ref_arena: &'a Arena<&'a Self>) {
        let mut order = vec![];
        let mut worklist = vec![self];
        while let Some(node) = worklist.pop() {
            worklist.extend(node.children.iter().rev());
            order.push(node);
        }
        let slice = ref_arena.alloc_extend(order);

        fn assign<'a>(node: &'a AstNode<'a>, slice: &'a [&'a AstNode<'a>], i: &mut usize) {
            let start = *i;
            *i += 1;
            for child in &node.children {
                assign(child, slice, i);
            }
            // SAFETY: each node's dfs slot is written exactly once, here, before the
            // node is returned from `parse`.
            unsafe { *node.dfs.get() = Some(&slice[start..*i]) };
        }
        let mut i = 0;
        assign(self, slice, &mut i);
    }

    /// The number of descendants of this node, including itself.
    pub fn size(&self) -> usize {
        self.weight
    }

    pub fn child(&self, index: usize) -> Option<&'a Self> {
        self.children.get(index).copied()
    }

    pub fn children_by_field_name(&self, field_name: &str) -> Option<&Vec<&'a Self>> {
        self.field_to_children.get(field_name)
    }

    /// The node reachable from this one by following the grammar field `field_name`,
    /// i.e. `child_by_field_name` from the parse backend contract.
    pub fn child_by_field_name(&self, field_name: &str) -> Option<&'a Self> {
        self.field_to_children.get(field_name).and_then(|v| v.first()).copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        // SAFETY: read-only access; `parent` is only ever written before this node escapes.
        unsafe { (*self.parent.get()).is_none() }
    }

    pub fn parent(&self) -> Option<&'a Self> {
        // SAFETY: read-only access; `parent` is only ever written before this node escapes.
        unsafe { *self.parent.get() }
    }

    pub fn root(&'a self) -> &'a Self {
        let mut node = self;
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    pub fn ancestors(&'a self) -> impl Iterator<Item = &'a Self> {
        std::iter::successors(Some(self), |n| n.parent())
    }

    /// All nodes of the subtree rooted at `self`, in pre-order (DFS, root first).
    pub fn dfs(&'a self) -> impl ExactSizeIterator<Item = &'a Self> + Clone {
        // SAFETY: written once by `internal_precompute_root_dfs` before this node is handed out.
        unsafe { (*self.dfs.get()) }
            .expect("dfs order was not precomputed for this node")
            .iter()
            .copied()
    }

    /// All descendants of this node, excluding itself, in pre-order.
    pub fn descendants(&'a self) -> impl Iterator<Item = &'a Self> {
        self.dfs().skip(1)
    }

    pub fn postorder(&'a self) -> impl Iterator<Item = &'a Self> {
        fn walk<'a>(node: &'a AstNode<'a>, out: &mut Vec<&'a AstNode<'a>>) {
            for child in &node.children {
                walk(child, out);
            }
            out.push(node);
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out.into_iter()
    }

    /// Two nodes are isomorphic iff `(hash, type, height, weight)` agree. Generic over the
    /// other node's lifetime: a diff compares nodes from two independently-arena-allocated
    /// trees, so `self` and `other` are never required to share a lifetime parameter.
    pub fn isomorphic_to(&self, other: &AstNode<'_>) -> bool {
        self.hash == other.hash
            && self.grammar_name == other.grammar_name
            && self.height == other.height
            && self.weight == other.weight
    }

    /// Pseudo-isomorphism: isomorphic modulo a `parenthesized_expression` wrapper on either side.
    pub fn pseudo_isomorphic_to(&self, other: &AstNode<'_>) -> bool {
        if self.isomorphic_to(other) {
            return true;
        }
        if self.grammar_name == "parenthesized_expression" {
            if let Some(inner) = self.child(if self.children.len() > 1 { 1 } else { 0 }) {
                if inner.pseudo_isomorphic_to(other) {
                    return true;
                }
            }
        }
        if other.grammar_name == "parenthesized_expression" {
            if let Some(inner) = other.child(if other.children.len() > 1 { 1 } else { 0 }) {
                if self.pseudo_isomorphic_to(inner) {
                    return true;
                }
            }
        }
        false
    }

}

impl PartialEq for AstNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
impl Eq for AstNode<'_> {}

impl Hash for AstNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::ctx;

    #[test]
    fn height_and_weight() {
        let ctx = ctx();
        let tree = ctx.parse_python("x = 1");
        assert!(tree.height >= 2);
        assert!(tree.weight >= tree.children.len());
    }

    #[test]
    fn comments_are_stripped() {
        let ctx = ctx();
        let tree = ctx.parse_python("x = 1 # a comment");
        assert!(tree.dfs().all(|n| n.grammar_name != "comment"));
    }

    #[test]
    fn isomorphism_is_reflexive() {
        let ctx = ctx();
        let tree = ctx.parse_python("def f(x):\n    return x + 1\n");
        assert!(tree.isomorphic_to(tree));
        for node in tree.dfs() {
            assert!(node.isomorphic_to(node));
        }
    }

    #[test]
    fn identical_sources_are_isomorphic() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 1");
        assert!(a.isomorphic_to(b));
    }

    #[test]
    fn different_sources_are_not_isomorphic() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 2");
        assert!(!a.isomorphic_to(b));
    }
}
