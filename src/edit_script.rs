//! The edit script produced by the Chawathe synthesizer (spec.md §3, §6), and its textual
//! serialization.
//!
//! Grounded on `examples/original_source/code_diff/gumtree/ops.py`'s `Update`/`Insert`/
//! `Move`/`Delete` dataclasses and `serialize_script`/`deserialize_script`/`_split_args`.

use crate::{error::Error, tree::AstNode};

/// Identifies a node within a working tree: either a node of the original source tree, or a
/// node synthesized by an `Insert` operation earlier in the same script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef<'s> {
    Source(&'s AstNode<'s>),
    Inserted(u64),
}

impl<'s> NodeRef<'s> {
    fn serialize(self) -> String {
        match self {
            NodeRef::Source(n) => format!("s{}", n.id),
            NodeRef::Inserted(id) => format!("i{id}"),
        }
    }

    fn deserialize(token: &str, src_root: &'s AstNode<'s>) -> Result<Self, Error> {
        if let Some(rest) = token.strip_prefix('s') {
            let id: usize = rest
                .parse()
                .map_err(|_| Error::MalformedEditScript(format!("bad source node id: {token}")))?;
            src_root
                .dfs()
                .find(|n| n.id == id)
                .map(NodeRef::Source)
                .ok_or_else(|| Error::MalformedEditScript(format!("no such source node: {token}")))
        } else if let Some(rest) = token.strip_prefix('i') {
            let id: u64 = rest
                .parse()
                .map_err(|_| Error::MalformedEditScript(format!("bad inserted node id: {token}")))?;
            Ok(NodeRef::Inserted(id))
        } else {
            Err(Error::MalformedEditScript(format!("unrecognized node reference: {token}")))
        }
    }
}

/// One step of the edit script, in the vocabulary of Chawathe et al.'s tree-edit model.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOperation<'s> {
    Insert {
        parent: NodeRef<'s>,
        grammar_name: &'static str,
        text: Option<String>,
        position: usize,
        insert_id: u64,
    },
    Update {
        node: NodeRef<'s>,
        text: String,
    },
    Move {
        node: NodeRef<'s>,
        parent: NodeRef<'s>,
        position: usize,
    },
    Delete {
        node: NodeRef<'s>,
    },
}

/// An ordered sequence of edit operations that turns a source tree into a target tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditScript<'s>(pub Vec<EditOperation<'s>>);

impl<'s> EditScript<'s> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditOperation<'s>> {
        self.0.iter()
    }

    /// True if this script's first operation targets a synthetic `Insert` node rather than a
    /// real source node (spec.md §4.E's "ghost script"): a signal that the caller localized
    /// too tightly and should retry edit-script synthesis at a larger granularity (statement,
    /// then root).
    pub fn is_ghost(&self) -> bool {
        let node_ref = match self.0.first() {
            Some(EditOperation::Insert { parent, .. }) => *parent,
            Some(EditOperation::Update { node, .. } | EditOperation::Move { node, .. } | EditOperation::Delete { node }) => *node,
            None => return false,
        };
        matches!(node_ref, NodeRef::Inserted(_))
    }

    /// A compact, one-operation-per-line textual form: `INS`/`UPD`/`MOV`/`DEL`, space-separated
    /// fields, with the (rare) literal text field escaped so newlines cannot desynchronize
    /// lines; mirrors `ops.py`'s `serialize_script`. An `Insert`'s text field is preceded by an
    /// explicit `T`/`N` presence marker rather than relying on emptiness, since an internal-node
    /// `Insert` (`text: None`) and a leaf `Insert` of the empty string (`text: Some("")`) must
    /// serialize to different things to round-trip (spec.md §6 / testable property #6).
    pub fn serialize(&self) -> String {
        let mut lines = Vec::with_capacity(self.0.len());
        for op in &self.0 {
            let line = match op {
                EditOperation::Insert { parent, grammar_name, text, position, insert_id } => format!(
                    "INS {} {} {} {} {} {}",
                    parent.serialize(),
                    grammar_name,
                    position,
                    insert_id,
                    if text.is_some() { "T" } else { "N" },
                    escape(text.as_deref().unwrap_or("")),
                ),
                EditOperation::Update { node, text } => {
                    format!("UPD {} {}", node.serialize(), escape(text))
                }
                EditOperation::Move { node, parent, position } => {
                    format!("MOV {} {} {}", node.serialize(), parent.serialize(), position)
                }
                EditOperation::Delete { node } => format!("DEL {}", node.serialize()),
            };
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Parses the format produced by [`EditScript::serialize`], resolving `Source` node
    /// references against `src_root`.
    pub fn deserialize(text: &str, src_root: &'s AstNode<'s>) -> Result<Self, Error> {
        let mut ops = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let fields = split_args(line);
            let op = match fields.as_slice() {
                [tag, parent, grammar_name, position, insert_id, has_text, text] if tag == "INS" => {
                    let text = match has_text.as_str() {
                        "T" => Some(unescape(text)),
                        "N" => None,
                        _ => return Err(Error::MalformedEditScript(line.to_string())),
                    };
                    EditOperation::Insert {
                        parent: NodeRef::deserialize(parent, src_root)?,
                        // tree-sitter grammar names are `&'static str` everywhere else in this
                        // crate; leaking here keeps `EditOperation` lifetime-free of the parsed
                        // text, which matters for a format meant to survive process restarts.
                        grammar_name: Box::leak(grammar_name.clone().into_boxed_str()),
                        text,
                        position: parse_usize(position)?,
                        insert_id: parse_u64(insert_id)?,
                    }
                }
                [tag, node, text] if tag == "UPD" => EditOperation::Update {
                    node: NodeRef::deserialize(node, src_root)?,
                    text: unescape(text),
                },
                [tag, node, parent, position] if tag == "MOV" => EditOperation::Move {
                    node: NodeRef::deserialize(node, src_root)?,
                    parent: NodeRef::deserialize(parent, src_root)?,
                    position: parse_usize(position)?,
                },
                [tag, node] if tag == "DEL" => EditOperation::Delete { node: NodeRef::deserialize(node, src_root)? },
                _ => return Err(Error::MalformedEditScript(line.to_string())),
            };
            ops.push(op);
        }
        Ok(Self(ops))
    }
}

fn parse_usize(s: &str) -> Result<usize, Error> {
    s.parse().map_err(|_| Error::MalformedEditScript(format!("bad integer: {s}")))
}

fn parse_u64(s: &str) -> Result<u64, Error> {
    s.parse().map_err(|_| Error::MalformedEditScript(format!("bad integer: {s}")))
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace(' ', "\\s").replace('\n', "\\n")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('s') => out.push(' '),
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn split_args(line: &str) -> Vec<String> {
    line.split(' ').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ctx;

    #[test]
    fn round_trips_a_mixed_script() {
        let ctx = ctx();
        let src = ctx.parse_python("x = 1");
        let leaf = src.dfs().find(|n| n.grammar_name == "integer").unwrap();
        let script = EditScript(vec![
            EditOperation::Update { node: NodeRef::Source(leaf), text: "2".to_string() },
            EditOperation::Insert {
                parent: NodeRef::Source(src),
                grammar_name: "comment",
                text: Some("hello world".to_string()),
                position: 0,
                insert_id: 0,
            },
            EditOperation::Move { node: NodeRef::Inserted(0), parent: NodeRef::Source(src), position: 1 },
            EditOperation::Delete { node: NodeRef::Source(leaf) },
        ]);
        let text = script.serialize();
        let parsed = EditScript::deserialize(&text, src).unwrap();
        assert_eq!(parsed, script);
    }

    #[test]
    fn empty_script_round_trips() {
        let ctx = ctx();
        let src = ctx.parse_python("x = 1");
        let script = EditScript::default();
        let parsed = EditScript::deserialize(&script.serialize(), src).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn internal_node_insert_with_no_text_round_trips_to_none() {
        // `working_tree::edit_script` emits `text: None` for every non-leaf `Insert`; the
        // serialized form must distinguish that from a leaf inserted with empty text.
        let ctx = ctx();
        let src = ctx.parse_python("x = 1");
        let script = EditScript(vec![EditOperation::Insert {
            parent: NodeRef::Source(src),
            grammar_name: "block",
            text: None,
            position: 0,
            insert_id: 0,
        }]);
        let text = script.serialize();
        let parsed = EditScript::deserialize(&text, src).unwrap();
        assert_eq!(parsed, script);
        assert!(matches!(parsed.0[0], EditOperation::Insert { text: None, .. }));
    }

    #[test]
    fn leaf_insert_with_empty_text_round_trips_to_some_empty() {
        let ctx = ctx();
        let src = ctx.parse_python("x = 1");
        let script = EditScript(vec![EditOperation::Insert {
            parent: NodeRef::Source(src),
            grammar_name: "string",
            text: Some(String::new()),
            position: 0,
            insert_id: 0,
        }]);
        let text = script.serialize();
        let parsed = EditScript::deserialize(&text, src).unwrap();
        assert_eq!(parsed, script);
        assert!(matches!(&parsed.0[0], EditOperation::Insert { text: Some(t), .. } if t.is_empty()));
    }

    #[test]
    fn literal_dash_text_round_trips_unchanged() {
        // a leaf whose actual text is the sentinel character once used for emptiness ("-")
        // must not be confused with an absent or empty text field.
        let ctx = ctx();
        let src = ctx.parse_python("x = 1");
        let leaf = src.dfs().find(|n| n.grammar_name == "integer").unwrap();
        let script = EditScript(vec![
            EditOperation::Update { node: NodeRef::Source(leaf), text: "-".to_string() },
            EditOperation::Insert {
                parent: NodeRef::Source(src),
                grammar_name: "identifier",
                text: Some("-".to_string()),
                position: 0,
                insert_id: 0,
            },
        ]);
        let text = script.serialize();
        let parsed = EditScript::deserialize(&text, src).unwrap();
        assert_eq!(parsed, script);
    }
}
