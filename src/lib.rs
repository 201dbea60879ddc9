//! A structural, syntax-aware diff engine for source code.
//!
//! ## Overview
//!
//! Given a `source` and `target` snippet of the same language, this crate locates the
//! smallest pair of subtrees that differ between their syntax trees, computes a GumTree-style
//! edit script (`Insert`/`Update`/`Move`/`Delete`) turning one into the other, and — for
//! Python — classifies the change into one of a fixed catalogue of single-statement-bug
//! (SStuB) mutation patterns.
//!
//! It is an offline analysis library, not a patch applier or a general text differ: it relies
//! on an external tree-sitter grammar to parse its inputs, and the `SStuBPattern` catalogue is
//! only defined for Python.
//!
//! ## Using as a library
//!
//! ```
//! use sstub_diff::{difference, options::DiffOptions, supported_langs::supported_languages};
//! use typed_arena::Arena;
//!
//! let arena = Arena::new();
//! let ref_arena = Arena::new();
//! let lang = supported_languages().into_iter().find(|l| l.name == "Python").unwrap();
//!
//! let source = sstub_diff::parse("test()", &lang, &arena, &ref_arena).unwrap();
//! let target = sstub_diff::parse("test2()", &lang, &arena, &ref_arena).unwrap();
//!
//! let diff = difference(source, target, DiffOptions::default()).unwrap();
//! assert!(diff.is_single_statement());
//! ```

pub mod edit_script;
pub mod error;
pub mod lang_profile;
pub mod localize;
pub mod mapping;
pub mod matcher;
pub mod options;
pub(crate) mod priority_list;
pub(crate) mod shape_counter;
pub mod sstub;
pub mod supported_langs;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod tree;
pub mod working_tree;

use itertools::Itertools;
use typed_arena::Arena;

use edit_script::EditScript;
use error::Error;
use lang_profile::LangProfile;
use options::DiffOptions;
use sstub::SStubPattern;
use tree::AstNode;

pub(crate) fn fxhasher() -> rustc_hash::FxHasher {
    use std::hash::BuildHasher;
    rustc_hash::FxBuildHasher.build_hasher()
}

/// Parses `source` with the given language profile, allocating nodes in `arena` and the
/// precomputed DFS order in `ref_arena`. Thin wrapper around [`AstNode::parse`] that converts
/// its plain-string error into this crate's [`Error::ParseFailure`].
pub fn parse<'a>(
    source: &'a str,
    lang_profile: &'a LangProfile,
    arena: &'a Arena<AstNode<'a>>,
    ref_arena: &'a Arena<&'a AstNode<'a>>,
) -> Result<&'a AstNode<'a>, Error> {
    AstNode::parse(source, lang_profile, arena, ref_arena).map_err(Error::ParseFailure)
}

/// Prints the list of supported languages, either in the format understood by
/// `.gitattributes`-style tooling, or in a more human-readable form.
pub fn languages(gitattributes: bool) -> String {
    use std::fmt::Write;

    let mut res = String::new();
    for lang_profile in supported_langs::supported_languages() {
        if gitattributes {
            for extension in &lang_profile.extensions {
                let _ = writeln!(res, "*{extension} diff=sstub-{}", lang_profile.name.to_lowercase());
            }
        } else {
            let _ = writeln!(
                res,
                "{} ({})",
                lang_profile.name,
                lang_profile.extensions.iter().format_with(", ", |ext, f| f(&format_args!("*{ext}")))
            );
        }
    }
    res
}

/// Locates the smallest pair of subtrees that differ between `source_root` and `target_root`
/// (spec.md §4.F) and wraps it as an [`ASTDiff`]. This is the crate's main entry point.
///
/// # Errors
///
/// Returns [`Error::EmptyTree`] if either tree has no content left after comment stripping, or
/// [`Error::IdenticalTrees`] if the two trees are already isomorphic at the root (there is no
/// diff to report).
pub fn difference<'a>(source_root: &'a AstNode<'a>, target_root: &'a AstNode<'a>, opts: DiffOptions) -> Result<ASTDiff<'a>, Error> {
    if source_root.children.is_empty() {
        return Err(Error::EmptyTree);
    }
    if target_root.children.is_empty() {
        return Err(Error::EmptyTree);
    }

    match localize::diff_search(source_root, target_root) {
        None => Err(Error::IdenticalTrees),
        Some((source_ast, target_ast)) => Ok(ASTDiff { source_ast, target_ast, source_root, target_root, opts }),
    }
}

/// The difference between two code snippets: the smallest pair of AST nodes found to differ,
/// plus the trees they were localized from.
///
/// Constructed by [`difference`]; [`ASTDiff::statement_diff`] and [`ASTDiff::root_diff`] widen
/// an existing `ASTDiff` to a larger enclosing scope without re-running localization from
/// scratch on unrelated code.
#[derive(Debug, Clone, Copy)]
pub struct ASTDiff<'a> {
    pub source_ast: &'a AstNode<'a>,
    pub target_ast: &'a AstNode<'a>,
    source_root: &'a AstNode<'a>,
    target_root: &'a AstNode<'a>,
    opts: DiffOptions,
}

impl<'a> ASTDiff<'a> {
    /// Whether this diff's `source_ast`/`target_ast` each sit inside exactly one statement
    /// (spec.md §4.G): neither spans more than one statement of the enclosing language.
    pub fn is_single_statement(&self) -> bool {
        localize::is_single_statement(self.source_ast) && localize::is_single_statement(self.target_ast)
    }

    /// The source text spanned by `source_ast`, reconstructed by joining leaf text with spaces
    /// (mirrors the original `tokenize_tree`; not meant to byte-for-byte reproduce whitespace).
    pub fn source_text(&self) -> String {
        tokenize_tree(self.source_ast)
    }

    /// The target text spanned by `target_ast`, reconstructed the same way as [`Self::source_text`].
    pub fn target_text(&self) -> String {
        tokenize_tree(self.target_ast)
    }

    /// Raises this diff to the nearest enclosing statement on both sides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInStatement`] if either endpoint has no statement ancestor.
    pub fn statement_diff(&self) -> Result<Self, Error> {
        let source_ast = localize::parent_statement(self.source_ast).ok_or(Error::NotInStatement)?;
        let target_ast = localize::parent_statement(self.target_ast).ok_or(Error::NotInStatement)?;
        Ok(Self { source_ast, target_ast, ..*self })
    }

    /// Raises this diff to the root of each tree.
    pub fn root_diff(&self) -> Self {
        Self { source_ast: self.source_root, target_ast: self.target_root, ..*self }
    }

    /// Classifies this diff as one of the named SStuB mutation patterns (spec.md §4.G).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPatternLang`] unless both trees were parsed with the Python
    /// language profile, since the pattern catalogue is only defined for Python.
    pub fn sstub_pattern(&self) -> Result<SStubPattern, Error> {
        let lang = self.source_ast.lang_profile;
        if lang.name != "Python" {
            return Err(Error::UnsupportedPatternLang { expected: "Python", actual: lang.name.to_string() });
        }

        if localize::parent_statement(self.source_ast).is_none() || localize::parent_statement(self.target_ast).is_none() {
            return Ok(SStubPattern::NoStmt);
        }
        if !self.is_single_statement() {
            return Ok(SStubPattern::MultiStmt);
        }

        match localize::diff_search(self.source_ast, self.target_ast) {
            Some((s, t)) => Ok(sstub::classify(s, t)),
            None => Ok(SStubPattern::SingleStmt),
        }
    }

    /// Computes the edit script turning `source_ast` into `target_ast`.
    ///
    /// If both endpoints are leaves of the same grammar type, this is a single `Update`.
    /// Otherwise, per spec.md's control flow, the pair is first lifted to the nearest ancestor
    /// pair sharing a common grammar type (so the matcher has a common root to insert under),
    /// then run through the two-phase GumTree matcher and the Chawathe synthesizer.
    ///
    /// The result may be a "ghost script" (see [`EditScript::is_ghost`]): callers mining
    /// datasets at scale should retry with [`Self::statement_diff`] or [`Self::root_diff`] when
    /// that happens, rather than treating it as an error.
    pub fn edit_script(&self) -> EditScript<'a> {
        let (mut source, mut target) = (self.source_ast, self.target_ast);

        if source.is_leaf() && target.is_leaf() && source.grammar_name == target.grammar_name {
            return EditScript(vec![edit_script::EditOperation::Update {
                node: edit_script::NodeRef::Source(source),
                text: target.source.to_string(),
            }]);
        }

        while source.grammar_name != target.grammar_name {
            match (source.parent(), target.parent()) {
                (Some(sp), Some(tp)) => {
                    source = sp;
                    target = tp;
                }
                _ => break,
            }
        }

        let mapping = matcher::match_trees(source, target, &self.opts);
        working_tree::edit_script(source, target, mapping)
    }
}

fn tokenize_tree(node: &AstNode) -> String {
    let mut tokens = Vec::new();
    fn walk(node: &AstNode, tokens: &mut Vec<String>) {
        if node.is_leaf() {
            tokens.push(node.source.to_string());
        }
        for child in &node.children {
            walk(child, tokens);
        }
    }
    walk(node, &mut tokens);
    tokens.join(" ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::ctx;

    #[test]
    fn languages_lists_python() {
        let listing = languages(false);
        assert!(listing.contains("Python"));
    }

    #[test]
    fn difference_rejects_identical_trees() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 1");
        assert!(matches!(difference(a, b, DiffOptions::default()), Err(Error::IdenticalTrees)));
    }

    #[test]
    fn difference_localizes_a_small_change() {
        let ctx = ctx();
        let a = ctx.parse_python("x = 1");
        let b = ctx.parse_python("x = 2");
        let diff = difference(a, b, DiffOptions::default()).unwrap();
        assert_eq!(diff.source_ast.grammar_name, "integer");
        assert!(diff.is_single_statement());
    }

    #[test]
    fn sstub_pattern_end_to_end_table() {
        let cases: &[(&str, &str, &str)] = &[
            ("test()", "test2()", "WrongFunctionName"),
            ("test(x)", "test(x, y)", "SameFunctionMoreArgs"),
            ("result = x", "result = int(x)", "AddFunctionAroundExpression"),
            ("result = 3", "result = 3.0", "ChangeConstantType"),
            ("result = person.name", "result = person.age", "ChangeAttributeUsed"),
        ];
        for &(before, after, expected) in cases {
            let ctx = ctx();
            let a = ctx.parse_python(before);
            let b = ctx.parse_python(after);
            let diff = difference(a, b, DiffOptions::default()).unwrap();
            let pattern = diff.sstub_pattern().unwrap();
            assert_eq!(format!("{pattern:?}"), expected, "for {before:?} -> {after:?}");
        }
    }

    #[test]
    fn sstub_pattern_requires_python() {
        let ctx = ctx();
        let a = ctx.parse_javascript("x = 1");
        let b = ctx.parse_javascript("x = 2");
        let diff = difference(a, b, DiffOptions::default()).unwrap();
        assert!(matches!(diff.sstub_pattern(), Err(Error::UnsupportedPatternLang { .. })));
    }

    #[test]
    fn root_diff_and_statement_diff_widen_the_pair() {
        let ctx = ctx();
        let a = ctx.parse_python("def f():\n    x = 1\n");
        let b = ctx.parse_python("def f():\n    x = 2\n");
        let diff = difference(a, b, DiffOptions::default()).unwrap();
        let stmt = diff.statement_diff().unwrap();
        assert_eq!(stmt.source_ast.grammar_name, "expression_statement");
        let root = diff.root_diff();
        assert!(std::ptr::eq(root.source_ast, a));
        assert!(std::ptr::eq(root.target_ast, b));
    }
}
