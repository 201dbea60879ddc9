//! The closed set of error kinds the diff engine can surface.
//!
//! Unlike the rest of this crate's ambient `Result<T, String>`-leaning
//! teacher idiom, errors here are a fixed, named catalogue (spec §7), so
//! `thiserror`'s derive is the right tool: every fallible public entry
//! point returns one of these variants, never an ad hoc string.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("parse backend returned no AST: {0}")]
    ParseFailure(String),
    #[error("tree is empty after comment stripping")]
    EmptyTree,
    #[error("source and target trees are isomorphic at the root: no diff to report")]
    IdenticalTrees,
    #[error("diff is not enclosed in any statement")]
    NotInStatement,
    #[error("SStuB patterns are only defined for {expected}, not {actual}")]
    UnsupportedPatternLang { expected: &'static str, actual: String },
    #[error("malformed edit script: {0}")]
    MalformedEditScript(String),
}
