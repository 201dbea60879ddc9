use typed_arena::Arena;

use crate::{
    lang_profile::LangProfile,
    supported_langs::supported_languages,
    tree::AstNode,
};

/// Provides a set of utilities to help write concise tests, mirroring
/// mergiraf's own `test_utils.rs`.
pub struct TestContext<'a> {
    arena: Arena<AstNode<'a>>,
    ref_arena: Arena<&'a AstNode<'a>>,
    langs: Vec<LangProfile>,
}

pub fn ctx<'a>() -> TestContext<'a> {
    TestContext {
        arena: Arena::new(),
        ref_arena: Arena::new(),
        langs: supported_languages(),
    }
}

impl<'a> TestContext<'a> {
    fn lang(&'a self, name: &str) -> &'a LangProfile {
        self.langs
            .iter()
            .find(|l| l.name == name)
            .unwrap_or_else(|| panic!("no test language profile named {name}"))
    }

    fn parse_internal(&'a self, lang_name: &str, source: &'a str) -> &'a AstNode<'a> {
        AstNode::parse(source, self.lang(lang_name), &self.arena, &self.ref_arena)
            .expect("syntax error in test source")
    }

    pub fn parse_python(&'a self, source: &'a str) -> &'a AstNode<'a> {
        self.parse_internal("Python", source)
    }

    pub fn parse_javascript(&'a self, source: &'a str) -> &'a AstNode<'a> {
        self.parse_internal("JavaScript", source)
    }

    pub fn parse_java(&'a self, source: &'a str) -> &'a AstNode<'a> {
        self.parse_internal("Java", source)
    }

    pub fn parse_go(&'a self, source: &'a str) -> &'a AstNode<'a> {
        self.parse_internal("Go", source)
    }

    pub fn parse_json(&'a self, source: &'a str) -> &'a AstNode<'a> {
        self.parse_internal("JSON", source)
    }
}
