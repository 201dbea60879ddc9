use crate::lang_profile::LangProfile;

/// The set of languages this crate knows how to parse and diff.
///
/// Python is the only language the SStuB classifier (`sstub`) is defined
/// for; the others exist to demonstrate that localization and tree
/// matching are language-agnostic given a profile.
pub fn supported_languages() -> Vec<LangProfile> {
    vec![
        LangProfile {
            name: "Python",
            extensions: vec![".py"],
            language: tree_sitter_python_orchard::LANGUAGE.into(),
            atomic_nodes: vec!["string", "comment"],
            statement_types: vec![
                "*_statement",
                "*_definition",
                "decorated_definition",
            ],
        },
        LangProfile {
            name: "JavaScript",
            extensions: vec![".js", ".mjs", ".cjs"],
            language: tree_sitter_javascript::LANGUAGE.into(),
            atomic_nodes: vec!["string", "comment", "regex"],
            statement_types: vec!["*_statement", "*_declaration"],
        },
        LangProfile {
            name: "Java",
            extensions: vec![".java"],
            language: tree_sitter_java_orchard::LANGUAGE.into(),
            atomic_nodes: vec!["string_literal", "comment"],
            statement_types: vec!["*_statement", "*_declaration"],
        },
        LangProfile {
            name: "Go",
            extensions: vec![".go"],
            language: tree_sitter_go::LANGUAGE.into(),
            atomic_nodes: vec!["interpreted_string_literal", "comment"],
            statement_types: vec!["*_statement", "*_declaration"],
        },
        LangProfile {
            name: "JSON",
            extensions: vec![".json"],
            language: tree_sitter_json::LANGUAGE.into(),
            atomic_nodes: vec!["string"],
            statement_types: vec!["pair", "object", "array"],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::supported_languages;

    #[test]
    fn every_language_has_at_least_one_extension_and_one_statement_pattern() {
        for lang in supported_languages() {
            assert!(!lang.extensions.is_empty(), "{}", lang.name);
            assert!(!lang.statement_types.is_empty(), "{}", lang.name);
        }
    }

    #[test]
    fn python_is_registered() {
        assert!(
            supported_languages()
                .iter()
                .any(|lang| lang.name == "Python")
        );
    }
}
