use tree_sitter::Language;

/// Language-dependent settings needed by the diff engine.
///
/// Unlike a full merge tool's language profile, this carries no
/// commutative-parent or signature machinery: the diff engine only needs
/// to know how to detect a language, which node types are atomic, and
/// which node types count as statements (for localization to a statement
/// boundary and for the SStuB classifier's statement-containment check).
#[derive(Debug, Clone)]
pub struct LangProfile {
    /// a name that identifies the language
    pub name: &'static str,
    /// the file extensions of files in this language
    pub extensions: Vec<&'static str>,
    /// tree_sitter parser
    pub language: Language,
    /// list of node types which should be treated as leaves (atomic parts of the syntax tree)
    pub atomic_nodes: Vec<&'static str>,
    /// patterns matched against a node's grammar type to decide if it is a statement.
    /// A leading `*` matches any type with that suffix (e.g. `"*_statement"` matches
    /// `if_statement`, `for_statement`, etc.).
    pub statement_types: Vec<&'static str>,
}

impl LangProfile {
    /// Detects the language of a file based on its filename, falling back to an explicit
    /// override name if one is given.
    pub fn find_by_filename_or_name(
        filename: &str,
        name_override: Option<&str>,
    ) -> Result<LangProfile, String> {
        let supported = crate::supported_langs::supported_languages();
        if let Some(name) = name_override {
            return supported
                .into_iter()
                .find(|lang_profile| lang_profile.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| format!("Unknown language: {name}"));
        }
        supported
            .into_iter()
            .find(|lang_profile| {
                lang_profile
                    .extensions
                    .iter()
                    .any(|extension| filename.ends_with(extension))
            })
            .ok_or_else(|| format!("Could not detect a language for {filename}"))
    }

    /// Should this node type be treated as atomic?
    pub(crate) fn is_atomic_node_type(&self, node_type: &str) -> bool {
        self.atomic_nodes.contains(&node_type)
    }

    /// Does this node type match the language's statement patterns?
    pub fn match_type(&self, node_type: &str) -> bool {
        self.statement_types.iter().any(|pattern| {
            pattern
                .strip_prefix('*')
                .map_or(*pattern == node_type, |suffix| node_type.ends_with(suffix))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LangProfile;

    #[test]
    fn match_type_exact_and_wildcard() {
        let lang = LangProfile {
            name: "Python",
            extensions: vec![".py"],
            language: tree_sitter_python_orchard::LANGUAGE.into(),
            atomic_nodes: vec!["string"],
            statement_types: vec!["*_statement", "expression_statement"],
        };

        assert!(lang.match_type("if_statement"));
        assert!(lang.match_type("expression_statement"));
        assert!(!lang.match_type("identifier"));
    }
}
