//! Tunables for the matcher, in the style of mergiraf's `TreeMatcher` struct:
//! a plain public-field struct with a `Default` impl, no builder macro.

#[derive(Debug, Clone, Copy)]
pub struct DiffOptions {
    /// Minimum subtree height the top-down matcher still considers (spec.md §4.C).
    pub min_height: i32,
    /// Minimum dice similarity a bottom-up candidate must clear to be matched (spec.md §4.D).
    pub min_dice: f32,
    /// Subtrees heavier than this are skipped by the APTED minimal-edit refinement,
    /// since APTED is cubic in tree weight (spec.md §4.D).
    pub max_size: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            min_height: 2,
            min_dice: 0.5,
            max_size: 1000,
        }
    }
}
