//! Miscellaneous learner state.

/// Miscellaneous learner state.
///
/// Anything larger or any larger group of related state variables should be moved into a separate
/// part of [`Context`](crate::context::Context).
#[derive(Default)]
pub struct LearnerState {
    /// Whether a score table was loaded.
    pub has_scores: bool,
    /// Whether every best parents entry was computed.
    pub parents_filled: bool,
    /// Whether every best sink entry was computed.
    pub sinks_filled: bool,
    /// Number of best parents entries computed so far.
    pub parent_entries: u64,
    /// Number of best sink entries computed so far.
    pub sink_entries: u64,
}

impl LearnerState {
    /// Forget everything about computed tables, keeping `has_scores`.
    pub fn reset(&mut self) {
        *self = LearnerState {
            has_scores: self.has_scores,
            ..LearnerState::default()
        }
    }
}
