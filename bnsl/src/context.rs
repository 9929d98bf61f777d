//! Central learner data structure.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use bnsl_types::ScoreTable;

use crate::config::LearnerConfig;
use crate::parents::BestParents;
use crate::sinks::BestSinks;
use crate::state::LearnerState;

/// Part declarations for the [`Context`] struct.
mod parts {
    use super::*;

    part!(pub BestParentsP: BestParents);
    part!(pub BestSinksP: BestSinks);
    part!(pub LearnerConfigP: LearnerConfig);
    part!(pub LearnerStateP: LearnerState);
    part!(pub LocalScoresP: ScoreTable);
}

pub use parts::*;

/// Central learner data structure.
///
/// This struct contains all tables of a single learning run. Most functions operating on multiple
/// fields of the context use partial references provided by the `partial_ref` crate. This
/// documents which tables are read and which are filled by each step.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part = "BestParentsP"]
    best_parents: BestParents,
    #[part = "BestSinksP"]
    best_sinks: BestSinks,
    #[part = "LearnerConfigP"]
    config: LearnerConfig,
    #[part = "LearnerStateP"]
    state: LearnerState,
    #[part = "LocalScoresP"]
    local_scores: ScoreTable,
}

/// Update structures for a new variable count.
///
/// This discards all memoized results.
pub fn set_var_count(
    mut ctx: partial!(Context, mut BestParentsP, mut BestSinksP, mut LearnerStateP),
    count: usize,
) {
    ctx.part_mut(BestParentsP).set_var_count(count);
    ctx.part_mut(BestSinksP).set_var_count(count);
    ctx.part_mut(LearnerStateP).reset();
}

/// Replace the local scores and size all tables to match.
pub fn load_scores(
    mut ctx: partial!(
        Context,
        mut BestParentsP,
        mut BestSinksP,
        mut LearnerStateP,
        mut LocalScoresP,
    ),
    scores: ScoreTable,
) {
    let var_count = scores.var_count();
    *ctx.part_mut(LocalScoresP) = scores;
    set_var_count(ctx.borrow(), var_count);
    ctx.part_mut(LearnerStateP).has_scores = true;
}
