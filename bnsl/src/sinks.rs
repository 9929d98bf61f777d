//! Best sinks of variable subsets.
//!
//! Every network has a sink, a variable without children. Removing it leaves a network over the
//! remaining variables. The best network over a set `S` thus consists of a sink `v` with its best
//! parents among `S - v` together with the best network over `S - v`. The best sink table stores,
//! for each subset `S`, the score of the best network over `S` and the sink achieving it.
//!
//! Candidate sinks are tried in ascending order and only replace the current best when the score
//! is strictly higher.
use log::debug;

use partial_ref::{partial, PartialRef};

use bnsl_types::{set::compact, Var, VarSet};

use crate::context::{BestParentsP, BestSinksP, Context, LearnerStateP, LocalScoresP};
use crate::parents::best_parents;

/// Marks entries of `BestSinks::sinks` that are not computed yet.
const NOT_COMPUTED: u8 = u8::max_value();
/// Sink entry of the empty set.
const NO_SINK: u8 = u8::max_value() - 1;

/// Best network score and sink for each subset of the variables.
#[derive(Default)]
pub struct BestSinks {
    net_scores: Vec<f64>,
    /// The index of the best sink, `NO_SINK` or `NOT_COMPUTED`.
    sinks: Vec<u8>,
}

impl BestSinks {
    /// Update structures for a new variable count, discarding all entries.
    ///
    /// The entry of the empty set is always present.
    pub fn set_var_count(&mut self, count: usize) {
        debug_assert!(count < NO_SINK as usize);
        let set_count = 1usize << count;
        self.net_scores.clear();
        self.net_scores.resize(set_count, 0.0);
        self.sinks.clear();
        self.sinks.resize(set_count, NOT_COMPUTED);
        self.sinks[VarSet::empty().index()] = NO_SINK;
    }

    /// Score of the best network over `set` and its sink.
    ///
    /// The sink is `None` for the empty set. Returns `None` if the entry wasn't computed yet.
    pub fn get(&self, set: VarSet) -> Option<(f64, Option<Var>)> {
        let position = set.index();
        match self.sinks[position] {
            NOT_COMPUTED => None,
            NO_SINK => Some((self.net_scores[position], None)),
            sink => Some((
                self.net_scores[position],
                Some(Var::from_index(sink as usize)),
            )),
        }
    }

    fn insert(&mut self, set: VarSet, net_score: f64, sink: Var) {
        let position = set.index();
        self.net_scores[position] = net_score;
        self.sinks[position] = sink.index() as u8;
    }
}

/// Score of the best network over `set` and its sink.
///
/// Returns the memoized entry if present and computes missing entries by recursion over the
/// subsets with one variable removed otherwise. Recursion depth is bounded by the size of `set`.
pub fn best_sink(
    mut ctx: partial!(
        Context,
        mut BestParentsP,
        mut BestSinksP,
        mut LearnerStateP,
        LocalScoresP,
    ),
    set: VarSet,
) -> (f64, Option<Var>) {
    if let Some(entry) = ctx.part(BestSinksP).get(set) {
        return entry;
    }

    let mut best: Option<(f64, Var)> = None;

    for var in set.iter() {
        let rest = set.without(var);
        let (parents_score, _) = best_parents(ctx.borrow(), var, compact(var, rest));
        let (rest_score, _) = best_sink(ctx.borrow(), rest);
        let score = parents_score + rest_score;
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, var));
        }
    }

    match best {
        Some((score, sink)) => {
            ctx.part_mut(BestSinksP).insert(set, score, sink);
            ctx.part_mut(LearnerStateP).sink_entries += 1;
            (score, Some(sink))
        }
        None => unreachable!("the empty set is always present"),
    }
}

/// Compute the entries of all subsets of the variables in ascending order.
///
/// Removing a variable from a set decreases its index, so all entries needed for a set are present
/// when it is reached.
pub fn fill_best_sinks(
    mut ctx: partial!(
        Context,
        mut BestParentsP,
        mut BestSinksP,
        mut LearnerStateP,
        LocalScoresP,
    ),
) {
    let var_count = ctx.part(LocalScoresP).var_count();
    let full = VarSet::full(var_count);

    debug!("Filling best sinks for {} subsets", full.index() + 1);

    for index in 1..=full.index() {
        best_sink(ctx.borrow(), VarSet::from_bits(index as _));
    }

    ctx.part_mut(LearnerStateP).sinks_filled = true;
}
