//! Exact network structure learner.
use std::io;
use std::mem::size_of;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use anyhow::Error;
use log::info;
use thiserror::Error;

use bnsl_types::{scores::parent_code_count, set::compact, ScoreTable, Var, VarSet};

use crate::config::{LearnerConfigUpdate, ParentsStrategy, SinksStrategy};
use crate::context::{load_scores, Context, LearnerConfigP, LearnerStateP, LocalScoresP};
use crate::network::{assemble_network, Network};
use crate::parents::{best_parents, fill_best_parents};
use crate::scorefile::ScoreFileParser;
use crate::sinks::{best_sink, fill_best_sinks};

/// Possible errors while learning a network.
#[derive(Debug, Error)]
pub enum LearnerError {
    #[error("No local scores were loaded")]
    NoScores,
}

/// Memory in bytes used by all tables of a network with `var_count` variables.
///
/// This includes the local scores, the best parents table and the best sink table. Callers can use
/// this to reject variable counts before allocating anything.
///
/// `var_count` must not exceed [`Var::max_count`].
pub fn table_bytes(var_count: usize) -> u128 {
    assert!(var_count <= Var::max_count());

    let parent_entries = (var_count * parent_code_count(var_count)) as u128;
    let set_count = 1u128 << var_count;

    let local_scores = parent_entries * size_of::<f64>() as u128;
    let best_parents = parent_entries * (size_of::<f64>() + size_of::<u32>()) as u128;
    let best_sinks = set_count * (size_of::<f64>() + size_of::<u8>()) as u128;

    local_scores + best_parents + best_sinks
}

/// Learns an optimal network from a table of local scores.
///
/// The learner keeps all memoized results until new scores are loaded, so repeated queries are
/// cheap.
#[derive(Default)]
pub struct Learner {
    ctx: Box<Context>,
}

impl Learner {
    /// Create a new learner.
    pub fn new() -> Learner {
        Learner::default()
    }

    /// Change the learner configuration.
    pub fn config(&mut self, config_update: &LearnerConfigUpdate) -> Result<(), Error> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        config_update.apply(ctx.part_mut(LearnerConfigP))?;
        Ok(())
    }

    /// Use the given local scores, discarding all previous results.
    pub fn set_scores(&mut self, scores: ScoreTable) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        info!(
            "Loaded local scores for {} variables ({} per variable)",
            scores.var_count(),
            scores.row_len()
        );
        load_scores(ctx.borrow(), scores);
    }

    /// Reads local scores from a score file, discarding all previous results.
    pub fn read_score_file(&mut self, input: impl io::Read) -> Result<(), Error> {
        let scores = ScoreFileParser::parse(input)?;
        self.set_scores(scores);
        Ok(())
    }

    /// Number of variables of the loaded scores.
    pub fn var_count(&self) -> usize {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(LocalScoresP).var_count()
    }

    /// Learn an optimal network over all variables.
    pub fn learn(&mut self) -> Result<Network, LearnerError> {
        let mut ctx = self.ctx.into_partial_ref_mut();

        if !ctx.part(LearnerStateP).has_scores {
            return Err(LearnerError::NoScores);
        }

        let config = ctx.part(LearnerConfigP).clone();
        let var_count = ctx.part(LocalScoresP).var_count();

        info!(
            "Learning network over {} variables ({} MiB of tables)",
            var_count,
            table_bytes(var_count) >> 20
        );

        if config.parents_strategy == ParentsStrategy::BottomUp
            && !ctx.part(LearnerStateP).parents_filled
        {
            fill_best_parents(ctx.borrow());
        }

        if config.sinks_strategy == SinksStrategy::Eager && !ctx.part(LearnerStateP).sinks_filled {
            fill_best_sinks(ctx.borrow());
        }

        let network = assemble_network(ctx.borrow());

        let state = ctx.part(LearnerStateP);
        info!(
            "Computed {} best parents entries and {} best sink entries",
            state.parent_entries, state.sink_entries
        );

        Ok(network)
    }

    /// Best local score of `var` and the parent set achieving it, using only `candidates`.
    pub fn best_parents(
        &mut self,
        var: Var,
        candidates: VarSet,
    ) -> Result<(f64, VarSet), LearnerError> {
        let mut ctx = self.ctx.into_partial_ref_mut();

        if !ctx.part(LearnerStateP).has_scores {
            return Err(LearnerError::NoScores);
        }

        let var_count = ctx.part(LocalScoresP).var_count();
        assert!(var.index() < var_count, "variable {} out of range", var);
        assert!(
            candidates.is_subset(VarSet::full(var_count)) && !candidates.contains(var),
            "invalid candidate parents {} of {}",
            candidates,
            var
        );

        let (score, parents) = best_parents(ctx.borrow(), var, compact(var, candidates));
        Ok((score, parents.expand(var)))
    }

    /// Score of the best network over the variables in `set`.
    pub fn best_network_score(&mut self, set: VarSet) -> Result<f64, LearnerError> {
        let mut ctx = self.ctx.into_partial_ref_mut();

        if !ctx.part(LearnerStateP).has_scores {
            return Err(LearnerError::NoScores);
        }

        let var_count = ctx.part(LocalScoresP).var_count();
        assert!(
            set.is_subset(VarSet::full(var_count)),
            "variables {} out of range",
            set
        );

        Ok(best_sink(ctx.borrow(), set).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use bnsl_types::{test::tied_score_table, var, var_set};

    use crate::scorefile::write_scores;

    fn configured(config: &str) -> Learner {
        let mut learner = Learner::new();
        learner.config(&toml::from_str(config).unwrap()).unwrap();
        learner
    }

    #[test]
    fn learn_without_scores() {
        let mut learner = Learner::new();
        assert!(matches!(learner.learn(), Err(LearnerError::NoScores)));
        assert!(matches!(
            learner.best_network_score(VarSet::empty()),
            Err(LearnerError::NoScores)
        ));
    }

    #[test]
    fn invalid_config() {
        let mut learner = Learner::new();
        assert!(learner
            .config(&toml::from_str("threads = 0").unwrap())
            .is_err());
    }

    #[test]
    fn queries() {
        let mut learner = Learner::new();
        learner.set_scores(ScoreTable::from_rows(vec![
            vec![1.0, 2.0, 1.5, 3.0],
            vec![0.5, 1.0, 0.5, 2.5],
            vec![0.2, 0.3, 0.3, 0.9],
        ]));

        assert_eq!(learner.var_count(), 3);
        assert_eq!(
            learner.best_parents(var!(1), var_set![2]).unwrap(),
            (0.5, var_set![2])
        );
        assert_eq!(
            learner.best_parents(var!(1), var_set![0, 2]).unwrap(),
            (2.5, var_set![0, 2])
        );
        assert_eq!(learner.best_network_score(var_set![0, 2]).unwrap(), 1.7);
        assert_eq!(learner.best_network_score(var_set![]).unwrap(), 0.0);

        let network = learner.learn().unwrap();
        assert_eq!(network.total_score(), 4.2);
        assert_eq!(network.topological_order(), vec![var!(2), var!(0), var!(1)]);
    }

    #[test]
    fn new_scores_discard_results() {
        let mut learner = Learner::new();
        learner.set_scores(ScoreTable::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
        assert_eq!(learner.learn().unwrap().total_score(), 5.0);

        learner.set_scores(ScoreTable::from_rows(vec![vec![1.0, 0.0], vec![3.0, 0.0]]));
        assert_eq!(learner.learn().unwrap().total_score(), 4.0);
    }

    #[test]
    fn table_sizes() {
        assert_eq!(table_bytes(0), 9);
        assert_eq!(table_bytes(1), 8 + 12 + 2 * 9);
        assert_eq!(table_bytes(20), 20 * (1 << 19) * 20 + (1 << 20) * 9);
    }

    proptest! {
        #[test]
        fn strategies_agree(
            scores in tied_score_table(0..7usize),
            threads in 1..4usize,
        ) {
            let mut reference = Learner::new();
            reference.set_scores(scores.clone());
            let expected = reference.learn().unwrap();

            for &config in [
                "parents_strategy = \"lazy\"",
                "sinks_strategy = \"eager\"",
                "parents_strategy = \"lazy\"\nsinks_strategy = \"eager\"",
            ].iter() {
                let mut learner = configured(config);
                learner.config(&toml::from_str(&format!("threads = {}", threads)).unwrap()).unwrap();
                learner.set_scores(scores.clone());
                prop_assert_eq!(&learner.learn().unwrap(), &expected);
            }

            prop_assert_eq!(&reference.learn().unwrap(), &expected);
        }

        #[test]
        fn via_score_file(scores in tied_score_table(0..6usize)) {
            let mut file = vec![];
            write_scores(&mut file, &scores)?;

            let mut from_file = Learner::new();
            from_file.read_score_file(&file[..]).unwrap();

            let mut direct = Learner::new();
            direct.set_scores(scores);

            prop_assert_eq!(from_file.learn().unwrap(), direct.learn().unwrap());
        }
    }
}
