//! Best parent sets.
//!
//! For each variable `v` and each set of candidate parents `C` (not containing `v`), the best
//! parents table stores the highest local score of `v` over all parent sets that are subsets of
//! `C`, together with the parent set achieving it.
//!
//! The entry for `C` is the best of the local score of `v` with exactly the parents `C` and the
//! entries for all sets obtained by removing a single candidate from `C`. Removing a candidate
//! clears exactly one bit of the parent code, so every entry only depends on entries with a
//! smaller parent code. Ascending code order is a valid order for filling the table.
//!
//! Candidates are compared in a fixed order: the set `C` itself first, then the subsets in
//! ascending order of the removed variable. A later candidate only replaces the current best when
//! its score is strictly higher.
use log::debug;

use partial_ref::{partial, PartialRef};

use bnsl_types::{scores::parent_code_count, var::VarIdx, ParentCode, Var};

use crate::context::{BestParentsP, Context, LearnerConfigP, LearnerStateP, LocalScoresP};

/// Marks entries of `BestParents::parents` that are not computed yet.
///
/// Parent codes of supported variable counts never have the top bit set.
const NOT_COMPUTED: VarIdx = VarIdx::max_value();

/// Best parent sets for each variable and set of candidates.
///
/// Both the scores and the parents are stored as dense row-major tables with the same layout as
/// the local [`ScoreTable`](bnsl_types::ScoreTable).
#[derive(Default)]
pub struct BestParents {
    row_len: usize,
    scores: Vec<f64>,
    /// The code of the best parent set or `NOT_COMPUTED`.
    parents: Vec<VarIdx>,
}

impl BestParents {
    /// Update structures for a new variable count, discarding all entries.
    pub fn set_var_count(&mut self, count: usize) {
        self.row_len = parent_code_count(count);
        self.scores.clear();
        self.scores.resize(count * self.row_len, 0.0);
        self.parents.clear();
        self.parents.resize(count * self.row_len, NOT_COMPUTED);
    }

    /// The best score and parent set of `var` using only candidates in `candidates`.
    ///
    /// Returns `None` if the entry wasn't computed yet.
    pub fn get(&self, var: Var, candidates: ParentCode) -> Option<(f64, ParentCode)> {
        let position = var.index() * self.row_len + candidates.index();
        match self.parents[position] {
            NOT_COMPUTED => None,
            parents => Some((self.scores[position], ParentCode::from_code(parents))),
        }
    }

    /// Mutable access to the score and parent rows of a single variable.
    fn row_mut(&mut self, var: Var) -> (&mut [f64], &mut [VarIdx]) {
        let range = var.index() * self.row_len..(var.index() + 1) * self.row_len;
        (&mut self.scores[range.clone()], &mut self.parents[range])
    }
}

/// Compute all entries of the best parents table in ascending parent code order.
///
/// Rows of different variables are independent. When more than one thread is configured, the rows
/// are split into contiguous chunks that are filled in parallel.
pub fn fill_best_parents(
    mut ctx: partial!(
        Context,
        mut BestParentsP,
        mut LearnerStateP,
        LearnerConfigP,
        LocalScoresP,
    ),
) {
    let threads = ctx.part(LearnerConfigP).threads.max(1);
    let (best_parents, mut ctx) = ctx.split_part_mut(BestParentsP);
    let (local_scores, mut ctx) = ctx.split_part(LocalScoresP);

    let var_count = local_scores.var_count();
    let row_len = best_parents.row_len;

    if var_count > 0 {
        let rows_per_chunk = (var_count + threads - 1) / threads;
        let chunk_len = rows_per_chunk * row_len;

        debug!(
            "Filling best parents for {} variables in chunks of {} rows",
            var_count, rows_per_chunk
        );

        let chunks = best_parents
            .scores
            .chunks_mut(chunk_len)
            .zip(best_parents.parents.chunks_mut(chunk_len))
            .enumerate();

        let fill_chunk = |chunk_index: usize, scores: &mut [f64], parents: &mut [VarIdx]| {
            let rows = scores
                .chunks_mut(row_len)
                .zip(parents.chunks_mut(row_len))
                .enumerate();
            for (row_index, (score_row, parent_row)) in rows {
                let var = Var::from_index(chunk_index * rows_per_chunk + row_index);
                fill_row(local_scores.row(var), score_row, parent_row);
            }
        };

        if rows_per_chunk >= var_count {
            for (chunk_index, (scores, parents)) in chunks {
                fill_chunk(chunk_index, scores, parents);
            }
        } else {
            let fill_chunk = &fill_chunk;
            std::thread::scope(|scope| {
                for (chunk_index, (scores, parents)) in chunks {
                    scope.spawn(move || fill_chunk(chunk_index, scores, parents));
                }
            });
        }
    }

    let state = ctx.part_mut(LearnerStateP);
    state.parent_entries = (var_count * row_len) as u64;
    state.parents_filled = true;
}

/// Fill a single row of the best parents table bottom-up.
fn fill_row(local_scores: &[f64], scores: &mut [f64], parents: &mut [VarIdx]) {
    for code in 0..local_scores.len() {
        let mut best_score = local_scores[code];
        let mut best_parents = code as VarIdx;

        let mut remaining = code as VarIdx;
        while remaining != 0 {
            let bit = remaining & remaining.wrapping_neg();
            remaining &= !bit;
            let subset = (code as VarIdx & !bit) as usize;
            if scores[subset] > best_score {
                best_score = scores[subset];
                best_parents = parents[subset];
            }
        }

        scores[code] = best_score;
        parents[code] = best_parents;
    }
}

/// The best score and parent set of `var` using only candidates in `candidates`.
///
/// Returns the memoized entry if present and computes missing entries by recursion otherwise.
pub fn best_parents(
    mut ctx: partial!(Context, mut BestParentsP, mut LearnerStateP, LocalScoresP),
    var: Var,
    candidates: ParentCode,
) -> (f64, ParentCode) {
    let (table, mut ctx) = ctx.split_part_mut(BestParentsP);
    if let Some(entry) = table.get(var, candidates) {
        return entry;
    }

    let (local_scores, mut ctx) = ctx.split_part(LocalScoresP);
    let (scores, parents) = table.row_mut(var);
    let mut computed = 0;

    let (score, code) = best_parents_in_row(
        local_scores.row(var),
        scores,
        parents,
        candidates.code(),
        &mut computed,
    );

    ctx.part_mut(LearnerStateP).parent_entries += computed;

    (score, ParentCode::from_code(code))
}

/// Recursive memoized computation of a single entry of a best parents row.
///
/// Recursion depth is bounded by the number of candidates.
fn best_parents_in_row(
    local_scores: &[f64],
    scores: &mut [f64],
    parents: &mut [VarIdx],
    code: VarIdx,
    computed: &mut u64,
) -> (f64, VarIdx) {
    let position = code as usize;
    if parents[position] != NOT_COMPUTED {
        return (scores[position], parents[position]);
    }

    let mut best = (local_scores[position], code);

    let mut remaining = code;
    while remaining != 0 {
        let bit = remaining & remaining.wrapping_neg();
        remaining &= !bit;
        let candidate = best_parents_in_row(local_scores, scores, parents, code & !bit, computed);
        if candidate.0 > best.0 {
            best = candidate;
        }
    }

    scores[position] = best.0;
    parents[position] = best.1;
    *computed += 1;

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use partial_ref::IntoPartialRefMut;

    use bnsl_types::{
        set::compact,
        test::{tied_score_table, uniform_score_table},
        var_set, ScoreTable, VarSet,
    };

    use crate::context::load_scores;
    use crate::test::brute_force_best_parents;

    fn filled_table(scores: &ScoreTable, threads: usize) -> Vec<Vec<(f64, ParentCode)>> {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        ctx.part_mut(LearnerConfigP).threads = threads;
        load_scores(ctx.borrow(), scores.clone());
        fill_best_parents(ctx.borrow());

        assert!(ctx.part(LearnerStateP).parents_filled);

        all_entries(ctx.part(BestParentsP), scores)
    }

    fn lazy_table(scores: &ScoreTable) -> Vec<Vec<(f64, ParentCode)>> {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_scores(ctx.borrow(), scores.clone());

        // Query the largest candidate sets first, so most entries are computed by recursion.
        for index in 0..scores.var_count() {
            for code in (0..scores.row_len()).rev() {
                best_parents(
                    ctx.borrow(),
                    Var::from_index(index),
                    ParentCode::from_code(code as VarIdx),
                );
            }
        }

        assert_eq!(
            ctx.part(LearnerStateP).parent_entries,
            (scores.var_count() * scores.row_len()) as u64
        );

        all_entries(ctx.part(BestParentsP), scores)
    }

    fn all_entries(table: &BestParents, scores: &ScoreTable) -> Vec<Vec<(f64, ParentCode)>> {
        (0..scores.var_count())
            .map(|index| {
                (0..scores.row_len())
                    .map(|code| {
                        table
                            .get(Var::from_index(index), ParentCode::from_code(code as VarIdx))
                            .unwrap()
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn small_example() {
        let mut scores = ScoreTable::new(3);
        let var = Var::from_index(1);
        scores.set_score(var, var_set![], 0.5);
        scores.set_score(var, var_set![0], 1.0);
        scores.set_score(var, var_set![2], 0.25);
        scores.set_score(var, var_set![0, 2], 0.75);

        let table = filled_table(&scores, 1);
        let row: Vec<(f64, VarSet)> = table[1]
            .iter()
            .map(|&(score, code)| (score, code.expand(var)))
            .collect();

        assert_eq!(
            row,
            vec![
                (0.5, var_set![]),
                (1.0, var_set![0]),
                (0.5, var_set![]),
                (1.0, var_set![0]),
            ]
        );

        assert_eq!(
            table[1][compact(var, var_set![0, 2]).index()],
            (1.0, compact(var, var_set![0]))
        );
    }

    #[test]
    fn ties_keep_the_candidate_set_itself() {
        let scores = ScoreTable::from_rows(vec![vec![1.0; 4]; 3]);
        let table = filled_table(&scores, 1);
        for row in table.iter() {
            for (code, &(score, parents)) in row.iter().enumerate() {
                assert_eq!(score, 1.0);
                assert_eq!(parents.index(), code);
            }
        }
    }

    #[test]
    fn no_variables() {
        assert!(filled_table(&ScoreTable::new(0), 1).is_empty());
        assert!(filled_table(&ScoreTable::new(0), 4).is_empty());
    }

    proptest! {
        #[test]
        fn bottom_up_is_optimal(scores in uniform_score_table(1..7usize)) {
            let table = filled_table(&scores, 1);

            for (index, row) in table.iter().enumerate() {
                let var = Var::from_index(index);
                for (code, &(score, parents)) in row.iter().enumerate() {
                    let candidates = ParentCode::from_code(code as VarIdx).expand(var);
                    let parent_set = parents.expand(var);

                    prop_assert!(parent_set.is_subset(candidates));
                    prop_assert_eq!(score, scores.score(var, parents));
                    prop_assert_eq!(score, brute_force_best_parents(&scores, var, candidates).0);
                }
            }
        }

        #[test]
        fn lazy_matches_bottom_up(scores in tied_score_table(1..7usize)) {
            prop_assert_eq!(lazy_table(&scores), filled_table(&scores, 1));
        }

        #[test]
        fn parallel_matches_sequential(
            scores in tied_score_table(1..8usize),
            threads in 2..6usize,
        ) {
            prop_assert_eq!(filled_table(&scores, threads), filled_table(&scores, 1));
        }
    }
}
