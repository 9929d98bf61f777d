//! Synthetic score tables.
use rand::{rngs::StdRng, Rng, SeedableRng};

use bnsl_types::{ScoreTable, Var};

/// Generate a table of independent uniform scores in `0.0..1.0`.
///
/// The table only depends on `var_count` and `seed`. Scores are drawn variable by variable in
/// ascending parent code order.
pub fn random_scores(var_count: usize, seed: u64) -> ScoreTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = ScoreTable::new(var_count);
    for index in 0..var_count {
        for score in table.row_mut(Var::from_index(index)).iter_mut() {
            *score = rng.gen();
        }
    }
    table
}
