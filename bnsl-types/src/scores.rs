//! Local score tables.
use std::fmt;

use crate::set::{compact, ParentCode, VarSet};
use crate::var::Var;

/// Number of candidate parent sets of a single variable in a network with `var_count` variables.
///
/// This is the length of each row of a per variable table indexed by [`ParentCode`].
pub fn parent_code_count(var_count: usize) -> usize {
    if var_count == 0 {
        0
    } else {
        1 << (var_count - 1)
    }
}

/// The local score of every variable for every possible parent set.
///
/// Stored as a dense row-major table with one row per variable. Each row is indexed by the
/// [`ParentCode`] of the parent set relative to the row's variable.
#[derive(Default, Clone, PartialEq)]
pub struct ScoreTable {
    var_count: usize,
    scores: Vec<f64>,
}

impl ScoreTable {
    /// Create a table for `var_count` variables with all scores set to zero.
    pub fn new(var_count: usize) -> ScoreTable {
        assert!(
            var_count <= Var::max_count(),
            "{} variables exceed the supported maximum of {}",
            var_count,
            Var::max_count()
        );
        ScoreTable {
            var_count,
            scores: vec![0.0; var_count * parent_code_count(var_count)],
        }
    }

    /// Create a table from one row of scores per variable.
    ///
    /// Each row must be indexed by parent code and have length `1 << (rows.len() - 1)`.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<f64>>) -> ScoreTable {
        let rows: Vec<Vec<f64>> = rows.into_iter().collect();
        let mut table = ScoreTable::new(rows.len());
        let row_len = table.row_len();
        for (index, row) in rows.into_iter().enumerate() {
            assert_eq!(
                row.len(),
                row_len,
                "score row of variable {} has the wrong length",
                index
            );
            table.row_mut(Var::from_index(index)).copy_from_slice(&row);
        }
        table
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Number of scores per variable.
    pub fn row_len(&self) -> usize {
        parent_code_count(self.var_count)
    }

    /// All scores of a variable, indexed by parent code.
    pub fn row(&self, var: Var) -> &[f64] {
        let row_len = self.row_len();
        &self.scores[var.index() * row_len..][..row_len]
    }

    /// Mutable access to all scores of a variable, indexed by parent code.
    pub fn row_mut(&mut self, var: Var) -> &mut [f64] {
        let row_len = self.row_len();
        &mut self.scores[var.index() * row_len..][..row_len]
    }

    /// Score of `var` having exactly the parents encoded by `code`.
    #[inline]
    pub fn score(&self, var: Var, code: ParentCode) -> f64 {
        self.row(var)[code.index()]
    }

    /// Score of `var` having exactly the parents `parents`.
    pub fn score_of(&self, var: Var, parents: VarSet) -> f64 {
        self.score(var, self.checked_code(var, parents))
    }

    /// Set the score of `var` having exactly the parents `parents`.
    pub fn set_score(&mut self, var: Var, parents: VarSet, score: f64) {
        let code = self.checked_code(var, parents);
        self.row_mut(var)[code.index()] = score;
    }

    fn checked_code(&self, var: Var, parents: VarSet) -> ParentCode {
        assert!(
            var.index() < self.var_count,
            "variable {} out of range for {} variables",
            var,
            self.var_count
        );
        assert!(
            parents.is_subset(VarSet::full(self.var_count)),
            "parents {} out of range for {} variables",
            parents,
            self.var_count
        );
        assert!(
            !parents.contains(var),
            "variable {} cannot be its own parent",
            var
        );
        compact(var, parents)
    }
}

impl fmt::Debug for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        for index in 0..self.var_count {
            let var = Var::from_index(index);
            map.entry(&var, &self.row(var));
        }
        map.finish()
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::{prelude::*, *};

    /// Score tables with scores drawn from `score`.
    pub fn score_table(
        var_count: impl Strategy<Value = usize>,
        score: impl Strategy<Value = f64> + Clone,
    ) -> impl Strategy<Value = ScoreTable> {
        var_count.prop_flat_map(move |var_count| {
            collection::vec(score.clone(), var_count * parent_code_count(var_count)).prop_map(
                move |scores| ScoreTable { var_count, scores },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::var_set;

    #[test]
    fn rows_are_indexed_by_parent_code() {
        let mut table = ScoreTable::new(3);
        assert_eq!(table.row_len(), 4);

        let var = Var::from_index(1);
        table.set_score(var, var_set![0, 2], 2.5);
        table.set_score(var, var_set![2], 0.5);

        assert_eq!(table.row(var), &[0.0, 0.0, 0.5, 2.5]);
        assert_eq!(table.score_of(var, var_set![0, 2]), 2.5);
        assert_eq!(table.score(var, ParentCode::from_code(0b10)), 0.5);
        assert_eq!(table.row(Var::from_index(0)), &[0.0; 4]);
    }

    #[test]
    fn from_rows() {
        let table = ScoreTable::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(table.var_count(), 2);
        assert_eq!(table.score_of(Var::from_index(0), var_set![1]), 2.0);
        assert_eq!(table.score_of(Var::from_index(1), var_set![]), 3.0);
    }

    #[test]
    fn empty_table() {
        let table = ScoreTable::new(0);
        assert_eq!(table.var_count(), 0);
        assert_eq!(table.row_len(), 0);
        assert_eq!(ScoreTable::new(1).row_len(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot be its own parent")]
    fn self_parent_panics() {
        let mut table = ScoreTable::new(3);
        table.set_score(Var::from_index(1), var_set![1, 2], 1.0);
    }

    #[test]
    #[should_panic(expected = "wrong length")]
    fn short_row_panics() {
        ScoreTable::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
    }
}
