//! bnsl learns a globally optimal Bayesian network structure from a table of local scores.
//!
//! The score of a network is the sum of a local score per variable, which only depends on the
//! variable's parent set. Instead of searching all directed acyclic graphs, the learner uses
//! dynamic programming over subsets of the variables: an optimal network over a set of variables
//! consists of a sink, its best parents among the other variables, and an optimal network over the
//! other variables.
//!
//! Memory and time are exponential in the number of variables, so this is only practical for
//! networks with a few dozen variables at most.
//!
//! ```
//! use bnsl::{Learner, ScoreTable};
//!
//! // Two variables, each scoring higher with the other one as parent.
//! let mut learner = Learner::new();
//! learner.set_scores(ScoreTable::from_rows(vec![vec![1.0, 3.0], vec![1.0, 2.0]]));
//!
//! let network = learner.learn().unwrap();
//! assert_eq!(network.total_score(), 4.0);
//! ```

pub mod config;
pub mod learner;
pub mod network;

mod context;
mod parents;
mod sinks;
mod state;


pub use bnsl_types::{scores, set, var, ParentCode, ScoreTable, Var, VarSet};

pub use learner::Learner;
pub use network::{Network, NetworkEntry};

pub mod scorefile {
    //! Local score file parser and writer.
    pub use bnsl_scorefile::*;
}
