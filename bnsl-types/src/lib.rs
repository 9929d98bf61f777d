//! Basic data types used by the bnsl network structure learner.

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! var {
    ($x:expr) => {
        $crate::var::Var::from_index($x)
    };
}

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! var_set {
    ( $( $x:expr ),* $(,)? ) => {
        <$crate::set::VarSet as ::std::iter::FromIterator<$crate::var::Var>>::from_iter(
            vec![ $( $crate::var!( $x ) ),* ]
        )
    };
}

pub mod scores;
pub mod set;
pub mod var;


pub use scores::ScoreTable;
pub use set::{compact, expand, ParentCode, VarSet};
pub use var::Var;
