//! Variables.
use std::fmt;

/// The backing type used to represent variables and variable sets.
pub type VarIdx = u32;

/// A variable of the network.
///
/// Variables are identified by a 0-based index. The same index is used in score files and in the
/// printed network.
///
/// Creating a variable with an index larger than `Var::max_var().index()` is unsupported. This
/// might panic or be interpreted as a different variable.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    index: VarIdx,
}

impl Var {
    /// Creates a variable from a 0-based index.
    ///
    /// The index may not represent a variable past `Var::max_var()`.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index <= Var::max_var().index());
        Var {
            index: index as VarIdx,
        }
    }

    /// The 0-based index representing this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// The single bit representing this variable in a variable set.
    #[inline]
    pub const fn bit(self) -> VarIdx {
        1 << self.index
    }

    /// The variable with largest index that is supported.
    ///
    /// A set of all variables has to fit into a single `VarIdx` word with the top bit to spare, so
    /// that `1 << var_count` is still representable.
    pub const fn max_var() -> Var {
        Var {
            index: VarIdx::max_value().count_ones() - 2,
        }
    }

    /// Largest number of variables supported.
    ///
    /// This is exactly `Var::max_var().index() + 1`.
    pub const fn max_count() -> usize {
        Self::max_var().index() + 1
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::prelude::*;

    pub fn var(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Var> {
        index.prop_map(Var::from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_count_leaves_room_for_full_set_size() {
        assert_eq!(Var::max_count(), 31);
        let full = (1 as VarIdx) << Var::max_count();
        assert_eq!(full.count_ones(), 1);
        assert_eq!(Var::max_var().bit(), 1 << 30);
    }
}
