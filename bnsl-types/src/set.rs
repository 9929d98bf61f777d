//! Variable sets and their compacted parent set encodings.
//!
//! A [`VarSet`] is a bitmask over all variables of the network, bit `i` being set when variable
//! `i` is a member. It is used directly as an index into tables that have an entry per subset of
//! the variables.
//!
//! Tables that store data per variable and per candidate parent set don't need an entry for sets
//! containing the variable itself. For a fixed variable `v` these sets are compacted into a
//! [`ParentCode`] by removing bit `v` and shifting all higher bits down by one. This halves the
//! size of such tables. [`compact`] and [`expand`] convert between the two representations.
//!
//! Both representations preserve the numeric order of sets that differ by removing members:
//! removing any member from a set strictly decreases its value in both encodings. Filling a table
//! in ascending index order thus always visits all subsets of a set before the set itself.
use std::fmt;
use std::iter::FromIterator;

use crate::var::{Var, VarIdx};

/// A set of variables, represented as a bitmask.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VarSet {
    bits: VarIdx,
}

impl VarSet {
    /// The empty set.
    #[inline]
    pub const fn empty() -> VarSet {
        VarSet { bits: 0 }
    }

    /// The set of all variables of a network with `count` variables.
    #[inline]
    pub fn full(count: usize) -> VarSet {
        debug_assert!(count <= Var::max_count());
        VarSet {
            bits: ((1 as VarIdx) << count) - 1,
        }
    }

    /// Creates a set from its bitmask.
    #[inline]
    pub const fn from_bits(bits: VarIdx) -> VarSet {
        VarSet { bits }
    }

    /// The bitmask of this set.
    #[inline]
    pub const fn bits(self) -> VarIdx {
        self.bits
    }

    /// The bitmask of this set, for indexing tables with an entry per variable subset.
    #[inline]
    pub const fn index(self) -> usize {
        self.bits as usize
    }

    #[inline]
    pub fn contains(self, var: Var) -> bool {
        self.bits & var.bit() != 0
    }

    /// This set with `var` added.
    #[inline]
    pub fn with(self, var: Var) -> VarSet {
        VarSet {
            bits: self.bits | var.bit(),
        }
    }

    /// This set with `var` removed.
    #[inline]
    pub fn without(self, var: Var) -> VarSet {
        VarSet {
            bits: self.bits & !var.bit(),
        }
    }

    /// Number of variables in the set.
    #[inline]
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub fn is_subset(self, other: VarSet) -> bool {
        self.bits & !other.bits == 0
    }

    /// Iterator over the members in ascending order.
    #[inline]
    pub fn iter(self) -> VarSetIter {
        VarSetIter { bits: self.bits }
    }

    /// Compacted encoding of this set as candidate parents of `var`.
    ///
    /// Shortcut for `compact(var, set)`.
    #[inline]
    pub fn compact(self, var: Var) -> ParentCode {
        compact(var, self)
    }
}

/// Iterator over the members of a [`VarSet`] in ascending order.
pub struct VarSetIter {
    bits: VarIdx,
}

impl Iterator for VarSetIter {
    type Item = Var;

    #[inline]
    fn next(&mut self) -> Option<Var> {
        if self.bits == 0 {
            None
        } else {
            let index = self.bits.trailing_zeros() as usize;
            self.bits &= self.bits - 1;
            Some(Var::from_index(index))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.bits.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for VarSetIter {}

impl IntoIterator for VarSet {
    type Item = Var;
    type IntoIter = VarSetIter;

    fn into_iter(self) -> VarSetIter {
        self.iter()
    }
}

impl FromIterator<Var> for VarSet {
    fn from_iter<I: IntoIterator<Item = Var>>(iter: I) -> VarSet {
        iter.into_iter()
            .fold(VarSet::empty(), |set, var| set.with(var))
    }
}

/// Uses set notation with 0-based indices, e.g. `{0, 2}`.
impl fmt::Debug for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Uses set notation with 0-based indices, e.g. `{0, 2}`.
impl fmt::Display for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A set of candidate parents of a fixed variable in compacted encoding.
///
/// The code alone does not determine the set, it has to be interpreted relative to the variable
/// it was compacted for. For a network with `n` variables codes range over `0..1 << (n - 1)`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ParentCode {
    code: VarIdx,
}

impl ParentCode {
    /// The code of the empty parent set, independent of the variable.
    pub const EMPTY: ParentCode = ParentCode { code: 0 };

    #[inline]
    pub const fn from_code(code: VarIdx) -> ParentCode {
        ParentCode { code }
    }

    #[inline]
    pub const fn code(self) -> VarIdx {
        self.code
    }

    /// The code as index into a row of a per variable table.
    #[inline]
    pub const fn index(self) -> usize {
        self.code as usize
    }

    /// The parent set this code represents for `var`.
    ///
    /// Shortcut for `expand(var, code)`.
    #[inline]
    pub fn expand(self, var: Var) -> VarSet {
        expand(var, self)
    }
}

impl fmt::Debug for ParentCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#b}", self.code)
    }
}

/// Reinserts the bit of `var` into a compacted parent set code.
///
/// Bits below the position of `var` stay in place, all others are shifted up by one. The
/// resulting set never contains `var`.
#[inline]
pub fn expand(var: Var, code: ParentCode) -> VarSet {
    let low_mask = var.bit() - 1;
    let low = code.code & low_mask;
    let high = code.code & !low_mask;
    VarSet::from_bits((high << 1) | low)
}

/// Removes the bit of `var` from a set of candidate parents of `var`.
///
/// Inverse of [`expand`]. The set must not contain `var`.
#[inline]
pub fn compact(var: Var, set: VarSet) -> ParentCode {
    debug_assert!(
        !set.contains(var),
        "candidate parents {:?} contain the variable {:?} itself",
        set,
        var
    );
    let low_mask = var.bit() - 1;
    let low = set.bits & low_mask;
    let high = set.bits & !low_mask;
    ParentCode::from_code((high >> 1) | low)
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::prelude::*;

    /// Arbitrary subsets of `var_count` variables.
    pub fn var_set(var_count: usize) -> impl Strategy<Value = VarSet> {
        (0..(1 as VarIdx) << var_count).prop_map(VarSet::from_bits)
    }

    /// A variable together with an arbitrary set of other variables.
    pub fn var_and_candidates(
        var_count: impl Strategy<Value = usize>,
    ) -> impl Strategy<Value = (usize, Var, VarSet)> {
        var_count
            .prop_filter("need at least one variable", |&count| count > 0)
            .prop_flat_map(|var_count| {
                (0..var_count, var_set(var_count)).prop_map(move |(index, set)| {
                    let var = Var::from_index(index);
                    (var_count, var, set.without(var))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use strategy::*;

    #[test]
    fn expand_reinserts_own_bit() {
        let var = Var::from_index(2);
        assert_eq!(expand(var, ParentCode::from_code(0b0000)), VarSet::from_bits(0b00000));
        assert_eq!(expand(var, ParentCode::from_code(0b0011)), VarSet::from_bits(0b00011));
        assert_eq!(expand(var, ParentCode::from_code(0b0100)), VarSet::from_bits(0b01000));
        assert_eq!(expand(var, ParentCode::from_code(0b1111)), VarSet::from_bits(0b11011));

        let first = Var::from_index(0);
        assert_eq!(expand(first, ParentCode::from_code(0b101)), VarSet::from_bits(0b1010));
    }

    #[test]
    fn set_operations() {
        let set: VarSet = [0, 3, 5].iter().map(|&i| Var::from_index(i)).collect();
        assert_eq!(set.bits(), 0b101001);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Var::from_index(3)));
        assert!(!set.contains(Var::from_index(4)));
        assert_eq!(set.without(Var::from_index(3)).bits(), 0b100001);
        assert_eq!(set.with(Var::from_index(1)).bits(), 0b101011);
        assert!(set.without(Var::from_index(0)).is_subset(set));
        assert!(!set.is_subset(set.without(Var::from_index(0))));
        assert_eq!(
            set.iter().map(Var::index).collect::<Vec<_>>(),
            vec![0, 3, 5]
        );
        assert_eq!(format!("{}", set), "{0, 3, 5}");
        assert_eq!(format!("{}", VarSet::empty()), "{}");
        assert_eq!(VarSet::full(4).bits(), 0b1111);
        assert_eq!(VarSet::full(0), VarSet::empty());
    }

    proptest! {
        #[test]
        fn compact_expand_roundtrip((var_count, var, set) in var_and_candidates(1..12usize)) {
            let code = compact(var, set);
            prop_assert!(code.index() < 1 << (var_count - 1));
            prop_assert_eq!(expand(var, code), set);
        }

        #[test]
        fn expand_compact_roundtrip(
            (var_count, index, code) in (1..12usize).prop_flat_map(|count| {
                (Just(count), 0..count, 0..(1 as VarIdx) << (count - 1))
            })
        ) {
            let var = Var::from_index(index);
            let set = expand(var, ParentCode::from_code(code));
            prop_assert!(!set.contains(var));
            prop_assert!(set.is_subset(VarSet::full(var_count)));
            prop_assert_eq!(compact(var, set).code(), code);
        }

        #[test]
        fn removing_a_member_decreases_code((_var_count, var, set) in var_and_candidates(1..12usize)) {
            let code = compact(var, set);
            for member in set.iter() {
                let smaller = set.without(member);
                prop_assert!(smaller < set);
                prop_assert!(compact(var, smaller) < code);
            }
        }
    }
}
