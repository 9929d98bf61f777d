//! Learned networks.
use std::fmt;

use partial_ref::{partial, PartialRef};

use bnsl_types::{set::compact, Var, VarSet};

use crate::context::{BestParentsP, BestSinksP, Context, LearnerStateP, LocalScoresP};
use crate::parents::best_parents;
use crate::sinks::best_sink;

/// A variable of a learned network together with its parents.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NetworkEntry {
    pub var: Var,
    pub parents: VarSet,
    /// Local score of `var` with the parents `parents`.
    pub score: f64,
}

/// An optimal network.
///
/// Entries are in assembly order: each entry's variable is a sink of the network formed by itself
/// and all later entries. The parents of an entry are always among the variables of later
/// entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Network {
    entries: Vec<NetworkEntry>,
}

impl Network {
    /// All variables with their parents in assembly order.
    pub fn entries(&self) -> &[NetworkEntry] {
        &self.entries
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the local scores of all variables.
    ///
    /// The scores are added up in the same order as the best sink table does, so the result is
    /// exactly the recorded score of the best network.
    pub fn total_score(&self) -> f64 {
        self.entries
            .iter()
            .rev()
            .fold(0.0, |total, entry| entry.score + total)
    }

    /// The variables in an order where all parents precede their children.
    pub fn topological_order(&self) -> Vec<Var> {
        self.entries.iter().rev().map(|entry| entry.var).collect()
    }

    /// The parents of a variable, if it is part of the network.
    pub fn parents(&self, var: Var) -> Option<VarSet> {
        self.entries
            .iter()
            .find(|entry| entry.var == var)
            .map(|entry| entry.parents)
    }

    /// Checks that every variable appears once and only has parents among later entries.
    ///
    /// This holds for every assembled network and implies acyclicity.
    pub fn is_consistently_ordered(&self) -> bool {
        let mut remaining: VarSet = self.entries.iter().map(|entry| entry.var).collect();
        if remaining.len() != self.entries.len() {
            return false;
        }
        for entry in self.entries.iter() {
            remaining = remaining.without(entry.var);
            if !entry.parents.is_subset(remaining) {
                return false;
            }
        }
        true
    }
}

/// One line per entry in assembly order: variable, parent set and local score.
impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in self.entries.iter() {
            writeln!(f, "{} {} {}", entry.var, entry.parents, entry.score)?;
        }
        Ok(())
    }
}

/// Assemble an optimal network over all variables.
///
/// Starting from the set of all variables, repeatedly removes the best sink of the remaining set,
/// choosing its best parents among the variables that remain.
pub fn assemble_network(
    mut ctx: partial!(
        Context,
        mut BestParentsP,
        mut BestSinksP,
        mut LearnerStateP,
        LocalScoresP,
    ),
) -> Network {
    let var_count = ctx.part(LocalScoresP).var_count();
    let mut remaining = VarSet::full(var_count);
    let mut entries = Vec::with_capacity(var_count);

    while let (_, Some(sink)) = best_sink(ctx.borrow(), remaining) {
        remaining = remaining.without(sink);
        let (score, parents) = best_parents(ctx.borrow(), sink, compact(sink, remaining));
        entries.push(NetworkEntry {
            var: sink,
            parents: parents.expand(sink),
            score,
        });
    }

    debug_assert_eq!(entries.len(), var_count);

    Network { entries }
}
