//! The implication graph.
use tern_formula::{lit::LitIdx, Var};

use crate::clause::ClauseId;

/// Why a variable got assigned.
///
/// Reasons refer to clauses by their stable id, never by reference, so the clause store is free
/// to manage its memory independently of the trail.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reason {
    /// A branching decision, or a unit enqueued at level 0.
    Decision,
    /// Propagation of the clause with this id. The propagated literal is kept in position 0 of
    /// that clause.
    Clause(ClauseId),
}

/// Reason and decision level of an assigned variable.
#[derive(Copy, Clone)]
struct ImplNode {
    reason: Reason,
    level: LitIdx,
}

/// The implication graph.
///
/// A DAG over all assigned variables, with decisions and level-0 units as sources. Each
/// propagated variable has incoming edges from the variables of its reason clause.
#[derive(Default)]
pub struct ImplGraph {
    /// Contains only valid data for indices of assigned variables.
    nodes: Vec<ImplNode>,
}

impl ImplGraph {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.nodes.resize(
            count,
            ImplNode {
                reason: Reason::Decision,
                level: 0,
            },
        );
    }

    /// The reason for an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn reason(&self, var: Var) -> Reason {
        self.nodes[var.index()].reason
    }

    /// The decision level of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn level(&self, var: Var) -> usize {
        self.nodes[var.index()].level as usize
    }

    /// Record reason and level when a variable is assigned.
    pub fn assign(&mut self, var: Var, reason: Reason, level: usize) {
        self.nodes[var.index()] = ImplNode {
            reason,
            level: level as LitIdx,
        };
    }
}
