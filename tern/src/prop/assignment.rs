//! Partial assignment, trail and backtracking.
use partial_ref::{partial, PartialRef};

use tern_formula::{lit::LitIdx, Lit, Var};

use crate::context::{AssignmentP, Context, ImplGraphP, TrailP, VsidsP};

use super::Reason;

/// Current partial assignment.
#[derive(Default)]
pub struct Assignment {
    values: Vec<Option<bool>>,
    /// Saved phase of each variable, updated on unassignment. Starts out `true`, which is also
    /// the phase of the very first decision on a variable.
    saved_phase: Vec<bool>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.values.resize(count, None);
        self.saved_phase.resize(count, true);
    }

    /// Number of variables tracked.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Current partial assignment as slice.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.values
    }

    /// Value assigned to a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Phase to use for the next decision on a variable.
    pub fn saved_phase(&self, var: Var) -> bool {
        self.saved_phase[var.index()]
    }

    /// Value assigned to a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.index()].map(|value| value ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unk(&self, lit: Lit) -> bool {
        self.values[lit.index()].is_none()
    }

    fn assign_lit(&mut self, lit: Lit) {
        self.values[lit.index()] = Some(lit.is_positive())
    }
}

/// Decision and propagation history.
#[derive(Default)]
pub struct Trail {
    /// Stack of all enqueued assignments, in assignment order.
    trail: Vec<Lit>,
    /// Index of the next trail entry to propagate.
    queue_head: usize,
    /// Trail length at the start of each decision level.
    decisions: Vec<LitIdx>,
}

impl Trail {
    /// Assigned literals in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// The next assigned literal whose watchers still need processing.
    pub fn next_unpropagated(&self) -> Option<Lit> {
        self.trail.get(self.queue_head).copied()
    }

    /// Mark the literal returned by `next_unpropagated` as fully processed.
    pub fn advance_queue(&mut self) {
        self.queue_head += 1;
    }

    /// Whether the watchers of every trail entry have been processed.
    pub fn fully_propagated(&self) -> bool {
        self.queue_head == self.trail.len()
    }

    /// Start a new decision level.
    ///
    /// Does not enqueue the decision itself.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx)
    }

    /// Current decision level.
    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }

    /// Number of assignments at level 0.
    pub fn top_level_len(&self) -> usize {
        self.decisions
            .get(0)
            .map(|&len| len as usize)
            .unwrap_or_else(|| self.trail.len())
    }
}

/// Enqueues the assignment of true to a literal.
///
/// This updates the assignment, trail and implication graph, but does not perform any
/// propagation. The literal has to be unassigned when calling this.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut TrailP),
    lit: Lit,
    reason: Reason,
) {
    let assignment = ctx.part_mut(AssignmentP);
    debug_assert!(assignment.lit_value(lit) == None);

    assignment.assign_lit(lit);

    let (trail, mut ctx) = ctx.split_part_mut(TrailP);
    trail.trail.push(lit);

    ctx.part_mut(ImplGraphP)
        .assign(lit.var(), reason, trail.decisions.len());
}

/// Undo all assignments in decision levels deeper than the given level.
///
/// Saves the phase of every unassigned variable and reinserts it into the decision heap. The
/// watchlists need no repair, as unassigning variables cannot invalidate the watch invariant.
pub fn backtrack(mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP), level: usize) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    if level >= trail.decisions.len() {
        return;
    }

    let new_trail_len = trail.decisions[level] as usize;

    trail.queue_head = new_trail_len;
    trail.decisions.truncate(level);

    for &lit in &trail.trail[new_trail_len..] {
        ctx.part_mut(VsidsP).make_available(lit.var());
        assignment.saved_phase[lit.index()] = assignment.values[lit.index()] == Some(true);
        assignment.values[lit.index()] = None;
    }
    trail.trail.truncate(new_trail_len);
}

/// Undo all decisions.
pub fn restart(mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP)) {
    backtrack(ctx.borrow(), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use tern_formula::{lit, lits};

    use crate::context::set_var_count;

    #[test]
    fn enqueue_and_backtrack_save_phases() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 4);

        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Decision);
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(-2), Reason::Decision);
        enqueue_assignment(ctx.borrow(), lit!(3), Reason::Decision);

        assert_eq!(ctx.part(TrailP).trail(), &lits![1, -2, 3]);
        assert_eq!(ctx.part(TrailP).current_level(), 1);
        assert_eq!(ctx.part(TrailP).top_level_len(), 1);
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-2)));
        assert!(ctx.part(AssignmentP).lit_is_false(lit!(2)));

        backtrack(ctx.borrow(), 0);

        assert_eq!(ctx.part(TrailP).trail(), &lits![1]);
        assert_eq!(ctx.part(TrailP).current_level(), 0);
        assert!(ctx.part(AssignmentP).lit_is_unk(lit!(2)));
        // phases of the popped assignments are saved
        assert_eq!(ctx.part(AssignmentP).saved_phase(lit!(2).var()), false);
        assert_eq!(ctx.part(AssignmentP).saved_phase(lit!(3).var()), true);
        // level 0 assignments survive
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(1)));
    }

    #[test]
    fn backtrack_to_current_level_is_a_noop() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 2);

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Decision);

        backtrack(ctx.borrow(), 1);

        assert_eq!(ctx.part(TrailP).trail(), &lits![1]);
        assert_eq!(ctx.part(TrailP).current_level(), 1);
    }
}
