//! Chronological DPLL search.
//!
//! Shares the assignment, trail, watchlists and propagation engine with the CDCL search, but
//! learns nothing: a conflict flips the deepest decision whose other phase was not tried yet and
//! discards everything below it. The formula is unsatisfiable once both phases of the very first
//! decision have failed.
use partial_ref::{partial, PartialRef};

use tern_formula::Lit;

use crate::context::{
    AssignmentP, ClauseStoreP, Context, DpllStateP, ImplGraphP, SolverStateP, TrailP, VsidsP,
    WatchlistsP,
};
use crate::decision::pick_first_unassigned;
use crate::prop::{backtrack, enqueue_assignment, propagate, Reason};
use crate::state::SatState;

/// Decision bookkeeping of the DPLL search.
///
/// Both stacks run parallel to the trail's decision levels.
#[derive(Default)]
pub struct DpllState {
    /// Decision literal of each open level.
    decisions: Vec<Lit>,
    /// Whether the level's decision is already the flipped phase.
    flipped: Vec<bool>,
}

/// Perform one step of the DPLL search.
///
/// A step is one propagation followed by either a decision, a phase flip or chronological
/// backtracking.
pub fn dpll_step(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseStoreP,
        mut DpllStateP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) {
    if propagate(ctx.borrow()).is_err() {
        if !resolve_conflict(ctx.borrow()) {
            ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        }
        return;
    }

    match pick_first_unassigned(ctx.borrow()) {
        Some(var) => {
            let decision = Lit::from_var(var, ctx.part(AssignmentP).saved_phase(var));
            ctx.part_mut(TrailP).new_decision_level();
            let dpll = ctx.part_mut(DpllStateP);
            dpll.decisions.push(decision);
            dpll.flipped.push(false);
            enqueue_assignment(ctx.borrow(), decision, Reason::Decision);
        }
        None => ctx.part_mut(SolverStateP).sat_state = SatState::Sat,
    }
}

/// Undo decisions chronologically until one can be flipped.
///
/// Returns `false` when no decision is left to flip, i.e. the formula is unsatisfiable.
fn resolve_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut DpllStateP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
    ),
) -> bool {
    loop {
        let level = ctx.part(TrailP).current_level();
        if level == 0 {
            return false;
        }

        let mut step_ctx: partial!(
            Context,
            mut AssignmentP,
            mut DpllStateP,
            mut ImplGraphP,
            mut TrailP,
            mut VsidsP,
        ) = ctx.borrow();
        let (dpll, mut step_ctx) = step_ctx.split_part_mut(DpllStateP);

        debug_assert_eq!(dpll.decisions.len(), level);
        let decision = dpll.decisions[level - 1];
        let was_flipped = dpll.flipped[level - 1];
        dpll.decisions.truncate(level - 1);
        dpll.flipped.truncate(level - 1);

        backtrack(step_ctx.borrow(), level - 1);

        if !was_flipped {
            step_ctx.part_mut(TrailP).new_decision_level();
            dpll.decisions.push(!decision);
            dpll.flipped.push(true);
            enqueue_assignment(step_ctx.borrow(), !decision, Reason::Decision);
            return true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use partial_ref::IntoPartialRefMut;

    use tern_formula::{cnf_formula, lit, CnfFormula};

    use crate::context::set_var_count;
    use crate::load::load_clause;
    use crate::test::{sat_formula, sgen_unsat_formula};

    fn solve_dpll(formula: &CnfFormula) -> SatState {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }

        while ctx.part(SolverStateP).sat_state.is_open() {
            dpll_step(ctx.borrow());
        }
        ctx.part(SolverStateP).sat_state
    }

    #[test]
    fn simple_sat() {
        let state = solve_dpll(&cnf_formula![
            1, 2;
            -1, 3;
            -2, -3;
        ]);
        assert_eq!(state, SatState::Sat);
    }

    #[test]
    fn simple_unsat() {
        let state = solve_dpll(&cnf_formula![
            1, 2;
            1, -2;
            -1, 2;
            -1, -2;
        ]);
        assert_eq!(state, SatState::Unsat);
    }

    #[test]
    fn flips_and_finds_model() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        // the default phase for 1 fails and has to be flipped
        let formula = cnf_formula![
            -1, 2;
            -1, -2;
            3;
        ];

        set_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }

        while ctx.part(SolverStateP).sat_state.is_open() {
            dpll_step(ctx.borrow());
        }

        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Sat);
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-1)));
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(3)));
    }

    proptest! {
        #[test]
        fn sgen_unsat(formula in sgen_unsat_formula(1..4usize)) {
            prop_assert_eq!(solve_dpll(&formula), SatState::Unsat);
        }

        #[test]
        fn sat(formula in sat_formula(4..15usize, 10..60usize, 0.05..0.2, 0.9..1.0)) {
            prop_assert_eq!(solve_dpll(&formula), SatState::Sat);
        }
    }
}
