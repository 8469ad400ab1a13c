//! Conflict driven clause learning.
use partial_ref::{partial, PartialRef};

use crate::analyze::analyze_conflict;
use crate::clause::activity::{bump_clause_activity, decay_clause_activities};
use crate::clause::ClauseOrigin;
use crate::context::{
    AnalyzeConflictP, AssignmentP, ClauseActivityP, ClauseStoreP, Context, ImplGraphP,
    SolverConfigP, SolverStateP, TrailP, VsidsP, WatchlistsP,
};
use crate::decision::make_decision;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict, Reason};
use crate::state::SatState;

/// Find a conflict, learn a clause and backjump.
///
/// When no conflict exists the formula is satisfiable and the solver state is set accordingly.
/// A conflict at decision level 0 means the formula is unsatisfiable.
pub fn conflict_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseActivityP,
        mut ClauseStoreP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) {
    let conflict = match find_conflict(ctx.borrow()) {
        Ok(()) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::Sat;
            return;
        }
        Err(conflict) => conflict,
    };

    if ctx.part(TrailP).current_level() == 0 {
        ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        return;
    }

    let backjump_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    for &id in analyze.involved() {
        bump_clause_activity(ctx.borrow(), id);
    }
    decay_clause_activities(ctx.borrow());

    backtrack(ctx.borrow(), backjump_to);

    let clause = analyze.clause();

    match *clause {
        [unit] => {
            // A learned unit is a permanent assignment; it gets the decision sentinel as its
            // reason and lives at level 0.
            debug_assert_eq!(backjump_to, 0);
            enqueue_assignment(ctx.borrow(), unit, Reason::Decision);
        }
        _ => {
            let id = ctx
                .part_mut(ClauseStoreP)
                .insert(clause, ClauseOrigin::Learned);
            ctx.part_mut(WatchlistsP)
                .watch_clause(id, [clause[0], clause[1]]);
            enqueue_assignment(ctx.borrow(), clause[0], Reason::Clause(id));
        }
    }
}

/// Find a conflict.
///
/// Alternates propagation and decisions. Returns `Ok` if all variables were assigned without
/// running into a conflict, i.e. a satisfying assignment was found.
fn find_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseStoreP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) -> Result<(), Conflict> {
    loop {
        propagate(ctx.borrow())?;

        if !make_decision(ctx.borrow()) {
            return Ok(());
        }
    }
}
