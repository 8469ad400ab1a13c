//! Decision heuristics.
use partial_ref::{partial, PartialRef};

use tern_formula::{Lit, Var};

use crate::context::{AssignmentP, Context, ImplGraphP, SolverConfigP, TrailP, VsidsP};
use crate::prop::{enqueue_assignment, Reason};

/// Make a decision and enqueue it.
///
/// Branches on the variable chosen by the configured heuristic, using the variable's saved
/// phase. Returns `false` if no decision was made because all variables are assigned.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
        SolverConfigP,
    ),
) -> bool {
    let decision_var = if ctx.part(SolverConfigP).strategy.uses_vsids() {
        pick_by_activity(ctx.borrow())
    } else {
        pick_first_unassigned(ctx.borrow())
    };

    match decision_var {
        Some(var) => {
            let decision = Lit::from_var(var, ctx.part(AssignmentP).saved_phase(var));
            ctx.part_mut(TrailP).new_decision_level();
            enqueue_assignment(ctx.borrow(), decision, Reason::Decision);
            true
        }
        None => false,
    }
}

/// Unassigned variable of maximal activity.
///
/// The heap may contain assigned variables, they are skipped here (lazy deletion).
fn pick_by_activity(mut ctx: partial!(Context, mut VsidsP, AssignmentP)) -> Option<Var> {
    let (vsids, ctx) = ctx.split_part_mut(VsidsP);

    while let Some(var) = vsids.pop_max() {
        if ctx.part(AssignmentP).var_value(var).is_none() {
            return Some(var);
        }
    }
    None
}

/// Unassigned variable of smallest index.
pub fn pick_first_unassigned(ctx: partial!(Context, AssignmentP)) -> Option<Var> {
    ctx.part(AssignmentP)
        .assignment()
        .iter()
        .position(|value| value.is_none())
        .map(Var::from_index)
}
