//! Loading a formula into the solver.
use partial_ref::{partial, PartialRef};

use tern_formula::Lit;

use crate::clause::ClauseOrigin;
use crate::context::{
    AssignmentP, ClauseStoreP, Context, ImplGraphP, SolverStateP, TmpDataP, TrailP, WatchlistsP,
};
use crate::prop::{enqueue_assignment, Reason};
use crate::state::SatState;

/// Adds a clause of the input formula to the solver.
///
/// Removes duplicated literals, drops tautological clauses (e.g. x v -x v y) and literals that
/// are already false at level 0, detects empty clauses and enqueues unit clauses. Loading
/// happens before the search starts, at decision level 0.
///
/// Does not adjust the solver's variable count; that has to happen before calling this.
pub fn load_clause(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseStoreP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut WatchlistsP,
    ),
    lits: &[Lit],
) {
    if ctx.part(SolverStateP).sat_state == SatState::Unsat {
        return;
    }

    debug_assert_eq!(ctx.part(TrailP).current_level(), 0);

    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);

    tmp.lits.clear();
    tmp.lits.extend_from_slice(lits);
    tmp.lits.sort_unstable();
    tmp.lits.dedup();

    // The sort placed both polarities of a variable next to each other, so tautological clauses
    // are detected from adjacent literals.
    let mut previous = None;
    for &lit in tmp.lits.iter() {
        if previous == Some(!lit) {
            return;
        }
        previous = Some(lit);
    }

    // Drop clauses satisfied at level 0 and prune literals false at level 0.
    tmp.lits_2.clear();
    for &lit in tmp.lits.iter() {
        match ctx.part(AssignmentP).lit_value(lit) {
            Some(true) => return,
            Some(false) => (),
            None => tmp.lits_2.push(lit),
        }
    }

    match tmp.lits_2[..] {
        [] => ctx.part_mut(SolverStateP).sat_state = SatState::Unsat,
        [lit] => enqueue_assignment(ctx.borrow(), lit, Reason::Decision),
        _ => {
            let id = ctx
                .part_mut(ClauseStoreP)
                .insert(&tmp.lits_2, ClauseOrigin::Original);
            ctx.part_mut(WatchlistsP)
                .watch_clause(id, [tmp.lits_2[0], tmp.lits_2[1]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use tern_formula::lits;

    use crate::context::set_var_count;

    #[test]
    fn unsat_on_empty_clause() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 10);

        load_clause(ctx.borrow(), &[]);

        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Unsat);
    }

    #[test]
    fn unit_clauses() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 10);

        load_clause(ctx.borrow(), &lits![1]);
        assert_eq!(ctx.part(TrailP).trail().len(), 1);

        // tautologies are dropped
        load_clause(ctx.borrow(), &lits![3, -3]);
        assert_eq!(ctx.part(TrailP).trail().len(), 1);

        load_clause(ctx.borrow(), &lits![-2]);
        assert_eq!(ctx.part(TrailP).trail().len(), 2);

        // duplicate literals collapse into a unit
        load_clause(ctx.borrow(), &lits![4, 4]);
        assert_eq!(ctx.part(TrailP).trail().len(), 3);

        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Unknown);

        // the opposite unit makes the pruned clause empty
        load_clause(ctx.borrow(), &lits![2]);
        assert_eq!(ctx.part(SolverStateP).sat_state, SatState::Unsat);
    }

    #[test]
    fn long_clauses_are_watched() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 10);

        load_clause(ctx.borrow(), &lits![1, 2, 3]);
        load_clause(ctx.borrow(), &lits![-2, 3, 3, 4]);

        assert_eq!(ctx.part(ClauseStoreP).original_count(), 2);

        let store = ctx.part(ClauseStoreP);
        for id in store.ids() {
            let lits = store.lits(id);
            for i in 0..2 {
                assert!(ctx
                    .part(WatchlistsP)
                    .watched_by(lits[i])
                    .iter()
                    .any(|watch| watch.clause == id));
            }
        }
    }

    #[test]
    fn satisfied_clauses_are_dropped() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 10);

        load_clause(ctx.borrow(), &lits![1]);
        load_clause(ctx.borrow(), &lits![1, 2, 3]);

        assert_eq!(ctx.part(ClauseStoreP).original_count(), 0);
    }
}
