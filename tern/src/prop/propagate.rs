//! Boolean constraint propagation.
use partial_ref::{partial, PartialRef};

use tern_formula::Lit;

use crate::clause::ClauseId;
use crate::context::{AssignmentP, ClauseStoreP, Context, ImplGraphP, TrailP, WatchlistsP};

use super::assignment::enqueue_assignment;
use super::graph::Reason;
use super::watch::Watch;

/// A clause that is false under the current assignment.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Conflict(pub ClauseId);

/// Propagate all pending assignments.
///
/// Processes the trail in FIFO order starting at the propagation head. Returns the conflicting
/// clause if one is found. On conflict the propagation head stays at the entry that was being
/// processed, so calling this again without any new enqueues rediscovers the same conflict.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseStoreP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part(TrailP).next_unpropagated() {
        propagate_assignment(ctx.borrow(), lit)?;
        ctx.part_mut(TrailP).advance_queue();
    }
    Ok(())
}

/// Process all watchers invalidated by `lit` becoming true.
///
/// See [`watch`](crate::prop::watch) for the invariants this has to uphold. The watch list of
/// `!lit` is compacted in place with separate read and write positions: watchers that stay are
/// copied to the write position, watchers that move to another literal are not.
fn propagate_assignment(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseStoreP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    // the literal now false, under which the affected watchers are filed
    let false_lit = !lit;

    let mut watches = ctx.part_mut(WatchlistsP).take(false_lit);
    let mut read = 0;
    let mut write = 0;
    let mut result = Ok(());

    'watchers: while read < watches.len() {
        let watch = watches[read];
        read += 1;

        // A true blocking literal means the clause is satisfied without touching its body.
        if ctx.part(AssignmentP).lit_is_true(watch.blocking) {
            watches[write] = watch;
            write += 1;
            continue;
        }

        let id = watch.clause;

        let mut step_ctx: partial!(
            Context,
            mut AssignmentP,
            mut ClauseStoreP,
            mut ImplGraphP,
            mut TrailP,
            mut WatchlistsP,
        ) = ctx.borrow();
        let (store, mut step_ctx) = step_ctx.split_part_mut(ClauseStoreP);

        // Watchers of deleted clauses are dropped when they are next touched.
        if store.is_deleted(id) {
            continue;
        }

        let lits = store.lits_mut(id);

        // Normalize so the falsified watched literal sits in position 1.
        if lits[0] == false_lit {
            lits.swap(0, 1);
        }
        debug_assert_eq!(lits[1], false_lit);
        let first = lits[0];

        // Whatever happens to this watcher, the other watched literal is the better blocker.
        let new_watch = Watch {
            clause: id,
            blocking: first,
        };

        if first != watch.blocking && step_ctx.part(AssignmentP).lit_is_true(first) {
            watches[write] = new_watch;
            write += 1;
            continue;
        }

        // Search positions 2.. for a non-false literal to watch instead.
        for position in 2..lits.len() {
            let candidate = lits[position];
            if !step_ctx.part(AssignmentP).lit_is_false(candidate) {
                lits[1] = candidate;
                lits[position] = false_lit;
                // the replacement cannot be the literal whose list is taken out
                debug_assert_ne!(candidate, false_lit);
                step_ctx.part_mut(WatchlistsP).add_watch(candidate, new_watch);
                continue 'watchers;
            }
        }

        // No replacement: the clause is unit or false. Either way the watcher stays.
        watches[write] = new_watch;
        write += 1;

        if step_ctx.part(AssignmentP).lit_is_false(first) {
            // Conflict. Copy the unprocessed watchers to finish the compaction.
            while read < watches.len() {
                watches[write] = watches[read];
                write += 1;
                read += 1;
            }
            result = Err(Conflict(id));
            break;
        }

        enqueue_assignment(step_ctx.borrow(), first, Reason::Clause(id));
    }

    watches.truncate(write);
    ctx.part_mut(WatchlistsP).put_back(false_lit, watches);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::{IntoPartialRef, IntoPartialRefMut};

    use tern_formula::{cnf_formula, lit, CnfFormula};

    use crate::context::set_var_count;
    use crate::load::load_clause;
    use crate::prop::backtrack;

    fn load(ctx: &mut Context, formula: &CnfFormula) {
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }
    }

    /// Check the watch invariant for every stored non-deleted clause.
    fn check_watch_invariant(ctx: &Context) {
        let ctx = ctx.into_partial_ref();
        let store = ctx.part(ClauseStoreP);
        let watchlists = ctx.part(WatchlistsP);
        let assignment = ctx.part(AssignmentP);

        for id in store.ids() {
            check_clause_watches(store, watchlists, assignment, id);
        }
    }

    fn check_clause_watches(
        store: &crate::clause::ClauseStore,
        watchlists: &crate::prop::Watchlists,
        assignment: &crate::prop::Assignment,
        id: ClauseId,
    ) {
        let lits = store.lits(id);
        for i in 0..2 {
            let watcher_count = watchlists
                .watched_by(lits[i])
                .iter()
                .filter(|watch| watch.clause == id)
                .count();
            assert_eq!(watcher_count, 1, "clause must be watched once per side");
        }
        assert!(
            lits[..2].iter().any(|&lit| assignment.lit_is_true(lit))
                || lits[..2].iter().all(|&lit| assignment.lit_is_unk(lit)),
            "after propagation a watched literal is true or both are unassigned"
        );
    }

    #[test]
    fn propagates_unit_chain() {
        let mut ctx = Context::default();
        load(
            &mut ctx,
            &cnf_formula![
                1;
                -1, 2;
                -2, 3;
                -3, 4;
            ],
        );

        let mut ctx = ctx.into_partial_ref_mut();
        assert_eq!(propagate(ctx.borrow()), Ok(()));
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(4)));
        assert!(ctx.part(TrailP).fully_propagated());
        assert_eq!(ctx.part(TrailP).trail().len(), 4);
    }

    #[test]
    fn detects_conflict_and_is_idempotent() {
        let mut ctx = Context::default();
        load(
            &mut ctx,
            &cnf_formula![
                1;
                -1, 2;
                -1, -2, 3;
                -2, -3;
            ],
        );

        let mut ctx = ctx.into_partial_ref_mut();
        let conflict = propagate(ctx.borrow());
        assert!(conflict.is_err());
        // without new enqueues the same conflict is found again
        assert_eq!(propagate(ctx.borrow()), conflict);
    }

    #[test]
    fn conflicting_units_conflict_at_level_0() {
        let mut ctx = Context::default();
        load(
            &mut ctx,
            &cnf_formula![
                1, 2;
                -1;
                -2;
            ],
        );

        let mut ctx = ctx.into_partial_ref_mut();
        assert!(propagate(ctx.borrow()).is_err());
    }

    #[test]
    fn watch_invariant_holds_after_decisions() {
        let mut ctx = Context::default();
        load(
            &mut ctx,
            &cnf_formula![
                1, 2, 3;
                -1, 2, -3;
                -2, 3, 4;
                -1, -2, -3, -4;
            ],
        );

        {
            let mut ctx = ctx.into_partial_ref_mut();
            assert_eq!(propagate(ctx.borrow()), Ok(()));

            ctx.part_mut(TrailP).new_decision_level();
            enqueue_assignment(ctx.borrow(), lit!(1), Reason::Decision);
            assert_eq!(propagate(ctx.borrow()), Ok(()));

            ctx.part_mut(TrailP).new_decision_level();
            enqueue_assignment(ctx.borrow(), lit!(2), Reason::Decision);
            assert_eq!(propagate(ctx.borrow()), Ok(()));
        }

        check_watch_invariant(&ctx);

        {
            let mut ctx = ctx.into_partial_ref_mut();
            backtrack(ctx.borrow(), 0);
            assert_eq!(propagate(ctx.borrow()), Ok(()));
        }

        check_watch_invariant(&ctx);
    }

    #[test]
    fn trail_levels_are_monotone() {
        let mut ctx = Context::default();
        load(
            &mut ctx,
            &cnf_formula![
                -1, 2;
                -2, 3;
                -4, 5;
            ],
        );

        let mut ctx = ctx.into_partial_ref_mut();

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Decision);
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(4), Reason::Decision);
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        let graph = ctx.part(ImplGraphP);
        let levels: Vec<usize> = ctx
            .part(TrailP)
            .trail()
            .iter()
            .map(|lit| graph.level(lit.var()))
            .collect();

        let mut sorted = levels.clone();
        sorted.sort();
        assert_eq!(levels, sorted);
    }
}
