//! Learned clause database reduction.
//!
//! Runs at scheduled points between conflicts. Learned clauses of length two keep their value
//! forever and clauses currently serving as a reason must not disappear, so reduction considers
//! only unlocked learned clauses longer than two literals. The less active half of those is
//! deleted.
use ordered_float::OrderedFloat;

use partial_ref::{partial, PartialRef};

use crate::context::{AssignmentP, ClauseStoreP, Context, ImplGraphP, WatchlistsP};
use crate::prop::{Assignment, ImplGraph, Reason};

use super::{ClauseId, ClauseStore};

/// Whether a clause is the reason of the assignment of its first literal.
///
/// Such a clause must not be deleted while the assignment stands.
fn is_locked(
    store: &ClauseStore,
    graph: &ImplGraph,
    assignment: &Assignment,
    id: ClauseId,
) -> bool {
    let first = store.lits(id)[0];
    assignment.var_value(first.var()).is_some()
        && graph.reason(first.var()) == Reason::Clause(id)
}

/// Delete the less active half of the unlocked learned clauses.
///
/// Afterwards all watchers of deleted clauses are purged and the freed storage is reclaimed, so
/// this is the only point where clause slots are recycled.
pub fn reduce_db(
    mut ctx: partial!(
        Context,
        mut ClauseStoreP,
        mut WatchlistsP,
        AssignmentP,
        ImplGraphP,
    ),
) {
    let (store, mut ctx) = ctx.split_part_mut(ClauseStoreP);
    let (watchlists, ctx) = ctx.split_part_mut(WatchlistsP);

    let graph = ctx.part(ImplGraphP);
    let assignment = ctx.part(AssignmentP);

    let mut candidates: Vec<ClauseId> = store
        .learned_ids()
        .iter()
        .copied()
        .filter(|&id| {
            !store.is_deleted(id)
                && store.lits(id).len() > 2
                && !is_locked(store, graph, assignment, id)
        })
        .collect();

    candidates.sort_unstable_by_key(|&id| OrderedFloat(store.activity(id)));

    for &id in &candidates[..candidates.len() / 2] {
        store.mark_deleted(id);
    }

    watchlists.purge_deleted(store);
    store.reclaim();
}
