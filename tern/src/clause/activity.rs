//! Clause activity.
//!
//! Learned clauses have an activity that is bumped whenever the clause takes part in a conflict
//! resolution. Instead of decaying every stored activity after each conflict, the bump value is
//! divided by the decay factor; when any value grows past the rescale limit, all activities and
//! the bump value are scaled down together. Only the order of activities matters, so the common
//! scaling factor is irrelevant.
use partial_ref::{partial, PartialRef};

use crate::config::SolverConfig;
use crate::context::{parts::*, Context};

use super::{ClauseId, ClauseOrigin};

/// Rescale all clause activities when any value exceeds this bound.
const RESCALE_LIMIT: f64 = 1e20;
const RESCALE_FACTOR: f64 = 1e-20;

/// Bump and decay state for clause activities.
///
/// The per-clause activity values themselves are stored in the clause store.
pub struct ClauseActivity {
    /// The value to add on bumping.
    bump: f64,
    /// The inverse of the decay factor.
    inv_decay: f64,
}

impl Default for ClauseActivity {
    fn default() -> ClauseActivity {
        ClauseActivity {
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().clause_activity_decay,
        }
    }
}

impl ClauseActivity {
    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f64) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }
}

/// Increase a learned clause's activity.
pub fn bump_clause_activity(
    mut ctx: partial!(Context, mut ClauseActivityP, mut ClauseStoreP),
    id: ClauseId,
) {
    if ctx.part(ClauseStoreP).origin(id) != ClauseOrigin::Learned {
        return;
    }

    let bump = ctx.part(ClauseActivityP).bump;
    let store = ctx.part_mut(ClauseStoreP);
    let activity = store.activity(id) + bump;
    store.set_activity(id, activity);

    if activity > RESCALE_LIMIT {
        rescale_clause_activities(ctx.borrow());
    }
}

/// Decay the clause activities.
pub fn decay_clause_activities(mut ctx: partial!(Context, mut ClauseActivityP, mut ClauseStoreP)) {
    let activity = ctx.part_mut(ClauseActivityP);
    activity.bump *= activity.inv_decay;
    if activity.bump >= RESCALE_LIMIT {
        rescale_clause_activities(ctx.borrow());
    }
}

/// Rescale all values to avoid an overflow.
fn rescale_clause_activities(mut ctx: partial!(Context, mut ClauseActivityP, mut ClauseStoreP)) {
    let (store, mut ctx) = ctx.split_part_mut(ClauseStoreP);

    for index in 0..store.learned_ids().len() {
        let id = store.learned_ids()[index];
        if !store.is_deleted(id) {
            let activity = store.activity(id) * RESCALE_FACTOR;
            store.set_activity(id, activity);
        }
    }

    ctx.part_mut(ClauseActivityP).bump *= RESCALE_FACTOR;
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use tern_formula::lits;

    #[test]
    fn bumps_grow_and_rescale() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        let id = ctx
            .part_mut(ClauseStoreP)
            .insert(&lits![1, 2, 3], ClauseOrigin::Learned);

        bump_clause_activity(ctx.borrow(), id);
        let first = ctx.part(ClauseStoreP).activity(id);
        assert!(first > 0.0);

        decay_clause_activities(ctx.borrow());
        bump_clause_activity(ctx.borrow(), id);
        let second = ctx.part(ClauseStoreP).activity(id);
        assert!(second > first);

        ctx.part_mut(ClauseStoreP).set_activity(id, RESCALE_LIMIT);
        bump_clause_activity(ctx.borrow(), id);
        assert!(ctx.part(ClauseStoreP).activity(id) < 2.0);
    }
}
