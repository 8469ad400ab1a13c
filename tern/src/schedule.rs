//! Scheduling of solving steps, restarts and clause database reduction.
use log::info;

use partial_ref::{partial, PartialRef};

use crate::cdcl::conflict_step;
use crate::clause::reduce::reduce_db;
use crate::context::{
    AnalyzeConflictP, AssignmentP, ClauseActivityP, ClauseStoreP, Context, DpllStateP, ImplGraphP,
    ScheduleP, SolverConfigP, SolverStateP, TrailP, VsidsP, WatchlistsP,
};
use crate::dpll::dpll_step;
use crate::prop::restart;

mod luby;

use luby::LubySequence;

/// Restart and reduction bookkeeping.
#[derive(Default)]
pub struct Schedule {
    conflicts: u64,
    restarts: u64,
    next_restart: u64,
    luby: LubySequence,
    next_reduce: u64,
    reduce_interval: u64,
    initialized: bool,
}

impl Schedule {
    /// Conflicts (i.e. search steps) so far.
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }

    /// Restarts performed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }
}

/// Perform one step of the schedule.
///
/// For the CDCL strategies a step handles one conflict. Restarts and learned clause database
/// reductions run between steps, where the solver is between conflicts and no clause is being
/// analyzed. Returns `false` when the solver is done.
pub fn schedule_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ClauseActivityP,
        mut ClauseStoreP,
        mut DpllStateP,
        mut ImplGraphP,
        mut ScheduleP,
        mut SolverStateP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) -> bool {
    let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);

    if !ctx.part(SolverStateP).sat_state.is_open() {
        return false;
    }

    let strategy = ctx.part(SolverConfigP).strategy;

    if !schedule.initialized {
        schedule.initialized = true;
        let config = ctx.part(SolverConfigP);
        schedule.next_restart = config.luby_restart_interval_scale * schedule.luby.advance();
        schedule.next_reduce = config.reduce_first_interval;
        schedule.reduce_interval = config.reduce_first_interval;
    }

    if schedule.conflicts > 0 && schedule.conflicts % 5000 == 0 {
        let store = ctx.part(ClauseStoreP);
        let units = ctx.part(TrailP).top_level_len();
        info!(
            "confl: {}k rest: {} vars: {} orig: {} learned: {}",
            schedule.conflicts / 1000,
            schedule.restarts,
            ctx.part(AssignmentP).var_count() - units,
            store.original_count(),
            store.learned_count(),
        );
    }

    if strategy.uses_restarts() && schedule.conflicts == schedule.next_restart {
        restart(ctx.borrow());
        schedule.restarts += 1;
        let scale = ctx.part(SolverConfigP).luby_restart_interval_scale;
        schedule.next_restart = schedule.conflicts + scale * schedule.luby.advance();
    }

    if strategy.uses_reduction() && schedule.conflicts == schedule.next_reduce {
        reduce_db(ctx.borrow());
        schedule.reduce_interval += ctx.part(SolverConfigP).reduce_interval_growth;
        schedule.next_reduce = schedule.conflicts + schedule.reduce_interval;
    }

    if strategy.is_dpll() {
        dpll_step(ctx.borrow());
    } else {
        conflict_step(ctx.borrow());
    }
    schedule.conflicts += 1;

    true
}
