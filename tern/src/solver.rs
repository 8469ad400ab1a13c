//! Boolean satisfiability solver.
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use anyhow::Error;
use log::info;

use tern_formula::{CnfFormula, Lit, Var};

use crate::config::SolverConfig;
use crate::context::{config_changed, ensure_var_count, AssignmentP, Context, SolverConfigP, SolverStateP};
use crate::load::load_clause;
use crate::schedule::schedule_step;
use crate::state::SatState;

/// A boolean satisfiability solver.
///
/// One instance owns all state of a single solve and is used from a single thread. To race
/// several configurations, give every solver its own copy of the formula.
#[derive(Default)]
pub struct Solver {
    ctx: Box<Context>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Solver {
        let mut solver = Solver::default();
        {
            let mut ctx = solver.ctx.into_partial_ref_mut();
            *ctx.part_mut(SolverConfigP) = config;
            config_changed(ctx.borrow());
        }
        solver
    }

    /// Add a formula to the solver.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ensure_var_count(ctx.borrow(), formula.var_count());
        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }
    }

    /// Read and add a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = tern_dimacs::parse_dimacs(input)?;

        info!(
            "parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );

        self.add_formula(&formula);

        Ok(())
    }

    /// Install a cancellation flag.
    ///
    /// The solver polls the flag between conflicts, which is its only safe interruption point,
    /// and gives up the solve when the flag is set. Used by drivers that race several solvers
    /// and by timeout enforcement.
    pub fn set_interrupt(&mut self, interrupt: Arc<AtomicBool>) {
        self.interrupt = Some(interrupt);
    }

    /// Check the satisfiability of the current formula.
    ///
    /// Returns `None` when the solve was interrupted.
    pub fn solve(&mut self) -> Option<bool> {
        let mut ctx = self.ctx.into_partial_ref_mut();

        while ctx.part(SolverStateP).sat_state.is_open() {
            if let Some(interrupt) = &self.interrupt {
                if interrupt.load(Ordering::Relaxed) {
                    return None;
                }
            }
            schedule_step(ctx.borrow());
        }

        match ctx.part(SolverStateP).sat_state {
            SatState::Unknown => None,
            SatState::Sat => Some(true),
            SatState::Unsat => Some(false),
        }
    }

    /// A satisfying total assignment, one literal per variable.
    ///
    /// Only available after [`solve`](Solver::solve) returned `Some(true)`. Variables that occur
    /// in no clause are free and reported positive.
    pub fn model(&self) -> Option<Vec<Lit>> {
        let ctx = self.ctx.into_partial_ref();

        if ctx.part(SolverStateP).sat_state != SatState::Sat {
            return None;
        }

        Some(
            ctx.part(AssignmentP)
                .assignment()
                .iter()
                .enumerate()
                .map(|(index, value)| Var::from_index(index).lit(value.unwrap_or(true)))
                .collect(),
        )
    }
}
