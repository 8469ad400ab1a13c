//! Running solver configurations, optionally racing several of them.
//!
//! Every configuration gets its own thread, its own solver and its own deep copy of the
//! instance; no state is shared between racers. The first completed solve wins, the losers are
//! cancelled through their interrupt flags and joined. Wall clock limits use the same machinery
//! with a receive timeout, so a lone configuration with a timeout is simply a race of one.
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Error;

use tern::{CnfFormula, Lit, Solver, SolverConfig, SolverStrategy};
use tern_dimacs::parse_dimacs;

/// What happened to an instance.
pub enum Outcome {
    Solved {
        result: bool,
        model: Option<Vec<Lit>>,
        winner: SolverStrategy,
    },
    Timeout,
}

/// Parse a DIMACS CNF file and run the given configurations on it.
///
/// The reported duration covers parsing and solving.
pub fn solve_file(
    path: &Path,
    strategies: &[SolverStrategy],
    timeout: Option<Duration>,
) -> Result<(Outcome, Duration), Error> {
    let start = Instant::now();

    let file = fs::File::open(path)?;
    let formula = parse_dimacs(file)?;

    let outcome = run(&formula, strategies, timeout);

    Ok((outcome, start.elapsed()))
}

/// Race the given configurations on one formula.
pub fn run(
    formula: &CnfFormula,
    strategies: &[SolverStrategy],
    timeout: Option<Duration>,
) -> Outcome {
    let (sender, receiver) = mpsc::channel();

    let interrupts: Vec<Arc<AtomicBool>> = strategies
        .iter()
        .map(|_| Arc::new(AtomicBool::new(false)))
        .collect();

    let mut racers = vec![];

    for (&strategy, interrupt) in strategies.iter().zip(interrupts.iter()) {
        let sender = sender.clone();
        let interrupt = interrupt.clone();
        let formula = formula.clone();

        racers.push(thread::spawn(move || {
            let mut solver = Solver::with_config(SolverConfig::with_strategy(strategy));
            solver.set_interrupt(interrupt);
            solver.add_formula(&formula);

            // a cancelled solver returns None and reports nothing
            if let Some(result) = solver.solve() {
                let model = if result { solver.model() } else { None };
                let _ = sender.send((strategy, result, model));
            }
        }));
    }

    // the receiver should only wait for the racers
    drop(sender);

    let winner = match timeout {
        Some(limit) => receiver.recv_timeout(limit).ok(),
        None => receiver.recv().ok(),
    };

    // first completion wins; stop all other racers before joining them
    for interrupt in interrupts.iter() {
        interrupt.store(true, Ordering::Relaxed);
    }
    for racer in racers {
        let _ = racer.join();
    }

    match winner {
        Some((winner, result, model)) => Outcome::Solved {
            result,
            model,
            winner,
        },
        None => Outcome::Timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(clauses: &[&[isize]]) -> CnfFormula {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            let lits: Vec<Lit> = clause.iter().map(|&n| Lit::from_dimacs(n)).collect();
            formula.add_clause(&lits);
        }
        formula
    }

    #[test]
    fn race_reports_a_winner() {
        let formula = formula(&[&[1, 2], &[-1, 3], &[-2, -3]]);

        match run(&formula, &SolverStrategy::ALL, None) {
            Outcome::Solved { result, model, .. } => {
                assert!(result);
                let model = model.unwrap();
                for clause in formula.iter() {
                    assert!(clause.iter().any(|lit| model.contains(lit)));
                }
            }
            Outcome::Timeout => panic!("race without timeout cannot time out"),
        }
    }

    #[test]
    fn unsat_race() {
        let formula = formula(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);

        match run(&formula, &SolverStrategy::ALL, Some(Duration::from_secs(60))) {
            Outcome::Solved { result, model, .. } => {
                assert!(!result);
                assert!(model.is_none());
            }
            Outcome::Timeout => panic!("trivial instance timed out"),
        }
    }
}
