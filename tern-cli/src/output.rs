//! JSON result objects written to stdout and the batch log.
use std::time::Duration;

use serde_json::{json, Value};

use tern::{Lit, SolverStrategy};

/// Result object for a completed solve.
///
/// `winner` names the configuration that produced the result; it is reported when racing or
/// when several configurations were selected.
pub fn solved_line(
    instance: &str,
    elapsed: Duration,
    result: bool,
    model: Option<&[Lit]>,
    winner: Option<SolverStrategy>,
) -> Value {
    let solution = match model {
        Some(model) => solution_string(model),
        None => "--".to_owned(),
    };

    let mut object = json!({
        "Instance": instance,
        "Time": format!("{:.2}", elapsed.as_secs_f64()),
        "Result": if result { "SAT" } else { "UNSAT" },
        "Solution": solution,
    });

    if let Some(winner) = winner {
        object["Solver"] = Value::String(winner.name().to_owned());
    }

    object
}

/// Placeholder object for timeouts and parse failures.
pub fn placeholder_line(instance: &str) -> Value {
    json!({
        "Instance": instance,
        "Time": "--",
        "Result": "--",
    })
}

/// Space separated `var true|false` pairs, one per variable.
fn solution_string(model: &[Lit]) -> String {
    let mut parts = Vec::with_capacity(model.len());
    for lit in model {
        parts.push(format!("{} {}", lit.var(), lit.is_positive()));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_line_format() {
        let model = [Lit::from_dimacs(1), Lit::from_dimacs(-2)];
        let line = solved_line(
            "tiny.cnf",
            Duration::from_millis(1234),
            true,
            Some(&model),
            Some(SolverStrategy::CdclVsidsLuby),
        );

        assert_eq!(line["Instance"], "tiny.cnf");
        assert_eq!(line["Time"], "1.23");
        assert_eq!(line["Result"], "SAT");
        assert_eq!(line["Solution"], "1 true 2 false");
        assert_eq!(line["Solver"], "cdcl_vsids_luby");
    }

    #[test]
    fn placeholder_format() {
        let line = placeholder_line("lost.cnf");

        assert_eq!(line["Time"], "--");
        assert_eq!(line["Result"], "--");
        assert!(line.get("Solver").is_none());
    }
}
