//! Batch harness: solve every CNF file in a directory and append results to a log file.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Error};
use log::error;

use tern::SolverStrategy;

use crate::output::{placeholder_line, solved_line};
use crate::race::{self, Outcome};
use crate::instance_name;

/// Run every `.cnf` file in `dir` and append one result line per instance to `log_path`.
///
/// An existing log file is never overwritten. Timeouts and files that fail to parse are logged
/// with the `--` placeholder object and don't abort the batch.
pub fn run_batch(
    dir: &Path,
    strategies: &[SolverStrategy],
    report_winner: bool,
    timeout: Option<Duration>,
    log_path: &Path,
) -> Result<(), Error> {
    if log_path.exists() {
        bail!(
            "refusing to overwrite existing log file '{}'",
            log_path.display()
        );
    }

    let mut log = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(log_path)?;

    let mut instances: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "cnf"))
        .collect();
    instances.sort();

    for path in instances {
        let instance = instance_name(&path);

        let line = match race::solve_file(&path, strategies, timeout) {
            Ok((Outcome::Solved {
                result,
                model,
                winner,
            }, elapsed)) => solved_line(
                &instance,
                elapsed,
                result,
                model.as_deref(),
                if report_winner { Some(winner) } else { None },
            ),
            Ok((Outcome::Timeout, _)) => placeholder_line(&instance),
            Err(err) => {
                error!("{}: {}", path.display(), err);
                placeholder_line(&instance)
            }
        };

        println!("{}", line);
        writeln!(log, "{}", line)?;
    }

    Ok(())
}
