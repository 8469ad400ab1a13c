use std::env;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Error};
use clap::{App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, Level, LevelFilter, Record};

use tern::SolverStrategy;

mod batch;
mod output;
mod race;

use output::{placeholder_line, solved_line};
use race::Outcome;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Warn);

    if let Ok(ref env_var) = env::var("TERN_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

/// Display name of an instance, its file name.
pub fn instance_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn main_with_err() -> Result<i32, Error> {
    init_logging();

    let strategy_names: Vec<&str> = SolverStrategy::ALL
        .iter()
        .map(|strategy| strategy.name())
        .collect();

    let matches = App::new("tern")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A CDCL and DPLL based SAT solver")
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The DIMACS CNF file to solve'")
        .arg(
            Arg::from_usage("[solver] -s --solver")
                .value_name("NAME")
                .help("Solver configuration to run; may be given multiple times")
                .possible_values(&strategy_names)
                .multiple(true)
                .number_of_values(1),
        )
        .arg_from_usage("--race 'Run the selected configurations concurrently, first result wins'")
        .arg_from_usage("[timeout] --timeout=[SECONDS] 'Wall clock limit per instance'")
        .arg_from_usage("[batch] --batch=[DIR] 'Solve every .cnf file in the given directory'")
        .arg_from_usage("[log] --log=[FILE] 'Log file for batch results, must not exist yet'")
        .get_matches();

    let race_mode = matches.is_present("race");

    let strategies: Vec<SolverStrategy> = match matches.values_of("solver") {
        Some(names) => names
            .map(|name| {
                SolverStrategy::from_name(name)
                    .ok_or_else(|| anyhow!("unknown solver configuration '{}'", name))
            })
            .collect::<Result<_, _>>()?,
        None if race_mode => SolverStrategy::ALL.to_vec(),
        None => vec![SolverStrategy::default()],
    };

    let timeout = matches
        .value_of("timeout")
        .map(|value| value.parse::<u64>())
        .transpose()
        .map_err(|_| anyhow!("--timeout expects a number of seconds"))?
        .map(Duration::from_secs);

    if let Some(dir) = matches.value_of("batch") {
        let log_path = matches
            .value_of("log")
            .ok_or_else(|| anyhow!("--batch requires --log <FILE>"))?;
        batch::run_batch(
            Path::new(dir),
            &strategies,
            race_mode,
            timeout,
            Path::new(log_path),
        )?;
        return Ok(0);
    }

    let input = matches
        .value_of("INPUT")
        .ok_or_else(|| anyhow!("no input file given"))?;
    let input = Path::new(input);
    let instance = instance_name(input);

    if race_mode {
        return report(input, &instance, &strategies, timeout, true);
    }

    // without --race the selected configurations run one after another
    let mut exit_code = 0;
    let report_winner = strategies.len() > 1;
    for &strategy in strategies.iter() {
        let code = report(
            input,
            &instance,
            std::slice::from_ref(&strategy),
            timeout,
            report_winner,
        )?;
        exit_code = exit_code.max(code);
    }
    Ok(exit_code)
}

/// Solve one instance, print its result object and return the exit code.
fn report(
    input: &Path,
    instance: &str,
    strategies: &[SolverStrategy],
    timeout: Option<Duration>,
    report_winner: bool,
) -> Result<i32, Error> {
    match race::solve_file(input, strategies, timeout) {
        Ok((
            Outcome::Solved {
                result,
                model,
                winner,
            },
            elapsed,
        )) => {
            let winner = if report_winner { Some(winner) } else { None };
            println!(
                "{}",
                solved_line(instance, elapsed, result, model.as_deref(), winner)
            );
            Ok(0)
        }
        Ok((Outcome::Timeout, _)) => {
            println!("{}", placeholder_line(instance));
            Ok(1)
        }
        Err(err) => {
            error!("{}", err);
            println!("{}", placeholder_line(instance));
            Ok(1)
        }
    }
}
