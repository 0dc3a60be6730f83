//! Discrete-event simulation of a production line.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::WrapErr;
use indicatif::{ProgressBar, ProgressStyle};

use devsim::scenario::Scenario;
use devsim::{Simulator, Trace};

/// Runs a simulation scenario and prints the payloads reaching the system output.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Path to a scenario file. JSON if the extension is `.json`, MessagePack otherwise.
    scenario: PathBuf,

    /// Verbosity.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write the trace to this file in CSV format.
    #[clap(long)]
    csv: Option<PathBuf>,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,

    /// Do not display the progress spinner.
    #[clap(long)]
    no_progress: bool,
}

/// Opens the log file, replacing the logs of a previous run.
fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] {}",
                record.level(),
                record.target(),
                message
            ));
        })
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        dispatch.chain(open_log_file(path)?)
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn progress_bar(opt: &Opt) -> eyre::Result<ProgressBar> {
    if opt.no_progress {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner()
        .with_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")?);
    Ok(pb)
}

/// Steps through the simulation until it halts, reporting the clock on the spinner.
fn run(mut simulator: Simulator<String>, pb: &ProgressBar) -> eyre::Result<Trace<String>> {
    while let Some(time) = simulator.step()? {
        pb.set_message(format!(
            "[t={}] [steps={}] [out={}]",
            time,
            simulator.steps(),
            simulator.trace().len()
        ));
        pb.tick();
    }
    pb.finish_and_clear();
    Ok(simulator.into_trace())
}

fn write_csv(path: &Path, trace: &Trace<String>) -> eyre::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in trace {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;

    let scenario = Scenario::from_path(&opt.scenario)
        .wrap_err_with(|| format!("failed to load {}", opt.scenario.display()))?;
    let simulator = scenario
        .builder()?
        .build()
        .wrap_err("invalid simulation configuration")?;
    let trace = run(simulator, &progress_bar(&opt)?).wrap_err("simulation failed")?;
    log::info!("{} payloads reached the system output", trace.len());

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for record in &trace {
        writeln!(out, "{}", record)?;
    }
    out.flush()?;

    if let Some(path) = &opt.csv {
        write_csv(path, &trace).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
