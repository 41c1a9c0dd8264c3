//! simtrack - inspect and submit simulation runs from the command line.
//!
//! Thin wrapper over the simtrack library: builds a grid over the given
//! search roots and prints status or parameter sweeps, as text or JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simtrack::{Cholla, Flash, Reason, Result, SimCode, Simulation, SimulationGrid};

#[derive(Parser, Debug)]
#[command(name = "simtrack")]
#[command(about = "Inspect simulation run folders and submit jobs")]
struct Cli {
    /// Simulation code variant the folders belong to
    #[arg(long, value_enum, default_value_t = Code::Flash)]
    code: Code,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Code {
    Flash,
    Cholla,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the status of every simulation under the search roots
    Status {
        #[arg(required = true)]
        roots: Vec<PathBuf>,
    },
    /// Show one parameter's value across the grid
    Param {
        key: String,
        #[arg(required = true)]
        roots: Vec<PathBuf>,
    },
    /// Submit every not-yet-ran simulation under a root
    Submit {
        root: PathBuf,
        /// Job submission command, e.g. -- sbatch job.sh
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Restart one simulation from its newest checkpoint
    Restart {
        folder: PathBuf,
        /// Job submission command, e.g. -- sbatch job.sh
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct StatusRow {
    path: PathBuf,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<Reason>,
    failed: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simtrack=info,simtrack_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let outcome = match cli.code {
        Code::Flash => dispatch::<Flash>(&cli),
        Code::Cholla => dispatch::<Cholla>(&cli),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch<C: SimCode>(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Status { roots } => status::<C>(roots, cli.json),
        Command::Param { key, roots } => param::<C>(key, roots, cli.json),
        Command::Submit { root, command } => submit::<C>(root, command),
        Command::Restart { folder, command } => restart::<C>(folder, command),
    }
}

fn status_row<C: SimCode>(sim: &Simulation<C>) -> Result<StatusRow> {
    let complete = sim.complete()?;
    let reason = if complete {
        None
    } else {
        Some(sim.reason_incomplete()?)
    };
    Ok(StatusRow {
        path: sim.path().to_path_buf(),
        complete,
        reason,
        failed: sim.failed()?,
    })
}

fn status<C: SimCode>(roots: &[PathBuf], json: bool) -> Result<()> {
    let grid = SimulationGrid::<C>::from_roots(roots.iter().cloned())?;
    let rows = grid
        .sims()?
        .iter()
        .map(status_row)
        .collect::<Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows).expect("serializable rows"));
        return Ok(());
    }
    for row in &rows {
        let state = match (&row.reason, row.failed) {
            (None, _) => "complete".to_string(),
            (Some(reason), true) => format!("failed ({reason})"),
            (Some(reason), false) => format!("incomplete ({reason})"),
        };
        println!("{}\t{}", row.path.display(), state);
    }
    Ok(())
}

fn param<C: SimCode>(key: &str, roots: &[PathBuf], json: bool) -> Result<()> {
    let grid = SimulationGrid::<C>::from_roots(roots.iter().cloned())?;
    let sims = grid.sims()?;
    let values = grid.values(key)?;

    if json {
        let rows: Vec<_> = sims
            .iter()
            .zip(&values)
            .map(|(sim, value)| serde_json::json!({ "path": sim.path(), "value": value }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).expect("serializable rows"));
        return Ok(());
    }
    for (sim, value) in sims.iter().zip(&values) {
        println!(
            "{}\t{}",
            sim.path().display(),
            value.encode(sim.par().format())
        );
    }
    Ok(())
}

fn submit<C: SimCode>(root: &PathBuf, command: &[String]) -> Result<()> {
    let grid = SimulationGrid::<C>::new(root)?;
    let mut submitted = 0;
    for sim in grid.incomplete_sims()? {
        if sim.reason_incomplete()? != Reason::NotRan {
            continue;
        }
        info!(path = %sim.path().display(), "submitting");
        sim.run(command)?;
        submitted += 1;
    }
    info!(submitted, "done");
    Ok(())
}

fn restart<C: SimCode>(folder: &PathBuf, command: &[String]) -> Result<()> {
    let mut sim = Simulation::<C>::open(folder)?;
    info!(path = %sim.path().display(), "restarting from newest checkpoint");
    sim.restart(command)
}
