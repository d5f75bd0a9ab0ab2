//! Heist - Development Tools

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use heist_core::config::SimConfig;
use heist_core::data::{EnemyTable, LevelData, PartyData};
use heist_tools::simulate::{self, RunSetup};
use heist_tools::validate::validate_data_directory;
use heist_tools::{ToolError, ToolResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "heist-tools")]
#[command(about = "Development tools for the heist game")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Run a level headless with a scripted walk and auto-battles
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Level file to run
    #[arg(long, value_name = "FILE")]
    level: PathBuf,

    /// Exploration ticks to simulate (60 per second)
    #[arg(long, default_value_t = 3600)]
    ticks: u64,

    /// Battle RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Tuning file (defaults to built-in values)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Party file (defaults to the built-in party)
    #[arg(long, value_name = "FILE")]
    party: Option<PathBuf>,

    /// Enemy table file (defaults to the built-in table)
    #[arg(long, value_name = "FILE")]
    enemies: Option<PathBuf>,

    /// Write the run summary as RON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl SimulateArgs {
    fn setup(&self) -> ToolResult<RunSetup> {
        let mut setup = RunSetup::new(simulate::load(&self.level, LevelData::from_ron_str)?)
            .with_seed(self.seed);
        if let Some(path) = &self.config {
            setup.config = simulate::load(path, SimConfig::from_ron_str)?;
        }
        if let Some(path) = &self.party {
            setup.party = simulate::load(path, PartyData::from_ron_str)?;
        }
        if let Some(path) = &self.enemies {
            setup.enemies = simulate::load(path, EnemyTable::from_ron_str)?;
        }
        Ok(setup)
    }

    fn execute(&self) -> ToolResult<()> {
        let summary = simulate::run(&self.setup()?, self.ticks)?;
        tracing::info!(
            level = %summary.level,
            ticks = summary.ticks,
            encounters = summary.encounters.len(),
            chests = summary.chests_opened,
            explored = summary.explored_tiles,
            wiped = summary.wiped,
            hash = summary.state_hash,
            "Run complete"
        );
        if let Some(path) = &self.report {
            write_report(path, &summary.to_ron()?)?;
        }
        Ok(())
    }
}

fn write_report(path: &Path, text: &str) -> ToolResult<()> {
    std::fs::write(path, text).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            match validate_data_directory(&path) {
                Ok(report) if report.is_ok() => {
                    tracing::info!("Validation passed ({} files)", report.checked());
                    ExitCode::SUCCESS
                }
                Ok(report) => {
                    tracing::error!(
                        "Validation failed: {} of {} files",
                        report.failures.len(),
                        report.checked()
                    );
                    ExitCode::FAILURE
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Simulate(args) => match args.execute() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Simulation failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
