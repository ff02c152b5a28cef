//! hostsweep
//!
//! Detects the host's package manager and runs the maintenance pipeline:
//! repo refresh, upgrade, orphan and cache cleanup, kernel pruning, then the
//! Flatpak, Snap, Docker, journal and temp file cleanups.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use hostsweep_core::{CoreError, SweepConfig, enabled_tasks};
use hostsweep_pkg::{ManagerKind, Operation, PackageError, detect, plan_for};
use tracing_subscriber::EnvFilter;

mod config;
mod factory;

#[derive(Parser, Debug)]
#[command(name = "hostsweep", version, about = "Host maintenance orchestrator", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $HOSTSWEEP_CONFIG, ./hostsweep.toml, /etc/hostsweep/hostsweep.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the maintenance pipeline (default)
    Run {
        /// Log what would run without executing anything
        #[arg(long)]
        dry_run: bool,
        /// Continue with the remaining steps after a failure
        #[arg(long)]
        keep_going: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the detected package manager
    Detect,
    /// Print the command plans without executing them
    Plan {
        /// Plan for this manager instead of the detected one
        #[arg(short, long)]
        manager: Option<ManagerKind>,
        /// Print the plans as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (config, source) = config::load_default(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose);

    match &source {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config file"),
        None => tracing::warn!("no config file found, using defaults"),
    }

    let command = cli.command.unwrap_or(Commands::Run {
        dry_run: false,
        keep_going: false,
        json: false,
    });

    match command {
        Commands::Run {
            dry_run,
            keep_going,
            json,
        } => {
            let dry_run = dry_run || config.general.dry_run;
            let keep_going = keep_going || config.general.continue_on_error;
            let config = config
                .with_dry_run(dry_run)
                .with_continue_on_error(keep_going);
            run(config, json).await
        }
        Commands::Detect => {
            let kind = detect(factory::create_probe().as_ref());
            println!("{kind}");
            Ok(if kind.is_supported() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Plan { manager, json } => {
            print_plans(&config, manager, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(config: &SweepConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: SweepConfig, json: bool) -> Result<ExitCode> {
    let pipeline = factory::create_pipeline(config).await;

    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(CoreError::Package(PackageError::NoSupportedManager)) => {
            eprintln!("hostsweep: {}", PackageError::NoSupportedManager);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_plans(config: &SweepConfig, manager: Option<ManagerKind>, json: bool) -> Result<()> {
    let probe = factory::create_probe();
    let kind = manager.unwrap_or_else(|| detect(probe.as_ref()));

    let mut plans = Vec::new();
    for op in Operation::PIPELINE {
        plans.push((op.to_string(), plan_for(kind, op, &config.params)?));
    }
    for task in enabled_tasks(&config.cleanup) {
        plans.push((task.name().to_string(), task.plan(&config.params)));
    }

    if json {
        let value: Vec<_> = plans
            .iter()
            .map(|(name, plan)| serde_json::json!({ "step": name, "plan": plan }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "manager": kind, "steps": value }))?
        );
        return Ok(());
    }

    println!("manager: {kind}");
    for (name, plan) in &plans {
        println!("{name}:");
        for step in &plan.steps {
            println!("  {step}");
        }
        if let Some(note) = &plan.note {
            println!("  # {note}");
        }
    }
    Ok(())
}
