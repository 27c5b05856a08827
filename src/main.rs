mod analytics;
mod config;
mod engine;
mod ensemble;
mod error;
mod journal;
mod risk;
mod strategies;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{Arbiter, ConfigLoader, SimulatorConfig};
use engine::{Session, SimulationController};

#[derive(Parser)]
#[command(name = "baccarat-oracle")]
#[command(version = "0.1.0")]
#[command(about = "Baccarat shoe simulator with a predictor ensemble and Martingale staking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deal and play hands as fast as possible
    Simulate {
        /// Number of hands to deal
        #[arg(short = 'n', long, default_value = "500")]
        hands: u64,
        /// Seed for the shoe and the randomised strategies
        #[arg(short, long)]
        seed: Option<u64>,
        /// Append every hand to this JSON-lines journal
        #[arg(short, long)]
        journal: Option<PathBuf>,
        /// Which pick is surfaced and staked
        #[arg(short, long, value_enum)]
        arbiter: Option<Arbiter>,
    },
    /// Deal hands on a timer; Ctrl-C stops after the current round
    Run {
        /// Number of hands to deal
        #[arg(short = 'n', long, default_value = "500")]
        hands: u64,
        /// Milliseconds between hands
        #[arg(short, long)]
        interval_ms: Option<u64>,
        /// Seed for the shoe and the randomised strategies
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Feed a recorded outcome string such as "PBBPT"
    Replay {
        /// Outcome codes, P/B/T; anything else is skipped
        #[arg(short, long)]
        outcomes: String,
        /// Which pick is surfaced and staked
        #[arg(short, long, value_enum)]
        arbiter: Option<Arbiter>,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Output file path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs)?;

    info!("Baccarat Oracle v0.1.0");

    match cli.command {
        Commands::Simulate { hands, seed, journal, arbiter } => {
            let mut config = load_config(&cli.config)?;
            config.table.seed = seed.or(config.table.seed);
            config.session.journal_path = journal.or(config.session.journal_path);
            config.session.arbiter = arbiter.unwrap_or(config.session.arbiter);
            run_simulation(config, hands)?;
        }
        Commands::Run { hands, interval_ms, seed } => {
            let mut config = load_config(&cli.config)?;
            config.table.seed = seed.or(config.table.seed);
            config.session.interval_ms = interval_ms.unwrap_or(config.session.interval_ms);
            run_paced(config, hands).await?;
        }
        Commands::Replay { outcomes, arbiter } => {
            let mut config = load_config(&cli.config)?;
            config.session.arbiter = arbiter.unwrap_or(config.session.arbiter);
            replay(config, &outcomes)?;
        }
        Commands::InitConfig { output } => {
            ConfigLoader::write_default(&output)?;
        }
        Commands::ShowConfig => {
            let config = load_config(&cli.config)?;
            let profile = config.staking.profile;
            println!("# Ladder: {} ({})", profile.name(), profile.description());
            println!("{}", ConfigLoader::render(&config)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(path: &Option<PathBuf>) -> Result<SimulatorConfig> {
    ConfigLoader::load(path.as_deref()).context("Failed to load configuration")
}

fn run_simulation(config: SimulatorConfig, hands: u64) -> Result<()> {
    info!("Simulating {} hands", hands);
    let mut session = Session::new(config).context("Failed to start session")?;

    for n in 1..=hands {
        session.play_hand()?;
        if n % 100 == 0 {
            info!(
                hands = n,
                bankroll = %session.staking().bankroll(),
                "Progress"
            );
        }
    }

    session.snapshot().print();
    session.finalize().print_summary();
    Ok(())
}

async fn run_paced(config: SimulatorConfig, hands: u64) -> Result<()> {
    let session = Session::new(config).context("Failed to start session")?;
    let controller = Arc::new(SimulationController::new(session));

    let stopper = Arc::clone(&controller);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, stopping after the current round");
            let _ = stopper.stop();
        }
    });

    let played = controller.run(hands).await?;
    info!("Played {} of {} hands", played, hands);

    let session = controller.session();
    let mut session = session.lock().await;
    session.snapshot().print();
    session.finalize().print_summary();
    Ok(())
}

fn replay(config: SimulatorConfig, outcomes: &str) -> Result<()> {
    let mut session = Session::new(config).context("Failed to start session")?;

    let recorded = outcomes
        .chars()
        .filter_map(|code| session.record_code(code))
        .count();
    info!("Replayed {} outcomes", recorded);

    let snapshot = session.snapshot();
    snapshot.print();
    for (name, verdict) in session.results().iter() {
        println!(
            "  {:<28} {:>4}  conf {:>5.1}  prob {:>5.1}",
            name,
            types::prediction_label(verdict.prediction),
            verdict.confidence,
            verdict.probability
        );
    }
    session.finalize().print_summary();
    Ok(())
}
