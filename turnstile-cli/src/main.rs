use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use turnstile_cli::{
    ConfigOverrides, LogConfig, Result, SchemaTarget, SimulationOutcome, SimulationPlan,
    load_config, render_schema, run_simulation,
};

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(
    version,
    about = "Turnstile - turn coordination with liveness monitoring"
)]
struct Cli {
    /// Emit logs as JSON (stderr)
    #[arg(long, global = true)]
    json_logs: bool,

    /// Debug-level logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated session and print every action as a JSON line
    Simulate {
        /// Participants in turn order
        #[arg(
            short = 'p',
            long,
            value_delimiter = ',',
            required_unless_present = "players",
            conflicts_with = "players"
        )]
        participants: Vec<String>,

        /// Number of participants with generated ids, instead of --participants
        #[arg(short = 'n', long)]
        players: Option<usize>,

        /// Participants that stop sending heartbeats
        #[arg(short = 's', long, value_delimiter = ',')]
        silent: Vec<String>,

        /// Seats (0-based turn order) that stop sending heartbeats
        #[arg(long, value_delimiter = ',')]
        silent_seats: Vec<usize>,

        /// When silent participants stop heartbeating (ms)
        #[arg(long, default_value_t = 0)]
        silent_after_ms: u64,

        /// Stop after this long (ms)
        #[arg(short = 'd', long, default_value_t = 120_000)]
        duration_ms: u64,

        /// JSON config file (camelCase keys)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Print the effective configuration
    Config {
        /// JSON config file (camelCase keys)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Print a JSON schema
    Schema {
        #[arg(value_enum, default_value_t = SchemaTarget::Action)]
        target: SchemaTarget,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.verbose {
        LogConfig::dev()
    } else {
        LogConfig::default()
    };
    if cli.json_logs {
        log_config = log_config.with_json();
    }
    log_config.init()?;

    match cli.command {
        Commands::Simulate {
            participants,
            players,
            silent,
            silent_seats,
            silent_after_ms,
            duration_ms,
            config,
            overrides,
        } => {
            let config = load_config(config.as_deref(), &overrides)?;
            let plan = match players {
                Some(count) => SimulationPlan::generated(count, config),
                None => SimulationPlan::new(participants, config),
            };
            let mut plan = plan
                .with_silent_after(Duration::from_millis(silent_after_ms))
                .with_duration(Duration::from_millis(duration_ms));
            for id in silent {
                plan = plan.with_silent(id);
            }
            for seat in silent_seats {
                plan = plan.with_silent_seat(seat)?;
            }

            simulate(plan).await?;
        }
        Commands::Config { config, overrides } => {
            let config = load_config(config.as_deref(), &overrides)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Schema { target } => println!("{}", render_schema(target)?),
    }

    Ok(())
}

async fn simulate(plan: SimulationPlan) -> Result<()> {
    info!("Press Ctrl+C to stop");

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout().lock();
    let report = run_simulation(plan, &mut stdout, interrupt).await?;

    match report.outcome {
        SimulationOutcome::Suspended => info!("⏸️  Session suspended, nobody reachable"),
        SimulationOutcome::Completed => info!("✓ Simulation finished"),
        SimulationOutcome::Interrupted => info!("Simulation interrupted"),
    }
    info!(
        "{} turn starts, {} auto passes, {} emergency handoffs",
        report.count("turn_start"),
        report.count("auto_pass"),
        report.count("emergency_handoff")
    );

    Ok(())
}
