//! PBM CLI - drive the purpose-bound money engine from a terminal
//!
//! Everything runs against an in-memory engine; nothing is persisted.
//!
//! ```bash
//! pbm demo                      # walk a disaster-relief token through its life
//! pbm templates                 # print every fund-type template as JSON
//! pbm sweep --tokens 5 --run-secs 4
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod demo;
mod sweep;

/// Purpose-bound money engine
#[derive(Parser)]
#[command(name = "pbm")]
#[command(version)]
#[command(about = "Issue, validate, spend and claw back purpose-bound money tokens", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Print JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk one disaster-relief token through validation, spending and clawback
    Demo,

    /// List the default restriction template of every fund type
    Templates,

    /// Issue short-lived tokens and let the periodic clawback sweep reclaim them
    Sweep {
        /// Number of tokens to issue
        #[arg(short, long, default_value = "5")]
        tokens: u32,

        /// Seconds between sweeps
        #[arg(long, default_value = "1")]
        interval_secs: u64,

        /// Seconds to keep the sweeper running
        #[arg(long, default_value = "4")]
        run_secs: u64,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_config() -> Result<pbm_engine::EngineConfig> {
    let config = pbm_engine::EngineConfig::from_env().context("reading PBM_* environment")?;
    config
        .validate()
        .map_err(|errors| anyhow!("invalid engine configuration: {}", errors.join("; ")))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Commands::Demo => demo::run(config, cli.json).await,
        Commands::Templates => {
            let registry = pbm_policy::PolicyTemplateRegistry::builtin();
            println!("{}", serde_json::to_string_pretty(&registry.all())?);
            Ok(())
        }
        Commands::Sweep {
            tokens,
            interval_secs,
            run_secs,
        } => {
            let config = pbm_engine::EngineConfig {
                sweep_interval_secs: interval_secs,
                ..config
            };
            sweep::run(config, tokens, run_secs, cli.json).await
        }
    }
}
