//! Commons command line: validate pool configurations and replay scenarios.

mod scenario;

use anyhow::Context;
use clap::Parser;
use commons_treasury::{PoolConfig, MAX_REQUEST_BPS};
use commons_utils::{format_duration, init_logging, LogFormat};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commons", about = "Commons treasury pool tooling")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "COMMONS_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "COMMONS_LOG_FORMAT")]
    log_format: LogFormat,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Load a pool configuration, validate it and print the effective values.
    #[command(name = "check-config")]
    CheckConfig {
        /// Path to a TOML pool configuration.
        #[arg(long, env = "COMMONS_CONFIG")]
        config: PathBuf,
    },

    /// Replay a JSON scenario against an in-memory pool and print its events.
    Simulate {
        /// Path to a TOML pool configuration.
        #[arg(long, env = "COMMONS_CONFIG")]
        config: PathBuf,

        /// Path to a JSON scenario file.
        #[arg(long)]
        scenario: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level)?;

    match cli.command {
        Command::CheckConfig { config } => {
            let pool_config = PoolConfig::from_toml_file(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            tracing::info!("Loaded config from {}", config.display());
            println!("pool:                {}", pool_config.name);
            println!("reference asset:     {}", pool_config.reference_asset);
            println!("minimum deposit:     {}", pool_config.min_deposit);
            println!(
                "voting period:       {}",
                format_duration(pool_config.voting_period_secs)
            );
            println!("quorum:              {}", pool_config.quorum_bps);
            println!("approval:            {}", pool_config.approval_bps);
            println!("guardian threshold:  {}", pool_config.guardian_threshold_bps);
            println!("request cap:         {MAX_REQUEST_BPS} bps");
        }
        Command::Simulate { config, scenario } => {
            let pool_config = PoolConfig::from_toml_file(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let script = scenario::Scenario::from_json_file(&scenario)
                .with_context(|| format!("loading {}", scenario.display()))?;
            tracing::info!(
                "Simulating {} steps on pool {}",
                script.steps.len(),
                pool_config.name
            );

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let report = scenario::run(pool_config, &script, &mut out)?;
            writeln!(out, "{}", serde_json::to_string(&report)?)?;

            if !report.unexpected.is_empty() {
                anyhow::bail!(
                    "{} step(s) did not behave as scripted: {:?}",
                    report.unexpected.len(),
                    report.unexpected
                );
            }
            tracing::info!("Simulation finished cleanly");
        }
    }

    Ok(())
}
