use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling;

use crate::{
    config::ClientConfig,
    scenario::{replay, Scenario, ScenarioServices},
    session::DEFAULT_TRANSACTION_TTL,
};

/// Swapbox CLI - Replays a swap against scripted wallet and market services
///
/// The scenario describes the market, the connected wallet and how the wallet answers approval,
/// permit and swap requests. Every step of the approval, review and confirm flow is printed as
/// JSON.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct CliArgs {
    /// Path of the JSON scenario to replay.
    #[clap(short = 's', long, env = "SWAPBOX_SCENARIO")]
    scenario: String,

    /// Seconds a submitted swap stays valid after the latest block.
    #[clap(long, default_value_t = DEFAULT_TRANSACTION_TTL, env = "SWAPBOX_TTL")]
    ttl: u64,

    /// Logging folder path.
    #[clap(long, default_value = "logs")]
    log_folder: String,

    /// Request an approval (or permit) before opening the review.
    #[clap(long)]
    approve: bool,

    /// Maximum confirm attempts while the wallet keeps failing.
    #[clap(short = 'n', long, default_value = "1")]
    retries: u32,

    /// Enable verbose logging.
    #[clap(long)]
    verbose: bool,
}

impl CliArgs {
    fn validate(&self) -> Result<(), String> {
        if self.ttl == 0 {
            return Err("ttl must be a positive number of seconds".to_string());
        }
        if self.retries == 0 {
            return Err("retries must be at least 1".to_string());
        }
        Ok(())
    }

    fn config(&self) -> Result<ClientConfig, String> {
        Ok(ClientConfig::new(self.ttl, self.retries)
            .map_err(|e| format!("Invalid configuration: {e}"))?
            .with_approval(self.approve))
    }
}

pub async fn run_cli() -> Result<(), String> {
    // Parse CLI Args
    let args: CliArgs = CliArgs::parse();
    args.validate()?;

    // Setup Logging
    let log_level = if args.verbose { "debug" } else { "info" };
    let (non_blocking, _guard) =
        tracing_appender::non_blocking(rolling::never(&args.log_folder, "swapbox.log"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(non_blocking)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set up logging subscriber: {e}"))?;

    let config = args.config()?;
    let scenario = Scenario::load(&args.scenario)
        .map_err(|e| format!("Failed to load {path}: {e}", path = &args.scenario))?;

    run(scenario, config).await
}

async fn run(scenario: Scenario, config: ClientConfig) -> Result<(), String> {
    info!("Running with version: {}", option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"));
    info!(
        chain = %scenario.chain,
        chain_id = scenario.chain.id(),
        ttl = config.settings().transaction_ttl(),
        attempts = config.confirm_attempts(),
        "ReplayingScenario"
    );

    let services = Arc::new(ScenarioServices::new(scenario));
    for step in replay(services, &config).await {
        let line = serde_json::to_string(&step)
            .map_err(|e| format!("Failed to serialize {step}: {e}", step = step.step))?;
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use clap::Parser;

    use super::CliArgs;

    #[test]
    fn test_cli_args() {
        let args = CliArgs::parse_from([
            "swapbox",
            "--scenario",
            "scenario.json",
            "--ttl",
            "600",
            "--log-folder",
            "test_logs",
            "--approve",
            "--retries",
            "3",
        ]);

        assert_eq!(args.scenario, "scenario.json");
        assert_eq!(args.ttl, 600);
        assert_eq!(args.log_folder, "test_logs");
        assert!(args.approve);
        assert_eq!(args.retries, 3);
        assert!(!args.verbose);
        assert!(args.validate().is_ok());

        let config = args.config().unwrap();
        assert_eq!(config.settings().transaction_ttl(), 600);
        assert!(config.approve_first());
    }

    #[test]
    fn test_cli_defaults_and_validation() {
        let args = CliArgs::parse_from(["swapbox", "-s", "scenario.json", "--ttl", "0"]);

        assert_eq!(args.retries, 1);
        assert_eq!(args.log_folder, "logs");
        assert!(args.validate().is_err());
    }
}
