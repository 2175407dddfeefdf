use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lease_controller::{shell, Config, LeaseController, RentWindow, SandboxLedger};

#[derive(Parser)]
#[command(name = "leasectl")]
#[command(about = "Start, pay and end a rental agreement on a local ledger")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "leasectl.toml")]
    config: PathBuf,

    /// Where the monthly rent window starts (overrides config file)
    #[arg(long, env = "LEASECTL_RENT_WINDOW", value_enum)]
    rent_window: Option<RentWindow>,

    /// Seconds to wait for a confirmation (overrides config file)
    #[arg(long, env = "LEASECTL_CONFIRMATION_TIMEOUT")]
    confirmation_timeout: Option<u64>,
}

const DEFAULT_LOG: &str = "lease_controller=info";

/// `RUST_LOG` when it is set and valid, otherwise [`DEFAULT_LOG`].
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

fn main() -> anyhow::Result<()> {
    // stdout belongs to the command loop
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    if cfg!(panic = "abort") {
        warn!("built with panic = \"abort\": a reverted call ends the process, use --profile release-cli");
    }

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(rent_window) = cli.rent_window {
        config.policy.rent_window = rent_window;
    }
    if let Some(secs) = cli.confirmation_timeout {
        config.ledger.confirmation_timeout_secs = secs;
    }
    config.validate()?;

    let ledger = SandboxLedger::deploy(&config.lease, &config.ledger)?;
    let controller = LeaseController::new(ledger)
        .with_rent_window(config.policy.rent_window)
        .with_confirmation_timeout(config.ledger.confirmation_timeout());
    info!(
        rent_window = ?controller.rent_window(),
        timeout = ?config.ledger.confirmation_timeout(),
        "starting"
    );

    shell::run(&controller, io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some(" ".into())).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn rust_log_overrides_default() {
        let filter = log_filter(Some("lease_controller=debug".into()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = log_filter(Some("lease_controller=warn".into()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
