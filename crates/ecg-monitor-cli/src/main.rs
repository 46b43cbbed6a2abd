//! ECG monitor CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ecg_monitor_cli::{analyze, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => analyze::execute(args)?,
        Commands::Version => {
            println!("ecg-monitor {}", env!("CARGO_PKG_VERSION"));
            println!("core {}", ecg_monitor_core::VERSION);
        }
    }
    Ok(())
}
