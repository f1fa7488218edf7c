mod cli;
mod config;
mod error;
mod extract;
mod migration;
mod model;
mod providers;
mod store;
mod util;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(step) = cli::parse_step(&args) else {
        cli::print_help();
        return Ok(());
    };

    setup_logging();
    cli::run_step(step).await?;
    info!("done");
    Ok(())
}
