use clap::Parser;
use tracing_subscriber::EnvFilter;

use vetsoc::commands;
use vetsoc::config::{Cli, Command, Config};
use vetsoc::state::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::debug!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    tracing::debug!("Backend: {}", config.api.base_url);

    let ctx = AppContext::open(config).await?;
    let command = cli.command.unwrap_or(Command::Whoami);

    let mut out = std::io::stdout().lock();
    commands::run(&ctx, command, &mut out).await
}
