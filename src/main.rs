use clap::Parser;
use complaint_rag::cli::{execute, uses_terminal_ui, Cli};
use complaint_rag::config::Config;
use complaint_rag::utils::{init_file_logger, init_logger};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // The terminal UI owns stdout, so its logs go to a rolling file instead.
    let _guard = if uses_terminal_ui(&cli) {
        Some(init_file_logger(&config.data.log_dir)?)
    } else {
        init_logger()?;
        None
    };
    debug!(?config, "Configuration loaded");

    if let Err(e) = execute(cli, config).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
