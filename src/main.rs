use anyhow::Result;
use climinha_core::{AppError, Config};
use climinha_ui::{terminal, AppServices};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    climinha_core::init()?;

    let (config, _validation) = Config::load_validated().map_err(|e| {
        let err = AppError::from(e);
        eprintln!("{}: {}", err.title(), err.user_message());
        err
    })?;
    tracing::info!("Config directory: {}", config.config_dir.display());

    let services = AppServices::from_config(&config)?;
    let commands = terminal::spawn_stdin_commands();

    tracing::info!("Climinha started");
    let last = climinha_ui::run(services, commands, terminal::draw).await;

    tracing::info!(fetch_state = ?last.fetch_state, "Climinha stopped");
    Ok(())
}
