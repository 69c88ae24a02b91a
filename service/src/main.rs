use std::path::Path;

use abi::Config;
use anyhow::{bail, Result};
use reservation_service::start_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    let filename = config_path()?;
    let config = Config::load(&filename)?;
    tracing::info!("loaded config from {}", filename);

    start_server(&config).await
}

// RESERVATION_CONFIG wins, then ./reservation.yml, ~/.config/reservation.yml, /etc/reservation.yml
fn config_path() -> Result<String> {
    if let Ok(path) = std::env::var("RESERVATION_CONFIG") {
        return Ok(path);
    }
    let candidates = [
        "./reservation.yml".to_string(),
        shellexpand::tilde("~/.config/reservation.yml").into_owned(),
        "/etc/reservation.yml".to_string(),
    ];
    match candidates.into_iter().find(|p| Path::new(p).exists()) {
        Some(path) => Ok(path),
        None => bail!("config file not found"),
    }
}
