//! On-Air station entry point.

use std::error::Error;

use onair_station::config::{self, StationConfig};
use onair_station::logging;
use onair_station::station::Station;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let dotenv = config::load_dotenv();
    let config = StationConfig::from_env()?;
    logging::init(config.log_format);

    match dotenv {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "loaded .env"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    tracing::info!("Starting On-Air station");

    let station = Station::assemble(config).await?;
    station.run().await?;

    Ok(())
}
