//! Headless runner: wires logging, settings, and a log-backed status sink
//! around the hub, then collects until Ctrl-C. The GUI shell does the same
//! wiring with a real status display.

use std::path::Path;

use anyhow::Result;
use log::info;
use sensorhub::{SensorHub, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Reads RUST_LOG; defaults to info.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = Settings::load(Path::new("settings.json"))?;
    info!("data directory: {}", settings.data_dir.display());

    let hub = SensorHub::new(settings)?;
    hub.register_status_sink(Box::new(|status, message| {
        info!("[{}] {}", status.as_str(), message);
    }));

    hub.start().await;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    hub.stop().await;

    Ok(())
}
