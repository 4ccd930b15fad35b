//! Acquisition and storage configuration.
//!
//! An explicitly constructed object handed to the hub at startup; loaded
//! from an optional JSON file next to the executable. A malformed file logs
//! a warning and falls back to defaults rather than refusing to start.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::acquisition::port::DEFAULT_BAUD_RATE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Preferred device address; the connect sweep still tries every other
    /// system port when this one fails.
    pub port: String,
    pub baud_rate: u32,
    /// Directory holding the queryable store and the daily CSV logs.
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_dir: PathBuf::from("IoT_Data"),
        }
    }
}

fn default_port() -> &'static str {
    if cfg!(windows) {
        "COM5"
    } else {
        "/dev/ttyACM0"
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;

        match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(
                    "ignoring malformed settings file {}: {err}",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sensor_data.db")
    }
}
