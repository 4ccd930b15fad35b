//! Append-only daily CSV log.
//!
//! One file per calendar day, real device data only. Every write opens the
//! day's file fresh, so a new day, a deleted file, or a missing directory is
//! repaired on the next sample rather than held as stale state.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use csv::WriterBuilder;
use serde::Serialize;

use crate::models::Reading;

const HEADER: [&str; 5] = ["timestamp", "voltage", "current", "temperature", "power"];

/// Summary of the current day's file, for the shell's export affordances.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: u64,
    pub record_count: u64,
}

#[derive(Clone)]
pub struct DailyLog {
    dir: PathBuf,
}

impl DailyLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of today's file. The date is evaluated per call, which is what
    /// rolls the log over at midnight.
    pub fn current_path(&self) -> PathBuf {
        let today = Local::now().format("%Y-%m-%d");
        self.dir.join(format!("sensor_data_{today}.csv"))
    }

    pub fn append(&self, reading: &Reading) -> Result<()> {
        let timestamp = reading
            .timestamp
            .ok_or_else(|| anyhow!("reading has no timestamp"))?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create data directory {}", self.dir.display()))?;

        let path = self.current_path();
        let is_new_file = !path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("failed to open daily log {}", path.display()))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new_file {
            writer
                .write_record(HEADER)
                .context("failed to write daily log header")?;
        }

        writer
            .write_record(&[
                timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                format!("{:.2}", reading.voltage),
                format!("{:.2}", reading.current),
                format!("{:.1}", reading.temperature),
                format!("{:.2}", reading.power()),
            ])
            .context("failed to append daily log row")?;
        writer.flush().context("failed to flush daily log")?;

        Ok(())
    }

    pub fn info(&self) -> Result<LogInfo> {
        let path = self.current_path();
        if !path.exists() {
            return Ok(LogInfo {
                path,
                exists: false,
                size_bytes: 0,
                record_count: 0,
            });
        }

        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        // Header row is not a record.
        let record_count = contents.lines().count().saturating_sub(1) as u64;

        Ok(LogInfo {
            path,
            exists: true,
            size_bytes,
            record_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorFrame;
    use chrono::Utc;

    fn reading(voltage: f64, current: f64, temperature: f64) -> Reading {
        Reading::from_frame(
            SensorFrame {
                voltage,
                current,
                temperature,
            },
            Utc::now(),
        )
    }

    #[test]
    fn header_is_written_exactly_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = DailyLog::new(dir.path());

        log.append(&reading(4.85, 1.23, 24.5)).expect("first append");
        log.append(&reading(4.90, 1.20, 24.6)).expect("second append");

        let contents = fs::read_to_string(log.current_path()).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,voltage,current,temperature,power");
        assert!(!lines[1].starts_with("timestamp"));
    }

    #[test]
    fn rows_use_fixed_precision_and_derived_power() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = DailyLog::new(dir.path());

        log.append(&reading(4.856, 1.234, 24.55)).expect("append");

        let contents = fs::read_to_string(log.current_path()).expect("read log");
        let row = contents.lines().nth(1).expect("data row");
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[1], "4.86");
        assert_eq!(fields[2], "1.23");
        assert_eq!(fields[3], "24.6");
        // power = 4.856 * 1.234, formatted to 2 decimals
        assert_eq!(fields[4], "5.99");
    }

    #[test]
    fn append_recreates_a_deleted_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("data");
        let log = DailyLog::new(&data_dir);

        log.append(&reading(4.0, 1.0, 20.0)).expect("first append");
        fs::remove_dir_all(&data_dir).expect("wipe data dir");
        log.append(&reading(4.1, 1.0, 20.0)).expect("append after wipe");

        let contents = fs::read_to_string(log.current_path()).expect("read log");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn info_counts_records_without_the_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = DailyLog::new(dir.path());

        let empty = log.info().expect("info on missing file");
        assert!(!empty.exists);
        assert_eq!(empty.record_count, 0);

        log.append(&reading(4.0, 1.0, 20.0)).expect("append");
        log.append(&reading(4.1, 1.1, 20.1)).expect("append");

        let info = log.info().expect("info");
        assert!(info.exists);
        assert_eq!(info.record_count, 2);
        assert!(info.size_bytes > 0);
    }
}
