//! Queryable store for sensor readings.
//!
//! A single SQLite connection lives on a dedicated worker thread; callers
//! submit closures over an mpsc channel and await the result on a oneshot.
//! That keeps the async consumers (history queries from the shell) and the
//! acquisition worker from ever sharing a connection.

use std::{
    convert::TryFrom,
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;

mod migrations;

use crate::models::Reading;
use migrations::run_migrations;

/// Rows returned by a history query when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("sensorhub-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(
                            Err(anyhow::Error::new(err).context("failed to open SQLite database")),
                        );
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    pub async fn insert_reading(&self, reading: &Reading) -> Result<()> {
        let record = reading.clone();
        self.execute(move |conn| {
            let timestamp = record
                .timestamp
                .ok_or_else(|| anyhow!("reading has no timestamp"))?;
            conn.execute(
                "INSERT INTO sensor_readings (timestamp, voltage, current, temperature)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    timestamp.to_rfc3339(),
                    record.voltage,
                    record.current,
                    record.temperature,
                ],
            )
            .with_context(|| "failed to insert sensor reading")?;
            Ok(())
        })
        .await
    }

    /// Most-recent-first history. Ties on the stored timestamp fall back to
    /// insertion order.
    pub async fn recent_readings(&self, limit: Option<usize>) -> Result<Vec<Reading>> {
        let limit = to_i64(limit.unwrap_or(DEFAULT_HISTORY_LIMIT) as u64)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, voltage, current, temperature
                 FROM sensor_readings
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                readings.push(Reading {
                    timestamp: Some(parse_datetime(&row.get::<_, String>(0)?)?),
                    voltage: row.get(1)?,
                    current: row.get(2)?,
                    temperature: row.get(3)?,
                });
            }

            Ok(readings)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn reading_at(offset_secs: i64, voltage: f64) -> Reading {
        Reading {
            voltage,
            current: 1.0,
            temperature: 20.0,
            timestamp: Some(Utc::now() + Duration::seconds(offset_secs)),
        }
    }

    #[tokio::test]
    async fn init_is_idempotent_and_preserves_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sensor_data.db");

        let db = Database::new(path.clone()).expect("first init");
        db.insert_reading(&reading_at(0, 4.2)).await.expect("insert");
        drop(db);

        let db = Database::new(path).expect("second init");
        let rows = db.recent_readings(None).await.expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].voltage, 4.2);
    }

    #[tokio::test]
    async fn recent_readings_are_most_recent_first_with_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("sensor_data.db")).expect("init");

        for (offset, voltage) in [(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)] {
            db.insert_reading(&reading_at(offset, voltage))
                .await
                .expect("insert");
        }

        let rows = db.recent_readings(Some(3)).await.expect("query");
        let voltages: Vec<f64> = rows.iter().map(|r| r.voltage).collect();
        assert_eq!(voltages, vec![4.0, 3.0, 2.0]);
    }

    #[tokio::test]
    async fn unstamped_reading_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("sensor_data.db")).expect("init");

        let mut reading = reading_at(0, 4.2);
        reading.timestamp = None;
        assert!(db.insert_reading(&reading).await.is_err());
    }
}
