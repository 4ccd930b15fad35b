//! The boundary the rest of the application talks to.
//!
//! `SensorHub` owns both persistence sinks, the latest-reading cache, the
//! status notifier, and the acquisition worker's lifecycle. The GUI shell
//! only ever reads from here; it never touches the serial device.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::error;
use tokio::sync::Mutex;

use crate::{
    acquisition::{AcquisitionController, WorkerContext},
    cache::LatestReading,
    datalog::{DailyLog, LogInfo},
    db::Database,
    models::Reading,
    pipeline::SamplePipeline,
    settings::Settings,
    status::{StatusNotifier, StatusSink},
};

pub struct SensorHub {
    settings: Settings,
    db: Database,
    daily_log: DailyLog,
    cache: LatestReading,
    notifier: StatusNotifier,
    acquisition: Arc<Mutex<AcquisitionController>>,
}

impl SensorHub {
    /// Constructs both persistence sinks. Safe to call against an existing
    /// data directory; nothing is truncated or re-headered.
    pub fn new(settings: Settings) -> Result<Self> {
        let db = Database::new(settings.db_path())?;
        let daily_log = DailyLog::new(settings.data_dir.clone());

        Ok(Self {
            settings,
            db,
            daily_log,
            cache: LatestReading::new(),
            notifier: StatusNotifier::new(),
            acquisition: Arc::new(Mutex::new(AcquisitionController::new())),
        })
    }

    /// Snapshot of the most recent sample; zero-valued until the first one
    /// arrives. Never blocks, never fails.
    pub fn latest_reading(&self) -> Reading {
        self.cache.get()
    }

    /// Most-recent-first history from the queryable store. Storage errors
    /// degrade to an empty list rather than reaching the caller.
    pub async fn historical_readings(&self, limit: Option<usize>) -> Vec<Reading> {
        match self.db.recent_readings(limit).await {
            Ok(readings) => readings,
            Err(err) => {
                error!("historical read failed: {err:#}");
                Vec::new()
            }
        }
    }

    /// Replaces any previously registered sink.
    pub fn register_status_sink(&self, sink: StatusSink) {
        self.notifier.register(sink);
    }

    /// Where today's CSV export lives and how much is in it.
    pub fn daily_log_info(&self) -> Result<LogInfo> {
        self.daily_log.info()
    }

    pub fn data_dir(&self) -> &Path {
        &self.settings.data_dir
    }

    /// Idempotent: a second start while the worker is alive is a no-op.
    pub async fn start(&self) {
        let mut controller = self.acquisition.lock().await;
        let ctx = WorkerContext {
            settings: self.settings.clone(),
            pipeline: SamplePipeline::new(
                self.db.clone(),
                self.daily_log.clone(),
                self.cache.clone(),
            ),
            notifier: self.notifier.clone(),
        };
        controller.start(ctx);
    }

    /// Idempotent: cancels the worker if one is running and waits for it to
    /// release the device handle.
    pub async fn stop(&self) {
        let mut controller = self.acquisition.lock().await;
        controller.stop().await;
    }
}
