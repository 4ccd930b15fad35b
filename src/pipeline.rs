//! Routing for processed samples.
//!
//! Every sample lands in the cache. Idle (all-zero) samples stop there;
//! everything else is written to the queryable store, and real device data
//! additionally goes to the daily CSV log. Persistence failures are logged
//! and swallowed so acquisition never stalls on a sink.

use log::{debug, error};

use crate::{cache::LatestReading, datalog::DailyLog, db::Database, models::Sample};

#[derive(Clone)]
pub struct SamplePipeline {
    db: Database,
    daily_log: DailyLog,
    cache: LatestReading,
}

impl SamplePipeline {
    pub fn new(db: Database, daily_log: DailyLog, cache: LatestReading) -> Self {
        Self {
            db,
            daily_log,
            cache,
        }
    }

    pub async fn ingest(&self, sample: Sample) {
        self.cache.publish(sample.reading.clone());

        if sample.reading.is_idle() {
            debug!("skipping idle all-zero sample");
            return;
        }

        if let Err(err) = self.db.insert_reading(&sample.reading).await {
            error!("failed to store reading: {err:#}");
        }

        if sample.provenance.is_real() {
            if let Err(err) = self.daily_log.append(&sample.reading) {
                error!("failed to append daily log: {err:#}");
            }
        }
    }
}
