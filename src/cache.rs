//! Single-slot latest-reading cache.
//!
//! The acquisition worker publishes every processed sample here, valid or
//! not, so the live display tracks device liveness even through idle
//! periods. Reads hand out a cloned snapshot; a reader can never observe a
//! half-written sample.

use std::sync::{Arc, RwLock};

use crate::models::Reading;

#[derive(Clone, Default)]
pub struct LatestReading {
    slot: Arc<RwLock<Reading>>,
}

impl LatestReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, reading: Reading) {
        let mut guard = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = reading;
    }

    /// Snapshot of the most recent sample; the zero-valued default until the
    /// first one arrives. Never blocks on acquisition and never fails.
    pub fn get(&self) -> Reading {
        let guard = match self.slot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }
}
