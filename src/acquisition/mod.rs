pub mod demo;
mod loop_worker;
pub mod port;

pub(crate) use loop_worker::WorkerContext;

use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use loop_worker::acquisition_loop;

/// Owns the background worker task's lifecycle. Start and stop are both
/// idempotent; stop cancels cooperatively and joins, which releases any held
/// device handle.
pub struct AcquisitionController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AcquisitionController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub(crate) fn start(&mut self, ctx: WorkerContext) {
        if self.is_running() {
            info!("acquisition already running");
            return;
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let handle = tokio::spawn(acquisition_loop(ctx, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    pub async fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                error!("acquisition task failed to join: {err}");
            }
        }
    }
}

impl Default for AcquisitionController {
    fn default() -> Self {
        Self::new()
    }
}
