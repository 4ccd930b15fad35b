//! Connection status notifications for the embedding shell.

use std::sync::{Arc, Mutex};

use log::debug;

use crate::models::ConnectionStatus;

pub type StatusSink = Box<dyn Fn(ConnectionStatus, &str) + Send + Sync>;

/// Holds at most one sink; registering again replaces the previous one.
/// Notifications run synchronously on the acquisition worker, so sinks must
/// hand off anything slow.
#[derive(Clone, Default)]
pub struct StatusNotifier {
    sink: Arc<Mutex<Option<StatusSink>>>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sink: StatusSink) {
        let mut guard = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(sink);
    }

    pub fn notify(&self, status: ConnectionStatus, message: &str) {
        debug!("status -> {}: {}", status.as_str(), message);
        let guard = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(sink) = guard.as_ref() {
            sink(status, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn notify_without_a_sink_is_a_no_op() {
        let notifier = StatusNotifier::new();
        notifier.notify(ConnectionStatus::Demo, "no sink registered");
    }

    #[test]
    fn registering_replaces_the_previous_sink() {
        let notifier = StatusNotifier::new();
        let first_hits = Arc::new(AtomicUsize::new(0));
        let second_hits = Arc::new(AtomicUsize::new(0));

        let counter = first_hits.clone();
        notifier.register(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        notifier.notify(ConnectionStatus::Connecting, "first sink");

        let counter = second_hits.clone();
        notifier.register(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        notifier.notify(ConnectionStatus::Connected, "second sink");
        notifier.notify(ConnectionStatus::Demo, "second sink again");

        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sink_sees_status_and_message() {
        let notifier = StatusNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink_seen = seen.clone();
        notifier.register(Box::new(move |status, message| {
            sink_seen
                .lock()
                .expect("seen lock")
                .push((status, message.to_string()));
        }));

        notifier.notify(ConnectionStatus::Demo, "fallback active");

        let seen = seen.lock().expect("seen lock");
        assert_eq!(
            seen.as_slice(),
            &[(ConnectionStatus::Demo, "fallback active".to_string())]
        );
    }
}
