//! Boundary-level tests against a scratch data directory. The acquisition
//! worker is not started here so nothing probes the machine's real serial
//! ports.

use std::path::Path;

use sensorhub::{SensorHub, Settings};

fn settings_in(dir: &Path) -> Settings {
    Settings {
        port: "/dev/ttyNOPE0".into(),
        data_dir: dir.join("IoT_Data"),
        ..Settings::default()
    }
}

#[tokio::test]
async fn construction_is_idempotent_against_an_existing_store() {
    let dir = tempfile::tempdir().expect("tempdir");

    let hub = SensorHub::new(settings_in(dir.path())).expect("first init");
    drop(hub);
    let hub = SensorHub::new(settings_in(dir.path())).expect("second init");

    assert!(hub.historical_readings(None).await.is_empty());
}

#[tokio::test]
async fn latest_reading_defaults_to_zero_before_any_sample() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hub = SensorHub::new(settings_in(dir.path())).expect("init");

    let reading = hub.latest_reading();
    assert_eq!(reading.voltage, 0.0);
    assert_eq!(reading.current, 0.0);
    assert_eq!(reading.temperature, 0.0);
    assert!(reading.timestamp.is_none());
}

#[tokio::test]
async fn historical_readings_on_a_fresh_store_are_empty_not_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hub = SensorHub::new(settings_in(dir.path())).expect("init");

    assert!(hub.historical_readings(Some(50)).await.is_empty());
}

#[tokio::test]
async fn stop_without_start_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hub = SensorHub::new(settings_in(dir.path())).expect("init");

    hub.stop().await;
    hub.stop().await;
}

#[tokio::test]
async fn daily_log_info_reports_the_data_dir_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hub = SensorHub::new(settings_in(dir.path())).expect("init");

    let info = hub.daily_log_info().expect("info");
    assert!(!info.exists);
    assert!(info.path.starts_with(hub.data_dir()));
}
