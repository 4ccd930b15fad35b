//! The acquisition state machine.
//!
//! One long-lived task owns the device: it sweeps for a port, collects real
//! lines while the connection holds, and generates demo data while it
//! doesn't, re-probing in the background so a plugged-in device is picked up
//! without user intervention. Everything funnels through the same pipeline;
//! only the provenance tag differs.

use std::io::Read;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use serialport::SerialPort;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{ConnectionStatus, Reading, Sample};
use crate::parser::{parse_line, ParsedLine};
use crate::pipeline::SamplePipeline;
use crate::settings::Settings;
use crate::status::StatusNotifier;

use super::demo::DemoGenerator;
use super::port::{is_permission_denied, open_port, probe_candidates, DeviceLink};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEMO_TICK: Duration = Duration::from_secs(1);
const REPROBE_INTERVAL: Duration = Duration::from_secs(5);
// Opening the port resets most boards; give the firmware a moment before
// trusting the stream.
const DEVICE_SETTLE: Duration = Duration::from_secs(2);

/// Everything the worker task needs, bundled at spawn time.
pub(crate) struct WorkerContext {
    pub settings: Settings,
    pub pipeline: SamplePipeline,
    pub notifier: StatusNotifier,
}

enum LoopExit {
    Cancelled,
    Disconnected,
}

pub(crate) async fn acquisition_loop(ctx: WorkerContext, cancel: CancellationToken) {
    ctx.notifier
        .notify(ConnectionStatus::Connecting, "Connecting to device");
    let mut next_link = try_connect(&ctx).await;

    while !cancel.is_cancelled() {
        let link = match next_link.take() {
            Some(link) => link,
            None => {
                ctx.notifier.notify(
                    ConnectionStatus::Demo,
                    "No device available; generating demo data",
                );
                match demo_loop(&ctx, &cancel).await {
                    Some(link) => link,
                    None => break,
                }
            }
        };

        ctx.notifier.notify(
            ConnectionStatus::Connected,
            &format!("Connected to {}", link.name),
        );
        match real_collection_loop(&ctx, link, &cancel).await {
            LoopExit::Cancelled => break,
            LoopExit::Disconnected => {
                // Straight to demo on the next pass; no retry storm against
                // a dead handle.
                ctx.notifier.notify(
                    ConnectionStatus::Disconnected,
                    "Device lost; falling back to demo data",
                );
            }
        }
    }

    ctx.notifier
        .notify(ConnectionStatus::Disconnected, "Acquisition stopped");
    info!("acquisition loop shutting down");
}

/// One full connect sweep: the configured address, then every port the OS
/// reports, each attempted once. Runs on a blocking thread since opening a
/// port can stall.
async fn try_connect(ctx: &WorkerContext) -> Option<DeviceLink> {
    let configured = ctx.settings.port.clone();
    let baud_rate = ctx.settings.baud_rate;
    let notifier = ctx.notifier.clone();

    let sweep =
        tokio::task::spawn_blocking(move || attempt_candidates(&configured, baud_rate, &notifier));

    match sweep.await {
        Ok(Some(link)) => {
            tokio::time::sleep(DEVICE_SETTLE).await;
            Some(link)
        }
        Ok(None) => None,
        Err(err) => {
            error!("connect sweep task failed: {err}");
            None
        }
    }
}

fn attempt_candidates(
    configured: &str,
    baud_rate: u32,
    notifier: &StatusNotifier,
) -> Option<DeviceLink> {
    for name in probe_candidates(configured) {
        match open_port(&name, baud_rate) {
            Ok(port) => {
                info!("connected to {name}");
                return Some(DeviceLink { name, port });
            }
            Err(err) => {
                if is_permission_denied(&err) {
                    notifier.notify(
                        ConnectionStatus::Error,
                        &format!("Port {name} is busy or access is denied"),
                    );
                }
                warn!("could not open {name}: {err}");
            }
        }
    }
    None
}

/// Poll the device on a fixed tick, draining whole lines into the pipeline.
/// Any read error counts as a disconnect and drops the handle.
async fn real_collection_loop(
    ctx: &WorkerContext,
    mut link: DeviceLink,
    cancel: &CancellationToken,
) -> LoopExit {
    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match poll_device(link.port.as_mut(), &mut pending) {
                    Ok(lines) => {
                        for raw in lines {
                            handle_line(ctx, &raw).await;
                        }
                    }
                    Err(err) => {
                        error!("read error on {}: {err}", link.name);
                        return LoopExit::Disconnected;
                    }
                }
            }
            _ = cancel.cancelled() => {
                info!("collection loop shutting down");
                return LoopExit::Cancelled;
            }
        }
    }
}

/// Non-blocking poll: take whatever the device has buffered and split out
/// complete lines, keeping any partial tail for the next tick.
fn poll_device(port: &mut dyn SerialPort, pending: &mut Vec<u8>) -> Result<Vec<String>> {
    let available = port.bytes_to_read()?;
    if available == 0 {
        return Ok(Vec::new());
    }

    let mut chunk = vec![0u8; available as usize];
    port.read_exact(&mut chunk)?;
    pending.extend_from_slice(&chunk);

    Ok(drain_lines(pending))
}

/// Split complete newline-terminated lines out of the buffer, decoding each
/// with replacement for invalid UTF-8.
fn drain_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&raw).trim().to_string());
    }
    lines
}

async fn handle_line(ctx: &WorkerContext, raw: &str) {
    match parse_line(raw) {
        Ok(ParsedLine::Frame(frame)) => {
            let reading = Reading::from_frame(frame, Utc::now());
            ctx.pipeline.ingest(Sample::real(reading)).await;
        }
        Ok(ParsedLine::Ignored) => {}
        Err(err) => warn!("dropping line '{raw}': {err}"),
    }
}

/// Generate one synthetic sample per tick, re-probing for a real device on a
/// fixed interval. Returns the new link on success, `None` when cancelled.
async fn demo_loop(ctx: &WorkerContext, cancel: &CancellationToken) -> Option<DeviceLink> {
    let mut generator = DemoGenerator::new();
    let mut ticker = interval(DEMO_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_probe = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if last_probe.elapsed() >= REPROBE_INTERVAL {
                    last_probe = Instant::now();
                    info!("checking for a device");
                    if let Some(link) = try_connect(ctx).await {
                        // Stop generating before the next tick so the first
                        // sample after reconnect is real data.
                        return Some(link);
                    }
                }

                let reading = Reading::from_frame(generator.next_frame(), Utc::now());
                ctx.pipeline.ingest(Sample::synthetic(reading)).await;
            }
            _ = cancel.cancelled() => {
                info!("demo loop shutting down");
                return None;
            }
        }
    }
}
