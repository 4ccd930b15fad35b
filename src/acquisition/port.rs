//! Serial port helpers: opening, enumeration, and probe ordering.

use std::time::Duration;

use log::warn;
use serialport::SerialPort;

/// Matches the device firmware's line rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

const OPEN_TIMEOUT: Duration = Duration::from_millis(1000);

/// An open device handle plus the address it was opened on. Dropping it
/// closes the port.
pub struct DeviceLink {
    pub name: String,
    pub port: Box<dyn SerialPort>,
}

pub fn open_port(name: &str, baud_rate: u32) -> serialport::Result<Box<dyn SerialPort>> {
    serialport::new(name, baud_rate)
        .timeout(OPEN_TIMEOUT)
        .open()
}

/// Every serial address the OS currently knows about. Enumeration failure is
/// an empty candidate list, not an error.
pub fn system_port_names() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(err) => {
            warn!("serial port enumeration failed: {err}");
            Vec::new()
        }
    }
}

/// Candidate order for one probe pass: the configured address first, then
/// everything else the OS reports, deduplicated.
pub fn probe_candidates(configured: &str) -> Vec<String> {
    let mut candidates = vec![configured.to_string()];
    for name in system_port_names() {
        if !candidates.contains(&name) {
            candidates.push(name);
        }
    }
    candidates
}

/// A busy or access-denied port is worth a status annotation before the
/// fallback kicks in; other open failures are routine.
pub fn is_permission_denied(err: &serialport::Error) -> bool {
    matches!(
        err.kind(),
        serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
    )
}
