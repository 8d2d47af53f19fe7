use std::process::Command;

use tracing::debug;

use crate::error::{ProvisionError, Result};

/// Marker `i2cdetect -l` prints in the description of a bus served by the
/// i2c-stub driver.
pub const STUB_MARKER: &str = "SMBus stub driver";

/// Source of the host's bus listing, one bus per line.
pub trait BusEnumerator {
    fn list_buses(&mut self) -> Result<String>;
}

/// Host implementation backed by `i2cdetect -l`.
#[derive(Debug, Default)]
pub struct I2cDetect;

impl BusEnumerator for I2cDetect {
    fn list_buses(&mut self) -> Result<String> {
        let command = "i2cdetect -l";
        debug!(%command, "enumerating buses");

        let output = Command::new("i2cdetect")
            .arg("-l")
            .output()
            .map_err(|source| ProvisionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProvisionError::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Find the stub bus index in a listing: first line containing
/// [`STUB_MARKER`], first whitespace-delimited token of the form `i2c-<N>`.
///
/// If several stub lines are present the first one wins. That mirrors the
/// stock tooling and is documented behavior, not a multi-stub
/// disambiguation rule.
pub fn find_stub_bus(listing: &str) -> Option<u32> {
    for line in listing.lines() {
        if !line.contains(STUB_MARKER) {
            continue;
        }
        let Some(id) = line.split_whitespace().next() else {
            continue;
        };
        if let Some(n) = id.strip_prefix("i2c-").and_then(|n| n.parse().ok()) {
            debug!(bus = %id, "stub bus discovered");
            return Some(n);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::find_stub_bus;

    #[test]
    fn parses_stub_index_from_listing() {
        let listing = "\
i2c-0\tsmbus\tSMBus PIIX4 adapter at 0b00\tSMBus adapter
i2c-7\tsmbus\tSMBus stub driver\tSMBus adapter
";
        assert_eq!(find_stub_bus(listing), Some(7));
    }

    #[test]
    fn missing_marker_yields_none() {
        let listing = "i2c-0\tsmbus\tSMBus PIIX4 adapter at 0b00\tSMBus adapter\n";
        assert_eq!(find_stub_bus(listing), None);
    }

    #[test]
    fn empty_listing_yields_none() {
        assert_eq!(find_stub_bus(""), None);
    }

    #[test]
    fn first_stub_line_wins() {
        let listing = "\
i2c-3\tsmbus\tSMBus stub driver\tSMBus adapter
i2c-9\tsmbus\tSMBus stub driver\tSMBus adapter
";
        assert_eq!(find_stub_bus(listing), Some(3));
    }
}
