use std::process::Command;

use tracing::debug;

use crate::error::{ProvisionError, Result};

/// Narrow capability over kernel module state.
///
/// Module loads act on host-global kernel state, so the provisioning core
/// depends only on this seam; tests drive it against an in-memory double
/// instead of the host's modprobe.
pub trait ModuleController {
    /// Load `name`, optionally with a `key=value` module parameter.
    fn load(&mut self, name: &str, params: Option<&str>) -> Result<()>;

    /// Unload `name`, treating "not currently loaded" as success. A module
    /// that cannot be unloaded (still in use) is an error.
    fn force_unload(&mut self, name: &str) -> Result<()>;
}

/// Host implementation backed by `modprobe`.
#[derive(Debug, Default)]
pub struct Modprobe;

impl Modprobe {
    fn run(&self, args: &[&str]) -> Result<()> {
        let command = format!("modprobe {}", args.join(" "));
        debug!(%command, "running module command");

        let output = Command::new("modprobe")
            .args(args)
            .output()
            .map_err(|source| ProvisionError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(ProvisionError::CommandFailed {
            command,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ModuleController for Modprobe {
    fn load(&mut self, name: &str, params: Option<&str>) -> Result<()> {
        match params {
            Some(params) => self.run(&[name, params]),
            None => self.run(&[name]),
        }
    }

    fn force_unload(&mut self, name: &str) -> Result<()> {
        // `modprobe -r` exits 0 when the module is not loaded, so that
        // outcome passes the exit check; a module that is pinned in use
        // exits non-zero and must abort the reload sequence, otherwise the
        // subsequent load would no-op and leave a prior run's addresses
        // live.
        self.run(&["-r", name])
    }
}

/// Format a device address set as the i2c-stub `chip_addr=` parameter:
/// lowercase hex, order preserved, comma-separated, no spaces.
///
/// An empty set yields `None`; the stub is then loaded without parameters
/// and reserves nothing.
pub fn chip_addr_param(addrs: &[u16]) -> Option<String> {
    if addrs.is_empty() {
        return None;
    }
    let list = addrs
        .iter()
        .map(|a| format!("{a:#x}"))
        .collect::<Vec<_>>()
        .join(",");
    Some(format!("chip_addr={list}"))
}

#[cfg(test)]
mod tests {
    use super::chip_addr_param;

    #[test]
    fn chip_addr_is_lowercase_hex_comma_separated() {
        assert_eq!(
            chip_addr_param(&[0x20, 0x50]).as_deref(),
            Some("chip_addr=0x20,0x50")
        );
    }

    #[test]
    fn chip_addr_preserves_caller_order() {
        assert_eq!(
            chip_addr_param(&[0x50, 0x1c, 0x20]).as_deref(),
            Some("chip_addr=0x50,0x1c,0x20")
        );
    }

    #[test]
    fn empty_address_set_yields_no_parameter() {
        assert_eq!(chip_addr_param(&[]), None);
    }
}
