use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{ProvisionError, Result};

/// Open/close contract for the bus transport collaborator.
///
/// Reads and writes against the bus are delegated to external bus-access
/// libraries; provisioning only needs the device held open for the lifetime
/// of the fake bus.
pub trait BusTransport {
    fn open(&mut self, node: &Path) -> Result<()>;
    fn close(&mut self);
}

/// Transport over an `/dev/i2c-<N>` character device.
#[derive(Debug, Default)]
pub struct I2cCharDev {
    file: Option<File>,
}

impl I2cCharDev {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl BusTransport for I2cCharDev {
    fn open(&mut self, node: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(node)
            .map_err(|source| ProvisionError::Transport {
                path: node.to_path_buf(),
                source,
            })?;
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) {
        self.file = None;
    }
}
