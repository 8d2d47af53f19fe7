use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::alias::{bus_node, publish_alias, remove_alias};
use crate::enumerate::{find_stub_bus, BusEnumerator, I2cDetect};
use crate::error::{ProvisionError, Result};
use crate::modctl::{chip_addr_param, ModuleController, Modprobe};
use crate::transport::{BusTransport, I2cCharDev};

const BUS_ACCESS_MODULE: &str = "i2c-dev";
const STUB_MODULE: &str = "i2c-stub";
const DEFAULT_DEV_DIR: &str = "/dev";

/// [`FakeI2cBus`] wired to the real host: modprobe, i2cdetect and the i2c
/// character device.
pub type HostFakeI2cBus = FakeI2cBus<Modprobe, I2cDetect, I2cCharDev>;

/// A simulated I2C bus backed by the kernel i2c-stub driver.
///
/// [`open`](Self::open) loads the stub with a set of emulated device
/// addresses, discovers the bus index the kernel assigned to it, and
/// publishes a stable `/dev/i2c-<logical>` symlink so callers address the
/// fake bus exactly as they would a real one. [`close`](Self::close) (or
/// drop, as a last resort) tears everything down.
///
/// The stub is host-global kernel state: only one fake bus may be active per
/// host at a time, and nothing here locks against a concurrent second
/// instance.
#[derive(Debug)]
pub struct FakeI2cBus<M: ModuleController, E: BusEnumerator, T: BusTransport> {
    modules: M,
    buses: E,
    transport: T,
    dev_dir: PathBuf,
    bus: Option<u32>,
    real_bus: Option<u32>,
    bus_link: Option<PathBuf>,
    real_bus_path: Option<PathBuf>,
}

impl HostFakeI2cBus {
    pub fn new() -> Self {
        FakeI2cBus::with_collaborators(Modprobe, I2cDetect, I2cCharDev::new())
    }

    /// Construct and provision in one step. On failure the partially opened
    /// state is torn down before the error is returned.
    pub fn open_new(bus: u32, devices: &[u16]) -> Result<Self> {
        Self::new().into_open(bus, devices)
    }
}

impl Default for HostFakeI2cBus {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ModuleController, E: BusEnumerator, T: BusTransport> FakeI2cBus<M, E, T> {
    pub fn with_collaborators(modules: M, buses: E, transport: T) -> Self {
        Self {
            modules,
            buses,
            transport,
            dev_dir: PathBuf::from(DEFAULT_DEV_DIR),
            bus: None,
            real_bus: None,
            bus_link: None,
            real_bus_path: None,
        }
    }

    /// Override the directory device nodes and the alias live under. Real
    /// hosts use `/dev`; tests point this at a tempdir.
    pub fn with_dev_dir(mut self, dev_dir: impl Into<PathBuf>) -> Self {
        self.dev_dir = dev_dir.into();
        self
    }

    /// Provision in one step, consuming the closed instance. On failure the
    /// partially opened state is torn down before the error is returned.
    pub fn into_open(mut self, bus: u32, devices: &[u16]) -> Result<Self> {
        if let Err(err) = self.open(bus, devices) {
            self.close();
            return Err(err);
        }
        Ok(self)
    }

    /// Provision the fake bus: load `i2c-dev`, force-reload `i2c-stub` with
    /// `devices` so no addresses from a prior run linger, discover the bus
    /// index the kernel assigned to the stub, publish the alias link and
    /// open the transport.
    ///
    /// Any failing step aborts the sequence and propagates. Nothing is
    /// rolled back automatically; call [`close`](Self::close), which
    /// tolerates partial state, to clean up after a failed open.
    pub fn open(&mut self, bus: u32, devices: &[u16]) -> Result<()> {
        if self.is_open() {
            return Err(ProvisionError::AlreadyOpen);
        }
        self.bus = Some(bus);

        self.modules.load(BUS_ACCESS_MODULE, None)?;
        self.modules.force_unload(STUB_MODULE)?;
        self.modules
            .load(STUB_MODULE, chip_addr_param(devices).as_deref())?;

        let listing = self.buses.list_buses()?;
        let real = find_stub_bus(&listing).ok_or(ProvisionError::StubNotFound)?;
        let real_path = bus_node(&self.dev_dir, real);

        let link = bus_node(&self.dev_dir, bus);
        publish_alias(&link, &real_path)?;
        self.real_bus = Some(real);
        self.real_bus_path = Some(real_path.clone());
        self.bus_link = Some(link);

        self.transport.open(&real_path)?;

        info!(bus, real_bus = real, "fake i2c bus provisioned");
        Ok(())
    }

    /// Tear down the fake bus: close the transport, unload the stub module,
    /// remove the alias link.
    ///
    /// Best effort and idempotent: each resource may already be partially or
    /// fully gone (after a failed `open`, or on a second `close`), so every
    /// failure is swallowed rather than allowed to mask the outcome the
    /// caller is reporting. Swallowed failures are logged at debug level.
    pub fn close(&mut self) {
        self.transport.close();

        if let Err(err) = self.modules.force_unload(STUB_MODULE) {
            debug!(error = %err, "ignoring stub unload failure during teardown");
        }

        if let Some(link) = self.bus_link.take() {
            if let Err(err) = remove_alias(&link) {
                debug!(
                    path = %link.display(),
                    error = %err,
                    "ignoring alias removal failure during teardown"
                );
            }
        }

        if self.bus.take().is_some() {
            info!("fake i2c bus released");
        }
        self.real_bus = None;
        self.real_bus_path = None;
    }

    /// Logical bus number the caller chose, if a bus is (or was being)
    /// opened.
    pub fn bus(&self) -> Option<u32> {
        self.bus
    }

    /// Path of the alias link, once published.
    pub fn bus_path(&self) -> Option<&Path> {
        self.bus_link.as_deref()
    }

    /// Kernel-assigned stub bus index, once discovered.
    pub fn real_bus(&self) -> Option<u32> {
        self.real_bus
    }

    /// Device node of the stub's actual bus, once discovered.
    pub fn real_bus_path(&self) -> Option<&Path> {
        self.real_bus_path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.real_bus.is_some()
    }
}

impl<M: ModuleController, E: BusEnumerator, T: BusTransport> Drop for FakeI2cBus<M, E, T> {
    /// Last-resort safety net; explicit `close` on every exit path is the
    /// primary teardown mechanism.
    fn drop(&mut self) {
        self.close();
    }
}

impl<M: ModuleController, E: BusEnumerator, T: BusTransport> fmt::Display for FakeI2cBus<M, E, T> {
    /// Renders the alias path; empty while no bus is open.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bus_link {
            Some(link) => write!(f, "{}", link.display()),
            None => Ok(()),
        }
    }
}
