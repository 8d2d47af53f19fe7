//! Provision a simulated I2C bus backed by the kernel `i2c-stub` driver.
//!
//! Loading `i2c-stub` with a set of 7-bit chip addresses reserves those
//! addresses on a new kernel-assigned bus. This crate handles the whole
//! lifecycle: module load, discovery of the assigned bus index, a stable
//! `/dev/i2c-<logical>` symlink so code under test addresses the fake bus
//! like a real one, and best-effort teardown. The stub only reserves
//! addresses; it does not model device register behavior, and bus reads and
//! writes stay with whatever bus-access library the code under test uses.
//!
//! ```no_run
//! use faux_i2c::HostFakeI2cBus;
//!
//! # fn main() -> faux_i2c::Result<()> {
//! let mut bus = HostFakeI2cBus::new();
//! bus.open(3, &[0x1c])?;
//! // hand bus.bus_path() to the code under test ...
//! bus.close();
//! # Ok(())
//! # }
//! ```

mod alias;
mod enumerate;
mod error;
mod modctl;
mod provision;
mod transport;

pub use crate::alias::bus_node;
pub use crate::enumerate::{find_stub_bus, BusEnumerator, I2cDetect, STUB_MARKER};
pub use crate::error::{ProvisionError, Result};
pub use crate::modctl::{chip_addr_param, ModuleController, Modprobe};
pub use crate::provision::{FakeI2cBus, HostFakeI2cBus};
pub use crate::transport::{BusTransport, I2cCharDev};
