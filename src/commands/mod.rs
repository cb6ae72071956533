//! CLI command implementations
//!
//! Each bus gets its own module taking ownership of the opened device handle.

pub mod gpio;
pub mod i2c;
mod list;
pub mod spi;

pub use list::{list_devices, list_programmers};

use fx2lp_core::{BoxedTransport, DeviceHandle};

/// Command result
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Format bytes as space-separated hex
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ask the device to drop off the bus and enumerate again
pub fn renumerate(handle: DeviceHandle<BoxedTransport>) -> CommandResult {
    if handle.is_virtual() {
        println!("No device attached, nothing to renumerate");
    }
    handle.renumerate()?;
    Ok(())
}
