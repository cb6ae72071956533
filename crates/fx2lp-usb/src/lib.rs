//! fx2lp-usb - USB backends for the FX2LP vendor request firmware
//!
//! This crate finds an FX2LP by vendor/product ID, activates its
//! configuration and hands back a [`DeviceHandle`](fx2lp_core::DeviceHandle)
//! for the bus types in `fx2lp-core`. If no matching device is attached the
//! handle is virtual instead of an error.
//!
//! Two backends are available, selected at runtime through
//! [`UsbConfig::backend`]:
//! - `nusb` (feature `nusb`, default): pure-Rust USB stack
//! - `rusb` (feature `rusb`): libusb through the `rusb` bindings
//!
//! Both speak the same protocol; the choice only matters for the host
//! environment (driver availability, permissions).
//!
//! # Example
//!
//! ```no_run
//! use fx2lp_core::{GpioBus, Level, Port};
//! use fx2lp_usb::{open, UsbConfig};
//!
//! let handle = open(&UsbConfig::default())?;
//! let gpio = GpioBus::new(handle);
//! gpio.set_pin_direction(Port::A, 0, true)?;
//! gpio.set_pin_value(Port::A, 0, Level::High)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Configuration Options
//!
//! [`parse_options`] accepts the following `key=value` pairs:
//!
//! - `vid=0x04B4`, `pid=0x1004`: USB IDs to match (hex or decimal)
//! - `backend=nusb|rusb`: USB backend (`libusb` is an alias for `rusb`)
//! - `device=N` or `index=N`: pick the Nth matching device (0-indexed)
//! - `timeout=MS`: per-transfer timeout in milliseconds
//! - `interface=N`: claim interface N and send requests through it (nusb only,
//!   needed on hosts that refuse device-level control transfers)

mod config;
#[cfg(feature = "nusb")]
mod device;
mod error;
#[cfg(feature = "rusb")]
mod rusb_device;

pub use config::{parse_options, Backend, UsbConfig};
#[cfg(feature = "nusb")]
pub use device::NusbTransport;
pub use error::{Result, UsbError};
#[cfg(feature = "rusb")]
pub use rusb_device::RusbTransport;

use fx2lp_core::{BoxedTransport, DeviceHandle};

/// Location of a matching USB device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fx2lpDeviceInfo {
    /// Backend that found the device
    pub backend: Backend,
    /// USB bus identifier
    pub bus: String,
    /// USB device address
    pub address: u8,
}

impl std::fmt::Display for Fx2lpDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FX2LP at bus {} address {} ({})",
            self.bus, self.address, self.backend
        )
    }
}

/// Open the device described by `config` with its selected backend
///
/// Returns a virtual handle if no device matches. Failing to activate the
/// configuration of a matched device is an error.
pub fn open(config: &UsbConfig) -> Result<DeviceHandle<BoxedTransport>> {
    check_backend(config.backend)?;
    let transport: Option<BoxedTransport> = match config.backend {
        #[cfg(feature = "nusb")]
        Backend::Nusb => NusbTransport::open(config)?.map(|t| Box::new(t) as BoxedTransport),
        #[cfg(feature = "rusb")]
        Backend::Rusb => RusbTransport::open(config)?.map(|t| Box::new(t) as BoxedTransport),
        #[allow(unreachable_patterns)]
        backend => return Err(UsbError::BackendUnavailable(backend.name())),
    };
    Ok(DeviceHandle::from_transport(transport))
}

/// List matching devices using the backend selected in `config`
pub fn list_devices(config: &UsbConfig) -> Result<Vec<Fx2lpDeviceInfo>> {
    check_backend(config.backend)?;
    match config.backend {
        #[cfg(feature = "nusb")]
        Backend::Nusb => NusbTransport::list_devices(config),
        #[cfg(feature = "rusb")]
        Backend::Rusb => RusbTransport::list_devices(config),
        #[allow(unreachable_patterns)]
        backend => Err(UsbError::BackendUnavailable(backend.name())),
    }
}

fn check_backend(backend: Backend) -> Result<()> {
    if backend.is_available() {
        Ok(())
    } else {
        log::error!("USB backend '{}' was not compiled in", backend);
        Err(UsbError::BackendUnavailable(backend.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_backend_rejected_before_lookup() {
        for backend in [Backend::Nusb, Backend::Rusb] {
            if backend.is_available() {
                continue;
            }
            let config = UsbConfig {
                backend,
                ..UsbConfig::default()
            };
            assert!(matches!(
                open(&config),
                Err(UsbError::BackendUnavailable(name)) if name == backend.name()
            ));
            assert!(matches!(
                list_devices(&config),
                Err(UsbError::BackendUnavailable(_))
            ));
        }
    }

    #[test]
    fn test_backend_availability_follows_features() {
        assert_eq!(Backend::Nusb.is_available(), cfg!(feature = "nusb"));
        assert_eq!(Backend::Rusb.is_available(), cfg!(feature = "rusb"));
    }
}
