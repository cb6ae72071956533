//! nusb backend
//!
//! Vendor requests go to the device recipient. By default they are issued on
//! the device itself; with `interface=N` the interface is claimed first and
//! requests go through it, which some hosts require.

use std::time::Duration;

use fx2lp_core::error::{Error as CoreError, Result as CoreResult};
use fx2lp_core::ControlTransport;
use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient};
use nusb::{Device, Interface, MaybeFuture};

use crate::config::{Backend, UsbConfig, FX2LP_CONFIGURATION};
use crate::error::{Result, UsbError};
use crate::Fx2lpDeviceInfo;

/// Where control requests are submitted
enum Target {
    Device(Device),
    Interface(Interface),
}

/// FX2LP connection over nusb
pub struct NusbTransport {
    target: Target,
    timeout: Duration,
}

impl NusbTransport {
    /// Find, open and configure the device selected by `config`
    ///
    /// Returns `Ok(None)` if no device matches.
    pub fn open(config: &UsbConfig) -> Result<Option<Self>> {
        let devices = matching_devices(config)?;

        let Some(device_info) = devices.get(config.device_index) else {
            log::warn!(
                "No FX2LP found (VID:{:04X} PID:{:04X} index {})",
                config.vendor_id,
                config.product_id,
                config.device_index
            );
            return Ok(None);
        };

        log::info!(
            "Opening FX2LP at bus {} address {}",
            device_info.bus_id(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?;

        device
            .set_configuration(FX2LP_CONFIGURATION)
            .wait()
            .map_err(|e| UsbError::ConfigurationFailed {
                configuration: FX2LP_CONFIGURATION,
                message: e.to_string(),
            })?;

        let target = match config.interface {
            Some(number) => {
                let interface = device.claim_interface(number).wait().map_err(|e| {
                    UsbError::ClaimFailed {
                        interface: number,
                        message: e.to_string(),
                    }
                })?;
                log::debug!("Claimed interface {}", number);
                Target::Interface(interface)
            }
            None => Target::Device(device),
        };

        Ok(Some(Self {
            target,
            timeout: config.timeout,
        }))
    }

    /// List all connected devices matching `config`
    pub fn list_devices(config: &UsbConfig) -> Result<Vec<Fx2lpDeviceInfo>> {
        Ok(matching_devices(config)?
            .into_iter()
            .map(|d| Fx2lpDeviceInfo {
                backend: Backend::Nusb,
                bus: d.bus_id().to_string(),
                address: d.device_address(),
            })
            .collect())
    }
}

fn matching_devices(config: &UsbConfig) -> Result<Vec<nusb::DeviceInfo>> {
    Ok(nusb::list_devices()
        .wait()
        .map_err(|e| UsbError::EnumerationFailed(e.to_string()))?
        .filter(|d| config.matches(d.vendor_id(), d.product_id()))
        .collect())
}

impl ControlTransport for NusbTransport {
    fn control_read(
        &self,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
    ) -> CoreResult<Vec<u8>> {
        let setup = ControlIn {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request,
            value,
            index,
            length,
        };
        let result = match &self.target {
            Target::Device(device) => device.control_in(setup, self.timeout).wait(),
            Target::Interface(interface) => interface.control_in(setup, self.timeout).wait(),
        };
        result.map_err(CoreError::transport)
    }

    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> CoreResult<()> {
        let setup = ControlOut {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request,
            value,
            index,
            data,
        };
        let result = match &self.target {
            Target::Device(device) => device.control_out(setup, self.timeout).wait(),
            Target::Interface(interface) => interface.control_out(setup, self.timeout).wait(),
        };
        result.map_err(CoreError::transport)
    }
}
