//! libusb backend through rusb

use std::time::Duration;

use fx2lp_core::error::{Error as CoreError, Result as CoreResult};
use fx2lp_core::protocol::Direction;
use fx2lp_core::ControlTransport;
use rusb::{Device, DeviceHandle, GlobalContext};

use crate::config::{Backend, UsbConfig, FX2LP_CONFIGURATION};
use crate::error::{Result, UsbError};
use crate::Fx2lpDeviceInfo;

/// FX2LP connection over libusb
pub struct RusbTransport {
    handle: DeviceHandle<GlobalContext>,
    timeout: Duration,
}

impl RusbTransport {
    /// Find, open and configure the device selected by `config`
    ///
    /// Returns `Ok(None)` if no device matches.
    pub fn open(config: &UsbConfig) -> Result<Option<Self>> {
        if config.interface.is_some() {
            return Err(UsbError::Unsupported {
                backend: Backend::Rusb.name(),
                option: "interface",
            });
        }

        let devices = matching_devices(config)?;
        let Some(device) = devices.get(config.device_index) else {
            log::warn!(
                "No FX2LP found (VID:{:04X} PID:{:04X} index {})",
                config.vendor_id,
                config.product_id,
                config.device_index
            );
            return Ok(None);
        };

        log::info!(
            "Opening FX2LP at bus {} address {} (libusb)",
            device.bus_number(),
            device.address()
        );

        let handle = device
            .open()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?;

        handle
            .set_active_configuration(FX2LP_CONFIGURATION)
            .map_err(|e| UsbError::ConfigurationFailed {
                configuration: FX2LP_CONFIGURATION,
                message: e.to_string(),
            })?;

        Ok(Some(Self {
            handle,
            timeout: config.timeout,
        }))
    }

    /// List all connected devices matching `config`
    pub fn list_devices(config: &UsbConfig) -> Result<Vec<Fx2lpDeviceInfo>> {
        Ok(matching_devices(config)?
            .iter()
            .map(|d| Fx2lpDeviceInfo {
                backend: Backend::Rusb,
                bus: d.bus_number().to_string(),
                address: d.address(),
            })
            .collect())
    }
}

fn matching_devices(config: &UsbConfig) -> Result<Vec<Device<GlobalContext>>> {
    let list = rusb::devices().map_err(|e| UsbError::EnumerationFailed(e.to_string()))?;
    Ok(list
        .iter()
        .filter(|d| {
            d.device_descriptor()
                .map(|desc| config.matches(desc.vendor_id(), desc.product_id()))
                .unwrap_or(false)
        })
        .collect())
}

impl ControlTransport for RusbTransport {
    fn control_read(
        &self,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
    ) -> CoreResult<Vec<u8>> {
        let request_type = Direction::Read.request_type();
        let mut buf = vec![0u8; length as usize];
        let n = self
            .handle
            .read_control(request_type, request, value, index, &mut buf, self.timeout)
            .map_err(CoreError::transport)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> CoreResult<()> {
        let request_type = Direction::Write.request_type();
        let n = self
            .handle
            .write_control(request_type, request, value, index, data, self.timeout)
            .map_err(CoreError::transport)?;
        if n < data.len() {
            return Err(CoreError::transport(format!(
                "device accepted {} of {} bytes",
                n,
                data.len()
            )));
        }
        Ok(())
    }
}
