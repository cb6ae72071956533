//! SPI master over vendor requests
//!
//! All SPI data moves through `VR_SPI_IO` (0x21); the transfer direction
//! decides whether bytes are clocked out or in. The clock is a separate
//! register (`VR_SPI_SPEED`, 0xA5) holding the rate in Mbps.

use crate::error::Result;
use crate::handle::{DeviceHandle, Fx2lpBus};
use crate::protocol::{Request, DEFAULT_SPI_SPEED_MBPS};
use crate::transport::ControlTransport;

/// SPI master
pub struct SpiBus<T> {
    handle: DeviceHandle<T>,
}

impl<T: ControlTransport> SpiBus<T> {
    /// Bind an SPI bus to a device handle without touching the device
    pub fn new(handle: DeviceHandle<T>) -> Self {
        Self { handle }
    }

    /// Bind an SPI bus and set its clock
    pub fn open(handle: DeviceHandle<T>, speed_mbps: u8) -> Result<Self> {
        let bus = Self::new(handle);
        bus.set_speed_mbps(speed_mbps)?;
        Ok(bus)
    }

    /// Bind an SPI bus at the default clock of 10 Mbps
    pub fn open_default(handle: DeviceHandle<T>) -> Result<Self> {
        Self::open(handle, DEFAULT_SPI_SPEED_MBPS)
    }

    /// Current clock in Mbps, `None` on a virtual device
    pub fn speed_mbps(&self) -> Result<Option<u8>> {
        let data = self.handle.query(Request::SpiSpeed, 0, 0, 1)?;
        Ok(data.map(|d| d[0]))
    }

    /// Set the clock in Mbps
    pub fn set_speed_mbps(&self, mbps: u8) -> Result<()> {
        log::debug!("Setting SPI speed to {} Mbps", mbps);
        self.handle.write(Request::SpiSpeed, mbps as u16, 0, &[])
    }

    /// Clock `data` out on the bus
    ///
    /// The firmware handles this as a host-to-device transfer only; no
    /// response bytes come back in the same request. Whether the device
    /// latches MISO during this transfer is firmware specific, so read any
    /// response explicitly with [`read_bytes`](Self::read_bytes). Returns the
    /// number of bytes sent.
    pub fn exchange(&self, data: &[u8]) -> Result<usize> {
        self.handle.write(Request::SpiIo, 0, 0, data)?;
        Ok(data.len())
    }

    /// Clock in `len` bytes
    pub fn read_bytes(&self, len: usize) -> Result<Vec<u8>> {
        self.handle.read(Request::SpiIo, 0, 0, len)
    }

    /// Clock in one byte
    pub fn read_byte(&self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Clock out `data`
    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        self.handle.write(Request::SpiIo, 0, 0, data)
    }

    /// Clock out one byte
    pub fn write_byte(&self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }
}

impl<T: ControlTransport> Fx2lpBus for SpiBus<T> {
    type Transport = T;

    fn handle(&self) -> &DeviceHandle<T> {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut DeviceHandle<T> {
        &mut self.handle
    }

    fn into_handle(self) -> DeviceHandle<T> {
        self.handle
    }
}
