//! I2C master over vendor requests
//!
//! The I2C target address travels in wValue and the data in the data stage.
//! Register-addressed reads are two separate transactions (write the
//! sub-address, then read), not a repeated-start transfer, so another bus user
//! can slip in between them.
//!
//! Two firmware builds exist that differ only in the request code used for
//! reads. The [`WireProfile`] type parameter selects one at compile time;
//! [`Combined`] matches the stock firmware.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::handle::{DeviceHandle, Fx2lpBus};
use crate::protocol::Request;
use crate::transport::ControlTransport;

/// Request codes used by one firmware variant
pub trait WireProfile {
    /// Short name for logs
    const NAME: &'static str;
    /// Request used for I2C reads
    const READ: Request;
    /// Request used for I2C writes
    const WRITE: Request;
}

/// Stock firmware: `VR_I2C_IO` (0x22) in both directions
#[derive(Debug, Clone, Copy, Default)]
pub struct Combined;

impl WireProfile for Combined {
    const NAME: &'static str = "combined";
    const READ: Request = Request::I2cIo;
    const WRITE: Request = Request::I2cIo;
}

/// Split firmware: writes on 0x22, reads on 0xA2
#[derive(Debug, Clone, Copy, Default)]
pub struct Split;

impl WireProfile for Split {
    const NAME: &'static str = "split";
    const READ: Request = Request::I2cRead;
    const WRITE: Request = Request::I2cIo;
}

/// I2C bus clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cSpeed {
    /// 100 kHz
    Standard,
    /// 400 kHz
    #[default]
    Fast,
}

impl I2cSpeed {
    /// Decode the firmware's 400 kHz flag
    pub fn from_flag(fast: bool) -> Self {
        if fast {
            I2cSpeed::Fast
        } else {
            I2cSpeed::Standard
        }
    }

    /// True for 400 kHz
    pub fn is_fast(self) -> bool {
        self == I2cSpeed::Fast
    }

    /// Clock in Hz
    pub fn hz(self) -> u32 {
        match self {
            I2cSpeed::Standard => 100_000,
            I2cSpeed::Fast => 400_000,
        }
    }
}

impl fmt::Display for I2cSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kHz", self.hz() / 1000)
    }
}

/// Build the payload for an addressed write: `sub_address` followed by `data`
///
/// The caller's buffer is left untouched.
pub fn addressed_payload(sub_address: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(data.len() + 1);
    payload.push(sub_address);
    payload.extend_from_slice(data);
    payload
}

fn check_address(address: u8) -> Result<u16> {
    if address <= 0x7F {
        Ok(address as u16)
    } else {
        Err(Error::InvalidI2cAddress(address))
    }
}

/// I2C master
///
/// Reads on a virtual device return zero bytes of the requested length;
/// writes do nothing.
pub struct I2cBus<T, P = Combined> {
    handle: DeviceHandle<T>,
    _profile: PhantomData<P>,
}

impl<T: ControlTransport, P: WireProfile> I2cBus<T, P> {
    /// Bind an I2C bus to a device handle without touching the device
    pub fn new(handle: DeviceHandle<T>) -> Self {
        log::debug!("I2C bus using {} wire profile", P::NAME);
        Self {
            handle,
            _profile: PhantomData,
        }
    }

    /// Bind an I2C bus and set its clock
    pub fn open(handle: DeviceHandle<T>, speed: I2cSpeed) -> Result<Self> {
        let bus = Self::new(handle);
        bus.set_speed(speed)?;
        Ok(bus)
    }

    /// Current bus clock
    ///
    /// A virtual device has no clock to report and returns `None`.
    pub fn speed(&self) -> Result<Option<I2cSpeed>> {
        let data = self.handle.query(Request::I2cSpeed, 0, 0, 1)?;
        Ok(data.map(|d| I2cSpeed::from_flag(d[0] != 0)))
    }

    /// Set the bus clock
    pub fn set_speed(&self, speed: I2cSpeed) -> Result<()> {
        log::debug!("Setting I2C speed to {}", speed);
        self.handle
            .write(Request::I2cSpeed, speed.is_fast() as u16, 0, &[])
    }

    /// Read `len` bytes from the device at `address`
    pub fn read_bytes(&self, address: u8, len: usize) -> Result<Vec<u8>> {
        let value = check_address(address)?;
        self.handle.read(P::READ, value, 0, len)
    }

    /// Read one byte from the device at `address`
    pub fn read_byte(&self, address: u8) -> Result<u8> {
        Ok(self.read_bytes(address, 1)?[0])
    }

    /// Write `data` to the device at `address`
    pub fn write_bytes(&self, address: u8, data: &[u8]) -> Result<()> {
        let value = check_address(address)?;
        self.handle.write(P::WRITE, value, 0, data)
    }

    /// Write one byte to the device at `address`
    pub fn write_byte(&self, address: u8, value: u8) -> Result<()> {
        self.write_bytes(address, &[value])
    }

    /// Select register `sub_address`, then read `len` bytes
    ///
    /// Issued as a one-byte write followed by a separate read.
    pub fn read_addressed_bytes(
        &self,
        address: u8,
        sub_address: u8,
        len: usize,
    ) -> Result<Vec<u8>> {
        check_address(address)?;
        self.write_byte(address, sub_address)?;
        self.read_bytes(address, len)
    }

    /// Read a single register
    pub fn read_addressed_byte(&self, address: u8, sub_address: u8) -> Result<u8> {
        Ok(self.read_addressed_bytes(address, sub_address, 1)?[0])
    }

    /// Write `data` starting at register `sub_address`
    ///
    /// Sent as one transfer with the sub-address prepended. Returns the number
    /// of data bytes, not counting the sub-address.
    pub fn write_addressed_bytes(
        &self,
        address: u8,
        sub_address: u8,
        data: &[u8],
    ) -> Result<usize> {
        self.write_bytes(address, &addressed_payload(sub_address, data))?;
        Ok(data.len())
    }

    /// Write a single register
    pub fn write_addressed_byte(&self, address: u8, sub_address: u8, value: u8) -> Result<()> {
        self.write_addressed_bytes(address, sub_address, &[value])
            .map(|_| ())
    }
}

impl<T: ControlTransport, P: WireProfile> Fx2lpBus for I2cBus<T, P> {
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
