//! FX2LP vendor request protocol constants
//!
//! Request codes and setup packet values understood by the FX2LP vendor
//! request firmware. These must match the firmware bit for bit.

/// USB vendor ID of the FX2LP firmware
pub const FX2LP_USB_VENDOR: u16 = 0x04B4;
/// USB product ID of the FX2LP firmware
pub const FX2LP_USB_PRODUCT: u16 = 0x1004;

/// bmRequestType for vendor reads (device-to-host | vendor | device)
pub const REQTYPE_VENDOR_IN: u8 = 0xC0;
/// bmRequestType for vendor writes (host-to-device | vendor | device)
pub const REQTYPE_VENDOR_OUT: u8 = 0x40;

/// VR_GPIO wValue selecting the direction (OE) register
pub const GPIO_SELECT_DIRECTION: u16 = 0x24;
/// VR_GPIO wValue selecting the I/O register
pub const GPIO_SELECT_IO: u16 = 0x25;

/// Largest data stage a control transfer can describe (wLength is 16 bits)
pub const MAX_TRANSFER_LEN: usize = u16::MAX as usize;

/// Default SPI clock pushed by [`SpiBus::open`](crate::SpiBus::open)
pub const DEFAULT_SPI_SPEED_MBPS: u8 = 10;

/// Vendor request codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// SPI data in or out
    SpiIo = 0x21,
    /// I2C data in or out, I2C address in wValue
    I2cIo = 0x22,
    /// GPIO register access, register select in wValue, port in wIndex
    Gpio = 0x23,
    /// I2C data in (split firmware variant only)
    I2cRead = 0xA2,
    /// Disconnect and re-enumerate
    Renumerate = 0xA3,
    /// I2C bus rate flag (0 = 100 kHz, 1 = 400 kHz)
    I2cSpeed = 0xA4,
    /// SPI clock in Mbps
    SpiSpeed = 0xA5,
}

impl Request {
    /// Request code as sent in bRequest
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a request by its code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x21 => Some(Request::SpiIo),
            0x22 => Some(Request::I2cIo),
            0x23 => Some(Request::Gpio),
            0xA2 => Some(Request::I2cRead),
            0xA3 => Some(Request::Renumerate),
            0xA4 => Some(Request::I2cSpeed),
            0xA5 => Some(Request::SpiSpeed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Request::SpiIo => "VR_SPI_IO",
            Request::I2cIo => "VR_I2C_IO",
            Request::Gpio => "VR_GPIO",
            Request::I2cRead => "VR_I2C_READ",
            Request::Renumerate => "VR_RENUMERATE",
            Request::I2cSpeed => "VR_I2C_SPEED",
            Request::SpiSpeed => "VR_SPI_SPEED",
        };
        write!(f, "{} (0x{:02X})", name, self.code())
    }
}

/// Data stage direction of a control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to host
    Read,
    /// Host to device
    Write,
}

impl Direction {
    /// bmRequestType for a vendor request in this direction
    pub const fn request_type(self) -> u8 {
        match self {
            Direction::Read => REQTYPE_VENDOR_IN,
            Direction::Write => REQTYPE_VENDOR_OUT,
        }
    }
}
