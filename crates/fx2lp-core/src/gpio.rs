//! GPIO register access
//!
//! The firmware exposes two 8-bit registers per port through `VR_GPIO`:
//!
//! | wValue | Register  | Bit meaning            |
//! |--------|-----------|------------------------|
//! | 0x24   | Direction | 1 = output, 0 = input  |
//! | 0x25   | I/O       | pin level              |
//!
//! wIndex carries the port index (A=0 .. E=4). Nothing is cached on the host;
//! every pin operation round-trips to the device. Pin updates read the
//! register, change one bit and write it back, which is not atomic with
//! respect to other users of the same port.

use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::handle::{DeviceHandle, Fx2lpBus};
use crate::pin::{Pin, PinConfig};
use crate::protocol::{Request, GPIO_SELECT_DIRECTION, GPIO_SELECT_IO};
use crate::transport::ControlTransport;

/// Number of pins on each port
pub const PINS_PER_PORT: u8 = 8;

/// GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Port {
    /// Port A (index 0)
    A,
    /// Port B (index 1)
    B,
    /// Port C (index 2)
    C,
    /// Port D (index 3)
    D,
    /// Port E (index 4)
    E,
}

impl Port {
    /// All ports in index order
    pub const ALL: [Port; 5] = [Port::A, Port::B, Port::C, Port::D, Port::E];

    /// Port index as sent in wIndex
    pub const fn index(self) -> u8 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
            Port::E => 4,
        }
    }

    /// Port letter
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
        }
    }

    /// Port from its index
    pub fn from_index(index: u8) -> Result<Self> {
        Port::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::InvalidPort(index.to_string()))
    }

    /// Port from its letter (case-insensitive)
    pub fn from_letter(letter: char) -> Result<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Ok(Port::A),
            'B' => Ok(Port::B),
            'C' => Ok(Port::C),
            'D' => Ok(Port::D),
            'E' => Ok(Port::E),
            _ => Err(Error::InvalidPort(letter.to_string())),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Port {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Port::from_letter(c),
            _ => Err(Error::InvalidPort(s.to_string())),
        }
    }
}

/// Anything that names a port: a [`Port`], its letter, or its index
///
/// Conversion happens before any transfer, so a bad port never reaches the
/// device.
pub trait IntoPort {
    /// Resolve to a port
    fn into_port(self) -> Result<Port>;
}

impl IntoPort for Port {
    fn into_port(self) -> Result<Port> {
        Ok(self)
    }
}

impl IntoPort for char {
    fn into_port(self) -> Result<Port> {
        Port::from_letter(self)
    }
}

impl IntoPort for &str {
    fn into_port(self) -> Result<Port> {
        self.parse()
    }
}

impl IntoPort for u8 {
    fn into_port(self) -> Result<Port> {
        Port::from_index(self)
    }
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    /// Logic 0
    #[default]
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// True for [`Level::High`]
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    /// Level as a register bit
    pub fn bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Any non-zero value is high
impl From<u8> for Level {
    fn from(v: u8) -> Self {
        Level::from(v != 0)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.bit()
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bit())
    }
}

/// Port register selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Output enable (1 = output)
    Direction,
    /// Pin levels
    Io,
}

impl Register {
    /// wValue selecting this register
    pub const fn select(self) -> u16 {
        match self {
            Register::Direction => GPIO_SELECT_DIRECTION,
            Register::Io => GPIO_SELECT_IO,
        }
    }
}

/// Validate a pin index and return its bit mask
fn pin_mask(pin: u8) -> Result<u8> {
    if pin < PINS_PER_PORT {
        Ok(1 << pin)
    } else {
        Err(Error::InvalidPin(pin))
    }
}

/// Replace one bit of a register value
fn with_bit(reg: u8, mask: u8, set: bool) -> u8 {
    (reg & !mask) | if set { mask } else { 0 }
}

/// GPIO access over `VR_GPIO`
pub struct GpioBus<T> {
    handle: DeviceHandle<T>,
}

impl<T: ControlTransport> GpioBus<T> {
    /// Bind a GPIO bus to a device handle
    pub fn new(handle: DeviceHandle<T>) -> Self {
        Self { handle }
    }

    /// Read a whole port register
    ///
    /// Returns 0 on a virtual device.
    pub fn read_port(&self, port: impl IntoPort, register: Register) -> Result<u8> {
        let port = port.into_port()?;
        let data = self
            .handle
            .read(Request::Gpio, register.select(), port.index() as u16, 1)?;
        Ok(data[0])
    }

    /// Write a whole port register
    ///
    /// The firmware only changes I/O bits of pins configured as outputs.
    pub fn write_port(&self, port: impl IntoPort, register: Register, value: u8) -> Result<()> {
        let port = port.into_port()?;
        self.handle.write(
            Request::Gpio,
            register.select(),
            port.index() as u16,
            &[value],
        )
    }

    /// Read-modify-write one bit of a port register
    fn update_bit(&self, port: Port, register: Register, pin: u8, set: bool) -> Result<()> {
        let mask = pin_mask(pin)?;
        let current = self.read_port(port, register)?;
        let updated = with_bit(current, mask, set);
        log::debug!(
            "GPIO {:?} {}{}: 0x{:02X} -> 0x{:02X}",
            register,
            port,
            pin,
            current,
            updated
        );
        self.write_port(port, register, updated)
    }

    /// Configure a pin as output (`true`) or input (`false`)
    pub fn set_pin_direction(&self, port: impl IntoPort, pin: u8, output: bool) -> Result<()> {
        let port = port.into_port()?;
        pin_mask(pin)?;
        self.update_bit(port, Register::Direction, pin, output)
    }

    /// Current direction of a pin (`true` = output)
    pub fn get_pin_direction(&self, port: impl IntoPort, pin: u8) -> Result<bool> {
        let port = port.into_port()?;
        let mask = pin_mask(pin)?;
        Ok(self.read_port(port, Register::Direction)? & mask != 0)
    }

    /// Read the level of a pin
    pub fn get_pin_value(&self, port: impl IntoPort, pin: u8) -> Result<Level> {
        let port = port.into_port()?;
        let mask = pin_mask(pin)?;
        Ok(Level::from(self.read_port(port, Register::Io)? & mask != 0))
    }

    /// Drive a pin to `level`
    pub fn set_pin_value(
        &self,
        port: impl IntoPort,
        pin: u8,
        level: impl Into<Level>,
    ) -> Result<()> {
        let port = port.into_port()?;
        pin_mask(pin)?;
        self.update_bit(port, Register::Io, pin, level.into().is_high())
    }

    /// Create a [`Pin`] on this bus
    pub fn pin(&self, id: u8, config: PinConfig) -> Result<Pin<'_, T>> {
        Pin::new(self, id, config)
    }
}

impl<T: ControlTransport> Fx2lpBus for GpioBus<T> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::protocol::Direction;

    #[test]
    fn test_port_parsing() {
        assert_eq!("a".parse::<Port>().unwrap(), Port::A);
        assert_eq!('E'.into_port().unwrap(), Port::E);
        assert_eq!(3u8.into_port().unwrap(), Port::D);
        assert!(matches!('F'.into_port(), Err(Error::InvalidPort(_))));
        assert!(matches!(5u8.into_port(), Err(Error::InvalidPort(_))));
        assert!("AB".parse::<Port>().is_err());
        for (i, port) in Port::ALL.iter().enumerate() {
            assert_eq!(port.index() as usize, i);
        }
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(7u8), Level::High);
        assert_eq!(Level::from(0u8), Level::Low);
        assert_eq!(!Level::Low, Level::High);
        assert_eq!(u8::from(Level::High), 1);
    }

    #[test]
    fn test_with_bit() {
        assert_eq!(with_bit(0b1010_1010, 1 << 0, true), 0b1010_1011);
        assert_eq!(with_bit(0b1010_1010, 1 << 1, false), 0b1010_1000);
        assert_eq!(with_bit(0xFF, 1 << 7, true), 0xFF);
    }

    #[test]
    fn test_set_direction_read_modify_write() {
        let mock = MockTransport::new();
        mock.push_response(vec![0b0000_0001]);
        let gpio = GpioBus::new(DeviceHandle::new(&mock));

        gpio.set_pin_direction(Port::B, 3, true).unwrap();

        let transfers = mock.transfers();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].direction, Direction::Read);
        assert_eq!(transfers[0].request, 0x23);
        assert_eq!(transfers[0].value, 0x24);
        assert_eq!(transfers[0].index, 1);
        assert_eq!(transfers[0].length, 1);
        assert_eq!(transfers[1].direction, Direction::Write);
        assert_eq!(transfers[1].value, 0x24);
        assert_eq!(transfers[1].index, 1);
        assert_eq!(transfers[1].data, vec![0b0000_1001]);
    }

    #[test]
    fn test_set_value_preserves_other_bits() {
        let mock = MockTransport::new();
        mock.push_response(vec![0b1111_0000]);
        let gpio = GpioBus::new(DeviceHandle::new(&mock));

        gpio.set_pin_value('E', 7, Level::Low).unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].value, 0x25);
        assert_eq!(writes[0].index, 4);
        assert_eq!(writes[0].data, vec![0b0111_0000]);
    }

    #[test]
    fn test_set_value_normalises_level() {
        let mock = MockTransport::new();
        let gpio = GpioBus::new(DeviceHandle::new(&mock));

        gpio.set_pin_value(Port::A, 2, 0x80u8).unwrap();
        assert_eq!(mock.writes()[0].data, vec![0b0000_0100]);
    }

    #[test]
    fn test_get_value_masks_bit() {
        let mock = MockTransport::new();
        mock.push_response(vec![0b0010_0000]);
        mock.push_response(vec![0b0010_0000]);
        let gpio = GpioBus::new(DeviceHandle::new(&mock));

        assert_eq!(gpio.get_pin_value(Port::C, 5).unwrap(), Level::High);
        assert_eq!(gpio.get_pin_value(Port::C, 4).unwrap(), Level::Low);
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_invalid_pin_or_port_sends_nothing() {
        let mock = MockTransport::new();
        let gpio = GpioBus::new(DeviceHandle::new(&mock));

        assert!(matches!(
            gpio.set_pin_value(Port::A, 8, Level::High),
            Err(Error::InvalidPin(8))
        ));
        assert!(matches!(
            gpio.set_pin_direction('F', 0, true),
            Err(Error::InvalidPort(_))
        ));
        assert!(gpio.get_pin_value("F", 0).is_err());
        assert!(gpio.get_pin_direction(Port::A, 255).is_err());
        assert!(gpio.read_port(9u8, Register::Io).is_err());
        assert!(mock.transfers().is_empty());
    }

    #[test]
    fn test_invalid_pin_rejected_on_virtual_device() {
        let gpio = GpioBus::new(DeviceHandle::<MockTransport>::virtual_device());
        assert!(gpio.set_pin_value(Port::A, 8, Level::High).is_err());
        assert!(gpio.get_pin_value('F', 0).is_err());
    }

    #[test]
    fn test_virtual_gpio() {
        let gpio = GpioBus::new(DeviceHandle::<MockTransport>::virtual_device());
        for port in Port::ALL {
            assert_eq!(gpio.read_port(port, Register::Io).unwrap(), 0);
            for pin in 0..PINS_PER_PORT {
                gpio.set_pin_direction(port, pin, true).unwrap();
                gpio.set_pin_value(port, pin, Level::High).unwrap();
                assert_eq!(gpio.get_pin_value(port, pin).unwrap(), Level::Low);
                assert!(!gpio.get_pin_direction(port, pin).unwrap());
            }
        }
    }

    #[test]
    fn test_transport_fault_aborts_update() {
        let mock = MockTransport::new();
        mock.fail_next("pipe error");
        let gpio = GpioBus::new(DeviceHandle::new(&mock));

        assert!(gpio
            .set_pin_value(Port::A, 0, Level::High)
            .unwrap_err()
            .is_transport_fault());
        // The read failed, so no write followed
        assert!(mock.writes().is_empty());
    }
}
