//! fx2lp-dummy - In-memory FX2LP firmware emulator
//!
//! This crate provides a [`ControlTransport`] that answers the FX2LP vendor
//! requests from emulated registers instead of a USB device. It is useful for
//! testing and for development without hardware.
//!
//! Emulated behaviour:
//! - GPIO: five ports with direction and I/O registers. Writing the I/O
//!   register only changes bits configured as outputs, like the firmware.
//!   Input pins read levels set with [`DummyFx2lp::set_input`].
//! - I2C: targets with a 256-byte register file and an auto-incrementing
//!   register pointer. The first byte of a write sets the pointer. Reads from
//!   an absent target return zeroes (the firmware clears its buffer).
//! - SPI: bytes written are recorded; reads return queued bytes, then 0xFF.
//! - Speed registers and re-enumeration (after which the device is gone until
//!   [`DummyFx2lp::reconnect`]).
//!
//! Clones share the same emulated device, so a test can keep one clone for
//! inspection while a bus owns another.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use fx2lp_core::error::{Error, Result};
use fx2lp_core::gpio::PINS_PER_PORT;
use fx2lp_core::protocol::{Request, GPIO_SELECT_DIRECTION, GPIO_SELECT_IO};
use fx2lp_core::{ControlTransport, DeviceHandle, Port};

/// Number of emulated GPIO ports
const PORTS: usize = Port::ALL.len();

/// Level read from an idle MISO line
const SPI_IDLE: u8 = 0xFF;

/// Which I2C read request the emulated firmware answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cFirmware {
    /// Reads and writes on 0x22
    #[default]
    Combined,
    /// Writes on 0x22, reads on 0xA2
    Split,
}

/// Configuration for the emulated device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// I2C request layout of the emulated firmware
    pub i2c_firmware: I2cFirmware,
    /// I2C targets present on the bus
    pub i2c_targets: Vec<u8>,
    /// SPI clock at power-up
    pub spi_speed_mbps: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            i2c_firmware: I2cFirmware::Combined,
            i2c_targets: vec![0x50],
            spi_speed_mbps: 0,
        }
    }
}

struct I2cTarget {
    regs: [u8; 256],
    pointer: u8,
}

impl I2cTarget {
    fn new() -> Self {
        Self {
            regs: [0; 256],
            pointer: 0,
        }
    }

    fn write(&mut self, data: &[u8]) {
        let Some((&pointer, payload)) = data.split_first() else {
            return;
        };
        self.pointer = pointer;
        for &byte in payload {
            self.regs[self.pointer as usize] = byte;
            self.pointer = self.pointer.wrapping_add(1);
        }
    }

    fn read(&mut self, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| {
                let byte = self.regs[self.pointer as usize];
                self.pointer = self.pointer.wrapping_add(1);
                byte
            })
            .collect()
    }
}

struct State {
    config: DummyConfig,
    direction: [u8; PORTS],
    io: [u8; PORTS],
    inputs: [u8; PORTS],
    i2c_fast: bool,
    i2c_targets: BTreeMap<u8, I2cTarget>,
    spi_speed_mbps: u8,
    spi_mosi: Vec<u8>,
    spi_miso: VecDeque<u8>,
    connected: bool,
    transfers: usize,
    renumerations: usize,
}

impl State {
    fn new(config: DummyConfig) -> Self {
        let i2c_targets = config
            .i2c_targets
            .iter()
            .map(|&addr| (addr, I2cTarget::new()))
            .collect();
        Self {
            direction: [0; PORTS],
            io: [0; PORTS],
            inputs: [0; PORTS],
            // The firmware starts at 100 kHz
            i2c_fast: false,
            i2c_targets,
            spi_speed_mbps: config.spi_speed_mbps,
            spi_mosi: Vec::new(),
            spi_miso: VecDeque::new(),
            connected: true,
            transfers: 0,
            renumerations: 0,
            config,
        }
    }

    fn begin(&mut self, request: u8) -> Result<Request> {
        self.transfers += 1;
        if !self.connected {
            return Err(Error::transport("device disconnected"));
        }
        Request::from_code(request).ok_or_else(|| stall(request))
    }

    fn i2c_read_request(&self) -> Request {
        match self.config.i2c_firmware {
            I2cFirmware::Combined => Request::I2cIo,
            I2cFirmware::Split => Request::I2cRead,
        }
    }

    fn gpio_port(index: u16) -> Result<usize> {
        let port = index as usize;
        if port < PORTS {
            Ok(port)
        } else {
            Err(Error::transport(format!("GPIO port {} stalled", index)))
        }
    }

    fn gpio_read(&self, select: u16, index: u16) -> Result<u8> {
        let port = Self::gpio_port(index)?;
        match select {
            GPIO_SELECT_DIRECTION => Ok(self.direction[port]),
            GPIO_SELECT_IO => {
                let oe = self.direction[port];
                Ok((self.io[port] & oe) | (self.inputs[port] & !oe))
            }
            _ => Err(stall(Request::Gpio.code())),
        }
    }

    fn gpio_write(&mut self, select: u16, index: u16, data: &[u8]) -> Result<()> {
        let port = Self::gpio_port(index)?;
        let &[value] = data else {
            return Err(Error::transport(format!(
                "GPIO write expects 1 byte, got {}",
                data.len()
            )));
        };
        match select {
            GPIO_SELECT_DIRECTION => self.direction[port] = value,
            GPIO_SELECT_IO => {
                let oe = self.direction[port];
                self.io[port] = (self.io[port] & !oe) | (value & oe);
            }
            _ => return Err(stall(Request::Gpio.code())),
        }
        Ok(())
    }
}

fn stall(request: u8) -> Error {
    Error::transport(format!("request 0x{:02X} stalled", request))
}

/// Emulated FX2LP device
#[derive(Clone)]
pub struct DummyFx2lp {
    state: Rc<RefCell<State>>,
}

impl DummyFx2lp {
    /// Create an emulated device with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new(config))),
        }
    }

    /// Create an emulated device with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Device handle backed by this emulator (shares state with `self`)
    pub fn handle(&self) -> DeviceHandle<DummyFx2lp> {
        DeviceHandle::new(self.clone())
    }

    /// Drive the external level seen by an input pin
    pub fn set_input(&self, port: Port, pin: u8, high: bool) -> Result<()> {
        if pin >= PINS_PER_PORT {
            return Err(Error::InvalidPin(pin));
        }
        let mut state = self.state.borrow_mut();
        let mask = 1u8 << pin;
        let reg = &mut state.inputs[port.index() as usize];
        if high {
            *reg |= mask;
        } else {
            *reg &= !mask;
        }
        Ok(())
    }

    /// Raw direction register of a port
    pub fn direction(&self, port: Port) -> u8 {
        self.state.borrow().direction[port.index() as usize]
    }

    /// Raw I/O output latch of a port
    pub fn io_latch(&self, port: Port) -> u8 {
        self.state.borrow().io[port.index() as usize]
    }

    /// Contents of an I2C target register, `None` if the target is absent
    pub fn i2c_register(&self, address: u8, register: u8) -> Option<u8> {
        self.state
            .borrow()
            .i2c_targets
            .get(&address)
            .map(|t| t.regs[register as usize])
    }

    /// True when the I2C clock is set to 400 kHz
    pub fn i2c_fast(&self) -> bool {
        self.state.borrow().i2c_fast
    }

    /// Current SPI clock register
    pub fn spi_speed_mbps(&self) -> u8 {
        self.state.borrow().spi_speed_mbps
    }

    /// Queue bytes to be returned by SPI reads
    pub fn queue_spi_response(&self, data: &[u8]) {
        self.state.borrow_mut().spi_miso.extend(data.iter().copied());
    }

    /// Every byte clocked out on SPI so far
    pub fn spi_written(&self) -> Vec<u8> {
        self.state.borrow().spi_mosi.clone()
    }

    /// Number of control transfers received, including failed ones
    pub fn transfer_count(&self) -> usize {
        self.state.borrow().transfers
    }

    /// Number of re-enumeration requests received
    pub fn renumerations(&self) -> usize {
        self.state.borrow().renumerations
    }

    /// False after re-enumeration until [`reconnect`](Self::reconnect)
    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Bring the device back after re-enumeration, with power-up state
    pub fn reconnect(&self) {
        let mut state = self.state.borrow_mut();
        let config = state.config.clone();
        let transfers = state.transfers;
        let renumerations = state.renumerations;
        *state = State::new(config);
        state.transfers = transfers;
        state.renumerations = renumerations;
    }
}

impl ControlTransport for DummyFx2lp {
    fn control_read(&self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        let req = state.begin(request)?;
        let len = length as usize;
        log::trace!("dummy read {} value=0x{:04X} len={}", req, value, len);

        match req {
            Request::Gpio => Ok(vec![state.gpio_read(value, index)?]),
            Request::I2cSpeed => Ok(vec![state.i2c_fast as u8]),
            Request::SpiSpeed => Ok(vec![state.spi_speed_mbps]),
            Request::SpiIo => Ok((0..len)
                .map(|_| state.spi_miso.pop_front().unwrap_or(SPI_IDLE))
                .collect()),
            r if r == state.i2c_read_request() => {
                let address = value as u8;
                Ok(match state.i2c_targets.get_mut(&address) {
                    Some(target) => target.read(len),
                    None => vec![0; len],
                })
            }
            _ => Err(stall(request)),
        }
    }

    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let req = state.begin(request)?;
        log::trace!("dummy write {} value=0x{:04X} data={:02X?}", req, value, data);

        match req {
            Request::Gpio => state.gpio_write(value, index, data),
            Request::I2cIo => {
                if let Some(target) = state.i2c_targets.get_mut(&(value as u8)) {
                    target.write(data);
                }
                Ok(())
            }
            Request::I2cSpeed => {
                state.i2c_fast = value != 0;
                Ok(())
            }
            Request::SpiIo => {
                state.spi_mosi.extend_from_slice(data);
                Ok(())
            }
            Request::SpiSpeed => {
                state.spi_speed_mbps = value as u8;
                Ok(())
            }
            Request::Renumerate => {
                state.renumerations += 1;
                state.connected = false;
                Ok(())
            }
            Request::I2cRead => Err(stall(request)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fx2lp_core::{
        Fx2lpBus, GpioBus, I2cBus, I2cSpeed, Level, Mode, PinConfig, Port, Register, SpiBus, Split,
    };

    #[test]
    fn test_pin_roundtrip_isolates_other_bits() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());

        for port in Port::ALL {
            // Start from a known pattern on all outputs
            gpio.write_port(port, Register::Direction, 0xFF).unwrap();
            gpio.write_port(port, Register::Io, 0b1010_0101).unwrap();

            for pin in 0..PINS_PER_PORT {
                for level in [Level::High, Level::Low] {
                    let before = gpio.read_port(port, Register::Io).unwrap();
                    gpio.set_pin_direction(port, pin, true).unwrap();
                    gpio.set_pin_value(port, pin, level).unwrap();
                    assert_eq!(gpio.get_pin_value(port, pin).unwrap(), level);

                    let after = gpio.read_port(port, Register::Io).unwrap();
                    let mask = 1u8 << pin;
                    assert_eq!(before & !mask, after & !mask);
                }
            }
        }
    }

    #[test]
    fn test_direction_idempotent() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());

        gpio.set_pin_direction(Port::B, 4, true).unwrap();
        let once = dev.direction(Port::B);
        gpio.set_pin_direction(Port::B, 4, true).unwrap();
        assert_eq!(dev.direction(Port::B), once);
        assert_eq!(once, 0b0001_0000);
    }

    #[test]
    fn test_io_write_masked_by_direction() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());

        // Pin 0 is an input; driving it has no effect on the latch
        gpio.set_pin_value(Port::A, 0, Level::High).unwrap();
        assert_eq!(dev.io_latch(Port::A), 0);

        dev.set_input(Port::A, 0, true).unwrap();
        assert_eq!(gpio.get_pin_value(Port::A, 0).unwrap(), Level::High);
    }

    #[test]
    fn test_set_input_rejects_pin_out_of_range() {
        let dev = DummyFx2lp::new_default();

        assert!(matches!(
            dev.set_input(Port::E, 8, true),
            Err(Error::InvalidPin(8))
        ));
        for port in Port::ALL {
            let gpio = GpioBus::new(dev.handle());
            assert_eq!(gpio.read_port(port, Register::Io).unwrap(), 0);
        }

        dev.set_input(Port::E, 7, true).unwrap();
        let gpio = GpioBus::new(dev.handle());
        assert_eq!(gpio.read_port(Port::E, Register::Io).unwrap(), 0x80);
        assert_eq!(gpio.read_port(Port::A, Register::Io).unwrap(), 0);
    }

    #[test]
    fn test_rejected_pin_sends_nothing() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());

        assert!(gpio.set_pin_value(Port::A, 8, Level::High).is_err());
        assert!(gpio.set_pin_direction('F', 0, true).is_err());
        assert!(gpio.get_pin_value("F", 1).is_err());
        assert_eq!(dev.transfer_count(), 0);
    }

    #[test]
    fn test_inverted_pin() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());
        let pin = gpio
            .pin(5, PinConfig::output(Port::C, Level::Low).inverted())
            .unwrap();

        pin.on().unwrap();
        assert_eq!(pin.value().unwrap(), Level::Low);
        assert_eq!(dev.io_latch(Port::C) & (1 << 5), 0);

        pin.off().unwrap();
        assert_eq!(pin.value().unwrap(), Level::High);
        assert_eq!(dev.io_latch(Port::C) & (1 << 5), 1 << 5);
    }

    #[test]
    fn test_toggle_scenario() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());
        let pin = gpio.pin(0, PinConfig::output(Port::A, Level::Low)).unwrap();

        let before = dev.transfer_count();
        pin.toggle().unwrap();
        // value(), then read-modify-write of the I/O register
        assert_eq!(dev.transfer_count() - before, 3);
        assert_eq!(pin.value().unwrap(), Level::High);

        pin.toggle().unwrap();
        assert_eq!(pin.value().unwrap(), Level::Low);
    }

    #[test]
    fn test_two_pins_share_port() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());
        let p0 = gpio.pin(0, PinConfig::output(Port::A, Level::Low)).unwrap();
        let p1 = gpio.pin(1, PinConfig::output(Port::A, Level::High)).unwrap();

        p0.high().unwrap();
        p1.low().unwrap();
        assert_eq!(dev.io_latch(Port::A), 0b01);
    }

    #[test]
    fn test_pin_back_to_input() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());
        let mut pin = gpio.pin(7, PinConfig::output(Port::D, Level::High)).unwrap();
        assert_eq!(dev.direction(Port::D), 0x80);

        pin.set_mode(Mode::Input).unwrap();
        assert_eq!(dev.direction(Port::D), 0x00);
        dev.set_input(Port::D, 7, false).unwrap();
        assert_eq!(pin.value().unwrap(), Level::Low);
    }

    #[test]
    fn test_i2c_addressed_roundtrip() {
        let dev = DummyFx2lp::new_default();
        let i2c: I2cBus<_> = I2cBus::open(dev.handle(), I2cSpeed::Fast).unwrap();

        let data = [0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(i2c.write_addressed_bytes(0x50, 0x10, &data).unwrap(), 4);
        assert_eq!(dev.i2c_register(0x50, 0x11), Some(0xAD));

        assert_eq!(i2c.read_addressed_bytes(0x50, 0x10, 4).unwrap(), data);
        assert_eq!(i2c.read_addressed_byte(0x50, 0x13).unwrap(), 0xEF);

        i2c.write_addressed_byte(0x50, 0x00, 0x42).unwrap();
        assert_eq!(i2c.read_addressed_byte(0x50, 0x00).unwrap(), 0x42);
    }

    #[test]
    fn test_i2c_absent_target_reads_zero() {
        let dev = DummyFx2lp::new_default();
        let i2c: I2cBus<_> = I2cBus::new(dev.handle());
        assert_eq!(i2c.read_bytes(0x23, 2).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_i2c_speed() {
        let dev = DummyFx2lp::new_default();
        let i2c: I2cBus<_> = I2cBus::new(dev.handle());

        assert_eq!(i2c.speed().unwrap(), Some(I2cSpeed::Standard));
        i2c.set_speed(I2cSpeed::Fast).unwrap();
        assert!(dev.i2c_fast());
        assert_eq!(i2c.speed().unwrap(), Some(I2cSpeed::Fast));
    }

    #[test]
    fn test_i2c_profile_must_match_firmware() {
        let config = DummyConfig {
            i2c_firmware: I2cFirmware::Split,
            ..DummyConfig::default()
        };
        let dev = DummyFx2lp::new(config);

        let split: I2cBus<_, Split> = I2cBus::new(dev.handle());
        split.write_addressed_bytes(0x50, 0, &[7, 8]).unwrap();
        assert_eq!(split.read_addressed_bytes(0x50, 0, 2).unwrap(), vec![7, 8]);

        let combined: I2cBus<_> = I2cBus::new(dev.handle());
        let err = combined.read_bytes(0x50, 1).unwrap_err();
        assert!(err.is_transport_fault());
    }

    #[test]
    fn test_spi() {
        let dev = DummyFx2lp::new_default();
        let spi = SpiBus::open_default(dev.handle()).unwrap();
        assert_eq!(spi.speed_mbps().unwrap(), Some(10));

        spi.write_byte(0x9F).unwrap();
        spi.exchange(&[0x01, 0x02]).unwrap();
        assert_eq!(dev.spi_written(), vec![0x9F, 0x01, 0x02]);

        dev.queue_spi_response(&[0xEF, 0x40]);
        assert_eq!(spi.read_bytes(3).unwrap(), vec![0xEF, 0x40, 0xFF]);

        spi.set_speed_mbps(24).unwrap();
        assert_eq!(dev.spi_speed_mbps(), 24);
    }

    #[test]
    fn test_gpio_read_longer_than_register_is_short_read() {
        let dev = DummyFx2lp::new_default();
        let handle = dev.handle();
        let err = handle
            .read(Request::Gpio, GPIO_SELECT_IO, 0, 2)
            .unwrap_err();
        assert!(matches!(err, Error::ShortRead { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_renumerate_disconnects() {
        let dev = DummyFx2lp::new_default();
        let gpio = GpioBus::new(dev.handle());
        gpio.set_pin_direction(Port::A, 0, true).unwrap();

        gpio.renumerate().unwrap();
        assert_eq!(dev.renumerations(), 1);
        assert!(!dev.is_connected());

        // A stale handle now faults instead of returning defaults
        let stale = GpioBus::new(dev.handle());
        assert!(stale
            .get_pin_value(Port::A, 0)
            .unwrap_err()
            .is_transport_fault());

        dev.reconnect();
        let gpio = GpioBus::new(dev.handle());
        assert_eq!(gpio.read_port(Port::A, Register::Direction).unwrap(), 0);
    }

    #[test]
    fn test_released_handle_is_virtual() {
        let dev = DummyFx2lp::new_default();
        let mut spi = SpiBus::new(dev.handle());
        spi.release();

        assert_eq!(spi.read_bytes(4).unwrap(), vec![0; 4]);
        spi.write_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(spi.speed_mbps().unwrap(), None);
        assert_eq!(dev.transfer_count(), 0);
    }
}
