//! Single-pin view over a [`GpioBus`]
//!
//! A [`Pin`] remembers its port, index, mode and polarity. The level is never
//! cached: [`Pin::value`] always reads the device.

use crate::error::Result;
use crate::gpio::{GpioBus, Level, Port};
use crate::transport::ControlTransport;

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// High impedance input
    #[default]
    Input,
    /// Push-pull output
    Output,
}

/// Settings applied when a [`Pin`] is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Port the pin lives on
    pub port: Port,
    /// Initial direction
    pub mode: Mode,
    /// Initial level for outputs (`None` drives low)
    pub value: Option<Level>,
    /// Active-low: `on()` drives low, `off()` drives high
    pub invert: bool,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            port: Port::A,
            mode: Mode::Input,
            value: None,
            invert: false,
        }
    }
}

impl PinConfig {
    /// Input pin on `port`
    pub fn input(port: Port) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// Output pin on `port`, driven to `value` at creation
    pub fn output(port: Port, value: Level) -> Self {
        Self {
            port,
            mode: Mode::Output,
            value: Some(value),
            invert: false,
        }
    }

    /// Mark the pin active-low
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

/// One GPIO pin
///
/// Borrows the bus it belongs to, so any number of pins can exist at once.
/// Operations that read and then write (`toggle`, and every level or mode
/// change underneath) are not atomic.
pub struct Pin<'a, T> {
    gpio: &'a GpioBus<T>,
    port: Port,
    id: u8,
    mode: Mode,
    invert: bool,
}

impl<'a, T: ControlTransport> Pin<'a, T> {
    /// Create a pin and push its configuration to the device
    ///
    /// The direction is always written. Outputs are then driven to
    /// `config.value`, or low if none was given.
    pub fn new(gpio: &'a GpioBus<T>, id: u8, config: PinConfig) -> Result<Self> {
        let mut pin = Self {
            gpio,
            port: config.port,
            id,
            mode: config.mode,
            invert: config.invert,
        };
        pin.set_mode(config.mode)?;
        if pin.mode == Mode::Output {
            pin.set_value(config.value.unwrap_or(Level::Low))?;
        }
        Ok(pin)
    }

    /// Pin index within its port
    pub fn pin_id(&self) -> u8 {
        self.id
    }

    /// Port the pin lives on
    pub fn port(&self) -> Port {
        self.port
    }

    /// Current mode as last set from the host
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True if the pin is active-low
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Change polarity used by [`on`](Self::on) and [`off`](Self::off)
    pub fn set_inverted(&mut self, invert: bool) {
        self.invert = invert;
    }

    /// Change direction; always written to the device
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.gpio
            .set_pin_direction(self.port, self.id, mode == Mode::Output)?;
        self.mode = mode;
        Ok(())
    }

    /// Read the pin level from the device
    pub fn value(&self) -> Result<Level> {
        self.gpio.get_pin_value(self.port, self.id)
    }

    /// Drive the pin level
    pub fn set_value(&self, level: impl Into<Level>) -> Result<()> {
        self.gpio.set_pin_value(self.port, self.id, level)
    }

    /// Drive high
    pub fn high(&self) -> Result<()> {
        self.set_value(Level::High)
    }

    /// Drive low
    pub fn low(&self) -> Result<()> {
        self.set_value(Level::Low)
    }

    /// Drive the active level (low when inverted)
    pub fn on(&self) -> Result<()> {
        if self.invert {
            self.low()
        } else {
            self.high()
        }
    }

    /// Drive the inactive level (high when inverted)
    pub fn off(&self) -> Result<()> {
        if self.invert {
            self.high()
        } else {
            self.low()
        }
    }

    /// Read the level and write its complement
    pub fn toggle(&self) -> Result<()> {
        let level = self.value()?;
        self.set_value(!level)
    }
}

impl<T> std::fmt::Debug for Pin<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pin")
            .field("port", &self.port)
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("invert", &self.invert)
            .finish()
    }
}
