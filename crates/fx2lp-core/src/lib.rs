//! fx2lp-core - Peripheral bus abstraction for FX2LP USB bridge firmware
//!
//! The FX2LP firmware exposes GPIO, I2C and SPI through a handful of USB
//! vendor control requests. This crate maps bus level operations (set a pin
//! direction, read a register, exchange SPI bytes) onto those requests and
//! leaves the actual USB traffic to a [`ControlTransport`] implementation.
//!
//! A [`DeviceHandle`] without a transport is a *virtual device*: every write
//! is a no-op and every read returns zeroes, so the same code runs with no
//! hardware attached.
//!
//! # Example
//!
//! ```
//! use fx2lp_core::{BoxedTransport, DeviceHandle, GpioBus, Level, Mode, Pin, PinConfig, Port};
//!
//! let gpio = GpioBus::new(DeviceHandle::<BoxedTransport>::virtual_device());
//! let mut led = Pin::new(&gpio, 0, PinConfig::output(Port::A, Level::Low))?;
//! led.on()?;
//! led.set_mode(Mode::Input)?;
//! assert_eq!(led.value()?, Level::Low);
//! # Ok::<(), fx2lp_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod gpio;
pub mod handle;
pub mod i2c;
pub mod pin;
pub mod protocol;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod mock;

pub use error::{Error, Result};
pub use gpio::{GpioBus, IntoPort, Level, Port, Register};
pub use handle::{DeviceHandle, Fx2lpBus};
pub use i2c::{Combined, I2cBus, I2cSpeed, Split, WireProfile};
pub use pin::{Mode, Pin, PinConfig};
pub use spi::SpiBus;
pub use transport::{BoxedTransport, ControlTransport};
