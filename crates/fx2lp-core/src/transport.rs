//! Control transfer transport trait
//!
//! A transport performs vendor control transfers against one physical device.
//! Implementations live in backend crates (`fx2lp-usb` for real hardware,
//! `fx2lp-dummy` for the in-memory emulator).

use crate::error::Result;

/// Vendor control transfer capability
///
/// Both methods issue exactly one control transfer. Implementations must not
/// retry on failure; errors are reported as [`Error::Transport`](crate::Error::Transport).
///
/// Methods take `&self` because the underlying USB stacks allow concurrent
/// submissions. Serialising multi-transfer sequences is the job of
/// [`DeviceHandle`](crate::DeviceHandle) and its owner.
pub trait ControlTransport {
    /// Device-to-host transfer (bmRequestType 0xC0)
    ///
    /// Returns the bytes received, which may be fewer than `length` if the
    /// device ended the data stage early.
    fn control_read(&self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>>;

    /// Host-to-device transfer (bmRequestType 0x40)
    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> Result<()>;
}

/// Type-erased transport, for picking a backend at runtime
pub type BoxedTransport = Box<dyn ControlTransport>;

impl<T: ControlTransport + ?Sized> ControlTransport for Box<T> {
    fn control_read(&self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        (**self).control_read(request, value, index, length)
    }

    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> Result<()> {
        (**self).control_write(request, value, index, data)
    }
}

impl<T: ControlTransport + ?Sized> ControlTransport for &T {
    fn control_read(&self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        (**self).control_read(request, value, index, length)
    }

    fn control_write(&self, request: u8, value: u16, index: u16, data: &[u8]) -> Result<()> {
        (**self).control_write(request, value, index, data)
    }
}
