//! Device handle with virtual-device fallback
//!
//! Every bus object talks to the firmware through a [`DeviceHandle`]. A handle
//! either wraps a live transport or is virtual. Virtual handles never touch a
//! transport: writes succeed without effect and reads return zeroes of the
//! requested length.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::protocol::{Request, MAX_TRANSFER_LEN};
use crate::transport::ControlTransport;

/// Connection to one FX2LP device, or to none at all
///
/// The handle is bound to the device it was created with for its whole
/// lifetime; there is no implicit re-matching. Once virtual (either because no
/// device was found or after [`release`](Self::release)) it stays virtual.
///
/// # Concurrency
///
/// Register updates are read-modify-write sequences spanning several
/// transfers, so a handle is deliberately `!Sync`. To share a handle (or a
/// bus wrapping one) between threads, put it behind a `Mutex`.
///
/// This holds even when the transport itself is `Sync`:
///
/// ```compile_fail,E0277
/// use fx2lp_core::{ControlTransport, GpioBus};
///
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<GpioBus<&'static (dyn ControlTransport + Sync)>>();
/// ```
///
/// A handle can still move to another thread if its transport can:
///
/// ```
/// use std::sync::Mutex;
/// use fx2lp_core::{ControlTransport, GpioBus};
///
/// type SharedBus = GpioBus<&'static (dyn ControlTransport + Sync)>;
///
/// fn assert_send<T: Send>() {}
/// fn assert_sync<T: Sync>() {}
/// assert_send::<SharedBus>();
/// assert_sync::<Mutex<SharedBus>>();
/// ```
pub struct DeviceHandle<T> {
    transport: Option<T>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<T: ControlTransport> DeviceHandle<T> {
    /// Wrap a connected transport
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            _not_sync: PhantomData,
        }
    }

    /// Create a handle with no device behind it
    pub fn virtual_device() -> Self {
        log::warn!("Virtual device, data may not be real");
        Self {
            transport: None,
            _not_sync: PhantomData,
        }
    }

    /// Wrap the result of a device lookup; `None` gives a virtual handle
    pub fn from_transport(transport: Option<T>) -> Self {
        match transport {
            Some(t) => Self::new(t),
            None => Self::virtual_device(),
        }
    }

    /// True when no device is attached
    pub fn is_virtual(&self) -> bool {
        self.transport.is_none()
    }

    /// Give up the device
    ///
    /// The transport is returned to the caller (dropping it closes the USB
    /// device). Afterwards the handle behaves exactly like a virtual device.
    pub fn release(&mut self) -> Option<T> {
        let transport = self.transport.take();
        if transport.is_some() {
            log::debug!("Released FX2LP device handle");
        }
        transport
    }

    /// Read `length` bytes with a vendor request
    ///
    /// A virtual handle returns `length` zero bytes. A device that answers
    /// with fewer bytes than requested yields [`Error::ShortRead`].
    pub fn read(&self, request: Request, value: u16, index: u16, length: usize) -> Result<Vec<u8>> {
        let wlength = check_len(length)?;

        let Some(transport) = &self.transport else {
            return Ok(vec![0; length]);
        };

        log::trace!(
            "read {} value=0x{:04X} index=0x{:04X} len={}",
            request,
            value,
            index,
            length
        );

        let mut data = transport.control_read(request.code(), value, index, wlength)?;
        if data.len() < length {
            return Err(Error::ShortRead {
                request: request.code(),
                expected: length,
                actual: data.len(),
            });
        }
        data.truncate(length);
        Ok(data)
    }

    /// Read a value that only exists on real hardware
    ///
    /// Used for configuration registers (bus speeds). A virtual handle has no
    /// such register, so it reports `None` rather than a made-up value.
    pub fn query(
        &self,
        request: Request,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Option<Vec<u8>>> {
        if self.is_virtual() {
            check_len(length)?;
            return Ok(None);
        }
        self.read(request, value, index, length).map(Some)
    }

    /// Send `data` with a vendor request
    ///
    /// A no-op on a virtual handle.
    pub fn write(&self, request: Request, value: u16, index: u16, data: &[u8]) -> Result<()> {
        check_len(data.len())?;

        let Some(transport) = &self.transport else {
            return Ok(());
        };

        log::trace!(
            "write {} value=0x{:04X} index=0x{:04X} data={:02X?}",
            request,
            value,
            index,
            data
        );

        transport.control_write(request.code(), value, index, data)
    }

    /// Ask the firmware to disconnect and re-enumerate
    ///
    /// The device drops off the bus and may come back with a different
    /// identity, so the handle is consumed. Open a new one before issuing
    /// further requests.
    pub fn renumerate(self) -> Result<()> {
        if !self.is_virtual() {
            log::info!("Requesting FX2LP re-enumeration");
        }
        self.write(Request::Renumerate, 0, 0, &[])
    }
}

impl<T> Default for DeviceHandle<T> {
    fn default() -> Self {
        Self {
            transport: None,
            _not_sync: PhantomData,
        }
    }
}

impl<T> fmt::Debug for DeviceHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("virtual", &self.transport.is_none())
            .finish()
    }
}

fn check_len(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::PayloadTooLong {
        len,
        max: MAX_TRANSFER_LEN,
    })
}

/// Behaviour shared by every peripheral bus
///
/// Each bus owns its [`DeviceHandle`]. Re-enumeration is available on all of
/// them and consumes the bus along with the handle.
pub trait Fx2lpBus: Sized {
    /// Transport used by the owned handle
    type Transport: ControlTransport;

    /// Borrow the owned handle
    fn handle(&self) -> &DeviceHandle<Self::Transport>;

    /// Mutably borrow the owned handle
    fn handle_mut(&mut self) -> &mut DeviceHandle<Self::Transport>;

    /// Take the handle back, dropping the bus
    fn into_handle(self) -> DeviceHandle<Self::Transport>;

    /// True when no device is attached
    fn is_virtual(&self) -> bool {
        self.handle().is_virtual()
    }

    /// Release the device; the bus keeps working as a virtual device
    fn release(&mut self) -> Option<Self::Transport> {
        self.handle_mut().release()
    }

    /// Re-enumerate the device (see [`DeviceHandle::renumerate`])
    fn renumerate(self) -> Result<()> {
        self.into_handle().renumerate()
    }
}
