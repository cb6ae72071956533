//! Error types for fx2lp-core
//!
//! Errors fall into two families. Caller errors are raised before anything is
//! sent to the device. Transport faults come from the USB layer and are passed
//! through unchanged; nothing in this crate retries a failed transfer.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Port name or index outside A..E
    #[error("invalid GPIO port '{0}' (valid ports: A, B, C, D, E)")]
    InvalidPort(String),

    /// Pin index outside 0..=7
    #[error("invalid GPIO pin index {0} (valid pins: 0-7)")]
    InvalidPin(u8),

    /// I2C address does not fit in 7 bits
    #[error("invalid I2C address 0x{0:02X} (7-bit addresses only)")]
    InvalidI2cAddress(u8),

    /// Payload or read length does not fit in a control transfer
    #[error("transfer length {len} exceeds control transfer limit of {max} bytes")]
    PayloadTooLong {
        /// Requested length
        len: usize,
        /// Largest length a control transfer can carry
        max: usize,
    },

    /// Device returned fewer bytes than requested
    #[error("short read on request 0x{request:02X}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Vendor request code
        request: u8,
        /// Requested length
        expected: usize,
        /// Number of bytes actually received
        actual: usize,
    },

    /// Failure reported by the USB backend
    #[error("USB control transfer failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a backend error as a transport fault
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(err.into())
    }

    /// True for errors raised before the transport was touched
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPort(_)
                | Error::InvalidPin(_)
                | Error::InvalidI2cAddress(_)
                | Error::PayloadTooLong { .. }
        )
    }

    /// True for errors that originate from the device or the USB stack
    pub fn is_transport_fault(&self) -> bool {
        matches!(self, Error::ShortRead { .. } | Error::Transport(_))
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::InvalidPin(8).is_caller_error());
        assert!(!Error::InvalidPin(8).is_transport_fault());

        let short = Error::ShortRead {
            request: 0x23,
            expected: 1,
            actual: 0,
        };
        assert!(short.is_transport_fault());
        assert!(!short.is_caller_error());

        assert!(Error::transport("pipe error").is_transport_fault());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::InvalidI2cAddress(0x80).to_string(),
            "invalid I2C address 0x80 (7-bit addresses only)"
        );
        assert_eq!(
            Error::transport("no device").to_string(),
            "USB control transfer failed: no device"
        );
    }
}
