//! Error types for FX2LP USB backends

use thiserror::Error;

/// Errors raised while locating and opening a device
///
/// Transfer failures after a successful open are reported through
/// [`fx2lp_core::Error::Transport`] instead.
#[derive(Debug, Error)]
pub enum UsbError {
    /// Listing USB devices failed
    #[error("Failed to enumerate USB devices: {0}")]
    EnumerationFailed(String),

    /// Opening a matched device failed
    #[error("Failed to open FX2LP: {0}")]
    OpenFailed(String),

    /// Activating the device configuration failed
    #[error("Failed to activate configuration {configuration}: {message}")]
    ConfigurationFailed { configuration: u8, message: String },

    /// Claiming an interface failed
    #[error("Failed to claim interface {interface}: {message}")]
    ClaimFailed { interface: u8, message: String },

    /// Selected backend was not compiled in
    #[error("USB backend '{0}' is not available in this build")]
    BackendUnavailable(&'static str),

    /// Option is not valid for this backend
    #[error("Unsupported option for backend '{backend}': {option}")]
    Unsupported {
        backend: &'static str,
        option: &'static str,
    },

    /// Parameter parsing error
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for FX2LP USB operations
pub type Result<T> = std::result::Result<T, UsbError>;
