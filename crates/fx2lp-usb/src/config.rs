//! Device selection and transfer options

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use fx2lp_core::protocol::{FX2LP_USB_PRODUCT, FX2LP_USB_VENDOR};

use crate::error::{Result, UsbError};

/// Default per-transfer timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Configuration value activated after opening a device
pub const FX2LP_CONFIGURATION: u8 = 1;

/// USB backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Pure-Rust `nusb`
    #[default]
    Nusb,
    /// libusb via `rusb`
    Rusb,
}

impl Backend {
    /// Backend name as used in options
    pub fn name(self) -> &'static str {
        match self {
            Backend::Nusb => "nusb",
            Backend::Rusb => "rusb",
        }
    }

    /// True if the backend was compiled in
    pub fn is_available(self) -> bool {
        match self {
            Backend::Nusb => cfg!(feature = "nusb"),
            Backend::Rusb => cfg!(feature = "rusb"),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = UsbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nusb" => Ok(Backend::Nusb),
            "rusb" | "libusb" | "libusb1" => Ok(Backend::Rusb),
            _ => Err(UsbError::InvalidParameter(format!("backend: {}", s))),
        }
    }
}

/// Options for locating and talking to a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbConfig {
    /// USB vendor ID to match
    pub vendor_id: u16,
    /// USB product ID to match
    pub product_id: u16,
    /// USB backend
    pub backend: Backend,
    /// Index among matching devices
    pub device_index: usize,
    /// Timeout for each control transfer
    pub timeout: Duration,
    /// Interface to claim before issuing requests (nusb only)
    pub interface: Option<u8>,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: FX2LP_USB_VENDOR,
            product_id: FX2LP_USB_PRODUCT,
            backend: Backend::default(),
            device_index: 0,
            timeout: DEFAULT_TIMEOUT,
            interface: None,
        }
    }
}

impl UsbConfig {
    /// True if `vid:pid` is the device this config selects
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// Parse a hex (`0x` prefix) or decimal number
fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: TryFrom<u64>,
{
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u64>().ok()
    };
    parsed
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| UsbError::InvalidParameter(format!("{}: {}", key, value)))
}

/// Parse options from key=value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<UsbConfig> {
    let mut config = UsbConfig::default();

    for (key, value) in options {
        match *key {
            "vid" => config.vendor_id = parse_number(key, value)?,
            "pid" => config.product_id = parse_number(key, value)?,
            "backend" => config.backend = value.parse()?,
            "device" | "index" => config.device_index = parse_number(key, value)?,
            "timeout" => {
                let ms: u64 = parse_number(key, value)?;
                if ms == 0 {
                    return Err(UsbError::InvalidParameter(format!("timeout: {}", value)));
                }
                config.timeout = Duration::from_millis(ms);
            }
            "interface" => config.interface = Some(parse_number(key, value)?),
            _ => {
                return Err(UsbError::InvalidParameter(format!(
                    "unknown option: {}",
                    key
                )));
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.vendor_id, 0x04B4);
        assert_eq!(config.product_id, 0x1004);
        assert_eq!(config.backend, Backend::Nusb);
        assert_eq!(config.device_index, 0);
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.interface, None);
    }

    #[test]
    fn test_parse_all_options() {
        let config = parse_options(&[
            ("vid", "0x1234"),
            ("pid", "4100"),
            ("backend", "libusb"),
            ("index", "2"),
            ("timeout", "250"),
            ("interface", "0"),
        ])
        .unwrap();
        assert_eq!(config.vendor_id, 0x1234);
        assert_eq!(config.product_id, 4100);
        assert_eq!(config.backend, Backend::Rusb);
        assert_eq!(config.device_index, 2);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.interface, Some(0));
        assert!(config.matches(0x1234, 4100));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_options(&[("vid", "0x12345")]).is_err());
        assert!(parse_options(&[("pid", "abc")]).is_err());
        assert!(parse_options(&[("backend", "libusb0x")]).is_err());
        assert!(parse_options(&[("timeout", "0")]).is_err());
        assert!(parse_options(&[("interface", "256")]).is_err());
        assert!(matches!(
            parse_options(&[("speed", "1")]),
            Err(UsbError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_backend_names() {
        assert_eq!("NUSB".parse::<Backend>().unwrap(), Backend::Nusb);
        assert_eq!("rusb".parse::<Backend>().unwrap(), Backend::Rusb);
        assert_eq!(Backend::Rusb.to_string(), "rusb");
    }
}
