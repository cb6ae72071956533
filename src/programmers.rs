//! Programmer registration and dispatch
//!
//! A programmer string selects where control transfers go: real hardware
//! through one of the USB backends, the in-memory emulator, or nowhere at all
//! (virtual device). Options follow the name after a colon, e.g.
//! `fx2lp:backend=rusb,pid=0x1004`.

use std::collections::HashSet;

use fx2lp_core::{BoxedTransport, DeviceHandle};

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "usb")]
    programmers.push(ProgrammerInfo {
        name: "fx2lp",
        aliases: &["usb"],
        description: "FX2LP over USB (vid=,pid=,backend=nusb|rusb,index=,timeout=,interface=)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory FX2LP firmware emulator (firmware=combined|split)",
    });

    programmers.push(ProgrammerInfo {
        name: "virtual",
        aliases: &["none"],
        description: "No device: writes are ignored, reads return zeroes",
    });

    programmers
}

/// Get a short comma-separated list of programmer names
pub fn programmer_names_short() -> String {
    available_programmers()
        .iter()
        .map(|p| p.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Programmer name plus its key=value options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Programmer name
    pub name: String,
    /// Options in the order given
    pub params: Vec<(String, String)>,
}

impl ProgrammerParams {
    /// Options as borrowed pairs, for backend option parsers
    pub fn as_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse `name[:key=value,...]`
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = Vec::new();
    let mut seen = HashSet::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            let Some((key, value)) = opt.split_once('=') else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            };
            if !seen.insert(key) {
                return Err(format!("Duplicate parameter: '{}'", key).into());
            }
            params.push((key.to_string(), value.to_string()));
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Open a device handle from a programmer string
///
/// A USB programmer with no matching device yields a virtual handle (with a
/// warning), not an error.
pub fn open_device(
    programmer: &str,
) -> Result<DeviceHandle<BoxedTransport>, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    match params.name.as_str() {
        #[cfg(feature = "usb")]
        "fx2lp" | "usb" => {
            let config = fx2lp_usb::parse_options(&params.as_pairs())?;
            log::debug!("USB config: {:?}", config);
            Ok(fx2lp_usb::open(&config)?)
        }

        #[cfg(feature = "dummy")]
        "dummy" | "emulator" => open_dummy(&params),

        "virtual" | "none" => {
            if !params.params.is_empty() {
                return Err("The virtual programmer takes no options".into());
            }
            Ok(DeviceHandle::virtual_device())
        }

        _ => Err(format!("Unknown programmer: {}", params.name).into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &ProgrammerParams,
) -> Result<DeviceHandle<BoxedTransport>, Box<dyn std::error::Error>> {
    use fx2lp_dummy::{DummyConfig, DummyFx2lp, I2cFirmware};

    let mut config = DummyConfig::default();
    for (key, value) in params.as_pairs() {
        match (key, value) {
            ("firmware", "combined") => config.i2c_firmware = I2cFirmware::Combined,
            ("firmware", "split") => config.i2c_firmware = I2cFirmware::Split,
            _ => return Err(format!("Invalid dummy parameter: {}={}", key, value).into()),
        }
    }

    log::info!("Using FX2LP emulator ({:?} I2C firmware)", config.i2c_firmware);
    let transport: BoxedTransport = Box::new(DummyFx2lp::new(config));
    Ok(DeviceHandle::new(transport))
}
