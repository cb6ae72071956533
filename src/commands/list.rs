//! List commands implementation

use super::CommandResult;
use crate::programmers::available_programmers;

/// List all programmers compiled into this binary
pub fn list_programmers() {
    println!("Available programmers:");
    println!();
    for p in available_programmers() {
        let names = std::iter::once(p.name)
            .chain(p.aliases.iter().copied())
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<18} - {}", names, p.description);
    }
}

/// List FX2LP devices visible to the USB backend
#[cfg(feature = "usb")]
pub fn list_devices(programmer: &str) -> CommandResult {
    let params = crate::programmers::parse_programmer_params(programmer)?;
    if !matches!(params.name.as_str(), "fx2lp" | "usb") {
        return Err(format!("Programmer '{}' has no devices to list", params.name).into());
    }

    let config = fx2lp_usb::parse_options(&params.as_pairs())?;
    let devices = fx2lp_usb::list_devices(&config)?;

    if devices.is_empty() {
        println!(
            "No devices found with VID:PID {:04X}:{:04X}",
            config.vendor_id, config.product_id
        );
        return Ok(());
    }

    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {}", index, device);
    }
    Ok(())
}

/// List FX2LP devices visible to the USB backend
#[cfg(not(feature = "usb"))]
pub fn list_devices(_programmer: &str) -> CommandResult {
    Err("Built without USB support".into())
}
