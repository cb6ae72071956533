//! I2C commands

use fx2lp_core::{BoxedTransport, DeviceHandle, I2cBus, I2cSpeed, WireProfile};

use super::{format_hex, CommandResult};
use crate::cli::I2cCommands;

/// Run an I2C subcommand with the request layout `P`
///
/// The bus clock is left as the device has it; use `speed` to change it.
pub fn run<P: WireProfile>(
    handle: DeviceHandle<BoxedTransport>,
    cmd: I2cCommands,
) -> CommandResult {
    let bus = I2cBus::<_, P>::new(handle);
    log::debug!("I2C using {} firmware requests", P::NAME);

    match cmd {
        I2cCommands::Read { address, len } => {
            let data = bus.read_bytes(address, len)?;
            println!("{}", format_hex(&data));
        }
        I2cCommands::Write { address, data } => {
            bus.write_bytes(address, &data)?;
            log::info!("Wrote {} bytes to 0x{:02X}", data.len(), address);
        }
        I2cCommands::ReadReg {
            address,
            register,
            len,
        } => {
            let data = bus.read_addressed_bytes(address, register, len)?;
            println!("{}", format_hex(&data));
        }
        I2cCommands::WriteReg {
            address,
            register,
            data,
        } => {
            let written = bus.write_addressed_bytes(address, register, &data)?;
            log::info!(
                "Wrote {} bytes to 0x{:02X} at register 0x{:02X}",
                written,
                address,
                register
            );
        }
        I2cCommands::Speed { fast, standard } => {
            if fast || standard {
                bus.set_speed(I2cSpeed::from_flag(fast))?;
            }
            match bus.speed()? {
                Some(speed) => println!("I2C clock: {}", speed),
                None => println!("I2C clock: unknown (no device attached)"),
            }
        }
    }
    Ok(())
}
