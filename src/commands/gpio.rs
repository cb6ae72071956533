//! GPIO commands

use fx2lp_core::{BoxedTransport, DeviceHandle, GpioBus, Level, PinConfig, Port, Register};

use super::CommandResult;
use crate::cli::{GpioCommands, ModeArg, PinArgs};

/// Run a GPIO subcommand
pub fn run(handle: DeviceHandle<BoxedTransport>, cmd: GpioCommands) -> CommandResult {
    let gpio = GpioBus::new(handle);

    match cmd {
        GpioCommands::Get { pin } => {
            let port: Port = pin.port.parse()?;
            let level = gpio.get_pin_value(port, pin.pin)?;
            let output = gpio.get_pin_direction(port, pin.pin)?;
            println!(
                "P{}{}: {} ({})",
                port,
                pin.pin,
                level,
                if output { "output" } else { "input" }
            );
        }
        GpioCommands::Set { pin, level } => {
            let port: Port = pin.port.parse()?;
            gpio.set_pin_direction(port, pin.pin, true)?;
            gpio.set_pin_value(port, pin.pin, level)?;
            log::info!("P{}{} driven {}", port, pin.pin, Level::from(level));
        }
        GpioCommands::Dir { pin, mode } => {
            let port: Port = pin.port.parse()?;
            gpio.set_pin_direction(port, pin.pin, mode == ModeArg::Out)?;
        }
        GpioCommands::On { pin, invert } => {
            output_pin(&gpio, &pin, invert, |p| p.on())?;
        }
        GpioCommands::Off { pin, invert } => {
            output_pin(&gpio, &pin, invert, |p| p.off())?;
        }
        GpioCommands::Toggle { pin } => {
            let level = output_pin(&gpio, &pin, false, |p| p.toggle())?;
            println!("P{}{}: {}", pin.port.to_ascii_uppercase(), pin.pin, level);
        }
        GpioCommands::Port { port } => {
            let ports = match port {
                Some(p) => vec![p.parse::<Port>()?],
                None => Port::ALL.to_vec(),
            };
            println!("Port  OE        IO");
            for port in ports {
                let oe = gpio.read_port(port, Register::Direction)?;
                let io = gpio.read_port(port, Register::Io)?;
                println!("  {}   {:08b}  {:08b}", port, oe, io);
            }
        }
    }

    Ok(())
}

/// Make `args` an output without changing its current level, apply `op`,
/// and return the level read back afterwards
fn output_pin(
    gpio: &GpioBus<BoxedTransport>,
    args: &PinArgs,
    invert: bool,
    op: impl FnOnce(&fx2lp_core::Pin<'_, BoxedTransport>) -> fx2lp_core::Result<()>,
) -> Result<Level, Box<dyn std::error::Error>> {
    let port: Port = args.port.parse()?;
    let current = gpio.get_pin_value(port, args.pin)?;

    let mut config = PinConfig::output(port, current);
    if invert {
        config = config.inverted();
    }
    let pin = gpio.pin(args.pin, config)?;
    op(&pin)?;
    Ok(pin.value()?)
}
