//! fx2lp - command line access to an FX2LP USB bridge
//!
//! Drives the GPIO ports, the I2C master and the SPI master of a Cypress
//! FX2LP running the vendor-request firmware. Every subcommand opens the
//! device named by `--programmer`, performs its transfers and exits.
//!
//! If no device is plugged in, the USB programmer falls back to a virtual
//! device: writes are dropped and reads return zeroes.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands, WireProfileArg};
use fx2lp_core::{Combined, Split};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::Devices => commands::list_devices(&cli.programmer),
        Commands::Gpio(subcmd) => {
            let handle = programmers::open_device(&cli.programmer)?;
            commands::gpio::run(handle, subcmd)
        }
        Commands::I2c { profile, command } => {
            let handle = programmers::open_device(&cli.programmer)?;
            match profile {
                WireProfileArg::Combined => commands::i2c::run::<Combined>(handle, command),
                WireProfileArg::Split => commands::i2c::run::<Split>(handle, command),
            }
        }
        Commands::Spi(subcmd) => {
            let handle = programmers::open_device(&cli.programmer)?;
            commands::spi::run(handle, subcmd)
        }
        Commands::Renumerate => {
            let handle = programmers::open_device(&cli.programmer)?;
            commands::renumerate(handle)
        }
    }
}
