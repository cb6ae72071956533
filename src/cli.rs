//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string as a hex (0x prefix) or decimal u8
pub fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Device to use, name[:key=value,...] [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "fx2lp")]
#[command(author, version, about = "FX2LP GPIO, I2C and SPI access over USB", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short, long, global = true, default_value = "fx2lp", help = programmer_help())]
    pub programmer: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available programmers
    ListProgrammers,

    /// List connected FX2LP devices
    Devices,

    /// GPIO register and pin access
    #[command(subcommand)]
    Gpio(GpioCommands),

    /// I2C transfers
    I2c {
        /// Firmware request layout
        #[arg(long, value_enum, default_value_t = WireProfileArg::Combined, global = true)]
        profile: WireProfileArg,

        #[command(subcommand)]
        command: I2cCommands,
    },

    /// SPI transfers
    #[command(subcommand)]
    Spi(SpiCommands),

    /// Make the device disconnect and re-enumerate
    Renumerate,
}

/// Pin selection shared by pin commands
#[derive(clap::Args, Debug, Clone)]
pub struct PinArgs {
    /// Port letter (A-E)
    pub port: String,

    /// Pin index (0-7)
    pub pin: u8,
}

#[derive(Subcommand)]
pub enum GpioCommands {
    /// Read a pin level
    Get {
        #[command(flatten)]
        pin: PinArgs,
    },

    /// Make a pin an output and drive it
    Set {
        #[command(flatten)]
        pin: PinArgs,

        /// Level (0 or 1)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        level: u8,
    },

    /// Set pin direction
    Dir {
        #[command(flatten)]
        pin: PinArgs,

        /// Direction
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Drive the active level of an output pin
    On {
        #[command(flatten)]
        pin: PinArgs,

        /// Pin is active-low
        #[arg(long)]
        invert: bool,
    },

    /// Drive the inactive level of an output pin
    Off {
        #[command(flatten)]
        pin: PinArgs,

        /// Pin is active-low
        #[arg(long)]
        invert: bool,
    },

    /// Invert the level of an output pin
    Toggle {
        #[command(flatten)]
        pin: PinArgs,
    },

    /// Show direction and I/O registers of a port (all ports if omitted)
    Port {
        /// Port letter (A-E)
        port: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Input
    In,
    /// Output
    Out,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireProfileArg {
    /// Reads and writes on request 0x22
    Combined,
    /// Writes on 0x22, reads on 0xA2
    Split,
}

#[derive(Subcommand)]
pub enum I2cCommands {
    /// Read bytes from a target
    Read {
        /// 7-bit target address
        #[arg(value_parser = parse_hex_u8)]
        address: u8,

        /// Number of bytes
        #[arg(default_value = "1")]
        len: usize,
    },

    /// Write bytes to a target
    Write {
        /// 7-bit target address
        #[arg(value_parser = parse_hex_u8)]
        address: u8,

        /// Bytes to send
        #[arg(value_parser = parse_hex_u8, num_args = 1..)]
        data: Vec<u8>,
    },

    /// Read registers starting at a sub-address
    ReadReg {
        /// 7-bit target address
        #[arg(value_parser = parse_hex_u8)]
        address: u8,

        /// Register sub-address
        #[arg(value_parser = parse_hex_u8)]
        register: u8,

        /// Number of bytes
        #[arg(default_value = "1")]
        len: usize,
    },

    /// Write registers starting at a sub-address
    WriteReg {
        /// 7-bit target address
        #[arg(value_parser = parse_hex_u8)]
        address: u8,

        /// Register sub-address
        #[arg(value_parser = parse_hex_u8)]
        register: u8,

        /// Bytes to write
        #[arg(value_parser = parse_hex_u8, num_args = 1..)]
        data: Vec<u8>,
    },

    /// Show or set the bus clock
    Speed {
        /// Switch to 400 kHz
        #[arg(long, conflicts_with = "standard")]
        fast: bool,

        /// Switch to 100 kHz
        #[arg(long)]
        standard: bool,
    },
}

#[derive(Subcommand)]
pub enum SpiCommands {
    /// Clock in bytes
    Read {
        /// Number of bytes
        #[arg(default_value = "1")]
        len: usize,
    },

    /// Clock out bytes
    Write {
        /// Bytes to send
        #[arg(value_parser = parse_hex_u8, num_args = 1..)]
        data: Vec<u8>,
    },

    /// Send bytes with the exchange request
    Exchange {
        /// Bytes to send
        #[arg(value_parser = parse_hex_u8, num_args = 1..)]
        data: Vec<u8>,
    },

    /// Show or set the clock
    Speed {
        /// New clock in Mbps
        #[arg(long)]
        mbps: Option<u8>,
    },
}
