//! SPI commands

use fx2lp_core::{BoxedTransport, DeviceHandle, SpiBus};

use super::{format_hex, CommandResult};
use crate::cli::SpiCommands;

/// Run an SPI subcommand
pub fn run(handle: DeviceHandle<BoxedTransport>, cmd: SpiCommands) -> CommandResult {
    let bus = SpiBus::new(handle);

    match cmd {
        SpiCommands::Read { len } => {
            let data = bus.read_bytes(len)?;
            println!("{}", format_hex(&data));
        }
        SpiCommands::Write { data } => {
            bus.write_bytes(&data)?;
            log::info!("Wrote {} bytes", data.len());
        }
        SpiCommands::Exchange { data } => {
            let sent = bus.exchange(&data)?;
            log::info!("Exchanged {} bytes", sent);
        }
        SpiCommands::Speed { mbps } => {
            if let Some(mbps) = mbps {
                bus.set_speed_mbps(mbps)?;
            }
            match bus.speed_mbps()? {
                Some(mbps) => println!("SPI clock: {} Mbps", mbps),
                None => println!("SPI clock: unknown (no device attached)"),
            }
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use fx2lp_dummy::DummyFx2lp;

    fn boxed(dummy: &DummyFx2lp) -> DeviceHandle<BoxedTransport> {
        let transport: BoxedTransport = Box::new(dummy.clone());
        DeviceHandle::new(transport)
    }

    #[test]
    fn test_write_and_exchange() {
        let dummy = DummyFx2lp::new_default();

        run(boxed(&dummy), SpiCommands::Write { data: vec![0x9F] }).unwrap();
        run(
            boxed(&dummy),
            SpiCommands::Exchange {
                data: vec![0x01, 0x02],
            },
        )
        .unwrap();
        assert_eq!(dummy.spi_written(), vec![0x9F, 0x01, 0x02]);
    }

    #[test]
    fn test_read() {
        let dummy = DummyFx2lp::new_default();
        dummy.queue_spi_response(&[0xEF, 0x40]);

        run(boxed(&dummy), SpiCommands::Read { len: 3 }).unwrap();
        assert_eq!(dummy.transfer_count(), 1);
    }

    #[test]
    fn test_speed() {
        let dummy = DummyFx2lp::new_default();

        run(boxed(&dummy), SpiCommands::Speed { mbps: Some(20) }).unwrap();
        assert_eq!(dummy.spi_speed_mbps(), 20);

        run(boxed(&dummy), SpiCommands::Speed { mbps: None }).unwrap();
        assert_eq!(dummy.spi_speed_mbps(), 20);
    }
}
