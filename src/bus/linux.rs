use std::io;

use spidev::{
	SpiModeFlags,
	Spidev,
	SpidevOptions,
	SpidevTransfer,
};

use super::{
	SpiRegisterBus,
	Transport,
};
use crate::Error;
use crate::gpio::{
	LineId,
	SysfsLine,
};

pub const CLOCK_FREQUENCY: u32 = 500_000;

impl Transport for Spidev {
	fn full_duplex(&mut self, write: &[u8], read: &mut [u8]) -> io::Result<()> {
		let mut transfer = SpidevTransfer::read_write(write, read);
		self.transfer(&mut transfer)
	}
}

/// "/dev/spidev1.0" is taken as is, "1.0" is short for "/dev/spidev1.0"
pub fn spi_device_path(bus: &str) -> String {
	if bus.contains('/') {
		bus.to_string()
	} else {
		format!("/dev/spidev{}", bus)
	}
}

// the spidev device isn't locked, other processes can still talk to other
// chips on the same bus.
fn open_spidev(path: &str) -> io::Result<Spidev> {
	let mut spi = Spidev::open(path)?;
	let options = SpidevOptions::new()
		.bits_per_word(8)
		.max_speed_hz(CLOCK_FREQUENCY)
		.mode(SpiModeFlags::SPI_MODE_0)
		.build();
	spi.configure(&options)?;
	Ok(spi)
}

fn initialization_error(e: failure::Error) -> Error {
	Error::Initialization(e.to_string())
}

impl SpiRegisterBus<Spidev, SysfsLine> {
	/// Open spidev device `bus` and the GPIO lines, then reset the radio.
	pub fn open(bus: &str, chip_select: LineId, reset: LineId) -> Result<Self, Error> {
		let path = spi_device_path(bus);
		let spi = with_context!(("SPI {}: open", path),
			Ok(open_spidev(&path)?)
		).map_err(initialization_error)?;
		info!("SPI {}: mode 0, {} Hz", path, CLOCK_FREQUENCY);

		let chip_select = SysfsLine::open_output(chip_select, true).map_err(initialization_error)?;
		let reset = SysfsLine::open_output(reset, true).map_err(initialization_error)?;

		SpiRegisterBus::new(spi, chip_select, reset)
	}
}
