//! Register access for Semtech SX127x based modules (HopeRF RFM9x).
//!
//! Every register access is a single SPI transaction (SPI mode 0):
//! - first byte: bit 7 selects direction (0: read, 1: write), bits 6..0 the
//!   register address
//! - following bytes: data to write, or filler bytes while reading; the chip
//!   auto-increments the address for each data byte (except for the FIFO
//!   register 0x00)
//!
//! The byte received while sending the address is meaningless and dropped.
//!
//! 16-bit values are read with the high byte first, but written with the low
//! byte first.

use std::io;
use std::time::Duration;

use crate::Error;
use crate::delay::{
	Delay,
	ThreadSleep,
};
use crate::gpio::OutputLine;

mod linux;

pub use self::linux::spi_device_path;

pub const REGISTER_ADDRESS_READ_MASK: u8 = 0x7f;
pub const REGISTER_ADDRESS_WRITE_FLAG: u8 = 0x80;

/// range of registers `dump_registers` reads (inclusive)
pub const DUMP_FIRST_REGISTER: u8 = 0x00;
pub const DUMP_LAST_REGISTER: u8 = 0x42;

/// datasheet: hold reset low for at least 100µs, then wait 5ms before using
/// the chip; we use 10ms for both.
pub const RESET_HOLD: Duration = Duration::from_millis(10);
pub const RESET_SETTLE: Duration = Duration::from_millis(10);

/// A single full-duplex SPI transfer.
pub trait Transport {
	// `read` always has the same length as `write`
	fn full_duplex(&mut self, write: &[u8], read: &mut [u8]) -> io::Result<()>;
}

impl<'a, T: ?Sized + Transport> Transport for &'a mut T {
	fn full_duplex(&mut self, write: &[u8], read: &mut [u8]) -> io::Result<()> {
		T::full_duplex(*self, write, read)
	}
}

/// Register level access to the radio; addresses are 7-bit register
/// addresses, the direction bit is handled by the implementation.
pub trait RegisterBus {
	fn read_byte(&mut self, address: u8) -> Result<u8, Error>;
	fn read_word(&mut self, address: u8) -> Result<u16, Error>;
	fn read_block(&mut self, address: u8, length: usize) -> Result<Vec<u8>, Error>;

	fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Error>;
	fn write_word(&mut self, address: u8, value: u16) -> Result<(), Error>;
	fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error>;

	/// (address, value) for all registers from `DUMP_FIRST_REGISTER` to
	/// `DUMP_LAST_REGISTER`
	fn dump_registers(&mut self) -> Result<Vec<(u8, u8)>, Error> {
		let mut dump = Vec::with_capacity((DUMP_LAST_REGISTER - DUMP_FIRST_REGISTER) as usize + 1);
		for address in DUMP_FIRST_REGISTER..=DUMP_LAST_REGISTER {
			dump.push((address, self.read_byte(address)?));
		}
		Ok(dump)
	}
}

impl<'a, B: ?Sized + RegisterBus> RegisterBus for &'a mut B {
	fn read_byte(&mut self, address: u8) -> Result<u8, Error> {
		B::read_byte(*self, address)
	}
	fn read_word(&mut self, address: u8) -> Result<u16, Error> {
		B::read_word(*self, address)
	}
	fn read_block(&mut self, address: u8, length: usize) -> Result<Vec<u8>, Error> {
		B::read_block(*self, address, length)
	}

	fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Error> {
		B::write_byte(*self, address, value)
	}
	fn write_word(&mut self, address: u8, value: u16) -> Result<(), Error> {
		B::write_word(*self, address, value)
	}
	fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error> {
		B::write_block(*self, address, data)
	}

	fn dump_registers(&mut self) -> Result<Vec<(u8, u8)>, Error> {
		B::dump_registers(*self)
	}
}

fn read_address(address: u8) -> u8 {
	address & REGISTER_ADDRESS_READ_MASK
}

fn write_address(address: u8) -> u8 {
	address | REGISTER_ADDRESS_WRITE_FLAG
}

/// `RegisterBus` on top of a SPI transport, with the chip select and reset
/// lines of the radio.
pub struct SpiRegisterBus<T: Transport, L: OutputLine> {
	transport: T,
	chip_select: L,
	reset: L,
}

impl<T: Transport, L: OutputLine> SpiRegisterBus<T, L> {
	/// takes ownership of transport and lines and resets the radio.
	pub fn new(transport: T, chip_select: L, reset: L) -> Result<Self, Error> {
		Self::with_delay(transport, chip_select, reset, ThreadSleep)
	}

	pub fn with_delay<D: Delay>(transport: T, chip_select: L, reset: L, mut delay: D) -> Result<Self, Error> {
		let mut bus = SpiRegisterBus {
			transport,
			chip_select,
			reset,
		};
		bus.hardware_reset(&mut delay)?;
		Ok(bus)
	}

	fn hardware_reset(&mut self, delay: &mut dyn Delay) -> Result<(), Error> {
		debug!("Radio reset: pulling reset line low");
		self.reset.set_low().map_err(|e| Error::Initialization(format!("drive reset line low: {}", e)))?;
		delay.delay(RESET_HOLD);
		self.reset.set_high().map_err(|e| Error::Initialization(format!("drive reset line high: {}", e)))?;
		delay.delay(RESET_SETTLE);
		debug!("Radio reset: done");
		Ok(())
	}

	pub fn into_inner(self) -> (T, L, L) {
		(self.transport, self.chip_select, self.reset)
	}

	// returns the bytes received while sending `frame`
	fn transfer(&mut self, frame: &[u8]) -> Result<Vec<u8>, Error> {
		let mut received = vec![0u8; frame.len()];

		self.chip_select.set_low().map_err(Error::BusTransfer)?;
		let result = self.transport.full_duplex(frame, &mut received);
		// always release chip select, but report the transfer error first
		let deselect = self.chip_select.set_high();
		result.map_err(Error::BusTransfer)?;
		deselect.map_err(Error::BusTransfer)?;

		debug!("SPI sent {:02x?}, received {:02x?}", frame, received);
		Ok(received)
	}
}

impl<T: Transport, L: OutputLine> RegisterBus for SpiRegisterBus<T, L> {
	fn read_byte(&mut self, address: u8) -> Result<u8, Error> {
		let received = self.transfer(&[read_address(address), 0x00])?;
		Ok(received[1])
	}

	fn read_word(&mut self, address: u8) -> Result<u16, Error> {
		let received = self.transfer(&[read_address(address), 0x00, 0x00])?;
		Ok((received[1] as u16) << 8 | received[2] as u16)
	}

	fn read_block(&mut self, address: u8, length: usize) -> Result<Vec<u8>, Error> {
		let mut frame = vec![0u8; length + 1];
		frame[0] = read_address(address);
		let mut received = self.transfer(&frame)?;
		received.remove(0);
		Ok(received)
	}

	fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Error> {
		self.transfer(&[write_address(address), value])?;
		Ok(())
	}

	fn write_word(&mut self, address: u8, value: u16) -> Result<(), Error> {
		self.transfer(&[write_address(address), value as u8, (value >> 8) as u8])?;
		Ok(())
	}

	fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error> {
		let mut frame = Vec::with_capacity(1 + data.len());
		frame.push(write_address(address));
		frame.extend_from_slice(data);
		self.transfer(&frame)?;
		Ok(())
	}
}
