//! Configuration and packet transmission for SX127x LoRa radios.
//!
//! A transmission runs through `Loading` (FIFO pointer reset, payload and
//! length written), `Transmitting` (TX mode), `AwaitingCompletion` (poll
//! RegIrqFlags for TxDone) and `Done` (TxDone cleared), then the controller
//! is `Idle` again.
//!
//! Transitions are reported to the `TransmitObserver` as they happen; between
//! calls the controller is always idle.
//!
//! Without a poll timeout (the default) a radio that never reports TxDone
//! blocks `run_transmit_cycle` forever.

use std::time::Duration;

use crate::Error;
use crate::bus::RegisterBus;
use crate::delay::{
	Delay,
	ThreadSleep,
};

pub mod consts;
mod observer;

pub use self::observer::{
	LogObserver,
	TransmitEvent,
	TransmitObserver,
};

use self::consts::*;

/// RegFrf code for a carrier frequency in Hz
pub fn frequency_code(hz: u64) -> Result<u32, Error> {
	let out_of_range = || Error::InvalidArgument(format!("frequency {} Hz out of range", hz));
	let code = hz.checked_mul(1 << 19).ok_or_else(out_of_range)? / FXOSC;
	if code > 0xff_ffff {
		return Err(out_of_range());
	}
	Ok(code as u32)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RadioConfig {
	/// 24-bit RegFrf value
	pub frequency: u32,
	/// PA_BOOST output (RFM9x modules only have this one wired)
	pub pa_boost: bool,
}

impl RadioConfig {
	pub fn from_frequency_hz(hz: u64) -> Result<Self, Error> {
		Ok(RadioConfig {
			frequency: frequency_code(hz)?,
			..RadioConfig::default()
		})
	}
}

impl Default for RadioConfig {
	fn default() -> Self {
		RadioConfig {
			frequency: FREQUENCY_915_MHZ,
			pa_boost: true,
		}
	}
}

pub struct TransmitController<B: RegisterBus, O: TransmitObserver = LogObserver, D: Delay = ThreadSleep> {
	bus: B,
	observer: O,
	delay: D,
	poll_timeout: Option<Duration>,
}

impl<B: RegisterBus> TransmitController<B> {
	pub fn new(bus: B) -> Self {
		TransmitController::with_parts(bus, LogObserver, ThreadSleep)
	}
}

impl<B: RegisterBus, O: TransmitObserver, D: Delay> TransmitController<B, O, D> {
	pub fn with_parts(bus: B, observer: O, delay: D) -> Self {
		TransmitController {
			bus,
			observer,
			delay,
			poll_timeout: None,
		}
	}

	pub fn bus(&mut self) -> &mut B {
		&mut self.bus
	}

	pub fn into_inner(self) -> B {
		self.bus
	}

	/// Give up waiting for TxDone once the poll sleeps add up to `timeout`.
	///
	/// `None` (the default) waits forever.
	pub fn set_poll_timeout(&mut self, timeout: Option<Duration>) {
		self.poll_timeout = timeout;
	}

	/// Switch to LoRa mode (in sleep mode) and set frequency and PA output.
	pub fn configure(&mut self, config: &RadioConfig) -> Result<(), Error> {
		self.bus.write_byte(REG_OP_MODE, MODE_LONG_RANGE | MODE_SLEEP)?;

		let frf = config.frequency;
		self.bus.write_block(REG_FRF_MSB, &[(frf >> 16) as u8, (frf >> 8) as u8, frf as u8])?;

		self.bus.write_byte(REG_PA_CONFIG, if config.pa_boost { PA_SELECT_BOOST } else { 0x00 })?;

		info!("Radio configured: LoRa, RegFrf 0x{:06x}, PA_BOOST {}", frf, config.pa_boost);
		Ok(())
	}

	pub fn transmit_text(&mut self, text: &str) -> Result<(), Error> {
		self.run_transmit_cycle(text.as_bytes())
	}

	/// Send one packet; returns after TxDone was seen and cleared.
	pub fn run_transmit_cycle(&mut self, payload: &[u8]) -> Result<(), Error> {
		if payload.len() > MAX_PAYLOAD_LENGTH {
			return Err(Error::InvalidArgument(format!(
				"payload of {} bytes exceeds maximum of {} bytes", payload.len(), MAX_PAYLOAD_LENGTH
			)));
		}

		self.transmit(payload)
	}

	fn transmit(&mut self, payload: &[u8]) -> Result<(), Error> {
		self.observer.event(TransmitEvent::Loading { length: payload.len() });
		self.bus.write_byte(REG_FIFO_TX_BASE_ADDR, 0x00)?;
		self.bus.write_byte(REG_FIFO_ADDR_PTR, 0x00)?;
		self.bus.write_block(REG_FIFO, payload)?;
		self.bus.write_byte(REG_PAYLOAD_LENGTH, payload.len() as u8)?;

		self.observer.event(TransmitEvent::Transmitting);
		self.bus.write_byte(REG_OP_MODE, MODE_LONG_RANGE | MODE_TX)?;

		self.observer.event(TransmitEvent::AwaitingCompletion);
		self.await_completion()?;

		self.bus.write_byte(REG_IRQ_FLAGS, IRQ_TX_DONE)?;
		self.observer.event(TransmitEvent::Done);

		Ok(())
	}

	fn await_completion(&mut self) -> Result<(), Error> {
		let mut waited = Duration::from_millis(0);
		loop {
			let irq_flags = self.bus.read_byte(REG_IRQ_FLAGS)?;
			if irq_flags & IRQ_TX_DONE != 0 {
				return Ok(());
			}

			if let Some(timeout) = self.poll_timeout {
				if waited >= timeout {
					return Err(Error::CompletionTimeout(waited));
				}
			}

			self.observer.event(TransmitEvent::Poll { irq_flags });
			self.delay.delay(POLL_INTERVAL);
			waited += POLL_INTERVAL;
		}
	}
}

#[cfg(test)]
mod test {
	use std::collections::VecDeque;
	use std::time::Duration;

	use super::{
		RadioConfig,
		TransmitController,
		TransmitEvent,
		frequency_code,
	};
	use crate::Error;
	use crate::bus::RegisterBus;
	use crate::delay::Delay;

	#[derive(Clone, PartialEq, Eq, Debug)]
	enum Op {
		ReadByte(u8),
		ReadWord(u8),
		ReadBlock(u8, usize),
		WriteByte(u8, u8),
		WriteWord(u8, u16),
		WriteBlock(u8, Vec<u8>),
	}

	// records operations; reads of RegIrqFlags are answered from `irq_flags`
	// (TxDone once the script is exhausted), other reads return the address
	#[derive(Default)]
	struct MockBus {
		ops: Vec<Op>,
		irq_flags: VecDeque<u8>,
		never_done: bool,
	}

	impl MockBus {
		fn with_irq_flags(flags: &[u8]) -> Self {
			MockBus {
				irq_flags: flags.iter().cloned().collect(),
				..MockBus::default()
			}
		}

		fn irq_reads(&self) -> usize {
			self.ops.iter().filter(|op| **op == Op::ReadByte(0x12)).count()
		}
	}

	impl RegisterBus for MockBus {
		fn read_byte(&mut self, address: u8) -> Result<u8, Error> {
			self.ops.push(Op::ReadByte(address));
			if address != 0x12 {
				return Ok(address);
			}
			match self.irq_flags.pop_front() {
				Some(flags) => Ok(flags),
				None if self.never_done => Ok(0x00),
				None => Ok(0x08),
			}
		}
		fn read_word(&mut self, address: u8) -> Result<u16, Error> {
			self.ops.push(Op::ReadWord(address));
			Ok(0)
		}
		fn read_block(&mut self, address: u8, length: usize) -> Result<Vec<u8>, Error> {
			self.ops.push(Op::ReadBlock(address, length));
			Ok(vec![0; length])
		}

		fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Error> {
			self.ops.push(Op::WriteByte(address, value));
			Ok(())
		}
		fn write_word(&mut self, address: u8, value: u16) -> Result<(), Error> {
			self.ops.push(Op::WriteWord(address, value));
			Ok(())
		}
		fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error> {
			self.ops.push(Op::WriteBlock(address, data.to_vec()));
			Ok(())
		}
	}

	#[derive(Default)]
	struct Recorder(Vec<TransmitEvent>);

	impl super::TransmitObserver for Recorder {
		fn event(&mut self, event: TransmitEvent) {
			self.0.push(event);
		}
	}

	#[derive(Default)]
	struct RecordDelay(Vec<Duration>);

	impl Delay for RecordDelay {
		fn delay(&mut self, duration: Duration) {
			self.0.push(duration);
		}
	}

	type Controller = TransmitController<MockBus, Recorder, RecordDelay>;

	fn controller(bus: MockBus) -> Controller {
		TransmitController::with_parts(bus, Recorder::default(), RecordDelay::default())
	}

	#[test]
	fn frequency_codes() {
		assert_eq!(frequency_code(915_000_000).unwrap(), 0xe4_c000);
		assert_eq!(frequency_code(868_000_000).unwrap(), 0xd9_0000);
		assert_eq!(frequency_code(433_000_000).unwrap(), 0x6c_4000);
		assert!(frequency_code(2_400_000_000).is_err());
		// would wrap around to the 915 MHz code when shifted
		match frequency_code((1u64 << 45) + 915_000_000) {
			Err(Error::InvalidArgument(_)) => (),
			r => panic!("frequency beyond u64 range must be rejected: {:?}", r),
		}
		assert!(frequency_code(u64::max_value()).is_err());
		assert_eq!(RadioConfig::default(), RadioConfig::from_frequency_hz(915_000_000).unwrap());
	}

	#[test]
	fn configure() {
		let mut c = controller(MockBus::default());
		c.configure(&RadioConfig::default()).unwrap();
		assert_eq!(c.bus.ops, vec![
			Op::WriteByte(0x01, 0b1000_0000),
			Op::WriteBlock(0x06, vec![0xe4, 0xc0, 0x00]),
			Op::WriteByte(0x09, 0b1000_0000),
		]);
	}

	#[test]
	fn transmit_cycle() {
		let mut c = controller(MockBus::with_irq_flags(&[0x08]));
		c.transmit_text("Hello LoRa 1!").unwrap();

		assert_eq!(c.bus.ops, vec![
			Op::WriteByte(0x0e, 0x00),
			Op::WriteByte(0x0d, 0x00),
			Op::WriteBlock(0x00, b"Hello LoRa 1!".to_vec()),
			Op::WriteByte(0x22, 13),
			Op::WriteByte(0x01, 0b1000_0011),
			Op::ReadByte(0x12),
			Op::WriteByte(0x12, 0x08),
		]);
		assert!(c.delay.0.is_empty());
	}

	#[test]
	fn polls_until_tx_done() {
		let mut c = controller(MockBus::with_irq_flags(&[0x00, 0x00, 0x00, 0x08]));
		c.run_transmit_cycle(b"ping").unwrap();

		assert_eq!(c.bus.irq_reads(), 4);
		assert_eq!(c.delay.0, vec![Duration::from_millis(10); 3]);
		assert_eq!(c.bus.ops.last(), Some(&Op::WriteByte(0x12, 0x08)));
		assert_eq!(c.observer.0, vec![
			TransmitEvent::Loading { length: 4 },
			TransmitEvent::Transmitting,
			TransmitEvent::AwaitingCompletion,
			TransmitEvent::Poll { irq_flags: 0x00 },
			TransmitEvent::Poll { irq_flags: 0x00 },
			TransmitEvent::Poll { irq_flags: 0x00 },
			TransmitEvent::Done,
		]);
	}

	#[test]
	fn other_irq_flags_ignored() {
		// RxDone alone isn't completion; only TxDone gets cleared
		let mut c = controller(MockBus::with_irq_flags(&[0x40, 0x48]));
		c.run_transmit_cycle(b"x").unwrap();
		assert_eq!(c.bus.irq_reads(), 2);
		assert_eq!(c.bus.ops.last(), Some(&Op::WriteByte(0x12, 0x08)));
	}

	#[test]
	fn payload_length_limit() {
		let mut c = controller(MockBus::default());
		c.run_transmit_cycle(&[0x55; 255]).unwrap();
		assert!(c.bus.ops.contains(&Op::WriteByte(0x22, 255)));

		let mut c = controller(MockBus::default());
		match c.run_transmit_cycle(&[0x55; 256]) {
			Err(Error::InvalidArgument(_)) => (),
			r => panic!("256 byte payload must be rejected: {:?}", r),
		}
		assert!(c.bus.ops.is_empty());
		assert!(c.observer.0.is_empty());
	}

	#[test]
	fn utf8_payload() {
		let mut c = controller(MockBus::default());
		c.transmit_text("Grüße").unwrap();
		assert!(c.bus.ops.contains(&Op::WriteBlock(0x00, "Grüße".as_bytes().to_vec())));
		assert!(c.bus.ops.contains(&Op::WriteByte(0x22, 7)));
	}

	#[test]
	fn bounded_wait() {
		let mut c = controller(MockBus { never_done: true, ..MockBus::default() });
		c.set_poll_timeout(Some(Duration::from_millis(30)));
		match c.run_transmit_cycle(b"lost") {
			Err(Error::CompletionTimeout(waited)) => assert_eq!(waited, Duration::from_millis(30)),
			r => panic!("expected timeout: {:?}", r),
		}
		assert_eq!(c.bus.irq_reads(), 4);
		assert_eq!(c.delay.0.len(), 3);
		assert!(!c.bus.ops.contains(&Op::WriteByte(0x12, 0x08)));
		assert_eq!(c.observer.0.last(), Some(&TransmitEvent::Poll { irq_flags: 0x00 }));
		assert!(!c.observer.0.contains(&TransmitEvent::Done));
	}

	#[test]
	fn repeated_cycles() {
		let mut c = controller(MockBus::with_irq_flags(&[0x00, 0x08, 0x08]));
		for n in 1..=2 {
			c.transmit_text(&format!("Hello LoRa {}!", n)).unwrap();
		}
		let clears = c.bus.ops.iter().filter(|op| **op == Op::WriteByte(0x12, 0x08)).count();
		assert_eq!(clears, 2);
		assert_eq!(c.bus.irq_reads(), 3);
	}
}
