/// Entered state of a transmission (`Poll` repeats while awaiting completion)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TransmitEvent {
	/// payload of `length` bytes gets written to the FIFO
	Loading { length: usize },
	Transmitting,
	AwaitingCompletion,
	/// TxDone not set yet (`irq_flags` as read); sleeping before next poll
	Poll { irq_flags: u8 },
	/// TxDone seen and cleared
	Done,
}

pub trait TransmitObserver {
	fn event(&mut self, event: TransmitEvent);
}

impl<F: FnMut(TransmitEvent)> TransmitObserver for F {
	fn event(&mut self, event: TransmitEvent) {
		self(event)
	}
}

/// Reports transitions through the `log` crate
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct LogObserver;

impl TransmitObserver for LogObserver {
	fn event(&mut self, event: TransmitEvent) {
		match event {
			TransmitEvent::Loading { length } => info!("Loading {} bytes into FIFO", length),
			TransmitEvent::Transmitting => info!("Start transmit"),
			TransmitEvent::AwaitingCompletion => info!("Send-wait"),
			TransmitEvent::Poll { irq_flags } => trace!("IRQ flags 0x{:02x}, waiting", irq_flags),
			TransmitEvent::Done => info!("Send-Done"),
		}
	}
}

#[cfg(test)]
mod test {
	use std::sync::Mutex;

	use log::{
		Level,
		LevelFilter,
		Log,
		Metadata,
		Record,
	};

	use super::{
		LogObserver,
		TransmitEvent,
		TransmitObserver,
	};

	static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	struct Capture;

	impl Log for Capture {
		fn enabled(&self, _: &Metadata) -> bool {
			true
		}

		fn log(&self, record: &Record) {
			RECORDS.lock().unwrap().push((record.level(), record.args().to_string()));
		}

		fn flush(&self) {}
	}

	static CAPTURE: Capture = Capture;

	fn check_logged(level: Level, message: &str) {
		let records = RECORDS.lock().unwrap();
		assert!(
			records.iter().any(|(l, m)| *l == level && m == message),
			"missing {} record {:?} in {:?}", level, message, *records
		);
	}

	#[test]
	fn transitions_logged_at_info() {
		log::set_logger(&CAPTURE).unwrap();
		log::set_max_level(LevelFilter::Trace);

		let mut observer = LogObserver;
		observer.event(TransmitEvent::Loading { length: 13 });
		observer.event(TransmitEvent::Transmitting);
		observer.event(TransmitEvent::AwaitingCompletion);
		observer.event(TransmitEvent::Poll { irq_flags: 0x40 });
		observer.event(TransmitEvent::Done);

		check_logged(Level::Info, "Loading 13 bytes into FIFO");
		check_logged(Level::Info, "Start transmit");
		check_logged(Level::Info, "Send-wait");
		check_logged(Level::Trace, "IRQ flags 0x40, waiting");
		check_logged(Level::Info, "Send-Done");
	}
}
