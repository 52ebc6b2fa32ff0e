use std::io;
use std::time::Duration;

#[derive(Debug, Fail)]
pub enum Error {
	/// SPI device or control line couldn't be opened or configured
	#[fail(display = "initialization failed: {}", _0)]
	Initialization(String),

	#[fail(display = "SPI transfer failed: {}", _0)]
	BusTransfer(#[cause] io::Error),

	#[fail(display = "invalid argument: {}", _0)]
	InvalidArgument(String),

	/// only with a bounded completion wait
	#[fail(display = "transmit not completed after {:?}", _0)]
	CompletionTimeout(Duration),
}
