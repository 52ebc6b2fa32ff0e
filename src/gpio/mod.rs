use std::fmt;
use std::io;
use std::str;

use crate::Error;

mod sysfs;

pub use self::sysfs::SysfsLine;

/// A digital line configured as output
pub trait OutputLine {
	fn set_level(&mut self, high: bool) -> io::Result<()>;

	fn set_high(&mut self) -> io::Result<()> {
		self.set_level(true)
	}

	fn set_low(&mut self) -> io::Result<()> {
		self.set_level(false)
	}
}

impl<'a, L: ?Sized + OutputLine> OutputLine for &'a mut L {
	fn set_level(&mut self, high: bool) -> io::Result<()> {
		L::set_level(*self, high)
	}
}

/// Global GPIO line number
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Line number for pin `pin` of GPIO port `port` ('A' to 'J'); each port has
/// 16 lines.
pub fn pin_number(port: char, pin: u8) -> Result<LineId, Error> {
	if port < 'A' || port > 'J' {
		return Err(Error::InvalidArgument(format!("invalid GPIO port {:?} (expected 'A' to 'J')", port)));
	}
	Ok(LineId((port as u32 - 'A' as u32) * 16 + pin as u32))
}

impl str::FromStr for LineId {
	type Err = Error;

	// either a plain line number "34" or port and pin: "PC2", "C2"
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
			return s.parse::<u32>().map(LineId).map_err(|e| {
				Error::InvalidArgument(format!("invalid GPIO line number {:?}: {}", s, e))
			});
		}

		let port_pin = if s.len() > 2 && (s.starts_with('P') || s.starts_with('p')) { &s[1..] } else { s };
		let mut chars = port_pin.chars();
		let port = match chars.next() {
			Some(port) => port.to_ascii_uppercase(),
			None => return Err(Error::InvalidArgument("empty GPIO line".into())),
		};
		let pin = chars.as_str().parse::<u8>().map_err(|e| {
			Error::InvalidArgument(format!("invalid GPIO pin in {:?}: {}", s, e))
		})?;
		pin_number(port, pin)
	}
}
