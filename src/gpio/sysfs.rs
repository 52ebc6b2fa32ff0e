use std::io;

use sysfs_gpio::{
	Direction,
	Pin,
};

use super::{
	LineId,
	OutputLine,
};

fn into_io_error(e: sysfs_gpio::Error) -> io::Error {
	match e {
		sysfs_gpio::Error::Io(e) => e,
		e => io::Error::new(io::ErrorKind::Other, e.to_string()),
	}
}

/// GPIO line driven through `/sys/class/gpio`
#[derive(Debug)]
pub struct SysfsLine {
	line: LineId,
	pin: Pin,
	exported: bool, // unexport on drop if we exported it
}

impl SysfsLine {
	pub fn line(&self) -> LineId {
		self.line
	}

	/// export line (if necessary) and configure it as output with the given
	/// initial level
	pub fn open_output(line: LineId, high: bool) -> crate::AResult<SysfsLine> {
		let pin = Pin::new(line.0 as u64);
		let already_exported = pin.is_exported();
		if !already_exported {
			with_context!(("GPIO {}: export", line), {
				pin.export()?;
				Ok(())
			})?;
			debug!("GPIO {}: exported", line);
		}

		let result = SysfsLine {
			line,
			pin,
			exported: !already_exported,
		};

		// High/Low switch to output without glitching to the other level
		let direction = if high { Direction::High } else { Direction::Low };
		with_context!(("GPIO {}: configure as output", line), {
			result.pin.set_direction(direction)?;
			Ok(())
		})?;

		Ok(result)
	}
}

impl OutputLine for SysfsLine {
	fn set_level(&mut self, high: bool) -> io::Result<()> {
		self.pin.set_value(if high { 1 } else { 0 }).map_err(into_io_error)
	}
}

impl Drop for SysfsLine {
	fn drop(&mut self) {
		if self.exported {
			if let Err(e) = self.pin.unexport() {
				error!("GPIO {}: Failed to unexport: {}", self.line, e);
			}
		}
	}
}
