use std::thread;
use std::time::{
	Duration,
	Instant,
};

/// `thread::sleep` may wake up early; keep sleeping until `duration` passed
pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

pub trait Delay {
	// block for (at least) `duration`
	fn delay(&mut self, duration: Duration);
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<'a, D: ?Sized + Delay> Delay for &'a mut D {
	fn delay(&mut self, duration: Duration) {
		D::delay(*self, duration)
	}
}
