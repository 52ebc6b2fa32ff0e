#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

extern crate rfm9x_transmit_basic;
use rfm9x_transmit_basic::*;

use std::process::exit;
use std::time::Duration;

use failure::ResultExt;

use rfm9x_transmit_basic::bus::{
	RegisterBus,
	SpiRegisterBus,
};
use rfm9x_transmit_basic::delay::reliable_sleep;
use rfm9x_transmit_basic::gpio::LineId;
use rfm9x_transmit_basic::radio::{
	RadioConfig,
	TransmitController,
};

const DEFAULT_BUS: &str = "/dev/spidev0.0";
const DEFAULT_CHIP_SELECT: &str = "PC2";
const DEFAULT_RESET: &str = "PC3";
const DEFAULT_FREQUENCY: &str = "915000000";
const DEFAULT_INTERVAL: &str = "10";

fn get_param<T>(matches: &clap::ArgMatches, name: &str, default: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = matches.value_of(name).unwrap_or(default);
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_optional_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<Option<T>>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	match matches.value_of(name) {
		None => Ok(None),
		Some(_) => get_param(matches, name, "").map(Some),
	}
}

fn dump_registers<B: RegisterBus>(bus: &mut B) -> AResult<()> {
	println!("Register dump");
	for (address, value) in bus.dump_registers()? {
		println!("Register 0x{:02x} - Value 0x{:02x}", address, value);
	}
	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg bus: -b --bus +takes_value "spidev device (default /dev/spidev0.0; \"B.C\" for /dev/spidevB.C)")
		(@arg chip_select: -c --("chip-select") +takes_value "chip select GPIO line (\"PC2\" or line number; default PC2)")
		(@arg reset: -r --reset +takes_value "reset GPIO line (\"PC3\" or line number; default PC3)")
		(@arg frequency: -f --frequency +takes_value "carrier frequency in Hz (default 915000000)")
		(@arg interval: -i --interval +takes_value "seconds to wait between messages (default 10)")
		(@arg count: -n --count +takes_value "stop after sending this many messages")
		(@arg timeout: -t --timeout +takes_value "give up waiting for transmit done after this many milliseconds")
		(@arg dump: -d --dump "dump registers after configuration")
		(@arg no_boost: --("no-boost") "use RFO output instead of PA_BOOST")
	).get_matches();

	let bus = matches.value_of("bus").unwrap_or(DEFAULT_BUS);
	let chip_select: LineId = get_param(&matches, "chip_select", DEFAULT_CHIP_SELECT)?;
	let reset: LineId = get_param(&matches, "reset", DEFAULT_RESET)?;
	let frequency: u64 = get_param(&matches, "frequency", DEFAULT_FREQUENCY)?;
	let interval: u64 = get_param(&matches, "interval", DEFAULT_INTERVAL)?;
	let count: Option<u64> = get_optional_param(&matches, "count")?;
	let timeout: Option<u64> = get_optional_param(&matches, "timeout")?;

	let config = RadioConfig {
		pa_boost: !matches.is_present("no_boost"),
		..RadioConfig::from_frequency_hz(frequency)?
	};

	let radio = SpiRegisterBus::open(bus, chip_select, reset)
		.with_context(|e| format!("radio on {} (chip select {}, reset {}): {}", bus, chip_select, reset, e))?;
	let mut controller = TransmitController::new(radio);
	controller.set_poll_timeout(timeout.map(Duration::from_millis));
	controller.configure(&config)?;

	if matches.is_present("dump") {
		dump_registers(controller.bus())?;
	}

	let mut send_count = 0u64;
	loop {
		send_count += 1;
		let message = format!("Hello LoRa {}!", send_count);
		info!("Sending {} bytes message {}", message.len(), message);
		controller.transmit_text(&message)?;

		if let Some(count) = count {
			if send_count >= count {
				return Ok(());
			}
		}
		reliable_sleep(Duration::from_secs(interval));
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
