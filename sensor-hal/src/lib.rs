//! Sensor aggregation HAL.
//!
//! Exposes an evdev accelerometer and sysfs light, proximity and
//! temperature sensors as one logical polling device. [`PollContext`] owns
//! the drivers and multiplexes them behind a single wait;
//! [`SensorsPollDevice`] adapts it to the host's status-code convention.

mod clock;
mod config;
mod device;
pub mod drivers;
mod error;
mod poll_context;
mod wake;

pub use clock::{Clock, MonotonicClock};
pub use config::{Config, DEFAULT_ACCEL_SCALE};
pub use device::SensorsPollDevice;
pub use error::{DriverError, SensorError};
pub use poll_context::PollContext;
pub use sensor_protocol::{EventPayload, SensorEvent, SensorId, SensorType};
pub use wake::{WakeChannel, Waker};

#[cfg(test)]
pub(crate) mod test_util {
	use tracing_subscriber::EnvFilter;

	pub fn init_tracing() {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::from_default_env())
			.with_test_writer()
			.try_init();
	}
}
