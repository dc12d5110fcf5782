use std::sync::Arc;

use sensor_protocol::SensorEvent;

use crate::clock::MonotonicClock;
use crate::config::Config;
use crate::error::SensorError;
use crate::poll_context::PollContext;

/// Status-code facade over [`PollContext`] for hosts that speak the
/// classic sensors poll-device convention: `0` or a count on success,
/// `-errno` on failure.
pub struct SensorsPollDevice {
	context: PollContext,
}

impl SensorsPollDevice {
	/// Opens every sensor described by `config`, timestamping with
	/// `CLOCK_MONOTONIC`.
	pub fn open(config: &Config) -> Result<Self, SensorError> {
		let context = PollContext::new(config, Arc::new(MonotonicClock))?;
		Ok(Self { context })
	}

	pub fn from_context(context: PollContext) -> Self {
		Self { context }
	}

	pub fn context(&self) -> &PollContext {
		&self.context
	}

	pub fn activate(&self, handle: i32, enabled: i32) -> i32 {
		status(self.context.activate(handle, enabled != 0))
	}

	pub fn set_delay(&self, handle: i32, ns: i64) -> i32 {
		status(self.context.set_delay(handle, ns))
	}

	/// Polls into the first `count` slots of `data`.
	pub fn poll(&self, data: &mut [SensorEvent], count: i32) -> i32 {
		let Ok(count) = usize::try_from(count) else {
			return -libc::EINVAL;
		};
		let count = count.min(data.len());
		match self.context.poll_events(&mut data[..count]) {
			Ok(n) => n as i32,
			Err(e) => {
				tracing::error!("poll_events failed: {e}");
				e.status_code()
			}
		}
	}
}

fn status(result: Result<(), SensorError>) -> i32 {
	match result {
		Ok(()) => 0,
		Err(e) => {
			tracing::debug!("request rejected: {e}");
			e.status_code()
		}
	}
}
