use nix::time::{ClockId, clock_gettime};

/// Timestamp source for events that carry no kernel time of their own.
pub trait Clock: Send + Sync {
	/// Current time in nanoseconds.
	fn now_ns(&self) -> i64;
}

/// `CLOCK_MONOTONIC`, the timebase the host expects on every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
	fn now_ns(&self) -> i64 {
		match clock_gettime(ClockId::CLOCK_MONOTONIC) {
			Ok(ts) => ts.tv_sec() as i64 * 1_000_000_000 + ts.tv_nsec() as i64,
			Err(e) => {
				tracing::warn!("clock_gettime(CLOCK_MONOTONIC) failed: {e}");
				0
			}
		}
	}
}

#[cfg(test)]
pub(crate) struct FixedClock(pub i64);

#[cfg(test)]
impl Clock for FixedClock {
	fn now_ns(&self) -> i64 {
		self.0
	}
}
