use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::{Arc, Mutex, MutexGuard};

use nix::errno::Errno;
use sensor_protocol::SensorEvent;

use crate::error::DriverError;

/// Behaviour of a [`ScriptedDriver`], shared with the test that owns it.
#[derive(Debug, Default)]
pub(crate) struct Script {
	pub enabled: bool,
	pub delay_ns: Option<u64>,
	pub fail_enable: Option<Errno>,
	pub fail_set_delay: Option<Errno>,
	pub fail_read: Option<Errno>,
	/// Reports pending whenever enabled, like a pseudo-file sensor.
	pub always_pending: bool,
	pub queued: VecDeque<SensorEvent>,
	/// Descriptor reported as-is and never read from.
	pub descriptor: Option<RawFd>,
	/// Non-blocking pipe end drained on every read, like a real device.
	pub feed: Option<File>,
	pub read_budgets: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
	pub fn lock(&self) -> MutexGuard<'_, Script> {
		self.0.lock().unwrap()
	}

	pub fn driver(&self) -> ScriptedDriver {
		ScriptedDriver(self.clone())
	}
}

pub struct ScriptedDriver(ScriptHandle);

impl ScriptedDriver {
	pub fn enable(&mut self, on: bool) -> Result<(), DriverError> {
		let mut script = self.0.lock();
		if let Some(errno) = script.fail_enable {
			return Err(DriverError::Scripted(errno));
		}
		script.enabled = on;
		Ok(())
	}

	pub fn set_delay(&mut self, ns: u64) -> Result<(), DriverError> {
		let mut script = self.0.lock();
		if let Some(errno) = script.fail_set_delay {
			return Err(DriverError::Scripted(errno));
		}
		script.delay_ns = Some(ns);
		Ok(())
	}

	pub fn delay(&self) -> Option<u64> {
		self.0.lock().delay_ns
	}

	pub fn is_enabled(&self) -> bool {
		self.0.lock().enabled
	}

	pub fn has_pending_events(&self) -> bool {
		let script = self.0.lock();
		script.enabled && (script.always_pending || !script.queued.is_empty())
	}

	pub fn read_events(&mut self, out: &mut [SensorEvent]) -> Result<usize, DriverError> {
		let mut script = self.0.lock();
		script.read_budgets.push(out.len());
		if let Some(errno) = script.fail_read {
			return Err(DriverError::Scripted(errno));
		}
		if let Some(feed) = &script.feed {
			let mut sink = [0u8; 64];
			while matches!((&*feed).read(&mut sink), Ok(n) if n > 0) {}
		}
		if !script.enabled {
			return Ok(0);
		}
		let mut written = 0;
		while written < out.len() {
			let Some(event) = script.queued.pop_front() else {
				break;
			};
			out[written] = event;
			written += 1;
		}
		Ok(written)
	}

	pub fn descriptor(&self) -> Option<RawFd> {
		let script = self.0.lock();
		script
			.feed
			.as_ref()
			.map(AsRawFd::as_raw_fd)
			.or(script.descriptor)
	}
}
