use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sensor_protocol::{EventPayload, SensorEvent, SensorId};

use crate::clock::Clock;
use crate::error::DriverError;

const DEFAULT_DELAY_NS: u64 = 200_000_000;
const MAX_VALUE_LEN: usize = 20;
/// Raw IR readings above this mean something is close to the sensor.
const PROXIMITY_NEAR_THRESHOLD: f32 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	Light,
	Proximity,
	Temperature,
}

impl ValueKind {
	pub fn sensor_id(self) -> SensorId {
		match self {
			ValueKind::Light => SensorId::Light,
			ValueKind::Proximity => SensorId::Proximity,
			ValueKind::Temperature => SensorId::Temperature,
		}
	}

	fn payload(self, raw: f32) -> EventPayload {
		match self {
			ValueKind::Light => EventPayload::Light(raw),
			ValueKind::Proximity => {
				EventPayload::Distance(if raw > PROXIMITY_NEAR_THRESHOLD { 0.0 } else { 1.0 })
			}
			ValueKind::Temperature => EventPayload::Temperature(raw),
		}
	}
}

/// Sensor backed by a text pseudo-file that is opened, read and closed on
/// every sample.
///
/// Only changes are reported: a reading equal to the previous one yields no
/// event. Enabling forgets the previous reading so the first sample after
/// enable is always delivered.
pub struct ValueSensor {
	kind: ValueKind,
	path: PathBuf,
	clock: Arc<dyn Clock>,
	enabled: bool,
	delay_ns: Option<u64>,
	last_value: Option<f32>,
	warned: bool,
}

impl ValueSensor {
	pub fn new(kind: ValueKind, path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
		Self {
			kind,
			path: path.into(),
			clock,
			enabled: false,
			delay_ns: Some(DEFAULT_DELAY_NS),
			last_value: None,
			warned: false,
		}
	}

	pub fn kind(&self) -> ValueKind {
		self.kind
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn enable(&mut self, on: bool) -> Result<(), DriverError> {
		if on {
			self.last_value = None;
		}
		self.enabled = on;
		Ok(())
	}

	pub fn set_delay(&mut self, ns: u64) -> Result<(), DriverError> {
		self.delay_ns = Some(ns);
		Ok(())
	}

	pub fn delay(&self) -> Option<u64> {
		self.delay_ns
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn has_pending_events(&self) -> bool {
		self.enabled
	}

	pub fn read_events(&mut self, out: &mut [SensorEvent]) -> Result<usize, DriverError> {
		if !self.enabled || out.is_empty() {
			return Ok(0);
		}
		let value = match self.sample() {
			Ok(value) => {
				self.warned = false;
				value
			}
			Err(e) => {
				if !self.warned {
					tracing::warn!(sensor = %self.kind.sensor_id(), "read failed: {e}");
					self.warned = true;
				}
				return Ok(0);
			}
		};
		if self.last_value == Some(value) {
			return Ok(0);
		}
		self.last_value = Some(value);
		let sensor = self.kind.sensor_id();
		out[0] = SensorEvent::new(sensor, self.kind.payload(value), self.clock.now_ns());
		tracing::debug!(%sensor, value, "new reading");
		Ok(1)
	}

	fn sample(&self) -> Result<f32, DriverError> {
		let mut file = File::open(&self.path).map_err(|e| DriverError::io(&self.path, e))?;
		let mut buf = [0u8; MAX_VALUE_LEN];
		let n = loop {
			match file.read(&mut buf) {
				Ok(n) => break n,
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => return Err(DriverError::io(&self.path, e)),
			}
		};
		let raw = String::from_utf8_lossy(&buf[..n]).into_owned();
		let parsed = raw.trim().parse::<f32>();
		parsed.map_err(|_| DriverError::InvalidValue {
			path: self.path.clone(),
			raw,
		})
	}
}
