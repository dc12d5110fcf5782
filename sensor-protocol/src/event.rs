use serde::{Deserialize, Serialize};

use crate::{SensorId, SensorType};

/// Version tag stamped into every event. Matches the size of the host's
/// native event record.
pub const SENSOR_EVENT_VERSION: i32 = 104;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum AccuracyStatus {
	Unreliable = 0,
	Low = 1,
	Medium = 2,
	#[default]
	High = 3,
}

/// Type-specific value carried by an event.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
	/// Acceleration in m/s^2 along each device axis.
	Acceleration {
		x: f32,
		y: f32,
		z: f32,
		status: AccuracyStatus,
	},
	/// Illuminance in lux.
	Light(f32),
	/// `0.0` when something is near the sensor, `1.0` when far.
	Distance(f32),
	Temperature(f32),
}

impl Default for EventPayload {
	fn default() -> Self {
		EventPayload::Acceleration {
			x: 0.0,
			y: 0.0,
			z: 0.0,
			status: AccuracyStatus::default(),
		}
	}
}

/// One reading delivered to the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
	pub version: i32,
	pub sensor: SensorId,
	pub sensor_type: SensorType,
	pub payload: EventPayload,
	/// Monotonic time in nanoseconds.
	pub timestamp: i64,
}

impl SensorEvent {
	pub fn new(sensor: SensorId, payload: EventPayload, timestamp: i64) -> Self {
		Self {
			version: SENSOR_EVENT_VERSION,
			sensor,
			sensor_type: sensor.sensor_type(),
			payload,
			timestamp,
		}
	}

	/// Scalar value for single-valued sensors.
	pub fn scalar(&self) -> Option<f32> {
		match self.payload {
			EventPayload::Light(v) | EventPayload::Distance(v) | EventPayload::Temperature(v) => {
				Some(v)
			}
			EventPayload::Acceleration { .. } => None,
		}
	}
}
