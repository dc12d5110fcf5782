//! Shared vocabulary between the sensor HAL and its consumers.
//!
//! Handles, type tags and the event record layout are stable: consumers
//! persist handle numbers and compare type tags against the host's own
//! constants.

mod event;
mod sensor;

pub use event::{AccuracyStatus, EventPayload, SENSOR_EVENT_VERSION, SensorEvent};
pub use sensor::{SensorId, SensorType, UnknownSensorHandle};

/// Standard sampling periods requested by the host, in nanoseconds.
pub mod delay {
	/// As fast as the hardware allows.
	pub const FASTEST_NS: i64 = 0;
	/// Rate suitable for games.
	pub const GAME_NS: i64 = 20_000_000;
	/// Rate suitable for UI updates such as screen orientation.
	pub const UI_NS: i64 = 66_667_000;
	/// Default rate for background consumers.
	pub const NORMAL_NS: i64 = 200_000_000;
}
