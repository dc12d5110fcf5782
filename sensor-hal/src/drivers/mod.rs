//! Sensor drivers behind the poll context.
//!
//! The set of drivers is fixed, so dispatch is a closed enum rather than a
//! trait object.

mod accelerometer;
mod input_reader;
#[cfg(test)]
pub(crate) mod scripted;
mod value_sensor;

use std::os::fd::RawFd;
use std::sync::Arc;

pub use accelerometer::{Accelerometer, RateCode};
use sensor_protocol::{SensorEvent, SensorId};
pub use value_sensor::{ValueKind, ValueSensor};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::DriverError;

pub enum Driver {
	Accelerometer(Accelerometer),
	Value(ValueSensor),
	#[cfg(test)]
	Scripted(scripted::ScriptedDriver),
}

impl Driver {
	/// Builds the production driver for `id`.
	pub fn for_sensor(id: SensorId, config: &Config, clock: &Arc<dyn Clock>) -> Self {
		match id {
			SensorId::Accelerometer => Driver::Accelerometer(Accelerometer::open(config)),
			SensorId::Light => Driver::Value(ValueSensor::new(
				ValueKind::Light,
				config.lux_path(),
				Arc::clone(clock),
			)),
			SensorId::Proximity => Driver::Value(ValueSensor::new(
				ValueKind::Proximity,
				config.proximity_path(),
				Arc::clone(clock),
			)),
			SensorId::Temperature => Driver::Value(ValueSensor::new(
				ValueKind::Temperature,
				config.temperature_path(),
				Arc::clone(clock),
			)),
		}
	}

	pub fn enable(&mut self, on: bool) -> Result<(), DriverError> {
		match self {
			Driver::Accelerometer(d) => d.enable(on),
			Driver::Value(d) => d.enable(on),
			#[cfg(test)]
			Driver::Scripted(d) => d.enable(on),
		}
	}

	pub fn set_delay(&mut self, ns: u64) -> Result<(), DriverError> {
		match self {
			Driver::Accelerometer(d) => d.set_delay(ns),
			Driver::Value(d) => d.set_delay(ns),
			#[cfg(test)]
			Driver::Scripted(d) => d.set_delay(ns),
		}
	}

	/// Last accepted sampling period; `None` until one has been set.
	pub fn delay(&self) -> Option<u64> {
		match self {
			Driver::Accelerometer(d) => d.delay(),
			Driver::Value(d) => d.delay(),
			#[cfg(test)]
			Driver::Scripted(d) => d.delay(),
		}
	}

	pub fn is_enabled(&self) -> bool {
		match self {
			Driver::Accelerometer(d) => d.is_enabled(),
			Driver::Value(d) => d.is_enabled(),
			#[cfg(test)]
			Driver::Scripted(d) => d.is_enabled(),
		}
	}

	/// Whether a read would produce data without waiting on a descriptor.
	pub fn has_pending_events(&self) -> bool {
		match self {
			Driver::Accelerometer(d) => d.has_pending_events(),
			Driver::Value(d) => d.has_pending_events(),
			#[cfg(test)]
			Driver::Scripted(d) => d.has_pending_events(),
		}
	}

	/// Writes at most `out.len()` events to the front of `out`.
	pub fn read_events(&mut self, out: &mut [SensorEvent]) -> Result<usize, DriverError> {
		match self {
			Driver::Accelerometer(d) => d.read_events(out),
			Driver::Value(d) => d.read_events(out),
			#[cfg(test)]
			Driver::Scripted(d) => d.read_events(out),
		}
	}

	pub fn descriptor(&self) -> Option<RawFd> {
		match self {
			Driver::Accelerometer(d) => d.descriptor(),
			Driver::Value(_) => None,
			#[cfg(test)]
			Driver::Scripted(d) => d.descriptor(),
		}
	}
}
