use serde::{Deserialize, Serialize};

/// Logical sensor identity. The discriminant is the host-visible handle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SensorId {
	#[default]
	Accelerometer = 0,
	Light = 1,
	Proximity = 2,
	Temperature = 3,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown sensor handle {0}")]
pub struct UnknownSensorHandle(pub i32);

impl SensorId {
	/// Every sensor, in the order the poll loop services them.
	pub const ALL: [SensorId; 4] = [
		SensorId::Accelerometer,
		SensorId::Light,
		SensorId::Proximity,
		SensorId::Temperature,
	];

	pub const COUNT: usize = Self::ALL.len();

	#[inline]
	pub fn from_handle(handle: i32) -> Option<Self> {
		Self::try_from(handle).ok()
	}

	#[inline]
	pub fn handle(self) -> i32 {
		self as i32
	}

	/// Position in per-sensor tables.
	#[inline]
	pub fn index(self) -> usize {
		self as usize
	}

	/// Bit used for this sensor in enabled-sensor masks.
	#[inline]
	pub fn bit(self) -> u32 {
		1 << self.index()
	}

	pub fn sensor_type(self) -> SensorType {
		match self {
			SensorId::Accelerometer => SensorType::Accelerometer,
			SensorId::Light => SensorType::Light,
			SensorId::Proximity => SensorType::Proximity,
			SensorId::Temperature => SensorType::Temperature,
		}
	}
}

impl TryFrom<i32> for SensorId {
	type Error = UnknownSensorHandle;

	fn try_from(handle: i32) -> Result<Self, Self::Error> {
		match handle {
			0 => Ok(SensorId::Accelerometer),
			1 => Ok(SensorId::Light),
			2 => Ok(SensorId::Proximity),
			3 => Ok(SensorId::Temperature),
			other => Err(UnknownSensorHandle(other)),
		}
	}
}

impl std::fmt::Display for SensorId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			SensorId::Accelerometer => "accelerometer",
			SensorId::Light => "light",
			SensorId::Proximity => "proximity",
			SensorId::Temperature => "temperature",
		};
		f.write_str(name)
	}
}

/// Host sensor-type tag carried in every event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SensorType {
	#[default]
	Accelerometer = 1,
	Light = 5,
	Temperature = 7,
	Proximity = 8,
}

impl SensorType {
	#[inline]
	pub fn tag(self) -> i32 {
		self as i32
	}
}

#[cfg(test)]
mod tests {
	use super::{SensorId, SensorType, UnknownSensorHandle};

	#[test]
	fn handles_are_stable() {
		assert_eq!(SensorId::Accelerometer.handle(), 0);
		assert_eq!(SensorId::Light.handle(), 1);
		assert_eq!(SensorId::Proximity.handle(), 2);
		assert_eq!(SensorId::Temperature.handle(), 3);
		for id in SensorId::ALL {
			assert_eq!(SensorId::from_handle(id.handle()), Some(id));
		}
	}

	#[test]
	fn unknown_handles_are_rejected() {
		assert_eq!(SensorId::try_from(99), Err(UnknownSensorHandle(99)));
		assert_eq!(SensorId::from_handle(-1), None);
		assert_eq!(SensorId::from_handle(4), None);
	}

	#[test]
	fn mask_bits_are_distinct() {
		let mask = SensorId::ALL.iter().fold(0u32, |acc, id| {
			assert_eq!(acc & id.bit(), 0);
			acc | id.bit()
		});
		assert_eq!(mask, 0b1111);
	}

	#[test]
	fn type_tags_match_host_constants() {
		assert_eq!(SensorId::Accelerometer.sensor_type().tag(), 1);
		assert_eq!(SensorId::Light.sensor_type().tag(), 5);
		assert_eq!(SensorId::Temperature.sensor_type(), SensorType::Temperature);
		assert_eq!(SensorType::Temperature.tag(), 7);
		assert_eq!(SensorType::Proximity.tag(), 8);
	}
}
