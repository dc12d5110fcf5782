use std::path::{Path, PathBuf};

/// Standard gravity divided by the accelerometer's counts per g.
pub const DEFAULT_ACCEL_SCALE: f32 = 9.806_65 / 819.0;

/// Where each driver finds its hardware, plus the few raw-value constants
/// the drivers need.
#[derive(Debug, Clone)]
pub struct Config {
	input_name: String,
	input_class_dir: PathBuf,
	dev_input_dir: PathBuf,
	accel_rate_path: PathBuf,
	accel_scale: f32,
	lux_path: PathBuf,
	proximity_path: PathBuf,
	temperature_path: PathBuf,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			input_name: "gsensor".into(),
			input_class_dir: "/sys/class/input".into(),
			dev_input_dir: "/dev/input".into(),
			accel_rate_path: "/sys/devices/platform/s3c2440-i2c.0/i2c-0/0-0018/delay".into(),
			accel_scale: DEFAULT_ACCEL_SCALE,
			lux_path: "/sys/bus/iio/devices/device0/lux".into(),
			proximity_path: "/sys/bus/iio/devices/device0/proxim_ir".into(),
			temperature_path: "/sys/class/hwmon/hwmon0/device/temp2_input".into(),
		}
	}
}

impl Config {
	/// Creates a configuration from process environment.
	///
	/// Every `GSENSORS_*` variable is optional and overrides the matching
	/// default.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut config = Self::default();
		let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		if let Some(name) = var("GSENSORS_INPUT_NAME") {
			config.set_input_name(name);
		}
		if let Some(dir) = var("GSENSORS_INPUT_CLASS_DIR") {
			config.set_input_class_dir(dir);
		}
		if let Some(dir) = var("GSENSORS_DEV_INPUT_DIR") {
			config.set_dev_input_dir(dir);
		}
		if let Some(path) = var("GSENSORS_ACCEL_RATE_PATH") {
			config.set_accel_rate_path(path);
		}
		if let Some(path) = var("GSENSORS_LUX_PATH") {
			config.set_lux_path(path);
		}
		if let Some(path) = var("GSENSORS_PROXIMITY_PATH") {
			config.set_proximity_path(path);
		}
		if let Some(path) = var("GSENSORS_TEMPERATURE_PATH") {
			config.set_temperature_path(path);
		}
		config
	}

	/// Sets the evdev device name the accelerometer driver looks for.
	pub fn set_input_name(&mut self, name: impl Into<String>) -> &mut Self {
		self.input_name = name.into();
		self
	}

	/// Sets the sysfs directory listing `eventN` input class entries.
	pub fn set_input_class_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
		self.input_class_dir = dir.as_ref().to_path_buf();
		self
	}

	/// Sets the directory holding `eventN` device nodes.
	pub fn set_dev_input_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
		self.dev_input_dir = dir.as_ref().to_path_buf();
		self
	}

	/// Sets the sysfs file that receives the accelerometer rate code.
	pub fn set_accel_rate_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
		self.accel_rate_path = path.as_ref().to_path_buf();
		self
	}

	/// Sets the factor applied to raw accelerometer axis values.
	pub fn set_accel_scale(&mut self, scale: f32) -> &mut Self {
		self.accel_scale = scale;
		self
	}

	pub fn set_lux_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
		self.lux_path = path.as_ref().to_path_buf();
		self
	}

	pub fn set_proximity_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
		self.proximity_path = path.as_ref().to_path_buf();
		self
	}

	pub fn set_temperature_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
		self.temperature_path = path.as_ref().to_path_buf();
		self
	}

	pub fn input_name(&self) -> &str {
		&self.input_name
	}

	pub fn input_class_dir(&self) -> &Path {
		&self.input_class_dir
	}

	pub fn dev_input_dir(&self) -> &Path {
		&self.dev_input_dir
	}

	pub fn accel_rate_path(&self) -> &Path {
		&self.accel_rate_path
	}

	pub fn accel_scale(&self) -> f32 {
		self.accel_scale
	}

	pub fn lux_path(&self) -> &Path {
		&self.lux_path
	}

	pub fn proximity_path(&self) -> &Path {
		&self.proximity_path
	}

	pub fn temperature_path(&self) -> &Path {
		&self.temperature_path
	}
}
