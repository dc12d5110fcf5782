use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use sensor_protocol::{AccuracyStatus, EventPayload, SensorEvent, SensorId, delay};

use super::input_reader::{ABS_X, ABS_Y, ABS_Z, EV_ABS, EV_SYN, InputEventReader};
use crate::config::Config;
use crate::error::DriverError;

const INPUT_QUEUE_LEN: usize = 32;

/// Output data rate programmed into the accelerometer.
///
/// ```text
///          FASTEST      GAME        UI         NORMAL
/// <--200HZ-->|<--100HZ-->|<--50HZ-->|<----25HZ---|----
/// ```
///
/// Fast rates keep the part out of autosleep so game input stays
/// responsive; UI-rate consumers such as orientation let it doze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCode {
	Hz200 = 5,
	Hz100 = 10,
	Hz50 = 20,
	Hz25 = 40,
}

impl RateCode {
	pub fn for_delay(ns: u64) -> Self {
		let ns = i64::try_from(ns).unwrap_or(i64::MAX);
		if ns <= delay::FASTEST_NS {
			RateCode::Hz200
		} else if ns <= delay::GAME_NS {
			RateCode::Hz100
		} else if ns <= delay::UI_NS {
			RateCode::Hz50
		} else {
			RateCode::Hz25
		}
	}

	pub fn code(self) -> u32 {
		self as u32
	}
}

/// Accelerometer exposed by the kernel as an evdev input device.
///
/// Axis updates (`EV_ABS`) accumulate into a pending sample that is
/// emitted on each `EV_SYN`, stamped with the kernel's event time.
pub struct Accelerometer {
	name: String,
	device: Option<(PathBuf, File)>,
	reader: InputEventReader,
	rate_path: PathBuf,
	scale: f32,
	enabled: bool,
	delay_ns: Option<u64>,
	axes: [f32; 3],
}

impl Accelerometer {
	/// Locates the configured input device. A missing device is logged and
	/// leaves the driver without a descriptor.
	pub fn open(config: &Config) -> Self {
		let device = find_input_device(config);
		if device.is_none() {
			tracing::warn!(name = config.input_name(), "no accelerometer input device found");
		}
		Self::with_device(config, device)
	}

	pub(crate) fn with_device(config: &Config, device: Option<(PathBuf, File)>) -> Self {
		Self {
			name: config.input_name().to_string(),
			device,
			reader: InputEventReader::new(INPUT_QUEUE_LEN),
			rate_path: config.accel_rate_path().to_path_buf(),
			scale: config.accel_scale(),
			enabled: false,
			delay_ns: None,
			axes: [0.0; 3],
		}
	}

	pub fn enable(&mut self, on: bool) -> Result<(), DriverError> {
		if !on {
			self.enabled = false;
			return Ok(());
		}
		let Some((path, device)) = &self.device else {
			return Err(DriverError::NoDevice(self.name.clone()));
		};
		if !self.enabled {
			// Input queued while disabled is stale by now.
			self.reader.clear();
			while self
				.reader
				.fill(device)
				.map_err(|e| DriverError::io(path, e))?
				> 0
			{
				self.reader.clear();
			}
		}
		self.enabled = true;
		Ok(())
	}

	/// Programs the rate code matching `ns`. Boards without a rate control
	/// file accept every delay.
	pub fn set_delay(&mut self, ns: u64) -> Result<(), DriverError> {
		let rate = RateCode::for_delay(ns);
		match OpenOptions::new().write(true).open(&self.rate_path) {
			Ok(mut file) => {
				file.write_all(rate.code().to_string().as_bytes())
					.map_err(|e| DriverError::io(&self.rate_path, e))?;
				tracing::debug!(?rate, ns, "accelerometer rate updated");
			}
			Err(e) => {
				tracing::debug!(path = %self.rate_path.display(), "rate control unavailable: {e}");
			}
		}
		self.delay_ns = Some(ns);
		Ok(())
	}

	pub fn delay(&self) -> Option<u64> {
		self.delay_ns
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Only records already pulled off the descriptor count; fresh input is
	/// signalled through the descriptor itself.
	pub fn has_pending_events(&self) -> bool {
		self.enabled && !self.reader.is_empty()
	}

	pub fn read_events(&mut self, out: &mut [SensorEvent]) -> Result<usize, DriverError> {
		let Some((path, device)) = &self.device else {
			return Ok(0);
		};
		if out.is_empty() {
			return Ok(0);
		}
		self.reader
			.fill(device)
			.map_err(|e| DriverError::io(path, e))?;

		let mut written = 0;
		while written < out.len() {
			let Some(event) = self.reader.next() else {
				break;
			};
			match event.kind {
				EV_ABS => self.process_axis(event.code, event.value),
				EV_SYN => {
					if self.enabled {
						out[written] = SensorEvent::new(
							SensorId::Accelerometer,
							self.pending_payload(),
							event.time_ns,
						);
						written += 1;
					}
				}
				kind => {
					tracing::warn!(kind, code = event.code, "accelerometer: unknown input event");
				}
			}
		}
		Ok(written)
	}

	pub fn descriptor(&self) -> Option<RawFd> {
		self.device.as_ref().map(|(_, file)| file.as_raw_fd())
	}

	fn process_axis(&mut self, code: u16, value: i32) {
		let axis = match code {
			ABS_X => 0,
			ABS_Y => 1,
			ABS_Z => 2,
			_ => return,
		};
		self.axes[axis] = value as f32 * self.scale;
	}

	fn pending_payload(&self) -> EventPayload {
		let [x, y, z] = self.axes;
		EventPayload::Acceleration {
			x,
			y,
			z,
			status: AccuracyStatus::High,
		}
	}
}

/// Scans the input class directory for an `eventN` node whose device name
/// matches the configured one and opens it non-blocking.
fn find_input_device(config: &Config) -> Option<(PathBuf, File)> {
	let entries = match fs::read_dir(config.input_class_dir()) {
		Ok(entries) => entries,
		Err(e) => {
			tracing::warn!(
				dir = %config.input_class_dir().display(),
				"cannot list input devices: {e}"
			);
			return None;
		}
	};
	let mut nodes: Vec<_> = entries
		.filter_map(Result::ok)
		.map(|entry| entry.file_name())
		.filter(|node| node.to_string_lossy().starts_with("event"))
		.collect();
	nodes.sort();

	for node in nodes {
		let name_path = config.input_class_dir().join(&node).join("device/name");
		let Ok(name) = fs::read_to_string(&name_path) else {
			continue;
		};
		if name.trim() != config.input_name() {
			continue;
		}
		let dev_path = config.dev_input_dir().join(&node);
		match open_nonblocking(&dev_path) {
			Ok(file) => {
				tracing::debug!(path = %dev_path.display(), fd = file.as_raw_fd(), "opened accelerometer");
				return Some((dev_path, file));
			}
			Err(e) => {
				if e.kind() != ErrorKind::NotFound {
					tracing::warn!(path = %dev_path.display(), "cannot open input device: {e}");
				}
			}
		}
	}
	None
}

fn open_nonblocking(path: &Path) -> std::io::Result<File> {
	OpenOptions::new()
		.read(true)
		.custom_flags(libc::O_NONBLOCK)
		.open(path)
}

#[cfg(test)]
mod tests {
	use std::fs::File;
	use std::io::Write;

	use nix::fcntl::OFlag;
	use nix::unistd::pipe2;
	use sensor_protocol::{EventPayload, SensorEvent, SensorId};

	use super::*;
	use crate::drivers::input_reader::InputEvent;

	fn piped_accelerometer(config: &Config) -> (Accelerometer, File) {
		let (read_end, write_end) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
		let device = (PathBuf::from("/dev/input/event-test"), File::from(read_end));
		(
			Accelerometer::with_device(config, Some(device)),
			File::from(write_end),
		)
	}

	fn record(time_ns: i64, kind: u16, code: u16, value: i32) -> Vec<u8> {
		InputEvent {
			time_ns,
			kind,
			code,
			value,
		}
		.encode()
	}

	fn sample(feed: &mut File, time_ns: i64, x: i32, y: i32, z: i32) {
		let mut bytes = record(time_ns, EV_ABS, ABS_X, x);
		bytes.extend(record(time_ns, EV_ABS, ABS_Y, y));
		bytes.extend(record(time_ns, EV_ABS, ABS_Z, z));
		bytes.extend(record(time_ns, EV_SYN, 0, 0));
		feed.write_all(&bytes).unwrap();
	}

	#[test]
	fn rate_codes_follow_delay_classes() {
		assert_eq!(RateCode::for_delay(0), RateCode::Hz200);
		assert_eq!(RateCode::for_delay(1), RateCode::Hz100);
		assert_eq!(RateCode::for_delay(20_000_000), RateCode::Hz100);
		assert_eq!(RateCode::for_delay(60_000_000), RateCode::Hz50);
		assert_eq!(RateCode::for_delay(200_000_000), RateCode::Hz25);
		assert_eq!(RateCode::for_delay(u64::MAX), RateCode::Hz25);
		assert_eq!(RateCode::Hz100.code(), 10);
	}

	#[test]
	fn set_delay_writes_rate_code() {
		let dir = tempfile::tempdir().unwrap();
		let rate_path = dir.path().join("delay");
		std::fs::write(&rate_path, "").unwrap();
		let mut config = Config::default();
		config.set_accel_rate_path(&rate_path);
		let (mut accel, _feed) = piped_accelerometer(&config);

		assert_eq!(accel.delay(), None);
		accel.set_delay(10_000_000).unwrap();
		assert_eq!(std::fs::read_to_string(&rate_path).unwrap(), "10");
		assert_eq!(accel.delay(), Some(10_000_000));
	}

	#[test]
	fn missing_rate_control_is_not_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let mut config = Config::default();
		config.set_accel_rate_path(dir.path().join("absent/delay"));
		let (mut accel, _feed) = piped_accelerometer(&config);
		accel.set_delay(200_000_000).unwrap();
		assert_eq!(accel.delay(), Some(200_000_000));
	}

	#[test]
	fn enabling_without_device_fails() {
		let mut accel = Accelerometer::with_device(&Config::default(), None);
		assert!(matches!(accel.enable(true), Err(DriverError::NoDevice(_))));
		assert!(!accel.is_enabled());
		accel.enable(false).unwrap();
		assert_eq!(accel.descriptor(), None);
	}

	#[test]
	fn emits_scaled_sample_on_sync() {
		let mut config = Config::default();
		config.set_accel_scale(0.5);
		let (mut accel, mut feed) = piped_accelerometer(&config);
		accel.enable(true).unwrap();
		assert!(accel.descriptor().is_some());
		assert!(!accel.has_pending_events());

		sample(&mut feed, 3_000_000_000, 2, -4, 8);
		let mut out = [SensorEvent::default(); 4];
		assert_eq!(accel.read_events(&mut out).unwrap(), 1);
		assert_eq!(out[0].sensor, SensorId::Accelerometer);
		assert_eq!(out[0].timestamp, 3_000_000_000);
		let EventPayload::Acceleration { x, y, z, .. } = out[0].payload else {
			panic!("unexpected payload {:?}", out[0].payload);
		};
		assert_eq!((x, y, z), (1.0, -2.0, 4.0));
	}

	#[test]
	fn respects_output_budget_and_keeps_the_rest() {
		let (mut accel, mut feed) = piped_accelerometer(&Config::default());
		accel.enable(true).unwrap();
		for i in 0..3 {
			sample(&mut feed, 1_000_000_000 * (i + 1), 0, 0, 819);
		}
		let mut out = [SensorEvent::default(); 1];
		assert_eq!(accel.read_events(&mut out).unwrap(), 1);
		assert!(accel.has_pending_events());
		let mut out = [SensorEvent::default(); 8];
		assert_eq!(accel.read_events(&mut out).unwrap(), 2);
		assert_eq!(out[1].timestamp, 3_000_000_000);
	}

	#[test]
	fn disabled_accelerometer_consumes_without_emitting() {
		let (mut accel, mut feed) = piped_accelerometer(&Config::default());
		sample(&mut feed, 1_000, 1, 1, 1);
		let mut out = [SensorEvent::default(); 4];
		assert_eq!(accel.read_events(&mut out).unwrap(), 0);
	}

	#[test]
	fn enabling_discards_stale_input() {
		let (mut accel, mut feed) = piped_accelerometer(&Config::default());
		sample(&mut feed, 1_000, 1, 1, 1);
		accel.enable(true).unwrap();
		let mut out = [SensorEvent::default(); 4];
		assert_eq!(accel.read_events(&mut out).unwrap(), 0);
		sample(&mut feed, 2_000, 1, 1, 1);
		assert_eq!(accel.read_events(&mut out).unwrap(), 1);
	}

	#[test]
	fn discovers_device_by_name() {
		let dir = tempfile::tempdir().unwrap();
		let class_dir = dir.path().join("class");
		let dev_dir = dir.path().join("dev");
		for (node, name) in [("event0", "keyboard"), ("event2", "gsensor")] {
			std::fs::create_dir_all(class_dir.join(node).join("device")).unwrap();
			std::fs::write(class_dir.join(node).join("device/name"), format!("{name}\n")).unwrap();
		}
		std::fs::create_dir_all(&dev_dir).unwrap();
		std::fs::write(dev_dir.join("event0"), "").unwrap();
		std::fs::write(dev_dir.join("event2"), "").unwrap();

		let mut config = Config::default();
		config.set_input_class_dir(&class_dir).set_dev_input_dir(&dev_dir);
		let accel = Accelerometer::open(&config);
		let (path, _) = accel.device.as_ref().unwrap();
		assert_eq!(path, &dev_dir.join("event2"));
	}
}
