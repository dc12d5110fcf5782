use std::io;
use std::path::PathBuf;

use nix::errno::Errno;

/// Failure reported by an individual sensor driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
	#[error("input device {0:?} not found")]
	NoDevice(String),
	#[error("i/o error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("unparsable value {raw:?} read from {path}")]
	InvalidValue { path: PathBuf, raw: String },
	#[cfg(test)]
	#[error("scripted failure ({0})")]
	Scripted(Errno),
}

impl DriverError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}

	pub fn errno(&self) -> Errno {
		match self {
			DriverError::NoDevice(_) => Errno::ENODEV,
			DriverError::Io { source, .. } => io_errno(source),
			DriverError::InvalidValue { .. } => Errno::EIO,
			#[cfg(test)]
			DriverError::Scripted(errno) => *errno,
		}
	}
}

/// Errors surfaced by the poll context.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
	#[error("invalid sensor handle {0}")]
	InvalidHandle(i32),
	#[error("invalid sampling delay {0}ns")]
	InvalidArgument(i64),
	#[error("driver error: {0}")]
	Driver(#[from] DriverError),
	#[error("poll failed: {0}")]
	Poll(io::Error),
	#[error("failed to set up poll context: {0}")]
	Setup(io::Error),
}

impl SensorError {
	pub fn errno(&self) -> Errno {
		match self {
			SensorError::InvalidHandle(_) | SensorError::InvalidArgument(_) => Errno::EINVAL,
			SensorError::Driver(err) => err.errno(),
			SensorError::Poll(err) | SensorError::Setup(err) => io_errno(err),
		}
	}

	/// Negative status code in the host calling convention.
	pub fn status_code(&self) -> i32 {
		-(self.errno() as i32)
	}
}

fn io_errno(err: &io::Error) -> Errno {
	err.raw_os_error().map(Errno::from_raw).unwrap_or(Errno::EIO)
}
