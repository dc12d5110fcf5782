use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;

use nix::fcntl::OFlag;
use nix::unistd::pipe2;

const WAKE_MESSAGE: u8 = b'W';

/// Self-pipe used to break the poll thread out of its wait.
///
/// The read end sits in the poll set next to the sensor descriptors. Both
/// ends are non-blocking: a full pipe already guarantees a pending wake-up,
/// so dropped writes are harmless.
#[derive(Debug)]
pub struct WakeChannel {
	reader: File,
	waker: Waker,
}

/// Cloneable write end of a [`WakeChannel`].
#[derive(Debug, Clone)]
pub struct Waker {
	writer: Arc<File>,
}

impl WakeChannel {
	pub fn new() -> io::Result<Self> {
		let (read_end, write_end) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC)?;
		Ok(Self {
			reader: File::from(read_end),
			waker: Waker {
				writer: Arc::new(File::from(write_end)),
			},
		})
	}

	pub fn waker(&self) -> Waker {
		self.waker.clone()
	}

	pub fn read_fd(&self) -> RawFd {
		self.reader.as_raw_fd()
	}

	/// Consumes every queued wake byte. Returns how many were read.
	pub fn drain(&self) -> usize {
		let mut buf = [0u8; 16];
		let mut drained = 0;
		loop {
			match (&self.reader).read(&mut buf) {
				Ok(0) => break,
				Ok(n) => {
					for byte in buf[..n].iter().filter(|b| **b != WAKE_MESSAGE) {
						tracing::warn!("unknown message on wake queue (0x{byte:02x})");
					}
					drained += n;
				}
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) if e.kind() == ErrorKind::WouldBlock => break,
				Err(e) => {
					tracing::error!("error reading from wake pipe: {e}");
					break;
				}
			}
		}
		drained
	}
}

impl Waker {
	pub fn wake(&self) -> io::Result<()> {
		loop {
			match (&*self.writer).write(&[WAKE_MESSAGE]) {
				Ok(_) => return Ok(()),
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
				Err(e) => return Err(e),
			}
		}
	}
}
