use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read};
use std::mem::size_of;

pub(crate) const EV_SYN: u16 = 0x00;
pub(crate) const EV_ABS: u16 = 0x03;
pub(crate) const ABS_X: u16 = 0x00;
pub(crate) const ABS_Y: u16 = 0x01;
pub(crate) const ABS_Z: u16 = 0x02;

const LONG: usize = size_of::<libc::c_long>();

/// One decoded `struct input_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InputEvent {
	pub time_ns: i64,
	pub kind: u16,
	pub code: u16,
	pub value: i32,
}

impl InputEvent {
	/// Size of the kernel record: a `timeval` followed by type, code and value.
	pub const SIZE: usize = 2 * LONG + 8;

	fn decode(raw: &[u8]) -> Self {
		let sec = read_long(&raw[..LONG]);
		let usec = read_long(&raw[LONG..2 * LONG]);
		let rest = &raw[2 * LONG..];
		Self {
			time_ns: sec * 1_000_000_000 + usec * 1_000,
			kind: u16::from_ne_bytes([rest[0], rest[1]]),
			code: u16::from_ne_bytes([rest[2], rest[3]]),
			value: i32::from_ne_bytes([rest[4], rest[5], rest[6], rest[7]]),
		}
	}

	#[cfg(test)]
	pub fn encode(&self) -> Vec<u8> {
		let sec = (self.time_ns / 1_000_000_000) as libc::c_long;
		let usec = ((self.time_ns % 1_000_000_000) / 1_000) as libc::c_long;
		let mut out = Vec::with_capacity(Self::SIZE);
		out.extend_from_slice(&sec.to_ne_bytes());
		out.extend_from_slice(&usec.to_ne_bytes());
		out.extend_from_slice(&self.kind.to_ne_bytes());
		out.extend_from_slice(&self.code.to_ne_bytes());
		out.extend_from_slice(&self.value.to_ne_bytes());
		out
	}
}

fn read_long(bytes: &[u8]) -> i64 {
	let mut raw = [0u8; LONG];
	raw.copy_from_slice(bytes);
	libc::c_long::from_ne_bytes(raw) as i64
}

/// Bounded queue of input records read from an evdev descriptor.
///
/// Never holds more than `capacity` decoded records; a short read that
/// splits a record keeps the tail until the next fill.
#[derive(Debug)]
pub(crate) struct InputEventReader {
	capacity: usize,
	partial: Vec<u8>,
	queue: VecDeque<InputEvent>,
}

impl InputEventReader {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			partial: Vec::with_capacity(InputEvent::SIZE),
			queue: VecDeque::with_capacity(capacity),
		}
	}

	/// Reads whatever the source has ready. Returns the number of new records.
	///
	/// A source with nothing to read (`WouldBlock`) yields `Ok(0)`.
	pub fn fill(&mut self, mut source: impl Read) -> io::Result<usize> {
		let free = self.capacity - self.queue.len();
		if free == 0 {
			return Ok(0);
		}
		let mut buf = vec![0u8; free * InputEvent::SIZE - self.partial.len()];
		let n = loop {
			match source.read(&mut buf) {
				Ok(n) => break n,
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(0),
				Err(e) => return Err(e),
			}
		};
		self.partial.extend_from_slice(&buf[..n]);
		let whole = self.partial.len() / InputEvent::SIZE * InputEvent::SIZE;
		let before = self.queue.len();
		for raw in self.partial[..whole].chunks_exact(InputEvent::SIZE) {
			self.queue.push_back(InputEvent::decode(raw));
		}
		self.partial.drain(..whole);
		Ok(self.queue.len() - before)
	}

	pub fn next(&mut self) -> Option<InputEvent> {
		self.queue.pop_front()
	}

	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}

	/// Drops everything queued, including a partially read record.
	pub fn clear(&mut self) {
		self.queue.clear();
		self.partial.clear();
	}
}
