use std::io;
use std::os::fd::RawFd;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sensor_protocol::{SensorEvent, SensorId};

use crate::clock::Clock;
use crate::config::Config;
use crate::drivers::Driver;
use crate::error::SensorError;
use crate::wake::{WakeChannel, Waker};

const NUM_DRIVERS: usize = SensorId::COUNT;
const READY_EVENTS: i16 = libc::POLLIN | libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;

/// Poll-set entry for one driver. Only the poll thread touches these.
#[derive(Debug, Clone, Copy, Default)]
struct PollDescriptor {
	fd: Option<RawFd>,
	/// Set when the last wait reported the descriptor readable; cleared once
	/// the driver has been drained.
	ready: bool,
}

#[derive(Debug, Default)]
struct Aggregation {
	enabled: u32,
	timeout_ns: Option<u64>,
}

#[derive(Debug, Default)]
struct Poller {
	descriptors: [PollDescriptor; NUM_DRIVERS],
}

/// Multiplexes every sensor driver behind a single poll call.
///
/// `poll_events` runs on a dedicated thread while `activate` and
/// `set_delay` may arrive from any other thread. Driver locks are only held
/// for the duration of one driver call and never across the blocking wait,
/// so configuration changes go through immediately and nudge the poll
/// thread through the wake channel.
pub struct PollContext {
	slots: [Mutex<Driver>; NUM_DRIVERS],
	aggregation: Mutex<Aggregation>,
	poller: Mutex<Poller>,
	wake: WakeChannel,
}

impl PollContext {
	#[tracing::instrument(skip_all)]
	pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, SensorError> {
		let drivers = SensorId::ALL.map(|id| Driver::for_sensor(id, config, &clock));
		Self::with_drivers(drivers)
	}

	/// Builds a context around explicit drivers, indexed by [`SensorId::index`].
	pub fn with_drivers(drivers: [Driver; NUM_DRIVERS]) -> Result<Self, SensorError> {
		let wake = WakeChannel::new().map_err(SensorError::Setup)?;
		let mut poller = Poller::default();
		for (descriptor, driver) in poller.descriptors.iter_mut().zip(&drivers) {
			descriptor.fd = driver.descriptor();
		}
		tracing::debug!(wake_fd = wake.read_fd(), "poll context ready");
		Ok(Self {
			slots: drivers.map(Mutex::new),
			aggregation: Mutex::new(Aggregation::default()),
			poller: Mutex::new(poller),
			wake,
		})
	}

	pub fn activate(&self, handle: i32, enabled: bool) -> Result<(), SensorError> {
		let id = handle_to_sensor(handle)?;
		lock(self.slot(id)).enable(enabled)?;

		if participates_in_timeout(id) {
			let mut aggregation = lock(&self.aggregation);
			let was_enabled = aggregation.enabled & id.bit() != 0;
			if was_enabled != enabled {
				aggregation.enabled ^= id.bit();
				aggregation.timeout_ns = self.compute_timeout(aggregation.enabled);
				tracing::debug!(
					sensor = %id,
					enabled,
					mask = aggregation.enabled,
					timeout_ns = ?aggregation.timeout_ns,
					"sensor activation changed"
				);
			}
		}

		if enabled && let Err(e) = self.wake.waker().wake() {
			tracing::warn!("error sending wake message: {e}");
		}
		Ok(())
	}

	pub fn set_delay(&self, handle: i32, ns: i64) -> Result<(), SensorError> {
		let id = handle_to_sensor(handle)?;
		let delay = u64::try_from(ns).map_err(|_| SensorError::InvalidArgument(ns))?;
		lock(self.slot(id)).set_delay(delay)?;

		let mut aggregation = lock(&self.aggregation);
		aggregation.timeout_ns = self.compute_timeout(aggregation.enabled);
		tracing::debug!(sensor = %id, ns, timeout_ns = ?aggregation.timeout_ns, "sensor delay set");
		Ok(())
	}

	/// Fills `buffer` with events from whichever enabled sensors have data,
	/// blocking only while none do.
	///
	/// Returns the number of events written; zero is a normal outcome when the
	/// wait times out with nothing new to report.
	pub fn poll_events(&self, buffer: &mut [SensorEvent]) -> Result<usize, SensorError> {
		let mut poller = lock(&self.poller);
		let max_count = buffer.len();
		let per_driver = if max_count > NUM_DRIVERS {
			max_count / NUM_DRIVERS
		} else {
			1
		};
		let mut total = 0;

		loop {
			for id in SensorId::ALL {
				if total == max_count {
					break;
				}
				let descriptor = &mut poller.descriptors[id.index()];
				let mut driver = lock(self.slot(id));
				if !driver.is_enabled() {
					*descriptor = PollDescriptor::default();
					continue;
				}
				descriptor.fd = driver.descriptor();
				if !(driver.has_pending_events() || descriptor.ready) {
					continue;
				}
				let budget = per_driver.min(max_count - total);
				let read = driver.read_events(&mut buffer[total..total + budget])?;
				if read < budget {
					descriptor.ready = false;
				}
				total += read;
			}

			if total == max_count {
				break;
			}
			let timeout_ms = if total > 0 {
				0
			} else {
				poll_timeout_ms(lock(&self.aggregation).timeout_ns)
			};
			if self.wait(&mut poller, timeout_ms)? == 0 {
				break;
			}
		}
		Ok(total)
	}

	/// Bitmask of sensors contributing to the aggregate timeout.
	pub fn enabled_mask(&self) -> u32 {
		lock(&self.aggregation).enabled
	}

	/// Current wait bound in nanoseconds; `None` waits indefinitely.
	pub fn aggregate_timeout(&self) -> Option<u64> {
		lock(&self.aggregation).timeout_ns
	}

	pub fn waker(&self) -> Waker {
		self.wake.waker()
	}

	fn slot(&self, id: SensorId) -> &Mutex<Driver> {
		&self.slots[id.index()]
	}

	fn compute_timeout(&self, enabled: u32) -> Option<u64> {
		SensorId::ALL
			.into_iter()
			.filter(|id| participates_in_timeout(*id) && enabled & id.bit() != 0)
			.filter_map(|id| lock(self.slot(id)).delay())
			.min()
	}

	/// Waits on every armed driver descriptor plus the wake channel. Returns
	/// the number of descriptors that became ready.
	fn wait(&self, poller: &mut Poller, timeout_ms: i32) -> Result<usize, SensorError> {
		let mut fds = [libc::pollfd {
			fd: -1,
			events: libc::POLLIN,
			revents: 0,
		}; NUM_DRIVERS + 1];
		for (pfd, descriptor) in fds.iter_mut().zip(&poller.descriptors) {
			pfd.fd = descriptor.fd.unwrap_or(-1);
		}
		fds[NUM_DRIVERS].fd = self.wake.read_fd();

		let ready = loop {
			let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
			if rc >= 0 {
				break rc as usize;
			}
			let err = io::Error::last_os_error();
			if err.kind() == io::ErrorKind::Interrupted {
				continue;
			}
			tracing::error!("poll() failed: {err}");
			return Err(SensorError::Poll(err));
		};

		for (descriptor, pfd) in poller.descriptors.iter_mut().zip(&fds) {
			if pfd.fd >= 0 && pfd.revents & READY_EVENTS != 0 {
				descriptor.ready = true;
			}
		}
		if fds[NUM_DRIVERS].revents & libc::POLLIN != 0 {
			self.wake.drain();
		}
		Ok(ready)
	}
}

fn handle_to_sensor(handle: i32) -> Result<SensorId, SensorError> {
	SensorId::from_handle(handle).ok_or(SensorError::InvalidHandle(handle))
}

/// The accelerometer paces itself through its hardware rate control and
/// wakes the poller through its own descriptor, so it never shortens the
/// shared wait.
fn participates_in_timeout(id: SensorId) -> bool {
	id != SensorId::Accelerometer
}

fn poll_timeout_ms(timeout_ns: Option<u64>) -> i32 {
	match timeout_ns {
		None => -1,
		Some(ns) => i32::try_from(ns / 1_000_000).unwrap_or(i32::MAX),
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
