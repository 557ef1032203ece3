use std::{future::Future, time::Duration};

use tokio::{
	task::{JoinHandle, JoinSet},
	time::{interval, MissedTickBehavior},
};

/// Ticks still running when a new one is due; beyond this the tick is skipped.
const MAX_IN_FLIGHT: usize = 4;

/// A fixed-interval timer bound to the lifetime of its owner.
///
/// The first tick fires immediately. Every tick runs as its own task, so a hung
/// request only delays its own cycle and the next tick still fires on time.
/// At most [`MAX_IN_FLIGHT`] ticks run at once.
/// Stopping or dropping the handle cancels the timer and any tick still in flight.
pub struct PollHandle {
	task: JoinHandle<()>,
}

impl PollHandle {
	pub fn spawn<F, Fut>(
		period: Duration,
		mut tick: F,
	) -> Self
	where
		F: FnMut() -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let task = tokio::spawn(async move {
			let mut timer = interval(period);
			timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
			let mut in_flight = JoinSet::new();
			loop {
				timer.tick().await;
				while in_flight.try_join_next().is_some() {}
				if in_flight.len() >= MAX_IN_FLIGHT {
					tracing::warn!(in_flight = in_flight.len(), "previous polls still running, skipping this one");
					continue;
				}
				in_flight.spawn(tick());
			}
		});
		Self { task }
	}

	pub fn is_running(&self) -> bool {
		!self.task.is_finished()
	}

	pub fn stop(self) {}
}

impl Drop for PollHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}
