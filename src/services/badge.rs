use std::{sync::Arc, time::Duration};

use tokio::sync::watch;

use super::{poll::PollHandle, response::ServiceError};
use crate::{adapters::backend::Backend, domain::conversation::Application};

pub fn compute_unread_badge(applications: &[Application]) -> u32 {
	applications
		.iter()
		.fold(0u32, |total, application| total.saturating_add(application.unread_count))
}

/// Global unread indicator, scoped to one signed-in session.
#[derive(Clone)]
pub struct UnreadBadge {
	backend: Arc<dyn Backend>,
	value: Arc<watch::Sender<u32>>,
}

impl UnreadBadge {
	pub fn new(backend: Arc<dyn Backend>) -> Self {
		let (value, _) = watch::channel(0);
		Self {
			backend,
			value: Arc::new(value),
		}
	}

	/// Lists every conversation and sums their unread counts. On failure the last
	/// value stays on display.
	pub async fn refresh(&self) -> Result<u32, ServiceError> {
		match self.backend.list_applications().await {
			Ok(applications) => {
				let total = compute_unread_badge(&applications);
				tracing::debug!(conversations = applications.len(), unread = total, "unread badge refreshed");
				self.value.send_if_modified(|current| {
					let changed = *current != total;
					*current = total;
					changed
				});
				Ok(total)
			}
			Err(err) => {
				tracing::warn!(error = %err, "failed to fetch unread count");
				Err(err)
			}
		}
	}

	pub fn value(&self) -> u32 {
		*self.value.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<u32> {
		self.value.subscribe()
	}

	pub fn start(
		&self,
		period: Duration,
	) -> PollHandle {
		let badge = self.clone();
		PollHandle::spawn(period, move || {
			let badge = badge.clone();
			async move {
				let _ = badge.refresh().await;
			}
		})
	}

	/// Back to zero, e.g. on logout.
	pub fn reset(&self) {
		self.value.send_replace(0);
	}
}

#[cfg(test)]
mod test {
	use std::{
		sync::{atomic::Ordering, Arc},
		time::Duration,
	};

	use super::{compute_unread_badge, UnreadBadge};
	use crate::{
		adapters::backend::scripted::{Call, ScriptedBackend},
		domain::{
			conversation::{
				test::{application, viewer},
				ApplicationStatus,
			},
			message::SenderRole,
		},
	};

	fn backend_with(unread: &[u32]) -> Arc<ScriptedBackend> {
		let backend = ScriptedBackend::new(
			application(1, ApplicationStatus::Reviewing, 0),
			Vec::new(),
			viewer(1, SenderRole::Applicant),
		);
		*backend.applications.lock().unwrap() = unread
			.iter()
			.enumerate()
			.map(|(i, count)| application(i as u64 + 1, ApplicationStatus::Reviewing, *count))
			.collect();
		Arc::new(backend)
	}

	#[test]
	fn test_badge_sums_unread_counts() {
		let applications: Vec<_> = [2, 0, 5]
			.iter()
			.enumerate()
			.map(|(i, count)| application(i as u64, ApplicationStatus::Trial, *count))
			.collect();
		assert_eq!(compute_unread_badge(&applications), 7);
		assert_eq!(compute_unread_badge(&[]), 0);
		assert_eq!(
			compute_unread_badge(&[
				application(1, ApplicationStatus::Trial, u32::MAX),
				application(2, ApplicationStatus::Trial, 1)
			]),
			u32::MAX
		);
	}

	#[tokio::test]
	async fn test_refresh_failure_keeps_last_value() {
		let backend = backend_with(&[2, 0, 5]);
		let badge = UnreadBadge::new(backend.clone());

		assert_eq!(badge.refresh().await.unwrap(), 7);
		backend.fail_list.store(true, Ordering::SeqCst);
		assert!(badge.refresh().await.is_err());
		assert_eq!(badge.value(), 7);

		badge.reset();
		assert_eq!(badge.value(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_badge_polls_every_period() {
		'_given: {
			let backend = backend_with(&[1, 1]);
			let badge = UnreadBadge::new(backend.clone());
			let mut updates = badge.subscribe();
			let handle = badge.start(Duration::from_secs(30));

			'_when: {
				updates.changed().await.unwrap();
				assert_eq!(*updates.borrow_and_update(), 2);

				backend.applications.lock().unwrap()[0].unread_count = 4;
				updates.changed().await.unwrap();

				'_then: {
					assert_eq!(*updates.borrow_and_update(), 5);
					assert_eq!(backend.count(|c| matches!(c, Call::ListApplications)), 2);
				}
			}
			drop(handle);
		}
	}
}
