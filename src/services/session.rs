use std::{sync::Arc, time::Duration};

use super::{badge::UnreadBadge, conversation::ConversationSync, poll::PollHandle, response::ServiceError};
use crate::{adapters::backend::Backend, config::Config, domain::conversation::Viewer};

/// A signed-in shell: owns the viewer and the badge timer, hands out
/// conversation views. Dropping it (or `logout`) stops the badge.
pub struct Session {
	backend: Arc<dyn Backend>,
	viewer: Viewer,
	badge: UnreadBadge,
	badge_poll: Option<PollHandle>,
	login_url: String,
	message_poll_interval: Duration,
}

impl Session {
	/// Verifies the credentials through the profile endpoint, then starts the badge.
	pub async fn start(
		backend: Arc<dyn Backend>,
		config: &Config,
	) -> Result<Self, ServiceError> {
		let viewer = backend.fetch_profile().await.map_err(|err| {
			tracing::warn!(error = %err, "failed to fetch user");
			ServiceError::LoginRequired {
				login_url: config.login_url.clone(),
			}
		})?;
		tracing::info!(user = %viewer.username, role = viewer.role.label(), "session started");

		let badge = UnreadBadge::new(backend.clone());
		let badge_poll = Some(badge.start(config.badge_poll_interval));
		Ok(Self {
			backend,
			viewer,
			badge,
			badge_poll,
			login_url: config.login_url.clone(),
			message_poll_interval: config.message_poll_interval,
		})
	}

	pub fn viewer(&self) -> &Viewer {
		&self.viewer
	}

	pub fn badge(&self) -> &UnreadBadge {
		&self.badge
	}

	pub fn message_poll_interval(&self) -> Duration {
		self.message_poll_interval
	}

	pub fn conversation(
		&self,
		conversation_id: u64,
	) -> ConversationSync {
		ConversationSync::new(self.backend.clone(), conversation_id, self.login_url.clone())
	}

	pub fn logout(mut self) {
		self.badge_poll.take();
		self.badge.reset();
		tracing::info!(user = %self.viewer.username, "session closed");
	}
}

#[cfg(test)]
mod test {
	use std::{
		sync::{atomic::Ordering, Arc},
		time::Duration,
	};

	use super::Session;
	use crate::{
		adapters::backend::scripted::{Call, ScriptedBackend},
		config::Config,
		domain::{
			conversation::{
				test::{application, viewer},
				ApplicationStatus,
			},
			message::SenderRole,
		},
		services::response::ServiceError,
	};

	fn backend() -> Arc<ScriptedBackend> {
		let backend = ScriptedBackend::new(
			application(42, ApplicationStatus::Reviewing, 0),
			Vec::new(),
			viewer(2, SenderRole::ShelterStaff),
		);
		*backend.applications.lock().unwrap() =
			vec![application(42, ApplicationStatus::Reviewing, 3), application(43, ApplicationStatus::Pending, 1)];
		Arc::new(backend)
	}

	#[tokio::test(start_paused = true)]
	async fn test_logout_stops_badge_and_resets_it() {
		'_given: {
			let backend = backend();
			let session = Session::start(backend.clone(), &Config::default()).await.unwrap();
			let mut updates = session.badge().subscribe();
			updates.changed().await.unwrap();
			assert_eq!(session.badge().value(), 4);
			let badge = session.badge().clone();

			'_when: {
				session.logout();
				backend.clear_calls();
				tokio::time::sleep(Duration::from_secs(120)).await;

				'_then: {
					assert_eq!(badge.value(), 0);
					assert_eq!(backend.count(|c| matches!(c, Call::ListApplications)), 0);
				}
			}
		}
	}

	#[tokio::test]
	async fn test_unauthenticated_session_is_refused() {
		let backend = backend();
		backend.fail_profile.store(true, Ordering::SeqCst);

		let result = Session::start(backend.clone(), &Config::default()).await;
		assert!(matches!(result, Err(ServiceError::LoginRequired { .. })));
		assert_eq!(backend.count(|c| matches!(c, Call::ListApplications)), 0);
	}

	#[tokio::test]
	async fn test_conversation_views_share_the_backend() {
		let backend = backend();
		let session = Session::start(backend.clone(), &Config::default()).await.unwrap();

		let sync = session.conversation(42);
		let snapshot = sync.load_initial().await.unwrap();
		assert_eq!(snapshot.conversation_id, 42);
		assert_eq!(sync.viewer().await.as_ref(), Some(session.viewer()));
		assert_eq!(session.message_poll_interval(), Duration::from_secs(5));
	}
}
