use std::{sync::Arc, time::Duration};

use tokio::sync::watch;

use super::{poll::PollHandle, response::ServiceError};
use crate::{
	adapters::backend::Backend,
	domain::{
		conversation::{schemas::SendMessage, ConversationSnapshot, ConversationState, ConversationStateWrapper, Viewer},
		message::{needs_read_receipt, Message},
	},
};

/// Keeps one conversation's message list current and publishes every change.
#[derive(Clone)]
pub struct ConversationSync {
	conversation_id: u64,
	backend: Arc<dyn Backend>,
	state: ConversationStateWrapper,
	updates: Arc<watch::Sender<ConversationSnapshot>>,
	login_url: String,
}

impl ConversationSync {
	pub fn new(
		backend: Arc<dyn Backend>,
		conversation_id: u64,
		login_url: impl Into<String>,
	) -> Self {
		let (updates, _) = watch::channel(ConversationSnapshot {
			conversation_id,
			..Default::default()
		});
		Self {
			conversation_id,
			backend,
			state: ConversationState::new(conversation_id).into(),
			updates: Arc::new(updates),
			login_url: login_url.into(),
		}
	}

	pub fn conversation_id(&self) -> u64 {
		self.conversation_id
	}

	/// Fetches the conversation, its messages and the viewer in parallel.
	///
	/// Any failure is answered with [`ServiceError::LoginRequired`]: a thread that
	/// cannot be loaded is never shown half-empty.
	pub async fn load_initial(&self) -> Result<ConversationSnapshot, ServiceError> {
		let id = self.conversation_id;
		let loaded = tokio::try_join!(
			self.backend.fetch_application(id),
			self.backend.fetch_messages(id),
			self.backend.fetch_profile(),
		);

		let (application, messages, viewer) = match loaded {
			Ok(loaded) => loaded,
			Err(err) => {
				tracing::error!(conversation_id = id, error = %err, "failed to load conversation");
				return Err(ServiceError::LoginRequired {
					login_url: self.login_url.clone(),
				});
			}
		};

		let snapshot = {
			let mut state = self.state.write().await;
			state.application = Some(application);
			state.viewer = Some(viewer.clone());
			state.replace_messages(messages);
			state.snapshot()
		};
		tracing::info!(conversation_id = id, messages = snapshot.messages.len(), "conversation loaded");

		self.acknowledge(&viewer, &snapshot.messages);
		self.updates.send_replace(snapshot.clone());
		Ok(snapshot)
	}

	/// Re-reads status and messages and replaces the local copy wholesale.
	///
	/// A failure leaves the previous state in place; the next tick tries again.
	pub async fn refresh(&self) -> Result<ConversationSnapshot, ServiceError> {
		let id = self.conversation_id;
		let fetched = tokio::try_join!(self.backend.fetch_application(id), self.backend.fetch_messages(id));
		let (application, messages) = match fetched {
			Ok(fetched) => fetched,
			Err(err) => {
				tracing::warn!(conversation_id = id, error = %err, "failed to refresh conversation");
				return Err(err);
			}
		};

		let (snapshot, viewer) = {
			let mut state = self.state.write().await;
			state.application = Some(application);
			state.replace_messages(messages);
			(state.snapshot(), state.viewer.clone())
		};
		tracing::debug!(conversation_id = id, messages = snapshot.messages.len(), "conversation refreshed");

		if let Some(viewer) = viewer {
			self.acknowledge(&viewer, &snapshot.messages);
		}
		self.updates.send_replace(snapshot.clone());
		Ok(snapshot)
	}

	/// Sends `content` and refreshes right after.
	///
	/// The content stays in the draft when the backend rejects it so the user can retry.
	pub async fn send(
		&self,
		content: &str,
	) -> Result<ConversationSnapshot, ServiceError> {
		if content.trim().is_empty() {
			return Err(ServiceError::EmptyMessage);
		}

		{
			let mut state = self.state.write().await;
			let composer = state.composer();
			if !composer.is_some_and(|composer| composer.accepts_input()) {
				return Err(ServiceError::ComposerLocked(composer));
			}
			state.draft = content.to_string();
		}

		let payload = SendMessage {
			application_id: self.conversation_id,
			content: content.to_string(),
		};
		match self.backend.send_message(&payload).await {
			Ok(message) => {
				tracing::info!(conversation_id = self.conversation_id, message_id = message.id, "message sent");
				self.state.write().await.draft.clear();
			}
			Err(err) => {
				tracing::warn!(conversation_id = self.conversation_id, error = %err, "failed to send message");
				self.publish().await;
				return Err(ServiceError::SendFailed(Box::new(err)));
			}
		}

		match self.refresh().await {
			Ok(snapshot) => Ok(snapshot),
			Err(_) => Ok(self.publish().await),
		}
	}

	/// Sends whatever is in the composer.
	pub async fn send_draft(&self) -> Result<ConversationSnapshot, ServiceError> {
		let draft = self.state.write().await.draft.clone();
		self.send(&draft).await
	}

	pub async fn set_draft(
		&self,
		draft: impl Into<String>,
	) {
		self.state.write().await.draft = draft.into();
	}

	pub async fn draft(&self) -> String {
		self.state.write().await.draft.clone()
	}

	pub async fn snapshot(&self) -> ConversationSnapshot {
		self.state.write().await.snapshot()
	}

	pub async fn viewer(&self) -> Option<Viewer> {
		self.state.write().await.viewer.clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
		self.updates.subscribe()
	}

	/// Refreshes every `period` until the handle is dropped.
	pub fn start_polling(
		&self,
		period: Duration,
	) -> PollHandle {
		let sync = self.clone();
		PollHandle::spawn(period, move || {
			let sync = sync.clone();
			async move {
				let _ = sync.refresh().await;
			}
		})
	}

	async fn publish(&self) -> ConversationSnapshot {
		let snapshot = self.state.write().await.snapshot();
		self.updates.send_replace(snapshot.clone());
		snapshot
	}

	/// One fire-and-forget read receipt for the whole batch; failures are only logged.
	fn acknowledge(
		&self,
		viewer: &Viewer,
		messages: &[Message],
	) -> bool {
		if !needs_read_receipt(messages, viewer) {
			return false;
		}
		let backend = self.backend.clone();
		let id = self.conversation_id;
		tokio::spawn(async move {
			match backend.mark_as_read(id).await {
				Ok(response) => {
					tracing::debug!(conversation_id = id, marked = response.marked_read_count, "messages marked as read")
				}
				Err(err) => tracing::warn!(conversation_id = id, error = %err, "failed to mark messages as read"),
			}
		});
		true
	}
}
