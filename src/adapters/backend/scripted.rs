use std::sync::{
	atomic::{AtomicBool, Ordering},
	Mutex,
};

use async_trait::async_trait;
use chrono::Duration;

use super::Backend;
use crate::{
	domain::{
		conversation::{
			schemas::{MarkAsReadResponse, SendMessage},
			Application, Viewer,
		},
		message::{Message, SenderInfo},
	},
	services::response::ServiceError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
	FetchApplication(u64),
	FetchMessages(u64),
	SendMessage(SendMessage),
	MarkAsRead(u64),
	ListApplications,
	FetchProfile,
}

/// In-memory backend that records every call and serves canned data.
pub(crate) struct ScriptedBackend {
	pub application: Mutex<Application>,
	/// Served in this exact order, so tests can scramble it.
	pub messages: Mutex<Vec<Message>>,
	pub viewer: Viewer,
	pub applications: Mutex<Vec<Application>>,
	pub calls: Mutex<Vec<Call>>,
	pub fail_fetch: AtomicBool,
	pub fail_profile: AtomicBool,
	pub fail_send: AtomicBool,
	pub fail_mark_as_read: AtomicBool,
	pub fail_list: AtomicBool,
	/// Message lists are captured when requested and delivered this much later.
	pub messages_latency: Mutex<Option<std::time::Duration>>,
}

impl ScriptedBackend {
	pub(crate) fn new(
		application: Application,
		messages: Vec<Message>,
		viewer: Viewer,
	) -> Self {
		Self {
			application: Mutex::new(application),
			messages: Mutex::new(messages),
			viewer,
			applications: Mutex::new(Vec::new()),
			calls: Mutex::new(Vec::new()),
			fail_fetch: AtomicBool::new(false),
			fail_profile: AtomicBool::new(false),
			fail_send: AtomicBool::new(false),
			fail_mark_as_read: AtomicBool::new(false),
			fail_list: AtomicBool::new(false),
			messages_latency: Mutex::new(None),
		}
	}

	pub(crate) fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub(crate) fn count(
		&self,
		predicate: impl Fn(&Call) -> bool,
	) -> usize {
		self.calls.lock().unwrap().iter().filter(|call| predicate(call)).count()
	}

	pub(crate) fn clear_calls(&self) {
		self.calls.lock().unwrap().clear();
	}

	fn record(
		&self,
		call: Call,
	) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl Backend for ScriptedBackend {
	async fn fetch_application(
		&self,
		id: u64,
	) -> Result<Application, ServiceError> {
		self.record(Call::FetchApplication(id));
		if self.fail_fetch.load(Ordering::SeqCst) {
			return Err(ServiceError::HttpStatus(502));
		}
		Ok(self.application.lock().unwrap().clone())
	}

	async fn fetch_messages(
		&self,
		application_id: u64,
	) -> Result<Vec<Message>, ServiceError> {
		self.record(Call::FetchMessages(application_id));
		if self.fail_fetch.load(Ordering::SeqCst) {
			return Err(ServiceError::HttpStatus(502));
		}
		let messages = self.messages.lock().unwrap().clone();
		let latency = *self.messages_latency.lock().unwrap();
		if let Some(latency) = latency {
			tokio::time::sleep(latency).await;
		}
		Ok(messages)
	}

	async fn send_message(
		&self,
		payload: &SendMessage,
	) -> Result<Message, ServiceError> {
		self.record(Call::SendMessage(payload.clone()));
		if self.fail_send.load(Ordering::SeqCst) {
			return Err(ServiceError::HttpStatus(500));
		}

		let mut messages = self.messages.lock().unwrap();
		let latest = messages.iter().map(|m| m.created_at).max().unwrap_or_default();
		let message = Message {
			id: messages.iter().map(|m| m.id).max().unwrap_or_default() + 1,
			application: payload.application_id,
			sender: self.viewer.id,
			sender_type: self.viewer.role,
			sender_info: SenderInfo {
				username: self.viewer.username.clone(),
				..Default::default()
			},
			content: payload.content.clone(),
			is_read: false,
			created_at: latest + Duration::seconds(1),
		};
		// new rows come back first, as an unordered API might return them
		messages.insert(0, message.clone());
		Ok(message)
	}

	async fn mark_as_read(
		&self,
		application_id: u64,
	) -> Result<MarkAsReadResponse, ServiceError> {
		self.record(Call::MarkAsRead(application_id));
		if self.fail_mark_as_read.load(Ordering::SeqCst) {
			return Err(ServiceError::HttpStatus(503));
		}
		let viewer_side = self.viewer.role.side();
		let mut marked = 0;
		for message in self.messages.lock().unwrap().iter_mut() {
			if !message.is_read && message.sender_type.side() != viewer_side {
				message.is_read = true;
				marked += 1;
			}
		}
		Ok(MarkAsReadResponse { marked_read_count: marked })
	}

	async fn list_applications(&self) -> Result<Vec<Application>, ServiceError> {
		self.record(Call::ListApplications);
		if self.fail_list.load(Ordering::SeqCst) {
			return Err(ServiceError::HttpStatus(502));
		}
		Ok(self.applications.lock().unwrap().clone())
	}

	async fn fetch_profile(&self) -> Result<Viewer, ServiceError> {
		self.record(Call::FetchProfile);
		if self.fail_profile.load(Ordering::SeqCst) {
			return Err(ServiceError::Unauthorized);
		}
		Ok(self.viewer.clone())
	}
}
