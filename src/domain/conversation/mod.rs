pub mod schemas;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::message::{sort_chronologically, Message, Party, SenderRole};

// domain for the adoption conversation
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Application {
	pub id: u64,
	pub cat: u64,
	#[serde(default)]
	pub cat_detail: Option<CatSummary>,
	#[serde(default)]
	pub applicant_info: Option<ApplicantSummary>,
	pub status: ApplicationStatus,
	/// Computed by the backend for the requesting user.
	#[serde(default)]
	pub unread_count: u32,
	#[serde(default)]
	pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CatSummary {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub shelter_name: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ApplicantSummary {
	pub id: u64,
	#[serde(default)]
	pub username: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
	Pending,
	Reviewing,
	Trial,
	Accepted,
	Rejected,
	Cancelled,
}

impl ApplicationStatus {
	pub fn label(self) -> &'static str {
		match self {
			ApplicationStatus::Pending => "Awaiting response",
			ApplicationStatus::Reviewing => "In conversation",
			ApplicationStatus::Trial => "On trial",
			ApplicationStatus::Accepted => "Adoption confirmed",
			ApplicationStatus::Rejected => "Declined",
			ApplicationStatus::Cancelled => "Cancelled",
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Cancelled)
	}
}

/// The logged-in user as reported by the profile endpoint.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Viewer {
	pub id: u64,
	#[serde(rename = "user_type")]
	pub role: SenderRole,
	#[serde(default)]
	pub username: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComposerState {
	/// Conversation still pending: no input, a waiting notice instead.
	Locked,
	Open { can_send: bool },
}

impl ComposerState {
	pub fn for_conversation(
		application: &Application,
		viewer: &Viewer,
	) -> Self {
		if application.status == ApplicationStatus::Pending {
			return ComposerState::Locked;
		}
		let can_send = match viewer.role {
			SenderRole::Applicant => application
				.applicant_info
				.as_ref()
				.map_or(true, |applicant| applicant.id == viewer.id),
			SenderRole::ShelterStaff | SenderRole::Admin => true,
		};
		ComposerState::Open { can_send }
	}

	pub fn accepts_input(self) -> bool {
		matches!(self, ComposerState::Open { can_send: true })
	}

	pub fn waiting_notice(
		self,
		viewer: &Viewer,
	) -> Option<&'static str> {
		match (self, viewer.role.side()) {
			(ComposerState::Open { .. }, _) => None,
			(ComposerState::Locked, Party::Adopter) => {
				Some("The shelter has not opened this conversation yet. You can write once they start reviewing your application.")
			}
			(ComposerState::Locked, Party::Organization) => {
				Some("Start reviewing this application to open the conversation.")
			}
		}
	}
}

/// Local, transient copy of one conversation.
#[derive(Debug, Default)]
pub struct ConversationState {
	pub conversation_id: u64,
	pub application: Option<Application>,
	pub messages: Vec<Message>,
	pub viewer: Option<Viewer>,
	pub draft: String,
}

impl ConversationState {
	pub fn new(conversation_id: u64) -> Self {
		Self {
			conversation_id,
			..Default::default()
		}
	}

	/// Wholesale replacement with the freshly fetched list.
	pub fn replace_messages(
		&mut self,
		mut messages: Vec<Message>,
	) {
		sort_chronologically(&mut messages);
		self.messages = messages;
	}

	pub fn composer(&self) -> Option<ComposerState> {
		match (&self.application, &self.viewer) {
			(Some(application), Some(viewer)) => Some(ComposerState::for_conversation(application, viewer)),
			_ => None,
		}
	}

	pub fn snapshot(&self) -> ConversationSnapshot {
		ConversationSnapshot {
			conversation_id: self.conversation_id,
			application: self.application.clone(),
			messages: self.messages.clone(),
			composer: self.composer(),
			draft: self.draft.clone(),
		}
	}
}

/// What a view renders for one conversation.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ConversationSnapshot {
	pub conversation_id: u64,
	pub application: Option<Application>,
	pub messages: Vec<Message>,
	pub composer: Option<ComposerState>,
	pub draft: String,
}

impl ConversationSnapshot {
	pub fn status(&self) -> Option<ApplicationStatus> {
		self.application.as_ref().map(|application| application.status)
	}
}

#[derive(Clone, Default)]
pub struct ConversationStateWrapper(pub Arc<Mutex<ConversationState>>);
impl From<Arc<Mutex<ConversationState>>> for ConversationStateWrapper {
	fn from(value: Arc<Mutex<ConversationState>>) -> Self {
		Self(value)
	}
}
impl From<ConversationState> for ConversationStateWrapper {
	fn from(value: ConversationState) -> Self {
		Arc::new(Mutex::new(value)).into()
	}
}
impl ConversationStateWrapper {
	pub(crate) async fn write(&self) -> MutexGuard<'_, ConversationState> {
		self.0.lock().await
	}
}
