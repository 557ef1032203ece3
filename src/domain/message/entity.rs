use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
	pub id: u64,
	/// Owning conversation (the backend calls it an application)
	pub application: u64,
	pub sender: u64,
	pub sender_type: SenderRole,
	#[serde(default)]
	pub sender_info: SenderInfo,
	pub content: String,
	pub is_read: bool,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum SenderRole {
	#[serde(rename = "user")]
	Applicant,
	#[serde(rename = "shelter")]
	ShelterStaff,
	#[serde(rename = "admin")]
	Admin,
}

/// Which side of an adoption conversation a role speaks for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Party {
	Adopter,
	Organization,
}

impl SenderRole {
	pub fn side(self) -> Party {
		match self {
			SenderRole::Applicant => Party::Adopter,
			SenderRole::ShelterStaff | SenderRole::Admin => Party::Organization,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			SenderRole::Applicant => "applicant",
			SenderRole::ShelterStaff => "shelter",
			SenderRole::Admin => "admin",
		}
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct SenderInfo {
	#[serde(default)]
	pub username: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_type: Option<SenderRole>,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Wire shape of a message. Some backends only tag the role inside `sender_info`.
#[derive(Deserialize)]
struct RawMessage {
	id: u64,
	application: u64,
	sender: u64,
	#[serde(default)]
	sender_type: Option<SenderRole>,
	#[serde(default)]
	sender_info: SenderInfo,
	content: String,
	is_read: bool,
	created_at: DateTime<Utc>,
}

impl TryFrom<RawMessage> for Message {
	type Error = String;

	fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
		let sender_type = raw
			.sender_type
			.or(raw.sender_info.user_type)
			.ok_or_else(|| format!("message {} has no sender_type or sender_info.user_type", raw.id))?;
		Ok(Message {
			id: raw.id,
			application: raw.application,
			sender: raw.sender,
			sender_type,
			sender_info: raw.sender_info,
			content: raw.content,
			is_read: raw.is_read,
			created_at: raw.created_at,
		})
	}
}
