pub mod entity;

pub use self::entity::{Message, Party, SenderInfo, SenderRole};
use crate::domain::conversation::Viewer;

impl Message {
	pub fn is_from(
		&self,
		viewer: &Viewer,
	) -> bool {
		self.sender == viewer.id
	}

	/// Unread and written by the other side of the conversation.
	///
	/// Staff of the same shelter count as one party, so a staff member opening
	/// the thread does not acknowledge a colleague's messages for the applicant.
	pub fn is_unread_from_other_party(
		&self,
		viewer: &Viewer,
	) -> bool {
		!self.is_read && self.sender_type.side() != viewer.role.side()
	}
}

/// Ascending by creation time; equal timestamps fall back to id so the order is
/// the same on every refresh.
pub fn sort_chronologically(messages: &mut [Message]) {
	messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

pub fn needs_read_receipt(
	messages: &[Message],
	viewer: &Viewer,
) -> bool {
	messages.iter().any(|message| message.is_unread_from_other_party(viewer))
}
