use adopt_chat::domain::{
	conversation::{ComposerState, ConversationSnapshot, Viewer},
	message::Message,
};

pub fn header(snapshot: &ConversationSnapshot) -> String {
	let Some(application) = snapshot.application.as_ref() else {
		return format!("conversation #{}", snapshot.conversation_id);
	};
	let (cat, shelter) = match application.cat_detail.as_ref() {
		Some(cat) => (cat.name.as_str(), cat.shelter_name.as_deref().unwrap_or("Shelter")),
		None => ("", "Shelter"),
	};
	let closed = if application.status.is_terminal() { " (closed)" } else { "" };
	format!("{shelter} | {cat} | status: {}{closed}", application.status.label())
}

pub fn message(
	message: &Message,
	viewer: &Viewer,
) -> String {
	let role = message.sender_type.label();
	let name = if message.is_from(viewer) {
		"you"
	} else {
		message.sender_info.username.as_str()
	};
	let time = message.created_at.format("%m/%d %H:%M");
	// own side on the right, the other party on the left
	if message.sender_type.side() == viewer.role.side() {
		format!("{:>60}\n{:>60}", message.content, format!("{name} ({role}) {time}"))
	} else {
		format!("{}\n{name} ({role}) {time}", message.content)
	}
}

pub fn composer(
	snapshot: &ConversationSnapshot,
	viewer: &Viewer,
) -> Option<String> {
	let composer = snapshot.composer?;
	match composer {
		ComposerState::Locked => composer.waiting_notice(viewer).map(str::to_string),
		ComposerState::Open { can_send: false } => Some("You can read this conversation but not reply to it.".to_string()),
		ComposerState::Open { can_send: true } => None,
	}
}
