use crate::domain::conversation::ComposerState;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	/// Initial load failed; the caller should send the user to the login page.
	#[error("Login required, continue at {login_url}")]
	LoginRequired { login_url: String },

	#[error("Message is empty")]
	EmptyMessage,

	#[error("Composer is not available ({0:?})")]
	ComposerLocked(Option<ComposerState>),

	#[error("Failed to send message: {0}")]
	SendFailed(Box<ServiceError>),

	#[error("Unauthorized")]
	Unauthorized,

	#[error("EntityNotFound")]
	EntityNotFound,

	#[error("Unexpected HTTP status {0}")]
	HttpStatus(u16),

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error("Deserialization failed: {0}")]
	Deserialization(#[from] serde_json::Error),

	#[error("InvalidURL: {0}")]
	InvalidUrl(String),

	#[error("Invalid configuration: {0}")]
	Config(String),
}
