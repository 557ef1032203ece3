mod http;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;

pub use self::http::HttpBackend;
use crate::{
	domain::{
		conversation::{
			schemas::{MarkAsReadResponse, SendMessage},
			Application, Viewer,
		},
		message::Message,
	},
	services::response::ServiceError,
};

/// REST surface of the adoption backend that the chat client depends on.
#[async_trait]
pub trait Backend: Send + Sync {
	/// `GET /api/applications/{id}/`
	async fn fetch_application(
		&self,
		id: u64,
	) -> Result<Application, ServiceError>;

	/// `GET /api/messages/?application={id}`, in whatever order the server sends.
	async fn fetch_messages(
		&self,
		application_id: u64,
	) -> Result<Vec<Message>, ServiceError>;

	/// `POST /api/messages/`
	async fn send_message(
		&self,
		payload: &SendMessage,
	) -> Result<Message, ServiceError>;

	/// `POST /api/messages/mark_as_read/`
	async fn mark_as_read(
		&self,
		application_id: u64,
	) -> Result<MarkAsReadResponse, ServiceError>;

	/// `GET /api/applications/`, every page.
	async fn list_applications(&self) -> Result<Vec<Application>, ServiceError>;

	/// `GET /api/accounts/profile/`
	async fn fetch_profile(&self) -> Result<Viewer, ServiceError>;
}
