use async_trait::async_trait;
use reqwest::{
	header::{COOKIE, SET_COOKIE},
	Client, Method, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};

use super::Backend;
use crate::{
	config::Config,
	domain::{
		conversation::{
			schemas::{MarkAsRead, MarkAsReadResponse, Page, SendMessage, TokenRefresh, TokenRefreshResponse},
			Application, Viewer,
		},
		message::Message,
	},
	services::response::ServiceError,
};

const TOKEN_REFRESH_PATH: &str = "/api/accounts/token/refresh/";

struct Tokens {
	access: Option<String>,
	refresh: Option<String>,
	/// Bumped on every successful refresh so queued 401s can tell a refresh already happened.
	generation: u64,
}

pub struct HttpBackend {
	client: Client,
	base_url: Url,
	max_pages: usize,
	tokens: RwLock<Tokens>,
	refreshing: Mutex<()>,
}

impl HttpBackend {
	pub fn new(config: &Config) -> Result<Self, ServiceError> {
		let client = Client::builder()
			.user_agent(concat!("adopt-chat/", env!("CARGO_PKG_VERSION")))
			.timeout(config.request_timeout)
			.build()?;
		let base_url = Url::parse(config.api_url.trim_end_matches('/')).map_err(|_| ServiceError::InvalidUrl(config.api_url.clone()))?;
		Ok(Self {
			client,
			base_url,
			max_pages: config.max_pages,
			tokens: RwLock::new(Tokens {
				access: config.access_token.clone(),
				refresh: config.refresh_token.clone(),
				generation: 0,
			}),
			refreshing: Mutex::new(()),
		})
	}

	pub async fn access_token(&self) -> Option<String> {
		self.tokens.read().await.access.clone()
	}

	/// Resolves an API path or a server-provided link against `API_URL`.
	///
	/// Credentials are only ever sent to the configured host. A link to that host
	/// with another scheme or port (a TLS-terminating proxy reporting its internal
	/// address) is rebased onto `API_URL`; a link to any other host is refused.
	fn url(
		&self,
		path_or_url: &str,
	) -> Result<Url, ServiceError> {
		let invalid = || ServiceError::InvalidUrl(path_or_url.to_string());
		let url = if path_or_url.starts_with('/') {
			Url::parse(&format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path_or_url))
		} else {
			self.base_url.join(path_or_url)
		}
		.map_err(|_| invalid())?;

		if url.origin() == self.base_url.origin() {
			return Ok(url);
		}
		if url.host_str() != self.base_url.host_str() {
			return Err(invalid());
		}
		let mut rebased = self.base_url.clone();
		rebased.set_path(url.path());
		rebased.set_query(url.query());
		Ok(rebased)
	}

	async fn execute(
		&self,
		method: Method,
		url: &Url,
		body: Option<&serde_json::Value>,
	) -> Result<(Response, u64), ServiceError> {
		let mut request = self.client.request(method, url.clone());
		let generation = {
			let tokens = self.tokens.read().await;
			if let Some(access) = tokens.access.as_deref() {
				request = request.bearer_auth(access).header(COOKIE, format!("access_token={access}"));
			}
			tokens.generation
		};
		if let Some(body) = body {
			request = request.json(body);
		}
		Ok((request.send().await?, generation))
	}

	/// Sends the request; a 401 triggers one silent token refresh and a single retry.
	async fn call<T: DeserializeOwned>(
		&self,
		method: Method,
		path_or_url: &str,
		body: Option<serde_json::Value>,
	) -> Result<T, ServiceError> {
		let url = self.url(path_or_url)?;
		let (response, generation) = self.execute(method.clone(), &url, body.as_ref()).await?;

		let response = if response.status() == StatusCode::UNAUTHORIZED {
			tracing::debug!(%url, "access token rejected, refreshing");
			self.refresh_access_token(generation).await?;
			self.execute(method, &url, body.as_ref()).await?.0
		} else {
			response
		};
		decode(response).await
	}

	async fn refresh_access_token(
		&self,
		seen_generation: u64,
	) -> Result<(), ServiceError> {
		let _refreshing = self.refreshing.lock().await;

		let refresh_token = {
			let tokens = self.tokens.read().await;
			if tokens.generation != seen_generation {
				// Someone else refreshed while this request was waiting
				return Ok(());
			}
			tokens.refresh.clone()
		};

		let mut request = self.client.post(self.url(TOKEN_REFRESH_PATH)?).json(&TokenRefresh {
			refresh: refresh_token.clone(),
		});
		if let Some(refresh) = refresh_token.as_deref() {
			request = request.header(COOKIE, format!("refresh_token={refresh}"));
		}
		let response = request.send().await?;
		if !response.status().is_success() {
			tracing::warn!(status = %response.status(), "token refresh failed");
			return Err(ServiceError::Unauthorized);
		}

		let cookie_token = response
			.headers()
			.get_all(SET_COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.find_map(|cookie| cookie.strip_prefix("access_token="))
			.map(|rest| rest.split(';').next().unwrap_or_default().to_string());
		let body = match response.bytes().await {
			Ok(bytes) if !bytes.is_empty() => match serde_json::from_slice::<TokenRefreshResponse>(&bytes) {
				Ok(body) => body,
				Err(err) => {
					tracing::warn!(error = %err, "unreadable token refresh body");
					TokenRefreshResponse::default()
				}
			},
			Ok(_) => TokenRefreshResponse::default(),
			Err(err) => {
				tracing::warn!(error = %err, "failed to read token refresh body");
				TokenRefreshResponse::default()
			}
		};

		let mut tokens = self.tokens.write().await;
		match body.access.or(cookie_token) {
			Some(access) if tokens.access.as_deref() != Some(access.as_str()) => {
				tokens.access = Some(access);
				tokens.generation += 1;
				tracing::info!(generation = tokens.generation, "access token refreshed");
				Ok(())
			}
			_ => {
				tracing::warn!("token refresh returned no new access token");
				Err(ServiceError::Unauthorized)
			}
		}
	}

	async fn collect_pages<T: DeserializeOwned>(
		&self,
		first: String,
	) -> Result<Vec<T>, ServiceError> {
		let mut items = Vec::new();
		let mut next = Some(first);
		let mut pages = 0;

		while let Some(url) = next.take() {
			let page: Page<T> = self.call(Method::GET, &url, None).await?;
			pages += 1;
			next = page.next_page().map(str::to_string);
			items.extend(page.into_results());

			if let Some(link) = next.as_deref() {
				if self.url(link).is_err() {
					tracing::warn!(next = link, "next page is not on the API host, not following it");
					break;
				}
			}

			if pages >= self.max_pages {
				if next.is_some() {
					tracing::warn!(pages, "page limit reached, remaining pages ignored");
				}
				break;
			}
		}
		Ok(items)
	}
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
	match response.status() {
		status if status.is_success() => {
			let bytes = response.bytes().await?;
			Ok(serde_json::from_slice(&bytes)?)
		}
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ServiceError::Unauthorized),
		StatusCode::NOT_FOUND => Err(ServiceError::EntityNotFound),
		status => Err(ServiceError::HttpStatus(status.as_u16())),
	}
}

#[async_trait]
impl Backend for HttpBackend {
	async fn fetch_application(
		&self,
		id: u64,
	) -> Result<Application, ServiceError> {
		self.call(Method::GET, &format!("/api/applications/{id}/"), None).await
	}

	async fn fetch_messages(
		&self,
		application_id: u64,
	) -> Result<Vec<Message>, ServiceError> {
		self.collect_pages(format!("/api/messages/?application={application_id}")).await
	}

	async fn send_message(
		&self,
		payload: &SendMessage,
	) -> Result<Message, ServiceError> {
		self.call(Method::POST, "/api/messages/", Some(serde_json::to_value(payload)?)).await
	}

	async fn mark_as_read(
		&self,
		application_id: u64,
	) -> Result<MarkAsReadResponse, ServiceError> {
		let body = serde_json::to_value(MarkAsRead { application_id })?;
		self.call(Method::POST, "/api/messages/mark_as_read/", Some(body)).await
	}

	async fn list_applications(&self) -> Result<Vec<Application>, ServiceError> {
		self.collect_pages("/api/applications/".to_string()).await
	}

	async fn fetch_profile(&self) -> Result<Viewer, ServiceError> {
		self.call(Method::GET, "/api/accounts/profile/", None).await
	}
}
