use std::time::Duration;

use crate::services::response::ServiceError;

pub struct Config {
	/// Which events we want to log when `RUST_LOG` is unset
	pub log_level: String,

	/// Backend base url, e.g. `http://localhost:8000`
	pub api_url: String,
	pub access_token: Option<String>,
	pub refresh_token: Option<String>,

	/// Where the user is sent when the first load of a conversation fails
	pub login_url: String,
	pub message_poll_interval: Duration,
	pub badge_poll_interval: Duration,
	pub max_pages: usize,
	/// Upper bound for a single HTTP request, so a hung backend frees its poll slot
	pub request_timeout: Duration,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			log_level: "warn".to_string(),
			api_url: "http://localhost:8000".to_string(),
			access_token: None,
			refresh_token: None,
			login_url: "/login".to_string(),
			message_poll_interval: Duration::from_secs(5),
			badge_poll_interval: Duration::from_secs(30),
			max_pages: 20,
			request_timeout: Duration::from_secs(30),
		}
	}
}

impl Config {
	pub fn new() -> Result<Config, ServiceError> {
		dotenv::dotenv().ok();
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ServiceError> {
		let default = Config::default();

		let api_url = lookup("API_URL").unwrap_or(default.api_url);
		let api_url = api_url.trim_end_matches('/').to_string();
		if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
			return Err(ServiceError::InvalidUrl(api_url));
		}

		let log_level = lookup("LOG_LEVEL").unwrap_or(default.log_level);
		let login_url = lookup("LOGIN_URL").unwrap_or(default.login_url);
		let access_token = lookup("ACCESS_TOKEN").filter(|t| !t.is_empty());
		let refresh_token = lookup("REFRESH_TOKEN").filter(|t| !t.is_empty());

		let message_poll_interval = match lookup("MESSAGE_POLL_SECS") {
			Some(raw) => Duration::from_secs(parse_positive("MESSAGE_POLL_SECS", &raw)?),
			None => default.message_poll_interval,
		};
		let badge_poll_interval = match lookup("BADGE_POLL_SECS") {
			Some(raw) => Duration::from_secs(parse_positive("BADGE_POLL_SECS", &raw)?),
			None => default.badge_poll_interval,
		};
		let max_pages = match lookup("MAX_PAGES") {
			Some(raw) => parse_positive("MAX_PAGES", &raw)? as usize,
			None => default.max_pages,
		};

		let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
			Some(raw) => Duration::from_secs(parse_positive("REQUEST_TIMEOUT_SECS", &raw)?),
			None => default.request_timeout,
		};

		Ok(Config {
			log_level,
			api_url,
			access_token,
			refresh_token,
			login_url,
			message_poll_interval,
			badge_poll_interval,
			max_pages,
			request_timeout,
		})
	}
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ServiceError> {
	match raw.trim().parse::<u64>() {
		Ok(0) | Err(_) => Err(ServiceError::Config(format!("{key} must be a positive integer, got `{raw}`"))),
		Ok(value) => Ok(value),
	}
}
