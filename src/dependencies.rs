use std::sync::{Arc, OnceLock};

use crate::{adapters::backend::HttpBackend, config::Config, services::response::ServiceError};

pub fn config() -> Result<&'static Config, ServiceError> {
	static CONFIG: OnceLock<Config> = OnceLock::new();
	let config = match CONFIG.get() {
		None => {
			let config = Config::new()?;

			CONFIG.get_or_init(|| config)
		}
		Some(config) => config,
	};
	Ok(config)
}

/// Backend client built from the process config.
pub fn http_backend() -> Result<Arc<HttpBackend>, ServiceError> {
	Ok(Arc::new(HttpBackend::new(config()?)?))
}
