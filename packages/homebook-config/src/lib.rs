mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Addresses, Config, GeocodingProviderConfig, Postgres, Providers, Search, Service, Storage,
};

use std::{fs, path::Path};

pub const MAX_SEARCH_CANDIDATES: u32 = 50;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let geocoding = &cfg.providers.geocoding;

	for (label, value) in [
		("providers.geocoding.provider_id", &geocoding.provider_id),
		("providers.geocoding.api_base", &geocoding.api_base),
		("providers.geocoding.search_path", &geocoding.search_path),
		("providers.geocoding.reverse_path", &geocoding.reverse_path),
		("providers.geocoding.user_agent", &geocoding.user_agent),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if geocoding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.geocoding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if geocoding.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.geocoding.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.search.debounce_ms == 0 {
		return Err(Error::Validation {
			message: "search.debounce_ms must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_SEARCH_CANDIDATES).contains(&cfg.search.max_candidates) {
		return Err(Error::Validation {
			message: format!("search.max_candidates must be in the range 1-{MAX_SEARCH_CANDIDATES}."),
		});
	}
	if cfg.addresses.self_checklist.iter().any(|item| item.trim().is_empty()) {
		return Err(Error::Validation {
			message: "addresses.self_checklist entries must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let geocoding = &mut cfg.providers.geocoding;

	if geocoding.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		geocoding.api_key = None;
	}
	if geocoding.language.as_deref().map(|lang| lang.trim().is_empty()).unwrap_or(false) {
		geocoding.language = None;
	}

	geocoding.api_base = geocoding.api_base.trim_end_matches('/').to_string();
}
