use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub addresses: Addresses,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub geocoding: GeocodingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub search_path: String,
	pub reverse_path: String,
	/// Optional. Sent as a bearer token when present.
	pub api_key: Option<String>,
	/// Public Nominatim instances reject requests without an identifying agent.
	pub user_agent: String,
	/// Optional. Forwarded as `accept-language`.
	pub language: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Quiet period before a typed query is dispatched.
	pub debounce_ms: u64,
	/// Upper bound on text-search candidates per generation.
	pub max_candidates: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { debounce_ms: 500, max_candidates: 10 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Addresses {
	/// Checklist seeded on records the user owns.
	pub self_checklist: Vec<String>,
}
impl Default for Addresses {
	fn default() -> Self {
		Self {
			self_checklist: vec![
				"Register the new address with the local authority".to_string(),
				"Update the address with your bank".to_string(),
				"Redirect post".to_string(),
				"Set up utilities".to_string(),
				"Update insurance".to_string(),
			],
		}
	}
}
