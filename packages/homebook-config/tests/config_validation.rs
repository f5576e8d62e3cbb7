use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use homebook_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn without_section(section: &str) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("homebook_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> homebook_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = homebook_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_message(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");

	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config should load.");

	assert_eq!(cfg.providers.geocoding.api_base, "https://nominatim.openstreetmap.org");
	assert!(cfg.providers.geocoding.api_key.is_none());
	assert_eq!(cfg.providers.geocoding.language.as_deref(), Some("en"));
	assert_eq!(cfg.search.debounce_ms, 500);
	assert_eq!(cfg.search.max_candidates, 10);
	assert_eq!(cfg.addresses.self_checklist.len(), 2);
}

#[test]
fn search_and_addresses_sections_default_when_absent() {
	let payload = without_section("search");
	let payload = {
		let mut root: Value = toml::from_str(&payload).expect("Failed to parse config.");

		root.as_table_mut().expect("Config must be a table.").remove("addresses");

		toml::to_string(&root).expect("Failed to render config.")
	};
	let cfg = load_payload(payload).expect("Config without optional sections should load.");

	assert_eq!(cfg.search.debounce_ms, 500);
	assert_eq!(cfg.search.max_candidates, 10);
	assert!(!cfg.addresses.self_checklist.is_empty());
}

#[test]
fn debounce_must_be_positive() {
	expect_validation_message(
		sample_with("search", "debounce_ms", Value::Integer(0)),
		"search.debounce_ms must be greater than zero.",
	);
}

#[test]
fn max_candidates_is_bounded() {
	expect_validation_message(
		sample_with("search", "max_candidates", Value::Integer(0)),
		"search.max_candidates must be in the range 1-50.",
	);
	expect_validation_message(
		sample_with("search", "max_candidates", Value::Integer(51)),
		"search.max_candidates must be in the range 1-50.",
	);
}

#[test]
fn geocoding_user_agent_is_required() {
	expect_validation_message(
		sample_with("providers.geocoding", "user_agent", Value::String("  ".to_string())),
		"providers.geocoding.user_agent must be non-empty.",
	);
}

#[test]
fn geocoding_timeout_must_be_positive() {
	expect_validation_message(
		sample_with("providers.geocoding", "timeout_ms", Value::Integer(0)),
		"providers.geocoding.timeout_ms must be greater than zero.",
	);
}

#[test]
fn default_header_values_must_be_strings() {
	expect_validation_message(
		sample_with("providers.geocoding.default_headers", "x-retries", Value::Integer(3)),
		"providers.geocoding.default_headers values must be strings.",
	);
}

#[test]
fn blank_checklist_entries_are_rejected() {
	expect_validation_message(
		sample_with(
			"addresses",
			"self_checklist",
			Value::Array(vec![Value::String("Redirect post".to_string()), Value::String(" ".to_string())]),
		),
		"addresses.self_checklist entries must be non-empty.",
	);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("homebook_config_test_does_not_exist.toml");
	let err = homebook_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn malformed_toml_reports_parse_error() {
	let err = load_payload("[service\nlog_level = ".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }));
}
