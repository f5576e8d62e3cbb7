use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::{Map, Value};

use homebook_config::GeocodingProviderConfig;
use homebook_domain::{Candidate, Coordinate, Placemark};

const LOCALITY_KEYS: [&str; 5] = ["city", "town", "village", "hamlet", "municipality"];
const STREET_KEYS: [&str; 4] = ["road", "pedestrian", "footway", "square"];
const SUB_LOCALITY_KEYS: [&str; 3] = ["suburb", "neighbourhood", "quarter"];

pub async fn text_search(
	cfg: &GeocodingProviderConfig,
	query: &str,
	limit: u32,
) -> Result<Vec<Candidate>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.search_path);
	let limit = limit.to_string();
	let mut params = vec![
		("q", query),
		("format", "jsonv2"),
		("limit", limit.as_str()),
		("addressdetails", "0"),
	];

	if let Some(language) = cfg.language.as_deref() {
		params.push(("accept-language", language));
	}

	let res = client
		.get(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.user_agent, &cfg.default_headers)?)
		.query(&params)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

pub async fn reverse_geocode(
	cfg: &GeocodingProviderConfig,
	coordinate: Coordinate,
) -> Result<Option<Placemark>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.reverse_path);
	let lat = coordinate.latitude.to_string();
	let lon = coordinate.longitude.to_string();
	let mut params = vec![
		("lat", lat.as_str()),
		("lon", lon.as_str()),
		("format", "jsonv2"),
		("addressdetails", "1"),
	];

	if let Some(language) = cfg.language.as_deref() {
		params.push(("accept-language", language));
	}

	let res = client
		.get(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.user_agent, &cfg.default_headers)?)
		.query(&params)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_reverse_response(json)
}

fn parse_search_response(json: Value) -> Result<Vec<Candidate>> {
	let items = json.as_array().ok_or_else(|| eyre::eyre!("Search response must be an array."))?;
	let mut candidates = Vec::with_capacity(items.len());

	for item in items {
		let coordinate = parse_coordinate(item)?;
		let title = item
			.get("display_name")
			.or_else(|| item.get("name"))
			.and_then(|v| v.as_str())
			.unwrap_or_default()
			.trim()
			.to_string();

		candidates.push(Candidate { title, coordinate });
	}

	Ok(candidates)
}

fn parse_reverse_response(json: Value) -> Result<Option<Placemark>> {
	// A coordinate nobody has mapped is answered with an error object, not a status code.
	if json.get("error").is_some() {
		return Ok(None);
	}

	let Some(address) = json.get("address").and_then(|v| v.as_object()) else {
		return Err(eyre::eyre!("Reverse geocoding response is missing address object."));
	};
	let placemark = Placemark {
		name: json
			.get("name")
			.and_then(|v| v.as_str())
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.map(str::to_string),
		thoroughfare: first_of(address, &STREET_KEYS),
		sub_thoroughfare: field(address, "house_number"),
		locality: first_of(address, &LOCALITY_KEYS),
		sub_locality: first_of(address, &SUB_LOCALITY_KEYS),
		administrative_area: field(address, "state"),
		postal_code: field(address, "postcode"),
		country: field(address, "country"),
		iso_country_code: field(address, "country_code").map(|code| code.to_ascii_uppercase()),
	};

	Ok((!placemark.is_empty()).then_some(placemark))
}

fn field(address: &Map<String, Value>, key: &str) -> Option<String> {
	address
		.get(key)
		.and_then(|v| v.as_str())
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
}

fn first_of(address: &Map<String, Value>, keys: &[&str]) -> Option<String> {
	keys.iter().find_map(|key| field(address, key))
}

fn parse_coordinate(item: &Value) -> Result<Coordinate> {
	// Nominatim encodes coordinates as strings; other compatible servers use numbers.
	let number = |key: &str| -> Result<f64> {
		let value = item.get(key).ok_or_else(|| eyre::eyre!("Search item missing {key}."))?;

		match value {
			Value::String(raw) =>
				raw.trim().parse().map_err(|_| eyre::eyre!("Search item {key} is not numeric.")),
			Value::Number(number) =>
				number.as_f64().ok_or_else(|| eyre::eyre!("Search item {key} is not numeric.")),
			_ => Err(eyre::eyre!("Search item {key} is not numeric.")),
		}
	};
	let coordinate = Coordinate::new(number("lat")?, number("lon")?);

	if !coordinate.is_valid() {
		return Err(eyre::eyre!("Search item coordinate is out of range."));
	}

	Ok(coordinate)
}
