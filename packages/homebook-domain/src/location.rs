use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
	pub latitude: f64,
	pub longitude: f64,
}
impl Coordinate {
	pub fn new(latitude: f64, longitude: f64) -> Self {
		Self { latitude, longitude }
	}

	pub fn is_valid(&self) -> bool {
		self.latitude.is_finite()
			&& self.longitude.is_finite()
			&& (-90.0..=90.0).contains(&self.latitude)
			&& (-180.0..=180.0).contains(&self.longitude)
	}
}

/// Structured reverse-geocoding result. Every component is optional because providers omit
/// whatever they cannot resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placemark {
	pub name: Option<String>,
	pub thoroughfare: Option<String>,
	pub sub_thoroughfare: Option<String>,
	pub locality: Option<String>,
	pub sub_locality: Option<String>,
	pub administrative_area: Option<String>,
	pub postal_code: Option<String>,
	pub country: Option<String>,
	pub iso_country_code: Option<String>,
}
impl Placemark {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	/// House number and street, falling back to the placemark name.
	pub fn street_line(&self) -> Option<String> {
		let street = non_blank(self.thoroughfare.as_deref());
		let number = non_blank(self.sub_thoroughfare.as_deref());

		match (number, street) {
			(Some(number), Some(street)) => Some(format!("{number} {street}")),
			(None, Some(street)) => Some(street.to_string()),
			_ => non_blank(self.name.as_deref()).map(str::to_string),
		}
	}

	pub fn title(&self) -> Option<String> {
		let head = non_blank(self.name.as_deref()).map(str::to_string).or_else(|| self.street_line());
		let locality = non_blank(self.locality.as_deref());

		match (head, locality) {
			(Some(head), Some(locality)) if head != locality => Some(format!("{head}, {locality}")),
			(Some(head), _) => Some(head),
			(None, Some(locality)) => Some(locality.to_string()),
			(None, None) => non_blank(self.country.as_deref()).map(str::to_string),
		}
	}
}

/// An unresolved search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub title: String,
	pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
	/// Generated per result and never persisted.
	pub id: Uuid,
	pub coordinate: Coordinate,
	pub title: String,
	pub placemark: Placemark,
}
impl Location {
	pub fn resolve(candidate: Candidate, placemark: Option<Placemark>) -> Self {
		let placemark = placemark.unwrap_or_default();
		let title = match non_blank(Some(candidate.title.as_str())) {
			Some(title) => title.to_string(),
			None => placemark.title().unwrap_or_else(|| {
				format!(
					"{:.5}, {:.5}",
					candidate.coordinate.latitude, candidate.coordinate.longitude
				)
			}),
		};

		Self { id: Uuid::new_v4(), coordinate: candidate.coordinate, title, placemark }
	}
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
