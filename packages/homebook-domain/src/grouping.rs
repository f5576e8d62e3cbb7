use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashMap},
};

use serde::Serialize;

use crate::address::{AddressRecord, Country};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryGroup {
	pub country: Country,
	pub addresses: Vec<AddressRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
	Code(String),
	Name(String),
}

/// Groups records by country, ordered by country name. Within a group the current address comes
/// first, then the most recent stays.
///
/// Records carrying an ISO code group by that code, so "Deutschland" and "Germany" share a group
/// when both carry `DE`. A record without a code joins the coded group whose country has the same
/// name, and otherwise groups by name.
pub fn group_by_country(records: Vec<AddressRecord>) -> Vec<CountryGroup> {
	let mut codes_by_name: HashMap<String, String> = HashMap::new();

	for country in records.iter().map(|record| &record.country).filter(|c| !c.code.is_empty()) {
		codes_by_name.entry(country.name_key()).or_insert_with(|| country.code.clone());
	}

	let mut groups: BTreeMap<GroupKey, CountryGroup> = BTreeMap::new();

	for record in records {
		let key = if record.country.code.is_empty() {
			match codes_by_name.get(&record.country.name_key()) {
				Some(code) => GroupKey::Code(code.clone()),
				None => GroupKey::Name(record.country.name_key()),
			}
		} else {
			GroupKey::Code(record.country.code.clone())
		};
		let group = groups
			.entry(key)
			.or_insert_with(|| CountryGroup { country: record.country.clone(), addresses: Vec::new() });

		if group.country.code.is_empty() && !record.country.code.is_empty() {
			group.country = record.country.clone();
		}

		group.addresses.push(record);
	}

	let mut groups = groups.into_values().collect::<Vec<_>>();

	for group in &mut groups {
		group.addresses.sort_by(compare_within_group);
	}

	groups.sort_by(|a, b| {
		a.country
			.name
			.to_lowercase()
			.cmp(&b.country.name.to_lowercase())
			.then_with(|| a.country.code.cmp(&b.country.code))
	});

	groups
}

fn compare_within_group(a: &AddressRecord, b: &AddressRecord) -> Ordering {
	b.is_current
		.cmp(&a.is_current)
		.then_with(|| match (a.start_date, b.start_date) {
			(Some(a), Some(b)) => b.cmp(&a),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		})
		.then_with(|| a.line1.cmp(&b.line1))
}
