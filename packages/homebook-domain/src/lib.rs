pub mod address;
pub mod assembler;
pub mod changes;
pub mod grouping;
pub mod location;

pub use address::{
	AddressChild, AddressRecord, BuildingType, ChecklistItem, ChildCounts, Country, Document,
	Note, Owner, Photo,
};
pub use assembler::{AddressFields, AddressRecordAssembler, RequiredField, ValidationError};
pub use changes::{Change, ChangeSet};
pub use grouping::{CountryGroup, group_by_country};
pub use location::{Candidate, Coordinate, Location, Placemark};
