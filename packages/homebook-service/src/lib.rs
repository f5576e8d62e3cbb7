pub mod add_address;
pub mod children;
pub mod current;
pub mod debounce;
pub mod delete;
pub mod list;
pub mod search;
pub mod store;
pub mod update;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

pub use add_address::AddAddressRequest;
pub use debounce::SearchDebouncer;
pub use delete::DeleteResponse;
pub use error::{Error, Result};
use homebook_config::{Config, GeocodingProviderConfig};
use homebook_domain::{
	AddressRecord, AddressRecordAssembler, Candidate, ChangeSet, ChildCounts, Coordinate, Placemark,
};
use homebook_providers::geocoding;
pub use search::{
	AddressSearchEngine, LiveSearch, SearchOutcome, SearchPhase, SearchSettings, SearchSnapshot,
};
pub use store::{MemoryAddressStore, PgAddressStore};
pub use update::UpdateAddressRequest;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const EVENT_CAPACITY: usize = 64;

pub trait GeocodingGateway
where
	Self: Send + Sync,
{
	fn text_search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>>;

	fn reverse_geocode<'a>(
		&'a self,
		coordinate: Coordinate,
	) -> BoxFuture<'a, color_eyre::Result<Option<Placemark>>>;
}

/// Persistence boundary. `save` commits a whole change set or nothing.
pub trait AddressStore
where
	Self: Send + Sync,
{
	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, Result<Vec<AddressRecord>>>;

	fn fetch<'a>(&'a self, address_id: Uuid) -> BoxFuture<'a, Result<Option<AddressRecord>>>;

	fn child_counts<'a>(&'a self, address_id: Uuid) -> BoxFuture<'a, Result<ChildCounts>>;

	fn save<'a>(&'a self, changes: &'a ChangeSet) -> BoxFuture<'a, Result<()>>;
}

/// Change notifications for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressEvent {
	Added(AddressRecord),
	Updated(AddressRecord),
	Deleted(AddressRecord),
	/// The record whose current flag changed; `is_current` tells which way.
	CurrentChanged(AddressRecord),
}

pub struct HttpGeocodingGateway {
	cfg: GeocodingProviderConfig,
}
impl HttpGeocodingGateway {
	pub fn new(cfg: GeocodingProviderConfig) -> Self {
		Self { cfg }
	}
}
impl GeocodingGateway for HttpGeocodingGateway {
	fn text_search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>> {
		Box::pin(geocoding::text_search(&self.cfg, query, limit))
	}

	fn reverse_geocode<'a>(
		&'a self,
		coordinate: Coordinate,
	) -> BoxFuture<'a, color_eyre::Result<Option<Placemark>>> {
		Box::pin(geocoding::reverse_geocode(&self.cfg, coordinate))
	}
}

pub struct AddressBook {
	store: Arc<dyn AddressStore>,
	assembler: AddressRecordAssembler,
	events: broadcast::Sender<AddressEvent>,
	// Serialises read-modify-commit cycles so two writers never stage against the same snapshot.
	write_lock: Mutex<()>,
}
impl AddressBook {
	pub fn new(cfg: &Config, store: Arc<dyn AddressStore>) -> Self {
		Self::with_assembler(store, AddressRecordAssembler::from_config(&cfg.addresses))
	}

	pub fn with_assembler(store: Arc<dyn AddressStore>, assembler: AddressRecordAssembler) -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);

		Self { store, assembler, events, write_lock: Mutex::new(()) }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<AddressEvent> {
		self.events.subscribe()
	}

	pub fn assembler(&self) -> &AddressRecordAssembler {
		&self.assembler
	}

	pub(crate) fn emit(&self, event: AddressEvent) {
		// No subscribers is a normal state for headless callers.
		let _ = self.events.send(event);
	}

	pub(crate) async fn fetch_existing(&self, address_id: Uuid) -> Result<AddressRecord> {
		self.store.fetch(address_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Address {address_id} does not exist."),
		})
	}
}
