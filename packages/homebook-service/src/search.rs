use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use futures::future;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle, time};

use crate::{Error, GeocodingGateway, Result, SearchDebouncer};
use homebook_config::Config;
use homebook_domain::{Candidate, Location};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
	#[default]
	Idle,
	Searching,
	Completed,
	Cancelled,
	Failed,
}

/// The published view of the authoritative search generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchSnapshot {
	pub generation: u64,
	pub query: String,
	pub phase: SearchPhase,
	pub locations: Vec<Location>,
	pub is_searching: bool,
	/// Last provider failure for this generation, if any.
	pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
	Completed(Vec<Location>),
	/// A newer generation (or `cancel`) superseded this one. Nothing was published.
	Cancelled,
	Failed {
		message: String,
	},
}
impl SearchOutcome {
	pub fn locations(&self) -> &[Location] {
		match self {
			Self::Completed(locations) => locations,
			Self::Cancelled | Self::Failed { .. } => &[],
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
	pub max_candidates: u32,
	pub debounce: Duration,
	/// Applied to each gateway call separately.
	pub timeout: Duration,
}
impl SearchSettings {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			max_candidates: cfg.search.max_candidates,
			debounce: Duration::from_millis(cfg.search.debounce_ms),
			timeout: Duration::from_millis(cfg.providers.geocoding.timeout_ms),
		}
	}
}
impl Default for SearchSettings {
	fn default() -> Self {
		Self {
			max_candidates: 10,
			debounce: Duration::from_millis(500),
			timeout: Duration::from_secs(10),
		}
	}
}

pub struct AddressSearchEngine {
	gateway: Arc<dyn GeocodingGateway>,
	settings: SearchSettings,
	state: watch::Sender<SearchSnapshot>,
}
impl AddressSearchEngine {
	pub fn new(gateway: Arc<dyn GeocodingGateway>, settings: SearchSettings) -> Self {
		let (state, _) = watch::channel(SearchSnapshot::default());

		Self { gateway, settings, state }
	}

	pub fn settings(&self) -> SearchSettings {
		self.settings
	}

	pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
		self.state.subscribe()
	}

	pub fn snapshot(&self) -> SearchSnapshot {
		self.state.borrow().clone()
	}

	/// Runs one search generation to completion and returns its outcome.
	///
	/// Provider failures are published and returned as [`SearchOutcome::Failed`], never as an
	/// error. Calling `search` again, or `cancel`, supersedes any generation still in flight.
	pub async fn search(&self, query: &str) -> SearchOutcome {
		let generation = self.begin(query);

		self.run(generation, query).await
	}

	/// Supersedes the in-flight generation without starting a new one.
	pub fn cancel(&self) {
		self.state.send_modify(|snapshot| {
			snapshot.generation += 1;

			if snapshot.is_searching {
				snapshot.phase = SearchPhase::Cancelled;
				snapshot.is_searching = false;
			}
		});
	}

	/// Opens a new generation and publishes its initial state. Returns the generation id.
	pub(crate) fn begin(&self, query: &str) -> u64 {
		let mut generation = 0;
		let searching = !query.trim().is_empty();

		self.state.send_modify(|snapshot| {
			snapshot.generation += 1;
			snapshot.query = query.to_string();
			snapshot.locations.clear();
			snapshot.error = None;
			snapshot.is_searching = searching;
			snapshot.phase = if searching { SearchPhase::Searching } else { SearchPhase::Completed };
			generation = snapshot.generation;
		});

		tracing::debug!(generation, query, "Search generation started.");

		generation
	}

	pub(crate) async fn run(&self, generation: u64, query: &str) -> SearchOutcome {
		let query = query.trim();

		if query.is_empty() {
			return self.finish(generation, Ok(Vec::new()));
		}

		let mut state = self.state.subscribe();
		let result = tokio::select! {
			biased;
			_ = superseded(&mut state, generation) => {
				tracing::debug!(generation, "Search generation superseded.");

				return SearchOutcome::Cancelled;
			},
			result = self.resolve(query) => result,
		};

		self.finish(generation, result)
	}

	async fn resolve(&self, query: &str) -> Result<Vec<Location>> {
		let SearchSettings { max_candidates, timeout, .. } = self.settings;
		let candidates = time::timeout(timeout, self.gateway.text_search(query, max_candidates))
			.await
			.map_err(|_| timed_out("Text search", timeout))??;
		let candidates =
			candidates.into_iter().take(max_candidates as usize).collect::<Vec<Candidate>>();
		let lookups = candidates.iter().map(|candidate| {
			let coordinate = candidate.coordinate;

			async move {
				time::timeout(timeout, self.gateway.reverse_geocode(coordinate))
					.await
					.map_err(|_| timed_out("Reverse geocode", timeout))?
					.map_err(Error::from)
			}
		});
		// `try_join_all` yields results in input order regardless of completion order.
		let placemarks = future::try_join_all(lookups).await?;

		Ok(candidates
			.into_iter()
			.zip(placemarks)
			.map(|(candidate, placemark)| Location::resolve(candidate, placemark))
			.collect())
	}

	fn finish(&self, generation: u64, result: Result<Vec<Location>>) -> SearchOutcome {
		let mut outcome = SearchOutcome::Cancelled;

		self.state.send_if_modified(|snapshot| {
			if snapshot.generation != generation {
				return false;
			}

			snapshot.is_searching = false;

			match result {
				Ok(locations) => {
					snapshot.phase = SearchPhase::Completed;
					snapshot.locations = locations.clone();
					snapshot.error = None;
					outcome = SearchOutcome::Completed(locations);
				},
				Err(err) => {
					let message = err.to_string();

					snapshot.phase = SearchPhase::Failed;
					snapshot.locations.clear();
					snapshot.error = Some(message.clone());
					outcome = SearchOutcome::Failed { message };
				},
			}

			true
		});

		match &outcome {
			SearchOutcome::Completed(locations) => {
				tracing::info!(generation, results = locations.len(), "Search generation completed.");
			},
			SearchOutcome::Failed { message } => {
				tracing::warn!(generation, error = %message, "Search generation failed.");
			},
			SearchOutcome::Cancelled => {
				tracing::debug!(generation, "Search result discarded for stale generation.");
			},
		}

		outcome
	}
}

/// Debounced search wiring: typed input goes in, snapshots come out.
pub struct LiveSearch {
	engine: Arc<AddressSearchEngine>,
	debouncer: SearchDebouncer,
	driver: JoinHandle<()>,
	closed: AtomicBool,
}
impl LiveSearch {
	/// Must be called from within a tokio runtime.
	pub fn spawn(engine: Arc<AddressSearchEngine>) -> Self {
		let (debouncer, mut queries) = SearchDebouncer::new(engine.settings().debounce);
		let driver_engine = Arc::clone(&engine);
		let driver = tokio::spawn(async move {
			while let Some(query) = queries.recv().await {
				// Open the generation before spawning so the previous run is superseded in order.
				let generation = driver_engine.begin(&query);
				let engine = Arc::clone(&driver_engine);

				tokio::spawn(async move {
					engine.run(generation, &query).await;
				});
			}
		});

		Self { engine, debouncer, driver, closed: AtomicBool::new(false) }
	}

	pub fn input(&self, query: impl Into<String>) {
		self.debouncer.submit(query);
	}

	pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
		self.engine.subscribe()
	}

	pub fn snapshot(&self) -> SearchSnapshot {
		self.engine.snapshot()
	}

	/// Stops the debouncer, the driver, and any in-flight generation.
	pub fn shutdown(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}

		self.debouncer.cancel_all();
		self.driver.abort();
		self.engine.cancel();
	}
}
impl Drop for LiveSearch {
	fn drop(&mut self) {
		self.shutdown();
	}
}

async fn superseded(state: &mut watch::Receiver<SearchSnapshot>, generation: u64) {
	if state.wait_for(|snapshot| snapshot.generation != generation).await.is_err() {
		future::pending::<()>().await;
	}
}

fn timed_out(operation: &str, timeout: Duration) -> Error {
	Error::SearchProvider {
		message: format!("{operation} timed out after {} ms.", timeout.as_millis()),
	}
}
