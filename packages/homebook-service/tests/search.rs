use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicU32, AtomicUsize, Ordering},
	},
	time::Duration,
};

use color_eyre::eyre;
use tokio::time;

use homebook_domain::{Candidate, Coordinate, Placemark};
use homebook_service::{
	AddressSearchEngine, BoxFuture, GeocodingGateway, LiveSearch, SearchOutcome, SearchPhase,
	SearchSettings,
};

#[derive(Default)]
struct ScriptedGateway {
	results: HashMap<String, Vec<Candidate>>,
	search_delays: HashMap<String, Duration>,
	text_failure: Option<String>,
	/// Latitudes whose reverse lookup finds nothing.
	no_placemark: Vec<f64>,
	text_calls: AtomicUsize,
	reverse_calls: AtomicUsize,
	last_limit: AtomicU32,
}
impl ScriptedGateway {
	fn with_results(mut self, query: &str, count: usize) -> Self {
		let candidates = (1..=count)
			.map(|n| Candidate {
				title: format!("{query} {n}"),
				coordinate: Coordinate::new(n as f64, 10.0),
			})
			.collect();

		self.results.insert(query.to_string(), candidates);

		self
	}

	fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
		self.search_delays.insert(query.to_string(), delay);

		self
	}
}
impl GeocodingGateway for ScriptedGateway {
	fn text_search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>> {
		Box::pin(async move {
			self.text_calls.fetch_add(1, Ordering::SeqCst);
			self.last_limit.store(limit, Ordering::SeqCst);

			if let Some(delay) = self.search_delays.get(query) {
				time::sleep(*delay).await;
			}
			if let Some(message) = &self.text_failure {
				return Err(eyre::eyre!("{message}"));
			}

			Ok(self.results.get(query).cloned().unwrap_or_default())
		})
	}

	fn reverse_geocode<'a>(
		&'a self,
		coordinate: Coordinate,
	) -> BoxFuture<'a, color_eyre::Result<Option<Placemark>>> {
		Box::pin(async move {
			self.reverse_calls.fetch_add(1, Ordering::SeqCst);

			// Earlier candidates answer later.
			let delay = 100.0_f64 * (20.0 - coordinate.latitude).max(0.0);

			time::sleep(Duration::from_millis(delay as u64)).await;

			if self.no_placemark.contains(&coordinate.latitude) {
				return Ok(None);
			}

			Ok(Some(Placemark {
				locality: Some(format!("City {}", coordinate.latitude)),
				..Default::default()
			}))
		})
	}
}

fn settings() -> SearchSettings {
	SearchSettings {
		max_candidates: 10,
		debounce: Duration::from_millis(500),
		timeout: Duration::from_secs(5),
	}
}

fn engine(gateway: &Arc<ScriptedGateway>) -> Arc<AddressSearchEngine> {
	Arc::new(AddressSearchEngine::new(gateway.clone(), settings()))
}

#[tokio::test(start_paused = true)]
async fn blank_query_completes_without_contacting_the_gateway() {
	let gateway = Arc::new(ScriptedGateway::default());
	let engine = engine(&gateway);
	let outcome = engine.search("   ").await;

	assert_eq!(outcome, SearchOutcome::Completed(Vec::new()));
	assert_eq!(gateway.text_calls.load(Ordering::SeqCst), 0);

	let snapshot = engine.snapshot();

	assert_eq!(snapshot.phase, SearchPhase::Completed);
	assert!(!snapshot.is_searching);
	assert!(snapshot.locations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn locations_follow_provider_order_not_completion_order() {
	let gateway = Arc::new(ScriptedGateway::default().with_results("main street", 3));
	let engine = engine(&gateway);
	let outcome = engine.search("main street").await;
	let titles = outcome.locations().iter().map(|l| l.title.as_str()).collect::<Vec<_>>();

	assert_eq!(titles, vec!["main street 1", "main street 2", "main street 3"]);
	assert_eq!(outcome.locations()[0].placemark.locality.as_deref(), Some("City 1"));
	assert_eq!(outcome.locations()[2].placemark.locality.as_deref(), Some("City 3"));
	assert_eq!(gateway.reverse_calls.load(Ordering::SeqCst), 3);

	let snapshot = engine.snapshot();

	assert_eq!(snapshot.phase, SearchPhase::Completed);
	assert_eq!(snapshot.locations, outcome.locations());
	assert!(!snapshot.is_searching);
}

#[tokio::test(start_paused = true)]
async fn reverse_geocodes_run_concurrently() {
	let gateway = Arc::new(ScriptedGateway::default().with_results("harbour", 3));
	let engine = engine(&gateway);
	let started = time::Instant::now();

	engine.search("harbour").await;

	// Sequential lookups would take 1900 + 1800 + 1700 ms.
	assert!(started.elapsed() < Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn stale_generation_is_discarded() {
	let gateway = Arc::new(
		ScriptedGateway::default()
			.with_results("paris", 2)
			.with_results("berlin", 1)
			.with_search_delay("paris", Duration::from_millis(300))
			.with_search_delay("berlin", Duration::from_millis(10)),
	);
	let engine = engine(&gateway);
	let paris = {
		let engine = engine.clone();

		tokio::spawn(async move { engine.search("paris").await })
	};

	time::sleep(Duration::from_millis(1)).await;

	let berlin = engine.search("berlin").await;

	assert_eq!(berlin.locations().len(), 1);
	assert_eq!(paris.await.expect("Search task panicked."), SearchOutcome::Cancelled);

	time::sleep(Duration::from_secs(5)).await;

	let snapshot = engine.snapshot();

	assert_eq!(snapshot.query, "berlin");
	assert_eq!(snapshot.phase, SearchPhase::Completed);
	assert_eq!(snapshot.locations.len(), 1);
	assert_eq!(snapshot.locations[0].title, "berlin 1");
}

#[tokio::test(start_paused = true)]
async fn provider_failure_publishes_empty_failed_state() {
	let gateway = Arc::new(ScriptedGateway {
		text_failure: Some("HTTP 503".to_string()),
		..ScriptedGateway::default().with_results("rome", 2)
	});
	let engine = engine(&gateway);
	let outcome = engine.search("rome").await;

	assert!(matches!(outcome, SearchOutcome::Failed { ref message } if message.contains("HTTP 503")));

	let snapshot = engine.snapshot();

	assert_eq!(snapshot.phase, SearchPhase::Failed);
	assert!(snapshot.locations.is_empty());
	assert!(!snapshot.is_searching);
	assert!(snapshot.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out_as_failure() {
	let gateway = Arc::new(
		ScriptedGateway::default()
			.with_results("madrid", 1)
			.with_search_delay("madrid", Duration::from_secs(30)),
	);
	let engine = engine(&gateway);
	let outcome = engine.search("madrid").await;

	assert!(matches!(outcome, SearchOutcome::Failed { ref message } if message.contains("timed out")));
	assert_eq!(engine.snapshot().phase, SearchPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn candidate_without_placemark_is_kept() {
	let gateway = Arc::new(ScriptedGateway {
		no_placemark: vec![2.0],
		..ScriptedGateway::default().with_results("quay", 3)
	});
	let engine = engine(&gateway);
	let outcome = engine.search("quay").await;
	let locations = outcome.locations();

	assert_eq!(locations.len(), 3);
	assert_eq!(locations[1].title, "quay 2");
	assert!(locations[1].placemark.is_empty());
}

#[tokio::test(start_paused = true)]
async fn candidates_are_capped_at_max_candidates() {
	let gateway = Arc::new(ScriptedGateway::default().with_results("station", 15));
	let engine = engine(&gateway);
	let outcome = engine.search("station").await;

	assert_eq!(gateway.last_limit.load(Ordering::SeqCst), 10);
	assert_eq!(outcome.locations().len(), 10);
	assert_eq!(gateway.reverse_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test(start_paused = true)]
async fn cancel_supersedes_the_in_flight_search() {
	let gateway = Arc::new(
		ScriptedGateway::default()
			.with_results("vienna", 1)
			.with_search_delay("vienna", Duration::from_millis(300)),
	);
	let engine = engine(&gateway);
	let vienna = {
		let engine = engine.clone();

		tokio::spawn(async move { engine.search("vienna").await })
	};

	time::sleep(Duration::from_millis(1)).await;

	assert!(engine.snapshot().is_searching);

	engine.cancel();

	assert_eq!(vienna.await.expect("Search task panicked."), SearchOutcome::Cancelled);

	let snapshot = engine.snapshot();

	assert_eq!(snapshot.phase, SearchPhase::Cancelled);
	assert!(!snapshot.is_searching);
	assert!(snapshot.locations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn live_search_runs_one_lookup_for_a_burst_of_edits() {
	let gateway = Arc::new(ScriptedGateway::default().with_results("abc", 2));
	let live = LiveSearch::spawn(engine(&gateway));
	let mut snapshots = live.subscribe();

	live.input("a");
	time::sleep(Duration::from_millis(50)).await;
	live.input("ab");
	time::sleep(Duration::from_millis(100)).await;
	live.input("abc");

	time::timeout(
		Duration::from_secs(10),
		snapshots.wait_for(|s| s.query == "abc" && s.phase == SearchPhase::Completed),
	)
	.await
	.expect("Live search did not complete.")
	.expect("Snapshot channel closed.");

	assert_eq!(gateway.text_calls.load(Ordering::SeqCst), 1);
	assert_eq!(live.snapshot().locations.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn live_search_shutdown_stops_pending_input() {
	let gateway = Arc::new(ScriptedGateway::default().with_results("abc", 2));
	let live = LiveSearch::spawn(engine(&gateway));

	live.input("abc");
	time::sleep(Duration::from_millis(100)).await;
	live.shutdown();
	time::sleep(Duration::from_secs(5)).await;

	assert_eq!(gateway.text_calls.load(Ordering::SeqCst), 0);
	assert_eq!(live.snapshot().phase, SearchPhase::Idle);
}
