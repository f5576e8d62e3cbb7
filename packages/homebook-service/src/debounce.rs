use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

use tokio::{sync::mpsc, task::JoinHandle, time};

#[derive(Default)]
struct Pending {
	generation: u64,
	timer: Option<JoinHandle<()>>,
}

/// Coalesces rapid query edits into one delayed emission.
///
/// Every `submit` restarts the delay; only the latest query is emitted once the delay elapses
/// without another edit. Emissions arrive on the receiver returned by [`SearchDebouncer::new`].
/// Must be used from within a tokio runtime.
pub struct SearchDebouncer {
	delay: Duration,
	pending: Arc<Mutex<Pending>>,
	tx: mpsc::UnboundedSender<String>,
}
impl SearchDebouncer {
	pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
		let (tx, rx) = mpsc::unbounded_channel();

		(Self { delay, pending: Arc::new(Mutex::new(Pending::default())), tx }, rx)
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Records `query` as the latest input and restarts the timer. Blank queries pass through too.
	pub fn submit(&self, query: impl Into<String>) {
		let query = query.into();
		let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());

		pending.generation += 1;

		if let Some(timer) = pending.timer.take() {
			timer.abort();
		}

		let generation = pending.generation;
		let shared = Arc::clone(&self.pending);
		let tx = self.tx.clone();
		let delay = self.delay;

		pending.timer = Some(tokio::spawn(async move {
			time::sleep(delay).await;

			let mut pending = shared.lock().unwrap_or_else(|err| err.into_inner());

			// The generation check and the send happen under the same lock as `cancel_all`.
			if pending.generation != generation {
				return;
			}

			pending.timer = None;

			if tx.send(query).is_err() {
				tracing::debug!("Debounced query dropped; receiver is gone.");
			}
		}));
	}

	/// Drops any pending query. Nothing submitted before this call is emitted afterwards.
	pub fn cancel_all(&self) {
		let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());

		pending.generation += 1;

		if let Some(timer) = pending.timer.take() {
			timer.abort();
		}
	}
}
impl Drop for SearchDebouncer {
	fn drop(&mut self) {
		self.cancel_all();
	}
}
