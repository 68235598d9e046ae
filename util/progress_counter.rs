use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/**
A `ProgressCounter` tracks the progress of work that may be spread across threads, such as the folds of one tuning iteration. Clones share the same underlying atomic, so a caller can hold one clone for display while the worker increments another.
*/
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	/// Create a new `ProgressCounter` that will count from 0 up to the specified `total`.
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
}

#[test]
fn test_progress_counter_clones_share_state() {
	let counter = ProgressCounter::new(10);
	let clone = counter.clone();
	clone.inc(3);
	counter.inc(2);
	assert_eq!(counter.get(), 5);
	assert_eq!(clone.total(), 10);
}
