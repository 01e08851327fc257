//! One-shot delayed actions driven by the host's frame clock.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "timer#{}", self.0)
	}
}

#[derive(Debug)]
struct Entry<A> {
	handle: TimerHandle,
	due_ms: f64,
	action: A,
}

/// Pending actions keyed by handle. A cancelled handle never fires.
#[derive(Debug)]
pub struct Timers<A> {
	now_ms: f64,
	next_id: u64,
	entries: Vec<Entry<A>>,
}

impl<A> Default for Timers<A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A> Timers<A> {
	pub fn new() -> Self {
		Self {
			now_ms: 0.0,
			next_id: 0,
			entries: Vec::new(),
		}
	}

	pub fn now(&self) -> f64 {
		self.now_ms
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn schedule(&mut self, delay_ms: f64, action: A) -> TimerHandle {
		self.next_id += 1;
		let handle = TimerHandle(self.next_id);
		self.entries.push(Entry {
			handle,
			due_ms: self.now_ms + delay_ms.max(0.0),
			action,
		});
		handle
	}

	/// Returns false when the handle already fired or was cancelled.
	pub fn cancel(&mut self, handle: TimerHandle) -> bool {
		let before = self.entries.len();
		self.entries.retain(|e| e.handle != handle);
		self.entries.len() != before
	}

	pub fn is_pending(&self, handle: TimerHandle) -> bool {
		self.entries.iter().any(|e| e.handle == handle)
	}

	/// Moves the clock forward and hands back every action that came due,
	/// earliest first.
	pub fn advance(&mut self, dt_ms: f64) -> Vec<A> {
		self.now_ms += dt_ms.max(0.0);
		let now = self.now_ms;

		let (mut due, pending): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|e| e.due_ms <= now);
		self.entries = pending;

		due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.handle.cmp(&b.handle)));
		due.into_iter().map(|e| e.action).collect()
	}
}
