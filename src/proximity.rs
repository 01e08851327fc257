//! Edge-triggered "walk up to someone and they start talking" logic.
//!
//! Fed one adjacency sample per frame. Arriving next to the NPC arms a
//! delayed action; leaving cancels it and forgets that the NPC already
//! spoke during this visit.

use crate::timer::{TimerHandle, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
	Armed(TimerHandle),
	Cancelled(TimerHandle),
	Left,
}

#[derive(Debug, Clone)]
pub struct ProximityTrigger {
	delay_ms: f64,
	was_adjacent: bool,
	pending: Option<TimerHandle>,
	triggered: bool,
}

impl ProximityTrigger {
	pub fn new(delay_ms: f64) -> Self {
		Self {
			delay_ms,
			was_adjacent: false,
			pending: None,
			triggered: false,
		}
	}

	pub fn is_adjacent(&self) -> bool {
		self.was_adjacent
	}

	pub fn pending(&self) -> Option<TimerHandle> {
		self.pending
	}

	pub fn has_triggered(&self) -> bool {
		self.triggered
	}

	pub fn update<A>(&mut self, adjacent: bool, timers: &mut Timers<A>, action: impl FnOnce() -> A) -> Option<TriggerEvent> {
		let was_adjacent = std::mem::replace(&mut self.was_adjacent, adjacent);
		match (was_adjacent, adjacent) {
			(false, true) if self.pending.is_none() && !self.triggered => {
				let handle = timers.schedule(self.delay_ms, action());
				self.pending = Some(handle);
				Some(TriggerEvent::Armed(handle))
			},
			(true, false) => {
				self.triggered = false;
				match self.pending.take() {
					Some(handle) => {
						timers.cancel(handle);
						Some(TriggerEvent::Cancelled(handle))
					},
					None => Some(TriggerEvent::Left),
				}
			},
			_ => None,
		}
	}

	/// Called when the armed timer fires.
	pub fn fire(&mut self) {
		self.pending = None;
		self.triggered = true;
	}
}
