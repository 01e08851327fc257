//! Incremental A* over the scene grid.
//!
//! `find_path` only queues a search and hands back a [`PathRequest`]; the
//! work happens in `calculate`, which the scene calls once per tick with a
//! fixed expansion budget. A search that does not fit in one budget carries
//! over to the next tick, so completion order is deterministic under the
//! single-threaded frame loop.

use std::{
	cmp::Reverse,
	collections::{BinaryHeap, VecDeque},
	fmt,
	future::Future,
	pin::Pin,
	task::{Context, Poll},
};

use futures::{FutureExt, channel::oneshot};
use log::debug;

use crate::{
	config::SceneConfig,
	grid::{Grid, GridPos},
};

/// Cells from start (exclusive) to goal (inclusive).
pub type Path = Vec<GridPos>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "path#{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
	Found(Path),
	NoPath,
}

/// Single-shot handle for a queued search. Dropping it abandons the search.
#[derive(Debug)]
pub struct PathRequest {
	id: RequestId,
	rx: oneshot::Receiver<PathOutcome>,
}

impl PathRequest {
	pub fn id(&self) -> RequestId {
		self.id
	}

	/// Non-blocking check for the outcome. A search whose pathfinder went
	/// away reports `NoPath`.
	pub fn try_take(&mut self) -> Option<PathOutcome> {
		match self.rx.try_recv() {
			Ok(outcome) => outcome,
			Err(oneshot::Canceled) => Some(PathOutcome::NoPath),
		}
	}
}

impl Future for PathRequest {
	type Output = PathOutcome;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		self.get_mut().rx.poll_unpin(cx).map(|r| r.unwrap_or(PathOutcome::NoPath))
	}
}

// ---------------------------------------------------------------------------
// Search state for one request
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Search {
	id: RequestId,
	goal: usize,
	goal_pos: GridPos,
	tx: oneshot::Sender<PathOutcome>,
	open: BinaryHeap<Reverse<(u32, u32, u64, usize)>>, // (f, h, insertion order, cell)
	g: Vec<u32>,
	came_from: Vec<Option<usize>>,
	closed: Vec<bool>,
	pushed: u64,
}

impl Search {
	fn new(id: RequestId, grid: &Grid, start: usize, goal: usize, tx: oneshot::Sender<PathOutcome>) -> Self {
		let mut g = vec![u32::MAX; grid.len()];
		g[start] = 0;
		let mut open = BinaryHeap::new();
		open.push(Reverse((0, 0, 0, start)));
		Self {
			id,
			goal,
			goal_pos: grid.pos_of(goal),
			tx,
			open,
			g,
			came_from: vec![None; grid.len()],
			closed: vec![false; grid.len()],
			pushed: 1,
		}
	}

	/// One node expansion. `Some` once the search is decided.
	fn expand(&mut self, grid: &Grid, diagonals: bool, corner_cutting: bool) -> Option<PathOutcome> {
		let Some(Reverse((_, _, _, current))) = self.open.pop() else {
			return Some(PathOutcome::NoPath);
		};
		if self.closed[current] {
			return None;
		}
		if current == self.goal {
			return Some(PathOutcome::Found(self.reconstruct(grid)));
		}
		self.closed[current] = true;

		for (next, cost) in grid.neighbors(grid.pos_of(current), diagonals, corner_cutting) {
			let Some(ni) = grid.index(next) else { continue };
			if self.closed[ni] {
				continue;
			}
			let tentative = self.g[current].saturating_add(cost);
			if tentative < self.g[ni] {
				self.g[ni] = tentative;
				self.came_from[ni] = Some(current);
				let h = heuristic(next, self.goal_pos, diagonals);
				self.open.push(Reverse((tentative.saturating_add(h), h, self.pushed, ni)));
				self.pushed += 1;
			}
		}
		None
	}

	fn reconstruct(&self, grid: &Grid) -> Path {
		let mut path = Vec::new();
		let mut cursor = self.goal;
		while let Some(prev) = self.came_from[cursor] {
			path.push(grid.pos_of(cursor));
			cursor = prev;
		}
		path.reverse();
		path
	}
}

fn heuristic(from: GridPos, to: GridPos, diagonals: bool) -> u32 {
	let dx = from.x.abs_diff(to.x);
	let dy = from.y.abs_diff(to.y);
	if diagonals {
		10 * dx.max(dy) + 4 * dx.min(dy)
	} else {
		10 * (dx + dy)
	}
}

// ---------------------------------------------------------------------------
// Pathfinder
// ---------------------------------------------------------------------------

pub struct Pathfinder {
	grid: Grid,
	allow_diagonals: bool,
	corner_cutting: bool,
	iterations_per_calculation: usize,
	next_id: u64,
	queue: VecDeque<Search>,
}

impl Pathfinder {
	pub fn new(grid: Grid, config: &SceneConfig) -> Self {
		Self {
			grid,
			allow_diagonals: config.allow_diagonals,
			corner_cutting: config.corner_cutting,
			iterations_per_calculation: config.iterations_per_calculation.max(1),
			next_id: 0,
			queue: VecDeque::new(),
		}
	}

	/// Marks a stationary occupant's cell as impassable for searches.
	pub fn add_obstacle(&mut self, pos: GridPos) {
		self.grid.set_blocked(pos, true);
	}

	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	pub fn find_path(&mut self, start: GridPos, goal: GridPos) -> PathRequest {
		self.next_id += 1;
		let id = RequestId(self.next_id);
		let (tx, rx) = oneshot::channel();

		match (self.grid.index(start), self.grid.index(goal)) {
			(Some(_), Some(_)) if start == goal => {
				let _ = tx.send(PathOutcome::Found(Vec::new()));
			},
			(Some(s), Some(g)) if self.grid.is_walkable(goal) => {
				debug!("{id}: queued search {start} -> {goal}");
				self.queue.push_back(Search::new(id, &self.grid, s, g, tx));
			},
			_ => {
				debug!("{id}: goal {goal} not reachable from {start}");
				let _ = tx.send(PathOutcome::NoPath);
			},
		}

		PathRequest { id, rx }
	}

	/// Spends at most the configured number of expansions on queued searches,
	/// oldest first. Returns how many searches finished.
	pub fn calculate(&mut self) -> usize {
		let mut budget = self.iterations_per_calculation;
		let mut finished = 0;

		while budget > 0 {
			let Some(search) = self.queue.front_mut() else { break };
			if search.tx.is_canceled() {
				debug!("{}: abandoned", search.id);
				self.queue.pop_front();
				continue;
			}

			budget -= 1;
			if let Some(outcome) = search.expand(&self.grid, self.allow_diagonals, self.corner_cutting) {
				if let Some(done) = self.queue.pop_front() {
					debug!("{}: finished after {} pushes", done.id, done.pushed);
					let _ = done.tx.send(outcome);
					finished += 1;
				}
			}
		}

		finished
	}
}
