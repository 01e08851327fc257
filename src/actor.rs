//! The player-controlled hero and the stationary NPCs it can talk to.

use log::{debug, warn};

use crate::{
	grid::{Grid, GridPos, WorldPos},
	proximity::{ProximityTrigger, TriggerEvent},
	timer::Timers,
	tween::{Easing, Tween},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveState {
	Idle,
	Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStart {
	/// Empty path or already moving.
	Ignored,
	Started,
	/// The path ended where the hero already stood.
	Arrived(GridPos),
}

// ---------------------------------------------------------------------------
// Hero
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Hero {
	grid_pos: GridPos,
	world_pos: WorldPos,
	state: MoveState,
	waypoints: Vec<WorldPos>,
	index: usize,
	tween: Option<Tween>,
	step_duration_ms: f64,
	easing: Easing,
}

impl Hero {
	pub fn new(grid: &Grid, at: GridPos, step_duration_ms: f64, easing: Easing) -> Self {
		Self {
			grid_pos: at,
			world_pos: grid.to_world(at),
			state: MoveState::Idle,
			waypoints: Vec::new(),
			index: 0,
			tween: None,
			step_duration_ms,
			easing,
		}
	}

	pub fn grid_pos(&self) -> GridPos {
		self.grid_pos
	}

	pub fn world_pos(&self) -> WorldPos {
		self.world_pos
	}

	pub fn state(&self) -> MoveState {
		self.state
	}

	pub fn is_moving(&self) -> bool {
		self.state == MoveState::Moving
	}

	pub fn can_start_new_movement(&self) -> bool {
		self.state == MoveState::Idle
	}

	pub fn path_index(&self) -> usize {
		self.index
	}

	pub fn waypoints(&self) -> &[WorldPos] {
		&self.waypoints
	}

	/// Cell the hero is currently over, which differs from `grid_pos` while a
	/// path is being walked.
	pub fn current_cell(&self, grid: &Grid) -> GridPos {
		grid.to_grid(self.world_pos)
	}

	/// Starts walking `path`. The hero's own cell is prepended unless the
	/// path already begins there.
	pub fn move_to(&mut self, grid: &Grid, path: &[GridPos]) -> MoveStart {
		if path.is_empty() {
			return MoveStart::Ignored;
		}
		if !self.can_start_new_movement() {
			warn!("hero is already moving, path ignored");
			return MoveStart::Ignored;
		}

		let mut waypoints = Vec::with_capacity(path.len() + 1);
		if path[0] != self.grid_pos {
			waypoints.push(self.world_pos);
		}
		waypoints.extend(path.iter().map(|&p| grid.to_world(p)));

		self.waypoints = waypoints;
		self.index = 0;
		self.state = MoveState::Moving;
		debug!("hero walking {} waypoints from {}", self.waypoints.len(), self.grid_pos);

		if self.start_segment() {
			MoveStart::Started
		} else {
			self.complete_movement(grid);
			MoveStart::Arrived(self.grid_pos)
		}
	}

	/// Advances the current segment by `dt_ms`, chaining into the following
	/// segments with any time left over. Returns the cell the hero stopped on
	/// when the path was completed during this call.
	pub fn update(&mut self, grid: &Grid, dt_ms: f64) -> Option<GridPos> {
		if self.state != MoveState::Moving {
			return None;
		}

		let mut budget = dt_ms;
		loop {
			let Some(tween) = self.tween.as_mut() else {
				self.complete_movement(grid);
				return Some(self.grid_pos);
			};
			let leftover = tween.advance(budget);
			self.world_pos = tween.position();
			let Some(leftover) = leftover else {
				return None;
			};

			self.index += 1;
			budget = leftover;
			if !self.start_segment() {
				self.complete_movement(grid);
				return Some(self.grid_pos);
			}
		}
	}

	fn start_segment(&mut self) -> bool {
		match self.waypoints.get(self.index + 1) {
			Some(&next) => {
				self.tween = Some(Tween::new(self.world_pos, next, self.step_duration_ms, self.easing));
				true
			},
			None => {
				self.tween = None;
				false
			},
		}
	}

	fn complete_movement(&mut self, grid: &Grid) {
		if let Some(&last) = self.waypoints.last() {
			self.world_pos = last;
		}
		self.state = MoveState::Idle;
		self.grid_pos = grid.to_grid(self.world_pos);
		self.waypoints.clear();
		self.tween = None;
		debug!("hero stopped at {}", self.grid_pos);
	}
}

// ---------------------------------------------------------------------------
// NPC
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Npc {
	name: String,
	grid_pos: GridPos,
	dialogue: Option<String>,
	can_interact: bool,
	trigger: ProximityTrigger,
}

impl Npc {
	pub fn new(name: impl Into<String>, grid_pos: GridPos, dialogue: Option<String>, trigger_delay_ms: f64) -> Self {
		Self {
			name: name.into(),
			grid_pos,
			dialogue,
			can_interact: false,
			trigger: ProximityTrigger::new(trigger_delay_ms),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn grid_pos(&self) -> GridPos {
		self.grid_pos
	}

	pub fn dialogue(&self) -> Option<&str> {
		self.dialogue.as_deref()
	}

	pub fn can_interact(&self) -> bool {
		self.can_interact
	}

	/// Presentation hint: full opacity while the hero can talk to us.
	pub fn alpha(&self) -> f32 {
		if self.can_interact { 1.0 } else { 0.7 }
	}

	pub fn trigger(&self) -> &ProximityTrigger {
		&self.trigger
	}

	/// Per-frame check against the hero's cell.
	pub fn update<A>(&mut self, hero_cell: GridPos, timers: &mut Timers<A>, action: impl FnOnce() -> A) -> Option<TriggerEvent> {
		self.can_interact = self.grid_pos.is_adjacent(hero_cell);
		self.trigger.update(self.can_interact, timers, action)
	}

	/// The armed trigger fired. Returns the dialogue entry node when the hero
	/// is still close enough to talk.
	pub fn interact(&mut self) -> Option<&str> {
		self.trigger.fire();
		if !self.can_interact {
			return None;
		}
		self.dialogue.as_deref()
	}
}
