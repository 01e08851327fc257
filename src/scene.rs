//! The scene: one explicit world struct owning the grid, the pathfinder, the
//! hero, the NPCs, the dialogue engine and the timers. Hosts feed it pointer
//! events and frame ticks and render whatever it reports back.
//!
//! Per tick, in order:
//! 1. the pathfinder spends its budget and a finished path is consumed,
//! 2. the hero advances along its path,
//! 3. every NPC samples adjacency (arming or cancelling its trigger),
//! 4. the clock moves and due interactions start dialogue.

use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
	actor::{Hero, MoveStart, Npc},
	ast::{NodeDecl, NodeStatement, TopLevel},
	config::SceneConfig,
	dialogue::{Choice, DialogueEngine, DialogueGraph, DialogueNode, NodeView, Step},
	grid::{Grid, GridPos, WorldPos},
	pathfinder::{PathOutcome, PathRequest, Pathfinder, RequestId},
	proximity::TriggerEvent,
	timer::Timers,
};

pub type NpcId = usize;

/// Hero start used when a scene does not place the hero.
pub const DEFAULT_HERO_POS: GridPos = GridPos::new(2, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneAction {
	Interact(NpcId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
	#[error("a dialogue is in progress")]
	DialogueActive,
	#[error("the hero is already on the way")]
	Busy,
	#[error("target {0} is outside the grid")]
	OutOfBounds(GridPos),
	#[error("target {0} is blocked")]
	Blocked(GridPos),
	#[error("target {0} is occupied by {1}")]
	Occupied(GridPos, String),
	#[error("no path to {0}")]
	Unreachable(GridPos),
	#[error("path to {0} crosses blocked cell {1}")]
	UnsafePath(GridPos, GridPos),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
	PathFound { id: RequestId, steps: usize },
	MoveRejected(MoveError),
	Arrived(GridPos),
	TriggerArmed(NpcId),
	TriggerCancelled(NpcId),
	DialogueShown(NodeView),
	DialogueEnded,
}

#[derive(Debug)]
struct PendingMove {
	request: PathRequest,
	goal: GridPos,
}

/// Debug overlay contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
	pub grid_pos: GridPos,
	pub world_pos: WorldPos,
	pub moving: bool,
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Current Grid Position: {}", self.grid_pos)?;
		writeln!(f, "World Position: {}", self.world_pos)?;
		write!(f, "Moving: {}", if self.moving { "Yes" } else { "No" })
	}
}

pub struct Scene {
	config: SceneConfig,
	grid: Grid,
	pathfinder: Pathfinder,
	hero: Hero,
	npcs: Vec<Npc>,
	dialogue: DialogueEngine,
	timers: Timers<SceneAction>,
	pending: Option<PendingMove>,
}

impl Scene {
	pub fn new(config: SceneConfig, grid: Grid, hero_at: GridPos, npcs: Vec<Npc>, graph: DialogueGraph) -> Self {
		let mut pathfinder = Pathfinder::new(grid.clone(), &config);
		for npc in &npcs {
			pathfinder.add_obstacle(npc.grid_pos());
		}
		let hero = Hero::new(&grid, hero_at, config.step_duration_ms, config.step_easing);
		Self {
			config,
			grid,
			pathfinder,
			hero,
			npcs,
			dialogue: DialogueEngine::new(graph),
			timers: Timers::new(),
			pending: None,
		}
	}

	pub fn config(&self) -> &SceneConfig {
		&self.config
	}

	pub fn grid(&self) -> &Grid {
		&self.grid
	}

	pub fn hero(&self) -> &Hero {
		&self.hero
	}

	pub fn npcs(&self) -> &[Npc] {
		&self.npcs
	}

	pub fn npc_at(&self, pos: GridPos) -> Option<(NpcId, &Npc)> {
		self.npcs.iter().enumerate().find(|(_, npc)| npc.grid_pos() == pos)
	}

	pub fn dialogue(&self) -> &DialogueEngine {
		&self.dialogue
	}

	pub fn now_ms(&self) -> f64 {
		self.timers.now()
	}

	pub fn is_path_pending(&self) -> bool {
		self.pending.is_some()
	}

	pub fn status(&self) -> Status {
		Status {
			grid_pos: self.hero.grid_pos(),
			world_pos: self.hero.world_pos(),
			moving: self.hero.is_moving(),
		}
	}

	// --------------------------------------------------
	// Input
	// --------------------------------------------------

	pub fn pointer_down(&mut self, screen_x: f32, screen_y: f32) -> Result<RequestId, MoveError> {
		let target = self.grid.screen_to_grid(screen_x, screen_y);
		debug!("click at ({screen_x}, {screen_y}) -> grid {target}");
		self.walk_to(target)
	}

	pub fn walk_to(&mut self, target: GridPos) -> Result<RequestId, MoveError> {
		let result = self.request_path(target);
		match &result {
			Ok(id) => debug!("{id}: hero {} -> {target}", self.hero.grid_pos()),
			Err(err) => warn!("move rejected: {err}"),
		}
		result
	}

	fn request_path(&mut self, target: GridPos) -> Result<RequestId, MoveError> {
		if self.dialogue.is_active() {
			return Err(MoveError::DialogueActive);
		}
		if !self.hero.can_start_new_movement() || self.pending.is_some() {
			return Err(MoveError::Busy);
		}
		if !self.grid.is_in_bounds(target) {
			return Err(MoveError::OutOfBounds(target));
		}
		if !self.grid.is_walkable(target) {
			return Err(MoveError::Blocked(target));
		}
		if let Some((_, npc)) = self.npc_at(target) {
			return Err(MoveError::Occupied(target, npc.name().to_string()));
		}

		let request = self.pathfinder.find_path(self.hero.grid_pos(), target);
		let id = request.id();
		self.pending = Some(PendingMove { request, goal: target });
		Ok(id)
	}

	// --------------------------------------------------
	// Frame update
	// --------------------------------------------------

	pub fn tick(&mut self, dt_ms: f64) -> Vec<SceneEvent> {
		let mut events = Vec::new();

		for _ in 0..self.dialogue.take_closed() {
			events.push(SceneEvent::DialogueEnded);
		}

		self.pathfinder.calculate();
		self.consume_path(&mut events);

		if let Some(cell) = self.hero.update(&self.grid, dt_ms) {
			info!("hero arrived at {cell}");
			events.push(SceneEvent::Arrived(cell));
		}

		self.update_proximity(&mut events);

		for action in self.timers.advance(dt_ms) {
			match action {
				SceneAction::Interact(id) => self.fire_interaction(id, &mut events),
			}
		}

		events
	}

	fn consume_path(&mut self, events: &mut Vec<SceneEvent>) {
		let Some(pending) = self.pending.as_mut() else { return };
		let Some(outcome) = pending.request.try_take() else { return };
		let goal = pending.goal;
		let id = pending.request.id();
		self.pending = None;

		let path = match outcome {
			PathOutcome::Found(path) => path,
			PathOutcome::NoPath => {
				warn!("{id}: no path found to {goal}");
				events.push(SceneEvent::MoveRejected(MoveError::Unreachable(goal)));
				return;
			},
		};

		if let Some(bad) = first_blocked(&self.grid, &path) {
			warn!("{id}: path crosses blocked cell {bad}, refusing to move");
			events.push(SceneEvent::MoveRejected(MoveError::UnsafePath(goal, bad)));
			return;
		}

		events.push(SceneEvent::PathFound { id, steps: path.len() });
		if path.is_empty() {
			events.push(SceneEvent::Arrived(self.hero.grid_pos()));
			return;
		}
		match self.hero.move_to(&self.grid, &path) {
			MoveStart::Arrived(cell) => events.push(SceneEvent::Arrived(cell)),
			MoveStart::Started | MoveStart::Ignored => {},
		}
	}

	fn update_proximity(&mut self, events: &mut Vec<SceneEvent>) {
		let hero_cell = self.hero.current_cell(&self.grid);
		for (id, npc) in self.npcs.iter_mut().enumerate() {
			match npc.update(hero_cell, &mut self.timers, || SceneAction::Interact(id)) {
				Some(TriggerEvent::Armed(handle)) => {
					debug!("{} noticed the hero, {handle} armed", npc.name());
					events.push(SceneEvent::TriggerArmed(id));
				},
				Some(TriggerEvent::Cancelled(handle)) => {
					debug!("hero left {} before {handle} fired", npc.name());
					events.push(SceneEvent::TriggerCancelled(id));
				},
				Some(TriggerEvent::Left) | None => {},
			}
		}
	}

	fn fire_interaction(&mut self, id: NpcId, events: &mut Vec<SceneEvent>) {
		let Some(npc) = self.npcs.get_mut(id) else { return };
		let name = npc.name().to_string();
		let Some(entry) = npc.interact().map(str::to_string) else {
			debug!("{name} has nothing to say");
			return;
		};
		if self.dialogue.is_active() {
			debug!("{name} waits, a dialogue is already open");
			return;
		}
		if let Some(view) = self.dialogue.start(&entry) {
			info!("{name} starts talking");
			events.push(SceneEvent::DialogueShown(view));
		}
	}

	// --------------------------------------------------
	// Dialogue pass-throughs for the UI layer
	// --------------------------------------------------

	pub fn is_dialogue_active(&self) -> bool {
		self.dialogue.is_active()
	}

	pub fn dialogue_view(&self) -> Option<NodeView> {
		self.dialogue.view()
	}

	/// Opens a dialogue directly, e.g. from a click on an NPC.
	pub fn start_dialogue(&mut self, node_id: &str) -> Option<NodeView> {
		self.dialogue.start(node_id)
	}

	pub fn choose(&mut self, index: usize) -> Step {
		self.dialogue.choose(index)
	}

	pub fn advance(&mut self) -> Step {
		self.dialogue.advance()
	}

	pub fn end_dialogue(&mut self) -> bool {
		self.dialogue.end()
	}
}

/// First cell of `path` the scene's grid does not allow walking on.
fn first_blocked(grid: &Grid, path: &[GridPos]) -> Option<GridPos> {
	path.iter().copied().find(|&p| !grid.is_walkable(p))
}

// ---------------------------------------------------------------------------
// Building a scene from a parsed scene file
// ---------------------------------------------------------------------------

pub fn build(ast: &[TopLevel]) -> Result<Scene> {
	// Pass 1 – defines
	let mut config = SceneConfig::default();
	for tl in ast {
		if let TopLevel::Define(name, value) = tl {
			config.apply_define(name, value).with_context(|| format!("in #define {name}"))?;
		}
	}

	// Pass 2 – terrain
	let mut grid = None;
	for tl in ast {
		if let TopLevel::Map(rows) = tl {
			if grid.is_some() {
				bail!("scene defines more than one map");
			}
			let map = Grid::from_rows(rows, config.tile_size).context("invalid map")?;
			if (map.width(), map.height()) != (config.grid_width, config.grid_height) {
				debug!("map is {}x{}, overriding grid size defines", map.width(), map.height());
			}
			config.grid_width = map.width();
			config.grid_height = map.height();
			grid = Some(map);
		}
	}
	let mut grid = grid.unwrap_or_else(|| Grid::new(config.grid_width, config.grid_height, config.tile_size));
	for tl in ast {
		if let TopLevel::Block(cells) = tl {
			for &cell in cells {
				if !grid.set_blocked(cell, true) {
					bail!("blocked cell {cell} is outside the {}x{} grid", grid.width(), grid.height());
				}
			}
		}
	}

	// Pass 3 – dialogue
	let mut graph = DialogueGraph::new();
	for tl in ast {
		if let TopLevel::Node(decl) = tl {
			graph.insert(decl.id.clone(), build_node(decl)?)?;
		}
	}
	for (from, target) in graph.dangling_targets() {
		warn!("dialogue node '{from}' points at missing node '{target}'");
	}

	// Pass 4 – actors
	let mut hero_at = None;
	let mut npcs: Vec<Npc> = Vec::new();
	for tl in ast {
		match tl {
			TopLevel::Hero(at) => {
				if hero_at.replace(*at).is_some() {
					bail!("scene places the hero more than once");
				}
			},
			TopLevel::Npc(decl) => {
				if !grid.is_walkable(decl.at) {
					bail!("npc {} at {} is not on a walkable cell", decl.name, decl.at);
				}
				if let Some(other) = npcs.iter().find(|n| n.grid_pos() == decl.at || n.name() == decl.name) {
					bail!("npc {} clashes with npc {}", decl.name, other.name());
				}
				if let Some(entry) = &decl.dialogue {
					if !graph.contains(entry) {
						warn!("npc {} starts at missing dialogue node '{entry}'", decl.name);
					}
				}
				npcs.push(Npc::new(decl.name.clone(), decl.at, decl.dialogue.clone(), config.trigger_delay_ms));
			},
			_ => {},
		}
	}

	let hero_at = hero_at.unwrap_or(DEFAULT_HERO_POS);
	if !grid.is_walkable(hero_at) {
		return Err(anyhow!("hero start {hero_at} is not on a walkable cell"));
	}
	if npcs.iter().any(|n| n.grid_pos() == hero_at) {
		bail!("hero start {hero_at} is occupied by an npc");
	}

	info!(
		"scene ready: {}x{} grid, {} npcs, {} dialogue nodes",
		grid.width(),
		grid.height(),
		npcs.len(),
		graph.len()
	);
	Ok(Scene::new(config, grid, hero_at, npcs, graph))
}

fn build_node(decl: &NodeDecl) -> Result<DialogueNode> {
	let mut node = DialogueNode::default();
	let mut has_text = false;
	for stmt in &decl.body {
		match stmt {
			NodeStatement::Speaker(s) => node.speaker = s.clone(),
			NodeStatement::Text(t) => {
				node.text = t.clone();
				has_text = true;
			},
			NodeStatement::Choice(c) => node.choices.push(Choice {
				text: c.text.clone(),
				target: c.target.clone(),
			}),
			NodeStatement::Next(n) => {
				if node.auto_next.replace(n.clone()).is_some() {
					bail!("node {} has more than one next", decl.id);
				}
			},
		}
	}
	if !has_text {
		bail!("node {} has no text", decl.id);
	}
	if !node.choices.is_empty() && node.auto_next.is_some() {
		warn!("node {} has choices, its next is only used if they are removed", decl.id);
	}
	Ok(node)
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::dialogue::Prompt;

	const FRAME: f64 = 16.0;

	fn graph() -> DialogueGraph {
		let mut graph = DialogueGraph::new();
		graph
			.insert(
				"greet",
				DialogueNode {
					speaker: "Guide".into(),
					text: "Hello there!".into(),
					choices: vec![
						Choice {
							text: "Hi".into(),
							target: "bye".into(),
						},
						Choice {
							text: "Huh?".into(),
							target: "missing".into(),
						},
					],
					auto_next: None,
				},
			)
			.unwrap();
		graph
			.insert(
				"bye",
				DialogueNode {
					speaker: "Guide".into(),
					text: "Have a great day!".into(),
					..DialogueNode::default()
				},
			)
			.unwrap();
		graph
	}

	fn scene() -> Scene {
		let config = SceneConfig::default();
		let mut grid = Grid::new(10, 10, 64.0);
		for (x, y) in [(2, 3), (3, 3), (4, 4)] {
			grid.set_blocked(GridPos::new(x, y), true);
		}
		let npc = Npc::new("Guide", GridPos::new(5, 5), Some("greet".into()), config.trigger_delay_ms);
		Scene::new(config, grid, GridPos::new(2, 2), vec![npc], graph())
	}

	fn run(scene: &mut Scene, frames: usize) -> Vec<SceneEvent> {
		(0..frames).flat_map(|_| scene.tick(FRAME)).collect()
	}

	fn run_until_idle(scene: &mut Scene) -> Vec<SceneEvent> {
		let mut events = Vec::new();
		for _ in 0..1000 {
			events.extend(scene.tick(FRAME));
			if !scene.is_path_pending() && scene.hero().can_start_new_movement() {
				return events;
			}
		}
		panic!("hero never stopped");
	}

	fn click_cell(scene: &mut Scene, x: i32, y: i32) -> Result<RequestId, MoveError> {
		let world = scene.grid().to_world(GridPos::new(x, y));
		scene.pointer_down(world.x, world.y)
	}

	#[test]
	fn click_walks_the_hero_there() {
		let mut scene = scene();
		click_cell(&mut scene, 6, 2).expect("walkable target");
		let events = run_until_idle(&mut scene);
		assert!(matches!(events[0], SceneEvent::PathFound { steps: 4, .. }));
		assert!(events.contains(&SceneEvent::Arrived(GridPos::new(6, 2))));
		assert_eq!(scene.hero().grid_pos(), GridPos::new(6, 2));
	}

	#[test]
	fn invalid_targets_change_nothing() {
		let mut scene = scene();
		assert_eq!(scene.pointer_down(-5.0, 10.0), Err(MoveError::OutOfBounds(GridPos::new(-1, 0))));
		assert_eq!(scene.pointer_down(700.0, 10.0), Err(MoveError::OutOfBounds(GridPos::new(10, 0))));
		assert_eq!(click_cell(&mut scene, 3, 3), Err(MoveError::Blocked(GridPos::new(3, 3))));
		assert_eq!(
			click_cell(&mut scene, 5, 5),
			Err(MoveError::Occupied(GridPos::new(5, 5), "Guide".into()))
		);
		assert!(!scene.is_path_pending());
		assert_eq!(scene.hero().grid_pos(), GridPos::new(2, 2));
	}

	#[test]
	fn busy_while_pending_or_moving() {
		let mut scene = scene();
		click_cell(&mut scene, 2, 8).expect("walkable");
		assert_eq!(click_cell(&mut scene, 0, 0), Err(MoveError::Busy));
		scene.tick(FRAME);
		assert!(scene.hero().is_moving());
		assert_eq!(click_cell(&mut scene, 0, 0), Err(MoveError::Busy));
		run_until_idle(&mut scene);
		assert!(click_cell(&mut scene, 0, 0).is_ok());
	}

	#[test]
	fn clicking_own_cell_arrives_immediately() {
		let mut scene = scene();
		click_cell(&mut scene, 2, 2).expect("own cell is walkable");
		let events = scene.tick(FRAME);
		assert!(events.iter().any(|e| matches!(e, SceneEvent::PathFound { steps: 0, .. })));
		assert!(events.contains(&SceneEvent::Arrived(GridPos::new(2, 2))));
		assert!(!scene.hero().is_moving());
	}

	#[test]
	fn unreachable_target_is_reported() {
		let config = SceneConfig {
			corner_cutting: false,
			..SceneConfig::default()
		};
		let grid = Grid::from_rows(&["..#..", "..#..", "###..", ".....", "....."], 64.0).expect("map");
		let mut scene = Scene::new(config, grid, GridPos::new(0, 0), Vec::new(), DialogueGraph::new());
		click_cell(&mut scene, 4, 4).expect("target itself is walkable");
		let events = scene.tick(FRAME);
		assert!(events.contains(&SceneEvent::MoveRejected(MoveError::Unreachable(GridPos::new(4, 4)))));
		assert!(scene.hero().can_start_new_movement());
		assert!(!scene.is_path_pending());
	}

	#[test]
	fn arriving_next_to_npc_starts_dialogue_after_delay() {
		let mut scene = scene();
		click_cell(&mut scene, 5, 4).expect("walkable");
		let events = run_until_idle(&mut scene);
		assert!(events.contains(&SceneEvent::TriggerArmed(0)));
		assert!(!scene.is_dialogue_active());

		let events = run(&mut scene, 70);
		let shown: Vec<_> = events.iter().filter(|e| matches!(e, SceneEvent::DialogueShown(_))).collect();
		assert_eq!(shown.len(), 1);
		assert!(scene.is_dialogue_active());
		assert_eq!(
			scene.dialogue_view().map(|v| v.prompt),
			Some(Prompt::Choices(vec!["Hi".into(), "Huh?".into()]))
		);

		assert!(run(&mut scene, 200).iter().all(|e| !matches!(e, SceneEvent::DialogueShown(_))));
	}

	#[test]
	fn dialogue_blocks_movement_until_closed() {
		let mut scene = scene();
		click_cell(&mut scene, 5, 4).expect("walkable");
		run_until_idle(&mut scene);
		run(&mut scene, 70);
		assert!(scene.is_dialogue_active());
		assert_eq!(click_cell(&mut scene, 0, 0), Err(MoveError::DialogueActive));

		assert_eq!(scene.choose(9), Step::Ignored);
		assert!(matches!(scene.choose(0), Step::Show(ref v) if v.id == "bye"));
		assert_eq!(scene.advance(), Step::Ended);
		assert!(!scene.is_dialogue_active());
		assert!(!scene.end_dialogue());
		assert_eq!(scene.tick(FRAME), vec![SceneEvent::DialogueEnded]);
		assert!(scene.tick(FRAME).is_empty());
		assert!(click_cell(&mut scene, 0, 0).is_ok());
	}

	#[test]
	fn sessions_closed_between_ticks_are_reported() {
		let mut scene = scene();
		assert!(scene.start_dialogue("bye").is_some());
		assert!(scene.end_dialogue());
		assert_eq!(scene.tick(FRAME), vec![SceneEvent::DialogueEnded]);

		assert!(scene.start_dialogue("bye").is_some());
		assert_eq!(scene.advance(), Step::Ended);
		assert!(scene.start_dialogue("greet").is_some());
		assert_eq!(scene.tick(FRAME), vec![SceneEvent::DialogueEnded]);
		assert!(scene.is_dialogue_active());
		assert!(scene.tick(FRAME).is_empty());
	}

	#[test]
	fn path_through_a_newly_blocked_cell_is_refused() {
		let mut scene = scene();
		click_cell(&mut scene, 6, 2).expect("walkable target");
		assert!(scene.grid.set_blocked(GridPos::new(4, 2), true));

		let events = scene.tick(FRAME);
		assert_eq!(
			events,
			vec![SceneEvent::MoveRejected(MoveError::UnsafePath(GridPos::new(6, 2), GridPos::new(4, 2)))]
		);
		assert!(scene.hero().can_start_new_movement());
		assert_eq!(scene.hero().grid_pos(), GridPos::new(2, 2));
		assert!(!scene.is_path_pending());
	}

	#[test]
	fn first_blocked_finds_the_earliest_wall() {
		let grid = Grid::from_rows(&["....", ".##.", "...."], 64.0).expect("map");
		let clear = [GridPos::new(1, 0), GridPos::new(2, 0), GridPos::new(3, 1)];
		assert_eq!(first_blocked(&grid, &clear), None);
		let through = [GridPos::new(0, 1), GridPos::new(1, 1), GridPos::new(2, 1)];
		assert_eq!(first_blocked(&grid, &through), Some(GridPos::new(1, 1)));
		assert_eq!(first_blocked(&grid, &[GridPos::new(9, 9)]), Some(GridPos::new(9, 9)));
		assert_eq!(first_blocked(&grid, &[]), None);
	}

	#[test]
	fn walking_away_before_the_delay_cancels() {
		let mut scene = scene();
		click_cell(&mut scene, 5, 4).expect("walkable");
		run_until_idle(&mut scene);
		run(&mut scene, 10);
		click_cell(&mut scene, 8, 0).expect("walkable");
		let mut events = run_until_idle(&mut scene);
		events.extend(run(&mut scene, 100));
		assert!(events.contains(&SceneEvent::TriggerCancelled(0)));
		assert!(events.iter().all(|e| !matches!(e, SceneEvent::DialogueShown(_))));
		assert!(!scene.is_dialogue_active());
	}

	#[test]
	fn status_reads_like_the_debug_overlay() {
		let scene = scene();
		assert_eq!(
			scene.status().to_string(),
			"Current Grid Position: (2, 2)\nWorld Position: (160, 160)\nMoving: No"
		);
	}

	#[test]
	fn build_applies_defines_map_and_actors() {
		let ast = vec![
			TopLevel::Define("TILE_SIZE".into(), crate::ast::Literal::Number(32)),
			TopLevel::Map(vec!["....".into(), ".#..".into(), "....".into()]),
			TopLevel::Block(vec![GridPos::new(3, 0)]),
			TopLevel::Hero(GridPos::new(0, 0)),
			TopLevel::Npc(crate::ast::NpcDecl {
				name: "Guide".into(),
				at: GridPos::new(2, 2),
				dialogue: Some("hi".into()),
			}),
			TopLevel::Node(NodeDecl {
				id: "hi".into(),
				body: vec![NodeStatement::Speaker("Guide".into()), NodeStatement::Text("Hi".into())],
			}),
		];
		let scene = build(&ast).expect("valid scene");
		assert_eq!(scene.config().tile_size, 32.0);
		assert_eq!((scene.grid().width(), scene.grid().height()), (4, 3));
		assert!(!scene.grid().is_walkable(GridPos::new(3, 0)));
		assert!(!scene.grid().is_walkable(GridPos::new(1, 1)));
		assert_eq!(scene.npcs().len(), 1);
		assert_eq!(scene.hero().world_pos(), WorldPos::new(16.0, 16.0));
		assert!(scene.dialogue().graph().contains("hi"));
	}

	#[test]
	fn build_rejects_inconsistent_scenes() {
		let npc = |name: &str, x, y| {
			TopLevel::Npc(crate::ast::NpcDecl {
				name: name.into(),
				at: GridPos::new(x, y),
				dialogue: None,
			})
		};
		assert!(build(&[TopLevel::Hero(GridPos::new(20, 0))]).is_err());
		assert!(build(&[TopLevel::Block(vec![GridPos::new(2, 2)])]).is_err());
		assert!(build(&[npc("A", 1, 1), npc("B", 1, 1)]).is_err());
		assert!(build(&[npc("A", 2, 2)]).is_err());
		assert!(build(&[TopLevel::Node(NodeDecl { id: "n".into(), body: vec![] })]).is_err());
		assert!(build(&[TopLevel::Define("NOPE".into(), crate::ast::Literal::Number(1))]).is_err());
		assert!(build(&[TopLevel::Define("GRID_SIZE".into(), crate::ast::Literal::Number(50_000))]).is_err());
		assert!(build(&[]).is_ok());
	}
}
