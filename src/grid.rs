//! Static walkability grid plus the screen ↔ grid ↔ world conversions every
//! other component goes through. Screen coordinates are world coordinates:
//! there is no camera in the core.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridPos {
	pub x: i32,
	pub y: i32,
}

impl GridPos {
	pub const fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}

	pub const fn offset(self, dx: i32, dy: i32) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
		}
	}

	/// Exactly one orthogonal step apart. Diagonal neighbours are not adjacent.
	pub fn is_adjacent(self, other: GridPos) -> bool {
		(self.x - other.x).abs() + (self.y - other.y).abs() == 1
	}
}

impl fmt::Display for GridPos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.x, self.y)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPos {
	pub x: f32,
	pub y: f32,
}

impl WorldPos {
	pub const fn new(x: f32, y: f32) -> Self {
		Self { x, y }
	}

	pub fn lerp(self, to: WorldPos, t: f32) -> WorldPos {
		WorldPos {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
		}
	}
}

impl fmt::Display for WorldPos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.x.round(), self.y.round())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
	Walkable,
	Blocked,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
	#[error("map has no rows")]
	Empty,
	#[error("map row {row} has {found} cells, expected {expected}")]
	RaggedRow { row: usize, expected: usize, found: usize },
	#[error("unknown map cell '{ch}' at row {row}, column {col}")]
	UnknownCell { row: usize, col: usize, ch: char },
	#[error("map is {width}x{height}, at most {} cells per side are allowed", MAX_DIMENSION)]
	TooLarge { width: usize, height: usize },
}

/// Largest width or height a grid may have.
pub const MAX_DIMENSION: i32 = 1024;

const ORTHOGONAL_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

const NEIGHBOURS: [(i32, i32); 8] = [(0, -1), (1, 0), (0, 1), (-1, 0), (1, -1), (1, 1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
	width: i32,
	height: i32,
	tile_size: f32,
	cells: Vec<Cell>,
}

impl Grid {
	/// An all-walkable grid. Each side is clamped to `0..=MAX_DIMENSION`.
	pub fn new(width: i32, height: i32, tile_size: f32) -> Self {
		let width = width.clamp(0, MAX_DIMENSION);
		let height = height.clamp(0, MAX_DIMENSION);
		Self {
			width,
			height,
			tile_size,
			cells: vec![Cell::Walkable; width as usize * height as usize],
		}
	}

	/// Builds a grid from text rows: `.` is walkable, `#` is blocked.
	pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self, GridError> {
		let expected = rows.first().ok_or(GridError::Empty)?.as_ref().chars().count();
		if expected == 0 {
			return Err(GridError::Empty);
		}
		if expected > MAX_DIMENSION as usize || rows.len() > MAX_DIMENSION as usize {
			return Err(GridError::TooLarge {
				width: expected,
				height: rows.len(),
			});
		}

		let mut cells = Vec::with_capacity(expected * rows.len());
		for (row, line) in rows.iter().enumerate() {
			let line = line.as_ref();
			let found = line.chars().count();
			if found != expected {
				return Err(GridError::RaggedRow { row, expected, found });
			}
			for (col, ch) in line.chars().enumerate() {
				cells.push(match ch {
					'.' => Cell::Walkable,
					'#' => Cell::Blocked,
					_ => return Err(GridError::UnknownCell { row, col, ch }),
				});
			}
		}

		Ok(Self {
			width: expected as i32,
			height: rows.len() as i32,
			tile_size,
			cells,
		})
	}

	pub fn width(&self) -> i32 {
		self.width
	}

	pub fn height(&self) -> i32 {
		self.height
	}

	pub fn tile_size(&self) -> f32 {
		self.tile_size
	}

	pub fn len(&self) -> usize {
		self.cells.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	pub fn is_in_bounds(&self, pos: GridPos) -> bool {
		pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
	}

	pub fn is_walkable(&self, pos: GridPos) -> bool {
		self.cell(pos) == Some(Cell::Walkable)
	}

	pub fn cell(&self, pos: GridPos) -> Option<Cell> {
		self.index(pos).map(|i| self.cells[i])
	}

	/// Design-time edit. Returns false when `pos` is out of bounds.
	pub fn set_blocked(&mut self, pos: GridPos, blocked: bool) -> bool {
		match self.index(pos) {
			Some(i) => {
				self.cells[i] = if blocked { Cell::Blocked } else { Cell::Walkable };
				true
			},
			None => false,
		}
	}

	pub fn index(&self, pos: GridPos) -> Option<usize> {
		self.is_in_bounds(pos).then(|| (pos.y * self.width + pos.x) as usize)
	}

	pub fn pos_of(&self, index: usize) -> GridPos {
		let index = index as i32;
		GridPos::new(index % self.width, index / self.width)
	}

	pub fn to_grid(&self, world: WorldPos) -> GridPos {
		GridPos::new((world.x / self.tile_size).floor() as i32, (world.y / self.tile_size).floor() as i32)
	}

	/// Center of the cell in world space.
	pub fn to_world(&self, pos: GridPos) -> WorldPos {
		let half = self.tile_size / 2.0;
		WorldPos::new(pos.x as f32 * self.tile_size + half, pos.y as f32 * self.tile_size + half)
	}

	pub fn screen_to_grid(&self, screen_x: f32, screen_y: f32) -> GridPos {
		self.to_grid(WorldPos::new(screen_x, screen_y))
	}

	pub fn blocked_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
		self.cells
			.iter()
			.enumerate()
			.filter(|(_, cell)| **cell == Cell::Blocked)
			.map(|(i, _)| self.pos_of(i))
	}

	/// Walkable neighbours of `pos` with their step cost (10 orthogonal, 14
	/// diagonal). Without corner cutting a diagonal step needs both
	/// orthogonal cells it passes to be walkable.
	pub fn neighbors(&self, pos: GridPos, diagonals: bool, corner_cutting: bool) -> impl Iterator<Item = (GridPos, u32)> + '_ {
		let count = if diagonals { NEIGHBOURS.len() } else { 4 };
		NEIGHBOURS[..count].iter().filter_map(move |&(dx, dy)| {
			let next = pos.offset(dx, dy);
			if !self.is_walkable(next) {
				return None;
			}
			if dx == 0 || dy == 0 {
				return Some((next, ORTHOGONAL_COST));
			}
			if !corner_cutting && !(self.is_walkable(pos.offset(dx, 0)) && self.is_walkable(pos.offset(0, dy))) {
				return None;
			}
			Some((next, DIAGONAL_COST))
		})
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn world_conversion_round_trips_through_cell_centers() {
		let grid = Grid::new(10, 10, 64.0);
		for y in 0..10 {
			for x in 0..10 {
				let pos = GridPos::new(x, y);
				let world = grid.to_world(pos);
				assert_eq!(grid.to_grid(world), pos);
				assert_eq!(grid.to_world(grid.to_grid(world)), world);
			}
		}
	}

	#[test]
	fn to_grid_floors_and_goes_negative_outside() {
		let grid = Grid::new(10, 10, 64.0);
		assert_eq!(grid.to_grid(WorldPos::new(63.9, 64.0)), GridPos::new(0, 1));
		assert_eq!(grid.to_grid(WorldPos::new(-0.5, 10.0)), GridPos::new(-1, 0));
		assert_eq!(grid.to_world(GridPos::new(2, 2)), WorldPos::new(160.0, 160.0));
	}

	#[test]
	fn out_of_bounds_is_never_walkable() {
		let mut grid = Grid::new(3, 2, 32.0);
		assert!(grid.is_walkable(GridPos::new(2, 1)));
		assert!(!grid.is_in_bounds(GridPos::new(3, 0)));
		assert!(!grid.is_walkable(GridPos::new(0, -1)));
		assert!(!grid.set_blocked(GridPos::new(5, 5), true));
		assert!(grid.set_blocked(GridPos::new(1, 1), true));
		assert!(!grid.is_walkable(GridPos::new(1, 1)));
		assert_eq!(grid.blocked_cells().collect::<Vec<_>>(), vec![GridPos::new(1, 1)]);
	}

	#[test]
	fn rows_build_a_grid() {
		let grid = Grid::from_rows(&["..#", "#.."], 16.0).expect("valid map");
		assert_eq!((grid.width(), grid.height()), (3, 2));
		assert!(!grid.is_walkable(GridPos::new(2, 0)));
		assert!(!grid.is_walkable(GridPos::new(0, 1)));
		assert!(grid.is_walkable(GridPos::new(1, 1)));
	}

	#[test]
	fn malformed_rows_are_rejected() {
		assert_eq!(Grid::from_rows::<&str>(&[], 16.0), Err(GridError::Empty));
		assert_eq!(
			Grid::from_rows(&["...", ".."], 16.0),
			Err(GridError::RaggedRow { row: 1, expected: 3, found: 2 })
		);
		assert_eq!(
			Grid::from_rows(&[".x."], 16.0),
			Err(GridError::UnknownCell { row: 0, col: 1, ch: 'x' })
		);
		let wide = ".".repeat(MAX_DIMENSION as usize + 1);
		assert_eq!(
			Grid::from_rows(&[wide.as_str()], 16.0),
			Err(GridError::TooLarge { width: 1025, height: 1 })
		);
	}

	#[test]
	fn oversized_grids_are_clamped() {
		let grid = Grid::new(50_000, 50_000, 64.0);
		assert_eq!((grid.width(), grid.height()), (MAX_DIMENSION, MAX_DIMENSION));
		assert_eq!(grid.len(), (MAX_DIMENSION * MAX_DIMENSION) as usize);
		assert!(Grid::new(-3, 4, 64.0).is_empty());
	}

	#[test]
	fn corner_cutting_controls_diagonals_past_walls() {
		let mut grid = Grid::new(3, 3, 1.0);
		grid.set_blocked(GridPos::new(1, 0), true);
		let origin = GridPos::new(0, 1);

		let cutting: Vec<_> = grid.neighbors(origin, true, true).map(|(p, _)| p).collect();
		assert!(!cutting.contains(&GridPos::new(1, 0)));
		assert!(cutting.contains(&GridPos::new(1, 2)));

		let center = GridPos::new(1, 1);
		let with: Vec<_> = grid.neighbors(center, true, true).map(|(p, _)| p).collect();
		let without: Vec<_> = grid.neighbors(center, true, false).map(|(p, _)| p).collect();
		assert!(with.contains(&GridPos::new(0, 0)));
		assert!(!without.contains(&GridPos::new(0, 0)));
		assert!(without.contains(&GridPos::new(0, 2)));

		let orthogonal: Vec<_> = grid.neighbors(center, false, true).collect();
		assert_eq!(orthogonal.len(), 3);
		assert!(orthogonal.iter().all(|(_, cost)| *cost == 10));
	}

	#[test]
	fn adjacency_is_orthogonal_only() {
		let a = GridPos::new(4, 4);
		assert!(a.is_adjacent(GridPos::new(5, 4)));
		assert!(a.is_adjacent(GridPos::new(4, 3)));
		assert!(!a.is_adjacent(GridPos::new(5, 5)));
		assert!(!a.is_adjacent(a));
		assert!(!a.is_adjacent(GridPos::new(6, 4)));
	}
}
