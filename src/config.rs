use thiserror::Error;

use crate::{ast::Literal, grid::MAX_DIMENSION, tween::Easing};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("unknown define '{0}'")]
	UnknownDefine(String),
	#[error("define '{name}' expects {expected}, got {value}")]
	InvalidValue {
		name: String,
		expected: &'static str,
		value: String,
	},
}

/// Scene tunables. Defaults describe a 10x10 field of 64px tiles; a scene file
/// overrides them with `#define NAME value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
	pub grid_width: i32,
	pub grid_height: i32,
	pub tile_size: f32,
	pub step_duration_ms: f64,
	pub step_easing: Easing,
	pub trigger_delay_ms: f64,
	pub iterations_per_calculation: usize,
	pub allow_diagonals: bool,
	pub corner_cutting: bool,
}

impl Default for SceneConfig {
	fn default() -> Self {
		Self {
			grid_width: 10,
			grid_height: 10,
			tile_size: 64.0,
			step_duration_ms: 200.0,
			step_easing: Easing::Linear,
			trigger_delay_ms: 1000.0,
			iterations_per_calculation: 1000,
			allow_diagonals: true,
			corner_cutting: true,
		}
	}
}

impl SceneConfig {
	pub fn apply_define(&mut self, name: &str, value: &Literal) -> Result<(), ConfigError> {
		match name {
			"GRID_SIZE" => {
				let size = dimension(name, value)?;
				self.grid_width = size;
				self.grid_height = size;
			},
			"GRID_WIDTH" => self.grid_width = dimension(name, value)?,
			"GRID_HEIGHT" => self.grid_height = dimension(name, value)?,
			"TILE_SIZE" => self.tile_size = positive(name, value)? as f32,
			"STEP_DURATION" => self.step_duration_ms = non_negative(name, value)? as f64,
			"STEP_EASING" => self.step_easing = easing(name, value)?,
			"TRIGGER_DELAY" => self.trigger_delay_ms = non_negative(name, value)? as f64,
			"ITERATIONS_PER_CALCULATION" => self.iterations_per_calculation = positive(name, value)? as usize,
			"ALLOW_DIAGONALS" => self.allow_diagonals = flag(name, value)?,
			"CORNER_CUTTING" => self.corner_cutting = flag(name, value)?,
			_ => return Err(ConfigError::UnknownDefine(name.to_string())),
		}
		Ok(())
	}
}

fn invalid(name: &str, expected: &'static str, value: &Literal) -> ConfigError {
	ConfigError::InvalidValue {
		name: name.to_string(),
		expected,
		value: value.to_string(),
	}
}

fn positive(name: &str, value: &Literal) -> Result<i32, ConfigError> {
	match value {
		Literal::Number(n) if *n > 0 => i32::try_from(*n).map_err(|_| invalid(name, "a positive integer", value)),
		_ => Err(invalid(name, "a positive integer", value)),
	}
}

fn dimension(name: &str, value: &Literal) -> Result<i32, ConfigError> {
	match positive(name, value) {
		Ok(n) if n <= MAX_DIMENSION => Ok(n),
		_ => Err(invalid(name, "a grid size between 1 and 1024", value)),
	}
}

fn non_negative(name: &str, value: &Literal) -> Result<i32, ConfigError> {
	match value {
		Literal::Number(n) if *n >= 0 => i32::try_from(*n).map_err(|_| invalid(name, "a non-negative integer", value)),
		_ => Err(invalid(name, "a non-negative integer", value)),
	}
}

fn flag(name: &str, value: &Literal) -> Result<bool, ConfigError> {
	match value {
		Literal::Bool(b) => Ok(*b),
		Literal::Number(0) => Ok(false),
		Literal::Number(1) => Ok(true),
		_ => Err(invalid(name, "true or false", value)),
	}
}

fn easing(name: &str, value: &Literal) -> Result<Easing, ConfigError> {
	match value {
		Literal::Ident(s) | Literal::Str(s) => Easing::from_name(s).ok_or_else(|| invalid(name, "linear or quad_in_out", value)),
		_ => Err(invalid(name, "linear or quad_in_out", value)),
	}
}
