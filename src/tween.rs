//! Tick-driven interpolation between two world positions.

use crate::grid::WorldPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
	#[default]
	Linear,
	QuadInOut,
}

impl Easing {
	pub fn from_name(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"linear" => Some(Easing::Linear),
			"quad_in_out" | "quadinout" => Some(Easing::QuadInOut),
			_ => None,
		}
	}

	/// Maps linear progress in `[0, 1]` onto the eased curve.
	pub fn apply(self, t: f32) -> f32 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Easing::Linear => t,
			Easing::QuadInOut => {
				if t < 0.5 {
					2.0 * t * t
				} else {
					1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
				}
			},
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
	from: WorldPos,
	to: WorldPos,
	duration_ms: f64,
	elapsed_ms: f64,
	easing: Easing,
}

impl Tween {
	pub fn new(from: WorldPos, to: WorldPos, duration_ms: f64, easing: Easing) -> Self {
		Self {
			from,
			to,
			duration_ms: duration_ms.max(0.0),
			elapsed_ms: 0.0,
			easing,
		}
	}

	/// Advances by `dt_ms`. Once the tween has finished, returns the part of
	/// `dt_ms` it did not need so the caller can carry it into the next one.
	pub fn advance(&mut self, dt_ms: f64) -> Option<f64> {
		self.elapsed_ms += dt_ms.max(0.0);
		(self.elapsed_ms >= self.duration_ms).then(|| self.elapsed_ms - self.duration_ms)
	}

	pub fn is_finished(&self) -> bool {
		self.elapsed_ms >= self.duration_ms
	}

	pub fn progress(&self) -> f32 {
		if self.duration_ms <= 0.0 {
			1.0
		} else {
			(self.elapsed_ms / self.duration_ms).min(1.0) as f32
		}
	}

	pub fn position(&self) -> WorldPos {
		if self.is_finished() {
			return self.to;
		}
		self.from.lerp(self.to, self.easing.apply(self.progress()))
	}

	pub fn target(&self) -> WorldPos {
		self.to
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_tween_interpolates_and_reports_leftover() {
		let mut tween = Tween::new(WorldPos::new(0.0, 0.0), WorldPos::new(100.0, 50.0), 200.0, Easing::Linear);
		assert_eq!(tween.advance(50.0), None);
		assert_eq!(tween.position(), WorldPos::new(25.0, 12.5));
		assert_eq!(tween.advance(100.0), None);
		assert_eq!(tween.advance(80.0), Some(30.0));
		assert!(tween.is_finished());
		assert_eq!(tween.position(), WorldPos::new(100.0, 50.0));
	}

	#[test]
	fn zero_duration_finishes_immediately() {
		let mut tween = Tween::new(WorldPos::new(0.0, 0.0), WorldPos::new(1.0, 1.0), 0.0, Easing::Linear);
		assert_eq!(tween.advance(0.0), Some(0.0));
		assert_eq!(tween.position(), WorldPos::new(1.0, 1.0));
	}

	#[test]
	fn quad_in_out_is_symmetric_and_clamped() {
		let ease = Easing::QuadInOut;
		assert_eq!(ease.apply(0.0), 0.0);
		assert_eq!(ease.apply(0.5), 0.5);
		assert_eq!(ease.apply(1.0), 1.0);
		assert_eq!(ease.apply(2.0), 1.0);
		assert!((ease.apply(0.25) + ease.apply(0.75) - 1.0).abs() < 1e-6);
		assert!(ease.apply(0.25) < Easing::Linear.apply(0.25));
	}

	#[test]
	fn easing_names() {
		assert_eq!(Easing::from_name("Linear"), Some(Easing::Linear));
		assert_eq!(Easing::from_name("quad_in_out"), Some(Easing::QuadInOut));
		assert_eq!(Easing::from_name("bounce"), None);
	}
}
