use crate::ConfigError;
use ctree_tree::Hyperparameters;
use rand::Rng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct IntegerRange {
	pub min: usize,
	pub max: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct FloatRange {
	pub min: f64,
	pub max: f64,
}

/// The region of hyperparameter space the search moves in. Every parameter is bounded on both sides.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchSpace {
	pub max_depth: IntegerRange,
	pub min_criterion: FloatRange,
	pub min_node_size: IntegerRange,
}

impl Default for SearchSpace {
	fn default() -> Self {
		Self {
			max_depth: IntegerRange { min: 1, max: 10 },
			min_criterion: FloatRange {
				min: 0.5,
				max: 0.999,
			},
			min_node_size: IntegerRange { min: 1, max: 50 },
		}
	}
}

impl SearchSpace {
	pub fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |parameter, reason: &str| {
			Err(ConfigError::SearchSpace {
				parameter,
				reason: reason.to_owned(),
			})
		};
		if self.max_depth.min < 1 || self.max_depth.min > self.max_depth.max {
			return invalid("max_depth", "the range must satisfy 1 <= min <= max");
		}
		if self.min_node_size.min < 1 || self.min_node_size.min > self.min_node_size.max {
			return invalid("min_node_size", "the range must satisfy 1 <= min <= max");
		}
		let FloatRange { min, max } = self.min_criterion;
		if !(min > 0.0 && min <= max && max < 1.0) {
			return invalid("min_criterion", "the range must satisfy 0 < min <= max < 1");
		}
		Ok(())
	}

	/// Check that `hyperparameters` lie inside this space.
	pub fn check_contains(&self, hyperparameters: &Hyperparameters) -> Result<(), ConfigError> {
		if !self.max_depth.contains(hyperparameters.max_depth()) {
			return Err(ConfigError::InitialOutsideSearchSpace {
				parameter: "max_depth",
			});
		}
		if !self.min_node_size.contains(hyperparameters.min_node_size()) {
			return Err(ConfigError::InitialOutsideSearchSpace {
				parameter: "min_node_size",
			});
		}
		if !self.min_criterion.contains(hyperparameters.min_criterion()) {
			return Err(ConfigError::InitialOutsideSearchSpace {
				parameter: "min_criterion",
			});
		}
		Ok(())
	}

	/**
	Draw a random neighbor of `hyperparameters`. `radius` in (0, 1] scales the largest possible move.

	`max_depth` and `min_node_size` move by a nonzero integer step of at most `max(1, round(radius * (max - min)))` in a random direction and are clamped to their range. `min_criterion` moves uniformly within `radius * (max - min)` of its current value and reflects off the bounds of its range.
	*/
	pub fn neighbor(
		&self,
		hyperparameters: &Hyperparameters,
		radius: f64,
		rng: &mut Xoshiro256Plus,
	) -> Result<Hyperparameters, ConfigError> {
		let max_depth = self.max_depth.step(hyperparameters.max_depth(), radius, rng);
		let min_criterion = self
			.min_criterion
			.step(hyperparameters.min_criterion(), radius, rng);
		let min_node_size = self
			.min_node_size
			.step(hyperparameters.min_node_size(), radius, rng);
		Ok(Hyperparameters::new(
			max_depth,
			min_criterion,
			min_node_size,
		)?)
	}
}

impl IntegerRange {
	pub fn contains(&self, value: usize) -> bool {
		self.min <= value && value <= self.max
	}

	fn step(&self, value: usize, radius: f64, rng: &mut Xoshiro256Plus) -> usize {
		let width = self.max - self.min;
		if width == 0 {
			return self.min;
		}
		let max_step = ((radius * width as f64).round() as usize).max(1);
		let step = rng.gen_range(1, max_step + 1);
		let value = if rng.gen::<bool>() {
			value.saturating_add(step)
		} else {
			value.saturating_sub(step)
		};
		value.max(self.min).min(self.max)
	}
}

impl FloatRange {
	pub fn contains(&self, value: f64) -> bool {
		self.min <= value && value <= self.max
	}

	fn step(&self, value: f64, radius: f64, rng: &mut Xoshiro256Plus) -> f64 {
		let width = self.max - self.min;
		if width <= 0.0 {
			return self.min;
		}
		let mut value = value + rng.gen_range(-1.0, 1.0) * radius * width;
		if value > self.max {
			value = 2.0 * self.max - value;
		}
		if value < self.min {
			value = 2.0 * self.min - value;
		}
		value.max(self.min).min(self.max)
	}
}

#[test]
fn test_neighbor_stays_in_space() {
	use rand::SeedableRng;
	let space = SearchSpace {
		max_depth: IntegerRange { min: 2, max: 6 },
		min_criterion: FloatRange {
			min: 0.8,
			max: 0.99,
		},
		min_node_size: IntegerRange { min: 3, max: 3 },
	};
	space.validate().unwrap();
	let mut rng = Xoshiro256Plus::seed_from_u64(0);
	let mut hyperparameters = Hyperparameters::new(2, 0.99, 3).unwrap();
	let mut n_depth_changes = 0;
	for i in 0..200 {
		let radius = (200 - i) as f64 / 200.0;
		let next = space.neighbor(&hyperparameters, radius, &mut rng).unwrap();
		space.check_contains(&next).unwrap();
		if next.max_depth() != hyperparameters.max_depth() {
			n_depth_changes += 1;
		}
		hyperparameters = next;
	}
	assert!(n_depth_changes > 0);
	assert_eq!(hyperparameters.min_node_size(), 3);
}

#[test]
fn test_search_space_validation() {
	assert!(SearchSpace::default().validate().is_ok());
	let space = SearchSpace {
		min_criterion: FloatRange { min: 0.5, max: 1.0 },
		..Default::default()
	};
	assert!(matches!(
		space.validate(),
		Err(ConfigError::SearchSpace {
			parameter: "min_criterion",
			..
		})
	));
	let space = SearchSpace {
		max_depth: IntegerRange { min: 0, max: 4 },
		..Default::default()
	};
	assert!(space.validate().is_err());
	let hyperparameters = Hyperparameters::new(12, 0.9, 5).unwrap();
	assert_eq!(
		SearchSpace::default().check_contains(&hyperparameters),
		Err(ConfigError::InitialOutsideSearchSpace {
			parameter: "max_depth"
		})
	);
}
