use crate::SplitDirection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The largest value accepted for `TrainOptions::max_categories_for_exhaustive_search`. Exhaustive search visits `2^(k - 1) - 1` partitions.
pub const MAX_CATEGORIES_FOR_EXHAUSTIVE_SEARCH_LIMIT: usize = 20;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
	#[error("max_depth must be at least 1 but was {0}")]
	MaxDepth(usize),
	#[error("min_criterion must lie strictly between 0 and 1 but was {0}")]
	MinCriterion(f64),
	#[error("min_node_size must be at least 1 but was {0}")]
	MinNodeSize(usize),
	#[error("max_categories_for_exhaustive_search must be between 2 and {limit} but was {value}")]
	MaxCategoriesForExhaustiveSearch { value: usize, limit: usize },
	#[error("a monte carlo test needs at least one resample")]
	NoResamples,
}

/**
The hyperparameters of a single tree. The fields are private so that every instance has been through `Hyperparameters::new`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Hyperparameters {
	max_depth: usize,
	min_criterion: f64,
	min_node_size: usize,
}

impl Hyperparameters {
	pub fn new(
		max_depth: usize,
		min_criterion: f64,
		min_node_size: usize,
	) -> Result<Self, ConfigError> {
		if max_depth < 1 {
			return Err(ConfigError::MaxDepth(max_depth));
		}
		if !(min_criterion > 0.0 && min_criterion < 1.0) {
			return Err(ConfigError::MinCriterion(min_criterion));
		}
		if min_node_size < 1 {
			return Err(ConfigError::MinNodeSize(min_node_size));
		}
		Ok(Self {
			max_depth,
			min_criterion,
			min_node_size,
		})
	}

	/// The depth of the tree will never exceed this value. The root has depth 0.
	pub fn max_depth(&self) -> usize {
		self.max_depth
	}

	/// A node is split only if `1 - adjusted p-value` of the selected variable is strictly greater than this value.
	pub fn min_criterion(&self) -> f64 {
		self.min_criterion
	}

	/// Every leaf holds at least this many training examples.
	pub fn min_node_size(&self) -> usize {
		self.min_node_size
	}
}

impl Default for Hyperparameters {
	fn default() -> Self {
		Self {
			max_depth: 6,
			min_criterion: 0.95,
			min_node_size: 7,
		}
	}
}

/// These are the options passed to `Tree::train` that stay fixed while hyperparameters are tuned.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainOptions {
	/// How the association between a feature and the labels is tested at each node.
	pub test_type: TestType,
	/// How the p-values of all features at a node are adjusted before the smallest one is compared against `min_criterion`.
	pub multiplicity_correction: MultiplicityCorrection,
	/// Enum features with at most this many levels at a node are split by trying every partition of their levels. Above it, levels are ordered by their mean label and only prefixes of that order are tried.
	pub max_categories_for_exhaustive_search: usize,
	/// Where prediction sends a value that the split never saw during training.
	pub unseen_value_policy: UnseenValuePolicy,
	/// The seed for the permutations of `TestType::MonteCarlo`.
	pub seed: u64,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			test_type: TestType::Asymptotic,
			multiplicity_correction: MultiplicityCorrection::Bonferroni,
			max_categories_for_exhaustive_search: 12,
			unseen_value_policy: UnseenValuePolicy::LargerChild,
			seed: 0,
		}
	}
}

impl TrainOptions {
	pub fn validate(&self) -> Result<(), ConfigError> {
		let value = self.max_categories_for_exhaustive_search;
		if !(2..=MAX_CATEGORIES_FOR_EXHAUSTIVE_SEARCH_LIMIT).contains(&value) {
			return Err(ConfigError::MaxCategoriesForExhaustiveSearch {
				value,
				limit: MAX_CATEGORIES_FOR_EXHAUSTIVE_SEARCH_LIMIT,
			});
		}
		if let TestType::MonteCarlo { n_resamples: 0 } = self.test_type {
			return Err(ConfigError::NoResamples);
		}
		Ok(())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum TestType {
	/// Compare the statistic against its asymptotic chi-square distribution.
	#[serde(rename = "asymptotic")]
	Asymptotic,
	/// Compare the statistic against its value on `n_resamples` random permutations of the labels.
	#[serde(rename = "monte_carlo")]
	MonteCarlo { n_resamples: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum MultiplicityCorrection {
	#[serde(rename = "bonferroni")]
	Bonferroni,
	#[serde(rename = "sidak")]
	Sidak,
	#[serde(rename = "none")]
	None,
}

impl MultiplicityCorrection {
	/// Adjust the p-value of one of `n_tests` simultaneous tests.
	pub fn adjust(self, p_value: f64, n_tests: usize) -> f64 {
		let n_tests = n_tests as f64;
		let adjusted = match self {
			MultiplicityCorrection::Bonferroni => p_value * n_tests,
			// 1 - (1 - p)^m without the cancellation for small p.
			MultiplicityCorrection::Sidak => -(n_tests * (-p_value).ln_1p()).exp_m1(),
			MultiplicityCorrection::None => p_value,
		};
		adjusted.min(1.0).max(0.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum UnseenValuePolicy {
	/// Follow the child that received more training examples, going left on a tie.
	#[serde(rename = "larger_child")]
	LargerChild,
	#[serde(rename = "left")]
	Left,
	#[serde(rename = "right")]
	Right,
	/// Fail with `PredictError::UnseenValue`.
	#[serde(rename = "error")]
	Error,
}

impl UnseenValuePolicy {
	/// Resolve the policy for a split that sent `n_left` training examples left and `n_right` right. `None` means prediction fails.
	pub fn direction(self, n_left: usize, n_right: usize) -> Option<SplitDirection> {
		match self {
			UnseenValuePolicy::LargerChild => {
				if n_left >= n_right {
					Some(SplitDirection::Left)
				} else {
					Some(SplitDirection::Right)
				}
			}
			UnseenValuePolicy::Left => Some(SplitDirection::Left),
			UnseenValuePolicy::Right => Some(SplitDirection::Right),
			UnseenValuePolicy::Error => None,
		}
	}
}

#[test]
fn test_hyperparameters_validation() {
	assert!(Hyperparameters::new(3, 0.95, 5).is_ok());
	assert_eq!(
		Hyperparameters::new(0, 0.95, 5),
		Err(ConfigError::MaxDepth(0))
	);
	assert_eq!(
		Hyperparameters::new(3, 1.0, 5),
		Err(ConfigError::MinCriterion(1.0))
	);
	assert_eq!(
		Hyperparameters::new(3, 0.0, 5),
		Err(ConfigError::MinCriterion(0.0))
	);
	assert!(Hyperparameters::new(3, f64::NAN, 5).is_err());
	assert_eq!(
		Hyperparameters::new(3, 0.5, 0),
		Err(ConfigError::MinNodeSize(0))
	);
}

#[test]
fn test_train_options_validation() {
	assert!(TrainOptions::default().validate().is_ok());
	let options = TrainOptions {
		max_categories_for_exhaustive_search: 40,
		..Default::default()
	};
	assert!(options.validate().is_err());
	let options = TrainOptions {
		test_type: TestType::MonteCarlo { n_resamples: 0 },
		..Default::default()
	};
	assert_eq!(options.validate(), Err(ConfigError::NoResamples));
}

#[test]
fn test_multiplicity_correction() {
	assert!((MultiplicityCorrection::Bonferroni.adjust(0.01, 3) - 0.03).abs() < 1e-12);
	assert_eq!(MultiplicityCorrection::Bonferroni.adjust(0.5, 3), 1.0);
	let sidak = MultiplicityCorrection::Sidak.adjust(0.01, 3);
	assert!((sidak - (1.0 - 0.99f64.powi(3))).abs() < 1e-12);
	assert_eq!(MultiplicityCorrection::None.adjust(0.01, 3), 0.01);
}

#[test]
fn test_unseen_value_policy() {
	assert_eq!(
		UnseenValuePolicy::LargerChild.direction(3, 3),
		Some(SplitDirection::Left)
	);
	assert_eq!(
		UnseenValuePolicy::LargerChild.direction(2, 3),
		Some(SplitDirection::Right)
	);
	assert_eq!(UnseenValuePolicy::Error.direction(2, 3), None);
}
