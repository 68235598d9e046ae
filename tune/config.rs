/*!
This module defines the `Config` struct, which is read from a JSON file to configure [`tune`](../fn.tune.html). Every field is optional and falls back to the corresponding `TuneOptions` default.

```json
{
	"n_folds": 5,
	"stratify_by": { "type": "labels" },
	"metric": "rmse",
	"selection_rule": "one_standard_error",
	"seed": 42,
	"search": {
		"max_iters": 60,
		"max_depth": { "min": 1, "max": 8 },
		"min_criterion": { "min": 0.8, "max": 0.999 },
		"initial": { "max_depth": 3, "min_criterion": 0.95, "min_node_size": 10 }
	},
	"tree": {
		"test_type": { "type": "monte_carlo", "n_resamples": 999 },
		"multiplicity_correction": "bonferroni",
		"unseen_value_policy": "larger_child"
	}
}
```
*/

use crate::{
	FloatRange, IntegerRange, SelectionRule, Stratification, TuneError, TuneMetric, TuneOptions,
};
use ctree_tree::{Hyperparameters, MultiplicityCorrection, TestType, UnseenValuePolicy};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	pub n_folds: Option<usize>,
	pub stratify_by: Option<StratifyBy>,
	pub metric: Option<TuneMetric>,
	pub selection_rule: Option<SelectionRule>,
	pub seed: Option<u64>,
	pub search: Option<SearchConfig>,
	pub tree: Option<TreeConfig>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
pub enum StratifyBy {
	#[serde(rename = "none")]
	None,
	#[serde(rename = "labels")]
	Labels,
	#[serde(rename = "column")]
	Column { name: String },
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct SearchConfig {
	pub max_iters: Option<usize>,
	pub initial_temperature: Option<f64>,
	pub cooling_rate: Option<f64>,
	pub patience: Option<usize>,
	pub max_depth: Option<IntegerRange>,
	pub min_criterion: Option<FloatRange>,
	pub min_node_size: Option<IntegerRange>,
	pub initial: Option<HyperparametersConfig>,
}

#[derive(Debug, serde::Deserialize)]
pub struct HyperparametersConfig {
	pub max_depth: usize,
	pub min_criterion: f64,
	pub min_node_size: usize,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct TreeConfig {
	pub test_type: Option<TestType>,
	pub multiplicity_correction: Option<MultiplicityCorrection>,
	pub max_categories_for_exhaustive_search: Option<usize>,
	pub unseen_value_policy: Option<UnseenValuePolicy>,
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
	#[error("failed to read the config file")]
	Io(#[from] std::io::Error),
	#[error("failed to parse the config file")]
	Parse(#[from] serde_json::Error),
}

impl Config {
	pub fn from_path(path: &Path) -> Result<Config, ConfigFileError> {
		let config = std::fs::read_to_string(path)?;
		Config::from_json(&config)
	}

	pub fn from_json(json: &str) -> Result<Config, ConfigFileError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Fill in the defaults for every field that is not set and validate the result.
	pub fn to_options(&self) -> Result<TuneOptions, TuneError> {
		let mut options = TuneOptions::default();
		if let Some(n_folds) = self.n_folds {
			options.n_folds = n_folds;
		}
		if let Some(stratify_by) = &self.stratify_by {
			options.stratification = match stratify_by {
				StratifyBy::None => Stratification::None,
				StratifyBy::Labels => Stratification::Labels,
				StratifyBy::Column { name } => Stratification::Column(name.clone()),
			};
		}
		if let Some(metric) = self.metric {
			options.metric = metric;
		}
		if let Some(selection_rule) = self.selection_rule {
			options.selection_rule = selection_rule;
		}
		if let Some(seed) = self.seed {
			options.seed = seed;
		}
		if let Some(search) = &self.search {
			let anneal_options = &mut options.anneal_options;
			if let Some(max_iters) = search.max_iters {
				anneal_options.max_iters = max_iters;
			}
			if let Some(initial_temperature) = search.initial_temperature {
				anneal_options.initial_temperature = initial_temperature;
			}
			if let Some(cooling_rate) = search.cooling_rate {
				anneal_options.cooling_rate = cooling_rate;
			}
			anneal_options.patience = search.patience;
			if let Some(max_depth) = search.max_depth {
				options.search_space.max_depth = max_depth;
			}
			if let Some(min_criterion) = search.min_criterion {
				options.search_space.min_criterion = min_criterion;
			}
			if let Some(min_node_size) = search.min_node_size {
				options.search_space.min_node_size = min_node_size;
			}
			if let Some(initial) = &search.initial {
				options.initial_hyperparameters = Hyperparameters::new(
					initial.max_depth,
					initial.min_criterion,
					initial.min_node_size,
				)?;
			}
		}
		if let Some(tree) = &self.tree {
			let train_options = &mut options.train_options;
			if let Some(test_type) = tree.test_type {
				train_options.test_type = test_type;
			}
			if let Some(multiplicity_correction) = tree.multiplicity_correction {
				train_options.multiplicity_correction = multiplicity_correction;
			}
			if let Some(max_categories) = tree.max_categories_for_exhaustive_search {
				train_options.max_categories_for_exhaustive_search = max_categories;
			}
			if let Some(unseen_value_policy) = tree.unseen_value_policy {
				train_options.unseen_value_policy = unseen_value_policy;
			}
		}
		options.validate()?;
		Ok(options)
	}
}

#[test]
fn test_config_to_options() {
	let config = Config::from_json(
		r#"{
			"n_folds": 4,
			"stratify_by": { "type": "column", "name": "color" },
			"metric": "mae",
			"seed": 3,
			"search": {
				"max_iters": 12,
				"patience": 4,
				"max_depth": { "min": 2, "max": 6 },
				"initial": { "max_depth": 2, "min_criterion": 0.9, "min_node_size": 8 }
			},
			"tree": {
				"test_type": { "type": "monte_carlo", "n_resamples": 199 },
				"multiplicity_correction": "sidak",
				"unseen_value_policy": "error"
			}
		}"#,
	)
	.unwrap();
	let options = config.to_options().unwrap();
	assert_eq!(options.n_folds, 4);
	assert_eq!(
		options.stratification,
		Stratification::Column("color".to_owned())
	);
	assert_eq!(options.metric, TuneMetric::MeanAbsoluteError);
	assert_eq!(options.anneal_options.max_iters, 12);
	assert_eq!(options.anneal_options.patience, Some(4));
	assert_eq!(options.search_space.max_depth, IntegerRange { min: 2, max: 6 });
	assert_eq!(
		options.initial_hyperparameters,
		Hyperparameters::new(2, 0.9, 8).unwrap()
	);
	assert_eq!(
		options.train_options.test_type,
		TestType::MonteCarlo { n_resamples: 199 }
	);
	assert_eq!(
		options.train_options.multiplicity_correction,
		MultiplicityCorrection::Sidak
	);
	assert_eq!(
		options.train_options.unseen_value_policy,
		UnseenValuePolicy::Error
	);
}

#[test]
fn test_empty_config_uses_defaults() {
	let options = Config::from_json("{}").unwrap().to_options().unwrap();
	assert_eq!(options, TuneOptions::default());
}

#[test]
fn test_invalid_config() {
	let config = Config::from_json(r#"{ "search": { "cooling_rate": 0.0 } }"#).unwrap();
	assert!(config.to_options().is_err());
	let config =
		Config::from_json(r#"{ "search": { "initial": { "max_depth": 0, "min_criterion": 0.9, "min_node_size": 8 } } }"#)
			.unwrap();
	assert!(matches!(
		config.to_options(),
		Err(TuneError::Config(crate::ConfigError::Tree(
			ctree_tree::ConfigError::MaxDepth(0)
		)))
	));
	assert!(Config::from_json(r#"{ "metric": "accuracy" }"#).is_err());
}
