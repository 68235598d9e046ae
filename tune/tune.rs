use crate::{
	anneal::{search, AnnealOptions, SearchHistory},
	make_folds,
	select::{select_best, select_within_one_standard_error, SelectionRule},
	ConfigError, CrossValidation, SearchSpace, TuneError, TuneMetric,
};
use ctree_dataframe::{ColumnView, DataFrameView, NumberColumnView};
use ctree_tree::{Hyperparameters, Tree, TrainOptions};
use ctree_util::{derive_seed, ProgressCounter};

const FOLDS_STREAM: u64 = 0;
const SEARCH_STREAM: u64 = 1;
const CROSS_VALIDATION_STREAM: u64 = 2;
const FINAL_TREE_STREAM: u64 = 3;

/// Which column, if any, the cross validation folds are stratified by.
#[derive(Clone, Debug, PartialEq)]
pub enum Stratification {
	None,
	/// Stratify by quantile groups of the labels.
	Labels,
	/// Stratify by the feature column with this name.
	Column(String),
}

/// These are the options passed to `tune`.
#[derive(Clone, Debug, PartialEq)]
pub struct TuneOptions {
	pub n_folds: usize,
	pub stratification: Stratification,
	pub metric: TuneMetric,
	pub selection_rule: SelectionRule,
	pub search_space: SearchSpace,
	/// The configuration the search starts from. It must lie inside `search_space`.
	pub initial_hyperparameters: Hyperparameters,
	/// `anneal_options.seed` is replaced by a seed derived from `seed`.
	pub anneal_options: AnnealOptions,
	/// `train_options.seed` is replaced by a seed derived from `seed` for every tree.
	pub train_options: TrainOptions,
	pub seed: u64,
}

impl Default for TuneOptions {
	fn default() -> Self {
		Self {
			n_folds: 5,
			stratification: Stratification::Labels,
			metric: TuneMetric::RootMeanSquaredError,
			selection_rule: SelectionRule::OneStandardError,
			search_space: SearchSpace::default(),
			initial_hyperparameters: Hyperparameters::default(),
			anneal_options: AnnealOptions::default(),
			train_options: TrainOptions::default(),
			seed: 0,
		}
	}
}

impl TuneOptions {
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.search_space.validate()?;
		self.search_space
			.check_contains(&self.initial_hyperparameters)?;
		self.anneal_options.validate()?;
		self.train_options.validate()?;
		Ok(())
	}
}

#[derive(Clone, Debug)]
pub struct TuneOutput {
	/// The tree trained on every example with the selected hyperparameters.
	pub tree: Tree,
	pub hyperparameters: Hyperparameters,
	/// The index in `history.entries` of the selected configuration.
	pub selected_index: usize,
	pub history: SearchHistory<Hyperparameters>,
}

#[derive(Clone, Debug)]
pub enum TuneProgress {
	/// The counter counts evaluated configurations.
	Searching(ProgressCounter),
	TrainingFinalTree,
}

/**
Choose hyperparameters for a tree on `features` and `labels` and train the final tree.

The examples are split into cross validation folds once. Simulated annealing then searches `options.search_space`, scoring each configuration by its mean validation metric across the folds. The selection rule picks a configuration from the search history, and a tree with that configuration is trained on every example.
*/
pub fn tune(
	features: &DataFrameView,
	labels: &NumberColumnView,
	options: &TuneOptions,
	update_progress: &mut dyn FnMut(TuneProgress),
) -> Result<TuneOutput, TuneError> {
	options.validate()?;
	let stratify_by = match &options.stratification {
		Stratification::None => None,
		Stratification::Labels => Some(ColumnView::Number(labels.clone())),
		Stratification::Column(name) => {
			let column = features
				.columns
				.iter()
				.find(|column| column.name() == name)
				.ok_or_else(|| ConfigError::UnknownStratificationColumn(name.clone()))?;
			Some(column.clone())
		}
	};
	let folds = make_folds(
		labels.len(),
		options.n_folds,
		stratify_by.as_ref(),
		derive_seed(options.seed, &[FOLDS_STREAM]),
	)?;
	let cross_validation = CrossValidation {
		features: features.clone(),
		labels: labels.clone(),
		folds: &folds,
		metric: options.metric,
		train_options: options.train_options.clone(),
		seed: derive_seed(options.seed, &[CROSS_VALIDATION_STREAM]),
	};
	let anneal_options = AnnealOptions {
		seed: derive_seed(options.seed, &[SEARCH_STREAM]),
		..options.anneal_options.clone()
	};

	let progress_counter = ProgressCounter::new(anneal_options.max_iters as u64);
	update_progress(TuneProgress::Searching(progress_counter.clone()));
	let history = search(
		|hyperparameters: &Hyperparameters, iteration| {
			let evaluation = cross_validation.evaluate(hyperparameters, iteration);
			progress_counter.inc(1);
			evaluation
		},
		options.initial_hyperparameters,
		|hyperparameters: &Hyperparameters, radius, rng| {
			Ok(options
				.search_space
				.neighbor(hyperparameters, radius, rng)?)
		},
		options.metric.direction(),
		&anneal_options,
	)?;

	let selected_index = match options.selection_rule {
		SelectionRule::Best => select_best(&history),
		SelectionRule::OneStandardError => select_within_one_standard_error(&history),
	}
	.ok_or(TuneError::EmptyHistory)?;
	let selected = &history.entries[selected_index];
	let hyperparameters = selected.config;
	log::info!(
		"selected max_depth {}, min_criterion {}, min_node_size {} from iteration {} with {} {} +/- {}",
		hyperparameters.max_depth(),
		hyperparameters.min_criterion(),
		hyperparameters.min_node_size(),
		selected.iteration,
		options.metric,
		selected.mean,
		selected.standard_error,
	);

	update_progress(TuneProgress::TrainingFinalTree);
	let train_options = TrainOptions {
		seed: derive_seed(options.seed, &[FINAL_TREE_STREAM]),
		..options.train_options.clone()
	};
	let tree = Tree::train(features, labels, &hyperparameters, &train_options)?;
	Ok(TuneOutput {
		tree,
		hyperparameters,
		selected_index,
		history,
	})
}

#[cfg(test)]
fn small_options() -> TuneOptions {
	TuneOptions {
		n_folds: 3,
		search_space: SearchSpace {
			max_depth: crate::IntegerRange { min: 1, max: 5 },
			min_criterion: crate::FloatRange {
				min: 0.8,
				max: 0.99,
			},
			min_node_size: crate::IntegerRange { min: 2, max: 20 },
		},
		initial_hyperparameters: Hyperparameters::new(3, 0.95, 5).unwrap(),
		anneal_options: AnnealOptions {
			max_iters: 8,
			..Default::default()
		},
		seed: 21,
		..Default::default()
	}
}

#[test]
fn test_tune() {
	let dataset = ctree_dataframe::synthetic::linear_with_noise(240, 2.0, 6);
	let options = small_options();
	let mut n_progress_updates = 0;
	let output = tune(
		&dataset.features.view(),
		&dataset.labels.view(),
		&options,
		&mut |_| n_progress_updates += 1,
	)
	.unwrap();
	assert_eq!(n_progress_updates, 2);
	assert!(output.history.entries.len() <= 8);
	let best = output.history.best();
	let selected = &output.history.entries[output.selected_index];
	assert!(selected.objective <= best.objective + best.standard_error);
	assert_eq!(selected.config, output.hyperparameters);
	assert!(output.tree.depth() <= output.hyperparameters.max_depth());
	assert!(output.tree.variable_importance()["a"] > 0.5);
	let again = tune(
		&dataset.features.view(),
		&dataset.labels.view(),
		&options,
		&mut |_| {},
	)
	.unwrap();
	assert_eq!(output.history, again.history);
	assert_eq!(output.tree, again.tree);
}

#[test]
fn test_tune_rejects_invalid_options() {
	let dataset = ctree_dataframe::synthetic::step(20);
	let options = TuneOptions {
		initial_hyperparameters: Hyperparameters::new(9, 0.95, 5).unwrap(),
		..small_options()
	};
	let result = tune(
		&dataset.features.view(),
		&dataset.labels.view(),
		&options,
		&mut |_| {},
	);
	assert!(matches!(
		result,
		Err(TuneError::Config(ConfigError::InitialOutsideSearchSpace {
			parameter: "max_depth"
		}))
	));
	let options = TuneOptions {
		stratification: Stratification::Column("missing".to_owned()),
		..small_options()
	};
	let result = tune(
		&dataset.features.view(),
		&dataset.labels.view(),
		&options,
		&mut |_| {},
	);
	assert!(matches!(
		result,
		Err(TuneError::Config(ConfigError::UnknownStratificationColumn(_)))
	));
	let options = TuneOptions {
		n_folds: 40,
		..small_options()
	};
	let result = tune(
		&dataset.features.view(),
		&dataset.labels.view(),
		&options,
		&mut |_| {},
	);
	assert!(matches!(
		result,
		Err(TuneError::Resample(crate::ResampleError::TooManyFolds { .. }))
	));
}
