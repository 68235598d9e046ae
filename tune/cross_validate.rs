use crate::{Fold, TuneError, TuneMetric};
use ctree_dataframe::{DataFrameView, NumberColumnView, Value};
use ctree_metrics::{MeanVariance, StreamingMetric};
use ctree_tree::{Hyperparameters, Tree, TrainOptions};
use ctree_util::{derive_seed, pzip};
use rayon::prelude::*;
use serde::Serialize;

/// Scores hyperparameters by training one tree per fold and computing `metric` on the fold's validation examples.
#[derive(Clone, Debug)]
pub struct CrossValidation<'a> {
	pub features: DataFrameView<'a>,
	pub labels: NumberColumnView<'a>,
	pub folds: &'a [Fold],
	pub metric: TuneMetric,
	pub train_options: TrainOptions,
	/// The seed of each fold's tree is derived from this seed, the iteration and the fold.
	pub seed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
	/// The metric on each fold, in fold order.
	pub fold_metrics: Vec<f64>,
	pub mean: f64,
	/// The sample standard deviation of the fold metrics divided by the square root of the number of folds. This is 0 for a single fold.
	pub standard_error: f64,
}

impl Evaluation {
	pub fn from_fold_metrics(fold_metrics: Vec<f64>) -> Evaluation {
		let mut mean_variance = MeanVariance::default();
		for value in fold_metrics.iter() {
			mean_variance.update(*value);
		}
		let (mean, standard_error) = match mean_variance.finalize() {
			Some(output) => (output.mean, output.standard_error),
			None => (f64::NAN, 0.0),
		};
		Evaluation {
			fold_metrics,
			mean,
			standard_error,
		}
	}
}

impl<'a> CrossValidation<'a> {
	/// Evaluate `hyperparameters` at search iteration `iteration`. The folds are trained in parallel and their metrics are collected in fold order.
	pub fn evaluate(
		&self,
		hyperparameters: &Hyperparameters,
		iteration: usize,
	) -> Result<Evaluation, TuneError> {
		let fold_seeds: Vec<u64> = (0..self.folds.len())
			.map(|fold_index| derive_seed(self.seed, &[iteration as u64, fold_index as u64]))
			.collect();
		let fold_metrics = pzip!(self.folds, &fold_seeds, 0..self.folds.len())
			.map(|(fold, seed, fold_index)| {
				self.evaluate_fold(hyperparameters, fold, fold_index, *seed)
			})
			.collect::<Result<Vec<f64>, TuneError>>()?;
		Ok(Evaluation::from_fold_metrics(fold_metrics))
	}

	fn evaluate_fold(
		&self,
		hyperparameters: &Hyperparameters,
		fold: &Fold,
		fold_index: usize,
		seed: u64,
	) -> Result<f64, TuneError> {
		if fold.validation_indices.is_empty() {
			return Err(TuneError::EmptyValidationFold { fold: fold_index });
		}
		let options = TrainOptions {
			seed,
			..self.train_options.clone()
		};
		let tree = Tree::train_on_examples(
			&self.features,
			&self.labels,
			fold.train_indices.clone(),
			hyperparameters,
			&options,
		)?;
		let mut row = vec![Value::Number(0.0); self.features.ncols()];
		let mut predictions = Vec::with_capacity(fold.validation_indices.len());
		let mut labels = Vec::with_capacity(fold.validation_indices.len());
		for example_index in fold.validation_indices.iter() {
			self.features.read_row(*example_index, &mut row);
			predictions.push(tree.predict(&row)?);
			labels.push(self.labels.data[*example_index]);
		}
		Ok(self.metric.compute(&predictions, &labels))
	}
}

#[test]
fn test_evaluation_from_fold_metrics() {
	let evaluation = Evaluation::from_fold_metrics(vec![1.0, 2.0, 3.0, 4.0]);
	assert_eq!(evaluation.mean, 2.5);
	// The sample variance is 5 / 3.
	assert!((evaluation.standard_error - (5.0f64 / 3.0 / 4.0).sqrt()).abs() < 1e-12);
	let evaluation = Evaluation::from_fold_metrics(vec![2.0]);
	assert_eq!(evaluation.standard_error, 0.0);
}

#[test]
fn test_cross_validation_is_deterministic() {
	let dataset = ctree_dataframe::synthetic::linear_with_noise(200, 2.0, 4);
	let folds = crate::make_folds(200, 4, None, 8).unwrap();
	let cross_validation = CrossValidation {
		features: dataset.features.view(),
		labels: dataset.labels.view(),
		folds: &folds,
		metric: TuneMetric::RootMeanSquaredError,
		train_options: TrainOptions::default(),
		seed: 5,
	};
	let hyperparameters = Hyperparameters::new(4, 0.95, 5).unwrap();
	let evaluation = cross_validation.evaluate(&hyperparameters, 3).unwrap();
	assert_eq!(evaluation.fold_metrics.len(), 4);
	assert!(evaluation.mean > 0.0);
	// The labels span about 30, so a tree on the informative feature does far better than that.
	assert!(evaluation.mean < 6.0);
	assert_eq!(evaluation, cross_validation.evaluate(&hyperparameters, 3).unwrap());
}
