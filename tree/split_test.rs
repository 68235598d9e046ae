/*!
This module tests the association between the labels and a single feature within a node.

Both statistics are conditional linear statistics in the sense of Strasser and Weber, standardized so that under independence they are asymptotically chi-square distributed:

- Continuous and ordinal features use `(n - 1) * r^2`, where `r` is the correlation between the feature's score and the labels. Ordinal levels are scored by their position. This has one degree of freedom.
- Nominal features use `(n - 1) * SSB / SST`, the share of the label sum of squares explained by the feature's levels. This has `L - 1` degrees of freedom where `L` is the number of levels present in the node.
*/

use crate::{features::TrainFeature, stats::chi_square_survival, TestType};
use itertools::izip;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// A permuted statistic counts as at least as extreme as the observed one within this relative tolerance.
const RELATIVE_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearStatistic {
	pub statistic: f64,
	pub degrees_of_freedom: usize,
}

/**
Compute the p-value for the null hypothesis that the labels are independent of `feature` within the node holding `examples_index`. `labels` holds the label of each example in `examples_index`, in the same order.

A feature with fewer than two distinct values in the node, or a node whose labels are all equal, has a p-value of 1.
*/
pub fn p_value(
	feature: &TrainFeature,
	examples_index: &[usize],
	labels: &[f64],
	test_type: TestType,
	seed: u64,
) -> f64 {
	let statistic_fn = feature.kind.statistic();
	let observed = match statistic_fn(feature, examples_index, labels) {
		Some(observed) => observed,
		None => return 1.0,
	};
	let p_value = match test_type {
		TestType::Asymptotic => {
			chi_square_survival(observed.statistic, observed.degrees_of_freedom)
		}
		TestType::MonteCarlo { n_resamples } => {
			let threshold = observed.statistic * (1.0 - RELATIVE_TOLERANCE);
			let mut rng = Xoshiro256Plus::seed_from_u64(seed);
			let mut permuted_labels = labels.to_owned();
			let mut n_at_least_as_extreme = 0;
			for _ in 0..n_resamples {
				permuted_labels.shuffle(&mut rng);
				let permuted = statistic_fn(feature, examples_index, &permuted_labels)
					.map(|permuted| permuted.statistic)
					.unwrap_or(0.0);
				if permuted >= threshold {
					n_at_least_as_extreme += 1;
				}
			}
			(1 + n_at_least_as_extreme) as f64 / (1 + n_resamples) as f64
		}
	};
	if p_value.is_nan() {
		1.0
	} else {
		p_value
	}
}

/// The statistic for continuous and ordinal features.
pub fn score_statistic(
	feature: &TrainFeature,
	examples_index: &[usize],
	labels: &[f64],
) -> Option<LinearStatistic> {
	let n_examples = examples_index.len();
	if n_examples < 2 || is_constant(labels) {
		return None;
	}
	let first_score = feature.score(examples_index[0]);
	if examples_index
		.iter()
		.all(|example_index| feature.score(*example_index) == first_score)
	{
		return None;
	}
	let n = n_examples as f64;
	let score_mean = examples_index
		.iter()
		.map(|example_index| feature.score(*example_index))
		.sum::<f64>()
		/ n;
	let label_mean = labels.iter().sum::<f64>() / n;
	let mut score_sum_of_squares = 0.0;
	let mut label_sum_of_squares = 0.0;
	let mut cross_sum = 0.0;
	for (example_index, label) in izip!(examples_index, labels) {
		let score_deviation = feature.score(*example_index) - score_mean;
		let label_deviation = label - label_mean;
		score_sum_of_squares += score_deviation * score_deviation;
		label_sum_of_squares += label_deviation * label_deviation;
		cross_sum += score_deviation * label_deviation;
	}
	if score_sum_of_squares <= 0.0 || label_sum_of_squares <= 0.0 {
		return None;
	}
	let r_squared =
		(cross_sum * cross_sum / (score_sum_of_squares * label_sum_of_squares)).min(1.0);
	Some(LinearStatistic {
		statistic: (n - 1.0) * r_squared,
		degrees_of_freedom: 1,
	})
}

/// The statistic for nominal features.
pub fn level_statistic(
	feature: &TrainFeature,
	examples_index: &[usize],
	labels: &[f64],
) -> Option<LinearStatistic> {
	let n_examples = examples_index.len();
	if n_examples < 2 || is_constant(labels) {
		return None;
	}
	let n = n_examples as f64;
	let label_mean = labels.iter().sum::<f64>() / n;
	let mut counts = vec![0usize; feature.n_levels()];
	let mut centered_sums = vec![0.0; feature.n_levels()];
	let mut total_sum_of_squares = 0.0;
	for (example_index, label) in izip!(examples_index, labels) {
		let level = feature.level(*example_index);
		let deviation = label - label_mean;
		counts[level] += 1;
		centered_sums[level] += deviation;
		total_sum_of_squares += deviation * deviation;
	}
	let n_observed_levels = counts.iter().filter(|count| **count > 0).count();
	if n_observed_levels < 2 || total_sum_of_squares <= 0.0 {
		return None;
	}
	// Each level contributes n_j * (mean_j - mean)^2 = (sum_j (y - mean))^2 / n_j.
	let between_sum_of_squares: f64 = izip!(&counts, &centered_sums)
		.filter(|(count, _)| **count > 0)
		.map(|(count, sum)| sum * sum / *count as f64)
		.sum();
	let explained = (between_sum_of_squares / total_sum_of_squares).min(1.0);
	Some(LinearStatistic {
		statistic: (n - 1.0) * explained,
		degrees_of_freedom: n_observed_levels - 1,
	})
}

fn is_constant(values: &[f64]) -> bool {
	match values.first() {
		Some(first) => values.iter().all(|value| value == first),
		None => true,
	}
}

#[cfg(test)]
fn number_feature(data: &[f32]) -> TrainFeature {
	TrainFeature {
		index: 0,
		name: "x",
		kind: crate::FeatureKind::Continuous,
		values: crate::features::TrainFeatureValues::Number(data),
	}
}

#[test]
fn test_strong_association_has_small_p_value() {
	let data: Vec<f32> = (0..20).map(|i| i as f32).collect();
	let labels: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 1.0).collect();
	let examples_index: Vec<usize> = (0..20).collect();
	let feature = number_feature(&data);
	let statistic = score_statistic(&feature, &examples_index, &labels).unwrap();
	assert!((statistic.statistic - 19.0).abs() < 1e-9);
	let p = p_value(&feature, &examples_index, &labels, TestType::Asymptotic, 0);
	assert!(p < 1e-4);
}

#[test]
fn test_degenerate_nodes_have_p_value_one() {
	let examples_index: Vec<usize> = (0..4).collect();
	let constant_feature = [1.0, 1.0, 1.0, 1.0];
	let labels = [1.0, 2.0, 3.0, 4.0];
	let feature = number_feature(&constant_feature);
	assert_eq!(
		p_value(&feature, &examples_index, &labels, TestType::Asymptotic, 0),
		1.0
	);
	let varying_feature = [1.0, 2.0, 3.0, 4.0];
	let feature = number_feature(&varying_feature);
	let constant_labels = [5.0, 5.0, 5.0, 5.0];
	assert_eq!(
		p_value(&feature, &examples_index, &constant_labels, TestType::Asymptotic, 0),
		1.0
	);
}

#[test]
fn test_level_statistic() {
	use std::num::NonZeroUsize;
	let data: Vec<Option<NonZeroUsize>> = [1, 1, 2, 2, 3, 3]
		.iter()
		.map(|level| NonZeroUsize::new(*level))
		.collect();
	let feature = TrainFeature {
		index: 0,
		name: "color",
		kind: crate::FeatureKind::Nominal,
		values: crate::features::TrainFeatureValues::Levels {
			data: &data,
			n_levels: 4,
		},
	};
	let examples_index: Vec<usize> = (0..6).collect();
	// The levels explain all of the variation.
	let labels = [0.0, 0.0, 5.0, 5.0, 1.0, 1.0];
	let statistic = level_statistic(&feature, &examples_index, &labels).unwrap();
	assert_eq!(statistic.degrees_of_freedom, 2);
	assert!((statistic.statistic - 5.0).abs() < 1e-9);
	// Only two of the levels are present in this node.
	let statistic = level_statistic(&feature, &examples_index[..4], &labels[..4]).unwrap();
	assert_eq!(statistic.degrees_of_freedom, 1);
	// A single level present in the node is not a usable split variable.
	assert_eq!(
		level_statistic(&feature, &examples_index[..2], &[1.0, 2.0]),
		None
	);
}

#[test]
fn test_monte_carlo_p_value() {
	let data: Vec<f32> = (0..20).map(|i| i as f32).collect();
	let labels: Vec<f64> = (0..20).map(|i| i as f64).collect();
	let examples_index: Vec<usize> = (0..20).collect();
	let feature = number_feature(&data);
	let test_type = TestType::MonteCarlo { n_resamples: 99 };
	let p = p_value(&feature, &examples_index, &labels, test_type, 42);
	assert!(p <= 0.02);
	assert_eq!(p, p_value(&feature, &examples_index, &labels, test_type, 42));
	// The correlation between these is exactly zero, so every permutation is at least as extreme.
	let data = [0.0, 1.0, 2.0, 3.0];
	let labels = [1.0, 0.0, 0.0, 1.0];
	let feature = number_feature(&data);
	assert_eq!(p_value(&feature, &[0, 1, 2, 3], &labels, test_type, 42), 1.0);
}
