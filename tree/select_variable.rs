use crate::{features::TrainFeature, split_test, TrainError, TrainOptions};
use ctree_util::derive_seed;
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub enum VariableSelection {
	/// The feature at `feature_index` is associated with the labels strongly enough to split on.
	Split {
		feature_index: usize,
		p_value: f64,
		criterion: f64,
		p_values: Vec<f64>,
	},
	/// No feature passed the threshold. `criterion` is the value of the best one.
	NoSplit { criterion: f64, p_values: Vec<f64> },
}

impl VariableSelection {
	/// The unadjusted p-value of every feature, in declaration order.
	pub fn p_values(&self) -> &[f64] {
		match self {
			VariableSelection::Split { p_values, .. } => p_values,
			VariableSelection::NoSplit { p_values, .. } => p_values,
		}
	}
}

/**
Test every feature for association with the labels at a node and choose the one with the smallest adjusted p-value. The node is split on it only if its criterion, `1 - adjusted p-value`, is strictly greater than `min_criterion`. Among features with the same adjusted p-value, the first in declaration order wins.

`node_key` identifies the node so that `TestType::MonteCarlo` permutations are seeded the same way no matter in which order nodes and features are visited.
*/
pub fn select_variable(
	features: &[TrainFeature],
	examples_index: &[usize],
	labels: &[f32],
	min_criterion: f64,
	options: &TrainOptions,
	node_key: u64,
) -> Result<VariableSelection, TrainError> {
	if examples_index.is_empty() {
		return Err(TrainError::EmptyNode);
	}
	let node_labels: Vec<f64> = examples_index
		.iter()
		.map(|example_index| labels[*example_index] as f64)
		.collect();
	let p_values: Vec<f64> = features
		.par_iter()
		.map(|feature| {
			let seed = derive_seed(options.seed, &[node_key, feature.index as u64]);
			split_test::p_value(
				feature,
				examples_index,
				&node_labels,
				options.test_type,
				seed,
			)
		})
		.collect();
	let n_tests = features.len();
	let best = p_values
		.iter()
		.enumerate()
		.map(|(position, p_value)| {
			let adjusted = options.multiplicity_correction.adjust(*p_value, n_tests);
			(position, adjusted)
		})
		.fold(None, |best: Option<(usize, f64)>, (position, adjusted)| match best {
			Some((_, best_adjusted)) if best_adjusted <= adjusted => best,
			_ => Some((position, adjusted)),
		});
	let (position, adjusted_p_value) = match best {
		Some(best) => best,
		None => {
			return Ok(VariableSelection::NoSplit {
				criterion: 0.0,
				p_values,
			})
		}
	};
	let criterion = 1.0 - adjusted_p_value;
	if criterion > min_criterion {
		Ok(VariableSelection::Split {
			feature_index: features[position].index,
			p_value: p_values[position],
			criterion,
			p_values,
		})
	} else {
		Ok(VariableSelection::NoSplit {
			criterion,
			p_values,
		})
	}
}

#[cfg(test)]
fn number_features<'a>(columns: &'a [Vec<f32>]) -> Vec<TrainFeature<'a>> {
	columns
		.iter()
		.enumerate()
		.map(|(index, data)| TrainFeature {
			index,
			name: "x",
			kind: crate::FeatureKind::Continuous,
			values: crate::features::TrainFeatureValues::Number(data),
		})
		.collect()
}

#[test]
fn test_select_variable_chooses_associated_feature() {
	let unrelated: Vec<f32> = (0..30).map(|i| ((i * 7) % 5) as f32).collect();
	let related: Vec<f32> = (0..30).map(|i| i as f32).collect();
	let labels: Vec<f32> = (0..30).map(|i| if i < 15 { 0.0 } else { 1.0 }).collect();
	let columns = vec![unrelated, related];
	let features = number_features(&columns);
	let examples_index: Vec<usize> = (0..30).collect();
	let options = TrainOptions::default();
	let selection =
		select_variable(&features, &examples_index, &labels, 0.95, &options, 0).unwrap();
	match selection {
		VariableSelection::Split {
			feature_index,
			criterion,
			..
		} => {
			assert_eq!(feature_index, 1);
			assert!(criterion > 0.99);
		}
		VariableSelection::NoSplit { .. } => panic!("expected a split"),
	}
}

#[test]
fn test_select_variable_ties_go_to_first_feature() {
	let data: Vec<f32> = (0..10).map(|i| i as f32).collect();
	let labels: Vec<f32> = (0..10).map(|i| i as f32).collect();
	let columns = vec![data.clone(), data];
	let features = number_features(&columns);
	let examples_index: Vec<usize> = (0..10).collect();
	let options = TrainOptions::default();
	let selection =
		select_variable(&features, &examples_index, &labels, 0.5, &options, 0).unwrap();
	match selection {
		VariableSelection::Split { feature_index, .. } => assert_eq!(feature_index, 0),
		VariableSelection::NoSplit { .. } => panic!("expected a split"),
	}
}

#[test]
fn test_select_variable_no_split() {
	let columns = vec![vec![1.0, 1.0, 1.0, 1.0]];
	let features = number_features(&columns);
	let labels = [1.0, 2.0, 3.0, 4.0];
	let options = TrainOptions::default();
	let selection = select_variable(&features, &[0, 1, 2, 3], &labels, 0.5, &options, 0).unwrap();
	assert_eq!(
		selection,
		VariableSelection::NoSplit {
			criterion: 0.0,
			p_values: vec![1.0],
		}
	);
	assert_eq!(
		select_variable(&features, &[], &labels, 0.5, &options, 0),
		Err(TrainError::EmptyNode)
	);
}
