use crate::{
	features::{TrainFeature, TrainFeatureValues},
	BranchSplit, BranchSplitContinuous, BranchSplitDiscrete, BranchSplitOrdinal, FeatureKind,
	SplitDirection, TrainError, TrainOptions,
};
use ctree_util::Finite;
use std::cmp::Ordering;

/// The best binary partition of a node along one feature.
#[derive(Clone, Debug, PartialEq)]
pub struct BestSplit {
	pub split: BranchSplit,
	/// The reduction in the sum of squared errors, `SSE(node) - SSE(left) - SSE(right)`.
	pub gain: f64,
	pub n_left: usize,
	pub n_right: usize,
}

/**
Find the binary partition of the node holding `examples_index` along `feature` that most reduces the sum of squared errors. Partitions that leave fewer than `min_node_size` examples in either child are not considered. Returns `None` when no partition is valid.

For continuous and ordinal features every boundary between consecutive distinct values is tried. For nominal features every partition of the levels present in the node is tried when there are at most `options.max_categories_for_exhaustive_search` of them. Otherwise the levels are ordered by their mean label and every prefix of that order is tried, which is optimal for squared error. Ties go to the first candidate tried.
*/
pub fn choose_best_split(
	feature: &TrainFeature,
	examples_index: &[usize],
	labels: &[f32],
	min_node_size: usize,
	options: &TrainOptions,
) -> Result<Option<BestSplit>, TrainError> {
	if examples_index.is_empty() {
		return Err(TrainError::EmptyNode);
	}
	// Centering the labels makes the gain of a partition depend only on the sum of the labels sent left.
	let mean = examples_index
		.iter()
		.map(|example_index| labels[*example_index] as f64)
		.sum::<f64>()
		/ examples_index.len() as f64;
	let centered_label = |example_index: usize| labels[example_index] as f64 - mean;
	let best_split = match (feature.kind, &feature.values) {
		(FeatureKind::Continuous, TrainFeatureValues::Number(data)) => {
			let mut entries = examples_index
				.iter()
				.map(|example_index| -> Result<(Finite<f32>, f64), TrainError> {
					let value = Finite::new(data[*example_index]).map_err(|_| {
						TrainError::MissingValue {
							column: feature.name.to_owned(),
							row: *example_index,
						}
					})?;
					Ok((value, centered_label(*example_index)))
				})
				.collect::<Result<Vec<_>, _>>()?;
			entries.sort_by_key(|(value, _)| *value);
			choose_best_split_continuous(feature.index, &entries, min_node_size, options)
		}
		(FeatureKind::Ordinal, _) => {
			let mut entries: Vec<(usize, f64)> = examples_index
				.iter()
				.map(|example_index| {
					(
						feature.level(*example_index),
						centered_label(*example_index),
					)
				})
				.collect();
			entries.sort_by_key(|(level, _)| *level);
			choose_best_split_ordinal(feature.index, &entries, min_node_size, options)
		}
		_ => {
			let mut counts = vec![0usize; feature.n_levels()];
			let mut sums = vec![0.0; feature.n_levels()];
			for example_index in examples_index {
				let level = feature.level(*example_index);
				counts[level] += 1;
				sums[level] += centered_label(*example_index);
			}
			choose_best_split_discrete(feature.index, &counts, &sums, min_node_size, options)
		}
	};
	Ok(best_split)
}

fn choose_best_split_continuous(
	feature_index: usize,
	entries: &[(Finite<f32>, f64)],
	min_node_size: usize,
	options: &TrainOptions,
) -> Option<BestSplit> {
	let (position, gain) = best_ordered_boundary(entries, min_node_size)?;
	let lower = entries[position].0.get();
	let upper = entries[position + 1].0.get();
	// The midpoint can round up to `upper` when the two values are adjacent floats.
	let midpoint = ((lower as f64 + upper as f64) / 2.0) as f32;
	let split_value = if midpoint < upper { midpoint } else { lower };
	let n_left = position + 1;
	let n_right = entries.len() - n_left;
	Some(BestSplit {
		split: BranchSplit::Continuous(BranchSplitContinuous {
			feature_index,
			split_value,
			unseen_value_direction: options.unseen_value_policy.direction(n_left, n_right),
		}),
		gain,
		n_left,
		n_right,
	})
}

fn choose_best_split_ordinal(
	feature_index: usize,
	entries: &[(usize, f64)],
	min_node_size: usize,
	options: &TrainOptions,
) -> Option<BestSplit> {
	let (position, gain) = best_ordered_boundary(entries, min_node_size)?;
	let n_left = position + 1;
	let n_right = entries.len() - n_left;
	Some(BestSplit {
		split: BranchSplit::Ordinal(BranchSplitOrdinal {
			feature_index,
			split_level: entries[position].0,
			unseen_value_direction: options.unseen_value_policy.direction(n_left, n_right),
		}),
		gain,
		n_left,
		n_right,
	})
}

/// Scan the boundaries between distinct keys of `entries`, which are sorted by key and hold centered labels. Returns the position of the last entry sent left by the best boundary along with its gain.
fn best_ordered_boundary<K: PartialEq>(
	entries: &[(K, f64)],
	min_node_size: usize,
) -> Option<(usize, f64)> {
	let n_examples = entries.len();
	let mut left_sum = 0.0;
	let mut best: Option<(usize, f64)> = None;
	for (position, window) in entries.windows(2).enumerate() {
		left_sum += window[0].1;
		if window[0].0 == window[1].0 {
			continue;
		}
		let n_left = position + 1;
		let n_right = n_examples - n_left;
		if n_left < min_node_size || n_right < min_node_size {
			continue;
		}
		let gain = centered_gain(left_sum, n_left, n_right);
		if is_better(gain, best.map(|(_, gain)| gain)) {
			best = Some((position, gain));
		}
	}
	best
}

fn choose_best_split_discrete(
	feature_index: usize,
	counts: &[usize],
	sums: &[f64],
	min_node_size: usize,
	options: &TrainOptions,
) -> Option<BestSplit> {
	let observed_levels: Vec<usize> = (0..counts.len())
		.filter(|level| counts[*level] > 0)
		.collect();
	let n_observed_levels = observed_levels.len();
	if n_observed_levels < 2 {
		return None;
	}
	let n_examples: usize = counts.iter().sum();
	let valid_gain = |n_left: usize, left_sum: f64| {
		let n_right = n_examples - n_left;
		if n_left < min_node_size || n_right < min_node_size {
			None
		} else {
			Some(centered_gain(left_sum, n_left, n_right))
		}
	};
	let mut best: Option<(Vec<usize>, f64)> = None;
	if n_observed_levels <= options.max_categories_for_exhaustive_search {
		// The last observed level always goes right, so each partition is visited once.
		let n_free_levels = n_observed_levels - 1;
		for mask in 1u32..(1u32 << n_free_levels) {
			let left_levels: Vec<usize> = observed_levels[..n_free_levels]
				.iter()
				.enumerate()
				.filter(|(bit, _)| mask & (1 << bit) != 0)
				.map(|(_, level)| *level)
				.collect();
			let n_left = left_levels.iter().map(|level| counts[*level]).sum();
			let left_sum = left_levels.iter().map(|level| sums[*level]).sum();
			if let Some(gain) = valid_gain(n_left, left_sum) {
				if is_better(gain, best.as_ref().map(|(_, gain)| *gain)) {
					best = Some((left_levels, gain));
				}
			}
		}
	} else {
		let mut ordered_levels = observed_levels.clone();
		ordered_levels.sort_by(|a, b| {
			let a_mean = sums[*a] / counts[*a] as f64;
			let b_mean = sums[*b] / counts[*b] as f64;
			a_mean.partial_cmp(&b_mean).unwrap_or(Ordering::Equal)
		});
		let mut n_left = 0;
		let mut left_sum = 0.0;
		for prefix_len in 1..n_observed_levels {
			let level = ordered_levels[prefix_len - 1];
			n_left += counts[level];
			left_sum += sums[level];
			if let Some(gain) = valid_gain(n_left, left_sum) {
				if is_better(gain, best.as_ref().map(|(_, gain)| *gain)) {
					best = Some((ordered_levels[..prefix_len].to_owned(), gain));
				}
			}
		}
	}
	let (left_levels, gain) = best?;
	let mut directions = vec![None; counts.len()];
	for level in observed_levels.iter() {
		directions[*level] = Some(SplitDirection::Right);
	}
	for level in left_levels.iter() {
		directions[*level] = Some(SplitDirection::Left);
	}
	let n_left = left_levels.iter().map(|level| counts[*level]).sum();
	let n_right = n_examples - n_left;
	Some(BestSplit {
		split: BranchSplit::Discrete(BranchSplitDiscrete {
			feature_index,
			directions,
			unseen_value_direction: options.unseen_value_policy.direction(n_left, n_right),
		}),
		gain,
		n_left,
		n_right,
	})
}

/// With centered labels the right sum is `-left_sum`, so the gain `sum_l^2 / n_l + sum_r^2 / n_r - sum^2 / n` reduces to this.
fn centered_gain(left_sum: f64, n_left: usize, n_right: usize) -> f64 {
	left_sum * left_sum * (1.0 / n_left as f64 + 1.0 / n_right as f64)
}

fn is_better(gain: f64, best_gain: Option<f64>) -> bool {
	match best_gain {
		Some(best_gain) => gain > best_gain,
		None => true,
	}
}

#[cfg(test)]
fn level_feature<'a>(
	kind: FeatureKind,
	data: &'a [Option<std::num::NonZeroUsize>],
	n_levels: usize,
) -> TrainFeature<'a> {
	TrainFeature {
		index: 0,
		name: "level",
		kind,
		values: TrainFeatureValues::Levels { data, n_levels },
	}
}

#[cfg(test)]
fn levels(values: &[usize]) -> Vec<Option<std::num::NonZeroUsize>> {
	values
		.iter()
		.map(|value| std::num::NonZeroUsize::new(*value))
		.collect()
}

#[test]
fn test_continuous_split() {
	let data: Vec<f32> = (0..20).map(|i| (i % 10) as f32).collect();
	let labels: Vec<f32> = data
		.iter()
		.map(|x| if *x < 5.0 { 0.0 } else { 10.0 })
		.collect();
	let feature = TrainFeature {
		index: 0,
		name: "x",
		kind: FeatureKind::Continuous,
		values: TrainFeatureValues::Number(&data),
	};
	let examples_index: Vec<usize> = (0..20).collect();
	let options = TrainOptions::default();
	let best = choose_best_split(&feature, &examples_index, &labels, 1, &options)
		.unwrap()
		.unwrap();
	assert_eq!(best.n_left, 10);
	assert_eq!(best.n_right, 10);
	// SSE(node) is 20 * 25 and both children are pure.
	assert!((best.gain - 500.0).abs() < 1e-9);
	insta::assert_debug_snapshot!(best.split, @r###"
 Continuous(
     BranchSplitContinuous {
         feature_index: 0,
         split_value: 4.5,
         unseen_value_direction: Some(
             Left,
         ),
     },
 )
 "###);
	// No partition leaves 11 examples on both sides.
	assert_eq!(
		choose_best_split(&feature, &examples_index, &labels, 11, &options).unwrap(),
		None
	);
	assert_eq!(
		choose_best_split(&feature, &[], &labels, 1, &options),
		Err(TrainError::EmptyNode)
	);
}

#[test]
fn test_split_value_between_adjacent_floats() {
	let lower = 1.0f32;
	let upper = f32::from_bits(lower.to_bits() + 1);
	let data = [lower, upper];
	let labels = [0.0, 1.0];
	let feature = TrainFeature {
		index: 0,
		name: "x",
		kind: FeatureKind::Continuous,
		values: TrainFeatureValues::Number(&data),
	};
	let best = choose_best_split(&feature, &[0, 1], &labels, 1, &TrainOptions::default())
		.unwrap()
		.unwrap();
	match best.split {
		BranchSplit::Continuous(split) => {
			assert!(split.split_value >= lower && split.split_value < upper)
		}
		_ => panic!("expected a continuous split"),
	}
}

#[test]
fn test_ordinal_split() {
	let data = levels(&[1, 2, 3, 4, 1, 2, 3, 4]);
	let labels = [0.0, 0.0, 6.0, 6.0, 0.0, 0.0, 6.0, 6.0];
	let feature = level_feature(FeatureKind::Ordinal, &data, 4);
	let examples_index: Vec<usize> = (0..8).collect();
	let best = choose_best_split(&feature, &examples_index, &labels, 1, &TrainOptions::default())
		.unwrap()
		.unwrap();
	match best.split {
		BranchSplit::Ordinal(split) => assert_eq!(split.split_level, 1),
		_ => panic!("expected an ordinal split"),
	}
}

#[test]
fn test_discrete_split_exhaustive_and_ordered() {
	// Levels 1 and 3 have high labels. Level 5 never appears.
	let data = levels(&[1, 2, 3, 4, 1, 2, 3, 4]);
	let labels = [10.0, 0.0, 10.0, 0.0, 10.0, 0.0, 10.0, 0.0];
	let feature = level_feature(FeatureKind::Nominal, &data, 5);
	let examples_index: Vec<usize> = (0..8).collect();
	let exhaustive = choose_best_split(&feature, &examples_index, &labels, 1, &TrainOptions::default())
		.unwrap()
		.unwrap();
	insta::assert_debug_snapshot!(exhaustive.split, @r###"
 Discrete(
     BranchSplitDiscrete {
         feature_index: 0,
         directions: [
             Some(
                 Left,
             ),
             Some(
                 Right,
             ),
             Some(
                 Left,
             ),
             Some(
                 Right,
             ),
             None,
         ],
         unseen_value_direction: Some(
             Left,
         ),
     },
 )
 "###);
	let options = TrainOptions {
		max_categories_for_exhaustive_search: 2,
		unseen_value_policy: crate::UnseenValuePolicy::Error,
		..Default::default()
	};
	let ordered = choose_best_split(&feature, &examples_index, &labels, 1, &options)
		.unwrap()
		.unwrap();
	assert!((ordered.gain - exhaustive.gain).abs() < 1e-9);
	assert_eq!(ordered.n_left, 4);
	match ordered.split {
		BranchSplit::Discrete(split) => {
			assert_eq!(split.directions[0], split.directions[2]);
			assert_ne!(split.directions[0], split.directions[1]);
			assert_eq!(split.unseen_value_direction, None);
		}
		_ => panic!("expected a discrete split"),
	}
}
