use crate::{features::TrainFeature, BranchSplit, SplitDirection, TrainError};

/// Rearrange `examples_index` in place so that the examples sent left by `split` come first, and return how many were sent left. Examples are routed by `BranchSplit::direction`, the same function prediction uses.
pub fn rearrange_examples_index(
	feature: &TrainFeature,
	split: &BranchSplit,
	examples_index: &mut [usize],
) -> Result<usize, TrainError> {
	let mut left = 0;
	let mut right = examples_index.len();
	while left < right {
		match split.direction(feature.value(examples_index[left]))? {
			SplitDirection::Left => {
				left += 1;
			}
			SplitDirection::Right => {
				right -= 1;
				examples_index.swap(left, right);
			}
		}
	}
	Ok(left)
}

#[test]
fn test_rearrange_examples_index() {
	use crate::{features::TrainFeatureValues, BranchSplitContinuous, FeatureKind};
	let data = [5.0, 1.0, 7.0, 2.0, 9.0, 0.0];
	let feature = TrainFeature {
		index: 0,
		name: "x",
		kind: FeatureKind::Continuous,
		values: TrainFeatureValues::Number(&data),
	};
	let split = BranchSplit::Continuous(BranchSplitContinuous {
		feature_index: 0,
		split_value: 3.0,
		unseen_value_direction: None,
	});
	let mut examples_index: Vec<usize> = (0..6).collect();
	let n_left = rearrange_examples_index(&feature, &split, &mut examples_index).unwrap();
	assert_eq!(n_left, 3);
	let mut left = examples_index[..n_left].to_owned();
	let mut right = examples_index[n_left..].to_owned();
	left.sort_unstable();
	right.sort_unstable();
	assert_eq!(left, vec![1, 3, 5]);
	assert_eq!(right, vec![0, 2, 4]);
}
