use crate::ResampleError;
use ctree_dataframe::ColumnView;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::{cmp::Ordering, collections::BTreeMap};

/// The most quantile groups a number column is divided into for stratification.
const MAX_QUANTILE_GROUPS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Fold {
	pub train_indices: Vec<usize>,
	pub validation_indices: Vec<usize>,
}

/**
Partition the examples `0..n_examples` into `n_folds` disjoint validation folds that together cover every example. Each fold's training examples are the ones outside its validation fold.

When `stratify_by` is given, examples are first grouped into buckets: by level for `Ordinal` and `Enum` columns, and by quantile group for `Number` columns, with `min(5, n_examples / n_folds)` groups. Each bucket is shuffled and dealt to the folds round robin, continuing the rotation from one bucket to the next, so fold sizes differ by at most one and every fold gets a share of every bucket.
*/
pub fn make_folds(
	n_examples: usize,
	n_folds: usize,
	stratify_by: Option<&ColumnView>,
	seed: u64,
) -> Result<Vec<Fold>, ResampleError> {
	if n_folds < 2 {
		return Err(ResampleError::TooFewFolds { n_folds });
	}
	if n_folds > n_examples {
		return Err(ResampleError::TooManyFolds {
			n_folds,
			n_examples,
		});
	}
	let buckets = match stratify_by {
		None => vec![(0..n_examples).collect()],
		Some(column) => {
			if column.len() != n_examples {
				return Err(ResampleError::StratificationLength {
					expected: n_examples,
					actual: column.len(),
				});
			}
			stratification_buckets(column, n_folds)
		}
	};
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut fold_of_example = vec![0; n_examples];
	let mut next_fold = 0;
	for mut bucket in buckets {
		bucket.shuffle(&mut rng);
		for example_index in bucket {
			fold_of_example[example_index] = next_fold;
			next_fold = (next_fold + 1) % n_folds;
		}
	}
	let folds = (0..n_folds)
		.map(|fold_index| {
			let (validation_indices, train_indices) =
				(0..n_examples).partition(|example_index| fold_of_example[*example_index] == fold_index);
			Fold {
				train_indices,
				validation_indices,
			}
		})
		.collect();
	Ok(folds)
}

fn stratification_buckets(column: &ColumnView, n_folds: usize) -> Vec<Vec<usize>> {
	match column {
		ColumnView::Number(column) => {
			let n_examples = column.data.len();
			let n_groups = (n_examples / n_folds).min(MAX_QUANTILE_GROUPS).max(1);
			let mut sorted: Vec<usize> = (0..n_examples).collect();
			sorted.sort_by(|a, b| {
				column.data[*a]
					.partial_cmp(&column.data[*b])
					.unwrap_or(Ordering::Equal)
			});
			(0..n_groups)
				.map(|group| {
					let start = group * n_examples / n_groups;
					let end = (group + 1) * n_examples / n_groups;
					sorted[start..end].to_owned()
				})
				.collect()
		}
		ColumnView::Ordinal(column) | ColumnView::Enum(column) => {
			let mut buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
			for (example_index, value) in column.data.iter().enumerate() {
				let level = value.map(|value| value.get()).unwrap_or(0);
				buckets.entry(level).or_default().push(example_index);
			}
			buckets.into_iter().map(|(_, bucket)| bucket).collect()
		}
	}
}

#[test]
fn test_folds_are_disjoint_and_cover_all_examples() {
	let folds = make_folds(23, 5, None, 1).unwrap();
	assert_eq!(folds.len(), 5);
	let mut all: Vec<usize> = folds
		.iter()
		.flat_map(|fold| fold.validation_indices.iter().cloned())
		.collect();
	all.sort_unstable();
	assert_eq!(all, (0..23).collect::<Vec<_>>());
	for fold in folds.iter() {
		assert!(fold.validation_indices.len() == 4 || fold.validation_indices.len() == 5);
		assert_eq!(fold.train_indices.len() + fold.validation_indices.len(), 23);
		assert!(fold
			.train_indices
			.iter()
			.all(|index| !fold.validation_indices.contains(index)));
	}
	assert_eq!(folds, make_folds(23, 5, None, 1).unwrap());
	assert_ne!(folds, make_folds(23, 5, None, 2).unwrap());
}

#[test]
fn test_stratified_folds_balance_levels() {
	use ctree_dataframe::EnumColumnView;
	use std::num::NonZeroUsize;
	// 30 examples of the first level and 10 of the second.
	let data: Vec<Option<NonZeroUsize>> = (0..40)
		.map(|i| NonZeroUsize::new(if i % 4 == 0 { 2 } else { 1 }))
		.collect();
	let options = vec!["common".to_owned(), "rare".to_owned()];
	let column = ColumnView::Enum(EnumColumnView {
		name: "kind",
		options: &options,
		data: &data,
	});
	let folds = make_folds(40, 5, Some(&column), 3).unwrap();
	for fold in folds.iter() {
		let n_rare = fold
			.validation_indices
			.iter()
			.filter(|index| *index % 4 == 0)
			.count();
		assert_eq!(n_rare, 2);
		assert_eq!(fold.validation_indices.len(), 8);
	}
}

#[test]
fn test_stratified_folds_by_number_column() {
	use ctree_dataframe::NumberColumnView;
	let data: Vec<f32> = (0..50).map(|i| ((i * 37) % 50) as f32).collect();
	let column = ColumnView::Number(NumberColumnView {
		name: "y",
		data: &data,
	});
	let folds = make_folds(50, 5, Some(&column), 9).unwrap();
	for fold in folds.iter() {
		// Each of the 5 quantile groups of 10 examples puts 2 in every fold.
		let n_low = fold
			.validation_indices
			.iter()
			.filter(|index| data[**index] < 10.0)
			.count();
		assert_eq!(n_low, 2);
	}
}

#[test]
fn test_make_folds_errors() {
	assert_eq!(
		make_folds(10, 1, None, 0),
		Err(ResampleError::TooFewFolds { n_folds: 1 })
	);
	assert_eq!(
		make_folds(3, 4, None, 0),
		Err(ResampleError::TooManyFolds {
			n_folds: 4,
			n_examples: 3
		})
	);
	let data = [1.0, 2.0];
	let column = ColumnView::Number(ctree_dataframe::NumberColumnView {
		name: "y",
		data: &data,
	});
	assert_eq!(
		make_folds(3, 2, Some(&column), 0),
		Err(ResampleError::StratificationLength {
			expected: 3,
			actual: 2
		})
	);
}

#[test]
fn test_stratified_rotation_continues_across_buckets() {
	use ctree_dataframe::EnumColumnView;
	use std::num::NonZeroUsize;
	// 4 examples of the first level followed by 6 of the second.
	let data: Vec<Option<NonZeroUsize>> = (0..10)
		.map(|i| NonZeroUsize::new(if i < 4 { 1 } else { 2 }))
		.collect();
	let options = vec!["first".to_owned(), "second".to_owned()];
	let column = ColumnView::Enum(EnumColumnView {
		name: "level",
		options: &options,
		data: &data,
	});
	let folds = make_folds(10, 3, Some(&column), 5).unwrap();
	let sizes: Vec<(usize, usize)> = folds
		.iter()
		.map(|fold| {
			let n_first = fold
				.validation_indices
				.iter()
				.filter(|index| **index < 4)
				.count();
			(fold.validation_indices.len(), n_first)
		})
		.collect();
	insta::assert_debug_snapshot!(sizes, @r###"
 [
     (
         4,
         2,
     ),
     (
         3,
         1,
     ),
     (
         3,
         1,
     ),
 ]
 "###);
}
