use crate::{split_test::LinearStatistic, split_test, FeatureKind, TrainError};
use ctree_dataframe::{ColumnView, DataFrameView, Value};
use std::num::NonZeroUsize;

/// A feature column prepared for training. Its values have been checked to be finite or present for every training example.
#[derive(Clone, Debug)]
pub struct TrainFeature<'a> {
	pub index: usize,
	pub name: &'a str,
	pub kind: FeatureKind,
	pub values: TrainFeatureValues<'a>,
}

#[derive(Clone, Debug)]
pub enum TrainFeatureValues<'a> {
	Number(&'a [f32]),
	Levels {
		data: &'a [Option<NonZeroUsize>],
		n_levels: usize,
	},
}

pub type StatisticFn = fn(&TrainFeature, &[usize], &[f64]) -> Option<LinearStatistic>;

impl FeatureKind {
	/// The statistic measuring the association between a feature of this kind and the labels.
	pub fn statistic(self) -> StatisticFn {
		match self {
			FeatureKind::Continuous | FeatureKind::Ordinal => split_test::score_statistic,
			FeatureKind::Nominal => split_test::level_statistic,
		}
	}
}

impl<'a> TrainFeature<'a> {
	pub fn value(&self, example_index: usize) -> Value {
		match &self.values {
			TrainFeatureValues::Number(data) => Value::Number(data[example_index]),
			TrainFeatureValues::Levels { data, .. } => Value::Enum(data[example_index]),
		}
	}

	/// The number feature value, or for level features the 0-based level index.
	pub fn score(&self, example_index: usize) -> f64 {
		match &self.values {
			TrainFeatureValues::Number(data) => data[example_index] as f64,
			TrainFeatureValues::Levels { .. } => self.level(example_index) as f64,
		}
	}

	/// The 0-based level index of a level feature. Number features have a single level.
	pub fn level(&self, example_index: usize) -> usize {
		match &self.values {
			TrainFeatureValues::Number(_) => 0,
			TrainFeatureValues::Levels { data, .. } => {
				data[example_index].map_or(0, |level| level.get() - 1)
			}
		}
	}

	pub fn n_levels(&self) -> usize {
		match &self.values {
			TrainFeatureValues::Number(_) => 1,
			TrainFeatureValues::Levels { n_levels, .. } => *n_levels,
		}
	}
}

/// Wrap each column of `features`, checking that the rows in `examples_index` have finite number values and level values that are one of the column's options.
pub fn compute_train_features<'a>(
	features: &DataFrameView<'a>,
	examples_index: &[usize],
) -> Result<Vec<TrainFeature<'a>>, TrainError> {
	features
		.columns
		.iter()
		.enumerate()
		.map(|(index, column)| {
			let (kind, values) = match column {
				ColumnView::Number(column) => (
					FeatureKind::Continuous,
					TrainFeatureValues::Number(column.data),
				),
				ColumnView::Ordinal(column) => (
					FeatureKind::Ordinal,
					TrainFeatureValues::Levels {
						data: column.data,
						n_levels: column.options.len(),
					},
				),
				ColumnView::Enum(column) => (
					FeatureKind::Nominal,
					TrainFeatureValues::Levels {
						data: column.data,
						n_levels: column.options.len(),
					},
				),
			};
			let is_valid = |example_index: usize| match &values {
				TrainFeatureValues::Number(data) => data[example_index].is_finite(),
				TrainFeatureValues::Levels { data, n_levels } => data[example_index]
					.map(|level| level.get() <= *n_levels)
					.unwrap_or(false),
			};
			if let Some(row) = examples_index.iter().find(|row| !is_valid(**row)) {
				return Err(TrainError::MissingValue {
					column: column.name().to_owned(),
					row: *row,
				});
			}
			Ok(TrainFeature {
				index,
				name: column.name(),
				kind,
				values,
			})
		})
		.collect()
}

#[test]
fn test_compute_train_features_rejects_missing_values() {
	use ctree_dataframe::{Column, ColumnType, DataFrame};
	let mut dataframe = DataFrame::new(
		vec!["x".to_owned(), "color".to_owned()],
		vec![
			ColumnType::Number,
			ColumnType::Enum {
				options: vec!["red".to_owned(), "blue".to_owned()],
			},
		],
	);
	if let Column::Number(column) = &mut dataframe.columns[0] {
		column.data = vec![1.0, 2.0, 3.0];
	}
	if let Column::Enum(column) = &mut dataframe.columns[1] {
		column.data = vec![NonZeroUsize::new(1), None, NonZeroUsize::new(2)];
	}
	let view = dataframe.view();
	let features = compute_train_features(&view, &[0, 2]).unwrap();
	assert_eq!(features[0].kind, FeatureKind::Continuous);
	assert_eq!(features[1].kind, FeatureKind::Nominal);
	assert_eq!(features[1].level(2), 1);
	assert_eq!(
		compute_train_features(&view, &[0, 1]).unwrap_err(),
		TrainError::MissingValue {
			column: "color".to_owned(),
			row: 1
		}
	);
}
