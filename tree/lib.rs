/*!
This crate implements conditional inference trees for regression.

A conditional inference tree chooses each split in two steps. First, every feature is tested for independence from the labels within the node, and the feature with the smallest p-value after a multiplicity correction is chosen. The node is only split if that feature passes the test, so the tree stops growing on its own once no feature is significantly associated with the labels. Second, the best binary partition along the chosen feature is found by minimizing squared error. Separating variable selection from split search removes the bias of exhaustive-search trees toward features with many possible splits.

```
use ctree_dataframe::synthetic;
use ctree_tree::{Hyperparameters, Tree, TrainOptions};

let dataset = synthetic::step(100);
let hyperparameters = Hyperparameters::new(4, 0.95, 5).unwrap();
let tree = Tree::train(
	&dataset.features.view(),
	&dataset.labels.view(),
	&hyperparameters,
	&TrainOptions::default(),
)
.unwrap();
assert_eq!(tree.n_leaves(), 2);
```
*/

#![allow(clippy::tabs_in_doc_comments)]

use ctree_dataframe::{DataFrameView, NumberColumnView, Value};
use itertools::izip;
use ndarray::prelude::*;
use std::{collections::BTreeMap, ops::Range};

mod choose_best_split;
mod error;
mod features;
mod options;
mod select_variable;
mod split_test;
pub mod stats;
mod train;

pub use self::choose_best_split::{choose_best_split, BestSplit};
pub use self::error::{PredictError, TrainError};
pub use self::features::{compute_train_features, TrainFeature, TrainFeatureValues};
pub use self::options::{
	ConfigError, Hyperparameters, MultiplicityCorrection, TestType, TrainOptions,
	UnseenValuePolicy, MAX_CATEGORIES_FOR_EXHAUSTIVE_SEARCH_LIMIT,
};
pub use self::select_variable::{select_variable, VariableSelection};
pub use self::split_test::{p_value, LinearStatistic};

/// A fitted tree. Every training example belongs to exactly one leaf, and the examples of each node occupy the contiguous range `examples_index_range` of `examples_index`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
	pub feature_names: Vec<String>,
	pub feature_kinds: Vec<FeatureKind>,
	/// The root is `nodes[0]`.
	pub nodes: Vec<Node>,
	pub examples_index: Vec<usize>,
	pub feature_importances: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureKind {
	/// A number feature.
	Continuous,
	/// A level feature whose levels are ordered.
	Ordinal,
	/// A level feature whose levels are not ordered.
	Nominal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BranchNode {
	pub parent_index: Option<usize>,
	pub depth: usize,
	pub left_child_index: usize,
	pub right_child_index: usize,
	pub split: BranchSplit,
	pub examples_index_range: Range<usize>,
	/// The reduction in the sum of squared errors achieved by the split.
	pub gain: f64,
	/// The unadjusted p-value of the split feature.
	pub p_value: f64,
	/// `1 - adjusted p-value` of the split feature.
	pub criterion: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode {
	pub parent_index: Option<usize>,
	pub depth: usize,
	/// The mean label of the leaf's training examples.
	pub value: f32,
	pub examples_index_range: Range<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BranchSplit {
	Continuous(BranchSplitContinuous),
	Ordinal(BranchSplitOrdinal),
	Discrete(BranchSplitDiscrete),
}

/// A continuous split sends examples whose value is less than or equal to `split_value` left.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchSplitContinuous {
	pub feature_index: usize,
	pub split_value: f32,
	/// Where non-finite values go. `None` means they are an error.
	pub unseen_value_direction: Option<SplitDirection>,
}

/// An ordinal split sends examples whose 0-based level is less than or equal to `split_level` left.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchSplitOrdinal {
	pub feature_index: usize,
	pub split_level: usize,
	pub unseen_value_direction: Option<SplitDirection>,
}

/// A discrete split looks up the direction of each 0-based level. Levels that were not present at the node during training have no direction.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchSplitDiscrete {
	pub feature_index: usize,
	pub directions: Vec<Option<SplitDirection>>,
	pub unseen_value_direction: Option<SplitDirection>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitDirection {
	Left,
	Right,
}

impl Tree {
	/// Train a tree on every row of `features` and `labels`.
	pub fn train(
		features: &DataFrameView,
		labels: &NumberColumnView,
		hyperparameters: &Hyperparameters,
		options: &TrainOptions,
	) -> Result<Tree, TrainError> {
		let examples_index = (0..labels.len()).collect();
		train::train(features, labels, examples_index, hyperparameters, options)
	}

	/// Train a tree on the rows listed in `examples_index`, for example the training rows of one cross validation fold.
	pub fn train_on_examples(
		features: &DataFrameView,
		labels: &NumberColumnView,
		examples_index: Vec<usize>,
		hyperparameters: &Hyperparameters,
		options: &TrainOptions,
	) -> Result<Tree, TrainError> {
		train::train(features, labels, examples_index, hyperparameters, options)
	}

	/// Make a prediction for a single row holding one value per feature.
	pub fn predict(&self, row: &[Value]) -> Result<f32, PredictError> {
		let leaf_index = self.leaf_index(row)?;
		Ok(self.leaf_value(leaf_index))
	}

	/// Make a prediction for each row of `rows`, writing the results to `predictions`.
	pub fn predict_rows(
		&self,
		rows: ArrayView2<Value>,
		mut predictions: ArrayViewMut1<f32>,
	) -> Result<(), PredictError> {
		self.check_n_features(rows.ncols())?;
		for (row, prediction) in izip!(rows.axis_iter(Axis(0)), predictions.iter_mut()) {
			let leaf_index = self.route(|feature_index| row[feature_index])?;
			*prediction = self.leaf_value(leaf_index);
		}
		Ok(())
	}

	/// The index in `nodes` of the leaf that `row` reaches.
	pub fn leaf_index(&self, row: &[Value]) -> Result<usize, PredictError> {
		self.check_n_features(row.len())?;
		self.route(|feature_index| row[feature_index])
	}

	/// The training examples that reached the node at `node_index`.
	pub fn leaf_examples(&self, node_index: usize) -> Option<&[usize]> {
		self.nodes
			.get(node_index)
			.map(|node| &self.examples_index[node.examples_index_range()])
	}

	pub fn n_splits(&self) -> usize {
		self.nodes.iter().filter(|node| node.as_branch().is_some()).count()
	}

	pub fn n_leaves(&self) -> usize {
		self.nodes.iter().filter(|node| node.as_leaf().is_some()).count()
	}

	/// The depth of the deepest node. A tree with a single leaf has depth 0.
	pub fn depth(&self) -> usize {
		self.nodes.iter().map(|node| node.depth()).max().unwrap_or(0)
	}

	/// The importance of each feature in declaration order. The importances sum to 1 unless the tree is a single leaf, in which case they are all 0.
	pub fn feature_importances(&self) -> &[f32] {
		&self.feature_importances
	}

	/// The importance of each feature keyed by its name.
	pub fn variable_importance(&self) -> BTreeMap<String, f32> {
		self.feature_names
			.iter()
			.cloned()
			.zip(self.feature_importances.iter().cloned())
			.collect()
	}

	fn check_n_features(&self, n_features: usize) -> Result<(), PredictError> {
		if n_features != self.feature_names.len() {
			return Err(PredictError::WrongNumberOfFeatures {
				expected: self.feature_names.len(),
				actual: n_features,
			});
		}
		Ok(())
	}

	fn route(&self, value: impl Fn(usize) -> Value) -> Result<usize, PredictError> {
		let mut node_index = 0;
		loop {
			match &self.nodes[node_index] {
				Node::Branch(BranchNode {
					left_child_index,
					right_child_index,
					split,
					..
				}) => {
					node_index = match split.direction(value(split.feature_index()))? {
						SplitDirection::Left => *left_child_index,
						SplitDirection::Right => *right_child_index,
					};
				}
				Node::Leaf(_) => return Ok(node_index),
			}
		}
	}

	fn leaf_value(&self, node_index: usize) -> f32 {
		match &self.nodes[node_index] {
			Node::Leaf(leaf) => leaf.value,
			Node::Branch(_) => f32::NAN,
		}
	}
}

impl Node {
	pub fn as_branch(&self) -> Option<&BranchNode> {
		match self {
			Node::Branch(branch) => Some(branch),
			_ => None,
		}
	}

	pub fn as_leaf(&self) -> Option<&LeafNode> {
		match self {
			Node::Leaf(leaf) => Some(leaf),
			_ => None,
		}
	}

	pub fn parent_index(&self) -> Option<usize> {
		match self {
			Node::Branch(branch) => branch.parent_index,
			Node::Leaf(leaf) => leaf.parent_index,
		}
	}

	pub fn depth(&self) -> usize {
		match self {
			Node::Branch(branch) => branch.depth,
			Node::Leaf(leaf) => leaf.depth,
		}
	}

	pub fn examples_index_range(&self) -> Range<usize> {
		match self {
			Node::Branch(branch) => branch.examples_index_range.clone(),
			Node::Leaf(leaf) => leaf.examples_index_range.clone(),
		}
	}
}

impl BranchSplit {
	pub fn feature_index(&self) -> usize {
		match self {
			BranchSplit::Continuous(split) => split.feature_index,
			BranchSplit::Ordinal(split) => split.feature_index,
			BranchSplit::Discrete(split) => split.feature_index,
		}
	}

	fn unseen_value_direction(&self) -> Option<SplitDirection> {
		match self {
			BranchSplit::Continuous(split) => split.unseen_value_direction,
			BranchSplit::Ordinal(split) => split.unseen_value_direction,
			BranchSplit::Discrete(split) => split.unseen_value_direction,
		}
	}

	/// Decide which child `value` goes to. Training uses this same function to partition a node's examples, so every training example reaches the leaf it was assigned to.
	pub fn direction(&self, value: Value) -> Result<SplitDirection, PredictError> {
		let feature_index = self.feature_index();
		let direction = match (self, value) {
			(BranchSplit::Continuous(split), Value::Number(value)) => {
				if !value.is_finite() {
					None
				} else if value <= split.split_value {
					Some(SplitDirection::Left)
				} else {
					Some(SplitDirection::Right)
				}
			}
			(BranchSplit::Ordinal(split), Value::Enum(level)) => level.map(|level| {
				if level.get() - 1 <= split.split_level {
					SplitDirection::Left
				} else {
					SplitDirection::Right
				}
			}),
			(BranchSplit::Discrete(split), Value::Enum(level)) => level
				.and_then(|level| split.directions.get(level.get() - 1).copied())
				.flatten(),
			(BranchSplit::Continuous(_), _) => {
				return Err(PredictError::ValueTypeMismatch {
					feature_index,
					expected: "number",
				})
			}
			(_, _) => {
				return Err(PredictError::ValueTypeMismatch {
					feature_index,
					expected: "level",
				})
			}
		};
		direction
			.or_else(|| self.unseen_value_direction())
			.ok_or(PredictError::UnseenValue { feature_index })
	}
}

#[cfg(test)]
mod test_utils {
	use super::*;

	pub fn train(
		dataset: &ctree_dataframe::synthetic::SyntheticDataset,
		max_depth: usize,
		min_criterion: f64,
		min_node_size: usize,
	) -> Tree {
		let hyperparameters = Hyperparameters::new(max_depth, min_criterion, min_node_size).unwrap();
		Tree::train(
			&dataset.features.view(),
			&dataset.labels.view(),
			&hyperparameters,
			&TrainOptions::default(),
		)
		.unwrap()
	}

	/// Every branch of `pruned` must be a branch with the same split in `full`.
	pub fn assert_refines(full: &Tree, full_index: usize, pruned: &Tree, pruned_index: usize) {
		if let Node::Branch(pruned_branch) = &pruned.nodes[pruned_index] {
			let full_branch = full.nodes[full_index].as_branch().unwrap();
			assert_eq!(full_branch.split, pruned_branch.split);
			assert_eq!(
				full_branch.examples_index_range,
				pruned_branch.examples_index_range
			);
			assert_refines(
				full,
				full_branch.left_child_index,
				pruned,
				pruned_branch.left_child_index,
			);
			assert_refines(
				full,
				full_branch.right_child_index,
				pruned,
				pruned_branch.right_child_index,
			);
		}
	}
}

#[test]
fn test_step_function() {
	let dataset = ctree_dataframe::synthetic::step(100);
	let tree = test_utils::train(&dataset, 4, 0.95, 5);
	assert_eq!(tree.n_splits(), 1);
	assert_eq!(tree.n_leaves(), 2);
	let root = tree.nodes[0].as_branch().unwrap();
	match &root.split {
		BranchSplit::Continuous(split) => {
			assert!(split.split_value > 4.0 && split.split_value < 6.0)
		}
		_ => panic!("expected a continuous split"),
	}
	let left = tree.nodes[root.left_child_index].as_leaf().unwrap();
	let right = tree.nodes[root.right_child_index].as_leaf().unwrap();
	assert!(left.value.abs() < 1e-6);
	assert!((right.value - 10.0).abs() < 1e-6);
	assert_eq!(tree.predict(&[Value::Number(2.0)]).unwrap(), left.value);
	assert_eq!(tree.predict(&[Value::Number(7.5)]).unwrap(), right.value);
	assert_eq!(tree.feature_importances(), &[1.0]);
}

#[test]
fn test_partition_and_depth_invariants() {
	let dataset = ctree_dataframe::synthetic::mixed(400, 1.0, 3);
	let max_depth = 3;
	let tree = test_utils::train(&dataset, max_depth, 0.9, 5);
	assert!(tree.depth() <= max_depth);
	let mut leaf_examples: Vec<usize> = Vec::new();
	for (node_index, node) in tree.nodes.iter().enumerate() {
		if let Some(parent_index) = node.parent_index() {
			assert_eq!(node.depth(), tree.nodes[parent_index].depth() + 1);
		} else {
			assert_eq!(node_index, 0);
			assert_eq!(node.depth(), 0);
		}
		if let Node::Leaf(leaf) = node {
			assert!(!leaf.examples_index_range.is_empty());
			leaf_examples.extend(tree.leaf_examples(node_index).unwrap());
		}
	}
	leaf_examples.sort_unstable();
	assert_eq!(leaf_examples, (0..400).collect::<Vec<_>>());
}

#[test]
fn test_training_examples_reach_their_leaves() {
	let dataset = ctree_dataframe::synthetic::mixed(300, 1.0, 5);
	let tree = test_utils::train(&dataset, 4, 0.9, 3);
	let rows = dataset.features.to_rows();
	for (node_index, node) in tree.nodes.iter().enumerate() {
		if let Node::Leaf(_) = node {
			for example_index in tree.leaf_examples(node_index).unwrap() {
				let row = rows.row(*example_index).to_vec();
				assert_eq!(tree.leaf_index(&row).unwrap(), node_index);
			}
		}
	}
	let mut predictions = Array1::zeros(rows.nrows());
	tree.predict_rows(rows.view(), predictions.view_mut()).unwrap();
	for (row, prediction) in izip!(rows.axis_iter(Axis(0)), predictions.iter()) {
		assert_eq!(tree.predict(&row.to_vec()).unwrap(), *prediction);
	}
}

#[test]
fn test_monotone_in_min_criterion() {
	let dataset = ctree_dataframe::synthetic::linear_with_noise(300, 4.0, 11);
	let loose = test_utils::train(&dataset, 6, 0.5, 5);
	let strict = test_utils::train(&dataset, 6, 0.999, 5);
	assert!(loose.n_splits() >= strict.n_splits());
	test_utils::assert_refines(&loose, 0, &strict, 0);
}

#[test]
fn test_train_is_deterministic() {
	let dataset = ctree_dataframe::synthetic::mixed(200, 1.0, 9);
	let hyperparameters = Hyperparameters::new(5, 0.8, 3).unwrap();
	let options = TrainOptions {
		test_type: TestType::MonteCarlo { n_resamples: 49 },
		seed: 17,
		..Default::default()
	};
	let train = || {
		Tree::train(
			&dataset.features.view(),
			&dataset.labels.view(),
			&hyperparameters,
			&options,
		)
		.unwrap()
	};
	assert_eq!(train(), train());
}

#[test]
fn test_informative_feature_selected_at_root() {
	let n_trials = 40;
	let mut n_root_splits_on_a = 0;
	for seed in 0..n_trials {
		let dataset = ctree_dataframe::synthetic::linear_with_noise(500, 5.0, seed);
		let tree = test_utils::train(&dataset, 3, 0.95, 10);
		if let Some(root) = tree.nodes[0].as_branch() {
			if root.split.feature_index() == 0 {
				n_root_splits_on_a += 1;
			}
		}
		let importance = tree.variable_importance();
		assert!(importance["a"] > importance["b"]);
	}
	assert!(n_root_splits_on_a as f64 >= 0.95 * n_trials as f64);
}

#[test]
fn test_nominal_feature_split() {
	let dataset = ctree_dataframe::synthetic::mixed(400, 0.5, 2);
	let tree = test_utils::train(&dataset, 1, 0.95, 5);
	let root = tree.nodes[0].as_branch().unwrap();
	match &root.split {
		BranchSplit::Discrete(split) => {
			assert_eq!(split.feature_index, 0);
			// Red and blue have the larger labels.
			let high = split.directions[0];
			assert_eq!(split.directions[2], high);
			assert_ne!(split.directions[1], high);
			assert_ne!(split.directions[3], high);
			assert_ne!(split.directions[4], high);
		}
		_ => panic!("expected a discrete split"),
	}
	assert_eq!(tree.feature_kinds[1], FeatureKind::Ordinal);
}

#[cfg(test)]
fn two_color_dataset() -> (ctree_dataframe::DataFrame, ctree_dataframe::NumberColumn) {
	use ctree_dataframe::{Column, ColumnType, DataFrame, NumberColumn};
	use std::num::NonZeroUsize;
	let mut features = DataFrame::new(
		vec!["color".to_owned()],
		vec![ColumnType::Enum {
			options: vec!["red".to_owned(), "green".to_owned(), "blue".to_owned()],
		}],
	);
	if let Column::Enum(column) = &mut features.columns[0] {
		column.data = (0..40).map(|i| NonZeroUsize::new(i % 2 + 1)).collect();
	}
	let labels = NumberColumn {
		name: "y".to_owned(),
		data: (0..40).map(|i| if i % 2 == 0 { 0.0 } else { 10.0 }).collect(),
	};
	(features, labels)
}

#[test]
fn test_unseen_values() {
	use std::num::NonZeroUsize;
	let (features, labels) = two_color_dataset();
	let hyperparameters = Hyperparameters::new(2, 0.95, 1).unwrap();
	let train = |unseen_value_policy| {
		let options = TrainOptions {
			unseen_value_policy,
			..Default::default()
		};
		Tree::train(&features.view(), &labels.view(), &hyperparameters, &options).unwrap()
	};
	let blue = Value::Enum(NonZeroUsize::new(3));
	let strict = train(UnseenValuePolicy::Error);
	assert_eq!(strict.predict(&[Value::Enum(NonZeroUsize::new(2))]), Ok(10.0));
	assert_eq!(
		strict.predict(&[blue]),
		Err(PredictError::UnseenValue { feature_index: 0 })
	);
	assert_eq!(
		strict.predict(&[Value::Enum(None)]),
		Err(PredictError::UnseenValue { feature_index: 0 })
	);
	assert_eq!(train(UnseenValuePolicy::LargerChild).predict(&[blue]), Ok(0.0));
	assert_eq!(train(UnseenValuePolicy::Right).predict(&[blue]), Ok(10.0));
	assert_eq!(
		strict.predict(&[Value::Number(1.0)]),
		Err(PredictError::ValueTypeMismatch {
			feature_index: 0,
			expected: "level"
		})
	);
	assert_eq!(
		strict.predict(&[]),
		Err(PredictError::WrongNumberOfFeatures {
			expected: 1,
			actual: 0
		})
	);
}

#[test]
fn test_train_validation() {
	let (features, mut labels) = two_color_dataset();
	let hyperparameters = Hyperparameters::default();
	let options = TrainOptions::default();
	let view = features.view();
	assert_eq!(
		Tree::train_on_examples(&view, &labels.view(), vec![], &hyperparameters, &options),
		Err(TrainError::NoExamples)
	);
	assert_eq!(
		Tree::train_on_examples(&view, &labels.view(), vec![0, 40], &hyperparameters, &options),
		Err(TrainError::ExampleOutOfRange {
			index: 40,
			n_rows: 40
		})
	);
	assert_eq!(
		Tree::train(
			&DataFrameView { columns: vec![] },
			&labels.view(),
			&hyperparameters,
			&options
		),
		Err(TrainError::NoFeatures)
	);
	labels.data[3] = f32::NAN;
	assert_eq!(
		Tree::train(&view, &labels.view(), &hyperparameters, &options),
		Err(TrainError::InvalidResponse { row: 3 })
	);
	labels.data.pop();
	assert_eq!(
		Tree::train(&view, &labels.view(), &hyperparameters, &options),
		Err(TrainError::ShapeMismatch {
			features: 40,
			labels: 39
		})
	);
}

#[test]
fn test_single_leaf_tree() {
	let (features, labels) = two_color_dataset();
	let hyperparameters = Hyperparameters::new(3, 0.95, 30).unwrap();
	let tree = Tree::train(
		&features.view(),
		&labels.view(),
		&hyperparameters,
		&TrainOptions::default(),
	)
	.unwrap();
	assert_eq!(tree.n_leaves(), 1);
	assert_eq!(tree.depth(), 0);
	assert_eq!(tree.feature_importances(), &[0.0]);
	assert_eq!(tree.predict(&[Value::Enum(None)]), Ok(5.0));
}
