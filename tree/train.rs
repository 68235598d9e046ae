use crate::{
	choose_best_split::choose_best_split,
	features::compute_train_features,
	select_variable::{select_variable, VariableSelection},
	BranchNode, Hyperparameters, LeafNode, Node, Tree, TrainError, TrainOptions,
};
use ctree_dataframe::{DataFrameView, NumberColumnView};
use ctree_util::derive_seed;
use std::ops::Range;

mod examples_index;
mod feature_importances;

pub use self::examples_index::rearrange_examples_index;
pub use self::feature_importances::compute_feature_importances;

const ROOT_NODE_KEY: u64 = 0;

/// A node that has been added to the tree as a leaf but not yet considered for splitting.
struct PendingNode {
	node_index: usize,
	parent_index: Option<usize>,
	depth: usize,
	examples_index_range: Range<usize>,
	key: u64,
}

/**
Train a tree on the rows of `features` and `labels` listed in `examples_index`.

Nodes are processed depth first from an explicit stack. Every node enters the tree as a leaf predicting its mean label and is replaced by a branch if its examples pass the independence test and can be partitioned. The examples of each node occupy a contiguous range of the returned tree's `examples_index`, and splitting a node rearranges its range in place so the left child's examples come first.
*/
pub fn train(
	features: &DataFrameView,
	labels: &NumberColumnView,
	mut examples_index: Vec<usize>,
	hyperparameters: &Hyperparameters,
	options: &TrainOptions,
) -> Result<Tree, TrainError> {
	options.validate()?;
	let n_rows = labels.len();
	if features.ncols() == 0 {
		return Err(TrainError::NoFeatures);
	}
	if let Some(column) = features.columns.iter().find(|column| column.len() != n_rows) {
		return Err(TrainError::ShapeMismatch {
			features: column.len(),
			labels: n_rows,
		});
	}
	if examples_index.is_empty() {
		return Err(TrainError::NoExamples);
	}
	if let Some(index) = examples_index.iter().find(|index| **index >= n_rows) {
		return Err(TrainError::ExampleOutOfRange {
			index: *index,
			n_rows,
		});
	}
	let labels = labels.as_slice();
	if let Some(row) = examples_index
		.iter()
		.find(|example_index| !labels[**example_index].is_finite())
	{
		return Err(TrainError::InvalidResponse { row: *row });
	}
	let train_features = compute_train_features(features, &examples_index)?;

	let root_range = 0..examples_index.len();
	let mut nodes = vec![new_leaf(None, 0, root_range.clone(), &examples_index, labels)];
	let mut pending_nodes = vec![PendingNode {
		node_index: 0,
		parent_index: None,
		depth: 0,
		examples_index_range: root_range,
		key: ROOT_NODE_KEY,
	}];
	while let Some(pending_node) = pending_nodes.pop() {
		let PendingNode {
			node_index,
			parent_index,
			depth,
			examples_index_range,
			key,
		} = pending_node;
		let n_examples = examples_index_range.len();
		if n_examples == 0 {
			return Err(TrainError::EmptyNode);
		}
		if depth >= hyperparameters.max_depth() {
			log::debug!("node {} is a leaf at the maximum depth {}", node_index, depth);
			continue;
		}
		if n_examples < 2 * hyperparameters.min_node_size() {
			log::debug!(
				"node {} is a leaf because {} examples cannot fill two children",
				node_index,
				n_examples
			);
			continue;
		}
		let node_examples_index = &examples_index[examples_index_range.clone()];
		let selection = select_variable(
			&train_features,
			node_examples_index,
			labels,
			hyperparameters.min_criterion(),
			options,
			key,
		)?;
		let (feature_index, p_value, criterion) = match selection {
			VariableSelection::Split {
				feature_index,
				p_value,
				criterion,
				..
			} => (feature_index, p_value, criterion),
			VariableSelection::NoSplit { criterion, .. } => {
				log::debug!(
					"node {} is a leaf because its criterion {} does not exceed {}",
					node_index,
					criterion,
					hyperparameters.min_criterion()
				);
				continue;
			}
		};
		let feature = &train_features[feature_index];
		let best_split = match choose_best_split(
			feature,
			node_examples_index,
			labels,
			hyperparameters.min_node_size(),
			options,
		)? {
			Some(best_split) => best_split,
			None => {
				log::debug!(
					"node {} is a leaf because no split of {} leaves {} examples in each child",
					node_index,
					feature.name,
					hyperparameters.min_node_size()
				);
				continue;
			}
		};
		let n_left = rearrange_examples_index(
			feature,
			&best_split.split,
			&mut examples_index[examples_index_range.clone()],
		)?;
		if n_left != best_split.n_left {
			return Err(TrainError::PartitionMismatch {
				expected: best_split.n_left,
				actual: n_left,
			});
		}
		let split_position = examples_index_range.start + n_left;
		let left_range = examples_index_range.start..split_position;
		let right_range = split_position..examples_index_range.end;
		log::debug!(
			"node {} splits on {} with criterion {} into {} and {} examples",
			node_index,
			feature.name,
			criterion,
			left_range.len(),
			right_range.len()
		);
		let left_child_index = nodes.len();
		nodes.push(new_leaf(
			Some(node_index),
			depth + 1,
			left_range.clone(),
			&examples_index,
			labels,
		));
		let right_child_index = nodes.len();
		nodes.push(new_leaf(
			Some(node_index),
			depth + 1,
			right_range.clone(),
			&examples_index,
			labels,
		));
		nodes[node_index] = Node::Branch(BranchNode {
			parent_index,
			depth,
			left_child_index,
			right_child_index,
			split: best_split.split,
			examples_index_range,
			gain: best_split.gain,
			p_value,
			criterion,
		});
		// Push the right child first so the left subtree is built first.
		pending_nodes.push(PendingNode {
			node_index: right_child_index,
			parent_index: Some(node_index),
			depth: depth + 1,
			examples_index_range: right_range,
			key: derive_seed(key, &[1]),
		});
		pending_nodes.push(PendingNode {
			node_index: left_child_index,
			parent_index: Some(node_index),
			depth: depth + 1,
			examples_index_range: left_range,
			key: derive_seed(key, &[0]),
		});
	}

	let feature_importances = compute_feature_importances(&nodes, train_features.len());
	Ok(Tree {
		feature_names: train_features
			.iter()
			.map(|feature| feature.name.to_owned())
			.collect(),
		feature_kinds: train_features.iter().map(|feature| feature.kind).collect(),
		nodes,
		examples_index,
		feature_importances,
	})
}

fn new_leaf(
	parent_index: Option<usize>,
	depth: usize,
	examples_index_range: Range<usize>,
	examples_index: &[usize],
	labels: &[f32],
) -> Node {
	let node_examples_index = &examples_index[examples_index_range.clone()];
	let sum = node_examples_index
		.iter()
		.map(|example_index| labels[*example_index] as f64)
		.sum::<f64>();
	let value = (sum / node_examples_index.len().max(1) as f64) as f32;
	Node::Leaf(LeafNode {
		parent_index,
		depth,
		value,
		examples_index_range,
	})
}
