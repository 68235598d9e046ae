use crate::ConfigError;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrainError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("a node was asked to split zero examples")]
	EmptyNode,
	#[error("the features have {features} rows but there are {labels} labels")]
	ShapeMismatch { features: usize, labels: usize },
	#[error("there are no features to split on")]
	NoFeatures,
	#[error("there are no training examples")]
	NoExamples,
	#[error("example index {index} is out of range for a table with {n_rows} rows")]
	ExampleOutOfRange { index: usize, n_rows: usize },
	#[error("column {column:?} has a missing or non-finite value in row {row}")]
	MissingValue { column: String, row: usize },
	#[error("the label in row {row} is not finite")]
	InvalidResponse { row: usize },
	#[error("the split sent {actual} examples left where {expected} were expected")]
	PartitionMismatch { expected: usize, actual: usize },
	#[error(transparent)]
	Route(#[from] PredictError),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PredictError {
	#[error("expected {expected} feature values but got {actual}")]
	WrongNumberOfFeatures { expected: usize, actual: usize },
	#[error("feature {feature_index} has a value that its split did not see during training")]
	UnseenValue { feature_index: usize },
	#[error("feature {feature_index} expected a {expected} value")]
	ValueTypeMismatch {
		feature_index: usize,
		expected: &'static str,
	},
}
