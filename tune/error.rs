use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
	#[error("the search needs at least one iteration")]
	NoIterations,
	#[error("initial_temperature must be positive and finite but was {0}")]
	InitialTemperature(f64),
	#[error("cooling_rate must lie in (0, 1] but was {0}")]
	CoolingRate(f64),
	#[error("patience must be at least 1")]
	Patience,
	#[error("the search space for {parameter} is invalid: {reason}")]
	SearchSpace {
		parameter: &'static str,
		reason: String,
	},
	#[error("the initial hyperparameters lie outside the search space for {parameter}")]
	InitialOutsideSearchSpace { parameter: &'static str },
	#[error("there is no column named {0:?} to stratify by")]
	UnknownStratificationColumn(String),
	#[error(transparent)]
	Tree(#[from] ctree_tree::ConfigError),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ResampleError {
	#[error("cross validation needs at least 2 folds but {n_folds} were requested")]
	TooFewFolds { n_folds: usize },
	#[error("{n_folds} folds were requested but there are only {n_examples} examples")]
	TooManyFolds { n_folds: usize, n_examples: usize },
	#[error("the stratification column has {actual} values but there are {expected} examples")]
	StratificationLength { expected: usize, actual: usize },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TuneError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Resample(#[from] ResampleError),
	#[error(transparent)]
	Train(#[from] ctree_tree::TrainError),
	#[error(transparent)]
	Predict(#[from] ctree_tree::PredictError),
	#[error("fold {fold} has no validation examples")]
	EmptyValidationFold { fold: usize },
	#[error("the search history is empty")]
	EmptyHistory,
}

impl From<ctree_tree::ConfigError> for TuneError {
	fn from(error: ctree_tree::ConfigError) -> Self {
		TuneError::Config(ConfigError::Tree(error))
	}
}
