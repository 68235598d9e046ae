/*!
This crate chooses hyperparameters for conditional inference trees.

Every candidate configuration is scored by k-fold cross validation. Simulated annealing walks the search space, and the configuration that is finally used is either the one with the best mean validation metric or, by default, the simplest one whose mean is within one standard error of the best.

```
use ctree_dataframe::synthetic;
use ctree_tune::{tune, AnnealOptions, TuneOptions};

let dataset = synthetic::linear_with_noise(150, 1.0, 0);
let options = TuneOptions {
	n_folds: 3,
	anneal_options: AnnealOptions {
		max_iters: 4,
		..Default::default()
	},
	..Default::default()
};
let output = tune(
	&dataset.features.view(),
	&dataset.labels.view(),
	&options,
	&mut |_| {},
)
.unwrap();
assert!(output.history.entries.len() <= 4);
```
*/

#![allow(clippy::tabs_in_doc_comments)]

mod anneal;
pub mod config;
mod cross_validate;
mod error;
mod metric;
mod resample;
mod search_space;
mod select;
mod tune;

pub use self::anneal::{search, AnnealOptions, SearchHistory, SearchHistoryEntry, SearchState};
pub use self::cross_validate::{CrossValidation, Evaluation};
pub use self::error::{ConfigError, ResampleError, TuneError};
pub use self::metric::{MetricDirection, TuneMetric};
pub use self::resample::{make_folds, Fold};
pub use self::search_space::{FloatRange, IntegerRange, SearchSpace};
pub use self::select::{select_best, select_within_one_standard_error, Parsimony, SelectionRule};
pub use self::tune::{tune, Stratification, TuneOptions, TuneProgress, TuneOutput};
