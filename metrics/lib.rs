/*!
Streaming metrics for scoring regression trees. [`RegressionMetrics`](struct.RegressionMetrics.html) computes MSE, RMSE, MAE and R² for a validation fold, and [`MeanVariance`](struct.MeanVariance.html) summarizes the per-fold scores into a mean and a standard error.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod mean_variance;
mod regression;

pub use self::mean_variance::{m2_to_variance, merge_mean_m2, MeanVariance, MeanVarianceOutput};
pub use self::regression::{RegressionMetrics, RegressionMetricsInput, RegressionMetricsOutput};

/**
A metric that is accumulated chunk by chunk.

Call `update()` with each chunk of input. Partial results computed independently, for example on separate threads, are combined with `merge()`, and `finalize()` produces the output.

```
use ctree_metrics::StreamingMetric;

#[derive(Default)]
struct Count(usize);

impl StreamingMetric<'_> for Count {
	type Input = &'static [f32];
	type Output = usize;
	fn update(&mut self, input: Self::Input) {
		self.0 += input.len()
	}
	fn merge(&mut self, other: Self) {
		self.0 += other.0
	}
	fn finalize(self) -> Self::Output {
		self.0
	}
}

let mut count = Count::default();
count.update(&[1.0, 2.0]);
let mut other = Count::default();
other.update(&[3.0]);
count.merge(other);
assert_eq!(count.finalize(), 3);
```
*/
pub trait StreamingMetric<'a> {
	type Input;
	type Output;
	fn update(&mut self, input: Self::Input);
	fn merge(&mut self, other: Self);
	fn finalize(self) -> Self::Output;
}
