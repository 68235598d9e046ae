use super::{MeanVariance, StreamingMetric};
use num_traits::ToPrimitive;

/// `RegressionMetrics` computes the common regression metrics for a set of predictions against their labels.
#[derive(Debug, Clone, Default)]
pub struct RegressionMetrics {
	labels: MeanVariance,
	absolute_error: f64,
	squared_error: f64,
}

pub struct RegressionMetricsInput<'a> {
	pub predictions: &'a [f32],
	pub labels: &'a [f32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionMetricsOutput {
	/// The mean squared error.
	pub mse: f32,
	/// The root mean squared error.
	pub rmse: f32,
	/// The mean absolute error.
	pub mae: f32,
	/// The coefficient of determination.
	pub r2: f32,
	/// The mean squared error of always predicting the mean of the labels.
	pub baseline_mse: f32,
	pub baseline_rmse: f32,
}

impl RegressionMetrics {
	pub fn new() -> Self {
		Self::default()
	}
}

impl<'a> StreamingMetric<'a> for RegressionMetrics {
	type Input = RegressionMetricsInput<'a>;
	type Output = RegressionMetricsOutput;

	fn update(&mut self, input: RegressionMetricsInput<'a>) {
		for (prediction, label) in input.predictions.iter().zip(input.labels.iter()) {
			let label = f64::from(*label);
			self.labels.update(label);
			let error = f64::from(*prediction) - label;
			self.absolute_error += error.abs();
			self.squared_error += error * error;
		}
	}

	fn merge(&mut self, other: Self) {
		self.labels.merge(other.labels);
		self.absolute_error += other.absolute_error;
		self.squared_error += other.squared_error;
	}

	/// With no examples every output is NaN.
	fn finalize(self) -> Self::Output {
		let (n, baseline_mse) = match self.labels.finalize() {
			Some(labels) => {
				let n = labels.n.to_f64().unwrap_or(f64::NAN);
				// The baseline is scored on the same labels, so it uses the population variance.
				(n, labels.variance * (n - 1.0) / n)
			}
			None => (0.0, f64::NAN),
		};
		let mse = self.squared_error / n;
		RegressionMetricsOutput {
			mse: mse as f32,
			rmse: mse.sqrt() as f32,
			mae: (self.absolute_error / n) as f32,
			r2: (1.0 - mse / baseline_mse) as f32,
			baseline_mse: baseline_mse as f32,
			baseline_rmse: baseline_mse.sqrt() as f32,
		}
	}
}

#[test]
fn test_regression_metrics() {
	let mut metrics = RegressionMetrics::new();
	metrics.update(RegressionMetricsInput {
		predictions: &[1.0, 2.0],
		labels: &[1.0, 1.0],
	});
	let mut other = RegressionMetrics::new();
	other.update(RegressionMetricsInput {
		predictions: &[3.0, 3.0],
		labels: &[3.0, 3.0],
	});
	metrics.merge(other);
	let metrics = metrics.finalize();
	insta::assert_debug_snapshot!(metrics, @r###"
 RegressionMetricsOutput {
     mse: 0.25,
     rmse: 0.5,
     mae: 0.25,
     r2: 0.75,
     baseline_mse: 1.0,
     baseline_rmse: 1.0,
 }
 "###);
}

#[test]
fn test_regression_metrics_perfect_predictions() {
	let labels = [2.0, 4.0, 9.0];
	let mut metrics = RegressionMetrics::new();
	metrics.update(RegressionMetricsInput {
		predictions: &labels,
		labels: &labels,
	});
	let metrics = metrics.finalize();
	assert_eq!(metrics.mse, 0.0);
	assert_eq!(metrics.mae, 0.0);
	assert_eq!(metrics.r2, 1.0);
}
