use ctree_metrics::{RegressionMetrics, RegressionMetricsInput, StreamingMetric};
use serde::{Deserialize, Serialize};

/// The metric computed on each validation fold to score a set of hyperparameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum TuneMetric {
	#[serde(rename = "rmse")]
	RootMeanSquaredError,
	#[serde(rename = "mse")]
	MeanSquaredError,
	#[serde(rename = "mae")]
	MeanAbsoluteError,
	#[serde(rename = "r2")]
	R2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MetricDirection {
	LowerIsBetter,
	HigherIsBetter,
}

impl TuneMetric {
	pub fn direction(self) -> MetricDirection {
		match self {
			TuneMetric::RootMeanSquaredError
			| TuneMetric::MeanSquaredError
			| TuneMetric::MeanAbsoluteError => MetricDirection::LowerIsBetter,
			TuneMetric::R2 => MetricDirection::HigherIsBetter,
		}
	}

	pub fn compute(self, predictions: &[f32], labels: &[f32]) -> f64 {
		let mut metrics = RegressionMetrics::new();
		metrics.update(RegressionMetricsInput {
			predictions,
			labels,
		});
		let metrics = metrics.finalize();
		let value = match self {
			TuneMetric::RootMeanSquaredError => metrics.rmse,
			TuneMetric::MeanSquaredError => metrics.mse,
			TuneMetric::MeanAbsoluteError => metrics.mae,
			TuneMetric::R2 => metrics.r2,
		};
		f64::from(value)
	}
}

impl std::fmt::Display for TuneMetric {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			TuneMetric::RootMeanSquaredError => "Root Mean Squared Error",
			TuneMetric::MeanSquaredError => "Mean Squared Error",
			TuneMetric::MeanAbsoluteError => "Mean Absolute Error",
			TuneMetric::R2 => "R2",
		};
		write!(f, "{}", s)
	}
}

impl MetricDirection {
	/// Map a metric value to an objective where lower is always better. A `NaN` value is the worst possible objective.
	pub fn objective(self, value: f64) -> f64 {
		if value.is_nan() {
			return f64::INFINITY;
		}
		match self {
			MetricDirection::LowerIsBetter => value,
			MetricDirection::HigherIsBetter => -value,
		}
	}
}

#[test]
fn test_metric_objective() {
	let predictions = [1.0, 2.0, 3.0, 3.0];
	let labels = [1.0, 1.0, 3.0, 3.0];
	assert_eq!(TuneMetric::MeanSquaredError.compute(&predictions, &labels), 0.25);
	assert_eq!(TuneMetric::RootMeanSquaredError.compute(&predictions, &labels), 0.5);
	assert_eq!(TuneMetric::R2.compute(&predictions, &labels), 0.75);
	let direction = TuneMetric::R2.direction();
	assert_eq!(direction, MetricDirection::HigherIsBetter);
	assert!(direction.objective(0.9) < direction.objective(0.5));
	assert_eq!(direction.objective(f64::NAN), f64::INFINITY);
	assert_eq!(TuneMetric::MeanAbsoluteError.direction().objective(0.5), 0.5);
}
