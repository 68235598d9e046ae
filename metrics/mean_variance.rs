//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

use super::StreamingMetric;
use num_traits::ToPrimitive;

/// Combine two separately computed means and sums of squared deviations (`m2`) into a single mean and `m2`.
pub fn merge_mean_m2(
	n_a: u64,
	mean_a: f64,
	m2_a: f64,
	n_b: u64,
	mean_b: f64,
	m2_b: f64,
) -> (f64, f64) {
	let n_a = n_a as f64;
	let n_b = n_b as f64;
	(
		(((n_a * mean_a) + (n_b * mean_b)) / (n_a + n_b)),
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (n_a * n_b / (n_a + n_b)),
	)
}

/// The population variance for a sum of squared deviations `m2` over `n` values.
pub fn m2_to_variance(m2: f64, n: u64) -> f64 {
	m2 / n as f64
}

/// Streams values into a count, mean and sum of squared deviations using Welford's update, so partial results from different threads can be merged exactly.
#[derive(Debug, Clone, Default)]
pub struct MeanVariance {
	n: u64,
	mean: f64,
	m2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanVarianceOutput {
	pub n: u64,
	pub mean: f64,
	/// The sample variance, with `n - 1` in the denominator. This is 0 when `n < 2`.
	pub variance: f64,
	/// The standard error of the mean, `sqrt(variance / n)`.
	pub standard_error: f64,
}

impl StreamingMetric<'_> for MeanVariance {
	type Input = f64;
	type Output = Option<MeanVarianceOutput>;

	fn update(&mut self, value: f64) {
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, 1, value, 0.0);
		self.n += 1;
		self.mean = mean;
		self.m2 = m2;
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		if self.n == 0 {
			*self = other;
			return;
		}
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, other.n, other.mean, other.m2);
		self.n += other.n;
		self.mean = mean;
		self.m2 = m2;
	}

	fn finalize(self) -> Self::Output {
		if self.n == 0 {
			return None;
		}
		let n = self.n.to_f64()?;
		let variance = if self.n < 2 {
			0.0
		} else {
			self.m2 / (n - 1.0)
		};
		Some(MeanVarianceOutput {
			n: self.n,
			mean: self.mean,
			variance,
			standard_error: (variance / n).sqrt(),
		})
	}
}

#[test]
fn test_merge_mean_m2() {
	// [1, 2] and [3, 4, 5]
	let (mean, m2) = merge_mean_m2(2, 1.5, 0.5, 3, 4.0, 2.0);
	assert!((mean - 3.0).abs() < 1e-12);
	assert!((m2 - 10.0).abs() < 1e-12);
	assert!((m2_to_variance(m2, 5) - 2.0).abs() < 1e-12);
}

#[test]
fn test_mean_variance() {
	let mut a = MeanVariance::default();
	a.update(2.0);
	a.update(4.0);
	let mut b = MeanVariance::default();
	b.update(4.0);
	b.update(6.0);
	a.merge(b);
	let output = a.finalize().unwrap();
	assert_eq!(output.n, 4);
	assert!((output.mean - 4.0).abs() < 1e-12);
	// Sample variance of [2, 4, 4, 6] is 8 / 3.
	assert!((output.variance - 8.0 / 3.0).abs() < 1e-12);
	assert!((output.standard_error - (8.0f64 / 3.0 / 4.0).sqrt()).abs() < 1e-12);
}

#[test]
fn test_mean_variance_single_value() {
	let mut metric = MeanVariance::default();
	assert_eq!(metric.clone().finalize(), None);
	metric.update(3.5);
	assert_eq!(
		metric.finalize(),
		Some(MeanVarianceOutput {
			n: 1,
			mean: 3.5,
			variance: 0.0,
			standard_error: 0.0,
		})
	);
}
