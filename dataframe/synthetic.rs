/*!
Seeded synthetic datasets with known structure. They back the statistical tests of the tree and tuning crates and the synthetic benchmark.
*/

use crate::{Column, ColumnType, DataFrame, NumberColumn};
#[cfg(test)]
use itertools::izip;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::num::NonZeroUsize;

/// A feature table together with its response column.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
	pub features: DataFrame,
	pub labels: NumberColumn,
}

/// Approximately normal noise with mean 0 and standard deviation 1, built from a sum of twelve uniforms.
fn standard_noise(rng: &mut Xoshiro256Plus) -> f32 {
	(0..12).map(|_| rng.gen::<f32>()).sum::<f32>() - 6.0
}

/**
Two number features `a` and `b`, both uniform on [0, 10). The response is `3 * a + noise_scale * e` where `e` is approximately standard normal, so `b` carries no information about the response.
*/
pub fn linear_with_noise(n_examples: usize, noise_scale: f32, seed: u64) -> SyntheticDataset {
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut a = Vec::with_capacity(n_examples);
	let mut b = Vec::with_capacity(n_examples);
	let mut labels = Vec::with_capacity(n_examples);
	for _ in 0..n_examples {
		let a_value = rng.gen::<f32>() * 10.0;
		let b_value = rng.gen::<f32>() * 10.0;
		let noise = standard_noise(&mut rng);
		a.push(a_value);
		b.push(b_value);
		labels.push(3.0 * a_value + noise_scale * noise);
	}
	SyntheticDataset {
		features: DataFrame {
			columns: vec![
				Column::Number(NumberColumn {
					name: "a".to_owned(),
					data: a,
				}),
				Column::Number(NumberColumn {
					name: "b".to_owned(),
					data: b,
				}),
			],
		},
		labels: NumberColumn {
			name: "y".to_owned(),
			data: labels,
		},
	}
}

/// A single number feature `x` cycling through 0, 1, ..., 9 with the response 0 for `x < 5` and 10 for `x >= 5`.
pub fn step(n_examples: usize) -> SyntheticDataset {
	let x: Vec<f32> = (0..n_examples).map(|i| (i % 10) as f32).collect();
	let labels = x
		.iter()
		.map(|x| if *x < 5.0 { 0.0 } else { 10.0 })
		.collect();
	SyntheticDataset {
		features: DataFrame {
			columns: vec![Column::Number(NumberColumn {
				name: "x".to_owned(),
				data: x,
			})],
		},
		labels: NumberColumn {
			name: "y".to_owned(),
			data: labels,
		},
	}
}

pub const COLORS: [&str; 5] = ["red", "green", "blue", "yellow", "purple"];
pub const GRADES: [&str; 4] = ["poor", "fair", "good", "excellent"];

/**
One feature of every kind. `color` is an `Enum` feature: red and blue examples get 8 added to their response. `grade` is an `Ordinal` feature adding 2 per level. `noise` is a number feature unrelated to the response.
*/
pub fn mixed(n_examples: usize, noise_scale: f32, seed: u64) -> SyntheticDataset {
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut features = DataFrame::new(
		vec!["color".to_owned(), "grade".to_owned(), "noise".to_owned()],
		vec![
			ColumnType::Enum {
				options: COLORS.iter().map(|c| (*c).to_owned()).collect(),
			},
			ColumnType::Ordinal {
				options: GRADES.iter().map(|g| (*g).to_owned()).collect(),
			},
			ColumnType::Number,
		],
	);
	let mut colors = Vec::with_capacity(n_examples);
	let mut grades = Vec::with_capacity(n_examples);
	let mut noise = Vec::with_capacity(n_examples);
	let mut labels = Vec::with_capacity(n_examples);
	for _ in 0..n_examples {
		let color = rng.gen_range(0, COLORS.len());
		let grade = rng.gen_range(0, GRADES.len());
		let color_effect = if color == 0 || color == 2 { 8.0 } else { 0.0 };
		let label = color_effect + 2.0 * grade as f32 + noise_scale * standard_noise(&mut rng);
		colors.push(NonZeroUsize::new(color + 1));
		grades.push(NonZeroUsize::new(grade + 1));
		noise.push(rng.gen::<f32>());
		labels.push(label);
	}
	for column in features.columns.iter_mut() {
		match column {
			Column::Enum(column) => column.data = colors.clone(),
			Column::Ordinal(column) => column.data = grades.clone(),
			Column::Number(column) => column.data = noise.clone(),
		}
	}
	SyntheticDataset {
		features,
		labels: NumberColumn {
			name: "y".to_owned(),
			data: labels,
		},
	}
}

#[test]
fn test_linear_with_noise_is_reproducible() {
	let a = linear_with_noise(50, 1.0, 7);
	let b = linear_with_noise(50, 1.0, 7);
	let c = linear_with_noise(50, 1.0, 8);
	assert_eq!(a.features, b.features);
	assert_eq!(a.labels, b.labels);
	assert_ne!(a.labels, c.labels);
	assert_eq!(a.features.nrows(), 50);
	assert!(a.features.columns[0]
		.as_number()
		.unwrap()
		.data
		.iter()
		.all(|v| (0.0..10.0).contains(v)));
}

#[test]
fn test_step() {
	let dataset = step(20);
	assert_eq!(dataset.labels.data[4], 0.0);
	assert_eq!(dataset.labels.data[5], 10.0);
	assert_eq!(dataset.labels.data[14], 0.0);
	assert_eq!(dataset.features.columns[0].as_number().unwrap().data[15], 5.0);
}

#[test]
fn test_mixed_columns() {
	let dataset = mixed(100, 0.0, 1);
	assert_eq!(dataset.features.ncols(), 3);
	assert_eq!(dataset.features.nrows(), 100);
	let colors = dataset.features.columns[0].as_enum().unwrap();
	let grades = dataset.features.columns[1].as_enum().unwrap();
	for (color, grade, label) in izip!(&colors.data, &grades.data, &dataset.labels.data)
	{
		let color = color.unwrap().get() - 1;
		let grade = grade.unwrap().get() - 1;
		let color_effect = if color == 0 || color == 2 { 8.0 } else { 0.0 };
		let expected = color_effect + 2.0 * grade as f32;
		assert_eq!(*label, expected);
	}
}
