use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ctree_dataframe::synthetic;
use ctree_metrics::StreamingMetric;
use ctree_tune::{config::Config, tune, TuneOptions, TuneProgress};
use ndarray::prelude::*;
use serde_json::json;
use std::{path::PathBuf, str::FromStr};

#[derive(Parser, Debug)]
#[clap(about = "tune a conditional inference tree on a synthetic dataset")]
struct Options {
	#[clap(long, default_value = "linear", help = "the dataset to generate, linear or mixed")]
	dataset: Dataset,
	#[clap(long, default_value = "1000", help = "the number of training examples")]
	n_examples: usize,
	#[clap(long, default_value = "1.0", help = "the scale of the noise added to the labels")]
	noise: f32,
	#[clap(long, default_value = "0")]
	seed: u64,
	#[clap(short, long, help = "the path to a json config file")]
	config: Option<PathBuf>,
	#[clap(long, help = "override the number of search iterations")]
	max_iters: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
enum Dataset {
	Linear,
	Mixed,
}

impl FromStr for Dataset {
	type Err = String;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"linear" => Ok(Dataset::Linear),
			"mixed" => Ok(Dataset::Mixed),
			_ => Err(format!("unknown dataset {:?}", s)),
		}
	}
}

fn main() -> Result<()> {
	let env = env_logger::Env::default().default_filter_or("info");
	env_logger::from_env(env)
		.format_level(false)
		.format_module_path(false)
		.format_timestamp(None)
		.init();
	let options = Options::parse();

	// Generate the data. The test set uses a different seed so it is independent of the training set.
	let n_examples_test = (options.n_examples / 4).max(1);
	let generate = |n_examples, seed| match options.dataset {
		Dataset::Linear => synthetic::linear_with_noise(n_examples, options.noise, seed),
		Dataset::Mixed => synthetic::mixed(n_examples, options.noise, seed),
	};
	let train = generate(options.n_examples, options.seed);
	let test = generate(n_examples_test, options.seed.wrapping_add(1));

	// Load the tuning options.
	let mut tune_options = match &options.config {
		Some(path) => Config::from_path(path)
			.with_context(|| format!("failed to load the config from {}", path.display()))?
			.to_options()?,
		None => TuneOptions {
			seed: options.seed,
			..Default::default()
		},
	};
	if let Some(max_iters) = options.max_iters {
		tune_options.anneal_options.max_iters = max_iters;
	}

	// Tune.
	let start = std::time::Instant::now();
	let output = tune(
		&train.features.view(),
		&train.labels.view(),
		&tune_options,
		&mut |progress| match progress {
			TuneProgress::Searching(counter) => {
				log::info!("evaluating up to {} configurations", counter.total())
			}
			TuneProgress::TrainingFinalTree => log::info!("training the final tree"),
		},
	)?;
	let duration = start.elapsed();

	// Make predictions on the test data.
	let rows = test.features.to_rows();
	let mut predictions = Array::zeros(test.labels.data.len());
	output
		.tree
		.predict_rows(rows.view(), predictions.view_mut())?;

	// Compute metrics.
	let mut metrics = ctree_metrics::RegressionMetrics::new();
	metrics.update(ctree_metrics::RegressionMetricsInput {
		predictions: predictions
			.as_slice()
			.ok_or_else(|| anyhow!("predictions are not contiguous"))?,
		labels: &test.labels.data,
	});
	let metrics = metrics.finalize();
	let selected = &output.history.entries[output.selected_index];
	let output = json!({
		"duration_ms": duration.as_millis() as u64,
		"n_evaluations": output.history.entries.len(),
		"selected_iteration": selected.iteration,
		"hyperparameters": output.hyperparameters,
		"cross_validation": {
			"metric": tune_options.metric,
			"mean": selected.mean,
			"standard_error": selected.standard_error,
		},
		"n_leaves": output.tree.n_leaves(),
		"depth": output.tree.depth(),
		"variable_importance": output.tree.variable_importance(),
		"test": {
			"mse": metrics.mse,
			"rmse": metrics.rmse,
			"mae": metrics.mae,
			"r2": metrics.r2,
			"baseline_rmse": metrics.baseline_rmse,
		},
	});
	println!("{}", output);
	Ok(())
}
