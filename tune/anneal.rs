/*!
Simulated annealing over a noisy objective. Each configuration is scored by a caller supplied function, usually a cross validation, and the search walks from the current configuration to a random neighbor, always accepting improvements and accepting degradations with a probability that shrinks as the temperature cools.
*/

use crate::{ConfigError, Evaluation, MetricDirection};
use ctree_util::derive_seed;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub struct AnnealOptions {
	/// The most configurations that will be evaluated, including the initial one.
	pub max_iters: usize,
	/// The temperature at iteration 0. Degradations are measured relative to the current objective, so this is on the scale of a fractional change.
	pub initial_temperature: f64,
	/// The temperature at iteration `i` is `initial_temperature * cooling_rate^i`.
	pub cooling_rate: f64,
	/// If set, the search stops after this many consecutive iterations without a new best configuration.
	pub patience: Option<usize>,
	pub seed: u64,
}

impl Default for AnnealOptions {
	fn default() -> Self {
		Self {
			max_iters: 50,
			initial_temperature: 0.1,
			cooling_rate: 0.9,
			patience: None,
			seed: 0,
		}
	}
}

impl AnnealOptions {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_iters == 0 {
			return Err(ConfigError::NoIterations);
		}
		if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
			return Err(ConfigError::InitialTemperature(self.initial_temperature));
		}
		if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
			return Err(ConfigError::CoolingRate(self.cooling_rate));
		}
		if self.patience == Some(0) {
			return Err(ConfigError::Patience);
		}
		Ok(())
	}
}

/// The state of the search after an iteration. A new value is produced by every iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchState<C> {
	pub current_config: C,
	pub current_objective: f64,
	pub best_config: C,
	pub best_objective: f64,
	pub iteration: usize,
	pub temperature: f64,
	pub iterations_since_improvement: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHistoryEntry<C> {
	pub iteration: usize,
	pub config: C,
	pub fold_metrics: Vec<f64>,
	pub mean: f64,
	pub standard_error: f64,
	/// The mean mapped so that lower is better.
	pub objective: f64,
	pub accepted: bool,
	pub temperature: f64,
	/// The best objective seen up to and including this iteration.
	pub best_objective: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHistory<C> {
	/// One entry per evaluated configuration, in iteration order.
	pub entries: Vec<SearchHistoryEntry<C>>,
	/// The index in `entries` of the configuration with the best objective. Ties go to the earliest.
	pub best_index: usize,
}

impl<C> SearchHistory<C> {
	pub fn best(&self) -> &SearchHistoryEntry<C> {
		&self.entries[self.best_index]
	}
}

/**
Run simulated annealing starting from `initial_config`.

Iteration 0 scores `initial_config`. Each later iteration `i` draws a candidate from `neighbor_fn(&current, radius, rng)` with `radius = (max_iters - i) / max_iters`, so steps shrink as the search proceeds, and scores it with `score_fn(&candidate, i)`. A candidate that improves on the current objective is accepted. A worse one is accepted with probability `exp(-degradation / temperature)`, where the degradation is relative to the magnitude of the current objective, or absolute when that is 0. The random stream of iteration `i` is seeded from `options.seed` and `i`, so the search is reproducible.
*/
pub fn search<C, E, S, N>(
	mut score_fn: S,
	initial_config: C,
	mut neighbor_fn: N,
	direction: MetricDirection,
	options: &AnnealOptions,
) -> Result<SearchHistory<C>, E>
where
	C: Clone,
	E: From<ConfigError>,
	S: FnMut(&C, usize) -> Result<Evaluation, E>,
	N: FnMut(&C, f64, &mut Xoshiro256Plus) -> Result<C, E>,
{
	options.validate()?;
	let evaluation = score_fn(&initial_config, 0)?;
	let objective = direction.objective(evaluation.mean);
	let mut state = SearchState {
		current_config: initial_config.clone(),
		current_objective: objective,
		best_config: initial_config.clone(),
		best_objective: objective,
		iteration: 0,
		temperature: options.initial_temperature,
		iterations_since_improvement: 0,
	};
	let mut entries = vec![history_entry(
		0,
		initial_config,
		evaluation,
		objective,
		true,
		options.initial_temperature,
		objective,
	)];
	let mut best_index = 0;
	for iteration in 1..options.max_iters {
		if let Some(patience) = options.patience {
			if state.iterations_since_improvement >= patience {
				log::info!(
					"stopping the search after {} iterations without improvement",
					patience
				);
				break;
			}
		}
		let mut rng = Xoshiro256Plus::seed_from_u64(derive_seed(options.seed, &[iteration as u64]));
		let radius = (options.max_iters - iteration) as f64 / options.max_iters as f64;
		let temperature = options.initial_temperature * options.cooling_rate.powi(iteration as i32);
		let candidate = neighbor_fn(&state.current_config, radius, &mut rng)?;
		let evaluation = score_fn(&candidate, iteration)?;
		let objective = direction.objective(evaluation.mean);
		let accepted = if objective < state.current_objective {
			true
		} else {
			let degradation = relative_degradation(objective, state.current_objective);
			rng.gen::<f64>() < (-degradation / temperature).exp()
		};
		let improved = accepted && objective < state.best_objective;
		log::info!(
			"iteration {}: mean {} ({} the current configuration)",
			iteration,
			evaluation.mean,
			if accepted { "replaces" } else { "does not replace" }
		);
		state = SearchState {
			current_config: if accepted {
				candidate.clone()
			} else {
				state.current_config
			},
			current_objective: if accepted {
				objective
			} else {
				state.current_objective
			},
			best_config: if improved {
				candidate.clone()
			} else {
				state.best_config
			},
			best_objective: if improved {
				objective
			} else {
				state.best_objective
			},
			iteration,
			temperature,
			iterations_since_improvement: if improved {
				0
			} else {
				state.iterations_since_improvement + 1
			},
		};
		if improved {
			best_index = entries.len();
		}
		entries.push(history_entry(
			iteration,
			candidate,
			evaluation,
			objective,
			accepted,
			temperature,
			state.best_objective,
		));
	}
	Ok(SearchHistory {
		entries,
		best_index,
	})
}

fn relative_degradation(objective: f64, current_objective: f64) -> f64 {
	let difference = objective - current_objective;
	if current_objective == 0.0 {
		difference
	} else {
		difference / current_objective.abs()
	}
}

fn history_entry<C>(
	iteration: usize,
	config: C,
	evaluation: Evaluation,
	objective: f64,
	accepted: bool,
	temperature: f64,
	best_objective: f64,
) -> SearchHistoryEntry<C> {
	SearchHistoryEntry {
		iteration,
		config,
		fold_metrics: evaluation.fold_metrics,
		mean: evaluation.mean,
		standard_error: evaluation.standard_error,
		objective,
		accepted,
		temperature,
		best_objective,
	}
}

#[cfg(test)]
fn convex_search(options: &AnnealOptions) -> SearchHistory<(i64, i64)> {
	// A bowl with its minimum at (3, -2), explored by unit steps.
	let score_fn = |config: &(i64, i64), _iteration: usize| -> Result<Evaluation, ConfigError> {
		let (x, y) = *config;
		let value = ((x - 3) * (x - 3) + (y + 2) * (y + 2)) as f64 + 1.0;
		Ok(Evaluation::from_fold_metrics(vec![value]))
	};
	let neighbor_fn = |config: &(i64, i64), _radius: f64, rng: &mut Xoshiro256Plus| {
		let (x, y) = *config;
		let step = if rng.gen::<bool>() { 1 } else { -1 };
		if rng.gen::<bool>() {
			Ok((x + step, y))
		} else {
			Ok((x, y + step))
		}
	};
	search(
		score_fn,
		(-5, 6),
		neighbor_fn,
		MetricDirection::LowerIsBetter,
		options,
	)
	.unwrap()
}

#[test]
fn test_search_on_convex_objective() {
	let options = AnnealOptions {
		max_iters: 200,
		initial_temperature: 0.05,
		cooling_rate: 0.95,
		patience: None,
		seed: 7,
	};
	let history = convex_search(&options);
	assert!(history.entries.len() <= options.max_iters);
	assert_eq!(history.entries[0].config, (-5, 6));
	for window in history.entries.windows(2) {
		assert!(window[1].best_objective <= window[0].best_objective);
		assert_eq!(window[1].iteration, window[0].iteration + 1);
	}
	// The start is at objective 129 and the minimum is 1.
	let best = history.best();
	assert!(best.objective < 20.0);
	assert_eq!(best.objective, history.entries.last().unwrap().best_objective);
	assert_eq!(history, convex_search(&options));
}

#[test]
fn test_search_patience() {
	let options = AnnealOptions {
		max_iters: 100,
		patience: Some(3),
		..Default::default()
	};
	// A flat objective never improves, so the search stops after 3 more iterations.
	let history: SearchHistory<u32> = search(
		|_: &u32, _| Ok::<_, ConfigError>(Evaluation::from_fold_metrics(vec![1.0])),
		0,
		|config: &u32, _, _: &mut Xoshiro256Plus| Ok(config + 1),
		MetricDirection::LowerIsBetter,
		&options,
	)
	.unwrap();
	assert_eq!(history.entries.len(), 4);
	assert_eq!(history.best_index, 0);
	assert!(history.entries.iter().all(|entry| entry.accepted));
}

#[test]
fn test_search_options_validation() {
	let options = AnnealOptions {
		cooling_rate: 1.5,
		..Default::default()
	};
	let result: Result<SearchHistory<u32>, ConfigError> = search(
		|_: &u32, _| Ok(Evaluation::from_fold_metrics(vec![1.0])),
		0,
		|config: &u32, _, _: &mut Xoshiro256Plus| Ok(*config),
		MetricDirection::LowerIsBetter,
		&options,
	);
	assert_eq!(result, Err(ConfigError::CoolingRate(1.5)));
}
