use crate::SearchHistory;
use ctree_tree::Hyperparameters;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How the final configuration is chosen from a search history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum SelectionRule {
	/// The configuration with the best mean.
	#[serde(rename = "best")]
	Best,
	/// The simplest configuration whose mean is within one standard error of the best mean.
	#[serde(rename = "one_standard_error")]
	OneStandardError,
}

/// Orders configurations by how simple the models they produce are.
pub trait Parsimony {
	/// `Ordering::Less` means `self` is simpler than `other`.
	fn simplicity_cmp(&self, other: &Self) -> Ordering;
}

impl Parsimony for Hyperparameters {
	/// Shallower trees are simpler, then trees with a higher `min_criterion`, then trees with a larger `min_node_size`.
	fn simplicity_cmp(&self, other: &Self) -> Ordering {
		self.max_depth()
			.cmp(&other.max_depth())
			.then_with(|| {
				other
					.min_criterion()
					.partial_cmp(&self.min_criterion())
					.unwrap_or(Ordering::Equal)
			})
			.then_with(|| other.min_node_size().cmp(&self.min_node_size()))
	}
}

/// The index of the entry with the best objective. Ties go to the earliest entry.
pub fn select_best<C>(history: &SearchHistory<C>) -> Option<usize> {
	let mut best: Option<usize> = None;
	for (index, entry) in history.entries.iter().enumerate() {
		match best {
			Some(best_index) if history.entries[best_index].objective <= entry.objective => {}
			_ => best = Some(index),
		}
	}
	best
}

/**
The index of the simplest entry whose objective is within one standard error of the best objective, where the standard error is that of the best entry. Ties in simplicity go to the earliest entry.
*/
pub fn select_within_one_standard_error<C: Parsimony>(history: &SearchHistory<C>) -> Option<usize> {
	let best_index = select_best(history)?;
	let best = &history.entries[best_index];
	let threshold = best.objective + best.standard_error;
	let mut selected = best_index;
	for (index, entry) in history.entries.iter().enumerate() {
		if entry.objective > threshold {
			continue;
		}
		let selected_config = &history.entries[selected].config;
		let ordering = entry.config.simplicity_cmp(selected_config);
		if ordering == Ordering::Less || (ordering == Ordering::Equal && index < selected) {
			selected = index;
		}
	}
	Some(selected)
}

#[cfg(test)]
fn history(entries: &[(usize, f64, usize, f64, f64)]) -> SearchHistory<Hyperparameters> {
	let entries: Vec<_> = entries
		.iter()
		.enumerate()
		.map(
			|(iteration, (max_depth, min_criterion, min_node_size, mean, standard_error))| {
				crate::SearchHistoryEntry {
					iteration,
					config: Hyperparameters::new(*max_depth, *min_criterion, *min_node_size)
						.unwrap(),
					fold_metrics: vec![],
					mean: *mean,
					standard_error: *standard_error,
					objective: *mean,
					accepted: true,
					temperature: 1.0,
					best_objective: 0.0,
				}
			},
		)
		.collect();
	SearchHistory {
		entries,
		best_index: 0,
	}
}

#[test]
fn test_select_within_one_standard_error() {
	let history = history(&[
		(6, 0.95, 5, 2.0, 0.3),
		(3, 0.95, 5, 1.8, 0.3),
		(2, 0.95, 5, 2.05, 0.2),
		(1, 0.95, 5, 2.2, 0.1),
		(2, 0.99, 5, 2.08, 0.1),
	]);
	assert_eq!(select_best(&history), Some(1));
	// The band is [1.5, 2.1]. Depth 2 is the shallowest inside it and the higher criterion wins.
	let selected = select_within_one_standard_error(&history).unwrap();
	assert_eq!(selected, 4);
	let best = &history.entries[1];
	let entry = &history.entries[selected];
	assert!(entry.mean >= best.mean - best.standard_error);
	assert!(entry.mean <= best.mean + best.standard_error);
	assert!(entry.config.max_depth() <= best.config.max_depth());
}

#[test]
fn test_select_ties_go_to_earliest() {
	let history = history(&[
		(4, 0.9, 5, 1.0, 0.0),
		(2, 0.9, 5, 1.0, 0.0),
		(2, 0.9, 5, 1.0, 0.0),
	]);
	assert_eq!(select_best(&history), Some(0));
	assert_eq!(select_within_one_standard_error(&history), Some(1));
	let empty = SearchHistory::<Hyperparameters> {
		entries: vec![],
		best_index: 0,
	};
	assert_eq!(select_within_one_standard_error(&empty), None);
}

#[test]
fn test_parsimony_order() {
	let simple = Hyperparameters::new(2, 0.99, 10).unwrap();
	let deeper = Hyperparameters::new(3, 0.99, 10).unwrap();
	let looser = Hyperparameters::new(2, 0.9, 10).unwrap();
	let smaller_nodes = Hyperparameters::new(2, 0.99, 5).unwrap();
	assert_eq!(simple.simplicity_cmp(&deeper), Ordering::Less);
	assert_eq!(simple.simplicity_cmp(&looser), Ordering::Less);
	assert_eq!(simple.simplicity_cmp(&smaller_nodes), Ordering::Less);
	assert_eq!(simple.simplicity_cmp(&simple), Ordering::Equal);
}
