use crate::Node;

/// This function computes feature importances using the "gain" method, where a feature's importance is the total reduction in squared error of the branches that split on it. The importances are normalized to sum to 1 unless the tree has no branches, in which case they are all 0.
pub fn compute_feature_importances(nodes: &[Node], n_features: usize) -> Vec<f32> {
	let mut feature_importances = vec![0.0f64; n_features];
	for node in nodes.iter() {
		if let Node::Branch(branch) = node {
			feature_importances[branch.split.feature_index()] += branch.gain;
		}
	}
	let total = feature_importances.iter().sum::<f64>();
	feature_importances
		.into_iter()
		.map(|feature_importance| {
			if total > 0.0 {
				(feature_importance / total) as f32
			} else {
				0.0
			}
		})
		.collect()
}
