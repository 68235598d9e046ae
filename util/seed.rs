/*!
Random streams in `ctree` are never shared between parallel units. Instead each unit derives its own seed from the user's base seed and the coordinates of the unit, for example `(iteration, fold)` during tuning or `(node key, feature)` for permutation tests. The derivation is a splitmix64 mix, so the same coordinates always produce the same seed regardless of how many threads run or in what order.
*/

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

fn splitmix64(mut z: u64) -> u64 {
	z = z.wrapping_add(GOLDEN_GAMMA);
	z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
	z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
	z ^ (z >> 31)
}

/// Derive the seed for the random stream identified by `stream` from the base `seed`.
pub fn derive_seed(seed: u64, stream: &[u64]) -> u64 {
	stream
		.iter()
		.fold(splitmix64(seed), |state, coordinate| {
			splitmix64(state ^ splitmix64(*coordinate))
		})
}

#[test]
fn test_derive_seed_is_deterministic() {
	assert_eq!(derive_seed(42, &[1, 2]), derive_seed(42, &[1, 2]));
}

#[test]
fn test_derive_seed_separates_streams() {
	let seeds = vec![
		derive_seed(42, &[]),
		derive_seed(42, &[0]),
		derive_seed(42, &[1]),
		derive_seed(42, &[0, 1]),
		derive_seed(42, &[1, 0]),
		derive_seed(43, &[0, 1]),
	];
	for (i, a) in seeds.iter().enumerate() {
		for b in seeds.iter().skip(i + 1) {
			assert_ne!(a, b);
		}
	}
}
