/*!
This crate holds the small pieces shared by the other `ctree` crates: the `Finite` float wrapper used to sort feature values, the `ProgressCounter` handed to progress callbacks, deterministic seed derivation for parallel random streams, and the `pzip!` macro.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod finite;
pub mod progress_counter;
pub mod seed;

pub use self::finite::{Finite, NotFiniteError};
pub use self::progress_counter::ProgressCounter;
pub use self::seed::derive_seed;

/// Zip any number of parallel iterators, yielding tuples.
#[macro_export]
macro_rules! pzip {
	($($e:expr),* $(,)*) => {
		rayon::iter::IntoParallelIterator::into_par_iter(($($e,)*))
	};
}
