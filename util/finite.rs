use num_traits::Float;
use std::cmp::Ordering;
use thiserror::Error;

/// A float that is neither infinite nor `NaN`, and is therefore totally ordered.
#[derive(Clone, Copy, Debug)]
pub struct Finite<T: Float>(T);

#[derive(Debug, Error, PartialEq)]
#[error("the value is not finite")]
pub struct NotFiniteError;

impl<T: Float> Finite<T> {
	pub fn new(value: T) -> Result<Self, NotFiniteError> {
		if value.is_finite() {
			Ok(Self(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

impl<T: Float> PartialEq for Finite<T> {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl<T: Float> Eq for Finite<T> {}

impl<T: Float> PartialOrd for Finite<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl<T: Float> Ord for Finite<T> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
	}
}

#[test]
fn test_finite() {
	assert_eq!(Finite::new(f32::NAN).err(), Some(NotFiniteError));
	assert_eq!(Finite::new(f64::INFINITY).err(), Some(NotFiniteError));
	let mut values: Vec<Finite<f32>> = [3.0, -1.0, 2.5, 0.0]
		.iter()
		.map(|value| Finite::new(*value).unwrap())
		.collect();
	values.sort();
	let values: Vec<f32> = values.into_iter().map(Finite::get).collect();
	assert_eq!(values, vec![-1.0, 0.0, 2.5, 3.0]);
}
