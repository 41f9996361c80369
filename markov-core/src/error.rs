//! Error type shared by every fallible operation of the chain.

/// Errors returned by rows, models and the builders around them.
///
/// All variants are recoverable by the caller except [`MarkovError::Internal`],
/// which signals a broken cumulative table and should never be observed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkovError {
	/// Returned when a sampling value lies outside `[0, 1]` (or is NaN).
	#[error("sampling value {p} is outside [0, 1]")]
	OutOfRange {
		/// The rejected sampling value.
		p: f64,
	},

	/// Returned when walking a row that holds no observation.
	#[error("cannot walk a row without observations")]
	EmptyRow,

	/// Returned when the cursor is moved to a state with no outgoing transition.
	#[error("unknown start state: {state}")]
	UnknownStartState {
		/// Display value of the rejected state.
		state: String,
	},

	/// Returned when the cumulative table does not cover the sampling value.
	#[error("internal error: cumulative table exhausted for sampling value {p}")]
	Internal {
		/// The sampling value that matched no cutoff.
		p: f64,
	},

	/// Returned when a non fixed-width value is fed to a `UintModel`.
	#[error("cannot call add_data with type {type_name} on a UintModel")]
	TypeMismatch {
		/// Concrete type of the rejected value.
		type_name: &'static str,
	},

	/// Returned when merging would push a row past `u32::MAX` observations.
	#[error("merging {incoming} observations into a row holding {held} overflows its counter")]
	CounterOverflow {
		/// Observations already held by the row.
		held: u32,
		/// Observations of the row being merged in.
		incoming: u32,
	},

	/// Returned when a builder worker exits without producing its partial model.
	#[error("a builder worker stopped before sending its partial model")]
	WorkerFailed,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_out_of_range() {
		let e = MarkovError::OutOfRange { p: 1.5 };
		assert_eq!(e.to_string(), "sampling value 1.5 is outside [0, 1]");
	}

	#[test]
	fn error_unknown_start_state() {
		let e = MarkovError::UnknownStartState { state: "42".to_owned() };
		assert_eq!(e.to_string(), "unknown start state: 42");
	}

	#[test]
	fn error_type_mismatch() {
		let e = MarkovError::TypeMismatch { type_name: "&str" };
		assert_eq!(e.to_string(), "cannot call add_data with type &str on a UintModel");
	}

	#[test]
	fn error_counter_overflow() {
		let e = MarkovError::CounterOverflow { held: u32::MAX, incoming: 2 };
		assert_eq!(e.to_string(), "merging 2 observations into a row holding 4294967295 overflows its counter");
	}

	#[test]
	fn error_is_std_error() {
		fn assert_impl<T: std::error::Error>() {}
		assert_impl::<MarkovError>();
	}

	#[test]
	fn error_is_send_and_sync() {
		fn assert_impl<T: Send + Sync>() {}
		assert_impl::<MarkovError>();
	}
}
