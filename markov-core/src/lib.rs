//! Incremental first-order Markov chain library.
//!
//! This crate builds a Markov chain from a stream of observed states and
//! provides:
//! - Frequency counting with on-demand normalized weights
//! - Weighted sampling from caller-supplied values in `[0, 1]`
//! - Exact, incrementally maintained serialized size of the model
//! - Parallel construction from independent sequences
//!
//! The chain is not synchronized: callers sharing a model between threads
//! must guard it themselves (e.g. with a `Mutex`).

/// States, rows and the chain model.
pub mod model;

/// Byte layout matching the size accounting of rows and models.
pub mod codec;

/// Parallel construction of a model from independent sequences.
pub mod builder;

/// Error type shared by the crate.
pub mod error;

pub use error::MarkovError;
pub use model::markov_model::Model;
pub use model::row::NormalizingRow;
pub use model::state::{
	FixedWidthState, Node, START, State, TextState, Uint8State, Uint16State, Uint32State, Uint64State,
};
pub use model::uint_model::UintModel;
