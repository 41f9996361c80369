//! Top-level module for the Markov chain.
//!
//! This module provides an incrementally built, first-order chain, including:
//! - The state capability and its reference implementations (`State`)
//! - Per-source transition tables (`NormalizingRow`)
//! - The whole chain with its cursor (`Model`)
//! - A runtime-typed ingestion path for raw integers (`UintModel`)

/// State capability, reference state types and the start sentinel.
pub mod state;

/// Transition table leaving a single source state.
///
/// Counts destinations, derives weights and samples through a lazily
/// rebuilt cumulative distribution.
pub mod row;

/// The chain itself: cursor, rows, size accounting and walking.
pub mod markov_model;

/// Fixed-width integer ingestion with runtime type checking.
pub mod uint_model;
