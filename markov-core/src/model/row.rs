use indexmap::IndexMap;

use crate::error::MarkovError;
use super::state::State;

/// Bytes used by a serialized `u32` counter.
pub(crate) const COUNTER_SIZE: u64 = 4;

/// Transition table leaving one fixed source state.
///
/// A `NormalizingRow` counts how many times each destination followed its
/// source and derives normalized weights from those counts on demand.
///
/// Conceptually, this is the set of outgoing edges of a node in a Markov
/// chain, weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate destination occurrences during ingestion (O(1) amortized)
/// - Track the exact serialized size of the row
/// - Sample a destination from a caller-supplied value in `[0, 1]`
///
/// ## Invariants
/// - Every stored count is strictly positive
/// - The counts sum to `observation_count`
/// - `byte_size` is `4` plus `size() + 4` for every distinct destination
/// - `observation_count` never exceeds `u32::MAX`: a full row ignores
///   further observations
#[derive(Clone, Debug)]
pub struct NormalizingRow<S: State> {
	/// Number of observations folded into this row.
	observation_count: u32,
	/// Occurrences per destination, in first-seen order.
	counts: IndexMap<S, u32>,
	/// Serialized size of the row in bytes.
	byte_size: u64,
	/// Ascending `(cutoff, index into counts)` pairs.
	cumulative: Vec<(f64, usize)>,
	/// Set by every mutation, cleared when `cumulative` is rebuilt.
	stale: bool,
}

impl<S: State> NormalizingRow<S> {
	/// Creates an empty row whose size only accounts for its observation counter.
	pub fn new() -> Self {
		Self {
			observation_count: 0,
			counts: IndexMap::new(),
			byte_size: COUNTER_SIZE,
			cumulative: Vec::new(),
			stale: true,
		}
	}

	/// Records one transition toward `destination`.
	///
	/// - The first occurrence of a destination grows the row by its key size
	///   plus the size of its counter.
	/// - Repeated occurrences only bump the counters.
	/// - Once the row holds `u32::MAX` observations it is full and the
	///   observation is dropped, leaving counts and weights untouched.
	///
	/// Returns the new size of the row in bytes.
	pub fn add_state(&mut self, destination: S) -> u64 {
		if self.observation_count == u32::MAX {
			tracing::warn!(destination = %destination.value(), "row is full, observation dropped");
			return self.byte_size;
		}
		let size = destination.size();
		let count = self.counts.entry(destination).or_insert(0);
		if *count == 0 {
			self.byte_size += size + COUNTER_SIZE;
		}
		*count += 1;
		self.observation_count += 1;
		self.stale = true;
		self.byte_size
	}

	/// Returns the probability of moving to `destination`, or `0.0` if it was
	/// never observed from this row.
	pub fn state_weight(&self, destination: &S) -> f64 {
		match self.counts.get(destination) {
			Some(&count) if count > 0 => count as f64 / self.observation_count as f64,
			_ => 0.0,
		}
	}

	/// Returns the current size of the row in bytes.
	pub fn size(&self) -> u64 {
		self.byte_size
	}

	/// Returns the number of observations folded into this row.
	pub fn observation_count(&self) -> u32 {
		self.observation_count
	}

	/// Returns how many times `destination` was observed.
	pub fn count(&self, destination: &S) -> u32 {
		self.counts.get(destination).copied().unwrap_or(0)
	}

	/// Returns the number of distinct destinations.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	/// Returns true if nothing was observed yet.
	pub fn is_empty(&self) -> bool {
		self.observation_count == 0
	}

	/// Iterates over `(destination, count)` pairs in first-seen order.
	pub fn iter(&self) -> impl Iterator<Item = (&S, u32)> {
		self.counts.iter().map(|(state, count)| (state, *count))
	}

	/// Samples a destination given `p` in `[0, 1]`.
	///
	/// The cumulative table is rebuilt lazily: only the first walk after a
	/// mutation pays for it. Cutoffs come from exact integer prefix sums so
	/// the last one is exactly `1.0`.
	///
	/// # Errors
	/// - [`MarkovError::OutOfRange`] if `p` is not in `[0, 1]`
	/// - [`MarkovError::EmptyRow`] if the row has no observation
	/// - [`MarkovError::Internal`] if no cutoff covers `p` (broken invariant)
	pub fn walk(&mut self, p: f64) -> Result<&S, MarkovError> {
		if !(0.0..=1.0).contains(&p) {
			return Err(MarkovError::OutOfRange { p });
		}
		if self.observation_count == 0 {
			return Err(MarkovError::EmptyRow);
		}
		if self.stale {
			self.rebuild();
		}

		let index = self
			.cumulative
			.iter()
			.find(|(cutoff, _)| *cutoff >= p)
			.map(|(_, index)| *index)
			.ok_or(MarkovError::Internal { p })?;

		self.counts
			.get_index(index)
			.map(|(state, _)| state)
			.ok_or(MarkovError::Internal { p })
	}

	/// Folds the counts of another row into this one.
	///
	/// Both rows are expected to leave the same source state; sizes grow only
	/// for destinations this row has not seen yet.
	///
	/// # Errors
	/// Returns [`MarkovError::CounterOverflow`] if the merged row would hold
	/// more than `u32::MAX` observations. The row is left unchanged.
	pub fn merge(&mut self, other: &Self) -> Result<(), MarkovError> {
		let total = self.check_merge(other)?;
		for (state, occurrence) in &other.counts {
			let count = self.counts.entry(state.clone()).or_insert(0);
			if *count == 0 {
				self.byte_size += state.size() + COUNTER_SIZE;
			}
			// bounded by `total`
			*count += *occurrence;
		}
		self.observation_count = total;
		self.stale = true;
		Ok(())
	}

	/// Returns the observation count after merging `other`.
	pub(crate) fn check_merge(&self, other: &Self) -> Result<u32, MarkovError> {
		self.observation_count
			.checked_add(other.observation_count)
			.ok_or(MarkovError::CounterOverflow { held: self.observation_count, incoming: other.observation_count })
	}

	fn rebuild(&mut self) {
		let total = self.observation_count as f64;
		let mut prefix: u64 = 0;

		self.cumulative.clear();
		for (index, count) in self.counts.values().enumerate() {
			prefix += u64::from(*count);
			self.cumulative.push((prefix as f64 / total, index));
		}
		self.stale = false;

		tracing::trace!(destinations = self.cumulative.len(), observations = self.observation_count, "rebuilt cumulative table");
	}
}

impl<S: State> Default for NormalizingRow<S> {
	fn default() -> Self {
		Self::new()
	}
}
