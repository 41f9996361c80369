use indexmap::IndexMap;
use indexmap::map::Entry;
use rand::Rng;

use crate::error::MarkovError;
use super::row::NormalizingRow;
use super::state::{Node, State};

/// A first-order Markov chain built one observation at a time.
///
/// The model owns a cursor (the current state) and one [`NormalizingRow`]
/// per state that has been left at least once. Observing a state records
/// the transition `cursor -> state` and moves the cursor forward.
///
/// # Responsibilities
/// - Build the chain from a stream of observed states
/// - Report the exact serialized size of the whole chain
/// - Walk the chain from the cursor with caller-supplied sampling values
/// - Merge with another model built from disjoint sequences
///
/// # Invariants
/// - The cursor starts on [`Node::Start`]
/// - A node is a valid start state iff it has a row
/// - Rows are never removed
#[derive(Clone, Debug)]
pub struct Model<S: State> {
	/// Current position in the chain.
	cursor: Node<S>,
	/// Outgoing transitions per source node, in first-departed order.
	rows: IndexMap<Node<S>, NormalizingRow<S>>,
}

impl<S: State> Model<S> {
	/// Creates an empty model with its cursor on the sentinel.
	pub fn new() -> Self {
		Self { cursor: Node::Start, rows: IndexMap::new() }
	}

	/// Records the transition from the cursor to `state`, then moves the
	/// cursor to `state`.
	pub fn add_state(&mut self, state: S) {
		let row = match self.rows.entry(self.cursor.clone()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => {
				tracing::debug!(source = %entry.key(), "creating row");
				entry.insert(NormalizingRow::new())
			}
		};
		row.add_state(state.clone());
		self.cursor = Node::State(state);
	}

	/// Puts the cursor back on the sentinel, ready for a new sequence.
	///
	/// Always allowed: the sentinel is the initial cursor of every model.
	pub fn restart(&mut self) {
		self.cursor = Node::Start;
	}

	/// Ingests a whole sequence starting from the sentinel.
	pub fn add_sequence<I: IntoIterator<Item = S>>(&mut self, sequence: I) {
		self.restart();
		for state in sequence {
			self.add_state(state);
		}
	}

	/// Moves the cursor to `state`.
	///
	/// # Errors
	/// Returns [`MarkovError::UnknownStartState`] if no transition was ever
	/// observed from `state`. The cursor is left unchanged.
	pub fn set_current_state(&mut self, state: impl Into<Node<S>>) -> Result<(), MarkovError> {
		let state = state.into();
		if !self.rows.contains_key(&state) {
			return Err(MarkovError::UnknownStartState { state: state.value() });
		}
		self.cursor = state;
		Ok(())
	}

	/// Returns the cursor.
	pub fn current_state(&self) -> &Node<S> {
		&self.cursor
	}

	/// Returns true if `state` may be passed to [`Model::set_current_state`].
	pub fn is_valid_start(&self, state: &Node<S>) -> bool {
		self.rows.contains_key(state)
	}

	/// Returns the serialized size of the model in bytes.
	///
	/// Each row contributes its source key plus its own size. Recomputed on
	/// every call.
	pub fn size(&self) -> u64 {
		self.rows
			.iter()
			.map(|(source, row)| source.size() + row.size())
			.sum()
	}

	/// Returns the row leaving `source`, if any.
	pub fn row(&self, source: &Node<S>) -> Option<&NormalizingRow<S>> {
		self.rows.get(source)
	}

	/// Iterates over `(source, row)` pairs in first-departed order.
	pub fn rows(&self) -> impl Iterator<Item = (&Node<S>, &NormalizingRow<S>)> {
		self.rows.iter()
	}

	/// Returns the number of rows (distinct source nodes).
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	/// Returns true if nothing was observed yet.
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Returns the probability of the transition `from -> to`.
	pub fn state_weight(&self, from: &Node<S>, to: &S) -> f64 {
		self.rows.get(from).map_or(0.0, |row| row.state_weight(to))
	}

	/// Samples the state following the cursor without moving it.
	///
	/// # Errors
	/// - [`MarkovError::OutOfRange`] if `p` is not in `[0, 1]`
	/// - [`MarkovError::EmptyRow`] if nothing was ever observed from the cursor
	pub fn walk(&mut self, p: f64) -> Result<S, MarkovError> {
		if !(0.0..=1.0).contains(&p) {
			return Err(MarkovError::OutOfRange { p });
		}
		match self.rows.get_mut(&self.cursor) {
			Some(row) => row.walk(p).cloned(),
			None => Err(MarkovError::EmptyRow),
		}
	}

	/// Samples the state following the cursor and moves the cursor to it.
	pub fn advance(&mut self, p: f64) -> Result<S, MarkovError> {
		let next = self.walk(p)?;
		self.cursor = Node::State(next.clone());
		Ok(next)
	}

	/// Same as [`Model::advance`], drawing the sampling value from `rng`.
	pub fn advance_with(&mut self, rng: &mut impl Rng) -> Result<S, MarkovError> {
		let p: f64 = rng.random();
		self.advance(p)
	}

	/// Walks a new sequence from the sentinel.
	///
	/// Stops after `max_len` states or when reaching a state that was never
	/// left. The cursor is restored before returning.
	pub fn generate(&mut self, max_len: usize, rng: &mut impl Rng) -> Result<Vec<S>, MarkovError> {
		let saved = std::mem::replace(&mut self.cursor, Node::Start);
		let mut sequence = Vec::new();

		let result = loop {
			if sequence.len() >= max_len {
				break Ok(());
			}
			match self.advance_with(rng) {
				Ok(state) => sequence.push(state),
				Err(MarkovError::EmptyRow) => break Ok(()),
				Err(e) => break Err(e),
			}
		};

		self.cursor = saved;
		result.map(|_| sequence)
	}

	/// Merges another model into this one.
	///
	/// Rows leaving the same node are merged, missing rows are cloned. The
	/// cursor is not modified.
	///
	/// # Errors
	/// Returns [`MarkovError::CounterOverflow`] if a merged row would hold
	/// more than `u32::MAX` observations. Nothing is merged in that case.
	pub fn merge(&mut self, other: &Self) -> Result<(), MarkovError> {
		for (source, row) in &other.rows {
			if let Some(existing) = self.rows.get(source) {
				existing.check_merge(row)?;
			}
		}
		for (source, row) in &other.rows {
			if let Some(existing) = self.rows.get_mut(source) {
				existing.merge(row)?;
			} else {
				self.rows.insert(source.clone(), row.clone());
			}
		}
		tracing::debug!(rows = self.rows.len(), merged = other.rows.len(), "merged model");
		Ok(())
	}
}

impl<S: State> Default for Model<S> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use approx::assert_abs_diff_eq;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;
	use crate::model::state::{TextState, Uint16State};

	#[test]
	fn new_model_is_empty() {
		let model: Model<Uint16State> = Model::new();
		assert!(model.is_empty());
		assert_eq!(model.size(), 0);
		assert!(model.current_state().is_start());
	}

	#[test]
	fn size_after_first_and_repeated_state() {
		let mut model = Model::new();
		model.add_state(Uint16State(1));
		// "start" + row(count + key + counter)
		assert_eq!(model.size(), 5 + 4 + 2 + 4);
		assert_eq!(model.size(), 15);

		// new row keyed by 1: key + count + key + counter
		model.add_state(Uint16State(1));
		assert_eq!(model.size(), 15 + 2 + (4 + 2 + 4));
		assert_eq!(model.size(), 27);
	}

	#[test]
	fn cursor_follows_observations() {
		let mut model = Model::new();
		model.add_state(TextState::from("a"));
		model.add_state(TextState::from("b"));
		assert_eq!(model.current_state(), &Node::State(TextState::from("b")));
	}

	#[test]
	fn set_current_state_requires_a_row() {
		let mut model: Model<Uint16State> = Model::new();
		assert_eq!(
			model.set_current_state(Node::Start),
			Err(MarkovError::UnknownStartState { state: "start".to_owned() })
		);

		model.add_state(Uint16State(1));
		model.add_state(Uint16State(2));

		assert!(model.set_current_state(Node::Start).is_ok());
		assert!(model.current_state().is_start());
		assert!(model.set_current_state(Uint16State(1)).is_ok());
		assert_eq!(model.current_state(), &Node::State(Uint16State(1)));

		// 2 was reached but never left
		assert_eq!(
			model.set_current_state(Uint16State(2)),
			Err(MarkovError::UnknownStartState { state: "2".to_owned() })
		);
		assert_eq!(model.current_state(), &Node::State(Uint16State(1)));
	}

	#[test]
	fn weights_sum_to_one_for_every_row() {
		let mut model = Model::new();
		for v in [1u16, 2, 1, 3, 1, 2, 2, 3, 3, 3, 1] {
			model.add_state(Uint16State(v));
		}
		for (_, row) in model.rows() {
			let sum: f64 = row.iter().map(|(s, _)| row.state_weight(s)).sum();
			assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
		}
		assert_abs_diff_eq!(model.state_weight(&Node::Start, &Uint16State(1)), 1.0);
		assert_eq!(model.state_weight(&Node::State(Uint16State(9)), &Uint16State(1)), 0.0);
	}

	#[test]
	fn walk_does_not_move_cursor() {
		let mut model = Model::new();
		model.add_sequence([Uint16State(1), Uint16State(2)]);
		model.restart();
		assert_eq!(model.walk(0.5), Ok(Uint16State(1)));
		assert!(model.current_state().is_start());
		assert_eq!(model.advance(0.5), Ok(Uint16State(1)));
		assert_eq!(model.advance(0.5), Ok(Uint16State(2)));
		assert_eq!(model.walk(0.5), Err(MarkovError::EmptyRow));
	}

	#[test]
	fn walk_validates_range_before_lookup() {
		let mut model: Model<Uint16State> = Model::new();
		assert_eq!(model.walk(1.01), Err(MarkovError::OutOfRange { p: 1.01 }));
		assert_eq!(model.walk(0.0), Err(MarkovError::EmptyRow));
	}

	#[test]
	fn generate_restores_cursor() {
		let mut model = Model::new();
		model.add_sequence(["the", "cat", "sat"].map(TextState::from));
		model.add_sequence(["the", "dog", "sat"].map(TextState::from));
		model.add_state(TextState::from("down"));

		let mut rng = StdRng::seed_from_u64(7);
		let sequence = model.generate(10, &mut rng).unwrap();
		assert_eq!(sequence.first(), Some(&TextState::from("the")));
		assert_eq!(sequence.len(), 4);
		assert_eq!(sequence.last(), Some(&TextState::from("down")));
		assert_eq!(model.current_state(), &Node::State(TextState::from("down")));
	}

	#[test]
	fn generate_is_bounded_by_max_len() {
		let mut model = Model::new();
		model.add_sequence([Uint16State(1), Uint16State(1)]);
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(model.generate(5, &mut rng).unwrap().len(), 5);
		assert!(model.generate(0, &mut rng).unwrap().is_empty());
	}

	#[test]
	fn generate_on_empty_model_is_empty() {
		let mut model: Model<Uint16State> = Model::new();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(model.generate(5, &mut rng).unwrap().is_empty());
	}

	#[test]
	fn merge_matches_sequential_ingestion() {
		let first = [1u16, 2, 3, 2].map(Uint16State);
		let second = [1u16, 3, 3].map(Uint16State);

		let mut sequential = Model::new();
		sequential.add_sequence(first);
		sequential.add_sequence(second);

		let mut left = Model::new();
		left.add_sequence(first);
		let mut right = Model::new();
		right.add_sequence(second);
		left.merge(&right).unwrap();

		assert_eq!(left.size(), sequential.size());
		assert_eq!(left.len(), sequential.len());
		for (source, row) in sequential.rows() {
			let merged = left.row(source).unwrap();
			assert_eq!(merged.observation_count(), row.observation_count());
			for (state, count) in row.iter() {
				assert_eq!(merged.count(state), count);
			}
		}
	}
}
