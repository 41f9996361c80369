use std::sync::mpsc;
use std::thread;

use crate::error::MarkovError;
use crate::model::markov_model::Model;
use crate::model::state::State;

/// Chunks created per available CPU.
const CHUNKS_PER_CPU: usize = 8;

/// Builds a model from independent sequences using worker threads.
///
/// # Parameters
/// - `sequences`: every sequence is ingested from the start sentinel, as with
///   [`Model::add_sequence`].
///
/// # Returns
/// - `Ok(Model)`: the merged model, cursor on the sentinel.
/// - `Err(MarkovError::WorkerFailed)`: if a worker died before sending.
/// - `Err(MarkovError::CounterOverflow)`: if a merged row exceeds `u32::MAX` observations.
///
/// # Behavior
/// - Splits the sequences into chunks (based on CPU cores * factor).
/// - Spawns threads to build partial models for each chunk.
/// - Merges the partial models in chunk order, whatever order they arrive in.
///
/// # Notes
/// - The result equals sequential ingestion of `sequences`, including the
///   first-seen order of rows and destinations, so walks are reproducible.
#[tracing::instrument(skip_all, fields(sequences = sequences.len()))]
pub fn build_parallel<S>(sequences: Vec<Vec<S>>) -> Result<Model<S>, MarkovError>
where
	S: State + Send + 'static,
{
	let chunks = num_cpus::get() * CHUNKS_PER_CPU;
	let chunk_size = sequences.len().div_ceil(chunks).max(1);

	let (tx, rx) = mpsc::channel();
	let mut workers = 0;
	let mut remaining = sequences.into_iter().peekable();
	while remaining.peek().is_some() {
		let chunk: Vec<Vec<S>> = remaining.by_ref().take(chunk_size).collect();
		let tx = tx.clone();
		let index = workers;
		workers += 1;

		thread::spawn(move || {
			let mut partial_model = Model::new();
			for sequence in chunk {
				partial_model.add_sequence(sequence);
			}
			// Only fails once the receiver is gone, i.e. the build was abandoned.
			let _ = tx.send((index, partial_model));
		});
	}
	drop(tx);

	let mut partial_models: Vec<Option<Model<S>>> = (0..workers).map(|_| None).collect();
	for (index, partial_model) in rx.iter() {
		if let Some(slot) = partial_models.get_mut(index) {
			*slot = Some(partial_model);
		}
	}

	let mut final_model = Model::new();
	for partial_model in partial_models {
		let partial_model = partial_model.ok_or(MarkovError::WorkerFailed)?;
		final_model.merge(&partial_model)?;
	}

	tracing::debug!(workers, rows = final_model.len(), size = final_model.size(), "built model");
	Ok(final_model)
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};

	use super::*;
	use crate::model::state::{Node, TextState, Uint16State};

	fn random_sequences(count: usize, seed: u64) -> Vec<Vec<Uint16State>> {
		let mut rng = StdRng::seed_from_u64(seed);
		(0..count)
			.map(|_| {
				let len = rng.random_range(0..12);
				(0..len).map(|_| Uint16State(rng.random_range(0..20))).collect()
			})
			.collect()
	}

	#[test]
	fn empty_input_gives_empty_model() {
		let model = build_parallel::<Uint16State>(Vec::new()).unwrap();
		assert!(model.is_empty());
	}

	#[test]
	fn parallel_equals_sequential() {
		let sequences = random_sequences(500, 3);

		let mut sequential = Model::new();
		for sequence in &sequences {
			sequential.add_sequence(sequence.iter().copied());
		}

		let parallel = build_parallel(sequences).unwrap();
		assert_eq!(parallel.size(), sequential.size());
		assert_eq!(parallel.len(), sequential.len());
		assert!(parallel.current_state().is_start());

		for (source, row) in sequential.rows() {
			let other = parallel.row(source).unwrap();
			assert_eq!(other.observation_count(), row.observation_count());
			assert_eq!(other.size(), row.size());
			for (state, count) in row.iter() {
				assert_eq!(other.count(state), count);
			}
		}
	}

	#[test]
	fn parallel_keeps_sequential_order() {
		let sequences = random_sequences(800, 11);

		let mut sequential = Model::new();
		for sequence in &sequences {
			sequential.add_sequence(sequence.iter().copied());
		}

		for _ in 0..5 {
			let parallel = build_parallel(sequences.clone()).unwrap();
			let sources: Vec<_> = parallel.rows().map(|(source, _)| source.clone()).collect();
			let expected: Vec<_> = sequential.rows().map(|(source, _)| source.clone()).collect();
			assert_eq!(sources, expected);

			for (source, row) in sequential.rows() {
				let order: Vec<_> = parallel.row(source).unwrap().iter().collect();
				assert_eq!(order, row.iter().collect::<Vec<_>>());
			}
		}
	}

	#[test]
	fn walks_agree_across_builds() {
		let sequences: Vec<Vec<TextState>> = (0..200).map(|i| vec![TextState::from(format!("w{i}"))]).collect();

		let mut first = build_parallel(sequences.clone()).unwrap();
		first.set_current_state(Node::Start).unwrap();
		let expected = first.walk(0.5).unwrap();
		assert_eq!(expected, TextState::from("w99"));

		for _ in 0..10 {
			let mut model = build_parallel(sequences.clone()).unwrap();
			model.set_current_state(Node::Start).unwrap();
			assert_eq!(model.walk(0.5), Ok(expected.clone()));
		}
	}

	#[test]
	fn empty_sequences_leave_no_rows() {
		let model = build_parallel(vec![Vec::<Uint16State>::new(); 4]).unwrap();
		assert!(model.is_empty());
		assert!(!model.is_valid_start(&Node::Start));
	}
}
