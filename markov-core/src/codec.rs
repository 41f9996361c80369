use crate::model::markov_model::Model;
use crate::model::row::NormalizingRow;
use crate::model::state::State;

/// Appends the encoding of `row` to `out`.
///
/// Layout: the observation count as a little-endian `u32`, then for every
/// destination in first-seen order its `bytes()` and its count as a
/// little-endian `u32`. Writes exactly `row.size()` bytes.
pub fn encode_row<S: State>(row: &NormalizingRow<S>, out: &mut Vec<u8>) {
	out.extend_from_slice(&row.observation_count().to_le_bytes());
	for (state, count) in row.iter() {
		out.extend_from_slice(&state.bytes());
		out.extend_from_slice(&count.to_le_bytes());
	}
}

/// Encodes the whole model: each source key followed by its row.
///
/// The output is `model.size()` bytes long. Keys are not length-prefixed,
/// so the layout measures the model rather than allowing it to be decoded.
pub fn encode_model<S: State>(model: &Model<S>) -> Vec<u8> {
	let mut out = Vec::new();
	for (source, row) in model.rows() {
		out.extend_from_slice(&source.bytes());
		encode_row(row, &mut out);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::state::{TextState, Uint16State};

	#[test]
	fn row_layout() {
		let mut row = NormalizingRow::new();
		row.add_state(Uint16State(0x0102));
		row.add_state(Uint16State(0x0102));
		row.add_state(Uint16State(3));

		let mut out = Vec::new();
		encode_row(&row, &mut out);
		assert_eq!(out, vec![3, 0, 0, 0, 0x02, 0x01, 2, 0, 0, 0, 3, 0, 1, 0, 0, 0]);
		assert_eq!(out.len() as u64, row.size());
	}

	#[test]
	fn model_layout_starts_with_sentinel() {
		let mut model = Model::new();
		model.add_state(Uint16State(9));

		let out = encode_model(&model);
		assert_eq!(&out[..5], b"start");
		assert_eq!(&out[5..], &[1, 0, 0, 0, 9, 0, 1, 0, 0, 0]);
		assert_eq!(out.len() as u64, model.size());
	}

	#[test]
	fn text_model_length_matches_size() {
		let mut model = Model::new();
		for word in "the quick brown fox jumps over the lazy dog the end".split(' ') {
			model.add_state(TextState::from(word));
		}
		assert_eq!(encode_model(&model).len() as u64, model.size());
	}
}
