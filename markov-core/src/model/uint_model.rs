use std::any::{Any, type_name};

use crate::error::MarkovError;
use super::markov_model::Model;
use super::state::{FixedWidthState, Uint8State, Uint16State, Uint32State, Uint64State};

/// Chain over raw unsigned integers of mixed widths.
///
/// Accepts values whose type is only known at runtime and rejects anything
/// that is not a fixed-width unsigned integer. Counters and size accounting
/// are those of [`Model`]: 32-bit counters, never wrapping at 255.
#[derive(Clone, Debug, Default)]
pub struct UintModel {
	model: Model<FixedWidthState>,
}

impl UintModel {
	/// Creates an empty model.
	pub fn new() -> Self {
		Self { model: Model::new() }
	}

	/// Observes `data` if it is a `u8`, `u16`, `u32`, `u64` or one of the
	/// matching state types.
	///
	/// # Errors
	/// Returns [`MarkovError::TypeMismatch`] naming the concrete type of
	/// `data` otherwise. The model is left untouched.
	pub fn add_data<T: Any>(&mut self, data: T) -> Result<(), MarkovError> {
		let state = fixed_width(&data).ok_or_else(|| MarkovError::TypeMismatch { type_name: type_name::<T>() })?;
		self.model.add_state(state);
		Ok(())
	}

	/// Returns the serialized size of the model in bytes.
	pub fn size(&self) -> u64 {
		self.model.size()
	}

	/// Returns the underlying chain.
	pub fn model(&self) -> &Model<FixedWidthState> {
		&self.model
	}

	/// Returns the underlying chain, e.g. to walk it.
	pub fn model_mut(&mut self) -> &mut Model<FixedWidthState> {
		&mut self.model
	}
}

fn fixed_width(data: &dyn Any) -> Option<FixedWidthState> {
	if let Some(v) = data.downcast_ref::<u8>() {
		return Some(FixedWidthState::U8(*v));
	}
	if let Some(v) = data.downcast_ref::<u16>() {
		return Some(FixedWidthState::U16(*v));
	}
	if let Some(v) = data.downcast_ref::<u32>() {
		return Some(FixedWidthState::U32(*v));
	}
	if let Some(v) = data.downcast_ref::<u64>() {
		return Some(FixedWidthState::U64(*v));
	}
	if let Some(s) = data.downcast_ref::<Uint8State>() {
		return Some(FixedWidthState::U8(s.0));
	}
	if let Some(s) = data.downcast_ref::<Uint16State>() {
		return Some(FixedWidthState::U16(s.0));
	}
	if let Some(s) = data.downcast_ref::<Uint32State>() {
		return Some(FixedWidthState::U32(s.0));
	}
	if let Some(s) = data.downcast_ref::<Uint64State>() {
		return Some(FixedWidthState::U64(s.0));
	}
	data.downcast_ref::<FixedWidthState>().copied()
}
