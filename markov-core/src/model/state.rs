use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;
use std::mem::size_of;

/// Capability required of any value used as a node of the chain.
///
/// Implementations serve as keys of the model's maps, so equality and
/// hashing must follow the logical value, never identity.
///
/// ## Invariants
/// - `size()` equals `bytes().len()`
/// - `value()`, `size()` and `bytes()` are deterministic for a given value
pub trait State: Clone + Eq + Hash + fmt::Debug {
	/// Canonical display string, unique per logical state.
	fn value(&self) -> String;

	/// Number of bytes the value occupies once serialized.
	fn size(&self) -> u64;

	/// Canonical encoding: little-endian for fixed widths, raw bytes for text.
	fn bytes(&self) -> Vec<u8>;
}

macro_rules! fixed_width_state {
	($(#[$meta:meta])* $name:ident, $int:ty) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(pub $int);

		impl State for $name {
			fn value(&self) -> String {
				self.0.to_string()
			}

			fn size(&self) -> u64 {
				size_of::<$int>() as u64
			}

			fn bytes(&self) -> Vec<u8> {
				self.0.to_le_bytes().to_vec()
			}
		}

		impl From<$int> for $name {
			fn from(value: $int) -> Self {
				Self(value)
			}
		}
	};
}

fixed_width_state!(
	/// One-byte unsigned state.
	Uint8State, u8
);
fixed_width_state!(
	/// Two-byte unsigned state, encoded little-endian.
	Uint16State, u16
);
fixed_width_state!(
	/// Four-byte unsigned state, encoded little-endian.
	Uint32State, u32
);
fixed_width_state!(
	/// Eight-byte unsigned state, encoded little-endian.
	Uint64State, u64
);

/// Unsigned state of any supported width.
///
/// Lets a single chain mix widths: `U16(1)` and `U32(1)` are distinct keys
/// with distinct sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedWidthState {
	U8(u8),
	U16(u16),
	U32(u32),
	U64(u64),
}

impl State for FixedWidthState {
	fn value(&self) -> String {
		match self {
			Self::U8(v) => v.to_string(),
			Self::U16(v) => v.to_string(),
			Self::U32(v) => v.to_string(),
			Self::U64(v) => v.to_string(),
		}
	}

	fn size(&self) -> u64 {
		match self {
			Self::U8(_) => 1,
			Self::U16(_) => 2,
			Self::U32(_) => 4,
			Self::U64(_) => 8,
		}
	}

	fn bytes(&self) -> Vec<u8> {
		match self {
			Self::U8(v) => v.to_le_bytes().to_vec(),
			Self::U16(v) => v.to_le_bytes().to_vec(),
			Self::U32(v) => v.to_le_bytes().to_vec(),
			Self::U64(v) => v.to_le_bytes().to_vec(),
		}
	}
}

/// Text state. Its size is the UTF-8 byte length of the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextState(Cow<'static, str>);

impl TextState {
	/// Creates a text state from owned or borrowed text.
	pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
		Self(text.into())
	}

	/// Creates a text state in `const` context.
	pub const fn from_static(text: &'static str) -> Self {
		Self(Cow::Borrowed(text))
	}

	/// Returns the underlying text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl State for TextState {
	fn value(&self) -> String {
		self.0.to_string()
	}

	fn size(&self) -> u64 {
		self.0.len() as u64
	}

	fn bytes(&self) -> Vec<u8> {
		self.0.as_bytes().to_vec()
	}
}

impl From<&str> for TextState {
	fn from(text: &str) -> Self {
		Self(Cow::Owned(text.to_owned()))
	}
}

impl From<String> for TextState {
	fn from(text: String) -> Self {
		Self(Cow::Owned(text))
	}
}

/// The sentinel standing for "before the first observed state".
pub const START: TextState = TextState::from_static("start");

/// Key of a model row and type of the model cursor.
///
/// `Start` is the sentinel and encodes exactly like [`START`], but it never
/// equals an observed state, not even `TextState("start")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node<S> {
	Start,
	State(S),
}

impl<S> Node<S> {
	/// Returns true for the sentinel.
	pub fn is_start(&self) -> bool {
		matches!(self, Self::Start)
	}

	/// Returns the wrapped state, `None` for the sentinel.
	pub fn as_state(&self) -> Option<&S> {
		match self {
			Self::Start => None,
			Self::State(s) => Some(s),
		}
	}
}

impl<S: State> State for Node<S> {
	fn value(&self) -> String {
		match self {
			Self::Start => START.value(),
			Self::State(s) => s.value(),
		}
	}

	fn size(&self) -> u64 {
		match self {
			Self::Start => START.size(),
			Self::State(s) => s.size(),
		}
	}

	fn bytes(&self) -> Vec<u8> {
		match self {
			Self::Start => START.bytes(),
			Self::State(s) => s.bytes(),
		}
	}
}

impl<S> From<S> for Node<S> {
	fn from(state: S) -> Self {
		Self::State(state)
	}
}

impl<S: State> fmt::Display for Node<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.value())
	}
}
