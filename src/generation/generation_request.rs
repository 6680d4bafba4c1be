use serde::{Deserialize, Serialize};

/// A generation request: a prompt plus an optional ordered list of stop
/// sequences.
///
/// Stop sequences truncate the full generated text at the earliest matching
/// occurrence. They are applied to the concatenated result only; streamed
/// chunks are emitted unfiltered (see
/// [`GenerationAdapter::stream`](crate::GenerationAdapter::stream)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
	pub prompt: String,

	pub stop_sequences: Vec<String>,
}

/// Constructors
impl GenerationRequest {
	pub fn new(prompt: impl Into<String>) -> Self {
		Self {
			prompt: prompt.into(),
			stop_sequences: Vec::new(),
		}
	}
}

/// Chainable Setters
impl GenerationRequest {
	#[must_use]
	pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
		self.stop_sequences = stop_sequences;
		self
	}
}

impl From<&str> for GenerationRequest {
	fn from(prompt: &str) -> Self {
		Self::new(prompt)
	}
}

impl From<String> for GenerationRequest {
	fn from(prompt: String) -> Self {
		Self::new(prompt)
	}
}
