use serde::{Deserialize, Serialize};

use crate::ModelIden;
use crate::generation::GenerationStream;

// region:    --- GenerationResponse

/// The full-text result of a `generate`/`agenerate` call, with stop-sequence
/// truncation already applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
	/// The generated text.
	pub content: String,

	/// The engine/model identity that produced this response.
	pub model_iden: ModelIden,
}

/// Getters
impl GenerationResponse {
	pub fn content_as_str(&self) -> &str {
		&self.content
	}

	/// Consumes the response and returns the generated text.
	pub fn into_content(self) -> String {
		self.content
	}
}

// endregion: --- GenerationResponse

// region:    --- GenerationStreamResponse

/// The result returned from an `astream` call.
pub struct GenerationStreamResponse {
	/// The stream to iterate through the generation chunks.
	pub stream: GenerationStream,

	/// The engine/model identity producing this stream.
	pub model_iden: ModelIden,
}

// endregion: --- GenerationStreamResponse
