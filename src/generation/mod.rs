//! The generation data model: requests, responses, chunks, the stream types
//! the adapter's streaming operations return, and the stop-sequence
//! post-filter.

// region:    --- Modules

mod generation_request;
mod generation_response;
mod generation_stream;
mod stop_sequences;

// -- Flatten
pub use generation_request::*;
pub use generation_response::*;
pub use generation_stream::*;
pub use stop_sequences::*;

// endregion: --- Modules
