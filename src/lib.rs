//! The `sparsegen` crate exposes pre-optimized, in-process text-generation
//! engines through one uniform language-model calling convention:
//!
//! - `GenerationAdapter::generate` / `::agenerate` for full-text generation
//!   (sync and async call shapes over the same pipeline),
//! - `GenerationAdapter::stream` / `::astream` for incremental chunk
//!   streaming, fed by one background worker per call,
//! - an optional [`generation::ChunkObserver`] side channel notified of every
//!   streamed chunk.
//!
//! The engine itself is an injected capability (see the [`engine`] module):
//! the adapter only marshals configuration, translates call shapes, and
//! applies the stop-sequence post-filter. A native engine binding backed by
//! llama.cpp is available behind the `llamacpp` cargo feature; without any
//! engine binding compiled in, adapter construction fails with
//! [`Error::DependencyMissing`] naming the feature to enable.
//!
//! Stop sequences truncate the *concatenated* generation result at their
//! earliest occurrence. Streamed chunks are emitted unfiltered; applying the
//! stop sequences to the concatenated text is the caller's contract.

// region:    --- Modules

mod error;
mod model_iden;

pub mod adapter;
pub mod engine;
pub mod generation;

// -- Flatten
pub use adapter::{GenerationAdapter, GenerationAdapterBuilder};
pub use error::{Error, Result};
pub use model_iden::ModelIden;

// endregion: --- Modules
