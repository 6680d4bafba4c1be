//! The generation adapter: the uniform language-model calling convention
//! over an injected engine.

// region:    --- Modules

mod generation_adapter;

// -- Flatten
pub use generation_adapter::*;

// endregion: --- Modules
