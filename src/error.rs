use crate::ModelIden;
use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

/// Main error type of the `sparsegen` crate.
#[derive(Debug, From)]
pub enum Error {
	/// No engine binding is available in this build. Raised at adapter
	/// construction, before any engine call is attempted; `install_hint`
	/// names the step that makes the engine available.
	DependencyMissing {
		engine_name: &'static str,
		install_hint: &'static str,
	},

	/// A failure raised inside the engine during pipeline creation or
	/// invocation. The cause is carried through verbatim; the adapter never
	/// catches or retries it.
	Engine { model_iden: ModelIden, cause: String },

	/// The engine was asked to build a pipeline for a task it does not
	/// implement.
	EngineTaskNotSupported { engine_name: &'static str, task: String },

	/// The pipeline completed but produced no output sequences.
	EmptyPipelineOutput { model_iden: ModelIden },

	/// Infrastructure failure (worker spawn/join, poisoned cache, ...).
	#[from]
	Internal(String),
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
	fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
