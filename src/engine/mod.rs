//! The engine capability seam.
//!
//! The inference engine is an opaque external collaborator reachable only
//! through a "create pipeline" / "run pipeline" contract. Modeling it as a
//! pair of traits keeps the adapter engine-agnostic and makes the engine
//! substitutable with a fake for testing.

// region:    --- Modules

#[cfg(feature = "llamacpp")]
pub mod native;

// endregion: --- Modules

use crate::{Error, ModelIden, Result};
use serde_json::Value;
use std::sync::Arc;

/// Task name the generation adapter fixes when creating pipelines.
pub const TASK_TEXT_GENERATION: &str = "text_generation";

/// Engine configuration options, forwarded to pipeline creation as
/// keyword-style entries. The adapter merges its base settings with the
/// user-supplied mapping before handing it to the engine.
pub type PipelineConfig = serde_json::Map<String, Value>;

/// The "create pipeline" side of the engine contract.
pub trait TextGenerationEngine: Send + Sync {
	/// Short engine name, used as the adapter's display name.
	fn name(&self) -> &'static str;

	/// Build a pipeline for `task` on `model` with `config` applied.
	///
	/// Engines that do not implement `task` fail with
	/// [`Error::EngineTaskNotSupported`]. Any other failure is the engine's
	/// own and is propagated unchanged.
	fn create_pipeline(
		&self,
		task: &str,
		model: &str,
		config: &PipelineConfig,
	) -> Result<Arc<dyn TextGenerationPipeline>>;
}

/// The "run pipeline" side of the engine contract. A pipeline performs
/// tokenization, model execution, and sampling for a given prompt.
pub trait TextGenerationPipeline: Send + Sync {
	/// Run the pipeline to completion.
	fn run(&self, prompt: &str) -> Result<PipelineOutput>;

	/// Run the pipeline, pushing each produced text fragment into `sink` as
	/// it is generated. Returns the same output as [`run`](Self::run) once
	/// generation completes.
	fn run_streaming(&self, prompt: &str, sink: &mut dyn TokenSink) -> Result<PipelineOutput>;
}

/// The token stream collector contract: the engine calls [`push`](Self::push)
/// once per produced fragment, in generation order.
pub trait TokenSink {
	fn push(&mut self, text: &str);
}

/// What a pipeline invocation produces: an ordered list of generated text
/// sequences (one per requested candidate; most engines produce one).
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
	pub sequences: Vec<String>,
}

impl PipelineOutput {
	pub fn from_sequence(sequence: impl Into<String>) -> Self {
		Self {
			sequences: vec![sequence.into()],
		}
	}

	/// Consume the output and return the first produced sequence.
	pub fn into_first_sequence(self, model_iden: &ModelIden) -> Result<String> {
		self.sequences
			.into_iter()
			.next()
			.ok_or_else(|| Error::EmptyPipelineOutput {
				model_iden: model_iden.clone(),
			})
	}
}

/// Resolve the default engine for this build.
///
/// With the `llamacpp` feature enabled this is the native llama.cpp engine;
/// otherwise resolution fails with [`Error::DependencyMissing`] naming the
/// feature to enable.
pub fn default_engine() -> Result<Arc<dyn TextGenerationEngine>> {
	#[cfg(feature = "llamacpp")]
	{
		Ok(Arc::new(native::NativeEngine))
	}
	#[cfg(not(feature = "llamacpp"))]
	{
		Err(Error::DependencyMissing {
			engine_name: "llamacpp",
			install_hint: "enable the `llamacpp` cargo feature of `sparsegen` to compile the native engine binding",
		})
	}
}
