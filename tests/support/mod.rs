//! Some support utilities for the tests
//! Note: Must be imported in each test file

#![allow(unused)] // For test support

use std::sync::{Arc, Mutex};

use sparsegen::engine::{
	PipelineConfig, PipelineOutput, TASK_TEXT_GENERATION, TextGenerationEngine, TextGenerationPipeline, TokenSink,
};
use sparsegen::generation::{ChunkObserver, GenerationChunk};
use sparsegen::{Error, ModelIden};

pub type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>;

// region:    --- Common Constants

pub const MODEL_STUB: &str = "zoo:text_generation/tiny-base";

// endregion: --- Common Constants

// region:    --- Tracing

/// Initialize tracing for tests; honors `RUST_LOG`.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.try_init();
}

// endregion: --- Tracing

// region:    --- Mock Engine

/// Deterministic in-memory engine: every pipeline emits the configured
/// chunks, and the full text is their concatenation.
pub struct MockEngine {
	chunks: Vec<String>,
}

impl MockEngine {
	pub fn new(chunks: &[&str]) -> Arc<Self> {
		Arc::new(Self {
			chunks: chunks.iter().map(|s| s.to_string()).collect(),
		})
	}
}

impl TextGenerationEngine for MockEngine {
	fn name(&self) -> &'static str {
		"mock"
	}

	fn create_pipeline(
		&self,
		task: &str,
		model: &str,
		_config: &PipelineConfig,
	) -> sparsegen::Result<Arc<dyn TextGenerationPipeline>> {
		if task != TASK_TEXT_GENERATION {
			return Err(Error::EngineTaskNotSupported {
				engine_name: "mock",
				task: task.to_string(),
			});
		}
		Ok(Arc::new(MockPipeline {
			chunks: self.chunks.clone(),
			model_iden: ModelIden::new("mock", model),
		}))
	}
}

pub struct MockPipeline {
	chunks: Vec<String>,
	model_iden: ModelIden,
}

impl TextGenerationPipeline for MockPipeline {
	fn run(&self, _prompt: &str) -> sparsegen::Result<PipelineOutput> {
		Ok(PipelineOutput::from_sequence(self.chunks.concat()))
	}

	fn run_streaming(&self, _prompt: &str, sink: &mut dyn TokenSink) -> sparsegen::Result<PipelineOutput> {
		for chunk in &self.chunks {
			sink.push(chunk);
		}
		Ok(PipelineOutput::from_sequence(self.chunks.concat()))
	}
}

/// Engine whose pipelines fail on every invocation (creation succeeds).
pub struct FailingPipelineEngine;

impl FailingPipelineEngine {
	pub const CAUSE: &'static str = "engine invocation failed";

	pub fn new() -> Arc<Self> {
		Arc::new(Self)
	}
}

impl TextGenerationEngine for FailingPipelineEngine {
	fn name(&self) -> &'static str {
		"mock-failing"
	}

	fn create_pipeline(
		&self,
		_task: &str,
		model: &str,
		_config: &PipelineConfig,
	) -> sparsegen::Result<Arc<dyn TextGenerationPipeline>> {
		Ok(Arc::new(FailingPipeline {
			model_iden: ModelIden::new("mock-failing", model),
		}))
	}
}

pub struct FailingPipeline {
	model_iden: ModelIden,
}

impl FailingPipeline {
	fn fail(&self) -> sparsegen::Error {
		Error::Engine {
			model_iden: self.model_iden.clone(),
			cause: FailingPipelineEngine::CAUSE.to_string(),
		}
	}
}

impl TextGenerationPipeline for FailingPipeline {
	fn run(&self, _prompt: &str) -> sparsegen::Result<PipelineOutput> {
		Err(self.fail())
	}

	fn run_streaming(&self, _prompt: &str, _sink: &mut dyn TokenSink) -> sparsegen::Result<PipelineOutput> {
		Err(self.fail())
	}
}

// endregion: --- Mock Engine

// region:    --- Mock Engine Seeders

/// Full sentence, streamed in two chunks.
pub fn story_engine() -> Arc<MockEngine> {
	MockEngine::new(&["Once upon a time", " there was a cat."])
}

/// Word-by-word chunks.
pub fn words_engine() -> Arc<MockEngine> {
	MockEngine::new(&["Once", " upon", " a", " time"])
}

// endregion: --- Mock Engine Seeders

// region:    --- Recording Observer

/// Records every chunk it is notified of, in order.
#[derive(Default)]
pub struct RecordingObserver {
	seen: Mutex<Vec<String>>,
}

impl RecordingObserver {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn seen(&self) -> Vec<String> {
		self.seen.lock().unwrap().clone()
	}
}

impl ChunkObserver for RecordingObserver {
	fn on_chunk(&self, chunk: &GenerationChunk) {
		self.seen.lock().unwrap().push(chunk.content.clone());
	}
}

// endregion: --- Recording Observer
