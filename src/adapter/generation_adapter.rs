use std::sync::{Arc, mpsc as std_mpsc};
use std::thread;

use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::engine::{
	PipelineConfig, TASK_TEXT_GENERATION, TextGenerationEngine, TextGenerationPipeline, TokenSink, default_engine,
};
use crate::generation::{
	ChunkObserver, GenerationChunk, GenerationRequest, GenerationResponse, GenerationStream, GenerationStreamIter,
	GenerationStreamResponse, truncate_at_stop_sequences,
};
use crate::{Error, ModelIden, Result};

/// Output budget applied when the user configuration does not set one.
const DEFAULT_MAX_GENERATED_TOKENS: u64 = 128;

/// Streaming channel capacity; the worker blocks once the consumer falls
/// this far behind.
const STREAM_CHANNEL_CAPACITY: usize = 32;

// region:    --- GenerationAdapter

/// Exposes one engine pipeline behind the uniform language-model calling
/// convention: a display name, identifying parameters, and the four
/// generate/stream operations.
///
/// The pipeline handle is created once, at construction, and is immutable
/// afterward. The adapter holds no other state; concurrent calls share only
/// whatever the engine handle internally guarantees.
pub struct GenerationAdapter {
	model_iden: ModelIden,
	config: Option<PipelineConfig>,
	streaming: bool,
	observer: Option<Arc<dyn ChunkObserver>>,
	pipeline: Arc<dyn TextGenerationPipeline>,
}

/// Constructors
impl GenerationAdapter {
	/// Start building an adapter for `model` (a path or registry stub).
	pub fn builder(model: impl Into<String>) -> GenerationAdapterBuilder {
		GenerationAdapterBuilder {
			model: model.into(),
			config: None,
			streaming: false,
			observer: None,
			engine: None,
		}
	}
}

/// Identity
impl GenerationAdapter {
	/// The display name of this language model implementation (the engine
	/// name).
	pub fn llm_type(&self) -> &str {
		&self.model_iden.engine_name
	}

	pub fn model_iden(&self) -> &ModelIden {
		&self.model_iden
	}

	/// The identifying parameters: the model identifier plus the
	/// user-supplied configuration (not the merged one).
	pub fn identifying_params(&self) -> serde_json::Map<String, Value> {
		let mut params = serde_json::Map::new();
		params.insert("model".to_string(), json!(self.model_iden.model_name.as_ref()));
		params.insert(
			"config".to_string(),
			match &self.config {
				Some(config) => Value::Object(config.clone()),
				None => Value::Null,
			},
		);
		params
	}
}

/// Generate operations
impl GenerationAdapter {
	/// Generate the full text for `req`, blocking the calling thread.
	///
	/// With streaming disabled, the pipeline runs in one shot and the first
	/// produced sequence is the output. With streaming enabled, the chunks
	/// of a [`stream`](Self::stream) call are concatenated (the observer, if
	/// any, sees each chunk). Either way, stop sequences then truncate the
	/// full text at the earliest match.
	pub fn generate(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
		let text = if self.streaming {
			let mut text = String::new();
			for chunk in self.stream(req)? {
				text.push_str(&chunk?.content);
			}
			text
		} else {
			self.pipeline.run(&req.prompt)?.into_first_sequence(&self.model_iden)?
		};

		Ok(self.finalize_response(text, &req.stop_sequences))
	}

	/// Same contract as [`generate`](Self::generate), awaitable without
	/// blocking the cooperative scheduler.
	pub async fn agenerate(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
		let text = if self.streaming {
			let mut stream_response = self.astream(req).await?;
			let mut text = String::new();
			while let Some(chunk) = stream_response.stream.next().await {
				text.push_str(&chunk?.content);
			}
			text
		} else {
			let pipeline = Arc::clone(&self.pipeline);
			let prompt = req.prompt.clone();
			let output = tokio::task::spawn_blocking(move || pipeline.run(&prompt))
				.await
				.map_err(|join_err| Error::Internal(format!("Generation task panicked: {join_err}")))??;
			output.into_first_sequence(&self.model_iden)?
		};

		Ok(self.finalize_response(text, &req.stop_sequences))
	}

	fn finalize_response(&self, text: String, stop_sequences: &[String]) -> GenerationResponse {
		let content = truncate_at_stop_sequences(&text, stop_sequences).to_string();
		GenerationResponse {
			content,
			model_iden: self.model_iden.clone(),
		}
	}
}

/// Stream operations
impl GenerationAdapter {
	/// Stream the chunks for `req` as a lazy, finite iterator.
	///
	/// Spawns one background worker thread that runs the pipeline while the
	/// iterator drains its channel; once the channel closes, the worker is
	/// joined before the iterator terminates. The request's stop sequences
	/// are NOT applied to the emitted chunks; callers that concatenate
	/// apply them on the full text, as [`generate`](Self::generate) does.
	pub fn stream(&self, req: &GenerationRequest) -> Result<GenerationStreamIter> {
		self.debug_stream_stop_contract(req);

		let (tx, rx) = std_mpsc::sync_channel(STREAM_CHANNEL_CAPACITY);
		let pipeline = Arc::clone(&self.pipeline);
		let observer = self.observer.clone();
		let prompt = req.prompt.clone();

		let worker = thread::Builder::new()
			.name("sparsegen-stream".to_string())
			.spawn(move || {
				let mut sink = SyncChannelSink { tx, observer };
				pipeline.run_streaming(&prompt, &mut sink).map(|_| ())
			})
			.map_err(|e| Error::Internal(format!("Failed to spawn stream worker: {e}")))?;

		Ok(GenerationStreamIter::new(rx, worker))
	}

	/// Async variant of [`stream`](Self::stream): one blocking worker task
	/// feeds the returned stream. Same stop-sequence contract.
	pub async fn astream(&self, req: &GenerationRequest) -> Result<GenerationStreamResponse> {
		self.debug_stream_stop_contract(req);

		let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
		let pipeline = Arc::clone(&self.pipeline);
		let observer = self.observer.clone();
		let prompt = req.prompt.clone();

		let worker = tokio::task::spawn_blocking(move || {
			let mut sink = ChannelSink { tx, observer };
			pipeline.run_streaming(&prompt, &mut sink).map(|_| ())
		});

		Ok(GenerationStreamResponse {
			stream: GenerationStream::new(rx, worker),
			model_iden: self.model_iden.clone(),
		})
	}

	fn debug_stream_stop_contract(&self, req: &GenerationRequest) {
		if !req.stop_sequences.is_empty() {
			tracing::debug!(
				model = %self.model_iden,
				"stop sequences apply to the concatenated text, not to streamed chunks"
			);
		}
	}
}

// endregion: --- GenerationAdapter

// region:    --- GenerationAdapterBuilder

/// Builder for [`GenerationAdapter`]. The pipeline is constructed at
/// [`build`](Self::build) time and never re-created afterward.
pub struct GenerationAdapterBuilder {
	model: String,
	config: Option<PipelineConfig>,
	streaming: bool,
	observer: Option<Arc<dyn ChunkObserver>>,
	engine: Option<Arc<dyn TextGenerationEngine>>,
}

/// Chainable Setters
impl GenerationAdapterBuilder {
	/// Engine-specific configuration, forwarded to pipeline creation as
	/// keyword-style options (merged over the adapter's base settings).
	#[must_use]
	pub fn with_config(mut self, config: PipelineConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// When enabled, `generate`/`agenerate` run through the streaming path
	/// and concatenate the chunks.
	#[must_use]
	pub fn with_streaming(mut self, streaming: bool) -> Self {
		self.streaming = streaming;
		self
	}

	/// Observer notified of every streamed chunk.
	#[must_use]
	pub fn with_observer(mut self, observer: Arc<dyn ChunkObserver>) -> Self {
		self.observer = Some(observer);
		self
	}

	/// Inject an engine instead of resolving the build's default one.
	#[must_use]
	pub fn with_engine(mut self, engine: Arc<dyn TextGenerationEngine>) -> Self {
		self.engine = Some(engine);
		self
	}
}

/// Build
impl GenerationAdapterBuilder {
	/// Resolve the engine and construct the pipeline handle.
	///
	/// Fails with [`Error::DependencyMissing`] when no engine is injected
	/// and none is compiled into this build; engine failures during pipeline
	/// creation propagate unchanged.
	pub fn build(self) -> Result<GenerationAdapter> {
		let engine = match self.engine {
			Some(engine) => engine,
			None => default_engine()?,
		};

		let merged_config = merged_pipeline_config(self.config.as_ref());
		let pipeline = engine.create_pipeline(TASK_TEXT_GENERATION, &self.model, &merged_config)?;

		let model_iden = ModelIden::new(engine.name(), self.model);
		tracing::debug!(model = %model_iden, streaming = self.streaming, "generation pipeline created");

		Ok(GenerationAdapter {
			model_iden,
			config: self.config,
			streaming: self.streaming,
			observer: self.observer,
			pipeline,
		})
	}
}

/// Base settings first, user entries override.
fn merged_pipeline_config(user_config: Option<&PipelineConfig>) -> PipelineConfig {
	let mut config = PipelineConfig::new();
	config.insert("max_generated_tokens".to_string(), json!(DEFAULT_MAX_GENERATED_TOKENS));

	if let Some(user_config) = user_config {
		for (key, value) in user_config {
			config.insert(key.clone(), value.clone());
		}
	}

	config
}

// endregion: --- GenerationAdapterBuilder

// region:    --- Channel Sinks

/// Sink feeding the async stream's channel. Send failures are ignored so a
/// consumer that stopped iterating does not cancel the pipeline run; the
/// observer keeps being notified either way.
struct ChannelSink {
	tx: mpsc::Sender<GenerationChunk>,
	observer: Option<Arc<dyn ChunkObserver>>,
}

impl TokenSink for ChannelSink {
	fn push(&mut self, text: &str) {
		let chunk = GenerationChunk::new(text);
		if let Some(observer) = &self.observer {
			observer.on_chunk(&chunk);
		}
		let _ = self.tx.blocking_send(chunk);
	}
}

/// Sync-thread counterpart of [`ChannelSink`].
struct SyncChannelSink {
	tx: std_mpsc::SyncSender<GenerationChunk>,
	observer: Option<Arc<dyn ChunkObserver>>,
}

impl TokenSink for SyncChannelSink {
	fn push(&mut self, text: &str) {
		let chunk = GenerationChunk::new(text);
		if let Some(observer) = &self.observer {
			observer.on_chunk(&chunk);
		}
		let _ = self.tx.send(chunk);
	}
}

// endregion: --- Channel Sinks
