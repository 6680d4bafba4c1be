//! NativeEngine implementation of the engine contract on top of the
//! llama.cpp bindings.

use std::num::NonZeroU32;
use std::sync::Arc;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::{AddBos, Special};
use llama_cpp_2::sampling::LlamaSampler;
use serde_json::Value;

use crate::engine::{
	PipelineConfig, PipelineOutput, TASK_TEXT_GENERATION, TextGenerationEngine, TextGenerationPipeline, TokenSink,
};
use crate::{Error, ModelIden, Result};

use super::model_manager::{LoadedModel, ModelManager, resolve_model_path};

/// Generation settings read from the pipeline configuration mapping.
/// Unknown entries are ignored.
#[derive(Debug, Clone)]
struct GenerationParams {
	max_generated_tokens: u32,
	context_length: Option<u32>,
	temperature: Option<f64>,
	top_p: Option<f64>,
	seed: Option<u32>,
}

impl GenerationParams {
	fn from_config(config: &PipelineConfig) -> Self {
		Self {
			max_generated_tokens: config
				.get("max_generated_tokens")
				.and_then(Value::as_u64)
				.map(|v| v as u32)
				.unwrap_or(128),
			context_length: config.get("context_length").and_then(Value::as_u64).map(|v| v as u32),
			temperature: config.get("temperature").and_then(Value::as_f64),
			top_p: config.get("top_p").and_then(Value::as_f64),
			seed: config.get("seed").and_then(Value::as_u64).map(|v| v as u32),
		}
	}
}

/// Native engine handle. Stateless; loaded models are cached process-wide by
/// the [`ModelManager`].
#[derive(Debug, Default)]
pub struct NativeEngine;

impl NativeEngine {
	pub const NAME: &'static str = "llamacpp";
}

impl TextGenerationEngine for NativeEngine {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	fn create_pipeline(
		&self,
		task: &str,
		model: &str,
		config: &PipelineConfig,
	) -> Result<Arc<dyn TextGenerationPipeline>> {
		if task != TASK_TEXT_GENERATION {
			return Err(Error::EngineTaskNotSupported {
				engine_name: Self::NAME,
				task: task.to_string(),
			});
		}

		let model_iden = ModelIden::new(Self::NAME, model);
		let model_path = resolve_model_path(model)?;

		let model_manager = ModelManager::instance()?;
		let loaded_model = model_manager.load_model(&model_path)?;

		tracing::debug!("native pipeline ready for {}", model_path.display());

		Ok(Arc::new(NativePipeline {
			model_iden,
			loaded_model,
			params: GenerationParams::from_config(config),
		}))
	}
}

/// A constructed pipeline: a loaded model plus its generation settings.
/// Contexts are created per invocation (llama.cpp contexts are not shareable
/// across threads).
pub struct NativePipeline {
	model_iden: ModelIden,
	loaded_model: Arc<LoadedModel>,
	params: GenerationParams,
}

impl TextGenerationPipeline for NativePipeline {
	fn run(&self, prompt: &str) -> Result<PipelineOutput> {
		self.generate(prompt, None)
	}

	fn run_streaming(&self, prompt: &str, sink: &mut dyn TokenSink) -> Result<PipelineOutput> {
		self.generate(prompt, Some(sink))
	}
}

impl NativePipeline {
	fn generate(&self, prompt: &str, mut sink: Option<&mut dyn TokenSink>) -> Result<PipelineOutput> {
		let model_manager = ModelManager::instance()?;
		let model = &self.loaded_model.model;
		let max_tokens = self.params.max_generated_tokens as usize;

		// Size the context to fit the prompt plus the output budget.
		let mut context_params = LlamaContextParams::default();
		let context_size = self
			.params
			.context_length
			.unwrap_or((self.params.max_generated_tokens * 2).max(2048));
		if let Some(ctx_size) = NonZeroU32::new(context_size) {
			context_params = context_params.with_n_ctx(Some(ctx_size));
		}

		let mut context = model
			.new_context(model_manager.backend(), context_params)
			.map_err(|e| self.engine_err(format!("Failed to create context: {e}")))?;

		let tokens = model
			.str_to_token(prompt, AddBos::Always)
			.map_err(|e| self.engine_err(format!("Failed to tokenize prompt: {e}")))?;

		let mut batch = LlamaBatch::new(512, 1);
		let last_index = tokens.len() as i32 - 1;
		for (i, token) in (0_i32..).zip(tokens.into_iter()) {
			batch
				.add(token, i, &[0], i == last_index)
				.map_err(|e| self.engine_err(format!("Failed to add token to batch: {e}")))?;
		}

		context
			.decode(&mut batch)
			.map_err(|e| self.engine_err(format!("Failed to decode prompt batch: {e}")))?;

		let mut sampler = self.create_sampler();
		let n_ctx = context.n_ctx() as i32;
		let mut n_cur = batch.n_tokens();
		let mut generated_text = String::new();
		let mut decoder = encoding_rs::UTF_8.new_decoder();

		for _ in 0..max_tokens {
			let token = sampler.sample(&context, batch.n_tokens() - 1);
			sampler.accept(token);

			if model.is_eog_token(token) {
				break;
			}

			let token_bytes = model
				.token_to_bytes(token, Special::Tokenize)
				.map_err(|e| self.engine_err(format!("Failed to convert token to bytes: {e}")))?;

			// Token bytes can split a UTF-8 sequence; the decoder carries the
			// partial state across tokens.
			let mut token_text = String::with_capacity(32);
			let _ = decoder.decode_to_string(&token_bytes, &mut token_text, false);

			generated_text.push_str(&token_text);
			if let Some(sink) = sink.as_deref_mut() {
				sink.push(&token_text);
			}

			batch.clear();
			batch
				.add(token, n_cur, &[0], true)
				.map_err(|e| self.engine_err(format!("Failed to add token to batch: {e}")))?;

			context
				.decode(&mut batch)
				.map_err(|e| self.engine_err(format!("Failed to decode batch: {e}")))?;

			n_cur += 1;
			if n_cur >= n_ctx {
				break;
			}
		}

		Ok(PipelineOutput::from_sequence(generated_text))
	}

	fn create_sampler(&self) -> LlamaSampler {
		let mut samplers = Vec::new();

		if let Some(temperature) = self.params.temperature {
			samplers.push(LlamaSampler::temp(temperature as f32));
		}

		if let Some(top_p) = self.params.top_p {
			samplers.push(LlamaSampler::top_p(top_p as f32, 1));
		}

		// Greedy unless sampling options were given.
		if samplers.is_empty() {
			samplers.push(LlamaSampler::greedy());
		} else {
			samplers.push(LlamaSampler::dist(self.params.seed.unwrap_or(1234)));
		}

		LlamaSampler::chain(samplers, false)
	}

	fn engine_err(&self, cause: String) -> Error {
		Error::Engine {
			model_iden: self.model_iden.clone(),
			cause,
		}
	}
}
