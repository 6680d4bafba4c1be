//! Tests for engine resolution, the construction contract, and the adapter's
//! identity surface.

mod support;

use crate::support::{MODEL_STUB, Result, story_engine};
use serde_json::json;
use sparsegen::engine::{PipelineConfig, TASK_TEXT_GENERATION, TextGenerationEngine};
use sparsegen::{Error, GenerationAdapter};

// region:    --- Engine Resolution

#[cfg(not(feature = "llamacpp"))]
#[test]
fn test_default_engine_dependency_missing() -> Result<()> {
	let Err(err) = sparsegen::engine::default_engine() else {
		return Err("default_engine should fail without an engine binding".into());
	};

	assert!(matches!(err, Error::DependencyMissing { .. }));
	// The error must name the install step.
	assert!(err.to_string().contains("llamacpp"));

	Ok(())
}

#[cfg(not(feature = "llamacpp"))]
#[test]
fn test_build_without_engine_fails_dependency_missing() -> Result<()> {
	let result = GenerationAdapter::builder(MODEL_STUB).build();

	assert!(matches!(result, Err(Error::DependencyMissing { .. })));

	Ok(())
}

// endregion: --- Engine Resolution

// region:    --- Construction Contract

#[test]
fn test_build_with_injected_engine_ok() -> Result<()> {
	let adapter = GenerationAdapter::builder(MODEL_STUB).with_engine(story_engine()).build()?;

	assert_eq!(adapter.llm_type(), "mock");
	assert_eq!(adapter.model_iden().model_name.as_ref(), MODEL_STUB);

	Ok(())
}

#[test]
fn test_engine_rejects_unknown_task() -> Result<()> {
	let engine = story_engine();

	let result = engine.create_pipeline("image_generation", MODEL_STUB, &PipelineConfig::new());

	assert!(matches!(result, Err(Error::EngineTaskNotSupported { .. })));

	Ok(())
}

#[test]
fn test_build_uses_text_generation_task_ok() -> Result<()> {
	// The mock engine rejects any task but TASK_TEXT_GENERATION, so a
	// successful build proves the adapter fixes the task correctly.
	assert_eq!(TASK_TEXT_GENERATION, "text_generation");
	GenerationAdapter::builder(MODEL_STUB).with_engine(story_engine()).build()?;

	Ok(())
}

// endregion: --- Construction Contract

// region:    --- Identifying Params

#[test]
fn test_identifying_params_without_config_ok() -> Result<()> {
	let adapter = GenerationAdapter::builder(MODEL_STUB).with_engine(story_engine()).build()?;

	let params = adapter.identifying_params();

	assert_eq!(params.get("model"), Some(&json!(MODEL_STUB)));
	assert_eq!(params.get("config"), Some(&serde_json::Value::Null));

	Ok(())
}

#[test]
fn test_identifying_params_reports_user_config_ok() -> Result<()> {
	let mut config = PipelineConfig::new();
	config.insert("temperature".to_string(), json!(0.7));

	let adapter = GenerationAdapter::builder(MODEL_STUB)
		.with_engine(story_engine())
		.with_config(config.clone())
		.build()?;

	let params = adapter.identifying_params();

	// The user-supplied config is reported as-is (no merged base settings).
	assert_eq!(params.get("config"), Some(&serde_json::Value::Object(config)));

	Ok(())
}

// endregion: --- Identifying Params

// region:    --- Native Engine

// These tests require the `llamacpp` feature; the generation test also
// requires an actual model file and is ignored by default, as with any
// local-model integration test.

#[cfg(feature = "llamacpp")]
#[test]
fn test_native_resolve_model_path_absolute_ok() -> Result<()> {
	use sparsegen::engine::native::model_manager::resolve_model_path;

	let abs_path = "/absolute/path/to/model.gguf";
	let resolved = resolve_model_path(abs_path)?;
	assert_eq!(resolved.to_string_lossy(), abs_path);

	Ok(())
}

#[cfg(feature = "llamacpp")]
#[tokio::test]
#[ignore = "Requires actual GGUF model file"]
async fn test_native_generate_basic_ok() -> Result<()> {
	use sparsegen::generation::GenerationRequest;

	// Point this at a real .gguf file to run.
	let model_path = "/path/to/test-model.gguf";

	let adapter = GenerationAdapter::builder(model_path).build()?;
	let res = adapter.agenerate(&GenerationRequest::new("Once upon a time")).await?;

	assert!(!res.content_as_str().is_empty());

	Ok(())
}

// endregion: --- Native Engine
