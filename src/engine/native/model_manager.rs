//! ModelManager handles loading and caching of native engine models to avoid
//! reloading the same model multiple times.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::model::LlamaModel;
use llama_cpp_2::model::params::LlamaModelParams;

use crate::{Error, Result};

/// A cached loaded model with the path it was loaded from.
pub struct LoadedModel {
	pub model: Arc<LlamaModel>,
	pub model_path: PathBuf,
}

/// Process-wide manager owning the backend and the model cache.
pub struct ModelManager {
	backend: Arc<LlamaBackend>,
	models: RwLock<HashMap<String, Arc<LoadedModel>>>,
}

// Backend init may only happen once per process, so the first init result
// (success or failure) is cached for the process lifetime.
static MODEL_MANAGER: OnceLock<core::result::Result<Arc<ModelManager>, String>> = OnceLock::new();

impl ModelManager {
	/// Get or initialize the process-wide ModelManager instance.
	pub fn instance() -> Result<Arc<ModelManager>> {
		MODEL_MANAGER
			.get_or_init(|| {
				LlamaBackend::init()
					.map(|backend| {
						Arc::new(ModelManager {
							backend: Arc::new(backend),
							models: RwLock::new(HashMap::new()),
						})
					})
					.map_err(|e| format!("Failed to initialize llama backend: {e}"))
			})
			.clone()
			.map_err(Error::Internal)
	}

	/// Get a reference to the backend.
	pub fn backend(&self) -> &LlamaBackend {
		&self.backend
	}

	/// Load a model from the specified path, using the cache if already loaded.
	pub fn load_model(&self, model_path: &Path) -> Result<Arc<LoadedModel>> {
		let path_str = model_path.to_string_lossy().to_string();

		{
			let models = self
				.models
				.read()
				.map_err(|e| Error::Internal(format!("Failed to read models cache: {e}")))?;

			if let Some(cached_model) = models.get(&path_str) {
				return Ok(cached_model.clone());
			}
		}

		let loaded_model = self.load_model_from_disk(model_path)?;

		let mut models = self
			.models
			.write()
			.map_err(|e| Error::Internal(format!("Failed to write to models cache: {e}")))?;

		// Another caller may have loaded it while we were; keep the first.
		let loaded_model = models
			.entry(path_str)
			.or_insert_with(|| Arc::new(loaded_model))
			.clone();

		Ok(loaded_model)
	}

	fn load_model_from_disk(&self, model_path: &Path) -> Result<LoadedModel> {
		if !model_path.exists() {
			return Err(Error::Internal(format!(
				"Model file not found: {}",
				model_path.display()
			)));
		}

		let model_params = LlamaModelParams::default();

		let model = LlamaModel::load_from_file(&self.backend, model_path, &model_params)
			.map_err(|e| Error::Internal(format!("Failed to load model: {e}")))?;

		Ok(LoadedModel {
			model: Arc::new(model),
			model_path: model_path.to_owned(),
		})
	}

	/// Get the number of cached models.
	pub fn cache_size(&self) -> Result<usize> {
		let models = self
			.models
			.read()
			.map_err(|e| Error::Internal(format!("Failed to read models cache: {e}")))?;

		Ok(models.len())
	}
}

/// Resolve a model identifier to a file path:
/// - Absolute path: "/path/to/model.gguf"
/// - `.gguf` filename: looked up in common model directories
/// - Relative path: used as-is if it exists
pub fn resolve_model_path(model_name: &str) -> Result<PathBuf> {
	let path = Path::new(model_name);

	if path.is_absolute() {
		return Ok(path.to_owned());
	}

	if model_name.ends_with(".gguf") {
		let common_dirs = ["~/.cache/huggingface/hub", "~/.cache/llama-models", "./models"];

		for dir in &common_dirs {
			let expanded_dir = shellexpand::tilde(dir);
			let full_path = Path::new(expanded_dir.as_ref()).join(model_name);
			if full_path.exists() {
				return Ok(full_path);
			}
		}
	}

	if path.exists() {
		return Ok(path.to_owned());
	}

	Err(Error::Internal(format!(
		"Could not resolve model path for: {model_name}"
	)))
}
