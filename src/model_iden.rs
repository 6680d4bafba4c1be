use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The identity of a constructed pipeline: which engine runs it and which
/// model (path or registry stub) it was built from.
///
/// Carried on responses and errors so callers can attribute results when
/// multiple adapters are in play.
#[derive(Debug, Clone, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[display("{engine_name}:{model_name}")]
pub struct ModelIden {
	pub engine_name: Arc<str>,
	pub model_name: Arc<str>,
}

impl ModelIden {
	pub fn new(engine_name: impl Into<Arc<str>>, model_name: impl Into<Arc<str>>) -> Self {
		Self {
			engine_name: engine_name.into(),
			model_name: model_name.into(),
		}
	}
}
