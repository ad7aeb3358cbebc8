use std::str::FromStr;
use std::sync::Arc;

use gn_core::{Error, Result};

use crate::Config;

pub mod dummy;
pub mod openai;
pub mod scripted;

pub use dummy::DummyModel;
pub use gn_core::InferenceModel;
pub use openai::OpenAiModel;
pub use scripted::ScriptedModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    OpenAi,
    Dummy,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ModelKind::OpenAi),
            "dummy" | "demo" => Ok(ModelKind::Dummy),
            other => Err(Error::Config(format!(
                "Unknown model '{}'. Available models: openai, dummy",
                other
            ))),
        }
    }
}

/// Builds the configured provider. `openai` without an API key degrades to
/// the offline dummy provider.
pub fn create_model(config: &Config) -> Result<Arc<dyn InferenceModel>> {
    let kind = config
        .model_name
        .as_deref()
        .map(ModelKind::from_str)
        .transpose()?
        .unwrap_or(ModelKind::OpenAi);

    match kind {
        ModelKind::OpenAi if config.has_api_key() => Ok(Arc::new(OpenAiModel::new(config)?)),
        ModelKind::OpenAi => {
            tracing::warn!("⚠️ No OpenAI API key configured, running with the offline dummy model");
            Ok(Arc::new(DummyModel::new()))
        }
        ModelKind::Dummy => Ok(Arc::new(DummyModel::new())),
    }
}
