//! Model configuration types.

use serde::{Deserialize, Serialize};

/// Which API a model is served through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenRouter's OpenAI-compatible endpoint
    OpenRouter,
    /// OpenAI directly
    OpenAi,
}

impl BackendKind {
    /// Base URL of the chat-completions API for this backend.
    pub fn base_url(&self) -> &'static str {
        match self {
            BackendKind::OpenRouter => "https://openrouter.ai/api/v1",
            BackendKind::OpenAi => "https://api.openai.com/v1",
        }
    }
}

/// One model configuration in a benchmark run.
///
/// Immutable once a run starts. `name` is the join key for results and must
/// be unique within a run; a duplicate is a configuration error caught by
/// plan construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Display name, unique within a run
    pub name: String,

    /// Backend-specific model identifier (also the pricing lookup key)
    pub model_id: String,

    /// Which API serves this model
    pub backend: BackendKind,

    /// Whether this model's client requires exclusive, serialized access.
    ///
    /// Isolated models each get a dedicated worker that owns its own client
    /// instance; shared-safe models go through the common worker pool.
    pub isolated: bool,
}

impl ModelSpec {
    /// Create a new model spec.
    pub fn new(
        name: impl Into<String>,
        model_id: impl Into<String>,
        backend: BackendKind,
        isolated: bool,
    ) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            backend,
            isolated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_urls() {
        assert!(BackendKind::OpenRouter.base_url().contains("openrouter.ai"));
        assert!(BackendKind::OpenAi.base_url().contains("api.openai.com"));
    }

    #[test]
    fn test_backend_kind_serde() {
        let json = serde_json::to_string(&BackendKind::OpenRouter).unwrap();
        assert_eq!(json, "\"openrouter\"");

        let parsed: BackendKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(parsed, BackendKind::OpenAi);
    }

    #[test]
    fn test_model_spec_roundtrip() {
        let spec = ModelSpec::new("GPT-5.1", "openai/gpt-5.1", BackendKind::OpenRouter, false);
        let json = serde_json::to_string(&spec).unwrap();
        let parsed: ModelSpec = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.name, "GPT-5.1");
        assert_eq!(parsed.model_id, "openai/gpt-5.1");
        assert!(!parsed.isolated);
    }
}
