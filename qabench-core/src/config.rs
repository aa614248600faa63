//! Benchmark and client configuration.

use crate::error::ConfigError;
use crate::model::{BackendKind, ModelSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a benchmark run.
///
/// Loadable from a JSON file for custom comparisons; the default is a
/// five-model set comparing one direct baseline against four recursive
/// models of decreasing size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Models to compare. The first model is the head-to-head baseline.
    #[serde(default = "default_models")]
    pub models: Vec<ModelSpec>,

    /// Cap on examples per task (None = the whole dataset)
    #[serde(default = "default_max_samples")]
    pub max_samples: Option<usize>,

    /// Directory for result artifacts and reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Shuffle examples deterministically before applying the sample cap
    #[serde(default)]
    pub shuffle: bool,
}

fn default_models() -> Vec<ModelSpec> {
    vec![
        // Baseline: large model answering directly over the full context
        ModelSpec::new("GPT-5.1", "openai/gpt-5.1", BackendKind::OpenRouter, false),
        // Recursive models, large to tiny
        ModelSpec::new(
            "GPT-4o-mini (recursive)",
            "openai/gpt-4o-mini",
            BackendKind::OpenRouter,
            true,
        ),
        ModelSpec::new(
            "GLM-4.7 (recursive)",
            "z-ai/glm-4.7",
            BackendKind::OpenRouter,
            true,
        ),
        ModelSpec::new(
            "MiniMax M2.1 (recursive)",
            "minimax/minimax-m2.1",
            BackendKind::OpenRouter,
            true,
        ),
        ModelSpec::new(
            "Mimo v2 Flash (recursive)",
            "xiaomi/mimo-v2-flash",
            BackendKind::OpenRouter,
            true,
        ),
    ]
}

fn default_max_samples() -> Option<usize> {
    Some(10)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            max_samples: default_max_samples(),
            output_dir: default_output_dir(),
            shuffle: false,
        }
    }
}

impl BenchmarkConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the model list for the errors that must abort before dispatch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        let mut seen = std::collections::HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModelName(model.name.clone()));
            }
        }
        Ok(())
    }
}

/// Configuration for backend clients.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    /// Timeout for individual API requests
    ///
    /// Default: 120 seconds
    pub timeout: Duration,

    /// Maximum tokens per completion
    ///
    /// Default: 1024
    pub max_tokens: u32,

    /// Sampling temperature. Benchmarks want reproducible answers.
    ///
    /// Default: 0.0
    pub temperature: f32,

    /// Context chunk size in characters for the recursive client
    ///
    /// Default: 6000
    pub chunk_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_tokens: 1024,
            temperature: 0.0,
            chunk_chars: 6000,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum tokens per completion.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the context chunk size for the recursive client.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchmarkConfig::default();

        assert_eq!(config.models.len(), 5);
        // Baseline is the only shared-safe model and comes first
        assert!(!config.models[0].isolated);
        assert!(config.models[1..].iter().all(|m| m.isolated));
        assert_eq!(config.max_samples, Some(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_models() {
        let config = BenchmarkConfig {
            models: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoModels)));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let config = BenchmarkConfig {
            models: vec![
                ModelSpec::new("same", "a", BackendKind::OpenRouter, false),
                ModelSpec::new("same", "b", BackendKind::OpenRouter, true),
            ],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateModelName(name)) if name == "same"
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "models": [
                {"name": "m1", "model_id": "x/y", "backend": "openrouter", "isolated": false}
            ],
            "max_samples": 3
        }"#;

        let config: BenchmarkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.max_samples, Some(3));
        // Unspecified fields fall back to defaults
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert!(!config.shuffle);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_max_tokens(256)
            .with_temperature(0.2)
            .with_chunk_chars(0);

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.chunk_chars, 1); // Clamped
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 1024);
    }
}
