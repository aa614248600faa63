//! Dataset providers for benchmark tasks.
//!
//! Provides the [`DatasetProvider`] trait and loaders for HotpotQA and
//! generic JSONL files. Loading is deterministic: the same sample cap and
//! shuffle seed always produce the same example sequence.

use async_trait::async_trait;
use qabench_core::Example;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors that can occur when loading datasets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatasetError {
    /// Failed to download dataset
    #[error("failed to download dataset: {0}")]
    Download(String),

    /// Failed to read dataset file
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse dataset
    #[error("failed to parse dataset: {0}")]
    Parse(String),

    /// Cache directory could not be created
    #[error("failed to create cache directory: {0}")]
    CacheDir(String),
}

/// Trait for benchmark dataset providers.
///
/// Implementations produce the ordered, finite example sequence a run
/// evaluates. Given the same cap and seed, `load` must return the same
/// sequence.
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// The name of this dataset (used in reports and artifact file names).
    fn name(&self) -> &str;

    /// Load examples, optionally shuffled with a seed before the cap is
    /// applied.
    async fn load(
        &self,
        sample_cap: Option<usize>,
        shuffle_seed: Option<u64>,
    ) -> Result<Vec<Example>, DatasetError>;
}

/// Shuffle-then-cap, shared by all providers.
fn apply_sampling(
    mut examples: Vec<Example>,
    sample_cap: Option<usize>,
    shuffle_seed: Option<u64>,
) -> Vec<Example> {
    if let Some(seed) = shuffle_seed {
        let mut rng = StdRng::seed_from_u64(seed);
        examples.shuffle(&mut rng);
    }
    if let Some(cap) = sample_cap {
        examples.truncate(cap);
    }
    examples
}

/// HotpotQA dataset loader.
///
/// Automatically downloads and caches the dev set (distractor setting) from
/// the official source. The distractor configuration includes hard negative
/// paragraphs, so the context is genuinely long.
///
/// # Example
///
/// ```no_run
/// use qabench_runner::{DatasetProvider, HotpotQA};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dataset = HotpotQA::new()?;
/// let examples = dataset.load(Some(10), None).await?;
/// println!("Loaded {} examples", examples.len());
/// # Ok(())
/// # }
/// ```
pub struct HotpotQA {
    /// Cache directory, or the file itself when loading directly
    path: PathBuf,
    /// Download URL (empty when loading from a local file)
    url: String,
    is_direct_path: bool,
}

impl HotpotQA {
    /// Default URL for the HotpotQA dev set (distractor setting).
    const DEFAULT_URL: &'static str =
        "http://curtis.ml.cmu.edu/datasets/hotpot/hotpot_dev_distractor_v1.json";

    /// Cache filename
    const CACHE_FILE: &'static str = "hotpot_dev_distractor_v1.json";

    /// Create a loader with the default cache directory
    /// (`~/.cache/qabench/hotpotqa/`).
    pub fn new() -> Result<Self, DatasetError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| DatasetError::CacheDir("could not find cache directory".to_string()))?
            .join("qabench")
            .join("hotpotqa");

        Ok(Self {
            path: cache_dir,
            url: Self::DEFAULT_URL.to_string(),
            is_direct_path: false,
        })
    }

    /// Create a loader with a custom cache directory.
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir,
            url: Self::DEFAULT_URL.to_string(),
            is_direct_path: false,
        }
    }

    /// Create a loader from a pre-downloaded dataset file (skips download).
    pub fn from_file(path: PathBuf) -> Self {
        Self {
            path,
            url: String::new(),
            is_direct_path: true,
        }
    }

    fn cache_path(&self) -> PathBuf {
        if self.is_direct_path {
            self.path.clone()
        } else {
            self.path.join(Self::CACHE_FILE)
        }
    }

    async fn ensure_downloaded(&self) -> Result<PathBuf, DatasetError> {
        let cache_path = self.cache_path();

        if cache_path.exists() {
            log::debug!("using HotpotQA from {:?}", cache_path);
            return Ok(cache_path);
        }

        if self.url.is_empty() {
            return Err(DatasetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("HotpotQA file not found: {:?}", cache_path),
            )));
        }

        fs::create_dir_all(&self.path).await.map_err(|e| {
            DatasetError::CacheDir(format!("failed to create {:?}: {}", self.path, e))
        })?;

        log::info!("downloading HotpotQA dataset...");
        let response = reqwest::get(&self.url)
            .await
            .map_err(|e| DatasetError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DatasetError::Download(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DatasetError::Download(e.to_string()))?;

        fs::write(&cache_path, &bytes).await?;
        log::info!("cached HotpotQA to {:?}", cache_path);

        Ok(cache_path)
    }

    /// Flatten a HotpotQA context (title, sentences) list into one text.
    fn format_context(context: &[(String, Vec<String>)]) -> String {
        let mut text = String::new();
        for (title, sentences) in context {
            text.push_str("Title: ");
            text.push_str(title);
            text.push('\n');
            for sentence in sentences {
                text.push_str(sentence);
            }
            text.push_str("\n\n");
        }
        text.trim_end().to_string()
    }
}

#[async_trait]
impl DatasetProvider for HotpotQA {
    fn name(&self) -> &str {
        "hotpotqa"
    }

    async fn load(
        &self,
        sample_cap: Option<usize>,
        shuffle_seed: Option<u64>,
    ) -> Result<Vec<Example>, DatasetError> {
        let path = self.ensure_downloaded().await?;

        let content = fs::read_to_string(&path).await?;
        let data: Vec<HotpotQAEntry> =
            serde_json::from_str(&content).map_err(|e| DatasetError::Parse(e.to_string()))?;

        let examples: Vec<Example> = data
            .into_iter()
            .map(|entry| Example {
                id: entry.id,
                question: entry.question,
                context: Self::format_context(&entry.context),
                gold_answer: entry.answer,
            })
            .collect();

        Ok(apply_sampling(examples, sample_cap, shuffle_seed))
    }
}

/// One entry of the raw HotpotQA JSON.
#[derive(Deserialize)]
struct HotpotQAEntry {
    #[serde(rename = "_id")]
    id: String,
    question: String,
    answer: String,
    /// List of (title, sentences) pairs
    context: Vec<(String, Vec<String>)>,
}

/// A dataset loaded from a newline-delimited JSON file.
///
/// Each line is an object with `question`, `context`, and `gold_answer`
/// (or `answer`) fields; `id` is optional and defaults to the line index.
///
/// # Example line
///
/// ```json
/// {"id": "q1", "question": "2+2?", "context": "arithmetic", "gold_answer": "4"}
/// ```
pub struct JsonlDataset {
    path: PathBuf,
    name: String,
}

impl JsonlDataset {
    /// Create a dataset from a JSONL file, named after the file stem.
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("jsonl_dataset")
            .to_string();

        Self { path, name }
    }

    /// Create a dataset with a custom name.
    pub fn with_name(path: PathBuf, name: impl Into<String>) -> Self {
        Self {
            path,
            name: name.into(),
        }
    }
}

#[async_trait]
impl DatasetProvider for JsonlDataset {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(
        &self,
        sample_cap: Option<usize>,
        shuffle_seed: Option<u64>,
    ) -> Result<Vec<Example>, DatasetError> {
        let content = fs::read_to_string(&self.path).await?;

        let mut examples = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: JsonlEntry =
                serde_json::from_str(line).map_err(|e| DatasetError::Parse(e.to_string()))?;

            examples.push(Example {
                id: entry
                    .id
                    .unwrap_or_else(|| format!("{}_{}", self.name, idx)),
                question: entry.question,
                context: entry.context.unwrap_or_default(),
                gold_answer: entry.gold_answer.or(entry.answer).unwrap_or_default(),
            });
        }

        Ok(apply_sampling(examples, sample_cap, shuffle_seed))
    }
}

#[derive(Deserialize)]
struct JsonlEntry {
    #[serde(default)]
    id: Option<String>,
    question: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    gold_answer: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}
