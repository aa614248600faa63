//! Task registry mapping dataset names to provider constructors.
//!
//! The registry stores constructors (closures) rather than provider
//! instances, so a provider can be created fresh per run. New datasets are
//! added by registration, not by editing a dispatch chain.
//!
//! # Example
//!
//! ```
//! use qabench_runner::{JsonlDataset, TaskRegistry};
//! use std::path::PathBuf;
//!
//! let mut registry = TaskRegistry::with_defaults();
//! registry.register("my_task", || {
//!     Ok(Box::new(JsonlDataset::new(PathBuf::from("my_task.jsonl"))))
//! });
//!
//! assert!(registry.contains("hotpotqa"));
//! assert!(registry.contains("my_task"));
//! ```

use crate::dataset::{DatasetError, DatasetProvider, HotpotQA};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for a dataset provider.
///
/// Construction itself can fail (e.g. no resolvable cache directory), so
/// factories return a `Result`.
pub type ProviderFactory =
    Arc<dyn Fn() -> Result<Box<dyn DatasetProvider>, DatasetError> + Send + Sync>;

/// Registry of available benchmark tasks.
pub struct TaskRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the built-in tasks registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("hotpotqa", || Ok(Box::new(HotpotQA::new()?)));
        registry
    }

    /// Register a task by name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn DatasetProvider>, DatasetError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Construct the provider for a task name.
    ///
    /// Returns `None` for unregistered names.
    pub fn get(&self, name: &str) -> Option<Result<Box<dyn DatasetProvider>, DatasetError>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// All registered task names, sorted alphabetically.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Whether a task name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
