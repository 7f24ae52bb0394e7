// ============================================================
// Layer 5 - Model Registry
// ============================================================
// Maps a stable model name to a function that turns bound
// constructor arguments into a ClassifierConfig:
//
//   "WordRNN" → word_rnn(args)  → ClassifierConfig::WordRnn
//   "WordCNN" → word_cnn(args)  → ClassifierConfig::WordCnn
//   "WordBag" → word_bag(args)  → ClassifierConfig::WordBag
//
// create() = lookup + argument binding + init on the given
// device. Lookup and binding never touch the backend, so a
// bad name or bad argument fails before any data is read.

use std::collections::BTreeMap;

use burn::prelude::*;

use crate::domain::error::ConfigError;
use crate::ml::literal::ModelArgs;
use crate::ml::model::{Classifier, ClassifierConfig, WordBagConfig, WordCnnConfig, WordRnnConfig};

/// Turns constructor arguments into a variant config, or explains why not.
pub type Constructor = fn(name: &str, args: &ModelArgs) -> Result<ClassifierConfig, ConfigError>;

pub const DEFAULT_MODEL: &str = "WordRNN";

pub struct ModelRegistry {
    entries: BTreeMap<String, Constructor>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// A registry holding every built-in classifier.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("WordRNN", word_rnn);
        registry.register("WordCNN", word_cnn);
        registry.register("WordBag", word_bag);
        registry
    }

    /// Add or replace an entry.
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        self.entries.insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Resolve `name` and bind `args` without building any tensors.
    pub fn resolve(&self, name: &str, args: &ModelArgs) -> Result<ClassifierConfig, ConfigError> {
        let constructor = self.entries.get(name).ok_or_else(|| ConfigError::UnknownModel {
            name: name.to_string(),
            available: self.names().join(", "),
        })?;
        constructor(name, args)
    }

    /// Resolve `name` and initialise the classifier on `device`.
    pub fn create<B: Backend>(
        &self,
        name: &str,
        args: &ModelArgs,
        device: &B::Device,
    ) -> Result<(ClassifierConfig, Classifier<B>), ConfigError> {
        let config = self.resolve(name, args)?;
        tracing::info!("Creating model {}: {:?}", name, config);
        let model = config.init(device);
        Ok((config, model))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

// ─── Built-in constructors ────────────────────────────────────────────────────

fn word_rnn(name: &str, args: &ModelArgs) -> Result<ClassifierConfig, ConfigError> {
    const PARAMS: &[&str] = &["vocab_size", "num_classes", "embedding_dim", "hidden_size", "dropout"];
    let bound = args.bind(name, PARAMS)?;

    let mut config = WordRnnConfig::new(
        bound.required_size("vocab_size")?,
        bound.required_size("num_classes")?,
    );
    if let Some(v) = bound.size("embedding_dim")? {
        config = config.with_embedding_dim(v);
    }
    if let Some(v) = bound.size("hidden_size")? {
        config = config.with_hidden_size(v);
    }
    if let Some(v) = bound.probability("dropout")? {
        config = config.with_dropout(v);
    }
    Ok(ClassifierConfig::WordRnn(config))
}

fn word_cnn(name: &str, args: &ModelArgs) -> Result<ClassifierConfig, ConfigError> {
    const PARAMS: &[&str] = &[
        "vocab_size",
        "num_classes",
        "embedding_dim",
        "num_filters",
        "kernel_size",
        "dropout",
    ];
    let bound = args.bind(name, PARAMS)?;

    let mut config = WordCnnConfig::new(
        bound.required_size("vocab_size")?,
        bound.required_size("num_classes")?,
    );
    if let Some(v) = bound.size("embedding_dim")? {
        config = config.with_embedding_dim(v);
    }
    if let Some(v) = bound.size("num_filters")? {
        config = config.with_num_filters(v);
    }
    if let Some(v) = bound.size("kernel_size")? {
        config = config.with_kernel_size(v);
    }
    if let Some(v) = bound.probability("dropout")? {
        config = config.with_dropout(v);
    }
    Ok(ClassifierConfig::WordCnn(config))
}

fn word_bag(name: &str, args: &ModelArgs) -> Result<ClassifierConfig, ConfigError> {
    const PARAMS: &[&str] = &["vocab_size", "num_classes", "embedding_dim"];
    let bound = args.bind(name, PARAMS)?;

    let mut config = WordBagConfig::new(
        bound.required_size("vocab_size")?,
        bound.required_size("num_classes")?,
    );
    if let Some(v) = bound.size("embedding_dim")? {
        config = config.with_embedding_dim(v);
    }
    Ok(ClassifierConfig::WordBag(config))
}
