// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate settings           (Layer 2)
//   Step 2: Parse model arguments       (Layer 5 - ml)
//   Step 3: Resolve execution device    (Layer 5 - ml)
//   Step 4: Create model on the device  (Layer 5 - ml)
//   Step 5: Build optimizer             (Layer 5 - ml)
//   Step 6: Load the CSV corpus         (Layer 4 - data)
//   Step 7: Build vocabulary + store    (Layer 4 - data)
//   Step 8: Run training loop           (Layer 5 - ml)
//   Step 9: Save checkpoint             (Layer 6 - infra)
//   Step 10: Write metrics              (Layer 6 - infra)
//
// Steps 1-4 never touch the corpus, so a bad model name or
// argument is reported before any file is opened.
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{
    backend::{Autodiff, NdArray},
    optim::AdamConfig,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batch_loader::BatchLoader,
    dataset::ExampleStore,
    loader::CsvCorpusLoader,
    vocabulary::RESERVED_IDS,
};
use crate::domain::{error::ConfigError, traits::CorpusSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    device::ExecutionDevice,
    literal::{Literal, ModelArgs},
    registry::{ModelRegistry, DEFAULT_MODEL},
    trainer::{EpochReport, Trainer},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every setting of a training run. Serialisable so a run can be
// described in JSON as well as on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:       PathBuf,
    pub num_classes:     usize,
    pub dictionary_size: usize,
    pub seq_len:         usize,
    pub num_workers:     usize,
    pub model:           String,
    pub args:            Vec<String>,
    pub kwargs:          Vec<String>,
    pub use_gpu:         bool,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub learning_rate:   f64,
    pub save_path:       PathBuf,
    pub seed:            Option<u64>,
    pub text_column:     String,
    pub label_column:    String,
    pub metrics_path:    Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:       PathBuf::from("data/train.csv"),
            num_classes:     2,
            dictionary_size: 20_000,
            seq_len:         500,
            num_workers:     1,
            model:           DEFAULT_MODEL.to_string(),
            args:            Vec::new(),
            kwargs:          Vec::new(),
            use_gpu:         false,
            epochs:          10,
            batch_size:      128,
            learning_rate:   5e-4,
            save_path:       PathBuf::from("model.mpk"),
            seed:            None,
            text_column:     "text".to_string(),
            label_column:    "label".to_string(),
            metrics_path:    None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dictionary_size < RESERVED_IDS {
            return Err(ConfigError::CapacityTooSmall(self.dictionary_size));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be at least 1"));
        }
        if self.seq_len == 0 {
            return Err(invalid("seq_len", "must be at least 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", "must be a positive number"));
        }
        Ok(())
    }

    /// User arguments plus `vocab_size` / `num_classes` taken from this
    /// config for any model that leaves them unbound.
    pub fn model_args(&self) -> Result<ModelArgs, ConfigError> {
        Ok(ModelArgs::parse(&self.args, &self.kwargs)?
            .with_fallback("vocab_size", Literal::Int(self.dictionary_size as i64))
            .with_fallback("num_classes", Literal::Int(self.num_classes as i64)))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting { field: field.to_string(), reason: reason.to_string() }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub model_name:      String,
    pub device:          ExecutionDevice,
    pub examples:        usize,
    pub vocabulary_size: usize,
    pub epochs:          Vec<EpochReport>,
    pub checkpoint:      PathBuf,
}

impl TrainSummary {
    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(EpochReport::mean_loss)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:   TrainConfig,
    registry: ModelRegistry,
    progress: bool,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, registry: ModelRegistry::with_builtin(), progress: true }
    }

    /// Use a registry with extra or different entries.
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Suppress stdout progress lines.
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1-2: Settings and arguments ─────────────────────────────────
        cfg.validate().context("Invalid training configuration")?;
        let args = cfg.model_args().context("Invalid model arguments")?;

        // ── Step 3: Execution device ──────────────────────────────────────────
        let device = ExecutionDevice::resolve(cfg.use_gpu);
        tracing::info!("Training {} on {}", cfg.model, device);

        match device {
            ExecutionDevice::Cpu => self.run::<Autodiff<NdArray>>(&args, device, Default::default()),
            #[cfg(feature = "wgpu")]
            ExecutionDevice::Accelerator => self.run::<Autodiff<burn::backend::Wgpu>>(
                &args,
                device,
                burn::backend::wgpu::WgpuDevice::default(),
            ),
        }
    }

    fn run<B: AutodiffBackend>(
        &self,
        args:      &ModelArgs,
        execution: ExecutionDevice,
        device:    B::Device,
    ) -> Result<TrainSummary> {
        let cfg = &self.config;

        if let Some(seed) = cfg.seed {
            B::seed(seed);
        }

        // ── Step 4-5: Model + optimizer on the execution device ──────────────
        let (model_config, model) = self
            .registry
            .create::<B>(&cfg.model, args, &device)
            .with_context(|| format!("Cannot construct model '{}'", cfg.model))?;
        let mut optim = AdamConfig::new().init();

        // ── Step 6: Corpus ────────────────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_path.display());
        let examples = CsvCorpusLoader::new(&cfg.data_path)
            .with_columns(cfg.text_column.clone(), cfg.label_column.clone())
            .load_all()
            .with_context(|| format!("Cannot load corpus '{}'", cfg.data_path.display()))?;

        // ── Step 7: Vocabulary + lazily encoded store ─────────────────────────
        let store = ExampleStore::new(examples, cfg.dictionary_size, cfg.seq_len)?;
        tracing::info!(
            "{} examples, vocabulary of {} tokens, sequence length {}",
            store.count(),
            store.vocabulary().len(),
            store.seq_len()
        );
        if store.vocabulary().len() > model_config.vocab_size() {
            return Err(ConfigError::InvalidSetting {
                field:  "vocab_size".to_string(),
                reason: format!(
                    "model embeds {} ids but the vocabulary has {}",
                    model_config.vocab_size(),
                    store.vocabulary().len()
                ),
            }
            .into());
        }

        let mut loader = BatchLoader::new(cfg.batch_size, true, cfg.num_workers)?;
        if let Some(seed) = cfg.seed {
            loader = loader.with_seed(seed);
        }

        // ── Step 8: Training loop ─────────────────────────────────────────────
        let mut trainer = Trainer::<B>::new(cfg.epochs, cfg.learning_rate, device);
        if !self.progress {
            trainer = trainer.quiet();
        }
        let model = trainer.fit(model, &mut optim, &mut loader, &store)?;

        // ── Step 9: Checkpoint ────────────────────────────────────────────────
        CheckpointManager::new(&cfg.save_path)
            .save(&cfg.model, &model_config, &model, store.vocabulary(), store.seq_len())
            .with_context(|| format!("Cannot write checkpoint '{}'", cfg.save_path.display()))?;

        // ── Step 10: Metrics ──────────────────────────────────────────────────
        if let Some(path) = &cfg.metrics_path {
            MetricsLogger::new(path)?.log_all(trainer.history())?;
        }

        Ok(TrainSummary {
            model_name:      cfg.model.clone(),
            device:          execution,
            examples:        store.count(),
            vocabulary_size: store.vocabulary().len(),
            epochs:          trainer.history().to_vec(),
            checkpoint:      cfg.save_path.clone(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TrainError;
    use std::io::Write;

    fn corpus(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("train.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "text,label").unwrap();
        writeln!(f, "a wonderful film,1").unwrap();
        writeln!(f, "dull and slow,0").unwrap();
        writeln!(f, "wonderful acting,1").unwrap();
        writeln!(f, "slow dull plot,0").unwrap();
        path
    }

    fn small_config(dir: &tempfile::TempDir) -> TrainConfig {
        TrainConfig {
            data_path: corpus(dir),
            num_classes: 2,
            dictionary_size: 10,
            seq_len: 5,
            batch_size: 2,
            epochs: 1,
            model: "WordBag".to_string(),
            kwargs: vec!["embedding_dim=4".to_string()],
            save_path: dir.path().join("out/model.mpk"),
            seed: Some(7),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.model, "WordRNN");
        assert_eq!((cfg.dictionary_size, cfg.seq_len, cfg.batch_size), (20_000, 500, 128));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let too_small = TrainConfig { dictionary_size: 1, ..TrainConfig::default() };
        assert!(matches!(too_small.validate(), Err(ConfigError::CapacityTooSmall(1))));

        let no_batch = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(matches!(no_batch.validate(), Err(ConfigError::InvalidSetting { .. })));

        let zero_epochs = TrainConfig { epochs: 0, ..TrainConfig::default() };
        assert!(zero_epochs.validate().is_ok());
    }

    #[test]
    fn test_unknown_model_fails_before_data_loading() {
        let cfg = TrainConfig {
            data_path: PathBuf::from("/definitely/not/here.csv"),
            model: "NoSuchNet".to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).quiet().execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_malformed_literal_fails_before_data_loading() {
        let cfg = TrainConfig {
            data_path: PathBuf::from("/definitely/not/here.csv"),
            args: vec!["[1, 2".to_string()],
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).quiet().execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_four_example_run_writes_checkpoint_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = dir.path().join("metrics.csv");
        let cfg = TrainConfig { metrics_path: Some(metrics.clone()), ..small_config(&dir) };

        let summary = TrainUseCase::new(cfg).quiet().execute().unwrap();

        assert_eq!(summary.examples, 4);
        assert!(summary.vocabulary_size <= 10);
        assert_eq!(summary.epochs.len(), 1);
        assert_eq!(summary.epochs[0].loss.num_batches(), 2);
        let loss = summary.final_loss().unwrap();
        assert!(loss.is_finite() && loss >= 0.0);
        assert!(summary.checkpoint.exists());
        assert_eq!(std::fs::read_to_string(metrics).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_accelerator_request_completes() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { use_gpu: true, ..small_config(&dir) };

        let summary = TrainUseCase::new(cfg).quiet().execute().unwrap();

        #[cfg(not(feature = "wgpu"))]
        assert_eq!(summary.device, ExecutionDevice::Cpu);
        assert!(summary.checkpoint.exists());
    }

    #[test]
    fn test_zero_epochs_still_writes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { epochs: 0, ..small_config(&dir) };

        let summary = TrainUseCase::new(cfg).quiet().execute().unwrap();
        assert!(summary.epochs.is_empty());
        assert!(summary.final_loss().is_none());
        assert!(summary.checkpoint.exists());
    }

    #[test]
    fn test_label_outside_num_classes_aborts_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { num_classes: 1, ..small_config(&dir) };
        let save_path = cfg.save_path.clone();

        let err = TrainUseCase::new(cfg).quiet().execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrainError>(),
            Some(TrainError::LabelOutOfRange { .. })
        ));
        assert!(!save_path.exists());
    }

    #[test]
    fn test_diverging_loss_aborts_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { learning_rate: 1e38, epochs: 20, ..small_config(&dir) };
        let save_path = cfg.save_path.clone();

        let err = TrainUseCase::new(cfg).quiet().execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrainError>(),
            Some(TrainError::NonFiniteLoss { .. })
        ));
        assert!(!save_path.exists());
    }

    #[test]
    fn test_custom_registry_entry_is_trained() {
        use crate::ml::model::{ClassifierConfig, WordBagConfig};

        fn tiny_bag(name: &str, args: &ModelArgs) -> Result<ClassifierConfig, ConfigError> {
            let bound = args.bind(name, &["vocab_size", "num_classes"])?;
            Ok(ClassifierConfig::WordBag(
                WordBagConfig::new(bound.required_size("vocab_size")?, bound.required_size("num_classes")?)
                    .with_embedding_dim(2),
            ))
        }

        let dir = tempfile::tempdir().unwrap();
        let mut registry = ModelRegistry::new();
        registry.register("TinyBag", tiny_bag);
        let cfg = TrainConfig { model: "TinyBag".to_string(), kwargs: Vec::new(), ..small_config(&dir) };

        let summary = TrainUseCase::new(cfg.clone())
            .with_registry(registry)
            .quiet()
            .execute()
            .unwrap();
        assert_eq!(summary.model_name, "TinyBag");
        assert!(summary.checkpoint.exists());

        let err = TrainUseCase::new(cfg).quiet().execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownModel { .. })
        ));
    }
}
