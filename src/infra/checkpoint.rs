// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Persists a trained classifier together with everything
// needed to use it again, in one file:
//
//   format_version  u32      bumped on incompatible layout changes
//   model_name      String   registry name ("WordRNN", ...)
//   model_config    String   JSON of the variant config
//   vocabulary      [String] tokens in id order
//   seq_len         u64      encoded length L used in training
//   parameters      bytes    Burn NamedMpk record, full precision
//
// The outer envelope is bincode. The model config is needed to
// rebuild the exact architecture before the parameters can be
// loaded into it.
//
// Writes go to a temporary file next to the destination and
// are renamed into place, so a crash never leaves a truncated
// checkpoint at the target path.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::CheckpointError;
use crate::ml::model::{Classifier, ClassifierConfig};

pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    format_version: u32,
    model_name:     String,
    model_config:   String,
    vocabulary:     Vec<String>,
    seq_len:        u64,
    parameters:     Vec<u8>,
}

/// Everything restored from a checkpoint file.
#[derive(Debug)]
pub struct LoadedCheckpoint<B: Backend> {
    pub model_name: String,
    pub config:     ClassifierConfig,
    pub model:      Classifier<B>,
    pub vocabulary: Vocabulary,
    pub seq_len:    usize,
}

/// Reads and writes a single checkpoint file.
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialise the model parameters, architecture, vocabulary and the
    /// sequence length it was trained with. Parent directories are created
    /// as needed.
    pub fn save<B: Backend>(
        &self,
        model_name: &str,
        config:     &ClassifierConfig,
        model:      &Classifier<B>,
        vocabulary: &Vocabulary,
        seq_len:    usize,
    ) -> Result<(), CheckpointError> {
        let parameters = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .record(model.clone().into_record(), ())
            .map_err(|e| CheckpointError::Record(e.to_string()))?;

        let file = CheckpointFile {
            format_version: FORMAT_VERSION,
            model_name:     model_name.to_string(),
            model_config:   serde_json::to_string(config)?,
            vocabulary:     vocabulary.tokens().to_vec(),
            seq_len:        seq_len as u64,
            parameters,
        };
        let bytes = bincode::serialize(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(parent, source))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, &bytes).map_err(|source| self.io_error(&tmp, source))?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(&self.path, source));
        }

        tracing::info!(
            "Saved {} checkpoint to '{}' ({} bytes, {} tokens)",
            model_name,
            self.path.display(),
            bytes.len(),
            vocabulary.len(),
        );
        Ok(())
    }

    /// Rebuild the model on `device` and restore its parameters.
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<LoadedCheckpoint<B>, CheckpointError> {
        let bytes = fs::read(&self.path).map_err(|source| self.io_error(&self.path, source))?;
        let file: CheckpointFile = bincode::deserialize(&bytes)?;

        if file.format_version != FORMAT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found:    file.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let config: ClassifierConfig = serde_json::from_str(&file.model_config)?;
        let vocabulary = Vocabulary::from_tokens(file.vocabulary).map_err(CheckpointError::Vocabulary)?;
        if vocabulary.len() > config.vocab_size() {
            return Err(CheckpointError::Vocabulary(format!(
                "{} tokens do not fit an embedding of {} rows",
                vocabulary.len(),
                config.vocab_size()
            )));
        }

        let record = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .load(file.parameters, device)
            .map_err(|e| CheckpointError::Record(e.to_string()))?;
        let model = config.init::<B>(device).load_record(record);

        tracing::info!("Loaded {} checkpoint from '{}'", file.model_name, self.path.display());
        Ok(LoadedCheckpoint {
            model_name: file.model_name,
            config,
            model,
            vocabulary,
            seq_len: file.seq_len as usize,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io { path: path.to_path_buf(), source }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{SequenceClassifier, WordCnnConfig, WordRnnConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn vocabulary() -> Vocabulary {
        Vocabulary::build(vec![vec!["good", "bad", "good", "fine"]], 10).unwrap()
    }

    fn ids() -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints([2, 3, 4, 1, 0, 2, 2, 0, 0, 0].as_slice(), &Default::default())
            .reshape([2, 5])
    }

    fn outputs(model: &Classifier<TestBackend>) -> Vec<f32> {
        model.forward(ids()).into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_save_then_load_gives_same_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("nested/dir/model.mpk"));
        let device = Default::default();
        let config = ClassifierConfig::WordRnn(WordRnnConfig::new(10, 3).with_embedding_dim(6).with_hidden_size(4));
        let model: Classifier<TestBackend> = config.init(&device);
        let vocab = vocabulary();

        manager.save("WordRNN", &config, &model, &vocab, 5).unwrap();
        let loaded = manager.load::<TestBackend>(&device).unwrap();

        assert_eq!(loaded.model_name, "WordRNN");
        assert_eq!(loaded.seq_len, 5);
        assert_eq!(loaded.vocabulary.tokens(), vocab.tokens());
        assert_eq!(loaded.model.num_classes(), 3);
        for (a, b) in outputs(&model).iter().zip(outputs(&loaded.model)) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.mpk");
        let manager = CheckpointManager::new(&path);
        let device = Default::default();
        let config = ClassifierConfig::WordCnn(WordCnnConfig::new(10, 2).with_embedding_dim(4).with_num_filters(3));
        let model: Classifier<TestBackend> = config.init(&device);

        manager.save("WordCNN", &config, &model, &vocabulary(), 5).unwrap();
        manager.save("WordCNN", &config, &model, &vocabulary(), 5).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("absent.mpk"));
        let err = manager.load::<TestBackend>(&Default::default()).unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.mpk");
        let file = CheckpointFile {
            format_version: FORMAT_VERSION + 1,
            model_name:     "WordBag".into(),
            model_config:   String::new(),
            vocabulary:     Vec::new(),
            seq_len:        5,
            parameters:     Vec::new(),
        };
        fs::write(&path, bincode::serialize(&file).unwrap()).unwrap();

        let err = CheckpointManager::new(&path).load::<TestBackend>(&Default::default()).unwrap_err();
        assert!(matches!(err, CheckpointError::UnsupportedVersion { .. }));
    }
}
