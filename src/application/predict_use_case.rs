// ============================================================
// Layer 2 - Predict Use Case
// ============================================================
// Loads a checkpoint written by `train` and classifies each
// input text with the vocabulary stored in it. The encoded
// length defaults to the one the model was trained with.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};

use crate::ml::inferencer::{Inferencer, Prediction};

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(checkpoint: PathBuf, seq_len: Option<usize>) -> Result<Self> {
        ensure!(seq_len != Some(0), "seq_len must be at least 1");
        let inferencer = Inferencer::from_checkpoint(&checkpoint, seq_len).with_context(|| {
            format!(
                "Cannot load checkpoint '{}'. Have you run 'train' first?",
                checkpoint.display()
            )
        })?;
        Ok(Self { inferencer })
    }

    pub fn model_name(&self) -> &str {
        self.inferencer.model_name()
    }

    pub fn seq_len(&self) -> usize {
        self.inferencer.seq_len()
    }

    pub fn predict(&self, texts: &[String]) -> Vec<Prediction> {
        tracing::debug!("Classifying {} texts", texts.len());
        self.inferencer.predict(texts)
    }
}
