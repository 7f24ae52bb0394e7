// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Loads a checkpoint on the CPU backend and classifies raw
// texts with the vocabulary stored alongside the weights:
//
//   text → tokenize → encode(seq_len) → forward → argmax
//
// Texts are encoded to the length stored in the checkpoint
// unless the caller overrides it.
//
// The reported probability is exp(log_prob) of the winning
// class.
use std::path::Path;

use burn::{backend::NdArray, data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batcher::TextBatcher;
use crate::data::tokenizer::Tokenizer;
use crate::data::vocabulary::{encode, Vocabulary};
use crate::domain::error::CheckpointError;
use crate::domain::example::EncodedExample;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{Classifier, SequenceClassifier};

type InferBackend = NdArray;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label:       usize,
    pub probability: f64,
}

pub struct Inferencer {
    model_name: String,
    model:      Classifier<InferBackend>,
    vocabulary: Vocabulary,
    tokenizer:  Tokenizer,
    seq_len:    usize,
    batcher:    TextBatcher<InferBackend>,
}

impl Inferencer {
    pub fn from_checkpoint(path: impl AsRef<Path>, seq_len: Option<usize>) -> Result<Self, CheckpointError> {
        let device = Default::default();
        let loaded = CheckpointManager::new(path.as_ref()).load::<InferBackend>(&device)?;
        tracing::info!(
            "Model {} loaded ({} classes, {} tokens)",
            loaded.model_name,
            loaded.config.num_classes(),
            loaded.vocabulary.len()
        );
        let seq_len = seq_len.unwrap_or(loaded.seq_len);
        Ok(Self {
            model_name: loaded.model_name,
            model:      loaded.model,
            vocabulary: loaded.vocabulary,
            tokenizer:  Tokenizer::new(),
            seq_len,
            batcher:    TextBatcher::new(device),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Classify every text in one forward pass.
    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Prediction> {
        if texts.is_empty() {
            return Vec::new();
        }

        let items: Vec<EncodedExample> = texts
            .iter()
            .map(|text| {
                let tokens = self.tokenizer.tokenize(text.as_ref());
                EncodedExample { token_ids: encode(&tokens, &self.vocabulary, self.seq_len), label: 0 }
            })
            .collect();
        let batch = self.batcher.batch(items);

        let num_classes = self.model.num_classes();
        let log_probs: Vec<f32> = self.model.forward(batch.token_ids).into_data().iter::<f32>().collect();

        log_probs
            .chunks(num_classes)
            .map(|row| {
                let (label, best) = row
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
                Prediction { label, probability: f64::from(best).exp() }
            })
            .collect()
    }
}
