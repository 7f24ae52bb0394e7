use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::{log_softmax, relu},
};
use serde::{Deserialize, Serialize};

/// The capability every registered classifier provides: map `[batch, seq_len]`
/// token ids to `[batch, num_classes]` log-probabilities.
pub trait SequenceClassifier<B: Backend> {
    fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2>;
    fn num_classes(&self) -> usize;
}

// ─── WordRNN ──────────────────────────────────────────────────────────────────

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct WordRnnConfig {
    pub vocab_size:    usize,
    pub num_classes:   usize,
    #[config(default = 128)]
    pub embedding_dim: usize,
    #[config(default = 128)]
    pub hidden_size:   usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
}

impl WordRnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordRnn<B> {
        WordRnn {
            embedding:   EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            lstm:        LstmConfig::new(self.embedding_dim, self.hidden_size, true).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
            output:      LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            num_classes: self.num_classes,
        }
    }
}

#[derive(Module, Debug)]
pub struct WordRnn<B: Backend> {
    pub embedding:   Embedding<B>,
    pub lstm:        Lstm<B>,
    pub dropout:     Dropout,
    pub output:      Linear<B>,
    pub num_classes: usize,
}

impl<B: Backend> SequenceClassifier<B> for WordRnn<B> {
    fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(token_ids); // [batch, seq_len, embedding_dim]
        let (_, state) = self.lstm.forward(x, None);
        let h = self.dropout.forward(state.hidden); // [batch, hidden_size]
        log_softmax(self.output.forward(h), 1)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

// ─── WordCNN ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct WordCnnConfig {
    pub vocab_size:    usize,
    pub num_classes:   usize,
    #[config(default = 128)]
    pub embedding_dim: usize,
    #[config(default = 100)]
    pub num_filters:   usize,
    #[config(default = 3)]
    pub kernel_size:   usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
}

impl WordCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordCnn<B> {
        // Padding k/2 keeps at least one output position for any sequence length.
        let conv = Conv1dConfig::new(self.embedding_dim, self.num_filters, self.kernel_size)
            .with_padding(PaddingConfig1d::Explicit(self.kernel_size / 2))
            .init(device);
        WordCnn {
            embedding:   EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            conv,
            dropout:     DropoutConfig::new(self.dropout).init(),
            output:      LinearConfig::new(self.num_filters, self.num_classes).init(device),
            num_classes: self.num_classes,
        }
    }
}

#[derive(Module, Debug)]
pub struct WordCnn<B: Backend> {
    pub embedding:   Embedding<B>,
    pub conv:        Conv1d<B>,
    pub dropout:     Dropout,
    pub output:      Linear<B>,
    pub num_classes: usize,
}

impl<B: Backend> SequenceClassifier<B> for WordCnn<B> {
    fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(token_ids).swap_dims(1, 2); // [batch, embedding_dim, seq_len]
        let features = relu(self.conv.forward(x)); // [batch, num_filters, positions]
        let pooled = features.max_dim(2).squeeze::<2>(2); // [batch, num_filters]
        log_softmax(self.output.forward(self.dropout.forward(pooled)), 1)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

// ─── WordBag ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct WordBagConfig {
    pub vocab_size:    usize,
    pub num_classes:   usize,
    #[config(default = 64)]
    pub embedding_dim: usize,
}

impl WordBagConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordBag<B> {
        WordBag {
            embedding:   EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            output:      LinearConfig::new(self.embedding_dim, self.num_classes).init(device),
            num_classes: self.num_classes,
        }
    }
}

/// Mean of the token embeddings followed by a linear layer.
#[derive(Module, Debug)]
pub struct WordBag<B: Backend> {
    pub embedding:   Embedding<B>,
    pub output:      Linear<B>,
    pub num_classes: usize,
}

impl<B: Backend> SequenceClassifier<B> for WordBag<B> {
    fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let pooled = self.embedding.forward(token_ids).mean_dim(1).squeeze::<2>(1);
        log_softmax(self.output.forward(pooled), 1)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────

/// Any registered classifier. This is the single module type the trainer,
/// optimizer and checkpoint code work with.
#[derive(Module, Debug)]
pub enum Classifier<B: Backend> {
    WordRnn(WordRnn<B>),
    WordCnn(WordCnn<B>),
    WordBag(WordBag<B>),
}

impl<B: Backend> SequenceClassifier<B> for Classifier<B> {
    fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        match self {
            Classifier::WordRnn(m) => m.forward(token_ids),
            Classifier::WordCnn(m) => m.forward(token_ids),
            Classifier::WordBag(m) => m.forward(token_ids),
        }
    }

    fn num_classes(&self) -> usize {
        match self {
            Classifier::WordRnn(m) => m.num_classes,
            Classifier::WordCnn(m) => m.num_classes,
            Classifier::WordBag(m) => m.num_classes,
        }
    }
}

/// Architecture of a classifier, enough to rebuild it before loading weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum ClassifierConfig {
    WordRnn(WordRnnConfig),
    WordCnn(WordCnnConfig),
    WordBag(WordBagConfig),
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        match self {
            ClassifierConfig::WordRnn(c) => Classifier::WordRnn(c.init(device)),
            ClassifierConfig::WordCnn(c) => Classifier::WordCnn(c.init(device)),
            ClassifierConfig::WordBag(c) => Classifier::WordBag(c.init(device)),
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            ClassifierConfig::WordRnn(c) => c.num_classes,
            ClassifierConfig::WordCnn(c) => c.num_classes,
            ClassifierConfig::WordBag(c) => c.num_classes,
        }
    }

    pub fn vocab_size(&self) -> usize {
        match self {
            ClassifierConfig::WordRnn(c) => c.vocab_size,
            ClassifierConfig::WordCnn(c) => c.vocab_size,
            ClassifierConfig::WordBag(c) => c.vocab_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ids(rows: &[[i32; 6]]) -> Tensor<TestBackend, 2, Int> {
        let flat: Vec<i32> = rows.iter().flatten().copied().collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &Default::default())
            .reshape([rows.len(), 6])
    }

    fn assert_log_probs(out: Tensor<TestBackend, 2>, batch: usize, classes: usize) {
        assert_eq!(out.dims(), [batch, classes]);
        let row_sums: Vec<f32> = out.exp().sum_dim(1).into_data().iter::<f32>().collect();
        for s in row_sums {
            assert!((s - 1.0).abs() < 1e-4, "row sums to {s}");
        }
    }

    #[test]
    fn test_every_variant_outputs_log_probabilities() {
        let device = Default::default();
        let input = [[2, 3, 4, 0, 0, 0], [5, 1, 1, 1, 6, 7]];
        let configs = [
            ClassifierConfig::WordRnn(WordRnnConfig::new(10, 3).with_embedding_dim(8).with_hidden_size(6)),
            ClassifierConfig::WordCnn(WordCnnConfig::new(10, 3).with_embedding_dim(8).with_num_filters(5)),
            ClassifierConfig::WordBag(WordBagConfig::new(10, 3).with_embedding_dim(8)),
        ];
        for config in configs {
            let model: Classifier<TestBackend> = config.init(&device);
            assert_eq!(model.num_classes(), 3);
            assert_log_probs(model.forward(ids(&input)), 2, 3);
        }
    }

    #[test]
    fn test_cnn_handles_sequences_shorter_than_kernel() {
        let device = Default::default();
        let model = WordCnnConfig::new(10, 2)
            .with_embedding_dim(4)
            .with_num_filters(3)
            .with_kernel_size(4)
            .init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 1, Int>::from_ints([2, 3].as_slice(), &device).reshape([1, 2]);
        assert_log_probs(model.forward(input), 1, 2);
    }

    #[test]
    fn test_config_serde_keeps_variant() {
        let config = ClassifierConfig::WordCnn(WordCnnConfig::new(50, 4).with_kernel_size(5));
        let json = serde_json::to_string(&config).unwrap();
        let back: ClassifierConfig = serde_json::from_str(&json).unwrap();
        match back {
            ClassifierConfig::WordCnn(c) => {
                assert_eq!(c.kernel_size, 5);
                assert_eq!(c.vocab_size, 50);
            }
            other => panic!("wrong variant {other:?}"),
        }
    }
}
