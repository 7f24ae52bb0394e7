// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Epoch/batch state machine:
//
//   Idle ──fit()──▶ EpochRunning(1) ─▶ ... ─▶ EpochRunning(E) ─▶ Completed
//
// Per batch:
//   1. tensors are created on the execution device by the batcher
//   2. log_probs = model.forward(token_ids)        [batch, classes]
//   3. loss = mean_i( -log_probs[i, label_i] )      (NLL)
//   4. backward → fresh gradients → one Adam step (model is replaced)
//   5. the scalar loss is appended to the epoch accumulator
//
// Epoch loss = unweighted mean of batch losses; 0 for an epoch
// without batches. The size-weighted mean is tracked alongside.
// Any failure inside a batch aborts the run.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::io::Write;

use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::data::batch_loader::BatchLoader;
use crate::data::batcher::{TextBatch, TextBatcher};
use crate::data::dataset::ExampleStore;
use crate::domain::error::TrainError;
use crate::ml::model::{Classifier, SequenceClassifier};

/// Mean negative log-likelihood of `labels` under `log_probs`.
///
/// log_probs: [batch, classes], labels: [batch] → loss: [1]
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    log_probs
        .gather(1, labels.unsqueeze_dim::<2>(1))
        .neg()
        .mean()
}

// ─── EpochLoss ────────────────────────────────────────────────────────────────
/// Per-epoch accumulator of batch losses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochLoss {
    batches: Vec<(f64, usize)>,
}

impl EpochLoss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, loss: f64, batch_size: usize) {
        self.batches.push((loss, batch_size));
    }

    pub fn batch_losses(&self) -> Vec<f64> {
        self.batches.iter().map(|(loss, _)| *loss).collect()
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn num_examples(&self) -> usize {
        self.batches.iter().map(|(_, n)| n).sum()
    }

    /// Arithmetic mean over batches (a short final batch counts as much as a
    /// full one). 0 when no batch was recorded.
    pub fn mean(&self) -> f64 {
        if self.batches.is_empty() {
            return 0.0;
        }
        self.batches.iter().map(|(loss, _)| loss).sum::<f64>() / self.batches.len() as f64
    }

    /// Mean over examples, each batch weighted by its size. 0 when empty.
    pub fn weighted_mean(&self) -> f64 {
        let examples = self.num_examples();
        if examples == 0 {
            return 0.0;
        }
        self.batches
            .iter()
            .map(|(loss, n)| loss * *n as f64)
            .sum::<f64>()
            / examples as f64
    }
}

/// Summary of one finished epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: EpochLoss,
}

impl EpochReport {
    pub fn mean_loss(&self) -> f64 {
        self.loss.mean()
    }
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Idle,
    EpochRunning { epoch: usize },
    Completed,
}

/// Drives a model and an optimizer it does not own through `epochs` epochs.
pub struct Trainer<B: AutodiffBackend> {
    epochs: usize,
    learning_rate: f64,
    batcher: TextBatcher<B>,
    state: TrainerState,
    history: Vec<EpochReport>,
    progress: bool,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(epochs: usize, learning_rate: f64, device: B::Device) -> Self {
        Self {
            epochs,
            learning_rate,
            batcher: TextBatcher::new(device),
            state: TrainerState::Idle,
            history: Vec::new(),
            progress: true,
        }
    }

    /// Disable the stdout progress lines (tracing output is unaffected).
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn history(&self) -> &[EpochReport] {
        &self.history
    }

    /// Run every epoch and return the trained model.
    pub fn fit<O>(
        &mut self,
        mut model: Classifier<B>,
        optim: &mut O,
        loader: &mut BatchLoader,
        store: &ExampleStore,
    ) -> Result<Classifier<B>, TrainError>
    where
        O: Optimizer<Classifier<B>, B>,
    {
        match self.state {
            TrainerState::Idle => {}
            TrainerState::Completed => return Err(TrainError::AlreadyCompleted),
            TrainerState::EpochRunning { epoch } => return Err(TrainError::Aborted { epoch }),
        }

        for epoch in 1..=self.epochs {
            self.state = TrainerState::EpochRunning { epoch };
            if self.progress {
                print!("Start epoch {epoch}");
                let _ = std::io::stdout().flush();
            }

            let batches = loader.epoch(store).map(|items| self.batcher.batch(items));
            let (trained, loss) = train_epoch(model, batches, optim, self.learning_rate, epoch)?;
            model = trained;

            if self.progress {
                println!("\rEpoch {} loss: {:6.4}", epoch, loss.mean());
            }
            tracing::info!(
                "Epoch {}/{} | loss={:.4} | weighted_loss={:.4} | batches={} | examples={}",
                epoch,
                self.epochs,
                loss.mean(),
                loss.weighted_mean(),
                loss.num_batches(),
                loss.num_examples(),
            );
            self.history.push(EpochReport { epoch, loss });
        }

        self.state = TrainerState::Completed;
        tracing::info!("Training complete after {} epochs", self.epochs);
        Ok(model)
    }
}

/// One pass over `batches`: forward, NLL, backward, optimizer step per batch.
pub fn train_epoch<B, O, I>(
    mut model: Classifier<B>,
    batches: I,
    optim: &mut O,
    learning_rate: f64,
    epoch: usize,
) -> Result<(Classifier<B>, EpochLoss), TrainError>
where
    B: AutodiffBackend,
    O: Optimizer<Classifier<B>, B>,
    I: IntoIterator<Item = TextBatch<B>>,
{
    let mut losses = EpochLoss::new();

    for (index, batch) in batches.into_iter().enumerate() {
        let batch_no = index + 1;
        let batch_size = batch.size();

        let log_probs = model.forward(batch.token_ids);
        let num_classes = log_probs.dims()[1];

        let max_label = batch.labels.clone().max().into_scalar().elem::<i64>();
        if max_label < 0 || max_label as usize >= num_classes {
            return Err(TrainError::LabelOutOfRange {
                epoch,
                batch: batch_no,
                label: max_label,
                num_classes,
            });
        }

        let loss = nll_loss(log_probs, batch.labels);
        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_value.is_finite() {
            return Err(TrainError::NonFiniteLoss {
                epoch,
                batch: batch_no,
                value: loss_value,
            });
        }

        // Backward pass + optimizer update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(learning_rate, model, grads);

        losses.push(loss_value, batch_size);
        tracing::debug!("Epoch {} batch {}: loss={:.6} (n={})", epoch, batch_no, loss_value, batch_size);
    }

    Ok((model, losses))
}

/// Log-probabilities of the trained model on the inner (non-autodiff) backend.
pub fn predict_log_probs<B: AutodiffBackend>(
    model: &Classifier<B>,
    token_ids: Tensor<B::InnerBackend, 2, Int>,
) -> Tensor<B::InnerBackend, 2> {
    model.valid().forward(token_ids)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::Example;
    use crate::ml::model::{ClassifierConfig, WordBagConfig, WordRnnConfig};
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::AdamConfig;

    type TestBackend = Autodiff<NdArray>;

    fn example(text: &str, label: usize) -> Example {
        Example::new(text.split_whitespace().map(str::to_string).collect(), label)
    }

    fn four_examples() -> ExampleStore {
        ExampleStore::new(
            vec![
                example("good great fine", 1),
                example("bad awful", 0),
                example("great good", 1),
                example("awful bad terrible", 0),
            ],
            10,
            5,
        )
        .unwrap()
    }

    fn bag(num_classes: usize) -> Classifier<TestBackend> {
        ClassifierConfig::WordBag(WordBagConfig::new(10, num_classes).with_embedding_dim(4))
            .init(&Default::default())
    }

    #[test]
    fn test_epoch_loss_means() {
        let mut loss = EpochLoss::new();
        assert_eq!(loss.mean(), 0.0);
        assert_eq!(loss.weighted_mean(), 0.0);

        loss.push(1.0, 4);
        loss.push(3.0, 1);
        assert_eq!(loss.mean(), 2.0);
        assert!((loss.weighted_mean() - 7.0 / 5.0).abs() < 1e-12);
        assert_eq!(loss.num_batches(), 2);
        assert_eq!(loss.num_examples(), 5);
    }

    #[test]
    fn test_nll_loss_matches_hand_computation() {
        let device = Default::default();
        let log_probs = Tensor::<NdArray, 2>::from_floats(
            [[0.5f32.ln(), 0.5f32.ln()], [0.25f32.ln(), 0.75f32.ln()]],
            &device,
        );
        let labels = Tensor::<NdArray, 1, Int>::from_ints([0, 1], &device);
        let loss: f32 = nll_loss(log_probs, labels).into_scalar().elem();
        let expected = -(0.5f32.ln() + 0.75f32.ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-6);
    }

    #[test]
    fn test_four_examples_two_batches_one_epoch() {
        let store = four_examples();
        let mut loader = BatchLoader::new(2, true, 1).unwrap().with_seed(1);
        let mut optim = AdamConfig::new().init();
        let mut trainer = Trainer::<TestBackend>::new(1, 5e-4, Default::default()).quiet();

        trainer.fit(bag(2), &mut optim, &mut loader, &store).unwrap();

        assert_eq!(trainer.state(), TrainerState::Completed);
        let report = &trainer.history()[0];
        let losses = report.loss.batch_losses();
        assert_eq!(losses.len(), 2);
        assert!(losses.iter().all(|l| l.is_finite() && *l >= 0.0));
        assert!((report.mean_loss() - (losses[0] + losses[1]) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_dataset_reports_zero_loss() {
        let store = ExampleStore::new(Vec::new(), 10, 5).unwrap();
        let mut loader = BatchLoader::new(2, true, 1).unwrap();
        let mut optim = AdamConfig::new().init();
        let mut trainer = Trainer::<TestBackend>::new(2, 5e-4, Default::default()).quiet();

        trainer.fit(bag(2), &mut optim, &mut loader, &store).unwrap();

        assert_eq!(trainer.history().len(), 2);
        assert!(trainer.history().iter().all(|r| r.mean_loss() == 0.0));
        assert_eq!(trainer.state(), TrainerState::Completed);
    }

    #[test]
    fn test_fit_twice_is_rejected() {
        let store = four_examples();
        let mut loader = BatchLoader::new(4, false, 1).unwrap();
        let mut optim = AdamConfig::new().init();
        let mut trainer = Trainer::<TestBackend>::new(1, 5e-4, Default::default()).quiet();

        let model = trainer.fit(bag(2), &mut optim, &mut loader, &store).unwrap();
        let err = trainer.fit(model, &mut optim, &mut loader, &store).unwrap_err();
        assert!(matches!(err, TrainError::AlreadyCompleted));
    }

    #[test]
    fn test_label_beyond_model_output_aborts() {
        let store = four_examples();
        let mut loader = BatchLoader::new(4, false, 1).unwrap();
        let mut optim = AdamConfig::new().init();
        let mut trainer = Trainer::<TestBackend>::new(1, 5e-4, Default::default()).quiet();

        // Labels go up to 1 but the model only has one class.
        let err = trainer.fit(bag(1), &mut optim, &mut loader, &store).unwrap_err();
        assert!(matches!(err, TrainError::LabelOutOfRange { label: 1, num_classes: 1, .. }));
        assert!(matches!(trainer.state(), TrainerState::EpochRunning { epoch: 1 }));

        let err = trainer.fit(bag(1), &mut optim, &mut loader, &store).unwrap_err();
        assert!(matches!(err, TrainError::Aborted { epoch: 1 }));
    }

    #[test]
    fn test_diverging_loss_is_fatal() {
        let store = four_examples();
        let mut loader = BatchLoader::new(2, false, 1).unwrap();
        let mut optim = AdamConfig::new().init();
        let mut trainer = Trainer::<TestBackend>::new(20, 1e38, Default::default()).quiet();

        let err = trainer.fit(bag(2), &mut optim, &mut loader, &store).unwrap_err();
        match err {
            TrainError::NonFiniteLoss { value, .. } => assert!(!value.is_finite()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(trainer.state(), TrainerState::EpochRunning { .. }));
    }

    #[test]
    fn test_loss_decreases_on_separable_data() {
        let store = four_examples();
        let mut loader = BatchLoader::new(4, false, 1).unwrap();
        let mut optim = AdamConfig::new().init();
        let mut trainer = Trainer::<TestBackend>::new(30, 5e-2, Default::default()).quiet();

        trainer.fit(bag(2), &mut optim, &mut loader, &store).unwrap();

        let first = trainer.history().first().unwrap().mean_loss();
        let last = trainer.history().last().unwrap().mean_loss();
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_content_past_truncation_does_not_change_predictions() {
        let device = Default::default();
        let model: Classifier<TestBackend> =
            ClassifierConfig::WordRnn(WordRnnConfig::new(10, 2).with_embedding_dim(4).with_hidden_size(3))
                .init(&device);
        let store = ExampleStore::new(
            vec![
                example("a b c d e f", 0),
                example("a b c d e x y z", 1),
            ],
            10,
            5,
        )
        .unwrap();

        let batcher = TextBatcher::<NdArray>::new(device);
        use burn::data::dataset::Dataset;
        let batch = batcher.batch(vec![store.get(0).unwrap(), store.get(1).unwrap()]);
        let out: Vec<f32> = predict_log_probs(&model, batch.token_ids)
            .into_data()
            .iter::<f32>()
            .collect();
        for (a, b) in out[0..2].iter().zip(&out[2..4]) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
