// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::registry::DEFAULT_MODEL;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a sequence classifier on a labelled CSV corpus
    Train(TrainArgs),

    /// Classify texts with a saved checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with a text column and an integer label column
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,

    /// Number of output classes; labels must lie in 0..num_classes
    #[arg(short = 'c', long)]
    pub num_classes: usize,

    /// Vocabulary capacity, including the padding and unknown ids
    #[arg(long, default_value_t = 20_000)]
    pub dictionary_size: usize,

    /// Every example is truncated or padded to this many ids
    #[arg(long, default_value_t = 500)]
    pub seq_len: usize,

    /// Threads used to encode examples
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Registered model name (WordRNN, WordCNN, WordBag)
    #[arg(short = 'm', long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Positional constructor arguments, e.g. `--args 20000 2 64`
    #[arg(long, num_args = 0.., allow_negative_numbers = true)]
    pub args: Vec<String>,

    /// Keyword constructor arguments, e.g. `--kwargs hidden_size=64 dropout=0.2`
    #[arg(long, num_args = 0.., allow_negative_numbers = true)]
    pub kwargs: Vec<String>,

    /// Use the GPU backend when available, otherwise fall back to CPU
    #[arg(long)]
    pub gpu: bool,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Adam step size
    #[arg(long = "learning-rate", visible_alias = "lr", default_value_t = 5e-4)]
    pub learning_rate: f64,

    /// Checkpoint destination; parent directories are created
    #[arg(short = 'p', long, default_value = "model.mpk")]
    pub save_path: PathBuf,

    /// Fix the shuffle order and weight initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "text")]
    pub text_column: String,

    #[arg(long, default_value = "label")]
    pub label_column: String,

    /// Append per-epoch losses to this CSV file
    #[arg(long)]
    pub metrics_path: Option<PathBuf>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:       a.data,
            num_classes:     a.num_classes,
            dictionary_size: a.dictionary_size,
            seq_len:         a.seq_len,
            num_workers:     a.num_workers,
            model:           a.model,
            args:            a.args,
            kwargs:          a.kwargs,
            use_gpu:         a.gpu,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            learning_rate:   a.learning_rate,
            save_path:       a.save_path,
            seed:            a.seed,
            text_column:     a.text_column,
            label_column:    a.label_column,
            metrics_path:    a.metrics_path,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Checkpoint written by `train`
    #[arg(long, default_value = "model.mpk")]
    pub checkpoint: PathBuf,

    /// Texts to classify
    #[arg(long, required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Defaults to the length stored in the checkpoint
    #[arg(long)]
    pub seq_len: Option<usize>,
}
