// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands off to Layer 2.
//
//   1. `train`   - trains a classifier on a CSV corpus and
//                  writes a checkpoint
//   2. `predict` - loads a checkpoint and classifies texts
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sequence-trainer",
    version,
    about = "Train word-level sequence classifiers on labelled text, then classify new text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.data.display());

    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.final_loss() {
        Some(loss) => println!(
            "Training complete ({} epochs, final loss {:.4}). Checkpoint saved to {}",
            summary.epochs.len(),
            loss,
            summary.checkpoint.display()
        ),
        None => println!("No epochs run. Checkpoint saved to {}", summary.checkpoint.display()),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(args.checkpoint, args.seq_len)?;
    tracing::info!("Predicting with {} (seq_len {})", use_case.model_name(), use_case.seq_len());

    for (text, p) in args.text.iter().zip(use_case.predict(&args.text)) {
        println!("{}\t{:.4}\t{}", p.label, p.probability, text);
    }
    Ok(())
}
