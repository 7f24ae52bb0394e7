// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Everything that builds, runs or updates tensors:
//
//   literal.rs    - constructor arguments parsed from strings
//                   and bound to a variant's parameter list
//
//   model.rs      - the classifier variants (WordRNN, WordCNN,
//                   WordBag) and the Classifier enum over them
//
//   registry.rs   - model name → constructor lookup
//
//   device.rs     - CPU / accelerator selection with fallback
//
//   trainer.rs    - epoch/batch loop: forward, NLL loss,
//                   backward, optimizer step, loss reporting
//
//   inferencer.rs - loads a checkpoint and classifies texts
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Typed constructor arguments
pub mod literal;

/// Sequence classifier architectures
pub mod model;

/// Name → constructor registry
pub mod registry;

/// Execution device resolution
pub mod device;

/// Training loop
pub mod trainer;

/// Checkpoint-backed prediction
pub mod inferencer;
