// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File formats written by a training run:
//
//   checkpoint.rs - single-file checkpoint holding the model
//                   architecture, its parameters and the
//                   vocabulary and sequence length;
//                   written atomically
//
//   metrics.rs    - per-epoch loss log as CSV
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
