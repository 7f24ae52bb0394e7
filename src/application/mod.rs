// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Coordinates the other layers to accomplish one goal each:
//
//   train_use_case.rs   - corpus → vocabulary → model → loop
//                         → checkpoint (+ metrics)
//   predict_use_case.rs - checkpoint → predictions for texts
//
// No tensor math and no argument parsing live here; this
// layer only decides the order things happen in.

// The training workflow
pub mod train_use_case;

// Inference on a saved checkpoint
pub mod predict_use_case;
