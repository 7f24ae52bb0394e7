// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types shared by every other layer:
//
//   example.rs - raw and encoded training examples
//   error.rs   - typed errors for configuration, data,
//                training and checkpoint failures
//   traits.rs  - abstractions other layers implement
//
// No Burn types appear here, so everything in this layer
// can be unit tested without a backend.

/// Raw (tokens, label) pairs and their fixed-length encodings
pub mod example;

/// Typed error taxonomy
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
