// ============================================================
// Layer 3 - Example Domain Types
// ============================================================
// An Example is one labelled record of the corpus after
// tokenisation. An EncodedExample is the same record after it
// has been mapped through the vocabulary and padded/truncated
// to the fixed sequence length L.
//
//   Example        { tokens: ["the", "cat", "sat"], label: 1 }
//        │  encode(tokens, vocabulary, L = 5)
//        ▼
//   EncodedExample { token_ids: [4, 17, 9, 0, 0], label: 1 }

use serde::{Deserialize, Serialize};

/// An immutable labelled token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// The record's text, already split into tokens
    pub tokens: Vec<String>,

    /// Class index in `[0, num_classes)`
    pub label: usize,
}

impl Example {
    pub fn new(tokens: Vec<String>, label: usize) -> Self {
        Self { tokens, label }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// A fixed-length id sequence derived from an [`Example`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedExample {
    /// Exactly `L` vocabulary ids
    pub token_ids: Vec<u32>,
    pub label: usize,
}

impl EncodedExample {
    pub fn seq_len(&self) -> usize {
        self.token_ids.len()
    }
}
