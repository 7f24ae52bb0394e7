// ============================================================
// Layer 4 - Text Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<EncodedExample>
// into tensors on the execution device.
//
//   Input:  N EncodedExamples, each with exactly L token ids
//   Output: TextBatch { token_ids: [N, L] Int, labels: [N] Int }
//
// All rows already have length L, so the ids are flattened
// row by row and reshaped; no padding happens here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::example::EncodedExample;

/// A batch of encoded examples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct TextBatch<B: Backend> {
    /// Token id rows: shape [batch_size, seq_len]
    pub token_ids: Tensor<B, 2, Int>,

    /// Class index per row: shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> TextBatch<B> {
    pub fn size(&self) -> usize {
        self.labels.dims()[0]
    }
}

/// Holds the target device so tensors are created where the model lives.
#[derive(Clone, Debug)]
pub struct TextBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TextBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<EncodedExample, TextBatch<B>> for TextBatcher<B> {
    fn batch(&self, items: Vec<EncodedExample>) -> TextBatch<B> {
        let batch_size = items.len();
        let seq_len = items.first().map_or(0, |e| e.token_ids.len());

        let ids_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.token_ids.iter().map(|&id| id as i32))
            .collect();

        let labels: Vec<i32> = items.iter().map(|e| e.label as i32).collect();

        let token_ids = Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        TextBatch { token_ids, labels }
    }
}
