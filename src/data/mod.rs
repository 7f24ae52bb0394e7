// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from the raw corpus file to tensor batches:
//
//   corpus.csv
//       │
//       ▼
//   CsvCorpusLoader   → reads rows, tokenizes text
//       │
//       ▼
//   Vocabulary        → bounded token → id map (0 = pad, 1 = unk)
//       │
//       ▼
//   ExampleStore      → implements Burn's Dataset trait,
//       │               encodes each example lazily
//       ▼
//   BatchLoader       → per-epoch permutation, optional
//       │               parallel encoding, ordered batches
//       ▼
//   TextBatcher       → stacks a batch into tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads labelled CSV corpora
pub mod loader;

/// Normalises text and splits it into word tokens
pub mod tokenizer;

/// Vocabulary construction, encode and decode
pub mod vocabulary;

/// Implements Burn's Dataset trait over lazily encoded examples
pub mod dataset;

/// Shuffles and partitions the dataset into ordered batches
pub mod batch_loader;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
