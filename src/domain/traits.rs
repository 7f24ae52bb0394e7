// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer loads its corpus through CorpusSource
// so the CSV reader in Layer 4 can be swapped for another
// format without touching the training workflow.

use crate::domain::error::DataError;
use crate::domain::example::Example;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the labelled examples of a corpus.
///
/// Implementations:
///   - CsvCorpusLoader  → reads a headered CSV file
pub trait CorpusSource {
    /// Load every example, in corpus order.
    fn load_all(&self) -> Result<Vec<Example>, DataError>;
}
