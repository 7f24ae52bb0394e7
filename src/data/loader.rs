// ============================================================
// Layer 4 - Corpus Loader
// ============================================================
// Reads a headered CSV corpus with one record per row:
//
//   text,label
//   "the movie was great",1
//   "dull and far too long",0
//
// Column names are configurable. Each text field is run
// through the Tokenizer, so the loader hands back Examples
// that are ready for vocabulary construction.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::data::tokenizer::Tokenizer;
use crate::domain::error::DataError;
use crate::domain::example::Example;
use crate::domain::traits::CorpusSource;

/// Loads labelled examples from a CSV file.
pub struct CsvCorpusLoader {
    path: PathBuf,
    text_column: String,
    label_column: String,
    tokenizer: Tokenizer,
}

impl CsvCorpusLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            text_column: "text".to_string(),
            label_column: "label".to_string(),
            tokenizer: Tokenizer::new(),
        }
    }

    pub fn with_columns(mut self, text: impl Into<String>, label: impl Into<String>) -> Self {
        self.text_column = text.into();
        self.label_column = label.into();
        self
    }

    fn read_error(&self, source: csv::Error) -> DataError {
        DataError::Read { path: self.path.clone(), source }
    }

    fn column(&self, headers: &csv::StringRecord, name: &str) -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }
}

impl CorpusSource for CsvCorpusLoader {
    fn load_all(&self) -> Result<Vec<Example>, DataError> {
        let file = File::open(&self.path).map_err(|e| self.read_error(e.into()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers().map_err(|e| self.read_error(e))?.clone();
        let text_idx = self.column(&headers, &self.text_column)?;
        let label_idx = self.column(&headers, &self.label_column)?;

        let mut examples = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| self.read_error(e))?;
            // 1-based data row, header excluded
            let row = i + 1;

            let text = record
                .get(text_idx)
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| DataError::MissingField {
                    row,
                    column: self.text_column.clone(),
                })?;
            let raw_label = record
                .get(label_idx)
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .ok_or_else(|| DataError::MissingField {
                    row,
                    column: self.label_column.clone(),
                })?;
            let label = raw_label.parse::<usize>().map_err(|_| DataError::InvalidLabel {
                row,
                value: raw_label.to_string(),
            })?;

            examples.push(Example::new(self.tokenizer.tokenize(text), label));
        }

        tracing::info!(
            "Loaded {} examples from '{}'",
            examples.len(),
            self.path.display()
        );
        Ok(examples)
    }
}
