use std::sync::OnceLock;

use burn::data::dataset::Dataset;

use crate::data::vocabulary::{encode, Vocabulary};
use crate::domain::error::ConfigError;
use crate::domain::example::{EncodedExample, Example};

/// Raw examples plus the vocabulary built from them. Each example is encoded
/// on first access and cached; the cache is safe to fill from worker threads.
pub struct ExampleStore {
    examples: Vec<Example>,
    vocabulary: Vocabulary,
    seq_len: usize,
    encoded: Vec<OnceLock<EncodedExample>>,
}

impl ExampleStore {
    /// Build the vocabulary from `examples` and wrap them for lazy encoding.
    pub fn new(examples: Vec<Example>, dictionary_size: usize, seq_len: usize) -> Result<Self, ConfigError> {
        let vocabulary = Vocabulary::build(examples.iter().map(|e| e.tokens.iter()), dictionary_size)?;
        let encoded = (0..examples.len()).map(|_| OnceLock::new()).collect();
        Ok(Self { examples, vocabulary, seq_len, encoded })
    }

    pub fn count(&self) -> usize {
        self.examples.len()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn encoded_count(&self) -> usize {
        self.encoded.iter().filter(|cell| cell.get().is_some()).count()
    }

    fn encoded(&self, index: usize) -> Option<&EncodedExample> {
        let example = self.examples.get(index)?;
        Some(self.encoded[index].get_or_init(|| EncodedExample {
            token_ids: encode(&example.tokens, &self.vocabulary, self.seq_len),
            label: example.label,
        }))
    }
}

impl Dataset<EncodedExample> for ExampleStore {
    fn get(&self, index: usize) -> Option<EncodedExample> {
        self.encoded(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(text: &str, label: usize) -> Example {
        Example::new(text.split_whitespace().map(str::to_string).collect(), label)
    }

    #[test]
    fn test_encodes_lazily_on_first_access() {
        let store = ExampleStore::new(vec![example("a b", 0), example("b c d", 1)], 10, 3).unwrap();
        assert_eq!(store.encoded_count(), 0);

        let second = store.get(1).unwrap();
        assert_eq!(second.token_ids.len(), 3);
        assert_eq!(second.label, 1);
        assert_eq!(store.encoded_count(), 1);

        assert_eq!(store.get(1).unwrap(), second);
        assert_eq!(store.encoded_count(), 1);
    }

    #[test]
    fn test_out_of_range_is_none() {
        let store = ExampleStore::new(vec![example("a", 0)], 10, 2).unwrap();
        assert!(store.get(1).is_none());
        assert_eq!(store.count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_vocabulary_is_built_from_examples() {
        let store = ExampleStore::new(vec![example("x y x", 0)], 10, 2).unwrap();
        assert_eq!(store.vocabulary().id("x"), 2);
        assert_eq!(store.vocabulary().id("y"), 3);
    }

    #[test]
    fn test_capacity_below_two_fails() {
        assert!(ExampleStore::new(vec![example("x", 0)], 0, 2).is_err());
    }
}
