// ============================================================
// Layer 4 - Word Tokenizer
// ============================================================
// Turns a raw text field into the token sequence that the
// vocabulary counts and the encoder maps to ids.
//
// Steps (applied in order):
//   1. Tabs, unicode spaces and control characters → space
//   2. Lowercase
//   3. Split on whitespace
//   4. Strip punctuation from both edges of each word
//   5. Drop words that end up empty
//
// Example:
//   "Hello,\u{00A0}WORLD!  (again)" → ["hello", "world", "again"]

/// Stateless word tokenizer used for both training and inference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Split `text` into normalised word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect::<String>()
            .to_lowercase();

        normalised
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let t = Tokenizer::new();
        assert_eq!(t.tokenize("Hello, WORLD!"), vec!["hello", "world"]);
    }

    #[test]
    fn test_unicode_spaces_split_words() {
        let t = Tokenizer::new();
        assert_eq!(t.tokenize("a\u{00A0}b\u{200B}c\td"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_inner_punctuation_is_kept() {
        let t = Tokenizer::new();
        assert_eq!(t.tokenize("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn test_punctuation_only_words_are_dropped() {
        let t = Tokenizer::new();
        assert_eq!(t.tokenize("-- ... !!"), Vec::<String>::new());
        assert!(t.tokenize("").is_empty());
    }
}
