// ============================================================
// Layer 4 - Vocabulary Builder and Sequence Encoder
// ============================================================
// build():
//   Counts every token in the corpus and keeps the
//   (capacity - 2) most frequent ones. Ids 0 and 1 are
//   reserved for padding and unknown tokens, so the most
//   frequent word gets id 2, the next id 3, and so on.
//   Equal counts keep the order in which the words were
//   first seen.
//
//     corpus:  "b a b c a b"      capacity = 4
//     counts:  b=3  a=2  c=1
//     ids:     <pad>=0 <unk>=1 b=2 a=3      (c dropped)
//
// encode():
//   tokens → ids (unseen → 1), truncated from the end or
//   right-padded with 0 to exactly `length` ids.
//
//     encode(["a", "x"], vocab, 4) → [3, 1, 0, 0]

use std::collections::HashMap;

use crate::domain::error::ConfigError;

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";

/// Number of ids reserved ahead of corpus tokens.
pub const RESERVED_IDS: usize = 2;

/// Bounded token → id mapping. `tokens[id]` is the token for `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Build a vocabulary of at most `capacity` entries (reserved ids included).
    pub fn build<I, S>(corpus: I, capacity: usize) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if capacity < RESERVED_IDS {
            return Err(ConfigError::CapacityTooSmall(capacity));
        }

        // token → (count, first-seen position)
        let mut freq: HashMap<String, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;
        for record in corpus {
            for token in record {
                let token = token.as_ref();
                if token == PAD_TOKEN || token == UNK_TOKEN {
                    continue;
                }
                match freq.get_mut(token) {
                    Some((count, _)) => *count += 1,
                    None => {
                        freq.insert(token.to_string(), (1, seen));
                        seen += 1;
                    }
                }
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked.truncate(capacity - RESERVED_IDS);

        let mut tokens = Vec::with_capacity(RESERVED_IDS + ranked.len());
        tokens.push(PAD_TOKEN.to_string());
        tokens.push(UNK_TOKEN.to_string());
        tokens.extend(ranked.into_iter().map(|(token, _)| token));

        tracing::debug!(
            "Vocabulary built: {} entries (capacity {}, {} distinct tokens seen)",
            tokens.len(),
            capacity,
            seen
        );

        Ok(Self::from_ordered(tokens))
    }

    /// Rebuild a vocabulary from its id-ordered token list (as stored in a
    /// checkpoint). Fails if the reserved entries are not in place or a token
    /// appears twice.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, String> {
        if tokens.len() < RESERVED_IDS
            || tokens[PAD_ID as usize] != PAD_TOKEN
            || tokens[UNK_ID as usize] != UNK_TOKEN
        {
            return Err(format!(
                "ids 0 and 1 must be '{PAD_TOKEN}' and '{UNK_TOKEN}'"
            ));
        }
        let vocab = Self::from_ordered(tokens);
        if vocab.index.len() != vocab.tokens.len() {
            return Err("duplicate tokens".to_string());
        }
        Ok(vocab)
    }

    fn from_ordered(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();
        Self { tokens, index }
    }

    /// Id of `token`, or [`UNK_ID`] if it is not in the vocabulary.
    pub fn id(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(UNK_ID)
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Number of entries, reserved ids included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Map `tokens` to exactly `length` ids: unknown tokens become [`UNK_ID`],
/// long sequences are truncated from the end, short ones right-padded with
/// [`PAD_ID`].
pub fn encode<S: AsRef<str>>(tokens: &[S], vocabulary: &Vocabulary, length: usize) -> Vec<u32> {
    let mut ids: Vec<u32> = tokens
        .iter()
        .take(length)
        .map(|t| vocabulary.id(t.as_ref()))
        .collect();
    ids.resize(length, PAD_ID);
    ids
}

/// Inverse of [`encode`] up to truncation and unknown tokens: trailing
/// padding is dropped, unknown ids decode to [`UNK_TOKEN`].
pub fn decode<'a>(ids: &[u32], vocabulary: &'a Vocabulary) -> Vec<&'a str> {
    let end = ids.iter().rposition(|&id| id != PAD_ID).map_or(0, |p| p + 1);
    ids[..end]
        .iter()
        .map(|&id| vocabulary.token(id).unwrap_or(UNK_TOKEN))
        .collect()
}
