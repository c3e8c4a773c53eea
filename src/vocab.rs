//! Vocabulary: normalized token keys to word ids.

use ahash::AHashMap;

use crate::types::{WordId, FIRST_WORD_ID, UNKNOWN_WORD};

/// Bidirectional token-key ↔ [`WordId`] table.
///
/// Ids `0` and `1` are reserved for the sentence separator and unknown
/// words, so `size()` is always at least [`FIRST_WORD_ID`].
#[derive(Debug, Clone, Default)]
pub struct VocabIndexer {
    ids: AHashMap<String, WordId>,
    words: Vec<String>,
    /// Number of corpus sentences containing each id. Filled by the matcher
    /// at sort time.
    doc_freq: Vec<u32>,
}

impl VocabIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `key`, inserting it if unseen.
    pub fn insert(&mut self, key: &str) -> WordId {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = FIRST_WORD_ID + self.words.len() as WordId;
        self.words.push(key.to_string());
        self.ids.insert(key.to_string(), id);
        id
    }

    /// Id for `key`, or [`UNKNOWN_WORD`]. Never mutates.
    pub fn lookup(&self, key: &str) -> WordId {
        self.ids.get(key).copied().unwrap_or(UNKNOWN_WORD)
    }

    /// Key for a real word id.
    pub fn word(&self, id: WordId) -> Option<&str> {
        id.checked_sub(FIRST_WORD_ID)
            .and_then(|i| self.words.get(i as usize))
            .map(String::as_str)
    }

    /// Number of ids including the reserved ones.
    pub fn size(&self) -> usize {
        FIRST_WORD_ID as usize + self.words.len()
    }

    /// Number of real words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Real words in id order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn set_doc_freq(&mut self, doc_freq: Vec<u32>) {
        self.doc_freq = doc_freq;
    }

    /// Sentences containing `id`; zero for reserved or unknown ids.
    pub fn doc_freq(&self, id: WordId) -> u32 {
        self.doc_freq.get(id as usize).copied().unwrap_or(0)
    }

    /// Rebuild from words stored in id order.
    pub fn from_words(words: Vec<String>) -> Self {
        let ids = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), FIRST_WORD_ID + i as WordId))
            .collect();
        Self {
            ids,
            words,
            doc_freq: Vec::new(),
        }
    }
}
