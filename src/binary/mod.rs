// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Persisted index format.
//!
//! A finalized [`FuzzyMatch`] serializes to one self-describing blob. Loading
//! it skips tokenization and suffix sorting entirely, and with the BM25 table
//! present it skips the table build too.
//!
//! # Security Considerations
//!
//! The format is safe to parse from untrusted sources:
//! - All size fields are validated against MAX_* constants
//! - Bounds checking prevents buffer overreads
//! - CRC32 footer detects corruption/truncation
//! - Varint decoder has maximum iteration limits
//! - Word ids and suffix positions are checked against the decoded corpus
//!
//! # Format Overview (v1)
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ HEADER (32 bytes)                                          │
//! │   magic: [u8; 4] = "FZTM"                                  │
//! │   version: u8 = 1                                          │
//! │   flags: u8, penalty_tokens: u8, reserved: u8              │
//! │   max_tokens_in_pattern: u32, sentence_count: u32          │
//! │   vocab_len: u32, corpus_len: u32, sa_len: u32             │
//! │   bm25_len: u32                                            │
//! ├────────────────────────────────────────────────────────────┤
//! │ 1. VOCABULARY   count, then length-prefixed words          │
//! ├────────────────────────────────────────────────────────────┤
//! │ 2. CORPUS       per entry: id, tokens (wid, surface, join) │
//! ├────────────────────────────────────────────────────────────┤
//! │ 3. SUFFIX_ARRAY count, then buffer positions (varint)      │
//! ├────────────────────────────────────────────────────────────┤
//! │ 4. BM25         k1, b (f32), sparse weight rows if flagged │
//! ├────────────────────────────────────────────────────────────┤
//! │ FOOTER (8 bytes): crc32 + magic "MTZF"                     │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod encoding;
mod header;

pub use encoding::{decode_varint, encode_varint, SectionReader};
pub use header::{
    FormatFlags, IndexFooter, IndexHeader, SectionOffsets, FOOTER_MAGIC, MAGIC, MAX_FILE_SIZE,
    MAX_SENTENCE_COUNT, MAX_STRING_LEN, MAX_VARINT_BYTES, MAX_VOCAB_SIZE, VERSION,
};

use std::fs;
use std::io;
use std::path::Path;

use ndarray::Array2;
use tracing::debug;

use encoding::{encode_f32, encode_str, invalid};

use crate::bm25::Bm25;
use crate::config::{Bm25Params, FuzzyMatchConfig};
use crate::error::{Error, Result};
use crate::fuzzy_match::FuzzyMatch;
use crate::index::SuffixArrayIndex;
use crate::tokenizer::{PenaltyTokens, Sentence, Token, Tokenizer};
use crate::types::{WordId, FIRST_WORD_ID, SENTENCE_SEPARATOR};
use crate::vocab::VocabIndexer;

// ============================================================================
// SECTION ENCODING
// ============================================================================

fn encode_vocabulary(vocab: &VocabIndexer, buf: &mut Vec<u8>) {
    encode_varint(vocab.len() as u64, buf);
    for word in vocab.words() {
        encode_str(word, buf);
    }
}

fn encode_corpus(fm: &FuzzyMatch, buf: &mut Vec<u8>) {
    encode_varint(fm.ids.len() as u64, buf);
    for (s_id, (id, sentence)) in fm.ids.iter().zip(&fm.sentences).enumerate() {
        encode_str(id, buf);
        let wids = fm.index.sentence(s_id as u32);
        encode_varint(wids.len() as u64, buf);
        for (&wid, token) in wids.iter().zip(&sentence.tokens) {
            encode_varint(wid as u64, buf);
            encode_str(&token.surface, buf);
            buf.push(token.joined as u8);
        }
    }
}

fn encode_suffix_array(suffixes: &[u32], buf: &mut Vec<u8>) {
    encode_varint(suffixes.len() as u64, buf);
    for &pos in suffixes {
        encode_varint(pos as u64, buf);
    }
}

/// Parameters, then (when `with_table`) one sparse row per term with
/// delta-encoded sentence ids.
fn encode_bm25(bm25: &Bm25, with_table: bool, buf: &mut Vec<u8>) {
    let params = bm25.params();
    encode_f32(params.k1, buf);
    encode_f32(params.b, buf);
    if !with_table {
        return;
    }

    let table = bm25.table();
    encode_varint(table.nrows() as u64, buf);
    encode_varint(table.ncols() as u64, buf);
    for row in table.rows() {
        let nonzero: Vec<(usize, f32)> = row
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, w)| w != 0.0)
            .collect();
        encode_varint(nonzero.len() as u64, buf);
        let mut prev = 0usize;
        for (col, w) in nonzero {
            encode_varint((col - prev) as u64, buf);
            encode_f32(w, buf);
            prev = col;
        }
    }
}

// ============================================================================
// SECTION DECODING
// ============================================================================

fn decode_vocabulary(bytes: &[u8]) -> io::Result<VocabIndexer> {
    let mut r = SectionReader::new(bytes);
    let count = r.count(1, MAX_VOCAB_SIZE as usize)?;
    let mut words = Vec::with_capacity(count);
    for _ in 0..count {
        words.push(r.string()?);
    }
    if !r.is_at_end() {
        return Err(invalid("Trailing bytes in vocabulary section"));
    }
    Ok(VocabIndexer::from_words(words))
}

/// Entry ids, sentences, and the flattened word-id buffer.
type DecodedCorpus = (Vec<String>, Vec<Sentence>, Vec<WordId>);

fn decode_corpus(bytes: &[u8], header: &IndexHeader, vocab_size: usize) -> io::Result<DecodedCorpus> {
    let mut r = SectionReader::new(bytes);
    let count = r.count(2, MAX_SENTENCE_COUNT as usize)?;
    if count != header.sentence_count as usize {
        return Err(invalid(format!(
            "Corpus has {} entries, header says {}",
            count, header.sentence_count
        )));
    }

    let max_tokens = header.max_tokens_in_pattern as usize;
    let mut ids = Vec::with_capacity(count);
    let mut sentences = Vec::with_capacity(count);
    let mut buffer = Vec::new();

    for i in 0..count {
        ids.push(r.string()?);
        // each token takes at least 3 bytes: wid, surface length, joiner
        let len = r.count(3, max_tokens)?;
        if len == 0 {
            return Err(invalid(format!("Corpus entry {} is empty", i)));
        }
        let mut tokens = Vec::with_capacity(len);
        for _ in 0..len {
            let wid = r.varint_u32()?;
            if wid < FIRST_WORD_ID || wid as usize >= vocab_size {
                return Err(invalid(format!("Word id {} out of range in entry {}", wid, i)));
            }
            let surface = r.string()?;
            let joined = r.u8()? != 0;
            buffer.push(wid);
            tokens.push(Token::new(surface, joined));
        }
        buffer.push(SENTENCE_SEPARATOR);
        sentences.push(Sentence { tokens });
    }
    if !r.is_at_end() {
        return Err(invalid("Trailing bytes in corpus section"));
    }
    Ok((ids, sentences, buffer))
}

fn decode_suffix_array(bytes: &[u8], buffer_len: usize) -> io::Result<Vec<u32>> {
    let mut r = SectionReader::new(bytes);
    let count = r.count(1, buffer_len)?;
    let mut suffixes = Vec::with_capacity(count);
    for _ in 0..count {
        suffixes.push(r.varint_u32()?);
    }
    if !r.is_at_end() {
        return Err(invalid("Trailing bytes in suffix array section"));
    }
    Ok(suffixes)
}

fn decode_bm25(
    bytes: &[u8],
    with_table: bool,
    vocab_size: usize,
    sentence_count: usize,
) -> io::Result<(Bm25Params, Option<Array2<f32>>)> {
    let mut r = SectionReader::new(bytes);
    let params = Bm25Params {
        k1: r.f32()?,
        b: r.f32()?,
    };
    if !with_table {
        return Ok((params, None));
    }

    let rows = r.varint()? as usize;
    let cols = r.varint()? as usize;
    if rows != vocab_size || cols != sentence_count {
        return Err(invalid(format!(
            "BM25 table is {}x{}, expected {}x{}",
            rows, cols, vocab_size, sentence_count
        )));
    }

    let mut table = Array2::zeros((rows, cols));
    for term in 0..rows {
        // each weight takes at least 5 bytes: column delta and f32
        let nnz = r.count(5, cols)?;
        let mut col = 0usize;
        for i in 0..nnz {
            let delta = r.varint()? as usize;
            col = col
                .checked_add(delta)
                .filter(|&c| c < cols && (i == 0 || delta > 0))
                .ok_or_else(|| invalid(format!("Bad column in BM25 row {}", term)))?;
            table[[term, col]] = r.f32()?;
        }
    }
    if !r.is_at_end() {
        return Err(invalid("Trailing bytes in BM25 section"));
    }
    Ok((params, Some(table)))
}

// ============================================================================
// FUZZY MATCH PERSISTENCE
// ============================================================================

impl FuzzyMatch {
    /// Serialize a finalized matcher, BM25 table included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.encode(true)
    }

    /// Serialize without the BM25 table; it is rebuilt on load.
    pub fn to_bytes_compact(&self) -> Result<Vec<u8>> {
        self.encode(false)
    }

    fn encode(&self, with_table: bool) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        if !self.is_sorted() {
            return Err(Error::NotFinalized);
        }

        let mut vocab_bytes = Vec::new();
        encode_vocabulary(&self.vocab, &mut vocab_bytes);
        let mut corpus_bytes = Vec::new();
        encode_corpus(self, &mut corpus_bytes);
        let mut sa_bytes = Vec::new();
        encode_suffix_array(self.index.suffixes(), &mut sa_bytes);
        let mut bm25_bytes = Vec::new();
        encode_bm25(&self.bm25, with_table, &mut bm25_bytes);

        let section_len = |bytes: &Vec<u8>| {
            u32::try_from(bytes.len())
                .map_err(|_| Error::Format("section exceeds 4 GiB".to_string()))
        };
        let flags = if with_table {
            FormatFlags::new().with_bm25_table()
        } else {
            FormatFlags::new()
        };
        let header = IndexHeader {
            version: VERSION,
            flags,
            penalty_tokens: self.config.penalty_tokens.0,
            max_tokens_in_pattern: u32::try_from(self.config.max_tokens_in_pattern)
                .unwrap_or(u32::MAX),
            sentence_count: self.len() as u32,
            vocab_len: section_len(&vocab_bytes)?,
            corpus_len: section_len(&corpus_bytes)?,
            sa_len: section_len(&sa_bytes)?,
            bm25_len: section_len(&bm25_bytes)?,
        };

        let mut out = Vec::with_capacity(header.section_offsets().total_size());
        header.write(&mut out)?;
        out.extend_from_slice(&vocab_bytes);
        out.extend_from_slice(&corpus_bytes);
        out.extend_from_slice(&sa_bytes);
        out.extend_from_slice(&bm25_bytes);
        let crc32 = IndexFooter::compute_crc32(&out);
        IndexFooter { crc32 }.write(&mut out)?;

        debug!(bytes = out.len(), sentences = self.len(), with_table, "encoded index");
        Ok(out)
    }

    /// Load a matcher written by [`to_bytes`](FuzzyMatch::to_bytes). The
    /// result is finalized and ready to query.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_FILE_SIZE {
            return Err(Error::Format(format!(
                "index is {} bytes, limit is {}",
                bytes.len(),
                MAX_FILE_SIZE
            )));
        }
        if bytes.len() < IndexHeader::SIZE + IndexFooter::SIZE {
            return Err(Error::Format("index too short".to_string()));
        }

        let header = IndexHeader::read(&mut &bytes[..IndexHeader::SIZE]).map_err(Error::from_codec)?;
        if header.version != VERSION {
            return Err(Error::UnsupportedVersion {
                found: header.version,
                expected: VERSION,
            });
        }

        let offsets = header.section_offsets();
        if offsets.total_size() != bytes.len() {
            return Err(Error::Format(format!(
                "index is {} bytes, header describes {}",
                bytes.len(),
                offsets.total_size()
            )));
        }
        let footer = IndexFooter::read(bytes).map_err(Error::from_codec)?;
        let actual = IndexFooter::compute_crc32(&bytes[..offsets.content_size()]);
        if footer.crc32 != actual {
            return Err(Error::Format(format!(
                "checksum mismatch: stored {:08x}, computed {:08x}",
                footer.crc32, actual
            )));
        }

        Self::decode_sections(&header, &offsets, bytes).map_err(Error::from_codec)
    }

    fn decode_sections(
        header: &IndexHeader,
        offsets: &SectionOffsets,
        bytes: &[u8],
    ) -> io::Result<Self> {
        let section = |range: (usize, usize)| {
            offsets
                .slice(bytes, range)
                .ok_or_else(|| invalid("Section out of bounds"))
        };

        let mut vocab = decode_vocabulary(section(offsets.vocabulary)?)?;
        let vocab_size = vocab.size();
        let (ids, sentences, buffer) = decode_corpus(section(offsets.corpus)?, header, vocab_size)?;
        let suffixes = decode_suffix_array(section(offsets.suffix_array)?, buffer.len())?;
        let (params, table) = decode_bm25(
            section(offsets.bm25)?,
            header.flags.has_bm25_table(),
            vocab_size,
            ids.len(),
        )?;

        let config = FuzzyMatchConfig {
            penalty_tokens: PenaltyTokens(header.penalty_tokens),
            max_tokens_in_pattern: header.max_tokens_in_pattern as usize,
            bm25: params,
        };
        config
            .validate()
            .map_err(|e| invalid(format!("Stored configuration: {}", e)))?;

        let index = SuffixArrayIndex::from_parts(buffer, suffixes)
            .ok_or_else(|| invalid("Suffix array does not fit the corpus"))?;
        let spans = (0..index.len() as u32).map(|s_id| index.sentence(s_id));

        let bm25 = match table {
            Some(table) => Bm25::with_table(params, spans, table)
                .ok_or_else(|| invalid("BM25 table does not fit the corpus"))?,
            None => {
                let mut bm25 = Bm25::new(params);
                for s_id in 0..index.len() as u32 {
                    bm25.add_sentence(index.sentence(s_id));
                }
                bm25.sort(vocab_size)
                    .map_err(|e| invalid(format!("Rebuilding BM25 table: {}", e)))?;
                debug!("rebuilt bm25 table on load");
                bm25
            }
        };
        vocab.set_doc_freq(bm25.doc_freq().to_vec());

        Ok(FuzzyMatch {
            config,
            tokenizer: Tokenizer::new(),
            vocab,
            index,
            bm25,
            ids,
            sentences,
        })
    }

    /// Write [`to_bytes`](FuzzyMatch::to_bytes) to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}
