// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Index header and footer.
//!
//! The header is 32 bytes of fixed-size fields read before anything else. It
//! carries the matcher configuration and the length of every section, so the
//! section layout follows from the header alone.
//!
//! The footer is 8 bytes: a CRC32 over everything before it, plus the header
//! magic reversed. A bad footer means truncation or corruption.

use std::io::{self, Read, Write};

use crc32fast::Hasher as Crc32Hasher;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Magic bytes: "FZTM"
pub const MAGIC: [u8; 4] = *b"FZTM";

/// Footer magic: "MTZF"
pub const FOOTER_MAGIC: [u8; 4] = *b"MTZF";

/// The only format version this build reads and writes.
pub const VERSION: u8 = 1;

// ============================================================================
// SECURITY LIMITS (prevent resource exhaustion from malicious input)
// ============================================================================

/// Maximum index size: 1 GiB
pub const MAX_FILE_SIZE: usize = 1024 * 1024 * 1024;

pub const MAX_SENTENCE_COUNT: u32 = 50_000_000;

pub const MAX_VOCAB_SIZE: u32 = 50_000_000;

/// Maximum bytes in one stored string (entry id, word, surface form)
pub const MAX_STRING_LEN: usize = 1024 * 1024;

/// Maximum varint bytes (u64 needs at most 10 bytes)
pub const MAX_VARINT_BYTES: usize = 10;

// ============================================================================
// FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags(pub(crate) u8);

impl FormatFlags {
    pub const HAS_BM25_TABLE: u8 = 0b0000_0001;

    pub fn new() -> Self {
        Self(0)
    }

    pub fn with_bm25_table(mut self) -> Self {
        self.0 |= Self::HAS_BM25_TABLE;
        self
    }

    pub fn has_bm25_table(self) -> bool {
        self.0 & Self::HAS_BM25_TABLE != 0
    }
}

// ============================================================================
// HEADER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u8,
    pub flags: FormatFlags,
    pub penalty_tokens: u8,
    pub max_tokens_in_pattern: u32,
    pub sentence_count: u32,
    pub vocab_len: u32,
    pub corpus_len: u32,
    pub sa_len: u32,
    pub bm25_len: u32,
}

impl IndexHeader {
    // 4 (magic) + 1 (version) + 1 (flags) + 1 (penalty tokens) + 1 (reserved) + 6*4 = 32
    pub const SIZE: usize = 32;

    pub fn section_offsets(&self) -> SectionOffsets {
        SectionOffsets::from_header(self)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_all(&[self.version, self.flags.0, self.penalty_tokens, 0])?;
        w.write_all(&self.max_tokens_in_pattern.to_le_bytes())?;
        w.write_all(&self.sentence_count.to_le_bytes())?;
        w.write_all(&self.vocab_len.to_le_bytes())?;
        w.write_all(&self.corpus_len.to_le_bytes())?;
        w.write_all(&self.sa_len.to_le_bytes())?;
        w.write_all(&self.bm25_len.to_le_bytes())?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid magic: expected FZTM, got {:?}", magic),
            ));
        }

        let mut buf = [0u8; 28]; // 32 - 4 (magic)
        r.read_exact(&mut buf)?;
        let u32_at = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);

        Ok(Self {
            version: buf[0],
            flags: FormatFlags(buf[1]),
            penalty_tokens: buf[2],
            // buf[3] is reserved
            max_tokens_in_pattern: u32_at(4),
            sentence_count: u32_at(8),
            vocab_len: u32_at(12),
            corpus_len: u32_at(16),
            sa_len: u32_at(20),
            bm25_len: u32_at(24),
        })
    }
}

// ============================================================================
// SECTION OFFSETS
// ============================================================================

/// Byte ranges of every section. Reading and writing both go through this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOffsets {
    pub vocabulary: (usize, usize),
    pub corpus: (usize, usize),
    pub suffix_array: (usize, usize),
    pub bm25: (usize, usize),
    pub footer: (usize, usize),
}

impl SectionOffsets {
    /// Layout:
    /// 1. HEADER        [32B]
    /// 2. VOCABULARY    [vocab_len]   words in id order
    /// 3. CORPUS        [corpus_len]  entries with word ids and surfaces
    /// 4. SUFFIX_ARRAY  [sa_len]      buffer positions
    /// 5. BM25          [bm25_len]    parameters, optional weight table
    /// 6. FOOTER        [8B]          CRC32 validation
    pub fn from_header(h: &IndexHeader) -> Self {
        let mut pos = IndexHeader::SIZE;
        let mut next = |len: u32| {
            let start = pos;
            pos += len as usize;
            (start, pos)
        };

        let vocabulary = next(h.vocab_len);
        let corpus = next(h.corpus_len);
        let suffix_array = next(h.sa_len);
        let bm25 = next(h.bm25_len);
        let footer_start = bm25.1;

        Self {
            vocabulary,
            corpus,
            suffix_array,
            bm25,
            footer: (footer_start, footer_start + IndexFooter::SIZE),
        }
    }

    /// Expected content size (everything before footer)
    pub fn content_size(&self) -> usize {
        self.footer.0
    }

    /// Total file size including footer
    pub fn total_size(&self) -> usize {
        self.footer.1
    }

    #[inline]
    pub fn slice<'a>(&self, bytes: &'a [u8], section: (usize, usize)) -> Option<&'a [u8]> {
        bytes.get(section.0..section.1)
    }
}

// ============================================================================
// FOOTER (8 bytes)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFooter {
    /// CRC32 of header + all sections
    pub crc32: u32,
}

impl IndexFooter {
    pub const SIZE: usize = 8; // 4 bytes CRC32 + 4 bytes magic

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&FOOTER_MAGIC)?;
        Ok(())
    }

    pub fn read(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "File too short for footer",
            ));
        }

        let footer_start = bytes.len() - Self::SIZE;
        let magic = &bytes[footer_start + 4..];
        if magic != FOOTER_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid footer magic: expected MTZF, got {:?}", magic),
            ));
        }

        let crc32 = u32::from_le_bytes([
            bytes[footer_start],
            bytes[footer_start + 1],
            bytes[footer_start + 2],
            bytes[footer_start + 3],
        ]);

        Ok(Self { crc32 })
    }

    pub fn compute_crc32(data: &[u8]) -> u32 {
        let mut hasher = Crc32Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}
