// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error type for the matcher.
//!
//! Query failures (empty pattern, oversized pattern, empty or unfinalized
//! corpus) are ordinary returned values. Nothing on the query path panics on
//! caller input.

use std::io;

use thiserror::Error;

/// Everything that can go wrong building, querying, or loading a matcher.
#[derive(Debug, Error)]
pub enum Error {
    /// The pattern (or corpus entry) tokenized to nothing.
    #[error("pattern is empty")]
    EmptyPattern,

    /// The pattern (or corpus entry) exceeds `max_tokens_in_pattern`.
    #[error("pattern has {len} tokens, maximum is {max}")]
    PatternTooLong { len: usize, max: usize },

    /// No corpus entries have been added.
    #[error("translation memory is empty")]
    EmptyCorpus,

    /// Corpus entries were added since the last `sort()`.
    #[error("translation memory must be sorted before matching")]
    NotFinalized,

    /// Configuration values outside their valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The index blob was written by a different format version.
    #[error("unsupported index version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// The index blob is structurally invalid.
    #[error("corrupt index: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Lift a codec error, keeping `InvalidData` as a format error.
    pub(crate) fn from_codec(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                Error::Format(err.to_string())
            }
            _ => Error::Io(err),
        }
    }
}
