// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the fuzzytm command-line interface.
//!
//! Four subcommands: `index` builds a `.fztm` file from a corpus, `match` and
//! `subseq` query one with sentences read from stdin, and `inspect` examines
//! its structure.

pub mod display;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "fuzzytm",
    about = "Translation-memory fuzzy matching over suffix arrays and BM25",
    version
)]
pub struct Cli {
    /// Log library events to stderr (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a .fztm index from a corpus file
    Index {
        /// Corpus file, one entry per line: `id<TAB>text` or bare text
        #[arg(short, long)]
        corpus: PathBuf,

        /// Output .fztm file
        #[arg(short, long)]
        output: PathBuf,

        /// Token classes matched loosely and penalized: tag,pct,sep,jnr,nbr,cas or all
        #[arg(long, default_value = "")]
        penalty_tokens: String,

        /// Maximum tokens per entry and per query
        #[arg(long, default_value = "300")]
        max_tokens: usize,

        /// Entries are already tokenized (split on single spaces only)
        #[arg(long)]
        tokenized: bool,

        /// Omit the BM25 table; it is rebuilt when the index is loaded
        #[arg(long)]
        compact: bool,
    },

    /// Fuzzy-match queries read from stdin, one per line
    Match {
        #[command(flatten)]
        query: QueryArgs,

        /// Minimum score of a match
        #[arg(long)]
        fuzzy: Option<f32>,

        /// Penalize similarity to already selected matches
        #[arg(long)]
        contrast: Option<f32>,

        /// Minimum ratio of the longest shared run to the query length
        #[arg(long)]
        mr: Option<f32>,

        /// Penalty for query words rare or absent in the corpus
        #[arg(long)]
        idf_penalty: Option<f32>,
    },

    /// Longest-subsequence matching of queries read from stdin
    Subseq {
        #[command(flatten)]
        query: QueryArgs,

        /// Minimum ratio of the longest shared run to the query length
        #[arg(long)]
        mr: Option<f32>,

        /// Weight the run by word rarity
        #[arg(long)]
        idf_weighting: bool,
    },

    /// Inspect a .fztm file structure
    Inspect {
        /// Path to .fztm file
        file: PathBuf,

        /// Also print every corpus entry
        #[arg(long)]
        dump: bool,
    },
}

/// Options shared by `match` and `subseq`. Flags given here override the
/// `--options` file, which overrides the defaults.
#[derive(Args)]
pub struct QueryArgs {
    /// Path to .fztm file
    #[arg(short, long)]
    pub index: PathBuf,

    /// JSON file with query options
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Maximum number of matches per query
    #[arg(short, long)]
    pub nmatch: Option<usize>,

    /// Skip entries identical to the query
    #[arg(long)]
    pub no_perfect: bool,

    /// Minimum length of the longest shared run
    #[arg(long)]
    pub ml: Option<usize>,

    /// Candidate filter
    #[arg(long, value_enum)]
    pub filter: Option<FilterKind>,

    /// Shortlist size of the BM25 filter
    #[arg(long, default_value = "10")]
    pub buffer: usize,

    /// Queries are already tokenized (split on single spaces only)
    #[arg(long)]
    pub tokenized: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FilterKind {
    Ngram,
    Bm25,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per query
    Json,
    /// One `query_no<TAB>score<TAB>id<TAB>text` line per match
    Tsv,
}
