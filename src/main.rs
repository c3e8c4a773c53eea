// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use fuzzytm::binary::{IndexFooter, IndexHeader};
use fuzzytm::{
    FilterStrategy, FuzzyMatch, FuzzyMatchConfig, Match, MatchOptions, PenaltyTokens,
    SubsequenceOptions,
};

mod cli;
use cli::display::*;
use cli::{Cli, Commands, FilterKind, OutputFormat, QueryArgs};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Index {
            corpus,
            output,
            penalty_tokens,
            max_tokens,
            tokenized,
            compact,
        } => run_index(
            &corpus,
            &output,
            &penalty_tokens,
            max_tokens,
            tokenized,
            compact,
        ),
        Commands::Match {
            query,
            fuzzy,
            contrast,
            mr,
            idf_penalty,
        } => run_match(&query, fuzzy, contrast, mr, idf_penalty),
        Commands::Subseq {
            query,
            mr,
            idf_weighting,
        } => run_subseq(&query, mr, idf_weighting),
        Commands::Inspect { file, dump } => run_inspect(&file, dump),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` when set, `warn` otherwise. `-v` forces debug, `-vv` trace.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn split_tokens(line: &str) -> Vec<&str> {
    line.split(' ').filter(|t| !t.is_empty()).collect()
}

// ============================================================================
// INDEX
// ============================================================================

fn run_index(
    corpus: &Path,
    output: &Path,
    penalty_tokens: &str,
    max_tokens: usize,
    tokenized: bool,
    compact: bool,
) -> Result<()> {
    let penalty_tokens = PenaltyTokens::parse_list(penalty_tokens)
        .map_err(anyhow::Error::msg)
        .context("--penalty-tokens")?;
    let config = FuzzyMatchConfig {
        penalty_tokens,
        max_tokens_in_pattern: max_tokens,
        ..FuzzyMatchConfig::default()
    };
    let mut fm = FuzzyMatch::with_config(config)?;

    let content = fs::read_to_string(corpus)
        .with_context(|| format!("Failed to read corpus {}", corpus.display()))?;
    let lines: Vec<&str> = content.lines().collect();

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:<10} [{bar:40.cyan/dim}] {pos}/{len} {msg}",
        )?
        .progress_chars("━━╸"),
    );
    pb.set_prefix("Indexing");

    let mut skipped = 0usize;
    for (line_no, line) in lines.iter().enumerate() {
        pb.inc(1);
        let (id, text) = match line.split_once('\t') {
            Some((id, text)) => (id.to_string(), text),
            None => ((line_no + 1).to_string(), *line),
        };
        let added = if tokenized {
            fm.add_tm_tokens(id, &split_tokens(text), false)
        } else {
            fm.add_tm(id, text, false)
        };
        if let Err(e) = added {
            warn!(line = line_no + 1, error = %e, "skipping corpus entry");
            skipped += 1;
        }
    }
    pb.set_message("sorting...");
    fm.sort().context("Nothing to index")?;
    pb.finish_with_message(format!("{} entries", fm.len()));

    let bytes = if compact {
        fm.to_bytes_compact()?
    } else {
        fm.to_bytes()?
    };
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!(
        "✓ {} entries ({} skipped), {} words, {} → {}",
        fm.len(),
        skipped,
        fm.vocab().len(),
        format_size(bytes.len()),
        output.display()
    );
    Ok(())
}

// ============================================================================
// MATCH / SUBSEQ
// ============================================================================

#[derive(Serialize)]
struct MatchRow<'a> {
    id: &'a str,
    s_id: u32,
    score: f32,
    penalty: f32,
    max_subseq: usize,
    text: String,
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query_no: usize,
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    matches: Vec<MatchRow<'a>>,
}

fn load_options<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("Invalid options {}", path.display()))
        }
        None => Ok(T::default()),
    }
}

fn filter_override(args: &QueryArgs, current: FilterStrategy) -> FilterStrategy {
    match (args.filter, current) {
        (None, current) => current,
        (Some(FilterKind::Ngram), _) => FilterStrategy::NGram,
        // keep cutoff and scale from the options file, take the flag's buffer
        (Some(FilterKind::Bm25), FilterStrategy::Bm25 {
            cutoff_threshold,
            scale,
            ..
        }) => FilterStrategy::Bm25 {
            buffer: args.buffer,
            cutoff_threshold,
            scale,
        },
        (Some(FilterKind::Bm25), FilterStrategy::NGram) => FilterStrategy::bm25(args.buffer),
    }
}

fn read_queries() -> Result<Vec<String>> {
    let stdin = io::stdin();
    let mut queries = Vec::new();
    for line in stdin.lock().lines() {
        queries.push(line.context("Failed to read stdin")?);
    }
    Ok(queries)
}

/// Run `query_fn` over every stdin line (in parallel when enabled) and print
/// results in input order.
fn run_queries<F>(args: &QueryArgs, fm: &FuzzyMatch, query_fn: F) -> Result<()>
where
    F: for<'a> Fn(&'a FuzzyMatch, &str) -> fuzzytm::Result<Vec<Match<'a>>> + Sync,
{
    let queries = read_queries()?;
    debug!(queries = queries.len(), "matching");

    let answer = |(query_no, query): (usize, &String)| {
        let (matches, error) = match query_fn(fm, query) {
            Ok(matches) => (matches, None),
            Err(e) => {
                warn!(query_no, error = %e, "query rejected");
                (Vec::new(), Some(e.to_string()))
            }
        };
        QueryOutput {
            query_no,
            query: query.clone(),
            error,
            matches: matches
                .into_iter()
                .map(|m| MatchRow {
                    id: m.id,
                    s_id: m.s_id,
                    score: m.score,
                    penalty: m.penalty,
                    max_subseq: m.max_subseq,
                    text: fm.sentence_text(m.s_id).unwrap_or_default(),
                })
                .collect(),
        }
    };

    #[cfg(feature = "parallel")]
    let outputs: Vec<QueryOutput> = queries.par_iter().enumerate().map(answer).collect();
    #[cfg(not(feature = "parallel"))]
    let outputs: Vec<QueryOutput> = queries.iter().enumerate().map(answer).collect();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for output in &outputs {
        match args.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, output)?;
                writeln!(out)?;
            }
            OutputFormat::Tsv => {
                for m in &output.matches {
                    writeln!(out, "{}\t{:.4}\t{}\t{}", output.query_no, m.score, m.id, m.text)?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn load_index(path: &Path) -> Result<FuzzyMatch> {
    FuzzyMatch::load(path).with_context(|| format!("Failed to load index {}", path.display()))
}

fn run_match(
    args: &QueryArgs,
    fuzzy: Option<f32>,
    contrast: Option<f32>,
    mr: Option<f32>,
    idf_penalty: Option<f32>,
) -> Result<()> {
    let mut options: MatchOptions = load_options(args.options.as_deref())?;
    if let Some(fuzzy) = fuzzy {
        options.fuzzy = fuzzy;
    }
    if let Some(n) = args.nmatch {
        options.number_of_matches = n;
    }
    options.no_perfect |= args.no_perfect;
    if let Some(contrast) = contrast {
        options.contrastive_factor = contrast;
    }
    if let Some(ml) = args.ml {
        options.min_subseq_length = ml;
    }
    if let Some(mr) = mr {
        options.min_subseq_ratio = mr;
    }
    if let Some(idf_penalty) = idf_penalty {
        options.vocab_idf_penalty = idf_penalty;
    }
    options.filter = filter_override(args, options.filter);
    options.validate()?;

    let fm = load_index(&args.index)?;
    let tokenized = args.tokenized;
    run_queries(args, &fm, move |fm, query| {
        if tokenized {
            fm.match_tokens(&split_tokens(query), &options)
        } else {
            fm.match_sentence(query, &options)
        }
    })
}

fn run_subseq(args: &QueryArgs, mr: Option<f32>, idf_weighting: bool) -> Result<()> {
    let mut options: SubsequenceOptions = load_options(args.options.as_deref())?;
    if let Some(n) = args.nmatch {
        options.number_of_matches = n;
    }
    options.no_perfect |= args.no_perfect;
    if let Some(ml) = args.ml {
        options.min_subseq_length = ml;
    }
    if let Some(mr) = mr {
        options.min_subseq_ratio = mr;
    }
    options.idf_weighting |= idf_weighting;
    options.filter = filter_override(args, options.filter);
    options.validate()?;

    let fm = load_index(&args.index)?;
    let tokenized = args.tokenized;
    run_queries(args, &fm, move |fm, query| {
        if tokenized {
            fm.subsequence_tokens(&split_tokens(query), &options)
        } else {
            fm.subsequence(query, &options)
        }
    })
}

// ============================================================================
// INSPECT
// ============================================================================

fn run_inspect(path: &Path, dump: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.len() < IndexHeader::SIZE + IndexFooter::SIZE {
        bail!("File too small ({} bytes)", bytes.len());
    }

    let header = IndexHeader::read(&mut &bytes[..]).context("Failed to read header")?;
    let offsets = header.section_offsets();
    let footer = IndexFooter::read(&bytes).context("Failed to read footer")?;
    let crc_valid = offsets.total_size() == bytes.len()
        && footer.crc32 == IndexFooter::compute_crc32(&bytes[..offsets.content_size()]);

    section_top(&path.display().to_string());
    field("version", &header.version.to_string());
    field("entries", &header.sentence_count.to_string());
    field("max tokens", &header.max_tokens_in_pattern.to_string());
    field("penalty tokens", &format!("{:#08b}", header.penalty_tokens));
    field("bm25 table", if header.flags.has_bm25_table() { "stored" } else { "rebuilt on load" });
    field("crc32", &format!("{:08x} {}", footer.crc32, crc_status(crc_valid)));
    section_bot();

    section_top("SECTIONS");
    let sections = [
        ("HEADER", (0, IndexHeader::SIZE)),
        ("VOCABULARY", offsets.vocabulary),
        ("CORPUS", offsets.corpus),
        ("SUFFIX_ARRAY", offsets.suffix_array),
        ("BM25", offsets.bm25),
        ("FOOTER", offsets.footer),
    ];
    for (name, (start, end)) in sections {
        field(
            &format!("{:<14}@{:>10}", name, start),
            &format_size(end.saturating_sub(start)),
        );
    }
    field("total", &format_size(bytes.len()));
    section_bot();

    let fm = FuzzyMatch::from_bytes(&bytes)?;
    section_top("CORPUS");
    let tokens: usize = (0..fm.len() as u32)
        .filter_map(|s_id| fm.sentence(s_id))
        .map(|s| s.len())
        .sum();
    field("words", &fm.vocab().len().to_string());
    field("tokens", &tokens.to_string());
    field(
        "avg tokens per entry",
        &format!("{:.2}", tokens as f64 / fm.len().max(1) as f64),
    );
    section_bot();

    if dump {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        fm.dump(&mut out)?;
        out.flush()?;
    }
    Ok(())
}
