//! Saving and loading `.fztm` files.

use std::fs;

use super::common::{build_matcher_with, menu_matcher, scores, TM};
use fuzzytm::binary::{IndexHeader, VERSION};
use fuzzytm::{Error, FilterStrategy, FuzzyMatch, MatchOptions, PenaltyTokens};

const QUERIES: [&str; 4] = [
    "the cat sat on the mat",
    "a dog ran across the road",
    "Open the File menu",
    "press the green button to start",
];

fn all_results(fm: &FuzzyMatch) -> Vec<Vec<(String, f32)>> {
    let filters = [FilterStrategy::NGram, FilterStrategy::bm25(3)];
    filters
        .iter()
        .flat_map(|&filter| {
            let options = MatchOptions {
                fuzzy: 0.4,
                filter,
                ..MatchOptions::default()
            };
            QUERIES.iter().map(move |q| scores(fm, q, &options)).collect::<Vec<_>>()
        })
        .collect()
}

fn dump(fm: &FuzzyMatch) -> String {
    let mut out = Vec::new();
    fm.dump(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn save_and_load_round_trip() {
    let fm = build_matcher_with(&TM, PenaltyTokens::CAS | PenaltyTokens::PCT);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tm.fztm");

    fm.save(&path).unwrap();
    let loaded = FuzzyMatch::load(&path).unwrap();

    assert!(loaded.is_sorted());
    assert_eq!(loaded.len(), fm.len());
    assert_eq!(loaded.config(), fm.config());
    assert_eq!(loaded.vocab().words(), fm.vocab().words());
    assert_eq!(dump(&loaded), dump(&fm));
    assert_eq!(all_results(&loaded), all_results(&fm));
}

#[test]
fn loaded_matcher_accepts_new_entries() {
    let fm = menu_matcher();
    let mut loaded = FuzzyMatch::from_bytes(&fm.to_bytes().unwrap()).unwrap();
    loaded.add_tm("new", "open the edit menu", true).unwrap();
    let results = scores(
        &loaded,
        "open the edit menu",
        &MatchOptions {
            fuzzy: 0.7,
            ..MatchOptions::default()
        },
    );
    assert_eq!(results[0], ("new".to_string(), 1.0));
    assert_eq!(results[1].0, "0");
}

#[test]
fn compact_file_rebuilds_weights() {
    let fm = menu_matcher();
    let compact = fm.to_bytes_compact().unwrap();
    let loaded = FuzzyMatch::from_bytes(&compact).unwrap();
    assert_eq!(all_results(&loaded), all_results(&fm));
}

#[test]
fn header_describes_the_file() {
    let fm = menu_matcher();
    let bytes = fm.to_bytes().unwrap();
    let header = IndexHeader::read(&mut &bytes[..]).unwrap();
    assert_eq!(header.version, VERSION);
    assert_eq!(header.sentence_count as usize, fm.len());
    assert_eq!(header.max_tokens_in_pattern as usize, fm.max_tokens_in_pattern());
    assert!(header.flags.has_bm25_table());
    assert_eq!(header.section_offsets().total_size(), bytes.len());
}

#[test]
fn garbage_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.fztm");
    fs::write(&path, b"this is not an index at all, just some text").unwrap();
    assert!(matches!(FuzzyMatch::load(&path), Err(Error::Format(_))));

    let missing = dir.path().join("missing.fztm");
    assert!(matches!(FuzzyMatch::load(&missing), Err(Error::Io(_))));
}

#[test]
fn future_versions_are_rejected() {
    let mut bytes = menu_matcher().to_bytes().unwrap();
    bytes[4] = 2;
    match FuzzyMatch::from_bytes(&bytes) {
        Err(Error::UnsupportedVersion { found, expected }) => {
            assert_eq!(found, 2);
            assert_eq!(expected, VERSION);
        }
        other => panic!("expected version error, got {:?}", other.map(|fm| fm.len())),
    }
}

#[test]
fn single_byte_corruption_is_detected() {
    let bytes = menu_matcher().to_bytes().unwrap();
    for pos in (IndexHeader::SIZE..bytes.len()).step_by(7) {
        let mut corrupt = bytes.clone();
        corrupt[pos] ^= 0x5A;
        assert!(FuzzyMatch::from_bytes(&corrupt).is_err(), "flip at {} accepted", pos);
    }
}
