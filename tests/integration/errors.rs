//! Rejected inputs come back as errors, never panics.

use super::common::{build_matcher, options, TM};
use fuzzytm::{Error, FilterStrategy, FuzzyMatch, MatchOptions, PenaltyTokens, SubsequenceOptions};

#[test]
fn empty_and_blank_queries() {
    let fm = build_matcher(&TM);
    for query in ["", "   ", "\t\n"] {
        assert!(matches!(
            fm.match_sentence(query, &options(0.5)),
            Err(Error::EmptyPattern)
        ));
    }
    let tokens: [&str; 0] = [];
    assert!(matches!(
        fm.subsequence_tokens(&tokens, &SubsequenceOptions::default()),
        Err(Error::EmptyPattern)
    ));
}

#[test]
fn query_longer_than_the_limit() {
    let mut fm = FuzzyMatch::new(PenaltyTokens::NONE, 5);
    fm.add_tm("a", "one two three", true).unwrap();
    let err = fm.match_sentence("one two three four five six", &options(0.5)).unwrap_err();
    assert!(matches!(err, Error::PatternTooLong { len: 6, max: 5 }));
    assert!(fm.match_sentence("one two three four five", &options(0.5)).is_ok());
}

#[test]
fn corpus_entries_are_checked_on_insert() {
    let mut fm = FuzzyMatch::new(PenaltyTokens::NONE, 3);
    assert!(matches!(fm.add_tm("a", "", false), Err(Error::EmptyPattern)));
    assert!(matches!(
        fm.add_tm("b", "a b c d", false),
        Err(Error::PatternTooLong { len: 4, max: 3 })
    ));
    assert!(fm.is_empty());
}

#[test]
fn empty_corpus() {
    let mut fm = FuzzyMatch::default();
    assert!(matches!(fm.sort(), Err(Error::EmptyCorpus)));
    assert!(matches!(
        fm.match_sentence("anything", &options(0.5)),
        Err(Error::EmptyCorpus)
    ));
}

#[test]
fn unsorted_corpus() {
    let mut fm = build_matcher(&TM);
    fm.add_tm("late", "a late entry", false).unwrap();
    assert!(!fm.is_sorted());
    assert!(matches!(
        fm.match_sentence("a late entry", &options(0.5)),
        Err(Error::NotFinalized)
    ));
    fm.sort().unwrap();
    assert_eq!(
        fm.match_sentence("a late entry", &options(0.5)).unwrap()[0].id,
        "late"
    );
}

#[test]
fn invalid_options() {
    let fm = build_matcher(&TM);
    for options in [
        MatchOptions {
            fuzzy: 1.5,
            ..MatchOptions::default()
        },
        MatchOptions {
            contrastive_factor: -1.0,
            ..MatchOptions::default()
        },
        MatchOptions {
            filter: FilterStrategy::bm25(0),
            ..MatchOptions::default()
        },
    ] {
        assert!(matches!(
            fm.match_sentence("the cat", &options),
            Err(Error::InvalidConfig(_))
        ));
    }
}
