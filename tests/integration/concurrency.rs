//! One finalized matcher serving many threads.

use std::sync::Arc;
use std::thread;

use super::common::{build_matcher, menu_matcher, scores, TM};
use fuzzytm::{FilterStrategy, MatchOptions, SubsequenceOptions};

const QUERIES: [&str; 5] = [
    "the cat sat on the mat",
    "the dog sat on a mat",
    "open the file menu",
    "close the edit menu",
    "press the red button",
];

#[test]
fn concurrent_queries_match_sequential_ones() {
    let fm = build_matcher(&TM);
    let options = MatchOptions {
        fuzzy: 0.5,
        ..MatchOptions::default()
    };
    let expected: Vec<_> = QUERIES.iter().map(|q| scores(&fm, q, &options)).collect();

    thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let fm = &fm;
                s.spawn(move || {
                    // each thread walks the queries from a different offset
                    (0..QUERIES.len() * 4)
                        .map(|i| {
                            let q = (i + t) % QUERIES.len();
                            (q, scores(fm, QUERIES[q], &options))
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for (q, got) in handle.join().unwrap() {
                assert_eq!(got, expected[q], "query {}", QUERIES[q]);
            }
        }
    });
}

#[test]
fn shared_through_arc_with_mixed_filters() {
    let fm = Arc::new(menu_matcher());
    let workers: Vec<_> = [FilterStrategy::NGram, FilterStrategy::bm25(4)]
        .into_iter()
        .map(|filter| {
            let fm = Arc::clone(&fm);
            thread::spawn(move || {
                let options = MatchOptions {
                    fuzzy: 0.5,
                    filter,
                    ..MatchOptions::default()
                };
                let fuzzy = scores(&fm, "close the file menu", &options);
                let subseq = fm
                    .subsequence(
                        "please close the file menu now",
                        &SubsequenceOptions {
                            filter,
                            ..SubsequenceOptions::default()
                        },
                    )
                    .unwrap()
                    .len();
                (fuzzy, subseq)
            })
        })
        .collect();

    let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].0[0], ("1".to_string(), 1.0));
    assert_eq!(results[0].1, 2);
}
