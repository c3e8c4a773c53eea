// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `.fztm` parsing under adversarial input.
//!
//! A crafted index file must produce an error, never a panic or an
//! allocation sized by an untrusted length field.

#![no_main]

use fuzzytm::{FuzzyMatch, MatchOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(fm) = FuzzyMatch::from_bytes(data) else {
        return;
    };

    // A blob that decodes is a usable matcher
    assert!(fm.is_sorted());
    for s_id in 0..fm.len() as u32 {
        assert!(fm.sentence_id(s_id).is_some());
    }
    if let Some(text) = fm.sentence_text(0) {
        let _ = fm.match_sentence(&text, &MatchOptions::default());
    }

    let reencoded = fm.to_bytes().expect("decoded matcher re-encodes");
    let again = FuzzyMatch::from_bytes(&reencoded).expect("re-encoded blob decodes");
    assert_eq!(again.len(), fm.len());
});
