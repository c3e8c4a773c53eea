//! Suffix index invariants.
//!
//! - Completeness: every non-separator position appears exactly once
//! - Sortedness: consecutive suffixes are in order up to their separator
//! - Slot metadata points back at the right sentence

use fuzzytm::{SuffixArrayIndex, SENTENCE_SEPARATOR};
use proptest::prelude::*;

use super::common::{corpus_ids_strategy, index_of};

fn until_separator(index: &SuffixArrayIndex, pos: u32) -> &[u32] {
    let tail = &index.buffer()[pos as usize..];
    let end = tail
        .iter()
        .position(|&id| id == SENTENCE_SEPARATOR)
        .unwrap_or(tail.len());
    &tail[..end]
}

proptest! {
    #[test]
    fn prop_suffixes_are_complete(corpus in corpus_ids_strategy()) {
        let index = index_of(&corpus);
        let mut positions: Vec<u32> = index.suffixes().to_vec();
        positions.sort_unstable();
        let expected: Vec<u32> = index
            .buffer()
            .iter()
            .enumerate()
            .filter(|&(_, &id)| id != SENTENCE_SEPARATOR)
            .map(|(pos, _)| pos as u32)
            .collect();
        prop_assert_eq!(positions, expected);
        prop_assert_eq!(index.suffix_count(), corpus.iter().map(Vec::len).sum::<usize>());
    }

    #[test]
    fn prop_suffixes_are_sorted(corpus in corpus_ids_strategy()) {
        let index = index_of(&corpus);
        for pair in index.suffixes().windows(2) {
            prop_assert!(until_separator(&index, pair[0]) <= until_separator(&index, pair[1]));
        }
    }

    #[test]
    fn prop_slot_metadata(corpus in corpus_ids_strategy()) {
        let index = index_of(&corpus);
        for slot in 0..index.suffix_count() {
            let s_id = index.sentence_id(slot);
            prop_assert_eq!(index.sentence(s_id), corpus[s_id as usize].as_slice());
            prop_assert_eq!(index.sentence_length(slot), corpus[s_id as usize].len());
            let suffix = until_separator(&index, index.suffixes()[slot]);
            prop_assert!(corpus[s_id as usize].ends_with(suffix));
        }
    }

    #[test]
    fn prop_restored_index_is_identical(corpus in corpus_ids_strategy()) {
        let index = index_of(&corpus);
        let restored = SuffixArrayIndex::from_parts(
            index.buffer().to_vec(),
            index.suffixes().to_vec(),
        )
        .expect("consistent parts");
        prop_assert_eq!(restored.suffixes(), index.suffixes());
        for slot in 0..index.suffix_count() {
            prop_assert_eq!(restored.sentence_id(slot), index.sentence_id(slot));
        }
    }
}
