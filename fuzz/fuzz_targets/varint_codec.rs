// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Varint (LEB128) decoding of garbage bytes.

#![no_main]

use fuzzytm::binary::{decode_varint, encode_varint, MAX_VARINT_BYTES};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok((value, consumed)) = decode_varint(data) else {
        return;
    };
    assert!(consumed <= MAX_VARINT_BYTES);
    assert!(consumed <= data.len());

    let mut reencoded = Vec::new();
    encode_varint(value, &mut reencoded);
    let (redecoded, reconsumed) = decode_varint(&reencoded).expect("canonical varint decodes");
    assert_eq!(value, redecoded);
    assert_eq!(reconsumed, reencoded.len());
});
