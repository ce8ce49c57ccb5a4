//! Fuzz target for COCO manifest JSON parsing.
//!
//! Feeds arbitrary byte sequences to the manifest parser, checking for
//! panics, buffer overflows, or other undefined behavior.
//!
//! Run with:
//!   cargo +nightly fuzz run manifest_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use riceprep::manifest::schema::from_manifest_slice;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid OOM on very large inputs.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // Errors are fine; only panics, crashes, or hangs matter here.
    let _ = from_manifest_slice(data);
});
