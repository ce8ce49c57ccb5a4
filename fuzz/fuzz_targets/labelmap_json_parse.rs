//! Fuzz target for labelmap JSON parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run labelmap_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use riceprep::labelmap::Labelmap;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    // Parse then validate, exercising the duplicate-id and duplicate-name
    // checks on whatever entries the parser produced.
    let _ = Labelmap::from_slice(data);
});
