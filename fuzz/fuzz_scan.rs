//! Fuzz target for the sliding-window scanner.
//!
//! Run with: cargo +nightly fuzz run fuzz_scan
//!
//! The first byte splits the input into a keyword list and a document body.
//! Checks that scanning never panics and that progress stays within bounds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logframe_core::scan::{CancelToken, ScanOptions, Scanner};
use logframe_core::{Indicator, IndicatorId, LevelId, ProgressRecorder, ProgressTracker};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (Ok(keywords), Ok(text)) = (std::str::from_utf8(&rest[..split]), std::str::from_utf8(&rest[split..])) else {
        return;
    };

    let indicators = vec![
        Indicator::new(IndicatorId(1), "fuzzed", LevelId(1)).with_keywords(keywords),
        Indicator::new(IndicatorId(2), "fixed", LevelId(2)).with_keywords("a b,c"),
    ];
    let recorder = ProgressRecorder::new();
    let mut tracker = ProgressTracker::new(&recorder);
    let matches = Scanner::new(&indicators, ScanOptions::default())
        .scan(text, &mut tracker, &CancelToken::new())
        .expect("scan without cancellation cannot fail");

    assert!(matches.len() <= indicators.len());
    let values = recorder.values();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
    assert!(values.iter().all(|&v| v <= 100));
});
