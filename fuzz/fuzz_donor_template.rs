//! Fuzz target for worksheet decoding and donor report population.
//!
//! Run with: cargo +nightly fuzz run fuzz_donor_template
//!
//! Decodes arbitrary bytes as a donor template and fills it with a fixed
//! overflowing selection. Grid errors are fine; panics are not.

#![no_main]

use libfuzzer_sys::fuzz_target;
use logframe_config::DonorConfig;
use logframe_core::{donor, Indicator, IndicatorId, IndicatorView, LevelId, Worksheet};

fuzz_target!(|data: &[u8]| {
    let Ok(mut sheet) = Worksheet::from_bytes(data) else {
        return;
    };
    let views: Vec<IndicatorView> = (1..=7)
        .map(|id| IndicatorView::project(&Indicator::new(IndicatorId(id), "x", LevelId(1)), None, 1))
        .collect();
    let buckets = vec![vec![&views[0]], views[1..6].iter().collect(), vec![&views[6]]];
    let _ = donor::populate(&mut sheet, &buckets, &DonorConfig::default());
});
