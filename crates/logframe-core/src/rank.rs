//! Result ranking.
//!
//! Matched indicators are ordered by `(level priority, -match count, id)`.
//! The key is a strict total order, so ranking is deterministic regardless
//! of `MatchMap` iteration order and of ties between level priorities.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::model::{IndicatorView, Level, LevelId};
use crate::scan::MatchEntry;

/// Order `matches` and project them to views.
///
/// Indicators whose level is not in `levels` sort after every known level.
pub fn rank(matches: Vec<MatchEntry<'_>>, levels: &[Level]) -> Vec<IndicatorView> {
    let by_id: HashMap<LevelId, &Level> = levels.iter().map(|l| (l.id, l)).collect();

    let mut keyed: Vec<_> = matches
        .into_iter()
        .map(|entry| {
            let level = by_id.get(&entry.indicator.level).copied();
            let priority = level.map_or(u32::MAX, |l| l.priority);
            ((priority, Reverse(entry.count), entry.indicator.id), entry, level)
        })
        .collect();
    keyed.sort_unstable_by_key(|(key, _, _)| *key);

    keyed
        .into_iter()
        .map(|(_, entry, level)| IndicatorView::project(entry.indicator, level, entry.count))
        .collect()
}
