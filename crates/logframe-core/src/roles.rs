//! Level roles: which part of the result chain each catalog level plays.
//!
//! Roles are resolved once per render from the priority-ordered level list
//! and then drive the bucketing of views into template partitions.

use std::collections::HashMap;

use logframe_config::{LevelRole, LevelsConfig};
use tracing::warn;

use crate::model::{IndicatorView, Level, LevelId};

/// Role of every level of one catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct LevelRoles {
    roles: HashMap<LevelId, LevelRole>,
}

impl LevelRoles {
    /// Assign roles by position in `levels` (ascending priority). Levels
    /// past the configured list play [`LevelRole::OtherOutcome`].
    pub fn resolve(levels: &[Level], config: &LevelsConfig) -> Self {
        let roles = levels
            .iter()
            .enumerate()
            .map(|(pos, level)| {
                let role = config
                    .roles
                    .get(pos)
                    .copied()
                    .unwrap_or(LevelRole::OtherOutcome);
                (level.id, role)
            })
            .collect();
        Self { roles }
    }

    pub fn role_of(&self, level: LevelId) -> Option<LevelRole> {
        self.roles.get(&level).copied()
    }

    /// Split `views` into one bucket per partition, keeping their order.
    ///
    /// A view whose role belongs to no partition is left out.
    pub fn bucket<'v>(&self, views: &'v [IndicatorView], partitions: &[&[LevelRole]]) -> Vec<Vec<&'v IndicatorView>> {
        let mut buckets = vec![Vec::new(); partitions.len()];
        for view in views {
            let slot = self
                .role_of(view.level_id)
                .and_then(|role| partitions.iter().position(|roles| roles.contains(&role)));
            match slot {
                Some(idx) => buckets[idx].push(view),
                None => warn!(indicator = %view.id, level = %view.level_id, "Indicator has no template partition"),
            }
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Indicator, IndicatorId};
    use pretty_assertions::assert_eq;

    fn level(id: u64, priority: u32) -> Level {
        Level {
            id: LevelId(id),
            name: format!("L{id}"),
            label: String::new(),
            color: String::new(),
            priority,
        }
    }

    fn view(id: u64, level: u64) -> IndicatorView {
        IndicatorView::project(&Indicator::new(IndicatorId(id), "x", LevelId(level)), None, 1)
    }

    fn levels() -> Vec<Level> {
        vec![level(10, 1), level(20, 2), level(30, 3), level(40, 4), level(50, 5)]
    }

    #[test]
    fn test_resolve_by_priority_position() {
        let roles = LevelRoles::resolve(&levels(), &LevelsConfig::default());
        assert_eq!(roles.role_of(LevelId(10)), Some(LevelRole::Impact));
        assert_eq!(roles.role_of(LevelId(20)), Some(LevelRole::Outcome));
        assert_eq!(roles.role_of(LevelId(30)), Some(LevelRole::Output));
        assert_eq!(roles.role_of(LevelId(40)), Some(LevelRole::OtherOutcome));
        assert_eq!(roles.role_of(LevelId(50)), Some(LevelRole::OtherOutcome));
        assert_eq!(roles.role_of(LevelId(99)), None);
    }

    #[test]
    fn test_bucket_keeps_ranked_order() {
        let roles = LevelRoles::resolve(&levels(), &LevelsConfig::default());
        let views = vec![view(1, 10), view(2, 20), view(3, 40), view(4, 20), view(5, 30)];
        let partitions = [
            &[LevelRole::Impact][..],
            &[LevelRole::Outcome, LevelRole::OtherOutcome][..],
            &[LevelRole::Output][..],
        ];
        let buckets = roles.bucket(&views, &partitions);
        let ids: Vec<Vec<u64>> = buckets
            .iter()
            .map(|b| b.iter().map(|v| v.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![1], vec![2, 3, 4], vec![5]]);
    }

    #[test]
    fn test_bucket_drops_unassigned_roles() {
        let roles = LevelRoles::resolve(&levels(), &LevelsConfig::default());
        let views = vec![view(1, 40), view(2, 99)];
        let partitions = [&[LevelRole::Impact][..]];
        let buckets = roles.bucket(&views, &partitions);
        assert_eq!(buckets.len(), 1);
        assert!(buckets[0].is_empty());
    }
}
