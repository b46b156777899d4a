use crate::progress::catalog::{self, AchievementDefinition, ProgressKind, ACHIEVEMENTS};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Buffered value for one achievement. Cumulative entries hold the delta since the
/// last flush; max entries hold the best value seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingEntry {
    pub value: f64,
    pub kind: ProgressKind,
}

pub type PendingSync = HashMap<&'static str, PendingEntry>;

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementProgressRecord {
    pub achievement_id: String,
    pub progress: f64,
    pub is_unlocked: bool,
    pub unlocked_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementWithProgress {
    #[serde(flatten)]
    pub definition: AchievementDefinition,
    pub progress: f64,
    pub is_unlocked: bool,
    pub unlocked_at: Option<i64>,
}

#[derive(Debug, Default)]
pub struct AchievementTracker {
    persisted: HashMap<String, AchievementProgressRecord>,
    pending: PendingSync,
}

impl AchievementTracker {
    pub fn new(records: impl IntoIterator<Item = AchievementProgressRecord>) -> Self {
        let mut tracker = Self::default();
        tracker.replace_persisted(records);
        tracker
    }

    pub fn replace_persisted(
        &mut self,
        records: impl IntoIterator<Item = AchievementProgressRecord>,
    ) {
        self.persisted = records
            .into_iter()
            .map(|record| (record.achievement_id.clone(), record))
            .collect();
    }

    /// Buffers a progress observation. Unknown ids and already unlocked achievements
    /// are ignored. `additive` forces summing for max-type achievements.
    pub fn record(&mut self, id: &str, value: f64, additive: bool) {
        let Some(def) = catalog::find(id) else {
            return;
        };
        if self.is_unlocked(def.id) {
            return;
        }
        let persisted = self.persisted.get(def.id);

        let cumulative = def.kind == ProgressKind::Cumulative;
        let current = match self.pending.get(def.id) {
            Some(entry) => entry.value,
            None if cumulative => 0.0,
            None => persisted.map(|record| record.progress).unwrap_or(0.0),
        };
        let next = if cumulative || additive {
            current + value
        } else {
            current.max(value)
        };

        if next != current {
            self.pending.insert(
                def.id,
                PendingEntry {
                    value: next,
                    kind: def.kind,
                },
            );
        }
    }

    pub fn peek_pending(&self) -> PendingSync {
        self.pending.clone()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[cfg(test)]
    pub fn pending_value(&self, id: &str) -> Option<f64> {
        self.pending.get(id).map(|entry| entry.value)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.persisted
            .get(id)
            .is_some_and(|record| record.is_unlocked)
    }

    pub fn unlocked_ids(&self) -> HashSet<&str> {
        self.persisted
            .values()
            .filter(|record| record.is_unlocked)
            .map(|record| record.achievement_id.as_str())
            .collect()
    }

    pub fn with_progress(&self) -> Vec<AchievementWithProgress> {
        merge_progress(&self.persisted)
    }
}

/// Joins the catalog with persisted progress. Missing records read as zero.
fn merge_progress(
    persisted: &HashMap<String, AchievementProgressRecord>,
) -> Vec<AchievementWithProgress> {
    ACHIEVEMENTS
        .iter()
        .map(|def| {
            let record = persisted.get(def.id);
            AchievementWithProgress {
                definition: *def,
                progress: record.map(|r| r.progress).unwrap_or(0.0),
                is_unlocked: record.is_some_and(|r| r.is_unlocked),
                unlocked_at: record.and_then(|r| r.unlocked_at),
            }
        })
        .collect()
}
