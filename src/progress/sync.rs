use crate::app::time::now_millis;
use crate::game::types::Difficulty;
use crate::progress::catalog::{self, AchievementDefinition, ProgressKind};
use crate::progress::cosmetics;
use crate::progress::error::{SyncError, SyncStage};
use crate::progress::store::{self, ProgressStore, RunTotals};
use crate::progress::tracker::{AchievementProgressRecord, PendingSync};
use crate::shared::player::PlayerProfile;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardRates {
    pub currency_divisor: u32,
    pub league_point_divisor: u32,
}

impl RewardRates {
    pub fn currency_for(&self, score: u32) -> u32 {
        score / self.currency_divisor.max(1)
    }

    pub fn league_points_for(&self, score: u32) -> u32 {
        score / self.league_point_divisor.max(1)
    }
}

/// Summary of a finished run, kept so a failed flush can be retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub score: u32,
    pub difficulty: Difficulty,
    pub food_eaten: u32,
    pub tiles_moved: u64,
    pub started_at: i64,
    pub ended_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockNotification {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlushReport {
    pub score: u32,
    pub currency_earned: u32,
    pub league_points_earned: u32,
    pub newly_unlocked: Vec<&'static AchievementDefinition>,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncTimings {
    pub settle: Duration,
    pub notify_delay: Duration,
}

/// Commits a run's stats and buffered achievement progress in one transaction.
#[derive(Debug, Clone)]
pub struct ProgressSync {
    store: ProgressStore,
    rates: RewardRates,
    timings: SyncTimings,
}

impl ProgressSync {
    pub fn new(store: ProgressStore, rates: RewardRates, timings: SyncTimings) -> Self {
        Self {
            store,
            rates,
            timings,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.timings.settle
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub async fn flush(
        &self,
        player: &PlayerProfile,
        run: &RunStatistics,
        pending: &PendingSync,
        notifications: &mpsc::UnboundedSender<UnlockNotification>,
    ) -> Result<FlushReport, SyncError> {
        let currency = self.rates.currency_for(run.score);
        let league_points = self.rates.league_points_for(run.score);
        let player_id = player.player_id.as_str();

        let mut tx = self.store.begin().await.map_err(SyncError::at(SyncStage::Begin))?;

        let totals = RunTotals {
            score: i64::from(run.score),
            currency: i64::from(currency),
            league_points: i64::from(league_points),
        };
        store::record_run_stats(&mut tx, player, totals)
            .await
            .map_err(SyncError::at(SyncStage::Stats))?;
        store::publish_league_player(&mut tx, player, totals.league_points)
            .await
            .map_err(SyncError::at(SyncStage::League))?;

        let mut entries: Vec<_> = pending.iter().collect();
        entries.sort_by_key(|(id, _)| **id);

        let unlocked_at = now_millis();
        let mut newly_unlocked = Vec::new();
        for (id, entry) in entries {
            let Some(def) = catalog::find(id) else { continue };
            let stored = store::read_progress(&mut tx, player_id, def.id)
                .await
                .map_err(SyncError::for_achievement(def.id))?;
            if stored.is_some_and(|(_, unlocked)| unlocked) {
                continue;
            }

            let progress = match entry.kind {
                ProgressKind::Cumulative => {
                    store::increment_progress(&mut tx, player_id, def.id, entry.value)
                        .await
                        .map_err(SyncError::for_achievement(def.id))?
                }
                ProgressKind::Max => {
                    let persisted = stored.map(|(progress, _)| progress).unwrap_or(0.0);
                    if entry.value > persisted {
                        store::write_progress(&mut tx, player_id, def.id, entry.value)
                            .await
                            .map_err(SyncError::for_achievement(def.id))?;
                    }
                    persisted.max(entry.value)
                }
            };

            if progress >= def.target {
                store::mark_unlocked(&mut tx, player_id, def.id, progress, unlocked_at)
                    .await
                    .map_err(SyncError::for_achievement(def.id))?;
                newly_unlocked.push(def);
            }
        }

        tx.commit().await.map_err(SyncError::at(SyncStage::Commit))?;

        tracing::info!(
            player_id,
            score = run.score,
            food_eaten = run.food_eaten,
            difficulty = run.difficulty.as_str(),
            unlocked = newly_unlocked.len(),
            "run saved"
        );
        self.queue_notifications(&newly_unlocked, notifications);

        Ok(FlushReport {
            score: run.score,
            currency_earned: currency,
            league_points_earned: league_points,
            newly_unlocked,
        })
    }

    fn queue_notifications(
        &self,
        unlocked: &[&'static AchievementDefinition],
        notifications: &mpsc::UnboundedSender<UnlockNotification>,
    ) {
        if unlocked.is_empty() {
            return;
        }
        let queued: Vec<UnlockNotification> = unlocked
            .iter()
            .map(|def| UnlockNotification {
                id: def.id,
                name: def.name,
            })
            .collect();
        let delay = self.timings.notify_delay;
        let sink = notifications.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for notification in queued {
                if sink.send(notification).is_err() {
                    break;
                }
            }
        });
    }

    pub async fn reload_progress(
        &self,
        player_id: &str,
    ) -> Result<Vec<AchievementProgressRecord>, sqlx::Error> {
        self.store.load_progress(player_id).await
    }

    /// Grants achievement-gated cosmetics the player has earned but does not own yet.
    pub async fn grant_earned_cosmetics<'a, I>(
        &self,
        player_id: &str,
        unlocked: I,
        now: i64,
    ) -> Result<Vec<String>, sqlx::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let owned = self.store.unlocked_cosmetics(player_id).await?;
        let earned: Vec<&str> = cosmetics::newly_earned(unlocked, &owned)
            .into_iter()
            .map(|cosmetic| cosmetic.id)
            .collect();
        if earned.is_empty() {
            return Ok(Vec::new());
        }
        self.store.unlock_cosmetics(player_id, &earned, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::catalog::ids;
    use crate::progress::tracker::{AchievementTracker, PendingEntry};

    fn make_player() -> PlayerProfile {
        PlayerProfile {
            player_id: "player-1".to_string(),
            username: "Tester".to_string(),
        }
    }

    fn make_run(score: u32) -> RunStatistics {
        RunStatistics {
            score,
            difficulty: Difficulty::Hard,
            food_eaten: score / 5,
            tiles_moved: 100,
            started_at: 0,
            ended_at: 60_000,
        }
    }

    async fn make_sync() -> ProgressSync {
        ProgressSync::new(
            ProgressStore::in_memory().await,
            RewardRates {
                currency_divisor: 5,
                league_point_divisor: 10,
            },
            SyncTimings {
                settle: Duration::ZERO,
                notify_delay: Duration::ZERO,
            },
        )
    }

    fn pending(entries: &[(&'static str, f64)]) -> PendingSync {
        entries
            .iter()
            .map(|(id, value)| {
                let kind = catalog::find(id).unwrap().kind;
                (*id, PendingEntry { value: *value, kind })
            })
            .collect()
    }

    fn progress_of(records: &[AchievementProgressRecord], id: &str) -> Option<(f64, bool)> {
        records
            .iter()
            .find(|record| record.achievement_id == id)
            .map(|record| (record.progress, record.is_unlocked))
    }

    #[tokio::test]
    async fn flush_updates_stats_and_league_record() {
        let sync = make_sync().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = make_player();

        let report = sync.flush(&player, &make_run(47), &PendingSync::new(), &tx).await.unwrap();
        assert_eq!(report.currency_earned, 9);
        assert_eq!(report.league_points_earned, 4);
        sync.flush(&player, &make_run(20), &PendingSync::new(), &tx).await.unwrap();

        let stats = sync.store().load_stats("player-1").await.unwrap().unwrap();
        assert_eq!(stats.high_score, 47);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.total_score, 67);
        assert_eq!(stats.currency, 9 + 4);
        assert_eq!(stats.league_points, 4 + 2);

        let league: (String, i64) =
            sqlx::query_as("SELECT username, league_points FROM league_players WHERE player_id = ?")
                .bind("player-1")
                .fetch_one(sync.store().pool())
                .await
                .unwrap();
        assert_eq!(league, ("Tester".to_string(), 6));
    }

    #[tokio::test]
    async fn cumulative_entries_increment_and_max_entries_only_grow() {
        let sync = make_sync().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = make_player();

        let first = pending(&[(ids::EAT_50, 20.0), (ids::LONG_SNAKE, 12.0)]);
        sync.flush(&player, &make_run(100), &first, &tx).await.unwrap();
        let second = pending(&[(ids::EAT_50, 5.0), (ids::LONG_SNAKE, 8.0)]);
        sync.flush(&player, &make_run(25), &second, &tx).await.unwrap();

        let records = sync.reload_progress("player-1").await.unwrap();
        assert_eq!(progress_of(&records, ids::EAT_50), Some((25.0, false)));
        assert_eq!(progress_of(&records, ids::LONG_SNAKE), Some((12.0, false)));
    }

    #[tokio::test]
    async fn reaching_the_target_unlocks_and_notifies() {
        let sync = make_sync().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = make_player();

        let buffered = pending(&[(ids::RAT_TRICK, 3.0), (ids::FIRST_BITE, 1.0)]);
        let report = sync
            .flush(&player, &make_run(15), &buffered, &tx)
            .await
            .unwrap();
        let mut unlocked: Vec<&str> = report.newly_unlocked.iter().map(|def| def.id).collect();
        unlocked.sort();
        assert_eq!(unlocked, vec![ids::FIRST_BITE, ids::RAT_TRICK]);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.id, ids::FIRST_BITE);
        assert_eq!(second.name, "Rat Trick");

        let records = sync.reload_progress("player-1").await.unwrap();
        assert_eq!(progress_of(&records, ids::RAT_TRICK), Some((3.0, true)));
    }

    #[tokio::test]
    async fn unlocked_achievements_are_left_untouched() {
        let sync = make_sync().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = make_player();

        sync.flush(&player, &make_run(5), &pending(&[(ids::FIRST_BITE, 1.0)]), &tx)
            .await
            .unwrap();
        let report = sync
            .flush(&player, &make_run(5), &pending(&[(ids::FIRST_BITE, 1.0)]), &tx)
            .await
            .unwrap();
        assert!(report.newly_unlocked.is_empty());

        let records = sync.reload_progress("player-1").await.unwrap();
        assert_eq!(progress_of(&records, ids::FIRST_BITE), Some((1.0, true)));
    }

    #[tokio::test]
    async fn tracker_deltas_flush_without_double_counting() {
        let sync = make_sync().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = make_player();

        sync.flush(&player, &make_run(5), &pending(&[(ids::PLAY_10, 4.0)]), &tx)
            .await
            .unwrap();
        let mut tracker = AchievementTracker::new(sync.reload_progress("player-1").await.unwrap());
        tracker.record(ids::PLAY_10, 1.0, false);
        sync.flush(&player, &make_run(5), &tracker.peek_pending(), &tx)
            .await
            .unwrap();

        let records = sync.reload_progress("player-1").await.unwrap();
        assert_eq!(progress_of(&records, ids::PLAY_10), Some((5.0, false)));
    }

    #[tokio::test]
    async fn closed_store_reports_an_error() {
        let sync = make_sync().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        sync.store().close().await;

        let err = sync
            .flush(&make_player(), &make_run(50), &pending(&[(ids::FIRST_BITE, 1.0)]), &tx)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), SyncStage::Begin);
    }

    #[tokio::test]
    async fn earned_cosmetics_are_granted_once() {
        let sync = make_sync().await;
        let granted = sync
            .grant_earned_cosmetics("player-1", [ids::ULTRA_SNAKE], 5)
            .await
            .unwrap();
        assert_eq!(granted, vec!["ouroboros".to_string()]);
        let again = sync
            .grant_earned_cosmetics("player-1", [ids::ULTRA_SNAKE], 6)
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn rewards_floor_the_division() {
        let rates = RewardRates {
            currency_divisor: 5,
            league_point_divisor: 10,
        };
        assert_eq!(rates.currency_for(47), 9);
        assert_eq!(rates.league_points_for(47), 4);
        assert_eq!(rates.currency_for(4), 0);
    }
}
