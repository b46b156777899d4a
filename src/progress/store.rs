use crate::progress::cosmetics::DEFAULT_COSMETIC_ID;
use crate::progress::tracker::AchievementProgressRecord;
use crate::shared::player::PlayerProfile;
use anyhow::Context;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub player_id: String,
    pub username: String,
    pub high_score: i64,
    pub games_played: i64,
    pub total_score: i64,
    pub currency: i64,
    pub league_points: i64,
    pub equipped_cosmetic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_id: String,
    pub username: String,
    pub high_score: i64,
    pub league_points: i64,
    pub equipped_cosmetic: String,
}

/// Per-run increments applied to the stats row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTotals {
    pub score: i64,
    pub currency: i64,
    pub league_points: i64,
}

#[derive(Debug, Clone)]
pub struct ProgressStore {
    db: SqlitePool,
}

impl ProgressStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        ensure_db_dir(database_url)?;
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("connect {database_url}"))?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("apply progress migrations")?;
        Ok(Self { db })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory sqlite");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("apply migrations");
        Self { db }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.db.begin().await
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    pub async fn load_stats(&self, player_id: &str) -> Result<Option<UserStats>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT player_id, username, high_score, games_played, total_score, currency, \
             league_points, equipped_cosmetic FROM user_stats WHERE player_id = ?",
        )
        .bind(player_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(UserStats {
            player_id: row.try_get("player_id")?,
            username: row.try_get("username")?,
            high_score: row.try_get("high_score")?,
            games_played: row.try_get("games_played")?,
            total_score: row.try_get("total_score")?,
            currency: row.try_get("currency")?,
            league_points: row.try_get("league_points")?,
            equipped_cosmetic: row.try_get("equipped_cosmetic")?,
        }))
    }

    pub async fn load_progress(
        &self,
        player_id: &str,
    ) -> Result<Vec<AchievementProgressRecord>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT achievement_id, progress, is_unlocked, unlocked_at \
             FROM achievement_progress WHERE player_id = ?",
        )
        .bind(player_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AchievementProgressRecord {
                    achievement_id: row.try_get("achievement_id")?,
                    progress: row.try_get("progress")?,
                    is_unlocked: row.try_get("is_unlocked")?,
                    unlocked_at: row.try_get("unlocked_at")?,
                })
            })
            .collect()
    }

    pub async fn top_players(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT player_id, username, high_score, league_points, equipped_cosmetic \
             FROM user_stats ORDER BY high_score DESC, games_played ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(LeaderboardEntry {
                    player_id: row.try_get("player_id")?,
                    username: row.try_get("username")?,
                    high_score: row.try_get("high_score")?,
                    league_points: row.try_get("league_points")?,
                    equipped_cosmetic: row.try_get("equipped_cosmetic")?,
                })
            })
            .collect()
    }

    pub async fn unlocked_cosmetics(&self, player_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT cosmetic_id FROM player_cosmetics WHERE player_id = ? ORDER BY unlocked_at",
        )
        .bind(player_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(|row| row.try_get("cosmetic_id")).collect()
    }

    /// Grants cosmetics, returning only the ids that were not owned before.
    pub async fn unlock_cosmetics(
        &self,
        player_id: &str,
        cosmetic_ids: &[&str],
        now: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        let mut granted = Vec::new();
        for cosmetic_id in cosmetic_ids {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO player_cosmetics (player_id, cosmetic_id, unlocked_at) \
                 VALUES (?, ?, ?)",
            )
            .bind(player_id)
            .bind(cosmetic_id)
            .bind(now)
            .execute(&self.db)
            .await?;
            if result.rows_affected() > 0 {
                granted.push(cosmetic_id.to_string());
            }
        }
        Ok(granted)
    }
}

pub(crate) async fn record_run_stats(
    conn: &mut SqliteConnection,
    player: &PlayerProfile,
    totals: RunTotals,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_stats \
           (player_id, username, high_score, games_played, total_score, currency, league_points) \
         VALUES (?, ?, ?, 1, ?, ?, ?) \
         ON CONFLICT(player_id) DO UPDATE SET \
           username = excluded.username, \
           high_score = MAX(user_stats.high_score, excluded.high_score), \
           games_played = user_stats.games_played + 1, \
           total_score = user_stats.total_score + excluded.total_score, \
           currency = user_stats.currency + excluded.currency, \
           league_points = user_stats.league_points + excluded.league_points",
    )
    .bind(&player.player_id)
    .bind(&player.username)
    .bind(totals.score)
    .bind(totals.score)
    .bind(totals.currency)
    .bind(totals.league_points)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn publish_league_player(
    conn: &mut SqliteConnection,
    player: &PlayerProfile,
    league_points: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO league_players (player_id, username, league_points, equipped_cosmetic) \
         VALUES (?, ?, ?, \
           COALESCE((SELECT equipped_cosmetic FROM user_stats WHERE player_id = ?), ?)) \
         ON CONFLICT(player_id) DO UPDATE SET \
           username = excluded.username, \
           league_points = league_players.league_points + excluded.league_points, \
           equipped_cosmetic = excluded.equipped_cosmetic",
    )
    .bind(&player.player_id)
    .bind(&player.username)
    .bind(league_points)
    .bind(&player.player_id)
    .bind(DEFAULT_COSMETIC_ID)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Current `(progress, is_unlocked)` for one achievement, if a row exists.
pub(crate) async fn read_progress(
    conn: &mut SqliteConnection,
    player_id: &str,
    achievement_id: &str,
) -> Result<Option<(f64, bool)>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT progress, is_unlocked FROM achievement_progress \
         WHERE player_id = ? AND achievement_id = ?",
    )
    .bind(player_id)
    .bind(achievement_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(row) = row else { return Ok(None) };
    Ok(Some((row.try_get("progress")?, row.try_get("is_unlocked")?)))
}

/// Atomic `progress = progress + delta`; returns the stored total.
pub(crate) async fn increment_progress(
    conn: &mut SqliteConnection,
    player_id: &str,
    achievement_id: &str,
    delta: f64,
) -> Result<f64, sqlx::Error> {
    sqlx::query(
        "INSERT INTO achievement_progress (player_id, achievement_id, progress, is_unlocked) \
         VALUES (?, ?, ?, 0) \
         ON CONFLICT(player_id, achievement_id) DO UPDATE SET \
           progress = achievement_progress.progress + excluded.progress",
    )
    .bind(player_id)
    .bind(achievement_id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;

    let total: f64 = sqlx::query_scalar(
        "SELECT progress FROM achievement_progress WHERE player_id = ? AND achievement_id = ?",
    )
    .bind(player_id)
    .bind(achievement_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}

pub(crate) async fn write_progress(
    conn: &mut SqliteConnection,
    player_id: &str,
    achievement_id: &str,
    progress: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO achievement_progress (player_id, achievement_id, progress, is_unlocked) \
         VALUES (?, ?, ?, 0) \
         ON CONFLICT(player_id, achievement_id) DO UPDATE SET progress = excluded.progress",
    )
    .bind(player_id)
    .bind(achievement_id)
    .bind(progress)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn mark_unlocked(
    conn: &mut SqliteConnection,
    player_id: &str,
    achievement_id: &str,
    progress: f64,
    unlocked_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO achievement_progress \
           (player_id, achievement_id, progress, is_unlocked, unlocked_at) \
         VALUES (?, ?, ?, 1, ?) \
         ON CONFLICT(player_id, achievement_id) DO UPDATE SET \
           is_unlocked = 1, unlocked_at = excluded.unlocked_at",
    )
    .bind(player_id)
    .bind(achievement_id)
    .bind(progress)
    .bind(unlocked_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn ensure_db_dir(database_url: &str) -> anyhow::Result<()> {
    if database_url.starts_with("sqlite::memory:") {
        return Ok(());
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"));
    let Some(path) = path else { return Ok(()) };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    let db_path = PathBuf::from(path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }
    if !db_path.exists() {
        std::fs::File::create(&db_path)
            .with_context(|| format!("create database file {}", db_path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_player(id: &str) -> PlayerProfile {
        PlayerProfile {
            player_id: id.to_string(),
            username: format!("{id}-name"),
        }
    }

    #[tokio::test]
    async fn missing_stats_load_as_none() {
        let store = ProgressStore::in_memory().await;
        assert_eq!(store.load_stats("nobody").await.unwrap(), None);
        assert!(store.load_progress("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_stats_accumulate_and_keep_the_best_score() {
        let store = ProgressStore::in_memory().await;
        let player = make_player("p1");
        let mut conn = store.pool().acquire().await.unwrap();
        for (score, currency, league) in [(120, 24, 12), (40, 8, 4)] {
            record_run_stats(
                &mut conn,
                &player,
                RunTotals {
                    score,
                    currency,
                    league_points: league,
                },
            )
            .await
            .unwrap();
        }
        drop(conn);

        let stats = store.load_stats("p1").await.unwrap().unwrap();
        assert_eq!(stats.high_score, 120);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.total_score, 160);
        assert_eq!(stats.currency, 32);
        assert_eq!(stats.league_points, 16);
        assert_eq!(stats.equipped_cosmetic, DEFAULT_COSMETIC_ID);
    }

    #[tokio::test]
    async fn increments_add_to_the_stored_value() {
        let store = ProgressStore::in_memory().await;
        let mut conn = store.pool().acquire().await.unwrap();
        assert_eq!(increment_progress(&mut conn, "p1", "eat-50", 3.0).await.unwrap(), 3.0);
        assert_eq!(increment_progress(&mut conn, "p1", "eat-50", 4.0).await.unwrap(), 7.0);
        assert_eq!(read_progress(&mut conn, "p1", "eat-50").await.unwrap(), Some((7.0, false)));
    }

    #[tokio::test]
    async fn top_players_orders_by_high_score() {
        let store = ProgressStore::in_memory().await;
        let mut conn = store.pool().acquire().await.unwrap();
        for (id, score) in [("a", 30), ("b", 90), ("c", 60)] {
            let totals = RunTotals {
                score,
                currency: 0,
                league_points: 0,
            };
            record_run_stats(&mut conn, &make_player(id), totals).await.unwrap();
        }
        drop(conn);

        let top = store.top_players(2).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|entry| entry.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn cosmetic_unlocks_are_idempotent() {
        let store = ProgressStore::in_memory().await;
        let first = store.unlock_cosmetics("p1", &["ouroboros"], 10).await.unwrap();
        let second = store
            .unlock_cosmetics("p1", &["ouroboros", "hard-god-skin"], 20)
            .await
            .unwrap();
        assert_eq!(first, vec!["ouroboros".to_string()]);
        assert_eq!(second, vec!["hard-god-skin".to_string()]);
        assert_eq!(store.unlocked_cosmetics("p1").await.unwrap().len(), 2);
    }

    #[test]
    fn memory_urls_need_no_directory() {
        assert!(ensure_db_dir("sqlite::memory:").is_ok());
        assert!(ensure_db_dir("postgres://elsewhere").is_ok());
    }
}
