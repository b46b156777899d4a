use anyhow::Context;
use axum::{
  extract::{Path, Query, State, WebSocketUpgrade},
  http::{Method, StatusCode},
  response::{IntoResponse, Response},
  routing::get,
  Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod app;
mod game;
mod progress;
mod protocol;
mod shared;
mod transport;

use app::config::AppConfig;
use app::time::now_millis;
use game::session::SessionContext;
use game::types::Difficulty;
use progress::store::{LeaderboardEntry, ProgressStore};
use progress::sync::{ProgressSync, SyncTimings};
use progress::tracker::{AchievementTracker, AchievementWithProgress};
use shared::player::PlayerProfile;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;
const SECRET_NAME: &str = "???";
const SECRET_DESCRIPTION: &str = "Keep playing to reveal this achievement.";

#[derive(Clone)]
struct AppState {
  sessions: Arc<DashMap<String, i64>>,
  store: ProgressStore,
  sync: Arc<ProgressSync>,
  config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
  ok: bool,
  error: String,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
  players: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
struct AchievementsResponse {
  #[serde(rename = "playerId")]
  player_id: String,
  unlocked: usize,
  total: usize,
  achievements: Vec<AchievementWithProgress>,
}

#[derive(Debug, Deserialize)]
struct PlayQuery {
  player: Option<String>,
  name: Option<String>,
  difficulty: Option<String>,
}

/// Holds a player's single-session slot until the socket task finishes.
struct SessionLease {
  sessions: Arc<DashMap<String, i64>>,
  player_id: String,
}

impl Drop for SessionLease {
  fn drop(&mut self) {
    self.sessions.remove(&self.player_id);
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = AppConfig::from_env()?;
  let store = ProgressStore::connect(&config.database_url).await?;
  let sync = ProgressSync::new(
    store.clone(),
    config.rewards,
    SyncTimings {
      settle: config.flush_settle,
      notify_delay: config.unlock_notify_delay,
    },
  );

  let port = config.port;
  let state = Arc::new(AppState {
    sessions: Arc::new(DashMap::new()),
    store,
    sync: Arc::new(sync),
    config: Arc::new(config),
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/leaderboard", get(leaderboard_get))
    .route("/api/players/:player_id/achievements", get(achievements_get))
    .route("/api/play", get(play_handler))
    .layer(cors)
    .with_state(state);

  let address = format!("0.0.0.0:{port}");
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address)
    .await
    .with_context(|| format!("bind {address}"))?;
  axum::serve(listener, app).await?;

  Ok(())
}

fn error_response(status: StatusCode, error: &str) -> Response {
  (
    status,
    Json(ErrorResponse {
      ok: false,
      error: error.to_string(),
    }),
  )
    .into_response()
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

fn parse_limit(params: &HashMap<String, String>) -> i64 {
  params
    .get("limit")
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(DEFAULT_LIMIT)
    .clamp(1, MAX_LIMIT)
}

async fn leaderboard_get(
  State(state): State<Arc<AppState>>,
  Query(params): Query<HashMap<String, String>>,
) -> Response {
  match state.store.top_players(parse_limit(&params)).await {
    Ok(players) => (StatusCode::OK, Json(LeaderboardResponse { players })).into_response(),
    Err(err) => {
      tracing::warn!(%err, "leaderboard query failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
    }
  }
}

/// Hides the name and description of secret achievements the player has not earned.
fn mask_locked_secrets(achievements: &mut [AchievementWithProgress]) {
  for entry in achievements.iter_mut() {
    if entry.definition.is_secret && !entry.is_unlocked {
      entry.definition.name = SECRET_NAME;
      entry.definition.description = SECRET_DESCRIPTION;
    }
  }
}

async fn achievements_get(
  State(state): State<Arc<AppState>>,
  Path(player_id): Path<String>,
) -> Response {
  let records = match state.store.load_progress(&player_id).await {
    Ok(records) => records,
    Err(err) => {
      tracing::warn!(%player_id, %err, "achievement query failed");
      return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load achievements");
    }
  };

  let mut achievements = AchievementTracker::new(records).with_progress();
  mask_locked_secrets(&mut achievements);
  let unlocked = achievements.iter().filter(|entry| entry.is_unlocked).count();

  Json(AchievementsResponse {
    player_id,
    unlocked,
    total: achievements.len(),
    achievements,
  })
  .into_response()
}

async fn play_handler(
  ws: WebSocketUpgrade,
  Query(params): Query<PlayQuery>,
  State(state): State<Arc<AppState>>,
) -> Response {
  let difficulty = match params.difficulty.as_deref() {
    None => Difficulty::default(),
    Some(raw) => match Difficulty::parse(raw) {
      Some(difficulty) => difficulty,
      None => return error_response(StatusCode::BAD_REQUEST, "Unknown difficulty"),
    },
  };
  let player = PlayerProfile::from_request(params.player.as_deref(), params.name.as_deref());

  let lease = match state.sessions.entry(player.player_id.clone()) {
    dashmap::mapref::entry::Entry::Occupied(_) => {
      return error_response(StatusCode::CONFLICT, "Player already has an active session");
    }
    dashmap::mapref::entry::Entry::Vacant(entry) => {
      entry.insert(now_millis());
      SessionLease {
        sessions: state.sessions.clone(),
        player_id: player.player_id.clone(),
      }
    }
  };

  let context = SessionContext {
    sync: state.sync.clone(),
    config: state.config.clone(),
  };
  ws.on_upgrade(move |socket| async move {
    let _lease = lease;
    transport::ws_session::handle_socket(socket, player, difficulty, context).await;
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use progress::catalog::ids;
  use progress::tracker::AchievementProgressRecord;

  #[test]
  fn limit_defaults_and_clamps() {
    let mut params = HashMap::new();
    assert_eq!(parse_limit(&params), DEFAULT_LIMIT);
    params.insert("limit".to_string(), "500".to_string());
    assert_eq!(parse_limit(&params), MAX_LIMIT);
    params.insert("limit".to_string(), "0".to_string());
    assert_eq!(parse_limit(&params), 1);
    params.insert("limit".to_string(), "abc".to_string());
    assert_eq!(parse_limit(&params), DEFAULT_LIMIT);
  }

  #[test]
  fn only_locked_secrets_are_masked() {
    let tracker = AchievementTracker::new([AchievementProgressRecord {
      achievement_id: ids::GHOST_MODE.to_string(),
      progress: 20.0,
      is_unlocked: true,
      unlocked_at: Some(5),
    }]);
    let mut achievements = tracker.with_progress();
    mask_locked_secrets(&mut achievements);

    let find = |id: &str| achievements.iter().find(|entry| entry.definition.id == id).unwrap();
    assert_eq!(find(ids::GHOST_MODE).definition.name, "Ghost Mode");
    assert_eq!(find(ids::PACIFIST_30S).definition.name, SECRET_NAME);
    assert_eq!(find(ids::FIRST_BITE).definition.name, "First Bite");
  }

  #[test]
  fn a_dropped_lease_frees_the_slot() {
    let sessions = Arc::new(DashMap::new());
    sessions.insert("p1".to_string(), 0);
    drop(SessionLease {
      sessions: sessions.clone(),
      player_id: "p1".to_string(),
    });
    assert!(sessions.is_empty());
  }
}
