use crate::game::feedback::SoundKind;
use crate::game::types::{Difficulty, Direction, GameSnapshot};
use crate::progress::cosmetics::CosmeticStyle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
  Start,
  Direction { direction: Direction },
  TogglePause,
  ToggleFullscreen,
  Restart,
  RetrySync,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
  Init {
    #[serde(rename = "playerId")]
    player_id: String,
    difficulty: Difficulty,
    #[serde(rename = "gridSize")]
    grid_size: i32,
    appearance: CosmeticStyle,
  },
  State {
    snapshot: GameSnapshot,
  },
  Feedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<SoundKind>,
    #[serde(rename = "vibrateMs", skip_serializing_if = "Option::is_none")]
    vibrate_ms: Option<u32>,
  },
  AudioReady,
  RunSaved {
    score: u32,
    #[serde(rename = "currencyEarned")]
    currency_earned: u32,
    #[serde(rename = "leaguePointsEarned")]
    league_points_earned: u32,
    #[serde(rename = "newlyUnlocked")]
    newly_unlocked: Vec<String>,
  },
  SyncFailed {
    error: String,
  },
  AchievementUnlocked {
    id: String,
    name: String,
  },
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
  match serde_json::from_str(text) {
    Ok(message) => Some(message),
    Err(err) => {
      tracing::debug!(%err, "ignoring malformed client message");
      None
    }
  }
}

pub fn encode_server_message(message: &ServerMessage) -> Option<String> {
  serde_json::to_string(message).ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{json, Value};

  #[test]
  fn decodes_direction_and_bare_commands() {
    assert_eq!(
      decode_client_message(r#"{"type":"direction","direction":"UP"}"#),
      Some(ClientMessage::Direction { direction: Direction::Up })
    );
    assert_eq!(
      decode_client_message(r#"{"type":"togglePause"}"#),
      Some(ClientMessage::TogglePause)
    );
    assert_eq!(decode_client_message(r#"{"type":"retrySync"}"#), Some(ClientMessage::RetrySync));
  }

  #[test]
  fn rejects_unknown_or_malformed_input() {
    assert_eq!(decode_client_message(r#"{"type":"teleport"}"#), None);
    assert_eq!(decode_client_message(r#"{"type":"direction","direction":"NORTH"}"#), None);
    assert_eq!(decode_client_message("not json"), None);
  }

  #[test]
  fn server_messages_use_camel_case_tags_and_fields() {
    let saved = encode_server_message(&ServerMessage::RunSaved {
      score: 35,
      currency_earned: 7,
      league_points_earned: 3,
      newly_unlocked: vec!["first-bite".to_string()],
    })
    .unwrap();
    let value: Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value, json!({
        "type": "runSaved",
        "score": 35,
        "currencyEarned": 7,
        "leaguePointsEarned": 3,
        "newlyUnlocked": ["first-bite"]
      }));

    let feedback = encode_server_message(&ServerMessage::Feedback {
      sound: None,
      vibrate_ms: Some(20),
    })
    .unwrap();
    let value: Value = serde_json::from_str(&feedback).unwrap();
    assert_eq!(value, json!({"type": "feedback", "vibrateMs": 20}));
  }
}
