use uuid::Uuid;

pub const MAX_PLAYER_NAME_LENGTH: usize = 20;
pub const FALLBACK_PLAYER_NAME: &str = "Player";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub player_id: String,
    pub username: String,
}

impl PlayerProfile {
    /// Accepts the id only when it is a UUID, otherwise mints a fresh one.
    pub fn from_request(player: Option<&str>, name: Option<&str>) -> Self {
        let player_id = player
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .unwrap_or_else(Uuid::new_v4)
            .to_string();
        Self {
            player_id,
            username: sanitize_player_name(name.unwrap_or_default()),
        }
    }
}

pub fn sanitize_player_name(name: &str) -> String {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return FALLBACK_PLAYER_NAME.to_string();
    }
    cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}
