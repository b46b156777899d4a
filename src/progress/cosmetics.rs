use crate::progress::catalog::ids;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CosmeticRarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Seasonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub from: &'static str,
    pub to: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmeticStyle {
    pub head_gradient: Gradient,
    pub body_gradient: Gradient,
    pub glow: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cosmetic {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: CosmeticRarity,
    pub cost: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_id: Option<&'static str>,
    pub style: CosmeticStyle,
}

pub const DEFAULT_COSMETIC_ID: &str = "default";

const fn style(
    head: (&'static str, &'static str),
    body: (&'static str, &'static str),
    glow: &'static str,
) -> CosmeticStyle {
    CosmeticStyle {
        head_gradient: Gradient { from: head.0, to: head.1 },
        body_gradient: Gradient { from: body.0, to: body.1 },
        glow,
    }
}

const fn shop(
    id: &'static str,
    name: &'static str,
    rarity: CosmeticRarity,
    cost: u32,
    style: CosmeticStyle,
) -> Cosmetic {
    Cosmetic {
        id,
        name,
        rarity,
        cost,
        achievement_id: None,
        style,
    }
}

const fn earned(
    id: &'static str,
    name: &'static str,
    rarity: CosmeticRarity,
    achievement_id: &'static str,
    style: CosmeticStyle,
) -> Cosmetic {
    Cosmetic {
        id,
        name,
        rarity,
        cost: 0,
        achievement_id: Some(achievement_id),
        style,
    }
}

/// The first entry is the fallback appearance.
pub static COSMETICS: &[Cosmetic] = &[
    shop(
        DEFAULT_COSMETIC_ID,
        "Classic Neon",
        CosmeticRarity::Common,
        0,
        style(
            ("#5CFF4D", "#00C700"),
            ("#39FF14", "#00C700"),
            "rgba(57, 255, 20, 0.7)",
        ),
    ),
    shop(
        "bubblegum",
        "Bubblegum",
        CosmeticRarity::Common,
        250,
        style(
            ("#FF69B4", "#FF1493"),
            ("#FFC0CB", "#FF69B4"),
            "rgba(255, 105, 180, 0.7)",
        ),
    ),
    shop(
        "ocean",
        "Ocean Wave",
        CosmeticRarity::Common,
        250,
        style(
            ("#1E90FF", "#0000CD"),
            ("#87CEFA", "#1E90FF"),
            "rgba(30, 144, 255, 0.7)",
        ),
    ),
    shop(
        "ice",
        "Ice Wyrm",
        CosmeticRarity::Rare,
        500,
        style(
            ("#80FFFF", "#00BFFF"),
            ("#B0E0E6", "#87CEEB"),
            "rgba(128, 255, 255, 0.7)",
        ),
    ),
    shop(
        "fire",
        "Inferno Serpent",
        CosmeticRarity::Rare,
        500,
        style(
            ("#FFD700", "#FF4500"),
            ("#FFA500", "#FF6347"),
            "rgba(255, 100, 0, 0.7)",
        ),
    ),
    shop(
        "forest",
        "Forest Spirit",
        CosmeticRarity::Rare,
        750,
        style(
            ("#ADFF2F", "#32CD32"),
            ("#90EE90", "#228B22"),
            "rgba(50, 205, 50, 0.7)",
        ),
    ),
    shop(
        "synthwave",
        "Synthwave Sunset",
        CosmeticRarity::Epic,
        1000,
        style(
            ("#FF00FF", "#FF007F"),
            ("#FF00FF", "#9F00FF"),
            "rgba(255, 0, 255, 0.7)",
        ),
    ),
    shop(
        "ghost",
        "Phantom",
        CosmeticRarity::Epic,
        2000,
        style(
            ("rgba(230, 230, 250, 0.9)", "rgba(176, 196, 222, 0.8)"),
            ("rgba(240, 248, 255, 0.7)", "rgba(211, 211, 211, 0.6)"),
            "rgba(255, 255, 255, 0.5)",
        ),
    ),
    earned(
        "hard-god-skin",
        "God of the Grid",
        CosmeticRarity::Epic,
        ids::HARD_GOD,
        style(
            ("#C0C0C0", "#A9A9A9"),
            ("#FFFFFF", "#D3D3D3"),
            "rgba(255, 255, 255, 0.8)",
        ),
    ),
    earned(
        "perfect-game-skin",
        "Perfect Run",
        CosmeticRarity::Epic,
        ids::PERFECT_GAME_HARD,
        style(
            ("#00FFFF", "#1E90FF"),
            ("#AFEEEE", "#87CEEB"),
            "rgba(0, 255, 255, 0.8)",
        ),
    ),
    shop(
        "gold",
        "Golden Viper",
        CosmeticRarity::Legendary,
        5000,
        style(
            ("#FFD700", "#F0E68C"),
            ("#FFFF00", "#FFD700"),
            "rgba(255, 215, 0, 0.7)",
        ),
    ),
    earned(
        "ouroboros",
        "Ouroboros",
        CosmeticRarity::Legendary,
        ids::ULTRA_SNAKE,
        style(
            ("#FF00FF", "#00FFFF"),
            ("#00FFFF", "#FF00FF"),
            "rgba(255, 255, 255, 1)",
        ),
    ),
    shop(
        "pumpkin",
        "Jack-O-Serpent",
        CosmeticRarity::Seasonal,
        800,
        style(
            ("#FFA500", "#FF8C00"),
            ("#FFD700", "#FFA500"),
            "rgba(255, 165, 0, 0.7)",
        ),
    ),
    shop(
        "candy-cane",
        "Candy Cane",
        CosmeticRarity::Seasonal,
        800,
        style(
            ("#FFFFFF", "#FF0000"),
            ("#FF0000", "#FFFFFF"),
            "rgba(255, 0, 0, 0.7)",
        ),
    ),
];

pub fn find(id: &str) -> Option<&'static Cosmetic> {
    COSMETICS.iter().find(|cosmetic| cosmetic.id == id)
}

pub fn default_cosmetic() -> &'static Cosmetic {
    &COSMETICS[0]
}

/// Render style for an equipped cosmetic, falling back to the default look.
pub fn style_for(id: &str) -> CosmeticStyle {
    find(id).unwrap_or_else(default_cosmetic).style
}

/// Cosmetics whose gating achievement is in `unlocked` and which the player does not own yet.
pub fn newly_earned<'a, I>(unlocked: I, owned: &[String]) -> Vec<&'static Cosmetic>
where
    I: IntoIterator<Item = &'a str>,
{
    let unlocked: Vec<&str> = unlocked.into_iter().collect();
    COSMETICS
        .iter()
        .filter(|cosmetic| {
            cosmetic
                .achievement_id
                .is_some_and(|achievement| unlocked.contains(&achievement))
        })
        .filter(|cosmetic| !owned.iter().any(|id| id == cosmetic.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::catalog;

    #[test]
    fn unknown_cosmetic_falls_back_to_default_style() {
        assert_eq!(style_for("no-such-skin"), default_cosmetic().style);
        assert_eq!(style_for("ocean").glow, "rgba(30, 144, 255, 0.7)");
    }

    #[test]
    fn gating_achievements_exist_in_the_catalog() {
        for cosmetic in COSMETICS {
            if let Some(id) = cosmetic.achievement_id {
                assert!(catalog::find(id).is_some(), "{} gated on unknown {id}", cosmetic.id);
                assert_eq!(cosmetic.cost, 0);
            }
        }
    }

    #[test]
    fn earned_cosmetics_skip_owned_ones() {
        let owned = vec!["hard-god-skin".to_string()];
        let earned = newly_earned([ids::HARD_GOD, ids::ULTRA_SNAKE, ids::FIRST_BITE], &owned);
        let earned_ids: Vec<&str> = earned.iter().map(|cosmetic| cosmetic.id).collect();
        assert_eq!(earned_ids, vec!["ouroboros"]);
    }
}
