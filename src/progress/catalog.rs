use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    /// Highest value ever observed.
    Max,
    /// Lifetime counter, persisted with an atomic increment.
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AchievementCategory {
    Core,
    Grind,
    Score,
    Length,
    Difficulty,
    Skill,
    Endurance,
    Meta,
    Ultimate,
}

use AchievementCategory::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub target: f64,
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub is_secret: bool,
}

impl AchievementDefinition {
    const fn secret(self) -> Self {
        Self {
            is_secret: true,
            ..self
        }
    }
}

const fn peak(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    target: f64,
) -> AchievementDefinition {
    AchievementDefinition {
        id,
        name,
        description,
        category,
        target,
        kind: ProgressKind::Max,
        is_secret: false,
    }
}

const fn cumulative(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    target: f64,
) -> AchievementDefinition {
    AchievementDefinition {
        kind: ProgressKind::Cumulative,
        ..peak(id, name, description, category, target)
    }
}

pub mod ids {
    pub const FIRST_BITE: &str = "first-bite";
    pub const FIRST_GAME: &str = "first-game";
    pub const DOUBLE_DIGITS: &str = "double-digits";
    pub const FULL_SCREEN: &str = "full-screen";
    pub const PLAY_10: &str = "play-10";
    pub const PLAY_50: &str = "play-50";
    pub const PLAY_100: &str = "play-100";
    pub const PLAY_250: &str = "play-250";
    pub const PLAY_500: &str = "play-500";
    pub const EAT_50: &str = "eat-50";
    pub const EAT_250: &str = "eat-250";
    pub const EAT_1000: &str = "eat-1000";
    pub const TOTAL_SCORE_1K: &str = "total-score-1k";
    pub const TOTAL_SCORE_10K: &str = "total-score-10k";
    pub const TOTAL_SCORE_50K: &str = "total-score-50k";
    pub const LONG_SNAKE: &str = "long-snake";
    pub const VERY_LONG_SNAKE: &str = "very-long-snake";
    pub const MEGA_SNAKE: &str = "mega-snake";
    pub const ULTRA_SNAKE: &str = "ultra-snake";
    pub const SCORE_100: &str = "score-100";
    pub const SCORE_200: &str = "score-200";
    pub const SCORE_300: &str = "score-300";
    pub const SCORE_400: &str = "score-400";
    pub const SCORE_500: &str = "score-500";
    pub const SCORE_750: &str = "score-750";
    pub const SCORE_1000: &str = "score-1000";
    pub const EASY_VICTORY: &str = "easy-victory";
    pub const EASY_MASTERY: &str = "easy-mastery";
    pub const MEDIUM_MASTER: &str = "medium-master";
    pub const MEDIUM_LEGEND: &str = "medium-legend";
    pub const HARD_LEGEND: &str = "hard-legend";
    pub const HARD_GOD: &str = "hard-god";
    pub const PERFECT_GAME_HARD: &str = "perfect-game-hard";
    pub const NO_BUMPS_ALLOWED: &str = "no-bumps-allowed";
    pub const MASTER_OF_MOMENTUM: &str = "master-of-momentum";
    pub const CLEAN_SWEEP: &str = "clean-sweep";
    pub const GHOST_MODE: &str = "ghost-mode";
    pub const OBSTACLE_PRO: &str = "obstacle-pro";
    pub const SERPENT_SURGEON: &str = "serpent-surgeon";
    pub const ULTRA_INSTINCT: &str = "ultra-instinct";
    pub const SNAKE_ARCHITECT: &str = "snake-architect";
    pub const MARATHON_RUNNER: &str = "marathon-runner";
    pub const SWEATY_GAMER_MODE: &str = "sweaty-gamer-mode";
    pub const SPEED_DEMON_MAX: &str = "speed-demon-max";
    pub const SURVIVAL_2_MIN: &str = "survival-2-min";
    pub const SURVIVAL_5_MIN: &str = "survival-5-min";
    pub const TOTAL_TILES_1K: &str = "total-tiles-1k";
    pub const TOTAL_TILES_10K: &str = "total-tiles-10k";
    pub const TOTAL_TILES_100K: &str = "total-tiles-100k";
    pub const HUGGING_THE_WALL: &str = "hugging-the-wall";
    pub const PACIFIST_30S: &str = "pacifist-30s";
    pub const NO_LEFT_TURN: &str = "no-left-turn";
    pub const ONLY_UP_DOWN: &str = "only-up-down";
    pub const ONLY_LEFT_RIGHT: &str = "only-left-right";
    pub const SPEED_TIER_3: &str = "speed-tier-3";
    pub const SPEED_TIER_4: &str = "speed-tier-4";
    pub const NO_FOOD_FOR_1_MIN: &str = "no-food-for-1-min";
    pub const TOTAL_TIME_1HR: &str = "total-time-1hr";
    pub const TOTAL_TIME_5HR: &str = "total-time-5hr";
    pub const TOTAL_TIME_10HR: &str = "total-time-10hr";
    pub const PERFECT_CORNERS: &str = "perfect-corners";
    pub const NO_DOWN_TURN: &str = "no-down-turn";
    pub const RAT_TRICK: &str = "rat-trick";
    pub const PLAY_AT_MIDNIGHT: &str = "play-at-midnight";
    pub const PLAY_ON_WEEKEND: &str = "play-on-weekend";
    pub const FIRST_DEATH_BY_WALL: &str = "first-death-by-wall";
    pub const FIRST_DEATH_BY_SELF: &str = "first-death-by-self";
    pub const FIRST_DEATH_BY_OBSTACLE: &str = "first-death-by-obstacle";
    pub const TEN_DEATHS: &str = "ten-deaths";
    pub const HUNDRED_DEATHS: &str = "hundred-deaths";
}

pub static ACHIEVEMENTS: &[AchievementDefinition] = &[
    cumulative(
        ids::FIRST_BITE,
        "First Bite",
        "Eat your first cyber-rat.",
        Core,
        1.0,
    ),
    cumulative(
        ids::FIRST_GAME,
        "Welcome to the Grid",
        "Complete your first game.",
        Core,
        1.0,
    ),
    peak(
        ids::DOUBLE_DIGITS,
        "Double Digits",
        "Reach a snake length of 10.",
        Core,
        10.0,
    ),
    cumulative(
        ids::FULL_SCREEN,
        "Full Immersion",
        "Play a game in full-screen mode.",
        Core,
        1.0,
    ),
    cumulative(
        ids::PLAY_10,
        "Snake Enthusiast",
        "Play 10 games.",
        Grind,
        10.0,
    ),
    cumulative(
        ids::PLAY_50,
        "Grid Veteran",
        "Play 50 games.",
        Grind,
        50.0,
    ),
    cumulative(
        ids::PLAY_100,
        "Arcade Regular",
        "Play 100 games.",
        Grind,
        100.0,
    ),
    cumulative(
        ids::PLAY_250,
        "This Game Is My Personality",
        "Play 250 games.",
        Grind,
        250.0,
    ),
    cumulative(
        ids::PLAY_500,
        "Part of the Machine",
        "Play 500 games.",
        Grind,
        500.0,
    ),
    cumulative(
        ids::EAT_50,
        "Rat Exterminator",
        "Eat 50 total cyber-rats.",
        Grind,
        50.0,
    ),
    cumulative(
        ids::EAT_250,
        "Gourmand",
        "Eat 250 total cyber-rats.",
        Grind,
        250.0,
    ),
    cumulative(
        ids::EAT_1000,
        "Gluttonous Beast",
        "Eat 1,000 total cyber-rats.",
        Grind,
        1000.0,
    ),
    cumulative(
        ids::TOTAL_SCORE_1K,
        "Point Collector",
        "Reach a cumulative score of 1,000.",
        Grind,
        1000.0,
    ),
    cumulative(
        ids::TOTAL_SCORE_10K,
        "Score Farmer",
        "Reach a cumulative score of 10,000.",
        Grind,
        10000.0,
    ),
    cumulative(
        ids::TOTAL_SCORE_50K,
        "High-Score Hoarder",
        "Reach a cumulative score of 50,000.",
        Grind,
        50000.0,
    ),
    peak(
        ids::LONG_SNAKE,
        "So Long!",
        "Grow your snake to a length of 20.",
        Length,
        20.0,
    ),
    peak(
        ids::VERY_LONG_SNAKE,
        "Long Boi",
        "Grow your snake to a length of 30.",
        Length,
        30.0,
    ),
    peak(
        ids::MEGA_SNAKE,
        "Mega Snake",
        "Grow your snake to a length of 40.",
        Length,
        40.0,
    ),
    peak(
        ids::ULTRA_SNAKE,
        "Ouroboros",
        "Grow your snake to a length of 50. You are a legend.",
        Length,
        50.0,
    ),
    peak(
        ids::SCORE_100,
        "Centurion",
        "Score 100 points in a single game.",
        Score,
        100.0,
    ),
    peak(
        ids::SCORE_200,
        "Double Century",
        "Score 200 points in a single game.",
        Score,
        200.0,
    ),
    peak(
        ids::SCORE_300,
        "Triple Threat",
        "Score 300 points in a single game.",
        Score,
        300.0,
    ),
    peak(
        ids::SCORE_400,
        "Quad Damage",
        "Score 400 points in a single game.",
        Score,
        400.0,
    ),
    peak(
        ids::SCORE_500,
        "High-Score Hero",
        "Score 500 points in a single game.",
        Score,
        500.0,
    ),
    peak(
        ids::SCORE_750,
        "Unstoppable",
        "Score 750 points in a single game.",
        Score,
        750.0,
    ),
    peak(
        ids::SCORE_1000,
        "Perfection",
        "Score 1,000 points in a single game.",
        Score,
        1000.0,
    ),
    peak(
        ids::EASY_VICTORY,
        "Easy Peasy",
        "Score over 150 on Easy.",
        Difficulty,
        150.0,
    ),
    peak(
        ids::EASY_MASTERY,
        "Easy Mode Perfected",
        "Score over 300 on Easy.",
        Difficulty,
        300.0,
    ),
    peak(
        ids::MEDIUM_MASTER,
        "Skilled Serpent",
        "Score over 200 on Medium.",
        Difficulty,
        200.0,
    ),
    peak(
        ids::MEDIUM_LEGEND,
        "Medium Mode Legend",
        "Score over 400 on Medium.",
        Difficulty,
        400.0,
    ),
    peak(
        ids::HARD_LEGEND,
        "Neon Legend",
        "Score over 150 on Hard.",
        Difficulty,
        150.0,
    ),
    peak(
        ids::HARD_GOD,
        "Hard Mode God",
        "Score over 300 on Hard.",
        Difficulty,
        300.0,
    ),
    peak(
        ids::PERFECT_GAME_HARD,
        "Deity",
        "Score over 500 points on Hard mode.",
        Ultimate,
        500.0,
    )
    .secret(),
    peak(
        ids::NO_BUMPS_ALLOWED,
        "Wall Avoider",
        "Survive 60 seconds without hitting a wall.",
        Skill,
        60.0,
    ),
    peak(
        ids::MASTER_OF_MOMENTUM,
        "Master of Momentum",
        "Eat 3 food items in under 10 seconds.",
        Skill,
        3.0,
    ),
    cumulative(
        ids::CLEAN_SWEEP,
        "Clean Sweep",
        "Eat food within 2 seconds of it spawning (Medium or Hard).",
        Skill,
        1.0,
    ),
    peak(
        ids::GHOST_MODE,
        "Ghost Mode",
        "Avoid the moving food for 20 seconds on Medium or Hard.",
        Skill,
        20.0,
    )
    .secret(),
    peak(
        ids::OBSTACLE_PRO,
        "Obstacle Pro",
        "Score over 200 on Hard difficulty.",
        Difficulty,
        200.0,
    ),
    cumulative(
        ids::SERPENT_SURGEON,
        "Serpent Surgeon",
        "Navigate through a 1-tile gap without crashing.",
        Skill,
        1.0,
    )
    .secret(),
    peak(
        ids::ULTRA_INSTINCT,
        "Right is Wrong",
        "Score 50 points without ever turning right.",
        Skill,
        50.0,
    )
    .secret(),
    peak(
        ids::SNAKE_ARCHITECT,
        "Snake Architect",
        "Survive for 4 minutes in one session.",
        Endurance,
        240.0,
    ),
    peak(
        ids::MARATHON_RUNNER,
        "Marathon Runner",
        "Survive for 6 minutes in one session.",
        Endurance,
        360.0,
    ),
    peak(
        ids::SWEATY_GAMER_MODE,
        "Sweaty Gamer Mode",
        "Reach Speed Tier 5.",
        Ultimate,
        5.0,
    ),
    peak(
        ids::SPEED_DEMON_MAX,
        "Maximum Overdrive",
        "Reach the maximum speed on Hard mode.",
        Ultimate,
        1.0,
    ),
    peak(
        ids::SURVIVAL_2_MIN,
        "Survivor",
        "Survive for 2 minutes in a single game.",
        Endurance,
        120.0,
    ),
    peak(
        ids::SURVIVAL_5_MIN,
        "Endurance Runner",
        "Survive for 5 minutes in a single game.",
        Endurance,
        300.0,
    ),
    cumulative(
        ids::TOTAL_TILES_1K,
        "Wanderer",
        "Travel 1,000 tiles in total.",
        Grind,
        1000.0,
    ),
    cumulative(
        ids::TOTAL_TILES_10K,
        "Explorer Extraordinaire",
        "Travel 10,000 tiles in total.",
        Grind,
        10000.0,
    ),
    cumulative(
        ids::TOTAL_TILES_100K,
        "Globetrotter",
        "Travel 100,000 tiles in total.",
        Grind,
        100000.0,
    ),
    peak(
        ids::HUGGING_THE_WALL,
        "Wall Hugger",
        "Spend 30 seconds moving along the outer walls.",
        Skill,
        30.0,
    ),
    peak(
        ids::PACIFIST_30S,
        "Pacifist",
        "Survive for 30 seconds without eating any food.",
        Skill,
        30.0,
    )
    .secret(),
    peak(
        ids::NO_LEFT_TURN,
        "Zoolander",
        "Score 50 points without turning left.",
        Skill,
        50.0,
    )
    .secret(),
    peak(
        ids::ONLY_UP_DOWN,
        "Vertical Limit",
        "Score 30 points using only up and down controls.",
        Skill,
        30.0,
    )
    .secret(),
    peak(
        ids::ONLY_LEFT_RIGHT,
        "Horizontal Line",
        "Score 30 points using only left and right controls.",
        Skill,
        30.0,
    )
    .secret(),
    peak(
        ids::SPEED_TIER_3,
        "Need for Speed",
        "Reach Speed Tier 3.",
        Skill,
        3.0,
    ),
    peak(
        ids::SPEED_TIER_4,
        "Ludicrous Speed",
        "Reach Speed Tier 4.",
        Skill,
        4.0,
    ),
    peak(
        ids::NO_FOOD_FOR_1_MIN,
        "Fasting",
        "Survive for 1 minute without eating food.",
        Endurance,
        60.0,
    )
    .secret(),
    cumulative(
        ids::TOTAL_TIME_1HR,
        "Time Sink",
        "Play for a total of 1 hour.",
        Grind,
        3600.0,
    ),
    cumulative(
        ids::TOTAL_TIME_5HR,
        "Time Bender",
        "Play for a total of 5 hours.",
        Grind,
        18000.0,
    ),
    cumulative(
        ids::TOTAL_TIME_10HR,
        "Time Lord",
        "Play for a total of 10 hours.",
        Grind,
        36000.0,
    ),
    peak(
        ids::PERFECT_CORNERS,
        "Corner Master",
        "Visit all four corners of the map in a single game.",
        Skill,
        1.0,
    ),
    peak(
        ids::NO_DOWN_TURN,
        "Only Up",
        "Score 50 points without ever turning down.",
        Skill,
        50.0,
    )
    .secret(),
    peak(
        ids::RAT_TRICK,
        "Rat Trick",
        "Eat 3 rats in 3 seconds.",
        Skill,
        3.0,
    ),
    cumulative(
        ids::PLAY_AT_MIDNIGHT,
        "Night Owl",
        "Play a game between midnight and 3 AM.",
        Meta,
        1.0,
    )
    .secret(),
    cumulative(
        ids::PLAY_ON_WEEKEND,
        "Weekend Warrior",
        "Play 10 games during a single weekend.",
        Meta,
        10.0,
    ),
    cumulative(
        ids::FIRST_DEATH_BY_WALL,
        "First Contact",
        "Die by hitting a wall for the first time.",
        Core,
        1.0,
    ),
    cumulative(
        ids::FIRST_DEATH_BY_SELF,
        "Self-Destruct",
        "Die by running into yourself for the first time.",
        Core,
        1.0,
    ),
    cumulative(
        ids::FIRST_DEATH_BY_OBSTACLE,
        "Calculated Risk",
        "Die by hitting an obstacle on Hard mode.",
        Core,
        1.0,
    ),
    cumulative(
        ids::TEN_DEATHS,
        "Learning the Ropes",
        "Die 10 times.",
        Grind,
        10.0,
    ),
    cumulative(
        ids::HUNDRED_DEATHS,
        "Master of Failure",
        "Die 100 times. You are persistent!",
        Grind,
        100.0,
    )
    .secret(),
];

fn index() -> &'static HashMap<&'static str, &'static AchievementDefinition> {
    static INDEX: OnceLock<HashMap<&'static str, &'static AchievementDefinition>> = OnceLock::new();
    INDEX.get_or_init(|| ACHIEVEMENTS.iter().map(|def| (def.id, def)).collect())
}

pub fn find(id: &str) -> Option<&'static AchievementDefinition> {
    index().get(id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let unique: HashSet<&str> = ACHIEVEMENTS.iter().map(|def| def.id).collect();
        assert_eq!(unique.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn every_target_is_positive() {
        assert!(ACHIEVEMENTS.iter().all(|def| def.target > 0.0));
    }

    #[test]
    fn lookup_resolves_known_and_rejects_unknown_ids() {
        let def = find(ids::RAT_TRICK).unwrap();
        assert_eq!(def.kind, ProgressKind::Max);
        assert_eq!(def.target, 3.0);
        assert_eq!(find(ids::EAT_50).unwrap().kind, ProgressKind::Cumulative);
        assert!(find("does-not-exist").is_none());
    }

    #[test]
    fn lifetime_counters_are_cumulative() {
        for id in [ids::FIRST_GAME, ids::PLAY_500, ids::TOTAL_TIME_1HR, ids::HUNDRED_DEATHS] {
            assert_eq!(find(id).unwrap().kind, ProgressKind::Cumulative, "{id}");
        }
        for id in [ids::LONG_SNAKE, ids::SURVIVAL_2_MIN, ids::SPEED_TIER_4] {
            assert_eq!(find(id).unwrap().kind, ProgressKind::Max, "{id}");
        }
    }
}
