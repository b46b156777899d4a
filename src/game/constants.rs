pub const GRID_SIZE: i32 = 20;
pub const INITIAL_HEAD_X: i32 = 10;
pub const INITIAL_HEAD_Y: i32 = 10;
pub const SCORE_INCREMENT: u32 = 5;
pub const SPEED_UP_SCORE_INTERVAL: u32 = 25;
pub const POINTS_PER_LEVEL: u32 = 50;
pub const SPEED_MULTIPLIER_STEP: f64 = 0.1;
pub const FOOD_MOVE_INTERVAL_MS: i64 = 250;
pub const OBSTACLE_WALL_COUNT: usize = 4;
pub const MIN_WALL_LENGTH: usize = 4;
pub const MAX_WALL_LENGTH: usize = 7;
pub const MAX_OBSTACLE_ATTEMPTS: usize = 100;
pub const SPAWN_EXCLUSION_RADIUS: i32 = 5;
pub const FOOD_SPAWN_RANDOM_ATTEMPTS: usize = 64;
pub const RAT_TRICK_WINDOW_MS: i64 = 3_000;
pub const CLEAN_SWEEP_WINDOW_MS: i64 = 2_000;
pub const MOMENTUM_WINDOW_MS: i64 = 10_000;
pub const EAT_VIBRATE_MS: u32 = 50;
pub const GAME_OVER_VIBRATE_MS: u32 = 200;
pub const TURN_VIBRATE_MS: u32 = 20;
pub const MIDNIGHT_WINDOW_END_HOUR: u32 = 3;
