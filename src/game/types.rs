use crate::game::constants::{GRID_SIZE, INITIAL_HEAD_X, INITIAL_HEAD_Y};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
  pub x: i32,
  pub y: i32,
}

impl Point {
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  pub fn step(self, direction: Direction) -> Self {
    let (dx, dy) = direction.delta();
    Self::new(self.x + dx, self.y + dy)
  }

  pub fn in_bounds(self) -> bool {
    (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
  }

  pub fn on_border(self) -> bool {
    self.x == 0 || self.y == 0 || self.x == GRID_SIZE - 1 || self.y == GRID_SIZE - 1
  }

  pub fn manhattan(self, other: Point) -> i32 {
    (self.x - other.x).abs() + (self.y - other.y).abs()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl Direction {
  pub const ALL: [Direction; 4] =
    [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

  pub fn opposite(self) -> Self {
    match self {
      Direction::Up => Direction::Down,
      Direction::Down => Direction::Up,
      Direction::Left => Direction::Right,
      Direction::Right => Direction::Left,
    }
  }

  /// Screen coordinates: y grows downward.
  pub fn delta(self) -> (i32, i32) {
    match self {
      Direction::Up => (0, -1),
      Direction::Down => (0, 1),
      Direction::Left => (-1, 0),
      Direction::Right => (1, 0),
    }
  }

  pub(crate) fn index(self) -> usize {
    match self {
      Direction::Up => 0,
      Direction::Down => 1,
      Direction::Left => 2,
      Direction::Right => 3,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
  Idle,
  Running,
  Paused,
  GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeathCause {
  Wall,
  Obstacle,
  #[serde(rename = "self")]
  SelfCollision,
}

impl DeathCause {
  pub fn as_str(self) -> &'static str {
    match self {
      DeathCause::Wall => "wall",
      DeathCause::Obstacle => "obstacle",
      DeathCause::SelfCollision => "self",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  #[default]
  Easy,
  Medium,
  Hard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultySettings {
  pub base_speed_ms: f64,
  pub food_moves: bool,
  pub has_obstacles: bool,
  pub speed_decay: f64,
  pub max_level: u32,
}

impl Difficulty {
  pub fn settings(self) -> DifficultySettings {
    match self {
      Difficulty::Easy => DifficultySettings {
        base_speed_ms: 200.0,
        food_moves: false,
        has_obstacles: false,
        speed_decay: 0.95,
        max_level: 5,
      },
      Difficulty::Medium => DifficultySettings {
        base_speed_ms: 150.0,
        food_moves: true,
        has_obstacles: false,
        speed_decay: 0.9,
        max_level: 10,
      },
      Difficulty::Hard => DifficultySettings {
        base_speed_ms: 100.0,
        food_moves: true,
        has_obstacles: true,
        speed_decay: 0.9,
        max_level: 15,
      },
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "easy" => Some(Difficulty::Easy),
      "medium" => Some(Difficulty::Medium),
      "hard" => Some(Difficulty::Hard),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

#[derive(Debug, Clone)]
pub struct GameState {
  pub snake: VecDeque<Point>,
  pub food: Point,
  pub food_direction: Direction,
  pub direction: Direction,
  pub next_direction: Direction,
  pub speed: f64,
  pub obstacles: HashSet<Point>,
}

impl GameState {
  pub fn head(&self) -> Point {
    // The snake is never empty once constructed.
    self.snake.front().copied().unwrap_or(Point::new(INITIAL_HEAD_X, INITIAL_HEAD_Y))
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
  pub status: GameStatus,
  pub score: u32,
  pub level: u32,
  #[serde(rename = "currencyEarned")]
  pub currency_earned: u32,
  #[serde(rename = "speedMultiplier")]
  pub speed_multiplier: f64,
  #[serde(rename = "speedMs")]
  pub speed_ms: f64,
  pub direction: Direction,
  pub snake: Vec<Point>,
  pub food: Point,
  pub obstacles: Vec<Point>,
  #[serde(rename = "deathCause", skip_serializing_if = "Option::is_none")]
  pub death_cause: Option<DeathCause>,
}
