use crate::app::time::{seconds_between, LocalClock};
use crate::game::constants::*;
use crate::game::feedback::Feedback;
use crate::game::food::{drift_food, spawn_food};
use crate::game::obstacles::generate_obstacles;
use crate::game::types::{
  DeathCause, Difficulty, DifficultySettings, Direction, GameSnapshot, GameState, GameStatus, Point,
};
use crate::progress::catalog::ids;
use crate::progress::error::SyncError;
use crate::progress::sync::{
  FlushReport, ProgressSync, RewardRates, RunStatistics, UnlockNotification,
};
use crate::progress::tracker::AchievementTracker;
use crate::shared::player::PlayerProfile;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use tokio::sync::mpsc;

const PLAY_FAMILY: [&str; 6] = [
  ids::FIRST_GAME,
  ids::PLAY_10,
  ids::PLAY_50,
  ids::PLAY_100,
  ids::PLAY_250,
  ids::PLAY_500,
];
const EAT_FAMILY: [&str; 4] = [ids::FIRST_BITE, ids::EAT_50, ids::EAT_250, ids::EAT_1000];
const SCORE_FAMILY: [&str; 7] = [
  ids::SCORE_100,
  ids::SCORE_200,
  ids::SCORE_300,
  ids::SCORE_400,
  ids::SCORE_500,
  ids::SCORE_750,
  ids::SCORE_1000,
];
const LENGTH_FAMILY: [&str; 5] = [
  ids::DOUBLE_DIGITS,
  ids::LONG_SNAKE,
  ids::VERY_LONG_SNAKE,
  ids::MEGA_SNAKE,
  ids::ULTRA_SNAKE,
];
const SURVIVAL_FAMILY: [&str; 4] = [
  ids::SURVIVAL_2_MIN,
  ids::SURVIVAL_5_MIN,
  ids::SNAKE_ARCHITECT,
  ids::MARATHON_RUNNER,
];
const SPEED_TIER_FAMILY: [&str; 3] = [ids::SPEED_TIER_3, ids::SPEED_TIER_4, ids::SWEATY_GAMER_MODE];
const DEATH_FAMILY: [&str; 2] = [ids::TEN_DEATHS, ids::HUNDRED_DEATHS];
const TOTAL_SCORE_FAMILY: [&str; 3] =
  [ids::TOTAL_SCORE_1K, ids::TOTAL_SCORE_10K, ids::TOTAL_SCORE_50K];
const TOTAL_TILES_FAMILY: [&str; 3] =
  [ids::TOTAL_TILES_1K, ids::TOTAL_TILES_10K, ids::TOTAL_TILES_100K];
const TOTAL_TIME_FAMILY: [&str; 3] =
  [ids::TOTAL_TIME_1HR, ids::TOTAL_TIME_5HR, ids::TOTAL_TIME_10HR];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOutcome {
  pub ticked: bool,
  pub food_moved: bool,
  pub game_over: Option<DeathCause>,
}

/// Persistence state of the most recent finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSyncState {
  None,
  Saved,
  Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
  pub seed: u64,
  pub clock: LocalClock,
  pub rates: RewardRates,
}

/// Where a finished run is flushed to.
pub struct FlushTarget<'a> {
  pub sync: &'a ProgressSync,
  pub player: &'a PlayerProfile,
  pub notifications: &'a mpsc::UnboundedSender<UnlockNotification>,
}

#[derive(Debug, Default)]
struct RunCounters {
  started_at: i64,
  food_eaten: u32,
  tiles_moved: u64,
  last_meal_at: Option<i64>,
  meal_streak: u32,
  recent_meals: VecDeque<i64>,
  wall_free_since: Option<i64>,
  food_spawned_at: i64,
  food_still_since: i64,
  wall_hug_ms: f64,
  corners_visited: u8,
  turns_issued: [bool; 4],
}

impl RunCounters {
  fn begin(now: i64) -> Self {
    Self {
      started_at: now,
      wall_free_since: Some(now),
      food_spawned_at: now,
      food_still_since: now,
      ..Self::default()
    }
  }

  fn issued(&self, direction: Direction) -> bool {
    self.turns_issued[direction.index()]
  }
}

pub struct GameEngine {
  difficulty: Difficulty,
  settings: DifficultySettings,
  status: GameStatus,
  state: GameState,
  score: u32,
  speed_tier: u32,
  death: Option<DeathCause>,
  tracker: AchievementTracker,
  run: RunCounters,
  rng: StdRng,
  clock: LocalClock,
  rates: RewardRates,
  last_tick_at: i64,
  last_food_move_at: i64,
  fullscreen: bool,
  game_over_handled: bool,
  finished_run: Option<RunStatistics>,
  sync_state: RunSyncState,
  feedback: Vec<Feedback>,
}

fn fresh_state(settings: &DifficultySettings, rng: &mut StdRng) -> GameState {
  let snake = VecDeque::from([Point::new(INITIAL_HEAD_X, INITIAL_HEAD_Y)]);
  let obstacles = generate_obstacles(settings, rng);
  // A one-segment snake never fills the board.
  let food = spawn_food(&snake, &obstacles, rng).unwrap_or(Point::new(0, 0));
  GameState {
    snake,
    food,
    food_direction: Direction::Right,
    direction: Direction::Right,
    next_direction: Direction::Right,
    speed: settings.base_speed_ms,
    obstacles,
  }
}

impl GameEngine {
  pub fn new(
    difficulty: Difficulty,
    tracker: AchievementTracker,
    options: EngineOptions,
    now: i64,
  ) -> Self {
    let settings = difficulty.settings();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let state = fresh_state(&settings, &mut rng);
    Self {
      difficulty,
      settings,
      status: GameStatus::Idle,
      state,
      score: 0,
      speed_tier: 0,
      death: None,
      tracker,
      run: RunCounters::begin(now),
      rng,
      clock: options.clock,
      rates: options.rates,
      last_tick_at: now,
      last_food_move_at: now,
      fullscreen: false,
      game_over_handled: false,
      finished_run: None,
      sync_state: RunSyncState::None,
      feedback: Vec::new(),
    }
  }

  pub fn status(&self) -> GameStatus {
    self.status
  }

  pub fn sync_state(&self) -> RunSyncState {
    self.sync_state
  }

  pub fn level(&self) -> u32 {
    (self.score / POINTS_PER_LEVEL + 1).min(self.settings.max_level)
  }

  pub fn drain_feedback(&mut self) -> Vec<Feedback> {
    std::mem::take(&mut self.feedback)
  }

  // Leaves the board alone: `new` and `restart` lay it out while idle.
  fn reset_run(&mut self, now: i64) {
    self.score = 0;
    self.speed_tier = 0;
    self.death = None;
    self.run = RunCounters::begin(now);
    self.last_tick_at = now;
    self.last_food_move_at = now;
    self.game_over_handled = false;
    self.finished_run = None;
    self.sync_state = RunSyncState::None;
  }

  pub fn start(&mut self, now: i64) -> bool {
    if self.status != GameStatus::Idle {
      return false;
    }
    self.tracker.clear_pending();
    self.reset_run(now);
    self.status = GameStatus::Running;

    for id in PLAY_FAMILY {
      self.tracker.record(id, 1.0, true);
    }
    if self.clock.hour(now) < MIDNIGHT_WINDOW_END_HOUR {
      self.tracker.record(ids::PLAY_AT_MIDNIGHT, 1.0, true);
    }
    if self.clock.is_weekend(now) {
      self.tracker.record(ids::PLAY_ON_WEEKEND, 1.0, true);
    }
    tracing::debug!(difficulty = self.difficulty.as_str(), "run started");
    true
  }

  pub fn change_direction(&mut self, requested: Direction) -> bool {
    if self.status != GameStatus::Running {
      return false;
    }
    self.run.turns_issued[requested.index()] = true;
    if requested == self.state.direction.opposite() {
      return false;
    }
    self.state.next_direction = requested;
    self.feedback.push(Feedback::TURN);
    true
  }

  pub fn pause(&mut self) -> bool {
    if self.status != GameStatus::Running {
      return false;
    }
    self.status = GameStatus::Paused;
    true
  }

  pub fn resume(&mut self, now: i64) -> bool {
    if self.status != GameStatus::Paused {
      return false;
    }
    self.status = GameStatus::Running;
    self.last_tick_at = now;
    self.last_food_move_at = now;
    true
  }

  pub fn toggle_pause(&mut self, now: i64) -> bool {
    match self.status {
      GameStatus::Running => self.pause(),
      GameStatus::Paused => self.resume(now),
      _ => false,
    }
  }

  pub fn restart(&mut self, now: i64) {
    self.state = fresh_state(&self.settings, &mut self.rng);
    self.reset_run(now);
    self.status = GameStatus::Idle;
  }

  /// Returns whether full-screen is now on.
  pub fn toggle_fullscreen(&mut self) -> bool {
    self.fullscreen = !self.fullscreen;
    if self.fullscreen {
      self.tracker.record(ids::FULL_SCREEN, 1.0, true);
    }
    self.fullscreen
  }

  /// Host frame callback. Advances the snake and the food on their own cadences.
  pub fn frame(&mut self, now: i64) -> FrameOutcome {
    let mut outcome = FrameOutcome::default();
    if self.status != GameStatus::Running {
      return outcome;
    }

    if (now - self.last_tick_at) as f64 > self.state.speed {
      self.last_tick_at = now;
      self.tick(now);
      outcome.ticked = true;
      if self.status == GameStatus::GameOver {
        outcome.game_over = self.death;
        return outcome;
      }
    }

    if self.settings.food_moves && now - self.last_food_move_at > FOOD_MOVE_INTERVAL_MS {
      self.last_food_move_at = now;
      outcome.food_moved = self.move_food(now);
    }
    outcome
  }

  fn tick(&mut self, now: i64) {
    self.state.direction = self.state.next_direction;
    self.record_before_move(now);

    let head = self.state.head().step(self.state.direction);
    if let Some(cause) = self.collision_at(head) {
      self.end_run(cause, now);
      return;
    }

    self.state.snake.push_front(head);
    self.run.tiles_moved += 1;
    if head == self.state.food {
      self.eat(now);
    } else {
      self.state.snake.pop_back();
    }
    self.record_after_move(head);
  }

  fn collision_at(&self, head: Point) -> Option<DeathCause> {
    if !head.in_bounds() {
      return Some(DeathCause::Wall);
    }
    if self.state.obstacles.contains(&head) {
      return Some(DeathCause::Obstacle);
    }
    if self.state.snake.iter().skip(1).any(|segment| *segment == head) {
      return Some(DeathCause::SelfCollision);
    }
    None
  }

  fn move_food(&mut self, now: i64) -> bool {
    let moved = drift_food(&mut self.state, &mut self.rng);
    if moved {
      self.run.food_still_since = now;
    }
    moved
  }

  fn end_run(&mut self, cause: DeathCause, now: i64) {
    if cause == DeathCause::Wall {
      self.run.wall_free_since = None;
    }
    self.status = GameStatus::GameOver;
    self.death = Some(cause);
    self.feedback.push(Feedback::GAME_OVER);
    self.finished_run = Some(RunStatistics {
      score: self.score,
      difficulty: self.difficulty,
      food_eaten: self.run.food_eaten,
      tiles_moved: self.run.tiles_moved,
      started_at: self.run.started_at,
      ended_at: now,
    });
    tracing::debug!(
      difficulty = self.difficulty.as_str(),
      cause = cause.as_str(),
      score = self.score,
      "game over"
    );
  }

  fn eat(&mut self, now: i64) {
    self.feedback.push(Feedback::EAT);

    let fresh_food = now - self.run.food_spawned_at <= CLEAN_SWEEP_WINDOW_MS;
    if self.difficulty != Difficulty::Easy && fresh_food {
      self.tracker.record(ids::CLEAN_SWEEP, 1.0, true);
    }

    let streak_alive = self.run.last_meal_at.is_some_and(|at| now - at <= RAT_TRICK_WINDOW_MS);
    self.run.meal_streak = if streak_alive { self.run.meal_streak + 1 } else { 1 };
    self.run.last_meal_at = Some(now);
    self.tracker.record(ids::RAT_TRICK, f64::from(self.run.meal_streak), false);

    self.run.recent_meals.push_back(now);
    while self
      .run
      .recent_meals
      .front()
      .is_some_and(|at| now - at >= MOMENTUM_WINDOW_MS)
    {
      self.run.recent_meals.pop_front();
    }
    self
      .tracker
      .record(ids::MASTER_OF_MOMENTUM, self.run.recent_meals.len() as f64, false);

    self.run.food_eaten += 1;
    for id in EAT_FAMILY {
      self.tracker.record(id, 1.0, true);
    }

    self.score += SCORE_INCREMENT;
    self.record_score_progress();
    self.apply_speed_tier();

    if let Some(food) = spawn_food(&self.state.snake, &self.state.obstacles, &mut self.rng) {
      self.state.food = food;
    }
    self.run.food_spawned_at = now;
    self.run.food_still_since = now;
  }

  fn record_score_progress(&mut self) {
    let score = f64::from(self.score);
    for id in SCORE_FAMILY {
      self.tracker.record(id, score, false);
    }
    let gated: &[&str] = match self.difficulty {
      Difficulty::Easy => &[ids::EASY_VICTORY, ids::EASY_MASTERY],
      Difficulty::Medium => &[ids::MEDIUM_MASTER, ids::MEDIUM_LEGEND],
      Difficulty::Hard => &[
        ids::HARD_LEGEND,
        ids::HARD_GOD,
        ids::OBSTACLE_PRO,
        ids::PERFECT_GAME_HARD,
      ],
    };
    for id in gated {
      self.tracker.record(id, score, false);
    }
  }

  fn apply_speed_tier(&mut self) {
    let tier = self.score / SPEED_UP_SCORE_INTERVAL;
    if tier <= self.speed_tier {
      return;
    }
    for _ in self.speed_tier..tier {
      self.state.speed *= self.settings.speed_decay;
    }
    self.speed_tier = tier;
    for id in SPEED_TIER_FAMILY {
      self.tracker.record(id, f64::from(tier), false);
    }
    if self.difficulty == Difficulty::Hard && self.level() >= self.settings.max_level {
      self.tracker.record(ids::SPEED_DEMON_MAX, 1.0, false);
    }
  }

  fn record_before_move(&mut self, now: i64) {
    let wall_free = self
      .run
      .wall_free_since
      .map(|since| seconds_between(since, now))
      .unwrap_or(0.0);
    self.tracker.record(ids::NO_BUMPS_ALLOWED, wall_free, false);

    let still = seconds_between(self.run.food_still_since, now);
    if self.settings.food_moves {
      self.tracker.record(ids::GHOST_MODE, still, false);
    } else {
      self.tracker.record(ids::PACIFIST_30S, still, false);
    }
    self
      .tracker
      .record(ids::NO_FOOD_FOR_1_MIN, seconds_between(self.run.food_spawned_at, now), false);
  }

  fn record_after_move(&mut self, head: Point) {
    let length = self.state.snake.len() as f64;
    for id in LENGTH_FAMILY {
      self.tracker.record(id, length, false);
    }

    let score = f64::from(self.score);
    let left = self.run.issued(Direction::Left);
    let right = self.run.issued(Direction::Right);
    let up = self.run.issued(Direction::Up);
    let down = self.run.issued(Direction::Down);
    if !right {
      self.tracker.record(ids::ULTRA_INSTINCT, score, false);
    }
    if !left {
      self.tracker.record(ids::NO_LEFT_TURN, score, false);
    }
    if !down {
      self.tracker.record(ids::NO_DOWN_TURN, score, false);
    }
    if !left && !right {
      self.tracker.record(ids::ONLY_UP_DOWN, score, false);
    }
    if !up && !down {
      self.tracker.record(ids::ONLY_LEFT_RIGHT, score, false);
    }

    if self
      .state
      .snake
      .iter()
      .skip(2)
      .any(|segment| head.manhattan(*segment) == 2)
    {
      self.tracker.record(ids::SERPENT_SURGEON, 1.0, true);
    }

    if head.on_border() {
      self.run.wall_hug_ms += self.state.speed;
      self.tracker.record(ids::HUGGING_THE_WALL, self.run.wall_hug_ms / 1000.0, false);
    }

    let last = GRID_SIZE - 1;
    let corner_bit = match (head.x, head.y) {
      (0, 0) => 1,
      (x, 0) if x == last => 2,
      (0, y) if y == last => 4,
      (x, y) if x == last && y == last => 8,
      _ => 0,
    };
    self.run.corners_visited |= corner_bit;
    if self.run.corners_visited == 0b1111 {
      self.tracker.record(ids::PERFECT_CORNERS, 1.0, false);
    }
  }

  fn record_run_end(&mut self, cause: DeathCause, run: &RunStatistics) {
    let survived = seconds_between(run.started_at, run.ended_at);
    for id in SURVIVAL_FAMILY {
      self.tracker.record(id, survived, false);
    }
    let first_death = match cause {
      DeathCause::Wall => ids::FIRST_DEATH_BY_WALL,
      DeathCause::SelfCollision => ids::FIRST_DEATH_BY_SELF,
      DeathCause::Obstacle => ids::FIRST_DEATH_BY_OBSTACLE,
    };
    self.tracker.record(first_death, 1.0, true);
    for id in DEATH_FAMILY {
      self.tracker.record(id, 1.0, true);
    }
    for id in TOTAL_SCORE_FAMILY {
      self.tracker.record(id, f64::from(run.score), true);
    }
    for id in TOTAL_TILES_FAMILY {
      self.tracker.record(id, run.tiles_moved as f64, true);
    }
    for id in TOTAL_TIME_FAMILY {
      self.tracker.record(id, survived, true);
    }
  }

  /// Records end-of-run achievements and flushes them. Runs once per run; later calls
  /// return `None`.
  pub async fn handle_game_over(
    &mut self,
    now: i64,
    target: FlushTarget<'_>,
  ) -> Option<Result<FlushReport, SyncError>> {
    if self.game_over_handled || self.status != GameStatus::GameOver {
      return None;
    }
    let (Some(cause), Some(run)) = (self.death, self.finished_run.clone()) else {
      return None;
    };
    self.game_over_handled = true;
    self.record_run_end(cause, &run);

    let settle = target.sync.settle_delay();
    if !settle.is_zero() {
      tokio::time::sleep(settle).await;
    }
    Some(self.flush_run(&run, now, target).await)
  }

  /// Re-issues the flush for a finished run whose previous attempt failed.
  pub async fn retry_sync(
    &mut self,
    now: i64,
    target: FlushTarget<'_>,
  ) -> Option<Result<FlushReport, SyncError>> {
    if self.status != GameStatus::GameOver || self.sync_state != RunSyncState::Failed {
      return None;
    }
    let run = self.finished_run.clone()?;
    Some(self.flush_run(&run, now, target).await)
  }

  async fn flush_run(
    &mut self,
    run: &RunStatistics,
    now: i64,
    target: FlushTarget<'_>,
  ) -> Result<FlushReport, SyncError> {
    let pending = self.tracker.peek_pending();
    let player_id = target.player.player_id.as_str();
    let report = match target.sync.flush(target.player, run, &pending, target.notifications).await {
      Ok(report) => report,
      Err(err) => {
        tracing::warn!(
          player_id,
          %err,
          stage = %err.stage(),
          buffered = pending.len(),
          "progress flush failed"
        );
        self.sync_state = RunSyncState::Failed;
        return Err(err);
      }
    };

    self.tracker.clear_pending();
    self.sync_state = RunSyncState::Saved;

    match target.sync.reload_progress(player_id).await {
      Ok(records) => self.tracker.replace_persisted(records),
      Err(err) => tracing::warn!(player_id, %err, "failed to refresh achievement progress"),
    }
    let unlocked: Vec<String> = self
      .tracker
      .unlocked_ids()
      .into_iter()
      .map(str::to_string)
      .collect();
    match target
      .sync
      .grant_earned_cosmetics(player_id, unlocked.iter().map(String::as_str), now)
      .await
    {
      Ok(granted) if !granted.is_empty() => {
        tracing::info!(player_id, ?granted, "cosmetics unlocked");
      }
      Ok(_) => {}
      Err(err) => tracing::warn!(player_id, %err, "failed to grant earned cosmetics"),
    }
    Ok(report)
  }

  pub fn snapshot(&self) -> GameSnapshot {
    GameSnapshot {
      status: self.status,
      score: self.score,
      level: self.level(),
      currency_earned: self.rates.currency_for(self.score),
      speed_multiplier: 1.0 + f64::from(self.speed_tier) * SPEED_MULTIPLIER_STEP,
      speed_ms: self.state.speed,
      direction: self.state.direction,
      snake: self.state.snake.iter().copied().collect(),
      food: self.state.food,
      obstacles: self.state.obstacles.iter().copied().collect(),
      death_cause: self.death,
    }
  }
}
