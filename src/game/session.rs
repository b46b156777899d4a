use crate::app::config::AppConfig;
use crate::app::time::now_millis;
use crate::game::constants::GRID_SIZE;
use crate::game::engine::{EngineOptions, FlushTarget, GameEngine, RunSyncState};
use crate::game::feedback::FeedbackHandle;
use crate::game::types::{Difficulty, GameStatus};
use crate::progress::cosmetics;
use crate::progress::error::SyncError;
use crate::progress::sync::{FlushReport, ProgressSync, UnlockNotification};
use crate::progress::tracker::AchievementTracker;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::shared::player::PlayerProfile;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

#[derive(Clone)]
pub struct SessionContext {
    pub sync: Arc<ProgressSync>,
    pub config: Arc<AppConfig>,
}

pub struct SessionChannels {
    pub inbound: mpsc::UnboundedReceiver<ClientMessage>,
    pub outbound: mpsc::UnboundedSender<ServerMessage>,
}

struct Session {
    player: PlayerProfile,
    engine: GameEngine,
    sync: Arc<ProgressSync>,
    feedback: FeedbackHandle,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    unlocks: mpsc::UnboundedSender<UnlockNotification>,
}

/// Owns one player's engine for the lifetime of the connection.
pub async fn run_session(
    player: PlayerProfile,
    difficulty: Difficulty,
    context: SessionContext,
    channels: SessionChannels,
) {
    let SessionChannels {
        mut inbound,
        outbound,
    } = channels;
    let store = context.sync.store();

    let tracker = match store.load_progress(&player.player_id).await {
        Ok(records) => AchievementTracker::new(records),
        Err(err) => {
            tracing::warn!(
                player_id = %player.player_id,
                %err,
                "failed to load achievement progress"
            );
            AchievementTracker::default()
        }
    };
    let equipped = match store.load_stats(&player.player_id).await {
        Ok(stats) => stats.map(|stats| stats.equipped_cosmetic),
        Err(err) => {
            tracing::warn!(player_id = %player.player_id, %err, "failed to load player stats");
            None
        }
    };
    let equipped = equipped.as_deref().unwrap_or(cosmetics::DEFAULT_COSMETIC_ID);
    let appearance = cosmetics::style_for(equipped);

    let now = now_millis();
    let options = EngineOptions {
        seed: rand::random(),
        clock: context.config.clock,
        rates: context.config.rewards,
    };
    let (unlocks, mut unlock_rx) = mpsc::unbounded_channel();
    let mut session = Session {
        engine: GameEngine::new(difficulty, tracker, options, now),
        sync: context.sync.clone(),
        feedback: FeedbackHandle::new(outbound.clone()),
        outbound,
        unlocks,
        player,
    };

    session.send(ServerMessage::Init {
        player_id: session.player.player_id.clone(),
        difficulty,
        grid_size: GRID_SIZE,
        appearance,
    });
    session.publish_state();
    tracing::info!(
        player_id = %session.player.player_id,
        difficulty = difficulty.as_str(),
        "session started"
    );

    let mut frames = tokio::time::interval(context.config.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                session.on_frame().await;
            }
            message = inbound.recv() => {
                let Some(message) = message else { break };
                session.on_message(message).await;
            }
            Some(unlocked) = unlock_rx.recv() => {
                session.send(ServerMessage::AchievementUnlocked {
                    id: unlocked.id.to_string(),
                    name: unlocked.name.to_string(),
                });
            }
        }
    }

    tracing::info!(player_id = %session.player.player_id, "session ended");
}

impl Session {
    fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).is_err() {
            tracing::debug!(player_id = %self.player.player_id, "outbound channel closed");
        }
    }

    fn publish_state(&self) {
        self.send(ServerMessage::State {
            snapshot: self.engine.snapshot(),
        });
    }

    fn forward_feedback(&mut self) {
        for feedback in self.engine.drain_feedback() {
            self.feedback.emit(feedback);
        }
    }

    async fn on_frame(&mut self) {
        let outcome = self.engine.frame(now_millis());
        self.forward_feedback();
        if outcome.ticked || outcome.food_moved {
            self.publish_state();
        }
        if outcome.game_over.is_some() {
            let target = FlushTarget {
                sync: &self.sync,
                player: &self.player,
                notifications: &self.unlocks,
            };
            let result = self.engine.handle_game_over(now_millis(), target).await;
            self.report_flush(result);
        }
    }

    async fn on_message(&mut self, message: ClientMessage) {
        let now = now_millis();
        match message {
            ClientMessage::Start => {
                self.feedback.ensure_started();
                if self.engine.start(now) {
                    self.publish_state();
                }
            }
            ClientMessage::Direction { direction } => {
                self.feedback.ensure_started();
                if self.engine.status() == GameStatus::Idle {
                    self.engine.start(now);
                }
                self.engine.change_direction(direction);
                self.forward_feedback();
                self.publish_state();
            }
            ClientMessage::TogglePause => {
                if self.engine.toggle_pause(now) {
                    self.publish_state();
                }
            }
            ClientMessage::ToggleFullscreen => {
                self.engine.toggle_fullscreen();
            }
            ClientMessage::Restart => {
                self.engine.restart(now);
                self.publish_state();
            }
            ClientMessage::RetrySync => {
                if self.engine.sync_state() != RunSyncState::Failed {
                    tracing::debug!(player_id = %self.player.player_id, "nothing to resync");
                    return;
                }
                let target = FlushTarget {
                    sync: &self.sync,
                    player: &self.player,
                    notifications: &self.unlocks,
                };
                let result = self.engine.retry_sync(now, target).await;
                self.report_flush(result);
            }
        }
    }

    fn report_flush(&self, result: Option<Result<FlushReport, SyncError>>) {
        match result {
            Some(Ok(report)) => self.send(ServerMessage::RunSaved {
                score: report.score,
                currency_earned: report.currency_earned,
                league_points_earned: report.league_points_earned,
                newly_unlocked: report
                    .newly_unlocked
                    .iter()
                    .map(|def| def.id.to_string())
                    .collect(),
            }),
            Some(Err(err)) => self.send(ServerMessage::SyncFailed {
                error: err.to_string(),
            }),
            None => {}
        }
    }
}
