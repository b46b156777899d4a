use crate::game::constants::{EAT_VIBRATE_MS, GAME_OVER_VIBRATE_MS, TURN_VIBRATE_MS};
use crate::protocol::ServerMessage;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundKind {
    Eat,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub sound: Option<SoundKind>,
    pub vibrate_ms: Option<u32>,
}

impl Feedback {
    pub const EAT: Feedback = Feedback {
        sound: Some(SoundKind::Eat),
        vibrate_ms: Some(EAT_VIBRATE_MS),
    };
    pub const GAME_OVER: Feedback = Feedback {
        sound: Some(SoundKind::GameOver),
        vibrate_ms: Some(GAME_OVER_VIBRATE_MS),
    };
    pub const TURN: Feedback = Feedback {
        sound: None,
        vibrate_ms: Some(TURN_VIBRATE_MS),
    };
}

/// Forwards fire-and-forget feedback to the client. Audio is armed once, on the first
/// user input; sounds produced before that are dropped.
#[derive(Debug)]
pub struct FeedbackHandle {
    started: AtomicBool,
    sink: mpsc::UnboundedSender<ServerMessage>,
}

impl FeedbackHandle {
    pub fn new(sink: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            started: AtomicBool::new(false),
            sink,
        }
    }

    /// Returns true only for the call that actually started the output.
    pub fn ensure_started(&self) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.send(ServerMessage::AudioReady);
        true
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn emit(&self, feedback: Feedback) {
        let sound = feedback.sound.filter(|_| self.is_started());
        if sound.is_none() && feedback.vibrate_ms.is_none() {
            return;
        }
        self.send(ServerMessage::Feedback {
            sound,
            vibrate_ms: feedback.vibrate_ms,
        });
    }

    fn send(&self, message: ServerMessage) {
        if self.sink.send(message).is_err() {
            tracing::trace!("feedback channel closed");
        }
    }
}
