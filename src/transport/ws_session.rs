use crate::game::session::{run_session, SessionChannels, SessionContext};
use crate::game::types::Difficulty;
use crate::protocol::{decode_client_message, encode_server_message, ServerMessage};
use crate::shared::player::PlayerProfile;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

pub async fn handle_socket(
    socket: WebSocket,
    player: PlayerProfile,
    difficulty: Difficulty,
    context: SessionContext,
) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let player_id = player.player_id.clone();

    let send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let Some(payload) = encode_server_message(&message) else {
                continue;
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let game_task = tokio::spawn(run_session(
        player,
        difficulty,
        context,
        SessionChannels {
            inbound: inbound_rx,
            outbound: outbound_tx,
        },
    ));

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => {
                let Some(message) = decode_client_message(&text) else {
                    continue;
                };
                if inbound_tx.send(message).is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Dropping an in-flight flush rolls its transaction back.
    game_task.abort();
    send_task.abort();
    tracing::debug!(%player_id, "socket closed");
}
