use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::actions::{Command, CommandOutcome};
use crate::alert::BroadcastAlertSink;
use crate::application::{SessionService, SessionUpdate};
use crate::enums::TimerPhase;
use crate::errors::{CompanionResult, NetworkError};
use crate::game::GameState;
use crate::state::SessionView;

/// WebSocket message types for client-server communication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    #[serde(rename = "session_state")]
    SessionState { state: GameState, view: SessionView },

    #[serde(rename = "command")]
    Command { command: Command },

    #[serde(rename = "command_result")]
    CommandResult { outcome: CommandOutcome },

    #[serde(rename = "alert")]
    Alert { phase: TimerPhase },

    #[serde(rename = "error")]
    Error { message: String },

    #[serde(rename = "greeting")]
    Greeting { message: String },
}

type WsSender = futures::stream::SplitSink<WebSocket, Message>;

impl From<SessionUpdate> for WsMessage {
    fn from(update: SessionUpdate) -> Self {
        let view = update.view();
        WsMessage::SessionState {
            state: update.state,
            view,
        }
    }
}

/// WebSocket service that handles real-time communication
/// This is purely an infrastructure concern - no session rules here
#[derive(Clone)]
pub struct WebSocketService {
    session_service: Arc<SessionService>,
    alerts: BroadcastAlertSink,
}

impl WebSocketService {
    pub fn new(session_service: Arc<SessionService>, alerts: BroadcastAlertSink) -> Self {
        Self {
            session_service,
            alerts,
        }
    }

    /// Handle a new WebSocket connection
    pub async fn handle_connection(&self, socket: WebSocket) {
        let client_id = Uuid::new_v4();
        log::info!("🔌 WebSocket client {} connected", client_id);

        // Split socket for concurrent read/write
        let (mut sender, mut receiver) = socket.split();

        let greeting = WsMessage::Greeting {
            message: "Connected to the session companion".to_string(),
        };
        if let Err(e) = Self::send_message(&mut sender, &greeting).await {
            log::error!("Failed to send greeting: {}", e);
            return;
        }

        let initial = self.state_message().await;
        if let Err(e) = Self::send_message(&mut sender, &initial).await {
            log::error!("Failed to send initial session state: {}", e);
            return;
        }

        let mut updates = self.session_service.subscribe();
        let mut alarms = self.alerts.subscribe();
        let (reply_tx, mut replies) = mpsc::channel::<WsMessage>(32);

        // Forward session updates, alarms and command replies to this client
        let mut update_task = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    update = updates.recv() => match update {
                        Ok(update) => WsMessage::from(update),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            log::debug!("Client {} skipped {} updates", client_id, skipped);
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    alarm = alarms.recv() => match alarm {
                        Ok(phase) => WsMessage::Alert { phase },
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    reply = replies.recv() => match reply {
                        Some(message) => message,
                        None => break,
                    },
                };
                if Self::send_message(&mut sender, &message).await.is_err() {
                    break; // Client disconnected
                }
            }
        });

        // Handle incoming messages
        let session_service = self.session_service.clone();
        let mut message_task = tokio::spawn(async move {
            while let Some(Ok(message)) = receiver.next().await {
                match message {
                    Message::Text(text) => {
                        let reply = Self::handle_text_message(&session_service, text.as_str())
                            .await
                            .unwrap_or_else(|e| WsMessage::Error {
                                message: e.to_string(),
                            });
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {
                        // Ignore other message types
                    }
                }
            }
        });

        // Wait for either task to complete (client disconnect or error)
        tokio::select! {
            _ = &mut update_task => {
                message_task.abort();
            }
            _ = &mut message_task => {
                update_task.abort();
            }
        }

        log::info!("🔌 WebSocket client {} disconnected", client_id);
    }

    async fn state_message(&self) -> WsMessage {
        let (state, view) = self.session_service.state_with_view().await;
        WsMessage::SessionState { state, view }
    }

    /// Handle incoming text messages
    async fn handle_text_message(
        session_service: &SessionService,
        text: &str,
    ) -> CompanionResult<WsMessage> {
        let ws_message: WsMessage = serde_json::from_str(text)
            .map_err(|e| NetworkError::deserialization_failed(e.to_string()))?;

        match ws_message {
            WsMessage::Command { command } => {
                let outcome = session_service.apply(&command).await;
                Ok(WsMessage::CommandResult { outcome })
            }
            other => {
                log::debug!("Received unhandled message type: {:?}", other);
                Ok(WsMessage::Error {
                    message: "only command messages are accepted".to_string(),
                })
            }
        }
    }

    /// Send a message to a WebSocket sender
    async fn send_message(sender: &mut WsSender, message: &WsMessage) -> CompanionResult<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| NetworkError::serialization_failed(e.to_string()))?;

        sender
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| NetworkError::ConnectionClosed {
                details: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::game::test_support::{action_phase_state, T0};
    use crate::game::timer::INITIATE_MS;
    use crate::persistence::MemoryStore;

    fn session_service() -> SessionService {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_700_000_000_000));
        SessionService::new(
            GameState::new(),
            clock,
            Arc::new(MemoryStore::new()),
            Arc::new(BroadcastAlertSink::new(1)),
        )
    }

    #[tokio::test]
    async fn test_command_message_is_applied() {
        let service = session_service();
        let reply = WebSocketService::handle_text_message(
            &service,
            r#"{"type":"command","command":{"type":"initializePlayers","count":3}}"#,
        )
        .await
        .unwrap();

        match reply {
            WsMessage::CommandResult { outcome } => assert!(outcome.is_applied()),
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(service.state().await.players.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_message_is_an_error() {
        let service = session_service();
        let result = WebSocketService::handle_text_message(&service, "{\"type\":\"nope\"}").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_view_matches_carried_state() {
        let clock = Arc::new(ManualClock::new(T0));
        let service = SessionService::new(
            action_phase_state(4, true),
            clock.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(BroadcastAlertSink::new(1)),
        );
        let mut updates = service.subscribe();
        assert!(service.apply(&Command::StartEarly).await.is_applied());
        clock.advance(10_000);

        let update = updates.recv().await.unwrap();
        match WsMessage::from(update) {
            WsMessage::SessionState { state, view } => {
                assert_eq!(state.turn_timer.remaining_ms, INITIATE_MS);
                assert_eq!(view.timer_remaining_ms, INITIATE_MS);
                assert_eq!(view.timer_phase, Some(TimerPhase::Initiate));
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(service.view().await.timer_remaining_ms, INITIATE_MS - 10_000);
    }

    #[test]
    fn test_alert_wire_format() {
        let json = serde_json::to_value(WsMessage::Alert {
            phase: TimerPhase::Resolve,
        })
        .unwrap();
        assert_eq!(json["type"], "alert");
        assert_eq!(json["phase"], "resolve");
    }
}
