// Countdown alarms. The core only emits `GameEvent::TimerExpired`; sinks turn
// that into whatever signal the presentation layer plays.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::enums::TimerPhase;
use crate::errors::AlertError;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn alert(&self, phase: TimerPhase) -> Result<(), AlertError>;
}

/// Writes alarms to the log; the default for headless runs.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn alert(&self, phase: TimerPhase) -> Result<(), AlertError> {
        log::warn!("🔔 Time is up ({})", phase);
        Ok(())
    }
}

/// Fans alarms out to subscribed clients.
#[derive(Clone)]
pub struct BroadcastAlertSink {
    sender: broadcast::Sender<TimerPhase>,
}

impl BroadcastAlertSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerPhase> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl AlertSink for BroadcastAlertSink {
    async fn alert(&self, phase: TimerPhase) -> Result<(), AlertError> {
        self.sender
            .send(phase)
            .map(|_| ())
            .map_err(|_| AlertError::NoListeners)
    }
}
