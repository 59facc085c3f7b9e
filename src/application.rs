use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::actions::{Command, CommandOutcome, GameEvent};
use crate::alert::AlertSink;
use crate::clock::{Clock, Timestamp};
use crate::game::GameState;
use crate::persistence::{self, SessionStore};
use crate::state::SessionView;

/// How often a running clock is written back even when nothing happened.
const IDLE_SAVE_INTERVAL_MS: u64 = 1_000;

/// Pushed to subscribers after every state change.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    /// Clock reading the state was settled at.
    pub at: Timestamp,
}

impl SessionUpdate {
    /// Derived view of the carried state, as of the moment it was published.
    pub fn view(&self) -> SessionView {
        SessionView::of(&self.state, self.at)
    }
}

struct Session {
    state: GameState,
    last_saved: Timestamp,
}

/// Core application service for the session.
/// Owns the single `GameState`, serializes commands through a lock and
/// coordinates persistence, alarms and client updates.
#[derive(Clone)]
pub struct SessionService {
    session: Arc<RwLock<Session>>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    alerts: Arc<dyn AlertSink>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl SessionService {
    pub fn new(
        state: GameState,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let (updates, _) = broadcast::channel(256);
        let last_saved = clock.now_ms();
        Self {
            session: Arc::new(RwLock::new(Session { state, last_saved })),
            clock,
            store,
            alerts,
            updates,
        }
    }

    /// Start from whatever the store holds.
    pub async fn load(
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let state = persistence::load_state(store.as_ref(), clock.now_ms()).await;
        log::info!(
            "📂 Loaded session: {} phase, round {}, {} players",
            state.phase,
            state.round,
            state.players.len()
        );
        Self::new(state, clock, store, alerts)
    }

    pub async fn state(&self) -> GameState {
        self.session.read().await.state.clone()
    }

    pub async fn view(&self) -> SessionView {
        let session = self.session.read().await;
        SessionView::of(&session.state, self.clock.now_ms())
    }

    /// State and view read under one lock.
    pub async fn state_with_view(&self) -> (GameState, SessionView) {
        let session = self.session.read().await;
        let view = SessionView::of(&session.state, self.clock.now_ms());
        (session.state.clone(), view)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    pub async fn apply(&self, command: &Command) -> CommandOutcome {
        let mut session = self.session.write().await;
        let now = self.clock.now_ms();
        let outcome = session.state.apply_command(command, now);
        if outcome.is_applied() {
            self.commit(&mut session, now, outcome.events().to_vec()).await;
        }
        outcome
    }

    /// Advance the clocks; fires countdown expiries and raises the alarm.
    pub async fn tick(&self) -> Vec<GameEvent> {
        let mut session = self.session.write().await;
        let now = self.clock.now_ms();
        let events = session.state.tick(now);

        if !events.is_empty() {
            self.commit(&mut session, now, events.clone()).await;
            if session.state.alarm_enabled {
                self.raise_alarms(&events).await;
            }
        } else if self.clock_running(&session.state)
            && now.saturating_sub(session.last_saved) >= IDLE_SAVE_INTERVAL_MS
        {
            self.persist(&mut session, now).await;
        }
        events
    }

    fn clock_running(&self, state: &GameState) -> bool {
        state.elapsed.running || state.turn_timer.running
    }

    async fn commit(&self, session: &mut Session, now: Timestamp, events: Vec<GameEvent>) {
        self.persist(session, now).await;
        // No subscribers is fine; updates are best effort.
        let _ = self.updates.send(SessionUpdate {
            state: session.state.clone(),
            events,
            at: now,
        });
    }

    async fn persist(&self, session: &mut Session, now: Timestamp) {
        let saved = match persistence::encode(&session.state) {
            Ok(blob) => self.store.save(&blob).await,
            Err(e) => Err(e),
        };
        match saved {
            Ok(()) => session.last_saved = now,
            Err(e) => log::warn!("⚠️ Could not save session: {}", e),
        }
    }

    async fn raise_alarms(&self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::TimerExpired { phase } = event {
                if let Err(e) = self.alerts.alert(*phase).await {
                    log::debug!("Alarm for {} not delivered: {}", phase, e);
                }
            }
        }
    }
}
