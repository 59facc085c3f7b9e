// Turn time budget: prep / initiate / resolve countdowns plus per-player
// extensions.
//
// The countdown is never decremented by a background task. It stores the
// remaining time at the last baseline and derives the current value from the
// clock, consuming whole 100 ms ticks on `settle`.

use serde::{Deserialize, Serialize};

use crate::actions::GameEvent;
use crate::clock::{whole_steps, Timestamp};
use crate::enums::{ActionKind, TimerPhase};
use crate::errors::{CommandResult, Refusal};

use super::turn_order;
use super::types::{GameState, TimerSnapshot};

pub const PREP_MS: u64 = 2 * 60 * 1000;
pub const INITIATE_MS: u64 = 60 * 1000;
pub const RESOLVE_MS: u64 = 90 * 1000;
pub const EXTENSION_MS: u64 = 2 * 60 * 1000;
pub const TICK_MS: u64 = 100;
pub const EXTENSIONS_PER_PLAYER: u32 = 6;

/// Full budget for a countdown phase.
pub fn budget(phase: TimerPhase) -> u64 {
    match phase {
        TimerPhase::Prep => PREP_MS,
        TimerPhase::Initiate => INITIATE_MS,
        TimerPhase::Resolve => RESOLVE_MS,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnTimer {
    #[serde(rename = "turnTimerPhase")]
    pub phase: Option<TimerPhase>,
    #[serde(rename = "turnTimerRemaining")]
    pub remaining_ms: u64,
    #[serde(rename = "turnTimerRunning")]
    pub running: bool,
    /// Baseline for `remaining_ms` while running.
    #[serde(skip)]
    pub resumed_at: Option<Timestamp>,
}

impl TurnTimer {
    pub fn start(&mut self, phase: TimerPhase, now: Timestamp) {
        self.phase = Some(phase);
        self.remaining_ms = budget(phase);
        self.running = true;
        self.resumed_at = Some(now);
    }

    pub fn clear(&mut self) {
        *self = TurnTimer::default();
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    /// Running with nothing left: the next tick fires the expiry.
    pub fn is_expired(&self) -> bool {
        self.phase.is_some() && self.running && self.remaining_ms == 0
    }

    /// Expired and stopped, e.g. a resolve countdown that ran out.
    pub fn is_times_up(&self) -> bool {
        self.phase.is_some() && !self.running && self.remaining_ms == 0
    }

    pub fn settle(&mut self, now: Timestamp) {
        if !self.running {
            return;
        }
        match self.resumed_at {
            Some(since) => {
                let consumed = whole_steps(since, now, TICK_MS);
                self.remaining_ms = self.remaining_ms.saturating_sub(consumed);
                self.resumed_at = Some(since + consumed);
            }
            None => self.resumed_at = Some(now),
        }
    }

    pub fn remaining_at(&self, now: Timestamp) -> u64 {
        match (self.running, self.resumed_at) {
            (true, Some(since)) => self
                .remaining_ms
                .saturating_sub(whole_steps(since, now, TICK_MS)),
            _ => self.remaining_ms,
        }
    }

    pub fn pause(&mut self, now: Timestamp) {
        self.settle(now);
        self.running = false;
        self.resumed_at = None;
    }

    pub fn resume(&mut self, now: Timestamp) {
        if !self.running {
            self.running = true;
            self.resumed_at = Some(now);
        }
    }

    /// Out of time: stopped at zero, phase kept.
    fn run_out(&mut self) {
        self.remaining_ms = 0;
        self.running = false;
        self.resumed_at = None;
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            running: self.running,
        }
    }

    pub fn restore(&mut self, snapshot: TimerSnapshot, now: Timestamp) {
        self.phase = snapshot.phase;
        self.remaining_ms = snapshot.remaining_ms;
        self.running = snapshot.running;
        self.resumed_at = snapshot.running.then_some(now);
    }
}

impl GameState {
    /// Advance the clocks to `now` and fire at most one countdown expiry.
    pub fn tick(&mut self, now: Timestamp) -> Vec<GameEvent> {
        self.settle(now);
        if self.is_finished() || !self.turn_timer.is_expired() {
            return Vec::new();
        }
        self.expire(now)
    }

    fn expire(&mut self, now: Timestamp) -> Vec<GameEvent> {
        let Some(phase) = self.turn_timer.phase else {
            return Vec::new();
        };
        log::info!("⏰ Turn timer expired in {} (round {})", phase, self.round);

        let mut events = vec![GameEvent::TimerExpired { phase }];
        match phase {
            TimerPhase::Prep => events.extend(self.begin_first_turn(now)),
            TimerPhase::Initiate => match self.current_turn_player_id.clone() {
                Some(actor_id) => {
                    self.push_log_entry(&actor_id, ActionKind::TacticalAuto, now);
                    self.turn_timer.start(TimerPhase::Resolve, now);
                    events.push(GameEvent::ActionRecorded {
                        actor_id,
                        kind: ActionKind::TacticalAuto,
                    });
                    events.push(GameEvent::TimerStarted {
                        phase: TimerPhase::Resolve,
                    });
                }
                None => self.turn_timer.run_out(),
            },
            TimerPhase::Resolve => self.turn_timer.run_out(),
        }
        events
    }

    /// Hand the turn to the first unpassed player by initiative and start
    /// their initiate countdown.
    fn begin_first_turn(&mut self, now: Timestamp) -> Vec<GameEvent> {
        let first = turn_order::first_unpassed(&self.players, &self.passed_players)
            .map(|p| p.id.clone());
        self.current_turn_player_id = first.clone();
        self.turn_timer.start(TimerPhase::Initiate, now);
        vec![
            GameEvent::TurnChanged { current: first },
            GameEvent::TimerStarted {
                phase: TimerPhase::Initiate,
            },
        ]
    }

    pub fn start_early(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        self.expect_timer_phase(TimerPhase::Prep)?;
        log::info!("🚀 Prep skipped, first turn starts early");
        Ok(self.begin_first_turn(now))
    }

    /// End the current actor's resolution window and pass the turn on.
    pub fn finish_resolve(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        self.expect_action_phase()?;
        if self.time_limit_mode {
            self.expect_timer_phase(TimerPhase::Resolve)?;
        } else if !self.is_resolving() {
            return Err(Refusal::NotResolving);
        }

        let next = turn_order::next_player(
            &self.players,
            self.current_turn_player_id.as_deref(),
            &self.passed_players,
        )
        .map(|p| p.id.clone());
        self.current_turn_player_id = next.clone();

        let mut events = vec![GameEvent::TurnChanged {
            current: next.clone(),
        }];
        if self.time_limit_mode {
            if next.is_some() {
                self.turn_timer.start(TimerPhase::Initiate, now);
                events.push(GameEvent::TimerStarted {
                    phase: TimerPhase::Initiate,
                });
            } else {
                self.turn_timer.clear();
                events.push(GameEvent::TimerCleared);
            }
        }
        Ok(events)
    }

    /// Spend one of `actor_id`'s extensions on the running countdown.
    pub fn extend(&mut self, actor_id: &str, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        let current = self
            .current_turn_player_id
            .as_deref()
            .ok_or(Refusal::NoCurrentPlayer)?;
        if current != actor_id {
            return Err(Refusal::not_players_turn(actor_id));
        }
        if !self.turn_timer.is_active() {
            return Err(Refusal::TimerInactive);
        }
        let left = self.extensions_remaining(actor_id);
        if left == 0 {
            return Err(Refusal::NoExtensionsLeft {
                player_id: actor_id.to_string(),
            });
        }

        self.player_extensions.insert(actor_id.to_string(), left - 1);
        self.turn_timer.settle(now);
        self.turn_timer.remaining_ms += EXTENSION_MS;
        self.turn_timer.resume(now);
        log::info!("🎫 {} extended their turn ({} left)", actor_id, left - 1);

        Ok(vec![GameEvent::ExtensionUsed {
            player_id: actor_id.to_string(),
            extensions_remaining: left - 1,
        }])
    }

    pub fn toggle_pause(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        if !self.turn_timer.is_active() || self.turn_timer.is_times_up() {
            return Err(Refusal::TimerInactive);
        }
        if self.turn_timer.running {
            self.turn_timer.pause(now);
        } else {
            self.turn_timer.resume(now);
        }
        Ok(vec![GameEvent::TimerToggled {
            running: self.turn_timer.running,
        }])
    }

    fn expect_timer_phase(&self, expected: TimerPhase) -> CommandResult<()> {
        if self.turn_timer.phase == Some(expected) {
            Ok(())
        } else {
            Err(Refusal::WrongTimerPhase {
                expected,
                actual: self.turn_timer.phase,
            })
        }
    }
}
