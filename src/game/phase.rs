// Phase state machine:
// setup -> strategy -> action -> status -> agenda -> results -> strategy.

use crate::actions::GameEvent;
use crate::clock::Timestamp;
use crate::enums::{Phase, TimerPhase};
use crate::errors::{CommandResult, Refusal};

use super::turn_order;
use super::types::GameState;

impl GameState {
    pub(crate) fn expect_phase(&self, phase: Phase) -> CommandResult<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(Refusal::WrongPhase { phase: self.phase })
        }
    }

    /// Move to the next phase of the round.
    pub fn advance(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        let from = self.phase;
        let to = from.next();
        let mut events = Vec::new();

        match from {
            Phase::Setup => {
                if self.players.is_empty() {
                    return Err(Refusal::EmptyRoster);
                }
                if self.players.iter().any(|p| p.faction_id.is_none()) {
                    return Err(Refusal::FactionsMissing);
                }
                self.enter_strategy();
            }
            Phase::Strategy => {
                if turn_order::current_picker(&self.players).is_some() {
                    return Err(Refusal::PicksIncomplete);
                }
                self.enter_action(now, &mut events);
            }
            Phase::Action => {
                if self.turn_timer.is_active() {
                    events.push(GameEvent::TimerCleared);
                }
                self.turn_timer.clear();
            }
            Phase::Status | Phase::Agenda => {}
            Phase::Results => {
                self.round += 1;
                self.enter_strategy();
                events.push(GameEvent::RoundStarted { round: self.round });
            }
        }

        self.phase = to;
        events.insert(0, GameEvent::PhaseChanged { from, to });
        log::info!("🔄 Round {}: {} -> {}", self.round, from, to);
        Ok(events)
    }

    /// Jump back to an earlier phase of the current round.
    pub fn navigate_backward(
        &mut self,
        target: Phase,
        now: Timestamp,
    ) -> CommandResult<Vec<GameEvent>> {
        let Some(current) = self.phase.navigable_index() else {
            return Err(Refusal::WrongPhase { phase: self.phase });
        };
        match target.navigable_index() {
            Some(index) if index < current => {}
            _ => return Err(Refusal::NotEarlierPhase { phase: target }),
        }

        let from = self.phase;
        let mut events = vec![GameEvent::PhaseChanged { from, to: target }];
        if target == Phase::Action {
            self.current_turn_player_id = None;
            self.passed_players.clear();
            self.used_strategy_cards.clear();
            // Entries from the abandoned action phase would undo into it.
            self.action_log.clear();
            events.push(GameEvent::TurnChanged { current: None });
            self.enter_action(now, &mut events);
        } else {
            if self.turn_timer.is_active() {
                events.push(GameEvent::TimerCleared);
            }
            self.turn_timer.clear();
        }
        self.phase = target;

        log::info!("⏪ Round {}: back from {} to {}", self.round, from, target);
        Ok(events)
    }

    fn enter_strategy(&mut self) {
        for player in &mut self.players {
            player.strategy_card = None;
        }
        self.passed_players.clear();
        self.used_strategy_cards.clear();
        self.current_turn_player_id = None;
        self.action_log.clear();
        self.turn_timer.clear();
    }

    fn enter_action(&mut self, now: Timestamp, events: &mut Vec<GameEvent>) {
        if self.time_limit_mode {
            self.turn_timer.start(TimerPhase::Prep, now);
            events.push(GameEvent::TimerStarted {
                phase: TimerPhase::Prep,
            });
        } else {
            self.turn_timer.clear();
        }
    }
}
