// Action ledger: the append-only log of action-phase moves, with undo by
// restoring the snapshot captured before each move.

use crate::actions::GameEvent;
use crate::clock::Timestamp;
use crate::enums::{ActionKind, Phase, TimerPhase};
use crate::errors::{CommandResult, Refusal};

use super::timer::{INITIATE_MS, PREP_MS};
use super::turn_order;
use super::types::{GameState, LogEntry, TimerSnapshot};

/// Timer restored when undoing an entry that carries no live countdown.
const UNTRACKED_TIMER: TimerSnapshot = TimerSnapshot {
    phase: Some(TimerPhase::Initiate),
    remaining_ms: INITIATE_MS,
    running: true,
};

/// Countdown to put back on undo. Entries logged before turn timing was
/// switched on carry no phase, and entries logged by an expiry carry a
/// running countdown at zero that would fire again on the next tick. Both
/// fall back to a fresh countdown: initiate for the restored current player,
/// prep when nobody holds the turn yet.
fn restorable_timer(timer: Option<TimerSnapshot>, has_current: bool) -> TimerSnapshot {
    match timer {
        Some(t) if t.phase.is_some() && !(t.running && t.remaining_ms == 0) => t,
        _ if has_current => UNTRACKED_TIMER,
        _ => TimerSnapshot {
            phase: Some(TimerPhase::Prep),
            remaining_ms: PREP_MS,
            running: true,
        },
    }
}

impl GameState {
    pub(crate) fn expect_action_phase(&self) -> CommandResult<()> {
        self.expect_phase(Phase::Action)
    }

    /// Append an entry for `actor_id`, capturing the control fields first.
    pub(crate) fn push_log_entry(&mut self, actor_id: &str, kind: ActionKind, now: Timestamp) {
        let snapshot = self.snapshot();
        let actor_name = self
            .player(actor_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.action_log.push(LogEntry {
            actor_id: actor_id.to_string(),
            actor_name,
            kind,
            timestamp: now,
            snapshot,
        });
    }

    /// Whether the current player took an action whose resolution has not
    /// been finished yet.
    pub fn is_resolving(&self) -> bool {
        if self.time_limit_mode {
            return self.turn_timer.phase == Some(TimerPhase::Resolve);
        }
        match (self.action_log.last(), self.current_turn_player_id.as_deref()) {
            (Some(entry), Some(current)) => entry.kind.is_action() && entry.actor_id == current,
            _ => false,
        }
    }

    fn expect_acting_player(&self, actor_id: &str) -> CommandResult<()> {
        if !self.has_player(actor_id) {
            return Err(Refusal::unknown_player(actor_id));
        }
        if self.passed_players.contains(actor_id) {
            return Err(Refusal::AlreadyPassed {
                player_id: actor_id.to_string(),
            });
        }
        if self.time_limit_mode && self.turn_timer.phase == Some(TimerPhase::Prep) {
            return Err(Refusal::WrongTimerPhase {
                expected: TimerPhase::Initiate,
                actual: Some(TimerPhase::Prep),
            });
        }
        match self.acting_player_id() {
            Some(acting) if acting == actor_id => Ok(()),
            _ => Err(Refusal::not_players_turn(actor_id)),
        }
    }

    pub fn record_action(
        &mut self,
        actor_id: &str,
        kind: ActionKind,
        now: Timestamp,
    ) -> CommandResult<Vec<GameEvent>> {
        self.expect_action_phase()?;
        if !matches!(kind, ActionKind::Tactical | ActionKind::Strategic) {
            return Err(Refusal::NotAnAction { kind });
        }
        self.expect_acting_player(actor_id)?;
        if self.time_limit_mode && self.is_resolving() {
            return Err(Refusal::StillResolving);
        }
        if kind == ActionKind::Strategic {
            let holds_card = self
                .player(actor_id)
                .is_some_and(|p| p.strategy_card.is_some());
            if !holds_card {
                return Err(Refusal::NoStrategyCard {
                    player_id: actor_id.to_string(),
                });
            }
            if self.used_strategy_cards.contains(actor_id) {
                return Err(Refusal::StrategyAlreadyUsed {
                    player_id: actor_id.to_string(),
                });
            }
        }

        self.push_log_entry(actor_id, kind, now);
        let mut events = vec![GameEvent::ActionRecorded {
            actor_id: actor_id.to_string(),
            kind,
        }];

        if kind == ActionKind::Strategic {
            self.used_strategy_cards.insert(actor_id.to_string());
        }
        if self.current_turn_player_id.as_deref() != Some(actor_id) {
            self.current_turn_player_id = Some(actor_id.to_string());
            events.push(GameEvent::TurnChanged {
                current: self.current_turn_player_id.clone(),
            });
        }
        if self.time_limit_mode {
            self.turn_timer.start(TimerPhase::Resolve, now);
            events.push(GameEvent::TimerStarted {
                phase: TimerPhase::Resolve,
            });
        }

        log::info!("📜 {} took a {:?} action", actor_id, kind);
        Ok(events)
    }

    pub fn record_pass(&mut self, actor_id: &str, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        self.expect_action_phase()?;
        self.expect_acting_player(actor_id)?;
        if !self.used_strategy_cards.contains(actor_id) {
            return Err(Refusal::StrategyNotUsed {
                player_id: actor_id.to_string(),
            });
        }

        self.push_log_entry(actor_id, ActionKind::Pass, now);
        self.passed_players.insert(actor_id.to_string());

        let next = turn_order::next_player(&self.players, Some(actor_id), &self.passed_players)
            .map(|p| p.id.clone());
        self.current_turn_player_id = next.clone();

        let mut events = vec![
            GameEvent::PlayerPassed {
                player_id: actor_id.to_string(),
            },
            GameEvent::TurnChanged {
                current: next.clone(),
            },
        ];
        if next.is_none() {
            events.push(GameEvent::AllPlayersPassed);
        }
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

        log::info!("✋ {} passed ({} of {})", actor_id, self.passed_players.len(), self.players.len());
        Ok(events)
    }

    /// Pop the latest entry and put the control fields back as they were.
    /// Extension budgets are not part of the snapshot and stay spent.
    pub fn undo(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        self.expect_action_phase()?;
        let entry = self.action_log.pop().ok_or(Refusal::NothingToUndo)?;

        let snapshot = entry.snapshot;
        self.current_turn_player_id = snapshot.current_turn_player_id;
        self.passed_players = snapshot.passed_players;
        self.used_strategy_cards = snapshot.used_strategy_cards;
        if self.time_limit_mode {
            let timer = restorable_timer(snapshot.timer, self.current_turn_player_id.is_some());
            self.turn_timer.restore(timer, now);
        }

        log::info!("↩️ Undid {:?} by {}", entry.kind, entry.actor_id);
        Ok(vec![GameEvent::ActionUndone {
            actor_id: entry.actor_id,
            kind: entry.kind,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::{action_phase_state, T0};
    use crate::game::timer::RESOLVE_MS;
    use crate::game::types::Snapshot;
    use crate::ordered_set::OrderedSet;

    #[test]
    fn test_record_action_keeps_current_player() {
        let mut state = action_phase_state(4, false);
        // untimed: the first unpassed by initiative may act without a current
        state
            .record_action("player-3", ActionKind::Tactical, T0)
            .unwrap();

        assert_eq!(state.current_turn_player_id.as_deref(), Some("player-3"));
        assert_eq!(state.action_log.len(), 1);
        let entry = &state.action_log[0];
        assert_eq!(entry.actor_name, "Player 4");
        assert_eq!(entry.snapshot.current_turn_player_id, None);
        assert!(state.is_resolving());
    }

    #[test]
    fn test_record_action_refuses_other_players() {
        let mut state = action_phase_state(4, false);
        let before = state.clone();
        assert_eq!(
            state.record_action("player-0", ActionKind::Tactical, T0),
            Err(Refusal::not_players_turn("player-0"))
        );
        assert_eq!(
            state.record_action("player-9", ActionKind::Tactical, T0),
            Err(Refusal::unknown_player("player-9"))
        );
        assert_eq!(
            state.record_action("player-3", ActionKind::Pass, T0),
            Err(Refusal::NotAnAction {
                kind: ActionKind::Pass
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_strategic_action_marks_card_used_once() {
        let mut state = action_phase_state(4, true);
        state.start_early(T0).unwrap();
        state
            .record_action("player-3", ActionKind::Strategic, T0 + 500)
            .unwrap();
        assert!(state.used_strategy_cards.contains("player-3"));
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Resolve));
        assert_eq!(state.turn_timer.remaining_ms, RESOLVE_MS);

        assert_eq!(
            state.record_action("player-3", ActionKind::Tactical, T0 + 600),
            Err(Refusal::StillResolving)
        );
        state.finish_resolve(T0 + 700).unwrap();
        state.finish_resolve_round_trip_to("player-3", T0 + 800);
        assert_eq!(
            state.record_action("player-3", ActionKind::Strategic, T0 + 900),
            Err(Refusal::StrategyAlreadyUsed {
                player_id: "player-3".into()
            })
        );
    }

    #[test]
    fn test_timed_actions_refused_during_prep() {
        let mut state = action_phase_state(4, true);
        assert_eq!(
            state.record_action("player-3", ActionKind::Tactical, T0),
            Err(Refusal::WrongTimerPhase {
                expected: TimerPhase::Initiate,
                actual: Some(TimerPhase::Prep),
            })
        );
    }

    #[test]
    fn test_pass_requires_strategic_action() {
        let mut state = action_phase_state(3, false);
        let first = state.acting_player_id().map(str::to_string).unwrap();
        assert_eq!(
            state.record_pass(&first, T0),
            Err(Refusal::StrategyNotUsed {
                player_id: first.clone()
            })
        );
    }

    #[test]
    fn test_pass_moves_turn_and_last_pass_clears_timer() {
        let mut state = action_phase_state(3, true);
        state.start_early(T0).unwrap();
        // initiative order: player-2, player-1, player-0
        for (i, id) in ["player-2", "player-1", "player-0"].iter().enumerate() {
            let at = T0 + i as u64 * 1_000;
            state.record_action(id, ActionKind::Strategic, at).unwrap();
            state.finish_resolve(at + 100).unwrap();
        }
        assert_eq!(state.current_turn_player_id.as_deref(), Some("player-2"));

        state.record_pass("player-2", T0 + 5_000).unwrap();
        assert_eq!(state.current_turn_player_id.as_deref(), Some("player-1"));
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Initiate));

        state.record_pass("player-1", T0 + 6_000).unwrap();
        let events = state.record_pass("player-0", T0 + 7_000).unwrap();

        assert!(events.contains(&GameEvent::AllPlayersPassed));
        assert_eq!(state.current_turn_player_id, None);
        assert!(!state.turn_timer.is_active());
        assert_eq!(
            state.record_pass("player-0", T0 + 8_000),
            Err(Refusal::AlreadyPassed {
                player_id: "player-0".into()
            })
        );
    }

    #[test]
    fn test_undo_restores_control_fields_and_timer() {
        let mut state = action_phase_state(4, true);
        state.start_early(T0).unwrap();
        state.tick(T0 + 20_000);
        let before = state.clone();

        state
            .record_action("player-3", ActionKind::Strategic, T0 + 20_000)
            .unwrap();
        state.undo(T0 + 20_000).unwrap();

        assert_eq!(state, before);
        assert_eq!(state.turn_timer.remaining_ms, INITIATE_MS - 20_000);
    }

    #[test]
    fn test_undo_without_timer_snapshot_restarts_initiate() {
        let mut state = action_phase_state(4, true);
        state.start_early(T0).unwrap();
        state
            .record_action("player-3", ActionKind::Tactical, T0)
            .unwrap();
        state.action_log[0].snapshot.timer = None;

        state.undo(T0 + 3_000).unwrap();
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Initiate));
        assert_eq!(state.turn_timer.remaining_ms, INITIATE_MS);
        assert!(state.turn_timer.running);
    }

    #[test]
    fn test_undo_of_auto_action_does_not_refire() {
        let mut state = action_phase_state(4, true);
        state.start_early(T0).unwrap();
        let expired_at = T0 + INITIATE_MS;
        state.tick(expired_at);
        assert_eq!(state.action_log.len(), 1);
        assert_eq!(state.action_log[0].kind, ActionKind::TacticalAuto);

        state.undo(expired_at + 500).unwrap();
        assert!(state.action_log.is_empty());
        assert_eq!(state.current_turn_player_id.as_deref(), Some("player-3"));
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Initiate));
        assert_eq!(state.turn_timer.remaining_ms, INITIATE_MS);

        assert!(state.tick(expired_at + 600).is_empty());
        assert!(state.action_log.is_empty());
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Initiate));
        assert_eq!(state.turn_timer.remaining_ms, INITIATE_MS - 100);
    }

    #[test]
    fn test_undo_of_untimed_entries_after_enabling_time_limit() {
        let mut state = action_phase_state(4, false);
        state
            .record_action("player-3", ActionKind::Tactical, T0)
            .unwrap();
        state.finish_resolve(T0 + 500).unwrap();
        state
            .record_action("player-2", ActionKind::Tactical, T0 + 600)
            .unwrap();
        state.toggle_time_limit_mode(T0 + 1_000).unwrap();
        assert_eq!(state.action_log[1].snapshot.timer.and_then(|t| t.phase), None);

        state.undo(T0 + 2_000).unwrap();
        assert!(state.time_limit_mode);
        assert_eq!(state.current_turn_player_id.as_deref(), Some("player-2"));
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Initiate));
        assert_eq!(state.turn_timer.remaining_ms, INITIATE_MS);
        assert!(state.turn_timer.running);

        // the first entry was logged before anyone held the turn
        state.undo(T0 + 3_000).unwrap();
        assert_eq!(state.current_turn_player_id, None);
        assert_eq!(state.turn_timer.phase, Some(TimerPhase::Prep));
        assert_eq!(state.turn_timer.remaining_ms, PREP_MS);
        assert!(state.turn_timer.running);
        assert!(state.violations().is_empty());
    }

    #[test]
    fn test_undo_keeps_stopped_countdown() {
        let mut state = action_phase_state(4, true);
        state.start_early(T0).unwrap();
        state.toggle_pause(T0 + 10_000).unwrap();
        let paused = state.turn_timer.clone();
        state
            .record_action("player-3", ActionKind::Tactical, T0 + 12_000)
            .unwrap();

        state.undo(T0 + 13_000).unwrap();
        assert_eq!(state.turn_timer, paused);
    }

    #[test]
    fn test_undo_leaves_extensions_spent() {
        let mut state = action_phase_state(4, true);
        state.start_early(T0).unwrap();
        state
            .record_action("player-3", ActionKind::Tactical, T0)
            .unwrap();
        state.extend("player-3", T0).unwrap();
        let left = state.extensions_remaining("player-3");

        state.undo(T0).unwrap();
        assert_eq!(state.extensions_remaining("player-3"), left);
    }

    #[test]
    fn test_undo_on_empty_log_is_refused() {
        let mut state = action_phase_state(4, false);
        let before = state.clone();
        assert_eq!(state.undo(T0), Err(Refusal::NothingToUndo));
        assert_eq!(state, before);
    }

    #[test]
    fn test_undo_restores_snapshot_verbatim() {
        let mut state = action_phase_state(4, false);
        state.action_log.push(LogEntry {
            actor_id: "player-1".into(),
            actor_name: "Player 2".into(),
            kind: ActionKind::Pass,
            timestamp: T0,
            snapshot: Snapshot {
                current_turn_player_id: Some("player-1".into()),
                passed_players: OrderedSet::from(vec!["player-0".to_string()]),
                used_strategy_cards: OrderedSet::from(vec![
                    "player-0".to_string(),
                    "player-1".to_string(),
                ]),
                timer: None,
            },
        });
        state.undo(T0).unwrap();
        assert_eq!(state.current_turn_player_id.as_deref(), Some("player-1"));
        assert_eq!(state.passed_players.len(), 1);
        assert_eq!(state.used_strategy_cards.len(), 2);
        assert!(!state.turn_timer.is_active());
    }

    impl GameState {
        /// Take tactical turns with everybody until `player_id` holds the turn.
        fn finish_resolve_round_trip_to(&mut self, player_id: &str, now: Timestamp) {
            while self.current_turn_player_id.as_deref() != Some(player_id) {
                let current = self.current_turn_player_id.clone().unwrap();
                self.record_action(&current, ActionKind::Tactical, now).unwrap();
                self.finish_resolve(now).unwrap();
            }
        }
    }
}
