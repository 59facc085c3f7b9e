use crate::actions::{Command, CommandOutcome, GameEvent};
use crate::clock::Timestamp;
use crate::errors::{CommandResult, Refusal};
use crate::game::GameState;

impl GameState {
    /// Apply one command at `now`.
    ///
    /// The command runs against a settled copy which only replaces `self`
    /// when it is accepted, so a refused command leaves the state exactly as
    /// it was. Countdown expiries are never fired here; see [`GameState::tick`].
    pub fn apply_command(&mut self, command: &Command, now: Timestamp) -> CommandOutcome {
        let mut next = self.clone();
        next.settle(now);
        match next.dispatch(command, now) {
            Ok(events) => {
                *self = next;
                CommandOutcome::applied(events)
            }
            Err(refusal) => {
                log::debug!("🚫 Refused {:?}: {}", command, refusal);
                CommandOutcome::refused(refusal)
            }
        }
    }

    fn dispatch(&mut self, command: &Command, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        if self.is_finished() && !command.allowed_after_victory() {
            return Err(Refusal::SessionOver);
        }

        match command {
            Command::InitializePlayers { count } => self.initialize_players(*count),
            Command::RenamePlayer { player_id, name } => self.rename_player(player_id, name),
            Command::SelectFaction {
                player_id,
                faction_id,
            } => self.select_faction(player_id, faction_id.as_deref()),
            Command::AdjustVp { player_id, delta } => self.adjust_vp(player_id, *delta),
            Command::SetSpeaker { player_id } => self.set_speaker(player_id),
            Command::SetMaxVp { max_vp } => self.set_max_vp(*max_vp),
            Command::ToggleExpansion { expansion } => self.toggle_expansion(*expansion),
            Command::ToggleTimeLimitMode => self.toggle_time_limit_mode(now),
            Command::ToggleAlarm => self.toggle_alarm(),
            Command::ToggleElapsedClock => self.toggle_elapsed_clock(now),

            Command::SelectStrategyCard { player_id, card_id } => {
                self.select_strategy_card(player_id, *card_id)
            }
            Command::AdvancePhase => self.advance(now),
            Command::NavigateBackward { target } => self.navigate_backward(*target, now),

            Command::RecordAction { player_id, kind } => self.record_action(player_id, *kind, now),
            Command::RecordPass { player_id } => self.record_pass(player_id, now),
            Command::Undo => self.undo(now),

            Command::TogglePause => self.toggle_pause(now),
            Command::Extend { player_id } => self.extend(player_id, now),
            Command::StartEarly => self.start_early(now),
            Command::FinishResolve => self.finish_resolve(now),

            Command::ConfirmVictory { player_id } => self.confirm_victory(player_id, now),
            Command::ResetSession => {
                log::info!("🧹 Session reset");
                *self = GameState::default();
                Ok(vec![GameEvent::SessionReset])
            }
        }
    }
}
