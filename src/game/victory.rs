// Victory threshold detection. Reaching the threshold only makes a player a
// candidate; the session ends when the table confirms a winner.

use crate::actions::GameEvent;
use crate::clock::Timestamp;
use crate::errors::{CommandResult, Refusal};

use super::types::{GameState, Player};

/// Players at or above the victory threshold, in seating order.
pub fn potential_winners(state: &GameState) -> Vec<&Player> {
    state
        .players
        .iter()
        .filter(|p| p.vp >= state.max_vp)
        .collect()
}

impl GameState {
    pub fn confirm_victory(
        &mut self,
        player_id: &str,
        now: Timestamp,
    ) -> CommandResult<Vec<GameEvent>> {
        let vp = self
            .player(player_id)
            .ok_or_else(|| Refusal::unknown_player(player_id))?
            .vp;
        if vp < self.max_vp {
            return Err(Refusal::NotAPotentialWinner {
                player_id: player_id.to_string(),
            });
        }

        self.winner = Some(player_id.to_string());
        self.elapsed.stop(now);
        self.turn_timer.pause(now);

        log::info!("🏆 {} wins in round {} with {} VP", player_id, self.round, vp);
        Ok(vec![GameEvent::VictoryConfirmed {
            player_id: player_id.to_string(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::{action_phase_state, T0};

    #[test]
    fn test_potential_winners_at_threshold() {
        let mut state = action_phase_state(4, false);
        state.max_vp = 10;
        state.players[0].vp = 9;
        state.players[1].vp = 10;
        state.players[3].vp = 10;

        let ids: Vec<_> = potential_winners(&state)
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["player-1", "player-3"]);
        assert!(!state.is_finished());
    }

    #[test]
    fn test_confirm_victory_stops_clocks() {
        let mut state = action_phase_state(4, true);
        state.elapsed.toggle(T0);
        state.players[2].vp = state.max_vp;

        state.confirm_victory("player-2", T0 + 4_500).unwrap();

        assert_eq!(state.winner.as_deref(), Some("player-2"));
        assert!(!state.elapsed.running);
        assert_eq!(state.elapsed.elapsed_ms, 4_000);
        assert!(!state.turn_timer.running);
        assert!(state.is_finished());
    }

    #[test]
    fn test_confirm_victory_requires_threshold() {
        let mut state = action_phase_state(4, false);
        state.players[2].vp = state.max_vp - 1;
        let before = state.clone();
        assert_eq!(
            state.confirm_victory("player-2", T0),
            Err(Refusal::NotAPotentialWinner {
                player_id: "player-2".into()
            })
        );
        assert_eq!(
            state.confirm_victory("nobody", T0),
            Err(Refusal::unknown_player("nobody"))
        );
        assert_eq!(state, before);
    }
}
