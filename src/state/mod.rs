// Read-side projections of the session state.
mod command_application;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::enums::{Phase, TimerPhase};
use crate::game::{potential_winners, turn_order, GameState, Player, PlayerId};

/// Everything a client renders that is derived rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub round: u32,
    pub player_order: Vec<PlayerId>,
    pub acting_player_id: Option<PlayerId>,
    pub current_picker_id: Option<PlayerId>,
    pub resolving: bool,
    pub potential_winners: Vec<PlayerId>,
    pub elapsed_ms: u64,
    pub timer_phase: Option<TimerPhase>,
    pub timer_remaining_ms: u64,
    pub times_up: bool,
    pub current_extensions: Option<u32>,
    pub finished: bool,
}

impl SessionView {
    pub fn of(state: &GameState, now: Timestamp) -> Self {
        let ids = |players: Vec<&Player>| {
            players.into_iter().map(|p| p.id.clone()).collect::<Vec<_>>()
        };
        let acting_player_id = match state.phase {
            Phase::Action => state.acting_player_id().map(str::to_string),
            _ => None,
        };
        let current_picker_id = match state.phase {
            Phase::Strategy => turn_order::current_picker(&state.players).map(|p| p.id.clone()),
            _ => None,
        };
        let timer_remaining_ms = state.turn_timer.remaining_at(now);

        Self {
            phase: state.phase,
            round: state.round,
            player_order: ids(turn_order::display_order(state.phase, &state.players)),
            current_extensions: acting_player_id
                .as_deref()
                .map(|id| state.extensions_remaining(id)),
            acting_player_id,
            current_picker_id,
            resolving: state.phase == Phase::Action && state.is_resolving(),
            potential_winners: ids(potential_winners(state)),
            elapsed_ms: state.elapsed.elapsed_at(now),
            timer_phase: state.turn_timer.phase,
            timer_remaining_ms,
            times_up: state.turn_timer.phase.is_some() && timer_remaining_ms == 0,
            finished: state.is_finished(),
        }
    }
}
