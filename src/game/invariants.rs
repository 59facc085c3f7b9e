// Session invariants, checked by the simulator and the property tests.

use std::collections::HashSet;

use crate::enums::Phase;

use super::types::GameState;

impl GameState {
    /// Every invariant the current state breaks, described for a human.
    pub fn violations(&self) -> Vec<String> {
        let mut found = Vec::new();
        let roster: HashSet<&str> = self.players.iter().map(|p| p.id.as_str()).collect();

        if !self.players.is_empty() {
            let speakers = self.players.iter().filter(|p| p.is_speaker).count();
            if speakers != 1 {
                found.push(format!("{} speakers", speakers));
            }
        }
        if self.round == 0 {
            found.push("round 0".to_string());
        }
        for player in &self.players {
            if player.vp > self.max_vp {
                found.push(format!("{} has {} VP over {}", player.id, player.vp, self.max_vp));
            }
        }

        let mut cards = HashSet::new();
        for claim in self.players.iter().filter_map(|p| p.strategy_card) {
            if !cards.insert(claim.id) {
                found.push(format!("strategy card {} claimed twice", claim.id));
            }
        }

        for id in self.passed_players.iter() {
            if !roster.contains(id.as_str()) {
                found.push(format!("passed player {} is not seated", id));
            }
        }
        for id in self.used_strategy_cards.iter() {
            let carded = self
                .player(id)
                .is_some_and(|p| p.strategy_card.is_some());
            if !carded {
                found.push(format!("{} used a strategy card it does not hold", id));
            }
        }
        if let Some(current) = self.current_turn_player_id.as_deref() {
            if !roster.contains(current) {
                found.push(format!("current player {} is not seated", current));
            }
            if self.phase == Phase::Action && self.passed_players.contains(current) {
                found.push(format!("current player {} already passed", current));
            }
        }

        if self.turn_timer.is_active() && (self.phase != Phase::Action || !self.time_limit_mode) {
            found.push(format!(
                "turn timer {:?} outside a timed action phase",
                self.turn_timer.phase
            ));
        }
        if let Some(winner) = self.winner.as_deref() {
            if self.player(winner).map_or(true, |p| p.vp < self.max_vp) {
                found.push(format!("winner {} is below the threshold", winner));
            }
        }
        found
    }
}
