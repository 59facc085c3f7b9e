// Seating, factions, scores and session settings.

use crate::actions::GameEvent;
use crate::catalog;
use crate::clock::Timestamp;
use crate::enums::{Expansion, Phase, TimerPhase};
use crate::errors::{CommandResult, Refusal};

use super::timer::EXTENSIONS_PER_PLAYER;
use super::turn_order;
use super::types::{GameState, Player, StrategyCardClaim};

pub const MIN_PLAYERS: u8 = 3;
pub const MAX_PLAYERS: u8 = 8;

impl GameState {
    /// Seat `count` fresh players; the first seat holds the speaker token.
    pub fn initialize_players(&mut self, count: u8) -> CommandResult<Vec<GameEvent>> {
        self.expect_phase(Phase::Setup)?;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(Refusal::InvalidPlayerCount {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }

        self.players = (0..count as usize)
            .map(|i| {
                let mut player = Player::new(
                    format!("player-{}", i),
                    format!("Player {}", i + 1),
                    catalog::PLAYER_COLORS[i],
                );
                player.is_speaker = i == 0;
                player
            })
            .collect();
        self.player_count = count;
        self.player_extensions = self
            .players
            .iter()
            .map(|p| (p.id.clone(), EXTENSIONS_PER_PLAYER))
            .collect();

        log::info!("🪑 Seated {} players", count);
        Ok(vec![GameEvent::PlayersInitialized { count }])
    }

    fn known_player(&self, player_id: &str) -> CommandResult<()> {
        if self.has_player(player_id) {
            Ok(())
        } else {
            Err(Refusal::unknown_player(player_id))
        }
    }

    fn player_updated(player_id: &str) -> Vec<GameEvent> {
        vec![GameEvent::PlayerUpdated {
            player_id: player_id.to_string(),
        }]
    }

    pub fn rename_player(&mut self, player_id: &str, name: &str) -> CommandResult<Vec<GameEvent>> {
        let player = self
            .player_mut(player_id)
            .ok_or_else(|| Refusal::unknown_player(player_id))?;
        player.name = name.trim().to_string();
        Ok(Self::player_updated(player_id))
    }

    /// Assign (or with `None`, release) a faction during setup.
    pub fn select_faction(
        &mut self,
        player_id: &str,
        faction_id: Option<&str>,
    ) -> CommandResult<Vec<GameEvent>> {
        self.expect_phase(Phase::Setup)?;
        self.known_player(player_id)?;

        if let Some(faction_id) = faction_id {
            let faction = catalog::find_faction(faction_id).ok_or_else(|| Refusal::UnknownFaction {
                faction_id: faction_id.to_string(),
            })?;
            let taken = self
                .players
                .iter()
                .any(|p| p.id != player_id && p.faction_id.as_deref() == Some(faction_id));
            if taken || !self.expansions.is_enabled(faction.expansion) {
                return Err(Refusal::FactionUnavailable {
                    faction_id: faction_id.to_string(),
                });
            }
        }

        if let Some(player) = self.player_mut(player_id) {
            player.faction_id = faction_id.map(str::to_string);
        }
        Ok(Self::player_updated(player_id))
    }

    /// Add `delta` victory points, clamped to `0..=max_vp`.
    pub fn adjust_vp(&mut self, player_id: &str, delta: i32) -> CommandResult<Vec<GameEvent>> {
        let max_vp = self.max_vp;
        let player = self
            .player_mut(player_id)
            .ok_or_else(|| Refusal::unknown_player(player_id))?;
        let vp = (i64::from(player.vp) + i64::from(delta)).clamp(0, i64::from(max_vp));
        player.vp = vp as u32;
        Ok(Self::player_updated(player_id))
    }

    pub fn set_speaker(&mut self, player_id: &str) -> CommandResult<Vec<GameEvent>> {
        self.known_player(player_id)?;
        for player in &mut self.players {
            player.is_speaker = player.id == player_id;
        }
        log::info!("🎙️ {} is now the speaker", player_id);
        Ok(Self::player_updated(player_id))
    }

    pub fn set_max_vp(&mut self, max_vp: u32) -> CommandResult<Vec<GameEvent>> {
        if max_vp == 0 {
            return Err(Refusal::InvalidThreshold);
        }
        self.max_vp = max_vp;
        for player in &mut self.players {
            player.vp = player.vp.min(max_vp);
        }
        Ok(vec![GameEvent::SettingsChanged])
    }

    pub fn toggle_expansion(&mut self, expansion: Expansion) -> CommandResult<Vec<GameEvent>> {
        self.expect_phase(Phase::Setup)?;
        self.expansions.toggle(expansion);
        Ok(vec![GameEvent::SettingsChanged])
    }

    /// Switching time-limit mode on mid-action starts the countdown that
    /// matches the turn state; switching it off drops the countdown.
    pub fn toggle_time_limit_mode(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        self.time_limit_mode = !self.time_limit_mode;
        let mut events = vec![GameEvent::SettingsChanged];

        if !self.time_limit_mode {
            if self.turn_timer.is_active() {
                events.push(GameEvent::TimerCleared);
            }
            self.turn_timer.clear();
        } else if self.phase == Phase::Action {
            let all_passed = turn_order::first_unpassed(&self.players, &self.passed_players).is_none();
            let phase = if all_passed {
                None
            } else if self.current_turn_player_id.is_some() {
                Some(TimerPhase::Initiate)
            } else {
                Some(TimerPhase::Prep)
            };
            if let Some(phase) = phase {
                self.turn_timer.start(phase, now);
                events.push(GameEvent::TimerStarted { phase });
            }
        }

        log::info!("⏱️ Time limit mode {}", if self.time_limit_mode { "on" } else { "off" });
        Ok(events)
    }

    pub fn toggle_alarm(&mut self) -> CommandResult<Vec<GameEvent>> {
        self.alarm_enabled = !self.alarm_enabled;
        Ok(vec![GameEvent::SettingsChanged])
    }

    pub fn toggle_elapsed_clock(&mut self, now: Timestamp) -> CommandResult<Vec<GameEvent>> {
        self.elapsed.toggle(now);
        Ok(vec![GameEvent::ElapsedClockToggled {
            running: self.elapsed.running,
        }])
    }

    /// Claim a strategy card for the player whose pick it is.
    pub fn select_strategy_card(
        &mut self,
        player_id: &str,
        card_id: u8,
    ) -> CommandResult<Vec<GameEvent>> {
        self.expect_phase(Phase::Strategy)?;
        self.known_player(player_id)?;
        let card = catalog::find_strategy_card(card_id)
            .ok_or(Refusal::UnknownStrategyCard { card_id })?;

        match turn_order::current_picker(&self.players) {
            Some(picker) if picker.id == player_id => {}
            _ => {
                return Err(Refusal::NotPlayersPick {
                    player_id: player_id.to_string(),
                })
            }
        }
        if self
            .players
            .iter()
            .any(|p| p.strategy_card.is_some_and(|c| c.id == card_id))
        {
            return Err(Refusal::StrategyCardTaken { card_id });
        }

        if let Some(player) = self.player_mut(player_id) {
            player.strategy_card = Some(StrategyCardClaim {
                id: card.id,
                initiative: card.initiative,
            });
        }
        log::info!("🃏 {} picked {}", player_id, card.name);
        Ok(vec![GameEvent::StrategyCardSelected {
            player_id: player_id.to_string(),
            card_id,
        }])
    }
}
