use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clock::{whole_steps, Timestamp};
use crate::enums::{ActionKind, Expansions, Phase, TimerPhase};
use crate::ordered_set::OrderedSet;

use super::timer::TurnTimer;

/// Unique identifier for players
pub type PlayerId = String;

pub const DEFAULT_PLAYER_COUNT: u8 = 6;
pub const DEFAULT_MAX_VP: u32 = 10;
/// Resolution of the session (elapsed) clock.
pub const ELAPSED_RESOLUTION_MS: u64 = 1_000;

/// The strategy card a player claimed this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCardClaim {
    pub id: u8,
    pub initiative: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub faction_id: Option<String>,
    #[serde(default)]
    pub vp: u32,
    #[serde(default)]
    pub strategy_card: Option<StrategyCardClaim>,
    #[serde(default)]
    pub is_speaker: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            faction_id: None,
            vp: 0,
            strategy_card: None,
            is_speaker: false,
        }
    }
}

/// Turn-timer fields as captured by a ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Option<TimerPhase>,
    pub remaining_ms: u64,
    pub running: bool,
}

/// Control fields captured immediately before a ledger entry's mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current_turn_player_id: Option<PlayerId>,
    pub passed_players: OrderedSet<PlayerId>,
    pub used_strategy_cards: OrderedSet<PlayerId>,
    /// Absent in entries written before turn timing was tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub actor_id: PlayerId,
    #[serde(default)]
    pub actor_name: String,
    pub kind: ActionKind,
    pub timestamp: Timestamp,
    pub snapshot: Snapshot,
}

/// Session up-counter with one-second resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElapsedClock {
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    #[serde(rename = "elapsedRunning")]
    pub running: bool,
    #[serde(skip)]
    pub resumed_at: Option<Timestamp>,
}

impl ElapsedClock {
    /// Fold whole elapsed seconds since the last baseline into `elapsed_ms`.
    pub fn settle(&mut self, now: Timestamp) {
        if !self.running {
            return;
        }
        match self.resumed_at {
            Some(since) => {
                let consumed = whole_steps(since, now, ELAPSED_RESOLUTION_MS);
                self.elapsed_ms += consumed;
                self.resumed_at = Some(since + consumed);
            }
            None => self.resumed_at = Some(now),
        }
    }

    pub fn toggle(&mut self, now: Timestamp) {
        self.settle(now);
        if self.running {
            self.stop(now);
        } else {
            self.running = true;
            self.resumed_at = Some(now);
        }
    }

    pub fn stop(&mut self, now: Timestamp) {
        self.settle(now);
        self.running = false;
        self.resumed_at = None;
    }

    /// Elapsed time as of `now`, without mutating the baseline.
    pub fn elapsed_at(&self, now: Timestamp) -> u64 {
        match (self.running, self.resumed_at) {
            (true, Some(since)) => self.elapsed_ms + whole_steps(since, now, ELAPSED_RESOLUTION_MS),
            _ => self.elapsed_ms,
        }
    }
}

/// The whole session. Mutated only through the command set; serialized as
/// the persisted blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub phase: Phase,
    pub player_count: u8,
    pub players: Vec<Player>,
    pub round: u32,
    #[serde(rename = "maxVP")]
    pub max_vp: u32,
    pub expansions: Expansions,
    pub current_turn_player_id: Option<PlayerId>,
    pub passed_players: OrderedSet<PlayerId>,
    pub used_strategy_cards: OrderedSet<PlayerId>,
    #[serde(flatten)]
    pub elapsed: ElapsedClock,
    pub action_log: Vec<LogEntry>,
    pub winner: Option<PlayerId>,
    pub time_limit_mode: bool,
    #[serde(flatten)]
    pub turn_timer: TurnTimer,
    pub player_extensions: BTreeMap<PlayerId, u32>,
    pub alarm_enabled: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: Phase::Setup,
            player_count: DEFAULT_PLAYER_COUNT,
            players: Vec::new(),
            round: 1,
            max_vp: DEFAULT_MAX_VP,
            expansions: Expansions::default(),
            current_turn_player_id: None,
            passed_players: OrderedSet::new(),
            used_strategy_cards: OrderedSet::new(),
            elapsed: ElapsedClock::default(),
            action_log: Vec::new(),
            winner: None,
            time_limit_mode: false,
            turn_timer: TurnTimer::default(),
            player_extensions: BTreeMap::new(),
            alarm_enabled: true,
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    pub fn speaker(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_speaker)
    }

    pub fn extensions_remaining(&self, player_id: &str) -> u32 {
        self.player_extensions.get(player_id).copied().unwrap_or(0)
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Capture the control fields the ledger restores on undo.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_turn_player_id: self.current_turn_player_id.clone(),
            passed_players: self.passed_players.clone(),
            used_strategy_cards: self.used_strategy_cards.clone(),
            timer: Some(self.turn_timer.snapshot()),
        }
    }

    /// Bring both clocks up to `now` without firing any expiry.
    pub fn settle(&mut self, now: Timestamp) {
        self.elapsed.settle(now);
        self.turn_timer.settle(now);
    }
}
