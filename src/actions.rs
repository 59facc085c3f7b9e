use serde::{Deserialize, Serialize};

use crate::enums::{ActionKind, Expansion, Phase, TimerPhase};
use crate::errors::Refusal;
use crate::game::PlayerId;

/// Everything the presentation layer can ask of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    // Setup
    InitializePlayers { count: u8 },
    RenamePlayer { player_id: PlayerId, name: String },
    SelectFaction {
        player_id: PlayerId,
        #[serde(default)]
        faction_id: Option<String>,
    },
    AdjustVp { player_id: PlayerId, delta: i32 },
    SetSpeaker { player_id: PlayerId },
    SetMaxVp { max_vp: u32 },
    ToggleExpansion { expansion: Expansion },
    ToggleTimeLimitMode,
    ToggleAlarm,
    ToggleElapsedClock,

    // Phases
    SelectStrategyCard { player_id: PlayerId, card_id: u8 },
    AdvancePhase,
    NavigateBackward { target: Phase },

    // Action ledger
    RecordAction { player_id: PlayerId, kind: ActionKind },
    RecordPass { player_id: PlayerId },
    Undo,

    // Turn timer
    TogglePause,
    Extend { player_id: PlayerId },
    StartEarly,
    FinishResolve,

    // Session
    ConfirmVictory { player_id: PlayerId },
    ResetSession,
}

impl Command {
    /// Commands still honoured once a winner is confirmed.
    pub fn allowed_after_victory(&self) -> bool {
        matches!(self, Command::ResetSession | Command::ToggleAlarm)
    }
}

/// Events that occur as a result of commands and timer expiries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    PhaseChanged { from: Phase, to: Phase },
    RoundStarted { round: u32 },

    ActionRecorded { actor_id: PlayerId, kind: ActionKind },
    PlayerPassed { player_id: PlayerId },
    AllPlayersPassed,
    TurnChanged { current: Option<PlayerId> },
    ActionUndone { actor_id: PlayerId, kind: ActionKind },

    TimerStarted { phase: TimerPhase },
    TimerExpired { phase: TimerPhase },
    TimerCleared,
    TimerToggled { running: bool },
    ExtensionUsed {
        player_id: PlayerId,
        extensions_remaining: u32,
    },

    PlayersInitialized { count: u8 },
    PlayerUpdated { player_id: PlayerId },
    StrategyCardSelected { player_id: PlayerId, card_id: u8 },
    SettingsChanged,
    ElapsedClockToggled { running: bool },

    VictoryConfirmed { player_id: PlayerId },
    SessionReset,
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CommandOutcome {
    Applied { events: Vec<GameEvent> },
    Refused { refusal: Refusal },
}

impl CommandOutcome {
    pub fn applied(events: Vec<GameEvent>) -> Self {
        Self::Applied { events }
    }

    pub fn refused(refusal: Refusal) -> Self {
        Self::Refused { refusal }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn events(&self) -> &[GameEvent] {
        match self {
            Self::Applied { events } => events,
            Self::Refused { .. } => &[],
        }
    }

    pub fn refusal(&self) -> Option<&Refusal> {
        match self {
            Self::Applied { .. } => None,
            Self::Refused { refusal } => Some(refusal),
        }
    }
}
