use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::{ActionKind, Phase, TimerPhase};

/// Top-level error type for the session companion.
///
/// Game commands never produce one of these: an invalid command is refused
/// with a [`Refusal`] and leaves the state untouched. Errors are reserved for
/// the infrastructure around the core (storage, sockets, configuration).
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CompanionError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage errors (state blob read/write)
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PersistenceError {
    #[error("Failed to read {path}: {details}")]
    Read { path: String, details: String },

    #[error("Failed to write {path}: {details}")]
    Write { path: String, details: String },

    #[error("State serialization failed: {details}")]
    Serialization { details: String },
}

/// Network/WebSocket errors
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum NetworkError {
    #[error("Message serialization failed: {details}")]
    SerializationFailed { details: String },

    #[error("Message deserialization failed: {details}")]
    DeserializationFailed { details: String },

    #[error("Connection closed unexpectedly: {details}")]
    ConnectionClosed { details: String },

    #[error("Failed to bind {addr}: {details}")]
    Bind { addr: String, details: String },
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {details}")]
    InvalidValue { field: String, details: String },
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AlertError {
    #[error("No alert listeners")]
    NoListeners,
}

/// Why a command was refused. A refusal is a well-defined no-op, not a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Refusal {
    #[error("command not available in the {phase} phase")]
    WrongPhase { phase: Phase },

    #[error("the session is over")]
    SessionOver,

    #[error("unknown player {player_id}")]
    UnknownPlayer { player_id: String },

    #[error("it is not {player_id}'s turn")]
    NotPlayersTurn { player_id: String },

    #[error("{player_id} has not used their strategic action")]
    StrategyNotUsed { player_id: String },

    #[error("{player_id} already used their strategic action")]
    StrategyAlreadyUsed { player_id: String },

    #[error("{player_id} holds no strategy card")]
    NoStrategyCard { player_id: String },

    #[error("{player_id} has already passed")]
    AlreadyPassed { player_id: String },

    #[error("{kind:?} cannot be recorded as an action")]
    NotAnAction { kind: ActionKind },

    #[error("the current action is still resolving")]
    StillResolving,

    #[error("no action is resolving")]
    NotResolving,

    #[error("no action to undo")]
    NothingToUndo,

    #[error("turn timer is {actual:?}, expected {expected}")]
    WrongTimerPhase {
        expected: TimerPhase,
        actual: Option<TimerPhase>,
    },

    #[error("turn timer is not active")]
    TimerInactive,

    #[error("{player_id} has no extensions left")]
    NoExtensionsLeft { player_id: String },

    #[error("there is no current player")]
    NoCurrentPlayer,

    #[error("{phase} is not earlier than the current phase")]
    NotEarlierPhase { phase: Phase },

    #[error("every player must choose a faction first")]
    FactionsMissing,

    #[error("no players have been seated")]
    EmptyRoster,

    #[error("strategy cards are still being picked")]
    PicksIncomplete,

    #[error("it is not {player_id}'s pick")]
    NotPlayersPick { player_id: String },

    #[error("unknown faction {faction_id}")]
    UnknownFaction { faction_id: String },

    #[error("faction {faction_id} is unavailable")]
    FactionUnavailable { faction_id: String },

    #[error("unknown strategy card {card_id}")]
    UnknownStrategyCard { card_id: u8 },

    #[error("strategy card {card_id} is already taken")]
    StrategyCardTaken { card_id: u8 },

    #[error("player count must be between {min} and {max}")]
    InvalidPlayerCount { min: u8, max: u8 },

    #[error("victory threshold must be at least 1")]
    InvalidThreshold,

    #[error("{player_id} has not reached the victory threshold")]
    NotAPotentialWinner { player_id: String },
}

/// Result type aliases for convenience
pub type CompanionResult<T> = Result<T, CompanionError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;
pub type CommandResult<T> = Result<T, Refusal>;

impl PersistenceError {
    pub fn read(path: impl Into<String>, details: impl ToString) -> Self {
        Self::Read {
            path: path.into(),
            details: details.to_string(),
        }
    }

    pub fn write(path: impl Into<String>, details: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            details: details.to_string(),
        }
    }
}

impl NetworkError {
    pub fn serialization_failed(details: impl Into<String>) -> Self {
        Self::SerializationFailed {
            details: details.into(),
        }
    }

    pub fn deserialization_failed(details: impl Into<String>) -> Self {
        Self::DeserializationFailed {
            details: details.into(),
        }
    }
}

impl Refusal {
    pub fn unknown_player(player_id: impl Into<String>) -> Self {
        Self::UnknownPlayer {
            player_id: player_id.into(),
        }
    }

    pub fn not_players_turn(player_id: impl Into<String>) -> Self {
        Self::NotPlayersTurn {
            player_id: player_id.into(),
        }
    }
}

impl From<String> for CompanionError {
    fn from(msg: String) -> Self {
        CompanionError::Internal(msg)
    }
}

impl From<&str> for CompanionError {
    fn from(msg: &str) -> Self {
        CompanionError::Internal(msg.to_string())
    }
}
