// Session companion library - core module organization
//
// The rules live in `game` (one explicit `GameState` plus its transitions)
// and `state` (command dispatch and derived views). Everything else is
// infrastructure around a single local session.

// Core session data structures and enums
pub mod catalog;
pub mod clock;
pub mod enums;
pub mod game;
pub mod ordered_set;
pub mod state;

// Commands, events and errors
pub mod actions;
pub mod errors;

// Server implementation
pub mod alert;
pub mod application;
pub mod config;
pub mod persistence;
pub mod websocket_service;

// Re-export common types for convenient access
pub use crate::actions::{Command, CommandOutcome, GameEvent};
pub use crate::application::SessionService;
pub use crate::enums::{ActionKind, Phase, TimerPhase};
pub use crate::errors::{CompanionError, CompanionResult, Refusal};
pub use crate::game::{reduce, GameState, Player, PlayerId};
pub use crate::state::SessionView;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
