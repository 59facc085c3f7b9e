// src/game/mod.rs
mod types;
pub mod invariants;
pub mod ledger;
pub mod phase;
pub mod roster;
pub mod timer;
pub mod turn_order;
pub mod victory;

pub use types::*;
pub use victory::potential_winners;

use crate::actions::{Command, CommandOutcome};
use crate::clock::Timestamp;

/// Apply `command` to an owned state and hand back the successor.
pub fn reduce(mut state: GameState, command: &Command, now: Timestamp) -> (GameState, CommandOutcome) {
    let outcome = state.apply_command(command, now);
    (state, outcome)
}
