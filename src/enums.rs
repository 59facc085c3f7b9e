use serde::{Deserialize, Serialize};
use std::fmt;

/// Session phases in round order. `Setup` is only ever visited once; after
/// `Results` the session wraps straight into the next round's `Strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Setup,
    Strategy,
    Action,
    Status,
    Agenda,
    Results,
}

/// Phases reachable through backward navigation, in round order.
pub const NAVIGABLE_PHASES: [Phase; 4] = [Phase::Strategy, Phase::Action, Phase::Status, Phase::Agenda];

impl Phase {
    /// Canonical successor. `Results` wraps to `Strategy` of the next round.
    pub fn next(self) -> Phase {
        match self {
            Phase::Setup => Phase::Strategy,
            Phase::Strategy => Phase::Action,
            Phase::Action => Phase::Status,
            Phase::Status => Phase::Agenda,
            Phase::Agenda => Phase::Results,
            Phase::Results => Phase::Strategy,
        }
    }

    /// Position within [`NAVIGABLE_PHASES`], if any.
    pub fn navigable_index(self) -> Option<usize> {
        NAVIGABLE_PHASES.iter().position(|p| *p == self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Strategy => "strategy",
            Phase::Action => "action",
            Phase::Status => "status",
            Phase::Agenda => "agenda",
            Phase::Results => "results",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Prep,
    Initiate,
    Resolve,
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerPhase::Prep => write!(f, "prep"),
            TimerPhase::Initiate => write!(f, "initiate"),
            TimerPhase::Resolve => write!(f, "resolve"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Tactical,
    Strategic,
    Pass,
    TacticalAuto,
}

impl ActionKind {
    /// Actions that open a resolution window for the actor.
    pub fn is_action(self) -> bool {
        !matches!(self, ActionKind::Pass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expansion {
    Base,
    Pok,
    Codex,
    ThundersEdge,
}

pub const EXPANSIONS: [Expansion; 4] = [
    Expansion::Base,
    Expansion::Pok,
    Expansion::Codex,
    Expansion::ThundersEdge,
];

/// Which expansions' factions are on offer during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expansions {
    pub base: bool,
    pub pok: bool,
    pub codex: bool,
    pub thunders_edge: bool,
}

impl Default for Expansions {
    fn default() -> Self {
        Self {
            base: true,
            pok: true,
            codex: true,
            thunders_edge: true,
        }
    }
}

impl Expansions {
    pub fn is_enabled(&self, expansion: Expansion) -> bool {
        match expansion {
            Expansion::Base => self.base,
            Expansion::Pok => self.pok,
            Expansion::Codex => self.codex,
            Expansion::ThundersEdge => self.thunders_edge,
        }
    }

    pub fn toggle(&mut self, expansion: Expansion) {
        let flag = match expansion {
            Expansion::Base => &mut self.base,
            Expansion::Pok => &mut self.pok,
            Expansion::Codex => &mut self.codex,
            Expansion::ThundersEdge => &mut self.thunders_edge,
        };
        *flag = !*flag;
    }
}
