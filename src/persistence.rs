// Persisted session blob.
//
// The whole `GameState` is stored as one camelCase JSON document. Loading
// merges whatever was stored key-by-key over the default state, so blobs
// written by older builds (or hand-edited ones) still load; anything that
// cannot be read at all yields a fresh session.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::clock::Timestamp;
use crate::enums::Phase;
use crate::errors::{PersistenceError, PersistenceResult};
use crate::game::{GameState, DEFAULT_MAX_VP};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored blob, or `None` when nothing has been saved yet.
    async fn load(&self) -> PersistenceResult<Option<String>>;

    async fn save(&self, blob: &str) -> PersistenceResult<()>;
}

/// Stores the blob in a single JSON file, replaced atomically on save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn load(&self) -> PersistenceResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::read(self.display_path(), e)),
        }
    }

    async fn save(&self, blob: &str) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::write(self.display_path(), e))?;
        }
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, blob)
            .await
            .map_err(|e| PersistenceError::write(staging.display().to_string(), e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| PersistenceError::write(self.display_path(), e))
    }
}

/// Keeps the blob in memory; used with `--no-persist` and in tests.
#[derive(Default)]
pub struct MemoryStore {
    blob: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> PersistenceResult<Option<String>> {
        Ok(self.blob.read().await.clone())
    }

    async fn save(&self, blob: &str) -> PersistenceResult<()> {
        *self.blob.write().await = Some(blob.to_string());
        Ok(())
    }
}

pub fn encode(state: &GameState) -> PersistenceResult<String> {
    serde_json::to_string(state).map_err(|e| PersistenceError::Serialization {
        details: e.to_string(),
    })
}

/// Overlay a stored blob on the default state. Stored `null`s only replace
/// fields whose default is itself `null`.
pub fn merge_with_defaults(blob: &str) -> GameState {
    let stored = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(stored)) => stored,
        Ok(_) => {
            log::warn!("⚠️ Stored session is not a JSON object, starting fresh");
            return GameState::default();
        }
        Err(e) => {
            log::warn!("⚠️ Stored session is malformed ({}), starting fresh", e);
            return GameState::default();
        }
    };
    let mut merged = match serde_json::to_value(GameState::default()) {
        Ok(Value::Object(defaults)) => defaults,
        _ => Map::new(),
    };

    for (key, value) in stored {
        let keeps_default = value.is_null() && merged.get(&key).is_some_and(|d| !d.is_null());
        if !keeps_default {
            merged.insert(key, value);
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
        log::warn!("⚠️ Stored session does not fit the current layout ({}), starting fresh", e);
        GameState::default()
    })
}

/// Repair a freshly loaded state so it satisfies the session invariants, and
/// restart any running clock from `now`.
pub fn normalize(mut state: GameState, now: Timestamp) -> GameState {
    if state.round == 0 {
        state.round = 1;
    }
    if state.max_vp == 0 {
        state.max_vp = DEFAULT_MAX_VP;
    }
    let max_vp = state.max_vp;
    for player in &mut state.players {
        player.vp = player.vp.min(max_vp);
    }

    if !state.players.is_empty() && state.players.iter().filter(|p| p.is_speaker).count() != 1 {
        let speaker = state.players.iter().position(|p| p.is_speaker).unwrap_or(0);
        for (i, player) in state.players.iter_mut().enumerate() {
            player.is_speaker = i == speaker;
        }
    }

    let roster: HashSet<String> = state.players.iter().map(|p| p.id.clone()).collect();
    state.passed_players.retain(|id| roster.contains(id));
    state.used_strategy_cards.retain(|id| roster.contains(id));
    state.player_extensions.retain(|id, _| roster.contains(id));
    if state
        .current_turn_player_id
        .as_ref()
        .is_some_and(|id| !roster.contains(id))
    {
        state.current_turn_player_id = None;
    }

    let winner_stands = state
        .winner
        .as_deref()
        .and_then(|id| state.player(id))
        .is_some_and(|p| p.vp >= max_vp);
    if !winner_stands {
        state.winner = None;
    }

    if state.phase != Phase::Action {
        state.turn_timer.clear();
    }
    state.elapsed.resumed_at = state.elapsed.running.then_some(now);
    state.turn_timer.resumed_at = state.turn_timer.running.then_some(now);
    state
}

/// Read the stored session, falling back to a fresh one on any failure.
pub async fn load_state(store: &dyn SessionStore, now: Timestamp) -> GameState {
    match store.load().await {
        Ok(Some(blob)) => normalize(merge_with_defaults(&blob), now),
        Ok(None) => GameState::default(),
        Err(e) => {
            log::warn!("⚠️ {}, starting fresh", e);
            GameState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::TimerPhase;
    use crate::game::test_support::{action_phase_state, T0};
    use crate::game::timer::INITIATE_MS;

    #[test]
    fn test_merge_keeps_defaults_for_missing_keys() {
        let state = merge_with_defaults(r#"{"round": 3, "maxVP": 14, "winner": null}"#);
        assert_eq!(state.round, 3);
        assert_eq!(state.max_vp, 14);
        assert_eq!(state.phase, Phase::Setup);
        assert!(state.alarm_enabled);
        assert!(state.expansions.pok);
    }

    #[test]
    fn test_merge_ignores_null_for_required_fields() {
        let state = merge_with_defaults(r#"{"round": null, "phase": "status"}"#);
        assert_eq!(state.round, 1);
        assert_eq!(state.phase, Phase::Status);
    }

    #[test]
    fn test_malformed_blob_yields_default() {
        assert_eq!(merge_with_defaults("{not json"), GameState::default());
        assert_eq!(merge_with_defaults("[1, 2]"), GameState::default());
        assert_eq!(
            merge_with_defaults(r#"{"phase": "drafting"}"#),
            GameState::default()
        );
    }

    #[test]
    fn test_round_trip_through_blob() {
        let mut state = action_phase_state(5, true);
        state.start_early(T0).unwrap();
        let blob = encode(&state).unwrap();

        let json: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(json["turnTimerPhase"], "initiate");
        assert_eq!(json["turnTimerRemaining"], INITIATE_MS);
        assert_eq!(json["maxVP"], 10);
        assert!(json.get("resumedAt").is_none());

        let loaded = normalize(merge_with_defaults(&blob), T0);
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_normalize_repairs_stale_references() {
        let mut state = action_phase_state(3, false);
        state.passed_players.insert("player-7".into());
        state.used_strategy_cards.insert("ghost".into());
        state.player_extensions.insert("ghost".into(), 6);
        state.current_turn_player_id = Some("ghost".into());
        state.winner = Some("player-1".into());
        state.players[2].vp = 99;
        state.players[1].is_speaker = true;

        let state = normalize(state, T0);

        assert!(state.passed_players.is_empty());
        assert!(state.used_strategy_cards.is_empty());
        assert!(!state.player_extensions.contains_key("ghost"));
        assert_eq!(state.current_turn_player_id, None);
        assert_eq!(state.winner, None);
        assert_eq!(state.players[2].vp, state.max_vp);
        assert_eq!(state.players.iter().filter(|p| p.is_speaker).count(), 1);
        assert!(state.players[0].is_speaker);
    }

    #[test]
    fn test_normalize_drops_timer_outside_action_phase() {
        let mut state = action_phase_state(3, true);
        state.phase = Phase::Agenda;
        let state = normalize(state, T0);
        assert_eq!(state.turn_timer.phase, None::<TimerPhase>);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("session.json"));
        assert_eq!(store.load().await.unwrap(), None);

        store.save(r#"{"round":2}"#).await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some(r#"{"round":2}"#));

        let state = load_state(&store, T0).await;
        assert_eq!(state.round, 2);
    }

    #[tokio::test]
    async fn test_memory_store_loads_garbage_as_default() {
        let store = MemoryStore::with_blob("garbage");
        assert_eq!(load_state(&store, T0).await, GameState::default());
    }
}
