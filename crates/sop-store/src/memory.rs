//! In-memory [`StateRepository`] implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};

use sop_core::{GameId, GameState, LogEntry};

use crate::error::{StoreError, StoreResult};
use crate::record::GameRecord;
use crate::traits::{GameLock, StateRepository};

/// Games currently claimed through [`StateRepository::lock_game`].
#[derive(Debug, Default)]
struct Claims {
    held: Mutex<HashSet<GameId>>,
    released: Condvar,
}

/// Releases one claim on drop.
struct Claim {
    claims: Arc<Claims>,
    game_id: GameId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut held = self.claims.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.game_id);
        self.claims.released.notify_all();
    }
}

/// In-memory implementation of [`StateRepository`].
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<GameId, GameRecord>>,
    claims: Arc<Claims>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateRepository for InMemoryRepository {
    fn lock_game(&self, game_id: &GameId) -> StoreResult<GameLock> {
        let mut held = self.claims.held.lock().map_err(|_| StoreError::LockPoisoned)?;
        while held.contains(game_id) {
            held = self
                .claims
                .released
                .wait(held)
                .map_err(|_| StoreError::LockPoisoned)?;
        }
        held.insert(game_id.clone());
        Ok(GameLock::new(Claim {
            claims: Arc::clone(&self.claims),
            game_id: game_id.clone(),
        }))
    }

    fn save(&self, game_id: &GameId, state: &GameState) -> StoreResult<()> {
        let record = GameRecord::from_state(state);
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        records.insert(game_id.clone(), record);
        tracing::debug!(game = %game_id, turn = state.current_turn, "saved game in memory");
        Ok(())
    }

    fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        records
            .get(game_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(game_id.clone()))
    }

    fn append_log(&self, game_id: &GameId, entry: &LogEntry) -> StoreResult<()> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = records
            .get_mut(game_id)
            .ok_or_else(|| StoreError::NotFound(game_id.clone()))?;
        record.append(entry.clone())
    }

    fn exists(&self, game_id: &GameId) -> StoreResult<bool> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.contains_key(game_id))
    }

    fn delete(&self, game_id: &GameId) -> StoreResult<bool> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.remove(game_id).is_some())
    }

    fn list_games(&self) -> StoreResult<Vec<GameId>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut ids: Vec<GameId> = records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn get_log(&self, game_id: &GameId) -> StoreResult<Vec<LogEntry>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        records
            .get(game_id)
            .map(|r| r.log.clone())
            .ok_or_else(|| StoreError::NotFound(game_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sop_core::{ActionKind, Delta, ScenarioConfig};

    fn state(id: &str) -> GameState {
        let json = r#"{"title": "One", "start_room": "cell",
            "rooms": [{"id": "cell", "name": "Cell"}]}"#;
        ScenarioConfig::from_json(json)
            .unwrap()
            .build(GameId::new(id), "Ada")
            .unwrap()
    }

    #[test]
    fn save_load_roundtrip() {
        let repo = InMemoryRepository::new();
        let id = GameId::new("a");
        let s = state("a");
        repo.save(&id, &s).unwrap();
        assert_eq!(repo.load(&id).unwrap(), s);
        assert!(repo.exists(&id).unwrap());
    }

    #[test]
    fn missing_game() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.load(&GameId::new("nope")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn append_and_read_log() {
        let repo = InMemoryRepository::new();
        let id = GameId::new("a");
        let s = state("a");
        repo.save(&id, &s).unwrap();
        let entry = LogEntry {
            sequence: 0,
            timestamp: s.created_at,
            turn: 0,
            actor: "player_1".into(),
            action: ActionKind::StartGame,
            message: "started".into(),
            delta: Delta::new(),
        };
        repo.append_log(&id, &entry).unwrap();
        assert!(repo.append_log(&id, &entry).is_err());
        assert_eq!(repo.get_log(&id).unwrap(), vec![entry.clone()]);
        assert_eq!(repo.load(&id).unwrap().event_log, vec![entry]);
    }

    #[test]
    fn claims_are_exclusive_per_game() {
        let repo = Arc::new(InMemoryRepository::new());
        let first = repo.lock_game(&GameId::new("a")).unwrap();
        // Another game is not blocked.
        drop(repo.lock_game(&GameId::new("b")).unwrap());

        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = {
            let repo = Arc::clone(&repo);
            std::thread::spawn(move || {
                let _claim = repo.lock_game(&GameId::new("a")).unwrap();
                tx.send(()).unwrap();
            })
        };
        assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
        drop(first);
        rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn list_and_delete() {
        let repo = InMemoryRepository::new();
        for id in ["b", "a"] {
            repo.save(&GameId::new(id), &state(id)).unwrap();
        }
        assert_eq!(repo.list_games().unwrap(), vec![GameId::new("a"), GameId::new("b")]);
        assert!(repo.delete(&GameId::new("a")).unwrap());
        assert!(!repo.delete(&GameId::new("a")).unwrap());
        assert_eq!(repo.list_games().unwrap().len(), 1);
    }
}
