//! Time-bounded wrapper around any repository.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

use sop_core::{Flags, GameId, GameState, LogEntry};

use crate::error::{StoreError, StoreResult};
use crate::record::{EntityCollections, GameRecord};
use crate::traits::{GameLock, StateRepository};

/// How a worker's call stands with its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Answered,
    /// The caller stopped waiting and reported a timeout.
    Abandoned,
}

/// Whether a game-scoped call may change the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

type Gate = Arc<Mutex<()>>;

fn hold<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs each call of the inner repository on a worker thread and gives up
/// after `timeout`.
///
/// Calls for the same game run one at a time.
/// A timed-out call never takes effect: if it had not started yet it is
/// skipped, and a write that completes after its caller gave up is rolled
/// back to the record it replaced before the next call for that game runs.
pub struct BoundedRepository {
    inner: Arc<dyn StateRepository>,
    timeout: Duration,
    gates: Mutex<HashMap<GameId, Gate>>,
}

impl BoundedRepository {
    /// Wrap `inner`, bounding every call by `timeout`.
    pub fn new(inner: Arc<dyn StateRepository>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// The configured bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn gate(&self, game_id: &GameId) -> Gate {
        let mut gates = hold(&self.gates);
        // A gate only this map refers to has no call queued on it.
        gates.retain(|_, gate| Arc::strong_count(gate) > 1);
        Arc::clone(gates.entry(game_id.clone()).or_default())
    }

    fn read<T, F>(&self, operation: &'static str, game_id: &GameId, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StateRepository) -> StoreResult<T> + Send + 'static,
    {
        self.call(operation, Some((game_id, Access::Read)), f)
    }

    fn write<T, F>(&self, operation: &'static str, game_id: &GameId, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StateRepository) -> StoreResult<T> + Send + 'static,
    {
        self.call(operation, Some((game_id, Access::Write)), f)
    }

    fn call<T, F>(&self, operation: &'static str, scope: Option<(&GameId, Access)>, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StateRepository) -> StoreResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let gate = scope.map(|(id, _)| self.gate(id));
        let game = scope.map(|(id, access)| (id.clone(), access));
        let phase = Arc::new(Mutex::new(Phase::Pending));
        let worker_phase = Arc::clone(&phase);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name(format!("sop-store-{operation}"))
            .spawn(move || {
                let _turn = gate.as_deref().map(hold);
                if *hold(&*worker_phase) == Phase::Abandoned {
                    return;
                }

                let prior = match &game {
                    Some((id, Access::Write)) => match inner.load(id) {
                        Ok(state) => Some(Some(state)),
                        Err(StoreError::NotFound(_)) => Some(None),
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            return;
                        }
                    },
                    _ => None,
                };
                let result = f(inner.as_ref());

                let mut phase = hold(&*worker_phase);
                if *phase == Phase::Abandoned {
                    if let (Some((id, _)), Some(prior), Ok(_)) = (&game, prior, &result) {
                        restore(inner.as_ref(), operation, id, prior);
                    }
                    return;
                }
                *phase = Phase::Answered;
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let mut state = hold(&*phase);
                if *state == Phase::Answered {
                    drop(state);
                    // Answered just as the bound ran out.
                    return rx
                        .recv()
                        .unwrap_or_else(|_| Err(StoreError::WorkerLost(operation)));
                }
                *state = Phase::Abandoned;
                tracing::warn!(operation, timeout = ?self.timeout, "repository call timed out");
                Err(StoreError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(StoreError::WorkerLost(operation)),
        }
    }
}

/// Put back the record a late write replaced, or remove the one it created.
fn restore(inner: &dyn StateRepository, operation: &'static str, game_id: &GameId, prior: Option<GameState>) {
    let restored = match &prior {
        Some(state) => inner.save(game_id, state),
        None => inner.delete(game_id).map(|_| ()),
    };
    match restored {
        Ok(()) => tracing::warn!(game = %game_id, operation, "rolled back a write that finished after its timeout"),
        Err(e) => tracing::error!(game = %game_id, operation, error = %e, "could not roll back a late write"),
    }
}

impl StateRepository for BoundedRepository {
    fn lock_game(&self, game_id: &GameId) -> StoreResult<GameLock> {
        // A claim that arrives after the timeout is dropped with the
        // unanswered message, which releases it.
        let id = game_id.clone();
        self.call("lock_game", None, move |repo| repo.lock_game(&id))
    }

    fn save(&self, game_id: &GameId, state: &GameState) -> StoreResult<()> {
        let (id, state) = (game_id.clone(), state.clone());
        self.write("save", game_id, move |repo| repo.save(&id, &state))
    }

    fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord> {
        let id = game_id.clone();
        self.read("load", game_id, move |repo| repo.load_record(&id))
    }

    fn append_log(&self, game_id: &GameId, entry: &LogEntry) -> StoreResult<()> {
        let (id, entry) = (game_id.clone(), entry.clone());
        self.write("append_log", game_id, move |repo| repo.append_log(&id, &entry))
    }

    fn exists(&self, game_id: &GameId) -> StoreResult<bool> {
        let id = game_id.clone();
        self.read("exists", game_id, move |repo| repo.exists(&id))
    }

    fn delete(&self, game_id: &GameId) -> StoreResult<bool> {
        let id = game_id.clone();
        self.write("delete", game_id, move |repo| repo.delete(&id))
    }

    fn list_games(&self) -> StoreResult<Vec<GameId>> {
        self.call("list_games", None, |repo| repo.list_games())
    }

    fn load(&self, game_id: &GameId) -> StoreResult<GameState> {
        let id = game_id.clone();
        self.read("load", game_id, move |repo| repo.load(&id))
    }

    fn get_log(&self, game_id: &GameId) -> StoreResult<Vec<LogEntry>> {
        let id = game_id.clone();
        self.read("get_log", game_id, move |repo| repo.get_log(&id))
    }

    fn load_collections(&self, game_id: &GameId) -> StoreResult<EntityCollections> {
        let id = game_id.clone();
        self.read("load_collections", game_id, move |repo| repo.load_collections(&id))
    }

    fn load_flags(&self, game_id: &GameId) -> StoreResult<Flags> {
        let id = game_id.clone();
        self.read("load_flags", game_id, move |repo| repo.load_flags(&id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::memory::InMemoryRepository;
    use sop_core::ScenarioConfig;

    struct Stalled;

    impl StateRepository for Stalled {
        fn lock_game(&self, _: &GameId) -> StoreResult<GameLock> {
            Ok(GameLock::new(()))
        }
        fn save(&self, _: &GameId, _: &GameState) -> StoreResult<()> {
            thread::sleep(Duration::from_secs(5));
            Ok(())
        }
        fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord> {
            Err(StoreError::NotFound(game_id.clone()))
        }
        fn append_log(&self, _: &GameId, _: &LogEntry) -> StoreResult<()> {
            Ok(())
        }
        fn exists(&self, _: &GameId) -> StoreResult<bool> {
            Ok(false)
        }
        fn delete(&self, _: &GameId) -> StoreResult<bool> {
            Ok(false)
        }
        fn list_games(&self) -> StoreResult<Vec<GameId>> {
            thread::sleep(Duration::from_secs(5));
            Ok(Vec::new())
        }
    }

    /// Memory-backed, with saves that take 200ms while `slow` is set.
    #[derive(Default)]
    struct Sluggish {
        inner: InMemoryRepository,
        slow: AtomicBool,
    }

    impl StateRepository for Sluggish {
        fn lock_game(&self, game_id: &GameId) -> StoreResult<GameLock> {
            self.inner.lock_game(game_id)
        }
        fn save(&self, game_id: &GameId, state: &GameState) -> StoreResult<()> {
            if self.slow.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(200));
            }
            self.inner.save(game_id, state)
        }
        fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord> {
            self.inner.load_record(game_id)
        }
        fn append_log(&self, game_id: &GameId, entry: &LogEntry) -> StoreResult<()> {
            self.inner.append_log(game_id, entry)
        }
        fn exists(&self, game_id: &GameId) -> StoreResult<bool> {
            self.inner.exists(game_id)
        }
        fn delete(&self, game_id: &GameId) -> StoreResult<bool> {
            self.inner.delete(game_id)
        }
        fn list_games(&self) -> StoreResult<Vec<GameId>> {
            self.inner.list_games()
        }
    }

    fn state() -> GameState {
        let json = r#"{"title": "One", "start_room": "cell",
            "rooms": [{"id": "cell", "name": "Cell"}]}"#;
        ScenarioConfig::from_json(json)
            .unwrap()
            .build(GameId::new("g"), "Ada")
            .unwrap()
    }

    #[test]
    fn slow_backend_times_out() {
        let repo = BoundedRepository::new(Arc::new(Stalled), Duration::from_millis(50));
        assert!(matches!(
            repo.list_games(),
            Err(StoreError::Timeout {
                operation: "list_games",
                ..
            })
        ));
    }

    #[test]
    fn fast_backend_passes_through() {
        let repo = BoundedRepository::new(Arc::new(InMemoryRepository::new()), Duration::from_secs(5));
        assert!(repo.list_games().unwrap().is_empty());
        assert!(matches!(
            repo.load(&GameId::new("x")),
            Err(StoreError::NotFound(_))
        ));
        assert!(!repo.exists(&GameId::new("x")).unwrap());
        drop(repo.lock_game(&GameId::new("x")).unwrap());
    }

    #[test]
    fn timed_out_save_never_sticks() {
        let backend = Arc::new(Sluggish::default());
        let repo = BoundedRepository::new(backend.clone(), Duration::from_millis(50));
        let id = GameId::new("g");
        let original = state();
        repo.save(&id, &original).unwrap();

        let mut later = original.clone();
        later.current_turn = 1;
        backend.slow.store(true, Ordering::SeqCst);
        assert!(matches!(
            repo.save(&id, &later),
            Err(StoreError::Timeout { operation: "save", .. })
        ));
        backend.slow.store(false, Ordering::SeqCst);

        // Queued behind the late save, and given up on before it ran.
        assert!(matches!(repo.load(&id), Err(StoreError::Timeout { .. })));
        assert!(matches!(repo.delete(&id), Err(StoreError::Timeout { .. })));

        thread::sleep(Duration::from_millis(500));
        assert_eq!(repo.load(&id).unwrap(), original);
        assert_eq!(backend.inner.load(&id).unwrap(), original);
    }

    #[test]
    fn timed_out_first_save_leaves_nothing() {
        let backend = Arc::new(Sluggish::default());
        let repo = BoundedRepository::new(backend.clone(), Duration::from_millis(50));
        let id = GameId::new("g");

        backend.slow.store(true, Ordering::SeqCst);
        assert!(repo.save(&id, &state()).is_err());
        backend.slow.store(false, Ordering::SeqCst);

        thread::sleep(Duration::from_millis(500));
        assert!(!repo.exists(&id).unwrap());
    }
}
