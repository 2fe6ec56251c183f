//! Integration tests: persistence.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use sop_core::{GameId, GameState, ItemId, ItemLocation, LogEntry, PlayerId, RoomId};
use sop_engine::{Action, EngineConfig, GameEngine, GameError, SessionManager, scenarios};
use sop_store::{
    FileRepository, GameLock, GameRecord, InMemoryRepository, StateRepository, StoreError, StoreResult,
};
use tempfile::TempDir;

fn player() -> PlayerId {
    PlayerId::new("player_1")
}

fn go(direction: &str) -> Action {
    Action::Move {
        direction: direction.to_string(),
    }
}

fn stick_location(engine: &GameEngine, id: &GameId) -> ItemLocation {
    let state = engine.snapshot(id).unwrap();
    state.items[&ItemId::new("stick")].location.clone()
}

/// Passes everything through, but fails saves while `failing` is set and
/// log appends while `failing_log` is set. Saves sleep 300ms while `slow`
/// is set.
#[derive(Default)]
struct FlakyRepository {
    inner: InMemoryRepository,
    failing: AtomicBool,
    failing_log: AtomicBool,
    slow: AtomicBool,
}

impl FlakyRepository {
    fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn fail_log(&self, on: bool) {
        self.failing_log.store(on, Ordering::SeqCst);
    }

    fn slow(&self, on: bool) {
        self.slow.store(on, Ordering::SeqCst);
    }
}

fn disk_full() -> StoreError {
    StoreError::Io(std::io::Error::other("disk full"))
}

impl StateRepository for FlakyRepository {
    fn lock_game(&self, game_id: &GameId) -> StoreResult<GameLock> {
        self.inner.lock_game(game_id)
    }

    fn save(&self, game_id: &GameId, state: &GameState) -> StoreResult<()> {
        if self.slow.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(300));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.save(game_id, state)
    }

    fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord> {
        self.inner.load_record(game_id)
    }

    fn append_log(&self, game_id: &GameId, entry: &LogEntry) -> StoreResult<()> {
        if self.failing_log.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
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

#[test]
fn failed_save_leaves_state_untouched() {
    let repo = Arc::new(FlakyRepository::default());
    let engine = GameEngine::new(repo.clone(), EngineConfig::default());
    let id = GameId::new("flaky");
    engine
        .start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();
    let before = engine.snapshot(&id).unwrap();

    repo.fail(true);
    let err = engine.act(&id, &player(), &go("north")).unwrap_err();
    assert!(matches!(err, GameError::Persistence(_)));

    let after = engine.snapshot(&id).unwrap();
    assert_eq!(after.current_turn, 0);
    assert_eq!(after.event_log.len(), before.event_log.len());
    assert_eq!(after.players[&player()].location, RoomId::new("meadow"));

    // Nothing was written, so the retry starts from turn 0.
    repo.fail(false);
    let r = engine.act(&id, &player(), &go("north")).unwrap();
    assert!(r.success);
    assert_eq!(r.turn, 1);
    assert_eq!(engine.log(&id).unwrap().len(), 2);
}

#[test]
fn start_writes_state_and_first_entry_together() {
    let repo = Arc::new(FlakyRepository::default());
    let engine = GameEngine::new(repo.clone(), EngineConfig::default());
    let id = GameId::new("one-write");

    repo.fail_log(true);
    engine
        .start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();
    let log = engine.log(&id).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].message, "Started new game: Simple Adventure");
}

#[test]
fn failed_restart_keeps_the_running_game() {
    let repo = Arc::new(FlakyRepository::default());
    let engine = Arc::new(GameEngine::new(repo.clone(), EngineConfig::default()));
    let sessions = SessionManager::new(Arc::clone(&engine));
    let id = GameId::new("restart");
    let scenario = scenarios::simple_adventure().unwrap();
    engine.start(&id, &scenario, None).unwrap();
    engine.act(&id, &player(), &go("north")).unwrap();
    let before = engine.snapshot(&id).unwrap();

    repo.fail(true);
    assert!(matches!(
        engine.start(&id, &scenario, None),
        Err(GameError::Persistence(_))
    ));
    assert!(matches!(sessions.reset_game(&id), Err(GameError::Persistence(_))));
    assert_eq!(engine.snapshot(&id).unwrap(), before);

    repo.fail(false);
    let r = engine.act(&id, &player(), &go("south")).unwrap();
    assert!(r.success);
    assert_eq!(r.turn, 2);
    let log = engine.log(&id).unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(&log[..2], &before.event_log[..]);
}

#[test]
fn timed_out_save_is_never_applied() {
    let repo = Arc::new(FlakyRepository::default());
    let config = EngineConfig::default().with_persistence_timeout(Duration::from_millis(50));
    let engine = GameEngine::bounded(repo.clone(), config);
    let id = GameId::new("late");
    engine
        .start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();

    repo.slow(true);
    let err = engine
        .act(&id, &player(), &Action::Take { item: "stick".into() })
        .unwrap_err();
    assert!(matches!(err, GameError::Persistence(StoreError::Timeout { .. })), "{err}");
    repo.slow(false);

    // Still waiting on the late save, so nothing else gets acknowledged.
    assert!(matches!(
        engine.act(&id, &player(), &go("north")),
        Err(GameError::Persistence(_))
    ));

    thread::sleep(Duration::from_millis(600));
    let state = engine.snapshot(&id).unwrap();
    assert_eq!(state.current_turn, 0);
    assert_eq!(state.event_log.len(), 1);
    assert_eq!(stick_location(&engine, &id), ItemLocation::Room(RoomId::new("meadow")));

    let r = engine.act(&id, &player(), &go("north")).unwrap();
    assert!(r.success);
    assert_eq!(r.turn, 1);
    assert_eq!(stick_location(&engine, &id), ItemLocation::Room(RoomId::new("meadow")));
}

#[test]
fn engines_sharing_a_repository_act_on_fresh_state() {
    let repo = Arc::new(InMemoryRepository::new());
    let a = GameEngine::new(repo.clone(), EngineConfig::default());
    let b = GameEngine::new(repo, EngineConfig::default());
    let id = GameId::new("shared");
    a.start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();
    a.act(&id, &player(), &Action::LookAround).unwrap();

    let take = Action::Take { item: "stick".into() };
    let r = b.act(&id, &player(), &take).unwrap();
    assert!(r.success);
    let log_after_b = b.log(&id).unwrap();

    let r = a.act(&id, &player(), &take).unwrap();
    assert!(!r.success);
    assert_eq!(r.turn, 1);
    assert_eq!(a.log(&id).unwrap(), log_after_b);

    let r = a.act(&id, &player(), &go("north")).unwrap();
    assert_eq!(r.turn, 2);
    assert_eq!(b.snapshot(&id).unwrap().current_turn, 2);
}

#[test]
fn separate_file_repositories_never_lose_updates() {
    let dir = TempDir::new().unwrap();
    let id = GameId::new("contended");
    let engines: Vec<Arc<GameEngine>> = (0..2)
        .map(|_| {
            let repo = Arc::new(FileRepository::new(dir.path()).unwrap());
            Arc::new(GameEngine::new(repo, EngineConfig::default()))
        })
        .collect();
    engines[0]
        .start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();

    let accepted = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engines[i % 2]);
            let accepted = Arc::clone(&accepted);
            let id = id.clone();
            thread::spawn(move || {
                for step in 0..10 {
                    let direction = if step % 2 == 0 { "north" } else { "south" };
                    if engine.act(&id, &player(), &go(direction)).unwrap().success {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let accepted = accepted.load(Ordering::SeqCst);
    let state = engines[1].snapshot(&id).unwrap();
    assert!(accepted > 0);
    assert_eq!(state.current_turn as usize, accepted);
    assert_eq!(state.event_log.len(), accepted + 1);
    assert!(state.check_invariants().is_empty());
}

#[test]
fn blocked_move_changes_nothing() {
    let engine = GameEngine::in_memory();
    let id = GameId::new("blocked");
    engine
        .start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();
    engine.act(&id, &player(), &go("north")).unwrap();
    let before = engine.snapshot(&id).unwrap();

    for direction in ["east", "west", "up", "nowhere"] {
        let r = engine.act(&id, &player(), &go(direction)).unwrap();
        assert!(!r.success, "{direction} should be blocked");
    }

    let after = engine.snapshot(&id).unwrap();
    assert_eq!(after.current_turn, before.current_turn);
    assert_eq!(after.event_log, before.event_log);
    assert_eq!(after.players, before.players);
}

#[test]
fn take_then_drop_restores_room() {
    let engine = GameEngine::in_memory();
    let id = GameId::new("roundtrip");
    engine
        .start(&id, &scenarios::simple_adventure().unwrap(), None)
        .unwrap();
    let before = engine.snapshot(&id).unwrap();

    engine
        .act(&id, &player(), &Action::Take { item: "stick".into() })
        .unwrap();
    engine
        .act(&id, &player(), &Action::Drop { item: "stick".into() })
        .unwrap();

    let after = engine.snapshot(&id).unwrap();
    assert_eq!(after.rooms, before.rooms);
    assert_eq!(after.items, before.items);
    assert!(after.players[&player()].inventory.is_empty());
    assert_eq!(after.current_turn, 2);
}

#[test]
fn file_backed_game_survives_a_new_engine() {
    let dir = TempDir::new().unwrap();
    let id = GameId::new("saved");
    {
        let repo = Arc::new(FileRepository::new(dir.path()).unwrap());
        let engine = GameEngine::bounded(repo, EngineConfig::default());
        engine
            .start(&id, &scenarios::dungeon_crawler().unwrap(), Some("Ada"))
            .unwrap();
        engine.act(&id, &player(), &go("north")).unwrap();
        engine
            .act(&id, &player(), &Action::Take { item: "magic_potion".into() })
            .unwrap();
    }

    let repo = Arc::new(FileRepository::new(dir.path()).unwrap());
    let engine = GameEngine::new(repo, EngineConfig::default());
    let state = engine.snapshot(&id).unwrap();
    assert_eq!(state.current_turn, 2);
    assert_eq!(state.players[&player()].name, "Ada");
    assert_eq!(state.players[&player()].location, RoomId::new("hallway"));
    assert_eq!(engine.log(&id).unwrap().len(), 3);
    assert!(state.check_invariants().is_empty());

    let r = engine
        .act(
            &id,
            &player(),
            &Action::Use {
                item: "magic_potion".into(),
                target: None,
            },
        )
        .unwrap();
    assert!(r.success);
    assert_eq!(engine.list_games().unwrap(), vec![id]);
}

fn dungeon_actions() -> Vec<Action> {
    let mut actions: Vec<Action> = ["north", "south", "east", "west"]
        .into_iter()
        .map(go)
        .collect();
    for item in ["torch", "magic_potion", "sword"] {
        actions.push(Action::Take { item: item.into() });
        actions.push(Action::Drop { item: item.into() });
        actions.push(Action::Use {
            item: item.into(),
            target: None,
        });
    }
    actions.push(Action::Use {
        item: "sword".into(),
        target: Some("dragon".into()),
    });
    actions.push(Action::Talk {
        npc: "old_woman".into(),
        message: None,
    });
    actions.push(Action::LookAround);
    actions.push(Action::CheckInventory);
    actions
}

proptest! {
    #[test]
    fn turn_and_log_only_grow(steps in prop::collection::vec(prop::sample::select(dungeon_actions()), 1..40)) {
        let engine = GameEngine::in_memory();
        let id = GameId::new("prop");
        engine.start(&id, &scenarios::dungeon_crawler().unwrap(), None).unwrap();

        let mut turn = 0;
        let mut log = engine.log(&id).unwrap();
        for action in &steps {
            match engine.act(&id, &player(), action) {
                Ok(result) => {
                    let expected = if result.success && !action.is_query() { turn + 1 } else { turn };
                    prop_assert_eq!(result.turn, expected);
                    turn = result.turn;
                }
                Err(GameError::InvalidState(_)) => {
                    prop_assert!(engine.snapshot(&id).unwrap().is_ended());
                    break;
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            let next = engine.log(&id).unwrap();
            prop_assert!(next.len() >= log.len());
            prop_assert_eq!(&next[..log.len()], &log[..]);
            for (index, entry) in next.iter().enumerate() {
                prop_assert_eq!(entry.sequence, index as u64);
            }
            log = next;

            let state = engine.snapshot(&id).unwrap();
            prop_assert!(state.check_invariants().is_empty());
        }
    }

    #[test]
    fn gated_exits_reject_without_side_effects(direction in "[a-z]{1,8}") {
        let engine = GameEngine::in_memory();
        let id = GameId::new("gates");
        engine.start(&id, &scenarios::simple_adventure().unwrap(), None).unwrap();
        engine.act(&id, &player(), &go("north")).unwrap();
        let before = engine.snapshot(&id).unwrap();

        let result = engine.act(&id, &player(), &go(&direction)).unwrap();
        let after = engine.snapshot(&id).unwrap();
        if result.success {
            prop_assert!(direction == "south");
            prop_assert_eq!(after.current_turn, before.current_turn + 1);
        } else {
            prop_assert_eq!(after.current_turn, before.current_turn);
            prop_assert_eq!(after.event_log.len(), before.event_log.len());
            prop_assert_eq!(&after.players, &before.players);
        }
    }
}
