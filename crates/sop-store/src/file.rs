//! File-based [`StateRepository`] implementation.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sop_core::{GameId, GameState, LogEntry};
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};
use crate::record::GameRecord;
use crate::traits::{GameLock, StateRepository};

const EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "lock";

/// Stores each game as `<game_id>.json` under a base directory.
///
/// Each write goes to its own temporary file, is synced, and is then renamed
/// over the record, so a reader sees either the old record or the new one.
/// [`lock_game`](StateRepository::lock_game) takes an advisory lock on
/// `<game_id>.lock`, which also excludes other processes using the same
/// directory. Lock files are left in place after a game is deleted.
#[derive(Debug)]
pub struct FileRepository {
    base_dir: PathBuf,
    // Serializes read-modify-write in `append_log` within this process.
    write_lock: Mutex<()>,
}

impl FileRepository {
    /// Open (and create if needed) a repository directory.
    pub fn new(base_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// The directory holding the records.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, game_id: &GameId) -> StoreResult<PathBuf> {
        let id = game_id.as_str();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.base_dir.join(format!("{id}.{EXTENSION}")))
    }

    fn write_record(&self, game_id: &GameId, record: &GameRecord) -> StoreResult<()> {
        let path = self.record_path(game_id)?;

        // The temp file is removed on drop if anything below fails.
        let mut temp = NamedTempFile::new_in(&self.base_dir)?;
        serde_json::to_writer_pretty(&mut temp, record)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| e.error)?;
        sync_dir(&self.base_dir)?;

        tracing::debug!(game = %game_id, path = %path.display(), "wrote game record");
        Ok(())
    }
}

// Makes the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> StoreResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}

impl StateRepository for FileRepository {
    fn lock_game(&self, game_id: &GameId) -> StoreResult<GameLock> {
        let path = self.record_path(game_id)?.with_extension(LOCK_EXTENSION);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock()?;
        tracing::trace!(game = %game_id, "locked game");
        // Closing the file releases the lock.
        Ok(GameLock::new(file))
    }

    fn save(&self, game_id: &GameId, state: &GameState) -> StoreResult<()> {
        self.write_record(game_id, &GameRecord::from_state(state))
    }

    fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord> {
        let path = self.record_path(game_id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(game_id.clone()));
        }
        let bytes = fs::read(&path)?;
        let record: GameRecord = serde_json::from_slice(&bytes)?;
        tracing::debug!(game = %game_id, path = %path.display(), "loaded game record");
        Ok(record)
    }

    fn append_log(&self, game_id: &GameId, entry: &LogEntry) -> StoreResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut record = self.load_record(game_id)?;
        record.append(entry.clone())?;
        self.write_record(game_id, &record)
    }

    fn exists(&self, game_id: &GameId) -> StoreResult<bool> {
        Ok(self.record_path(game_id)?.exists())
    }

    fn delete(&self, game_id: &GameId) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let path = self.record_path(game_id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::debug!(game = %game_id, "deleted game record");
        Ok(true)
    }

    fn list_games(&self) -> StoreResult<Vec<GameId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(GameId::new(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sop_core::ScenarioConfig;
    use tempfile::TempDir;

    fn state(id: &str) -> GameState {
        let json = r#"{"title": "One", "start_room": "cell", "global_flags": {"bell": 3},
            "rooms": [{"id": "cell", "name": "Cell"}]}"#;
        ScenarioConfig::from_json(json)
            .unwrap()
            .build(GameId::new(id), "Ada")
            .unwrap()
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let id = GameId::new("default");
        let s = state("default");
        FileRepository::new(dir.path()).unwrap().save(&id, &s).unwrap();

        let reopened = FileRepository::new(dir.path()).unwrap();
        assert_eq!(reopened.load(&id).unwrap(), s);
        assert_eq!(reopened.list_games().unwrap(), vec![id.clone()]);
        assert_eq!(reopened.load_flags(&id).unwrap()["bell"], 3.into());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path()).unwrap();
        repo.save(&GameId::new("a"), &state("a")).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
    }

    #[test]
    fn lock_excludes_second_repository() {
        let dir = TempDir::new().unwrap();
        let first = FileRepository::new(dir.path()).unwrap();
        let second = std::sync::Arc::new(FileRepository::new(dir.path()).unwrap());
        let id = GameId::new("shared");
        let claim = first.lock_game(&id).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = {
            let second = std::sync::Arc::clone(&second);
            let id = id.clone();
            std::thread::spawn(move || {
                let _claim = second.lock_game(&id).unwrap();
                tx.send(()).unwrap();
            })
        };
        assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
        drop(claim);
        rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();

        // Lock files never show up as games.
        assert!(first.list_games().unwrap().is_empty());
    }

    #[test]
    fn rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path()).unwrap();
        let bad = GameId::new("../escape");
        assert!(matches!(repo.save(&bad, &state("x")), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn delete_and_missing() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path()).unwrap();
        let id = GameId::new("a");
        repo.save(&id, &state("a")).unwrap();
        assert!(repo.delete(&id).unwrap());
        assert!(matches!(repo.load(&id), Err(StoreError::NotFound(_))));
        assert!(!repo.exists(&id).unwrap());
    }
}
