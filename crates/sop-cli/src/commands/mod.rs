pub mod check;
pub mod end;
pub mod games;
pub mod inspect;
pub mod new;
pub mod play;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sop_core::{GameId, ScenarioConfig};
use sop_engine::{EngineConfig, GameEngine, SessionManager, scenarios};
use sop_store::FileRepository;

use crate::error::{CliError, CliResult};

/// Options every command shares.
pub struct Context {
    data_dir: PathBuf,
    game: GameId,
    timeout: Duration,
}

impl Context {
    pub fn new(data_dir: PathBuf, game: GameId, timeout: Duration) -> Self {
        Self {
            data_dir,
            game,
            timeout,
        }
    }

    /// The game named on the command line.
    pub fn game(&self) -> &GameId {
        &self.game
    }

    /// An engine over the save directory, creating it if needed.
    pub fn engine(&self) -> CliResult<Arc<GameEngine>> {
        let repository = FileRepository::new(&self.data_dir)?;
        let config = EngineConfig::default().with_persistence_timeout(self.timeout);
        Ok(Arc::new(GameEngine::bounded(Arc::new(repository), config)))
    }

    /// A session manager whose current game is the one named on the
    /// command line.
    pub fn sessions(&self) -> CliResult<Arc<SessionManager>> {
        let manager = SessionManager::new(self.engine()?);
        manager.set_current_game(self.game.clone());
        Ok(Arc::new(manager))
    }
}

/// Load a scenario from a file, or by bundled name.
fn load_scenario(name: &str, file: Option<&Path>) -> CliResult<ScenarioConfig> {
    match file {
        Some(path) => Ok(ScenarioConfig::from_path(path)?),
        None => match scenarios::by_name(name) {
            Some(scenario) => Ok(scenario?),
            None => Err(CliError::UnknownScenario(name.to_string())),
        },
    }
}
