//! Configuration for the game engine.

use std::time::Duration;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on each repository call when the repository is wrapped.
    pub persistence_timeout: Duration,
    /// Name given to the player when a caller supplies none.
    pub default_player_name: String,
    /// Most major events listed in a summary.
    pub summary_event_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            persistence_timeout: Duration::from_secs(5),
            default_player_name: "Player".to_string(),
            summary_event_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Set the repository call bound.
    pub fn with_persistence_timeout(mut self, timeout: Duration) -> Self {
        self.persistence_timeout = timeout;
        self
    }

    /// Set the default player name.
    pub fn with_default_player_name(mut self, name: impl Into<String>) -> Self {
        self.default_player_name = name.into();
        self
    }

    /// Set the summary event limit (at least 1).
    pub fn with_summary_event_limit(mut self, limit: usize) -> Self {
        self.summary_event_limit = limit.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.persistence_timeout, Duration::from_secs(5));
        assert_eq!(cfg.default_player_name, "Player");
        assert_eq!(cfg.summary_event_limit, 10);
    }

    #[test]
    fn builder_methods() {
        let cfg = EngineConfig::default()
            .with_persistence_timeout(Duration::from_millis(250))
            .with_default_player_name("Ada")
            .with_summary_event_limit(0);
        assert_eq!(cfg.persistence_timeout, Duration::from_millis(250));
        assert_eq!(cfg.default_player_name, "Ada");
        assert_eq!(cfg.summary_event_limit, 1);
    }
}
