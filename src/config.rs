use clap::ValueEnum;
use serde::Serialize;

use crate::error::ServerError;

/// Which execution strategy serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// N workers, one shared queue, single rotating leadership slot.
    LeaderFollower,
    /// Four chained active objects, one per processing phase.
    Pipeline,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::LeaderFollower => write!(f, "leader-follower"),
            EngineKind::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Server settings, CLI-populated in the binary and hand-built by
/// embedders and tests.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:8082`. Port 0 picks an ephemeral
    /// port (tests rely on this).
    pub listen: String,
    /// Worker threads for the leader-follower engine. The pipeline always
    /// uses exactly one thread per stage.
    pub workers: usize,
    pub engine: EngineKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8082".to_string(),
            workers: num_cpus::get(),
            engine: EngineKind::LeaderFollower,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.workers == 0 {
            return Err(ServerError::Config("worker count must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = ServerConfig { workers: 0, ..ServerConfig::default() };
        assert!(config.validate().is_err());
    }
}
