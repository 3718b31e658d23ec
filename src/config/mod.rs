//! Configuration module
//!
//! Runner settings, loaded from a YAML or JSON file and overridden by
//! `LAMBDA_TESTKIT_*` environment variables.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::utils::LogLevel;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Parallelism for classes without a `ParallelExecution` marker
    pub parallel_default: bool,

    /// Upper bound on concurrently running normal units
    pub max_concurrent: usize,

    /// Root directory for `classpath:` locators
    pub resource_dir: PathBuf,

    pub log_level: LogLevel,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel_default: false,
            max_concurrent: default_max_concurrent(),
            resource_dir: PathBuf::from("resources"),
            log_level: LogLevel::Info,
        }
    }
}

fn default_max_concurrent() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl RunnerConfig {
    /// Overlay whatever the environment sets.
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(parallel) = env.parallel {
            self.parallel_default = parallel;
        }
        if let Some(max) = env.max_concurrent {
            self.max_concurrent = max;
        }
        if let Some(dir) = &env.resource_dir {
            self.resource_dir = PathBuf::from(dir);
        }
        if let Some(level) = env.log_level.as_deref().and_then(|l| l.parse().ok()) {
            self.log_level = level;
        }
    }

    /// File (explicit path, `LAMBDA_TESTKIT_CONFIG`, or a standard location),
    /// then environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvConfig::load();

        let file = match explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
        {
            Some(path) => ConfigFile::load(&path)?,
            None => ConfigFile::load_default()?,
        };

        let mut config = file.runner;
        config.apply_env(&env);
        debug!("Resolved runner configuration: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(!config.parallel_default);
        assert!(config.max_concurrent >= 1);
        assert_eq!(config.resource_dir, PathBuf::from("resources"));
    }

    #[test]
    fn test_apply_env() {
        let mut config = RunnerConfig::default();
        let env = EnvConfig {
            parallel: Some(true),
            max_concurrent: Some(2),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_env(&env);

        assert!(config.parallel_default);
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.resource_dir, PathBuf::from("resources"));
    }

    #[test]
    fn test_unknown_env_level_is_ignored() {
        let mut config = RunnerConfig::default();
        config.apply_env(&EnvConfig {
            log_level: Some("loud".to_string()),
            ..Default::default()
        });
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RunnerConfig = serde_yaml::from_str("parallel_default: true\n").unwrap();
        assert!(config.parallel_default);
        assert_eq!(config.resource_dir, PathBuf::from("resources"));
    }
}
