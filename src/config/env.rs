//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "LAMBDA_TESTKIT";

/// Overrides read from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// LAMBDA_TESTKIT_PARALLEL
    pub parallel: Option<bool>,
    /// LAMBDA_TESTKIT_MAX_CONCURRENT
    pub max_concurrent: Option<usize>,
    /// LAMBDA_TESTKIT_RESOURCE_DIR
    pub resource_dir: Option<String>,
    /// LAMBDA_TESTKIT_LOG_LEVEL
    pub log_level: Option<String>,
    /// LAMBDA_TESTKIT_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            parallel: get_env_bool("PARALLEL"),
            max_concurrent: get_env_parse("MAX_CONCURRENT"),
            resource_dir: get_env("RESOURCE_DIR"),
            log_level: get_env("LOG_LEVEL"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.parallel.is_some()
            || self.max_concurrent.is_some()
            || self.resource_dir.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_PARALLEL:        {:?}", ENV_PREFIX, self.parallel);
        println!("  {}_MAX_CONCURRENT:  {:?}", ENV_PREFIX, self.max_concurrent);
        println!("  {}_RESOURCE_DIR:    {:?}", ENV_PREFIX, self.resource_dir);
        println!("  {}_LOG_LEVEL:       {:?}", ENV_PREFIX, self.log_level);
        println!("  {}_CONFIG:          {:?}", ENV_PREFIX, self.config_file);
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}

fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self::default()
    }

    fn var(mut self, name: &str, value: String) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value));
        self
    }

    /// Set default parallelism
    pub fn parallel(self, parallel: bool) -> Self {
        self.var("PARALLEL", parallel.to_string())
    }

    /// Set concurrency bound
    pub fn max_concurrent(self, max: usize) -> Self {
        self.var("MAX_CONCURRENT", max.to_string())
    }

    /// Set resource directory
    pub fn resource_dir(self, dir: impl Into<String>) -> Self {
        self.var("RESOURCE_DIR", dir.into())
    }

    /// Set log level
    pub fn log_level(self, level: impl Into<String>) -> Self {
        self.var("LOG_LEVEL", level.into())
    }

    /// Set config file path
    pub fn config_file(self, path: impl Into<String>) -> Self {
        self.var("CONFIG", path.into())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print help for environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_PARALLEL         Run unmarked classes in parallel (true/false)");
    println!("  {ENV_PREFIX}_MAX_CONCURRENT   Maximum concurrently running units");
    println!("  {ENV_PREFIX}_RESOURCE_DIR     Root directory for classpath: locators");
    println!("  {ENV_PREFIX}_LOG_LEVEL        trace, debug, info, warn or error");
    println!("  {ENV_PREFIX}_CONFIG           Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_PARALLEL=true");
    println!("  lambda-testkit run --suite ordering");
}
