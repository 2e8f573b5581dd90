//! AdapterConfig - explicit process configuration.
//!
//! Loaded once at startup from an optional TOML file plus `RELAY_*`
//! environment variables (environment wins), then passed by value into the
//! dispatcher and sender constructors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "RELAY";

/// What to do with an envelope whose type has no registered handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledPolicy {
    /// Log and move on.
    #[default]
    Ignore,
    /// Report `DispatchError::Unhandled`; the service treats it as fatal.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Envelope `source` and provider identity of this service.
    pub service_name: String,

    /// Namespace of handled event types, e.g. `sh.keptn.event`.
    pub event_namespace: String,

    /// Upper bound for one publish call.
    pub send_timeout_ms: u64,

    pub unhandled: UnhandledPolicy,

    /// Read resources from `resource_dir` instead of a configuration service.
    pub use_local_filesystem: bool,

    pub resource_dir: PathBuf,

    pub event_broker_url: Option<String>,

    pub configuration_service_url: Option<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            service_name: "relay-service".to_string(),
            event_namespace: "sh.keptn.event".to_string(),
            send_timeout_ms: 5_000,
            unhandled: UnhandledPolicy::Ignore,
            use_local_filesystem: true,
            resource_dir: PathBuf::from("."),
            event_broker_url: None,
            configuration_service_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl AdapterConfig {
    /// Load from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config: AdapterConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid("service_name must not be empty".to_string()));
        }
        if self.event_namespace.trim().is_empty() || self.event_namespace.ends_with('.') {
            return Err(ConfigError::Invalid(format!(
                "event_namespace '{}' is not a valid namespace",
                self.event_namespace
            )));
        }
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid("send_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.event_namespace = namespace.into();
        self
    }

    pub fn with_unhandled(mut self, policy: UnhandledPolicy) -> Self {
        self.unhandled = policy;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_reasonable() {
        let c = AdapterConfig::default();
        assert_eq!(c.service_name, "relay-service");
        assert_eq!(c.event_namespace, "sh.keptn.event");
        assert_eq!(c.send_timeout(), Duration::from_secs(5));
        assert_eq!(c.unhandled, UnhandledPolicy::Ignore);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "service_name = \"sli-bridge\"\nevent_namespace = \"demo\"\nunhandled = \"fail\""
        )
        .unwrap();

        let c = AdapterConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.service_name, "sli-bridge");
        assert_eq!(c.event_namespace, "demo");
        assert_eq!(c.unhandled, UnhandledPolicy::Fail);
        assert_eq!(c.send_timeout_ms, 5_000);
    }

    #[test]
    fn missing_file_is_an_error() {
        let r = AdapterConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(r, Err(ConfigError::Load(_))));
    }

    #[test]
    fn rejects_empty_service_name() {
        let c = AdapterConfig::default().with_service_name(" ");
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn oversized_send_timeout_saturates() {
        let c = AdapterConfig::default().with_send_timeout(Duration::MAX);
        assert_eq!(c.send_timeout_ms, u64::MAX);

        let c = AdapterConfig::default().with_send_timeout(Duration::from_millis(1500));
        assert_eq!(c.send_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn unhandled_policy_parses_lowercase() {
        let p: UnhandledPolicy = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(p, UnhandledPolicy::Fail);
    }
}
