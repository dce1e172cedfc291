//! Producer configuration
//!
//! Loaded from a TOML file, or layered file + environment through the `config`
//! crate. `normalized()` applies the defaults a producer relies on.

use crate::error::{ProducerError, ProducerResult};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default transport address when none is configured
pub const DEFAULT_ADDRESS: &str = "localhost:4150";

/// Producer connection and replication settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Transport addresses, one publishing handle each
    pub address: Vec<String>,
    /// Number of distinct handles each publish is sent to
    pub replication_factor: i32,
    /// Test each connection before use
    pub ping_on_connect: bool,
    /// Opaque settings passed to the connector
    pub transport: HashMap<String, String>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            address: vec![DEFAULT_ADDRESS.to_string()],
            replication_factor: 1,
            ping_on_connect: true,
            transport: HashMap::new(),
        }
    }
}

impl ProducerConfig {
    pub fn new(address: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            address: address.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_replication_factor(mut self, replication_factor: i32) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    pub fn with_ping_on_connect(mut self, ping_on_connect: bool) -> Self {
        self.ping_on_connect = ping_on_connect;
        self
    }

    pub fn with_transport_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport.insert(key.into(), value.into());
        self
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ProducerResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProducerError::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| ProducerError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load from an optional file with `<PREFIX>__*` environment overrides
    ///
    /// `address` may be given in the environment as a comma-separated list.
    pub fn load(path: Option<&Path>, env_prefix: &str) -> ProducerResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("address")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ProducerError::config(format!("Failed to build configuration: {}", e)))?;

        config
            .try_deserialize()
            .map_err(|e| ProducerError::config(format!("Failed to deserialize configuration: {}", e)))
    }

    /// Copy with defaults applied: an address when none is set and a replication
    /// factor of at least 1
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        if config.address.is_empty() {
            config.address = vec![DEFAULT_ADDRESS.to_string()];
        }
        if config.replication_factor <= 0 {
            config.replication_factor = 1;
        }
        config
    }

    /// Reject blank addresses and a replication factor no address set can satisfy
    pub fn validate(&self) -> ProducerResult<()> {
        if let Some(index) = self.address.iter().position(|a| a.trim().is_empty()) {
            return Err(ProducerError::config(format!(
                "address[{}] must not be empty",
                index
            )));
        }
        let addresses = self.address.len().max(1);
        if self.replication_factor > 0 && self.replication_factor as usize > addresses {
            return Err(ProducerError::config(format!(
                "replication_factor {} exceeds the {} configured address(es)",
                self.replication_factor, addresses
            )));
        }
        Ok(())
    }

    /// Effective replica count after normalization
    pub fn replicas(&self) -> usize {
        self.replication_factor.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProducerConfig::default();
        assert_eq!(config.address, vec!["localhost:4150".to_string()]);
        assert_eq!(config.replication_factor, 1);
        assert!(config.ping_on_connect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalized_fills_address_and_replication() {
        let config = ProducerConfig {
            address: vec![],
            replication_factor: -3,
            ..ProducerConfig::default()
        }
        .normalized();
        assert_eq!(config.address, vec![DEFAULT_ADDRESS.to_string()]);
        assert_eq!(config.replication_factor, 1);

        let zero = ProducerConfig::default().with_replication_factor(0).normalized();
        assert_eq!(zero.replication_factor, 1);
        assert_eq!(zero.replicas(), 1);
    }

    #[test]
    fn test_validate_rejects_blank_address() {
        let config = ProducerConfig::new(["a:4150", " "]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("address[1]"));
    }

    #[test]
    fn test_validate_rejects_excess_replication() {
        let config = ProducerConfig::new(["a:4150", "b:4150"]).with_replication_factor(3);
        assert!(matches!(config.validate(), Err(ProducerError::Config(_))));
        assert!(config.with_replication_factor(2).validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: ProducerConfig = toml::from_str(
            r#"
            address = ["n1:4150", "n2:4150"]
            replication_factor = 2

            [transport]
            max_in_flight = "200"
            "#,
        )
        .unwrap();
        assert_eq!(config.address.len(), 2);
        assert_eq!(config.replication_factor, 2);
        assert!(config.ping_on_connect);
        assert_eq!(config.transport.get("max_in_flight").map(String::as_str), Some("200"));
    }
}
