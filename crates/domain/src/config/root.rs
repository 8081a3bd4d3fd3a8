use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::locator::LocatorConfig;
use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;
use crate::netlogon::nt_version;

/// Main configuration structure for dclocate
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// DC locator behaviour (service prefix, ping timeouts, NetLogon version)
    #[serde(default)]
    pub locator: LocatorConfig,

    /// SRV resolution (nameservers, transport)
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dclocate.toml in current directory
    /// 3. /etc/dclocate/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("dclocate.toml").exists() {
            Self::from_file("dclocate.toml")?
        } else if std::path::Path::new("/etc/dclocate/config.toml").exists() {
            Self::from_file("/etc/dclocate/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(prefix) = overrides.service_prefix {
            self.locator.service_prefix = prefix;
        }
        if let Some(timeout) = overrides.ping_timeout_ms {
            self.locator.ping_timeout_ms = timeout;
        }
        if let Some(host) = overrides.host_filter {
            self.locator.host_filter = Some(host);
        }
        if !overrides.nameservers.is_empty() {
            self.resolver.nameservers = overrides.nameservers;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locator.service_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Service prefix cannot be empty".to_string(),
            ));
        }

        if self.locator.ping_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Ping timeout cannot be 0".to_string(),
            ));
        }

        if self.locator.total_timeout_ms == Some(0) {
            return Err(ConfigError::Validation(
                "Total timeout cannot be 0".to_string(),
            ));
        }

        if self.locator.cldap_port == 0 || self.resolver.dns_port == 0 {
            return Err(ConfigError::Validation("Ports cannot be 0".to_string()));
        }

        if self.locator.nt_version & (nt_version::V5EX | nt_version::V5EX_WITH_IP) == 0 {
            return Err(ConfigError::Validation(format!(
                "NtVersion 0x{:08x} does not request an extended (5EX) response",
                self.locator.nt_version
            )));
        }

        if self.resolver.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "DNS query timeout cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub service_prefix: Option<String>,
    pub ping_timeout_ms: Option<u64>,
    pub host_filter: Option<String>,
    pub nameservers: Vec<String>,
    pub log_level: Option<String>,
}
