//! Configuration management for the sandftp server
//!
//! Values come from an optional TOML file layered under `SANDFTP_*`
//! environment overrides. Every key has a default, so a missing file still
//! yields a working server.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration file name, resolved as `config.toml`.
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// Environment variable prefix, e.g. `SANDFTP_CONTROL_PORT`.
pub const ENV_PREFIX: &str = "SANDFTP";

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address for the control listener; passive listeners bind here too
    pub bind_address: String,

    /// Port for the control connection, 0 for an ephemeral port
    pub control_port: u16,

    /// Inclusive port range for PASV listeners
    pub passive_port_min: u16,
    pub passive_port_max: u16,

    /// IPv4 address announced in 227 replies
    pub passive_address: Option<String>,

    /// Base directory holding per-user roots
    pub data_root: PathBuf,

    /// Maximum concurrent sessions
    pub max_clients: usize,

    pub data_connection_timeout_secs: u64,

    /// Buffer size for file transfers
    pub buffer_size: usize,

    /// Maximum control line length in bytes
    pub max_command_length: usize,

    pub users: Vec<UserEntry>,
}

/// One account of the user database.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub login: String,
    #[serde(default)]
    pub password: String,
    /// Explicit root directory; defaults to `data_root/<login>`
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl UserEntry {
    pub fn new(login: &str, password: &str) -> Self {
        Self {
            login: login.to_string(),
            password: password.to_string(),
            root: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            passive_port_min: 5000,
            passive_port_max: 5100,
            passive_address: None,
            data_root: PathBuf::from("Data"),
            max_clients: 16,
            data_connection_timeout_secs: 30,
            buffer_size: 4096,
            max_command_length: 512,
            users: vec![UserEntry::new("anonymous", ""), UserEntry::new("foo", "bar")],
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path` (or `config.toml`) with environment
    /// overrides. The file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::with_name(path.unwrap_or(DEFAULT_CONFIG_NAME)).required(path.is_some()),
            )
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_ip()?;

        if self.passive_port_min == 0 {
            return Err(ConfigError::Message(
                "passive_port_min must be greater than 0".into(),
            ));
        }

        if self.passive_port_min > self.passive_port_max {
            return Err(ConfigError::Message(
                "passive_port_min must not exceed passive_port_max".into(),
            ));
        }

        self.announced_passive_ip()?;

        if self.data_root.as_os_str().is_empty() {
            return Err(ConfigError::Message("data_root cannot be empty".into()));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.login.trim().is_empty() {
                return Err(ConfigError::Message("user login cannot be empty".into()));
            }
            if !seen.insert(user.login.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate user login: {}",
                    user.login
                )));
            }
        }

        Ok(())
    }

    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address.parse().map_err(|_| {
            ConfigError::Message(format!("invalid bind_address: {}", self.bind_address))
        })
    }

    /// Configured passive announce address, if any.
    pub fn announced_passive_ip(&self) -> Result<Option<Ipv4Addr>, ConfigError> {
        self.passive_address
            .as_deref()
            .map(|addr| {
                addr.parse().map_err(|_| {
                    ConfigError::Message(format!("invalid passive_address: {}", addr))
                })
            })
            .transpose()
    }

    pub fn passive_range(&self) -> RangeInclusive<u16> {
        self.passive_port_min..=self.passive_port_max
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_connection_timeout_secs)
    }

    /// Root directory of `user` before canonicalization.
    pub fn user_root(&self, user: &UserEntry) -> PathBuf {
        user.root
            .clone()
            .unwrap_or_else(|| self.data_root.join(&user.login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.passive_range(), 5000..=5100);
        assert_eq!(config.user_root(&config.users[1]), PathBuf::from("Data/foo"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
control_port = 2400
passive_port_min = 6000
passive_port_max = 6010
passive_address = "192.0.2.1"

[[users]]
login = "alice"
password = "secret"
root = "/srv/alice"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.control_port, 2400);
        assert_eq!(config.passive_range(), 6000..=6010);
        assert_eq!(
            config.announced_passive_ip().unwrap(),
            Some(Ipv4Addr::new(192, 0, 2, 1))
        );
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.user_root(&config.users[0]), PathBuf::from("/srv/alice"));
        assert_eq!(config.buffer_size, 4096);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(ServerConfig::load(Some("/nonexistent/sandftp-config")).is_err());
    }

    #[test]
    fn rejects_inverted_passive_range() {
        let config = ServerConfig {
            passive_port_min: 5100,
            passive_port_max: 5000,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_addresses() {
        let config = ServerConfig {
            bind_address: "not-an-ip".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            passive_address: Some("::1".into()),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_logins() {
        let config = ServerConfig {
            users: vec![UserEntry::new("foo", "a"), UserEntry::new("foo", "b")],
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        for config in [
            ServerConfig {
                max_clients: 0,
                ..ServerConfig::default()
            },
            ServerConfig {
                buffer_size: 0,
                ..ServerConfig::default()
            },
            ServerConfig {
                passive_port_min: 0,
                ..ServerConfig::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }
}
