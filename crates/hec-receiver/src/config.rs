// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_REGION: &str = "US";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_PORT: u16 = 8088;
pub const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_BIND_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for the mock HEC receiver
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Region stamped on events that don't carry `fields.region`
    pub region: String,
    /// Directory holding one `<index>.log` file per index
    pub log_dir: PathBuf,
    pub port: u16,
    pub bind_host: IpAddr,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            port: DEFAULT_PORT,
            bind_host: DEFAULT_BIND_HOST,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let region = env::var("REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR));
        let port = match env::var("PORT") {
            Ok(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?,
            Err(_) => DEFAULT_PORT,
        };
        let bind_host = match env::var("BIND_HOST") {
            Ok(host) => host
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidBindHost(host.clone()))?,
            Err(_) => DEFAULT_BIND_HOST,
        };
        let log_level = env::var("LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

        let config = Self {
            region,
            log_dir,
            port,
            bind_host,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if self.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }

        if self.log_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyLogDir);
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }
}
