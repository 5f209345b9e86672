// SPDX-License-Identifier: Apache-2.0

//! Logging configuration
//!
//! Settings are read per connection from three places, first hit wins:
//! connection properties, URL query parameters, then process environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::engine::connection_url::{param_from_url, PARAM_LOG_FILE, PARAM_LOG_LEVEL};
use crate::engine::types::ConnectionProperties;

/// Target prefix shared by every event this crate emits
pub const LOG_TARGET: &str = "sqlshim";

/// Process-wide default for the log level
pub const ENV_LOG_LEVEL: &str = "SQLSHIM_LOG_LEVEL";

/// Process-wide default for the log file
pub const ENV_LOG_FILE: &str = "SQLSHIM_LOG_FILE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),
}

/// Verbosity of the shim's own events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a level name, case-insensitively.
    ///
    /// Besides the usual names this accepts the java.util.logging ones
    /// (`SEVERE`, `WARNING`, `CONFIG`, `FINE`, `FINER`, `FINEST`, `ALL`),
    /// so existing connection strings keep working.
    pub fn parse(name: &str) -> Option<Self> {
        let level = match name.trim().to_ascii_uppercase().as_str() {
            "OFF" => LogLevel::Off,
            "ERROR" | "SEVERE" => LogLevel::Error,
            "WARN" | "WARNING" => LogLevel::Warn,
            "INFO" | "CONFIG" => LogLevel::Info,
            "DEBUG" | "FINE" | "FINER" => LogLevel::Debug,
            "TRACE" | "FINEST" | "ALL" => LogLevel::Trace,
            _ => return None,
        };
        Some(level)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// `EnvFilter` directive limiting this level to the crate's own target
    pub fn directive(&self) -> String {
        format!("{}={}", LOG_TARGET, self.as_str())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConfigError::UnknownLevel(s.to_string()))
    }
}

/// Logging settings requested by one connection attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: Option<LogLevel>,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Resolves settings from properties, the URL and the process environment
    pub fn resolve(url: &str, props: &ConnectionProperties) -> Self {
        Self::resolve_with(url, props, |key| std::env::var(key).ok())
    }

    /// Like [`LogSettings::resolve`] with an explicit environment lookup
    pub fn resolve_with<F>(url: &str, props: &ConnectionProperties, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup(PARAM_LOG_LEVEL, ENV_LOG_LEVEL, url, props, &env).and_then(|name| {
            let level = LogLevel::parse(&name);
            if level.is_none() {
                warn!(level = %name, "Ignoring unknown log level");
            }
            level
        });

        let file = lookup(PARAM_LOG_FILE, ENV_LOG_FILE, url, props, &env).map(PathBuf::from);

        Self { level, file }
    }

    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.file.is_none()
    }
}

/// First source that defines `key` decides; an empty value there means unset.
fn lookup<F>(
    key: &str,
    env_key: &str,
    url: &str,
    props: &ConnectionProperties,
    env: &F,
) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match props.get(key) {
        Some(value) => Some(value.to_string()),
        None => param_from_url(url, key).or_else(|| env(env_key)),
    };

    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
