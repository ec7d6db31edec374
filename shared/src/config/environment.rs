//! Deployment environment and log output settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where the token engine is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Read `IDP_ENVIRONMENT`, falling back to `ENVIRONMENT`
    ///
    /// Unset or unrecognised values mean development.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("IDP_ENVIRONMENT")
            .or_else(|| lookup("ENVIRONMENT"))
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    /// Per-environment dotenv file, loaded before `.env`
    pub fn env_file(&self) -> &'static str {
        match self {
            Environment::Development => ".env.development",
            Environment::Staging => ".env.staging",
            Environment::Production => ".env.production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        })
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" | "test" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Settings for the tracing subscriber
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `idp_core=debug,info`
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// ANSI colours (pretty and compact only)
    #[serde(default)]
    pub colored: bool,

    /// Include file and line
    #[serde(default)]
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl LoggingConfig {
    /// Defaults for an environment: verbose pretty output locally, JSON elsewhere
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                level: String::from("debug"),
                format: LogFormat::Pretty,
                colored: true,
                source_location: true,
            },
            Environment::Staging => Self {
                level: String::from("info"),
                format: LogFormat::Json,
                colored: false,
                source_location: false,
            },
            Environment::Production => Self {
                level: String::from("info"),
                format: LogFormat::Json,
                colored: false,
                source_location: false,
            },
        }
    }

    /// Environment defaults overridden by `LOG_LEVEL` and `LOG_FORMAT`
    ///
    /// An unknown `LOG_FORMAT` keeps the environment default.
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_environment(environment);
        if let Some(level) = lookup("LOG_LEVEL").filter(|level| !level.trim().is_empty()) {
            config.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT").and_then(|format| format.parse().ok()) {
            config.format = format;
        }
        config
    }
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_environment_lookup_prefers_idp_variable() {
        let env = Environment::from_lookup(lookup(&[("IDP_ENVIRONMENT", "prod"), ("ENVIRONMENT", "dev")]));
        assert_eq!(env, Environment::Production);

        let env = Environment::from_lookup(lookup(&[("ENVIRONMENT", "Staging")]));
        assert_eq!(env, Environment::Staging);

        let env = Environment::from_lookup(lookup(&[("IDP_ENVIRONMENT", "moon")]));
        assert_eq!(env, Environment::Development);
    }

    #[test]
    fn test_environment_display_parses_back() {
        for env in [Environment::Development, Environment::Staging, Environment::Production] {
            assert_eq!(env.to_string().parse::<Environment>(), Ok(env));
        }
        assert_eq!(Environment::Staging.env_file(), ".env.staging");
    }

    #[test]
    fn test_logging_overrides() {
        let config = LoggingConfig::from_lookup(
            Environment::Production,
            lookup(&[("LOG_LEVEL", "idp_core=debug,warn"), ("LOG_FORMAT", "compact")]),
        );
        assert_eq!(config.level, "idp_core=debug,warn");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.colored);

        let config = LoggingConfig::from_lookup(Environment::Development, lookup(&[("LOG_FORMAT", "xml")]));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "debug");
    }
}
