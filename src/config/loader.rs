//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{ListenerConfig, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied through the environment or command line.
///
/// These win over anything in the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `BACKEND_URL`
    pub backend_url: Option<String>,
    /// `PORT`
    pub port: Option<u16>,
}

impl Overrides {
    /// Apply these overrides on top of `config`.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(url) = &self.backend_url {
            config.backend.url = url.clone();
        }
        if let Some(port) = self.port {
            config.listener = ListenerConfig::on_port(port);
        }
    }
}

/// Parse a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: defaults, then the optional file,
/// then overrides. The result is validated.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
