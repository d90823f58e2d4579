//! Feed configuration loading and validation.
//!
//! # Responsibility
//! - Parse JSON feed configuration files.
//! - Reject configurations the paging client cannot run with.
//!
//! # Invariants
//! - A validated config always has `page_limit > 0`, an http(s) base URL
//!   and at least one identity field.

use crate::model::page::DEFAULT_PAGE_LIMIT;
use crate::paging::http::EndpointConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    ZeroPageLimit,
    InvalidBaseUrl(String),
    MissingIdentityFields,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::ZeroPageLimit => write!(f, "page_limit must be greater than zero"),
            Self::InvalidBaseUrl(value) => {
                write!(f, "base_url must be an http(s) URL, got `{value}`")
            }
            Self::MissingIdentityFields => {
                write!(f, "identity_fields must name at least one non-blank field")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

/// Top-level configuration for one feed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub endpoint: EndpointConfig,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// One of `trace|debug|info|warn|error`; build default when absent.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl FeedConfig {
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_limit == 0 {
            return Err(ConfigError::ZeroPageLimit);
        }

        let base_url = self.endpoint.base_url.trim();
        let has_scheme = base_url.starts_with("http://") || base_url.starts_with("https://");
        if !has_scheme || base_url.ends_with("://") {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }

        let fields = &self.endpoint.identity_fields;
        if fields.is_empty() || fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ConfigError::MissingIdentityFields);
        }

        Ok(())
    }
}
