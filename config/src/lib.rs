//! Configuration for intake, read from `~/.intake/config.toml`.
//!
//! Every section and key is optional; missing values resolve to the defaults
//! the site's forms were built against. String values may reference
//! environment variables as `${VAR}`.
//!
//! ```toml
//! [api]
//! base_url = "${INTAKE_API_URL}"
//! timeout_secs = 30
//! max_retries = 0
//!
//! [autosave]
//! enabled = true
//! debounce_ms = 1000
//! dir = "/var/lib/intake/drafts"
//!
//! [phone]
//! calling_code = "92"
//! trunk_prefix = "0"
//! example = "+92 300 1234567"
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use intake_core::CallingCodeRule;
use intake_transport::{DEFAULT_BASE_URL, HttpTransportConfig, RetryConfig};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct IntakeConfig {
    pub api: Option<ApiConfig>,
    pub autosave: Option<AutosaveConfig>,
    pub phone: Option<PhoneConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutosaveConfig {
    pub enabled: Option<bool>,
    pub debounce_ms: Option<u64>,
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhoneConfig {
    pub calling_code: Option<String>,
    pub trunk_prefix: Option<String>,
    pub example: Option<String>,
}

/// Replace `${VAR}` references with the variable's value (empty if unset).
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl IntakeConfig {
    /// Load the user config. `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        // Surface bad phone settings at load time rather than first validation.
        config.phone_rule()?;
        Ok(config)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        self.api
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .map(expand_env_vars)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Upper bound on one submission's network call.
    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        let secs = self
            .api
            .as_ref()
            .and_then(|a| a.timeout_secs)
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn transport_config(&self) -> HttpTransportConfig {
        let max_retries = self.api.as_ref().and_then(|a| a.max_retries).unwrap_or(0);
        HttpTransportConfig {
            base_url: self.base_url(),
            timeout: self.submit_timeout(),
            retry: RetryConfig::default().with_max_retries(max_retries),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn autosave_enabled(&self) -> bool {
        self.autosave.as_ref().and_then(|a| a.enabled).unwrap_or(true)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        let ms = self
            .autosave
            .as_ref()
            .and_then(|a| a.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        Duration::from_millis(ms)
    }

    /// Directory holding draft files; `None` if no home directory is known
    /// and none is configured.
    #[must_use]
    pub fn draft_dir(&self) -> Option<PathBuf> {
        self.autosave
            .as_ref()
            .and_then(|a| a.dir.as_deref())
            .map(expand_env_vars)
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| config_dir().map(|dir| dir.join("drafts")))
    }

    pub fn phone_rule(&self) -> Result<CallingCodeRule, ConfigError> {
        let Some(phone) = &self.phone else {
            return Ok(CallingCodeRule::default());
        };
        let defaults = CallingCodeRule::default();

        let calling_code = phone
            .calling_code
            .as_deref()
            .map(|c| c.trim().trim_start_matches('+'))
            .unwrap_or(defaults.calling_code())
            .to_string();
        if calling_code.is_empty() || !calling_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                key: "phone.calling_code",
                reason: format!("expected digits, got `{calling_code}`"),
            });
        }

        let trunk_prefix = match phone.trunk_prefix.as_deref().map(str::trim) {
            None => Some('0'),
            Some("") => None,
            Some(p) => {
                let mut chars = p.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Some(c),
                    _ => {
                        return Err(ConfigError::Invalid {
                            key: "phone.trunk_prefix",
                            reason: format!("expected a single digit, got `{p}`"),
                        });
                    }
                }
            }
        };

        let mut rule = CallingCodeRule::new(calling_code, trunk_prefix);
        if let Some(example) = phone.example.as_deref().filter(|e| !e.trim().is_empty()) {
            rule = rule.with_example(example);
        }
        Ok(rule)
    }
}

fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".intake"))
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
