use crate::config::{FetchConfig, ResourceOptions, DEFAULT_INTERNAL_AUTH_HEADER};
use crate::utils::error::{FetchError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub internal_auth: InternalAuthConfig,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceOptions>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InternalAuthConfig {
    pub header: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// Loads a config file, substituting `${VAR}` from the process environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FetchError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, |name| std::env::var(name).ok())
    }

    /// Like [`TomlConfig::from_toml_str`] with an explicit variable source.
    pub fn from_toml_str_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed_content = substitute_vars(content, lookup)?;

        toml::from_str(&processed_content).map_err(|e| FetchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn into_fetch_config(self) -> FetchConfig {
        FetchConfig {
            base_url: resolved(self.deployment.base_url),
            internal_api_key: resolved(self.internal_auth.api_key),
            internal_auth_header: resolved(self.internal_auth.header)
                .unwrap_or_else(|| DEFAULT_INTERNAL_AUTH_HEADER.to_string()),
            resources: self.resources,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            if !["trace", "debug", "info", "warn", "error", "off"].contains(&level) {
                return Err(FetchError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: "Valid levels: trace, debug, info, warn, error, off".to_string(),
                });
            }
        }
        self.clone().into_fetch_config().validate()
    }
}

/// Replaces `${VAR}` with the variable's value. Unknown variables are left as-is.
fn substitute_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FetchError::ConfigError {
        message: format!("variable pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

/// Blank values and values still holding an unresolved `${VAR}` count as unset.
fn resolved(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let unresolved = v.contains("${");
        if unresolved {
            tracing::debug!("Treating unresolved config value '{}' as unset", v);
        }
        !v.trim().is_empty() && !unresolved
    })
}
