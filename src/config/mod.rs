#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::api::Resource;
use crate::domain::model::EnvelopeMode;
use crate::utils::error::{FetchError, Result};
use crate::utils::validation::{validate_header_name, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENV_BASE_URL: &str = "DASHBOARD_BASE_URL";
pub const ENV_INTERNAL_API_KEY: &str = "DASHBOARD_INTERNAL_API_KEY";
pub const ENV_INTERNAL_AUTH_HEADER: &str = "DASHBOARD_INTERNAL_AUTH_HEADER";
pub const DEFAULT_INTERNAL_AUTH_HEADER: &str = "x-api-key";

/// Per-resource call profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOptions {
    #[serde(default)]
    pub requires_internal_auth: bool,
    #[serde(default)]
    pub envelope: EnvelopeMode,
}

/// Everything the fetcher needs, injected once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Used when the inbound request carries no host signal.
    pub base_url: Option<String>,
    pub internal_api_key: Option<String>,
    pub internal_auth_header: String,
    pub resources: BTreeMap<String, ResourceOptions>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            internal_api_key: None,
            internal_auth_header: DEFAULT_INTERNAL_AUTH_HEADER.to_string(),
            resources: BTreeMap::new(),
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            base_url: read(ENV_BASE_URL),
            internal_api_key: read(ENV_INTERNAL_API_KEY),
            internal_auth_header: read(ENV_INTERNAL_AUTH_HEADER)
                .unwrap_or_else(|| DEFAULT_INTERNAL_AUTH_HEADER.to_string()),
            resources: BTreeMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_internal_api_key(mut self, key: impl Into<String>) -> Self {
        self.internal_api_key = Some(key.into());
        self
    }

    pub fn with_internal_auth_header(mut self, header: impl Into<String>) -> Self {
        self.internal_auth_header = header.into();
        self
    }

    pub fn fallback_base_url(&self) -> Option<&str> {
        self.base_url.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn internal_api_key(&self) -> Option<&str> {
        self.internal_api_key.as_deref().filter(|v| !v.is_empty())
    }
}

impl Validate for FetchConfig {
    fn validate(&self) -> Result<()> {
        // A missing base URL is allowed: request-derived hosts still work.
        if let Some(base_url) = self.fallback_base_url() {
            validate_url("deployment.base_url", base_url)?;
        }

        validate_header_name("internal_auth.header", &self.internal_auth_header)?;

        for name in self.resources.keys() {
            name.parse::<Resource>()
                .map_err(|_| FetchError::InvalidConfigValueError {
                    field: "resources".to_string(),
                    value: name.clone(),
                    reason: format!(
                        "Unknown resource. Valid resources: {}",
                        Resource::ALL
                            .iter()
                            .map(|r| r.name())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })?;
        }

        if self.internal_api_key().is_none()
            && self.resources.values().any(|r| r.requires_internal_auth)
        {
            tracing::warn!(
                "Some resources require internal auth but {} is not set",
                ENV_INTERNAL_API_KEY
            );
        }

        Ok(())
    }
}
