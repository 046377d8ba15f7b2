//! Application settings
//!
//! Settings are read once at startup from a JSON document. The bastion values live
//! under a `BastionSettings` section so they can share a file with the rest of the
//! application's configuration:
//!
//! ```json
//! {
//!   "BastionSettings": {
//!     "site_admin": "Admin",
//!     "lockout": {
//!       "enabled": true,
//!       "max_failures": 5,
//!       "lockout_window_secs": 900,
//!       "retention_period_secs": 604800
//!     }
//!   }
//! }
//! ```
//!
//! A document without the section is read as the settings object itself.

use std::path::Path;

use bastion_core::{
    Error, LockoutPolicy,
    error::{ConfigError, utilities::RequiredSettingExt},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Name of the JSON section holding bastion's settings.
pub const SETTINGS_SECTION: &str = "BastionSettings";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// `UserId` claim value of the single site administrator
    pub site_admin: Option<String>,
    #[serde(default)]
    pub lockout: LockoutSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutSettings {
    pub enabled: bool,
    pub max_failures: u32,
    pub lockout_window_secs: i64,
    pub retention_period_secs: i64,
}

impl Default for LockoutSettings {
    fn default() -> Self {
        let policy = LockoutPolicy::default();
        Self {
            enabled: policy.enabled,
            max_failures: policy.max_failures,
            lockout_window_secs: policy.lockout_window.num_seconds(),
            retention_period_secs: policy.retention_period.num_seconds(),
        }
    }
}

impl LockoutSettings {
    /// Convert to a policy. Seconds beyond the representable range saturate, so
    /// [`LockoutPolicy::validate`] rejects them instead of the conversion panicking.
    pub fn to_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            enabled: self.enabled,
            max_failures: self.max_failures,
            lockout_window: seconds(self.lockout_window_secs),
            retention_period: seconds(self.retention_period_secs),
        }
    }
}

fn seconds(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(if secs < 0 { Duration::MIN } else { Duration::MAX })
}

impl Settings {
    /// Parse settings from JSON, using the `BastionSettings` section when present.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let document: serde_json::Value = serde_json::from_str(json).map_err(load_error)?;
        let section = document
            .get(SETTINGS_SECTION)
            .cloned()
            .unwrap_or(document);
        serde_json::from_value(section).map_err(load_error)
    }

    /// Parse the named section of a JSON document.
    pub fn from_section(json: &str, section: &str) -> Result<Self, Error> {
        let document: serde_json::Value = serde_json::from_str(json).map_err(load_error)?;
        let value = document
            .get(section)
            .cloned()
            .ok_or_else(|| ConfigError::MissingSetting(section.to_string()))?;
        serde_json::from_value(value).map_err(load_error)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Load(format!("Failed to read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "Loaded settings file");
        Self::from_json_str(&json)
    }

    pub fn with_site_admin(mut self, site_admin: &str) -> Self {
        self.site_admin = Some(site_admin.to_string());
        self
    }

    pub fn site_admin(&self) -> Result<&str, ConfigError> {
        self.site_admin
            .as_deref()
            .filter(|admin| !admin.trim().is_empty())
            .require_setting("site_admin")
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        self.lockout.to_policy()
    }

    /// Check that every required value is present and consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site_admin()?;
        self.lockout_policy().validate()
    }
}

fn load_error(error: serde_json::Error) -> Error {
    ConfigError::Load(error.to_string()).into()
}
