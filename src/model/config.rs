use std::env;

use serde::{Deserialize, Serialize};

/// Placeholder credential shipped with the defaults; treated as "not set".
pub const UNSET_CREDENTIAL: &str = "YOUR_API_KEY_HERE";

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_KEY: &str = "TURNWEAVER_API_KEY";
pub const ENV_ENDPOINT: &str = "TURNWEAVER_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "TURNWEAVER_TIMEOUT_SECS";

/// Backend connection settings. Lives only for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub endpoint: String,
    pub credential: String,
    pub timeout_secs: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            credential: UNSET_CREDENTIAL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Partial replacement applied by `update_config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub endpoint: Option<String>,
    pub credential: Option<String>,
}

impl ConfigUpdate {
    pub fn credential(value: impl Into<String>) -> Self {
        Self {
            credential: Some(value.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Valid,
    Unconfigured,
}

impl Configuration {
    /// Defaults overlaid with `TURNWEAVER_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = env::var(ENV_API_KEY) {
            config.credential = key;
        }
        if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }
        if let Some(secs) = env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.timeout_secs = secs;
        }

        config
    }

    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(endpoint) = update.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(credential) = update.credential {
            self.credential = credential;
        }
    }

    /// Format check only; says nothing about whether the key works.
    pub fn credential_status(&self) -> CredentialStatus {
        let key = self.credential.trim();
        if key.is_empty() || key == UNSET_CREDENTIAL {
            CredentialStatus::Unconfigured
        } else {
            CredentialStatus::Valid
        }
    }
}
