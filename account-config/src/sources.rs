use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{non_blank, parse_limit};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub limits: FileLimitsConfig,
    #[serde(default)]
    pub sign_out: FileSignOutConfig,
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLimitsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name_max: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_max: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_max: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_max: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSignOutConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webapp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_path: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub display_name_max: Option<usize>,
    pub username_max: Option<usize>,
    pub bio_max: Option<usize>,
    pub webapp_url: Option<String>,
    pub hosted_url: Option<String>,
    pub logout_path: Option<String>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `gather` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            config_path: lookup("PROFILE_EDITOR_CONFIG")
                .and_then(non_blank)
                .map(PathBuf::from),
            display_name_max: lookup("DISPLAY_NAME_MAX_LENGTH")
                .and_then(|raw| parse_limit(&raw)),
            username_max: lookup("USERNAME_MAX_LENGTH")
                .and_then(|raw| parse_limit(&raw)),
            bio_max: lookup("BIO_MAX_LENGTH").and_then(|raw| parse_limit(&raw)),
            webapp_url: lookup("WEBAPP_URL").and_then(non_blank),
            hosted_url: lookup("HOSTED_WEBAPP_URL").and_then(non_blank),
            logout_path: lookup("LOGOUT_PATH").and_then(non_blank),
            log_filter: lookup("PROFILE_EDITOR_LOG").and_then(non_blank),
        }
    }
}
