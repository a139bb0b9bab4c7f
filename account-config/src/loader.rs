use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

use crate::models::{
    ConfigMetadata, DEFAULT_EMAIL_MAX, DEFAULT_DISPLAY_NAME_MAX,
    DEFAULT_HOSTED_URL, DEFAULT_LOG_FILTER, DEFAULT_LOGOUT_PATH,
    DEFAULT_USERNAME_MAX, DEFAULT_WEBAPP_URL, EditorConfig, LoggingConfig,
    ProfileLimits, SignOutConfig,
};
use crate::sources::{EnvConfig, FileConfig};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("profile-editor.toml"),
        PathBuf::from("config/profile-editor.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Use these values instead of reading the process environment
    pub env_override: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: EditorConfig,
    pub warnings: Vec<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env_override = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env = self
            .options
            .env_override
            .clone()
            .unwrap_or_else(EnvConfig::gather);

        let (file_config, config_path) = self.load_file_config(&env)?;

        let mut warnings = Vec::new();
        if config_path.is_none() {
            warnings.push(
                "No profile-editor.toml detected; using defaults and environment variables"
                    .to_string(),
            );
        }

        let config = compose_config(
            file_config.unwrap_or_default(),
            env,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path)
        {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => (found.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Merge file and environment layers; environment values win.
fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<EditorConfig, ConfigLoadError> {
    let FileConfig {
        limits: file_limits,
        sign_out: file_sign_out,
        logging: file_logging,
    } = file;

    let limits = ProfileLimits {
        display_name_max: env
            .display_name_max
            .or(file_limits.display_name_max)
            .unwrap_or(DEFAULT_DISPLAY_NAME_MAX),
        username_max: env
            .username_max
            .or(file_limits.username_max)
            .unwrap_or(DEFAULT_USERNAME_MAX),
        bio_max: env.bio_max.or(file_limits.bio_max),
        email_max: file_limits.email_max.unwrap_or(DEFAULT_EMAIL_MAX),
    };
    validate_limits(&limits)?;

    let webapp_url = parse_url(
        "webapp_url",
        env.webapp_url
            .or(file_sign_out.webapp_url)
            .as_deref()
            .unwrap_or(DEFAULT_WEBAPP_URL),
    )?;
    let hosted_url = parse_url(
        "hosted_url",
        env.hosted_url
            .or(file_sign_out.hosted_url)
            .as_deref()
            .unwrap_or(DEFAULT_HOSTED_URL),
    )?;
    let logout_path = env
        .logout_path
        .or(file_sign_out.logout_path)
        .unwrap_or_else(|| DEFAULT_LOGOUT_PATH.to_string());
    if !logout_path.starts_with('/') {
        return Err(ConfigLoadError::InvalidLogoutPath { path: logout_path });
    }

    let logging = LoggingConfig {
        filter: env
            .log_filter
            .or(file_logging.filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
    };

    Ok(EditorConfig {
        limits,
        sign_out: SignOutConfig {
            webapp_url,
            hosted_url,
            logout_path,
        },
        logging,
        metadata,
    })
}

fn validate_limits(limits: &ProfileLimits) -> Result<(), ConfigLoadError> {
    let checks = [
        ("display_name_max", Some(limits.display_name_max)),
        ("username_max", Some(limits.username_max)),
        ("bio_max", limits.bio_max),
        ("email_max", Some(limits.email_max)),
    ];
    for (field, value) in checks {
        if value == Some(0) {
            return Err(ConfigLoadError::ZeroLimit { field });
        }
    }
    Ok(())
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigLoadError> {
    Url::parse(raw).map_err(|source| ConfigLoadError::InvalidUrl {
        field,
        value: raw.to_string(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {field} '{value}'")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("logout path must be absolute, got '{path}'")]
    InvalidLogoutPath { path: String },
    #[error("limit {field} must be greater than zero")]
    ZeroLimit { field: &'static str },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
