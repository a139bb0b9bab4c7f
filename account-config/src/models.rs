use std::path::PathBuf;

use url::Url;

pub const DEFAULT_DISPLAY_NAME_MAX: usize = 50;
pub const DEFAULT_USERNAME_MAX: usize = 255;
pub const DEFAULT_EMAIL_MAX: usize = 254;
pub const DEFAULT_WEBAPP_URL: &str = "http://localhost:3000";
pub const DEFAULT_HOSTED_URL: &str = "https://app.cal.com";
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    pub limits: ProfileLimits,
    pub sign_out: SignOutConfig,
    pub logging: LoggingConfig,
    pub metadata: ConfigMetadata,
}

/// Field length limits enforced before any backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileLimits {
    pub display_name_max: usize,
    pub username_max: usize,
    /// `None` leaves the bio unbounded
    pub bio_max: Option<usize>,
    pub email_max: usize,
}

impl Default for ProfileLimits {
    fn default() -> Self {
        Self {
            display_name_max: DEFAULT_DISPLAY_NAME_MAX,
            username_max: DEFAULT_USERNAME_MAX,
            bio_max: None,
            email_max: DEFAULT_EMAIL_MAX,
        }
    }
}

/// Where the browser lands after the account is deleted.
#[derive(Debug, Clone)]
pub struct SignOutConfig {
    pub webapp_url: Url,
    /// Origin of the hosted deployment; sign-outs there get an exit survey
    pub hosted_url: Url,
    pub logout_path: String,
}

impl Default for SignOutConfig {
    fn default() -> Self {
        Self {
            webapp_url: Url::parse(DEFAULT_WEBAPP_URL)
                .expect("default webapp url is valid"),
            hosted_url: Url::parse(DEFAULT_HOSTED_URL)
                .expect("default hosted url is valid"),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
        }
    }
}

impl SignOutConfig {
    pub fn is_hosted(&self) -> bool {
        self.webapp_url.origin() == self.hosted_url.origin()
    }

    /// Callback URL used when the session is terminated after deletion.
    pub fn logout_url(&self) -> Url {
        let mut url = self.webapp_url.clone();
        url.set_path(&self.logout_path);
        url.set_query(None);
        if self.is_hosted() {
            url.query_pairs_mut().append_pair("survey", "true");
        }
        url
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
