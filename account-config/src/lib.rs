//! Shared configuration library for the account profile editor.
//!
//! Configuration is layered: a TOML file (explicit path, `PROFILE_EDITOR_CONFIG`,
//! or one of the default locations), then environment variables (optionally
//! seeded from `.env`). The merged result is validated before it is handed to
//! the editor core.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod telemetry;
pub mod util;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    ConfigMetadata, EditorConfig, LoggingConfig, ProfileLimits, SignOutConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use telemetry::init_tracing;
