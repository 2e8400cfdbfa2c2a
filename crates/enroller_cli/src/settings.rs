//! CLI settings.
//!
//! Loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables prefixed with `ENROLLER_`
//! 3. Config file (~/.config/enroller/config.toml or ./enroller.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! gitlab_host = "https://gitlab.example.com"
//! callback_port = 18617
//! ```
//!
//! These are preferences of the terminal front-end only; the connector
//! configuration itself is the JSON blob managed by the local shell.

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Default port for the OAuth redirect listener.
pub const DEFAULT_CALLBACK_PORT: u16 = 18617;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default host for self-managed setups.
    pub gitlab_host: Option<String>,
    /// Port the redirect listener binds to.
    pub callback_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gitlab_host: None,
            callback_port: DEFAULT_CALLBACK_PORT,
        }
    }
}

impl Settings {
    /// Load settings: XDG config file, local file, then environment.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "enroller") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("loading settings from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local = PathBuf::from("enroller.toml");
        if local.exists() {
            tracing::debug!("loading settings from ./enroller.toml");
            builder = builder.add_source(File::from(local).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(Environment::with_prefix("ENROLLER").try_parsing(true));

        match builder
            .build()
            .and_then(|settings| settings.try_deserialize::<Settings>())
        {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("failed to load settings: {}", e);
                Settings::default()
            }
        }
    }

    /// Directory where the configuration blob lives.
    ///
    /// On Linux this is `$XDG_STATE_HOME/enroller` or
    /// `~/.local/state/enroller`; macOS and Windows fall back to the
    /// data directory.
    pub fn state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "enroller").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.gitlab_host.is_none());
        assert_eq!(settings.callback_port, DEFAULT_CALLBACK_PORT);
    }

    #[test]
    fn test_toml_overrides() {
        let toml_content = r#"
            gitlab_host = "https://gitlab.example.com"
            callback_port = 9000
        "#;

        let settings: Settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            settings.gitlab_host.as_deref(),
            Some("https://gitlab.example.com")
        );
        assert_eq!(settings.callback_port, 9000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_content = r#"gitlab_host = "https://git.internal""#;

        let settings: Settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.callback_port, DEFAULT_CALLBACK_PORT);
    }

    #[test]
    fn test_state_dir_contains_app_name() {
        let state_dir = Settings::state_dir().expect("state dir");
        assert!(state_dir.to_string_lossy().contains("enroller"));
    }
}
