//! File-backed host shell.
//!
//! Stands in for the hosting platform: the configuration blob is a JSON
//! file in the state directory, validation runs the fetch-accounts
//! pipeline against GitLab directly, and install flags surface on the
//! terminal instead of an install button.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use enroller::config::{Configuration, FETCH_ACCOUNTS};
use enroller::gitlab::GitLabClient;
use enroller::reconcile::fetch_accounts;
use enroller::redirect::RedirectContext;
use enroller::shell::{InstallLocation, IntegrationShell, ShellError, ValidationResult};

/// Blob file name inside the state directory.
const CONFIG_FILE: &str = "configuration.json";

pub struct LocalShell {
    path: PathBuf,
    installed: bool,
    redirect: Mutex<RedirectContext>,
    install_enabled: Mutex<bool>,
}

impl LocalShell {
    pub fn open(path: PathBuf, installed: bool) -> Self {
        Self {
            path,
            installed,
            redirect: Mutex::new(RedirectContext::default()),
            install_enabled: Mutex::new(false),
        }
    }

    /// Default blob path under the state directory.
    pub fn default_path() -> Result<PathBuf, ShellError> {
        crate::settings::Settings::state_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .ok_or_else(|| ShellError::Persistence("could not determine state directory".into()))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Mark a completed redirect so the wizard picks it up on its next
    /// pass.
    pub fn set_redirect(&self, current_url: String) {
        let mut ctx = self.redirect.lock().expect("redirect lock");
        *ctx = RedirectContext {
            loading: false,
            is_from_redirect: true,
            is_from_re_auth: false,
            current_url: Some(current_url),
        };
    }

    pub fn install_enabled(&self) -> bool {
        *self.install_enabled.lock().expect("install flag lock")
    }
}

#[async_trait]
impl IntegrationShell for LocalShell {
    fn configuration(&self) -> Configuration {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("stored configuration is unreadable, starting fresh: {}", e);
                Configuration::default()
            }),
            Err(_) => Configuration::default(),
        }
    }

    fn set_configuration(&self, config: &Configuration) -> Result<(), ShellError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ShellError::Persistence(e.to_string()))?;
        }
        let body = serde_json::to_vec_pretty(config)
            .map_err(|e| ShellError::Persistence(e.to_string()))?;
        fs::write(&self.path, body).map_err(|e| ShellError::Persistence(e.to_string()))
    }

    async fn validate(&self, config: &Configuration) -> Result<ValidationResult, ShellError> {
        match config.action.as_deref() {
            Some(FETCH_ACCOUNTS) => {}
            Some(other) => {
                return Err(ShellError::Validation(format!("unknown action {other}")));
            }
            None => return Err(ShellError::Validation("validation had no action".into())),
        }

        let credential = config
            .credential()
            .ok_or_else(|| ShellError::Validation("no credential configured".into()))?;
        let client =
            GitLabClient::new(&credential).map_err(|e| ShellError::Validation(e.to_string()))?;

        let mut working = config.clone();
        let accounts = fetch_accounts(&client, &mut working, self.installed)
            .await
            .map_err(|e| ShellError::Validation(e.to_string()))?;

        Ok(ValidationResult { accounts })
    }

    fn redirect_context(&self) -> RedirectContext {
        self.redirect.lock().expect("redirect lock").clone()
    }

    fn installed(&self) -> bool {
        self.installed
    }

    fn set_install_enabled(&self, enabled: bool) {
        *self.install_enabled.lock().expect("install flag lock") = enabled;
    }

    fn set_install_location(&self, location: InstallLocation) {
        tracing::debug!(?location, "install location selected");
    }
}
