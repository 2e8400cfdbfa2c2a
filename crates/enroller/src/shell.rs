//! Host-shell boundary.
//!
//! The wizard never talks to the platform directly: persistence,
//! validation dispatch, install flags, and the redirect snapshot all
//! arrive through this trait. The hosting application implements it;
//! tests substitute an in-memory double.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Account, Configuration};
use crate::redirect::RedirectContext;

/// Install location reported to the host when the admin picks a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallLocation {
    Cloud,
    SelfManaged,
}

/// Result of a successful validate call.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub accounts: Vec<Account>,
}

/// Errors surfaced by the host shell.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to persist configuration: {0}")]
    Persistence(String),
}

/// Capabilities the embedding host provides to the wizard.
#[async_trait]
pub trait IntegrationShell: Send + Sync {
    /// The configuration as the host currently knows it.
    fn configuration(&self) -> Configuration;

    /// Persist an updated configuration.
    fn set_configuration(&self, config: &Configuration) -> Result<(), ShellError>;

    /// Run a validation action (e.g. [`crate::config::FETCH_ACCOUNTS`])
    /// against the backend. A rejection carries the host's error.
    async fn validate(&self, config: &Configuration) -> Result<ValidationResult, ShellError>;

    /// Current redirect snapshot.
    fn redirect_context(&self) -> RedirectContext;

    /// Whether this installation has already completed.
    fn installed(&self) -> bool;

    /// Toggle the host's install affordance.
    fn set_install_enabled(&self, enabled: bool);

    /// Report the chosen install location.
    fn set_install_location(&self, location: InstallLocation);
}
