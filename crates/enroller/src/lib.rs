//! Enroller - setup wizard for a GitLab connector.
//!
//! The wizard runs inside a hosting application's panel and walks an
//! administrator through connecting GitLab: choosing between the cloud
//! service and a self-managed instance, completing the authorization
//! handshake, validating connectivity, and selecting which GitLab
//! groups ("accounts") to sync.
//!
//! The host ("shell") owns persistence, the OAuth browser handshake,
//! and rendering. This crate owns the flow: the state machine
//! ([`wizard::Wizard`]), the account reconciler ([`reconcile`]), and
//! the minimal GitLab REST client ([`gitlab::GitLabClient`]) behind the
//! `FETCH_ACCOUNTS` validation action.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use enroller::{ApiKeyAuth, IntegrationType, Step, Wizard};
//!
//! let mut wizard = Wizard::new(Arc::new(shell));
//! wizard.choose_location(IntegrationType::SelfManaged);
//! wizard.submit_api_key(ApiKeyAuth {
//!     base_url: "https://gitlab.example.com".into(),
//!     api_key: "glpat-...".into(),
//! })?;
//! wizard.validate().await?;
//! assert_eq!(wizard.step(), Step::Repos);
//! ```

pub mod config;
pub mod gitlab;
pub mod http;
pub mod reconcile;
pub mod redirect;
pub mod shell;
pub mod wizard;

pub use config::{
    Account, AccountKind, ApiKeyAuth, Configuration, Credential, FETCH_ACCOUNTS, IntegrationType,
    OAuth2Auth,
};
pub use redirect::RedirectContext;
pub use shell::{InstallLocation, IntegrationShell, ShellError, ValidationResult};
pub use wizard::{Screen, Step, Wizard, WizardError};
