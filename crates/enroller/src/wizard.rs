//! The setup wizard state machine.
//!
//! One wizard instance owns the draft configuration and the in-memory
//! account cache; every mutation flows through its methods, one host
//! event at a time. There is no locking because there is no concurrent
//! access, only sequential callback re-entry on the host's event loop.
//!
//! Normal flow: `Location → {CloudSetup | SelfSetup} → Validate →
//! Repos`. A returning session with an installed configuration (or one
//! already carrying accounts) skips credential capture entirely, and a
//! re-authorization pass bypasses the flow to re-render the credential
//! surface for the existing integration type.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{
    Account, ApiKeyAuth, Configuration, FETCH_ACCOUNTS, IntegrationType, OAuth2Auth,
};
use crate::redirect::{RedirectError, extract_profile};
use crate::shell::{InstallLocation, IntegrationShell, ShellError};

/// Wizard steps, in normal flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Choosing cloud vs. self-managed.
    Location,
    /// Waiting on the host's OAuth handshake.
    CloudSetup,
    /// Capturing an API key and base URL.
    SelfSetup,
    /// Fetching the syncable accounts.
    Validate,
    /// Presenting the reconciled account list.
    Repos,
}

/// The surface the host should render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// The shell is still loading.
    Loading,
    /// The cloud / self-managed choice.
    LocationChooser,
    /// The host's OAuth connect affordance.
    OAuthConnect { reauth: bool },
    /// The API-key credential form.
    CredentialForm { reauth: bool },
    /// Connectivity validation in flight.
    Validating,
    /// The multi-select account table.
    AccountsTable,
    /// A wizard error the admin must see.
    Failure(String),
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Redirect(#[from] RedirectError),

    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// The finite-state controller for the setup flow.
pub struct Wizard {
    shell: Arc<dyn IntegrationShell>,
    step: Step,
    draft: Configuration,
    accounts: Vec<Account>,
    error: Option<String>,
}

impl Wizard {
    /// Create a wizard over a shell and synchronize with its current
    /// state.
    pub fn new(shell: Arc<dyn IntegrationShell>) -> Self {
        let draft = shell.configuration();
        let mut wizard = Self {
            shell,
            step: Step::Location,
            draft,
            accounts: Vec::new(),
            error: None,
        };
        wizard.sync_with_shell();
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// The reconciled account cache, in presentation order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// The draft configuration as the wizard currently holds it.
    pub fn configuration(&self) -> &Configuration {
        &self.draft
    }

    /// The stored error message, if the flow has failed.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Re-read the shell and apply the returning-session shortcut.
    ///
    /// An installed configuration with an empty cache, or any
    /// configuration already carrying accounts, jumps straight to
    /// Repos. When both hold at once, the configuration's accounts win
    /// and seed the cache before the jump. A non-empty cache re-enters
    /// Repos on its own.
    pub fn sync_with_shell(&mut self) {
        let config = self.shell.configuration();
        if (self.shell.installed() && self.accounts.is_empty()) || config.has_accounts() {
            self.draft = config;
            self.accounts = self.draft.account_list();
            self.step = Step::Repos;
        } else if self.draft.has_accounts() {
            self.accounts = self.draft.account_list();
            self.step = Step::Repos;
        } else if !self.accounts.is_empty() {
            self.step = Step::Repos;
        }
    }

    /// Record the admin's location choice and advance to the matching
    /// credential step.
    pub fn choose_location(&mut self, integration_type: IntegrationType) {
        debug!(%integration_type, "location selected");
        self.draft.integration_type = Some(integration_type);
        match integration_type {
            IntegrationType::Cloud => {
                self.shell.set_install_location(InstallLocation::Cloud);
                self.step = Step::CloudSetup;
            }
            IntegrationType::SelfManaged => {
                self.shell.set_install_location(InstallLocation::SelfManaged);
                self.step = Step::SelfSetup;
            }
        }
    }

    /// Consume a completed OAuth redirect, if one is pending.
    ///
    /// Returns true when a profile payload was decoded and the wizard
    /// moved to Validate. Malformed payloads land in the visible error
    /// state as well as the returned error.
    pub fn handle_redirect(&mut self) -> Result<bool, WizardError> {
        let ctx = self.shell.redirect_context();
        if ctx.loading || !ctx.is_from_redirect {
            return Ok(false);
        }
        let Some(current_url) = ctx.current_url else {
            return Ok(false);
        };

        match extract_profile(&current_url) {
            Ok(Some(profile)) => {
                self.draft.integration_type = Some(IntegrationType::Cloud);
                self.draft.oauth2_auth = Some(OAuth2Auth::from_profile(profile.integration.auth));
                match self.persist() {
                    Ok(()) => {
                        self.step = Step::Validate;
                        Ok(true)
                    }
                    Err(err) => Err(self.fail(err)),
                }
            }
            Ok(None) => Ok(false),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Store the captured self-managed credential and advance to
    /// validation.
    pub fn submit_api_key(&mut self, auth: ApiKeyAuth) -> Result<(), WizardError> {
        self.draft.integration_type = Some(IntegrationType::SelfManaged);
        self.draft.apikey_auth = Some(auth);
        match self.persist() {
            Ok(()) => {
                self.step = Step::Validate;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Run the `FETCH_ACCOUNTS` validation once.
    ///
    /// A populated cache means a previous fetch already succeeded, so
    /// the wizard goes straight to the account table without another
    /// call. On rejection the error is stored and the flow stays put;
    /// there is no automatic retry, the admin restarts the flow.
    pub async fn validate(&mut self) -> Result<(), WizardError> {
        if !self.accounts.is_empty() {
            self.step = Step::Repos;
            return Ok(());
        }

        let mut request = self.draft.clone();
        request.action = Some(FETCH_ACCOUNTS.to_string());

        match self.shell.validate(&request).await {
            Ok(result) => {
                let mut map = BTreeMap::new();
                for account in &result.accounts {
                    map.insert(account.id.clone(), account.clone());
                }
                self.shell.set_install_enabled(!map.is_empty());
                self.accounts = result.accounts;
                self.draft.accounts = Some(map);
                self.draft.action = None;
                self.step = Step::Repos;
                match self.persist() {
                    Ok(()) => Ok(()),
                    Err(err) => Err(self.fail(err)),
                }
            }
            Err(err) => {
                warn!(error = %err, "account validation failed");
                Err(self.fail(err.into()))
            }
        }
    }

    /// Compute the surface the host should render.
    ///
    /// Stored errors always win. The re-authorization overlay bypasses
    /// the normal flow entirely: the persisted integration type picks
    /// the credential surface, and its completion callbacks feed back
    /// into the same validation path.
    pub fn screen(&self) -> Screen {
        let ctx = self.shell.redirect_context();
        if ctx.loading {
            return Screen::Loading;
        }
        if let Some(message) = &self.error {
            return Screen::Failure(message.clone());
        }
        if ctx.is_from_re_auth {
            return match self.shell.configuration().integration_type {
                Some(IntegrationType::Cloud) => Screen::OAuthConnect { reauth: true },
                _ => Screen::CredentialForm { reauth: true },
            };
        }
        match self.step {
            Step::Location => Screen::LocationChooser,
            Step::CloudSetup => Screen::OAuthConnect { reauth: false },
            Step::SelfSetup => Screen::CredentialForm { reauth: false },
            Step::Validate => Screen::Validating,
            Step::Repos => Screen::AccountsTable,
        }
    }

    fn persist(&self) -> Result<(), WizardError> {
        self.shell
            .set_configuration(&self.draft)
            .map_err(WizardError::from)
    }

    fn fail(&mut self, err: WizardError) -> WizardError {
        self.error = Some(err.to_string());
        err
    }
}
