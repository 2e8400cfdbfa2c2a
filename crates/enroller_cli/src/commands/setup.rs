//! The `setup` commands: run the wizard end to end.

use std::sync::Arc;
use std::time::Duration;

use console::{Term, style};
use enroller::config::{ApiKeyAuth, IntegrationType};
use enroller::wizard::Wizard;

use crate::callback;
use crate::settings::Settings;
use crate::shell::LocalShell;

/// How long to wait for the browser redirect.
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connect to gitlab.com: wait for the host redirect, then validate.
pub async fn handle_cloud(
    settings: &Settings,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = port.unwrap_or(settings.callback_port);
    let shell = Arc::new(LocalShell::open(LocalShell::default_path()?, false));

    let mut wizard = Wizard::new(shell.clone());
    wizard.choose_location(IntegrationType::Cloud);

    println!(
        "Complete the GitLab authorization in your browser. The flow must \
redirect to {} with the profile payload.",
        style(callback::redirect_uri(port)).cyan()
    );

    let redirect_url = callback::wait_for_redirect(port, REDIRECT_TIMEOUT).await?;
    shell.set_redirect(redirect_url);

    if !wizard.handle_redirect()? {
        return Err("the redirect did not carry a profile payload".into());
    }

    println!("{} Connected. Fetching GitLab details...", style("✓").green());
    wizard.validate().await?;

    finish(&wizard, &shell);
    Ok(())
}

/// Connect to a self-managed instance with an API key.
pub async fn handle_self_managed(
    settings: &Settings,
    base_url: Option<String>,
    api_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = match base_url.or_else(|| settings.gitlab_host.clone()) {
        Some(url) => url,
        None => prompt("GitLab base URL")?,
    };
    url::Url::parse(&base_url).map_err(|e| format!("invalid base URL {base_url}: {e}"))?;

    let api_key = match api_key {
        Some(key) => key,
        None => prompt("API key")?,
    };

    let shell = Arc::new(LocalShell::open(LocalShell::default_path()?, false));
    let mut wizard = Wizard::new(shell.clone());
    wizard.choose_location(IntegrationType::SelfManaged);
    wizard.submit_api_key(ApiKeyAuth { base_url, api_key })?;

    println!("{} Connected. Fetching GitLab details...", style("✓").green());
    wizard.validate().await?;

    finish(&wizard, &shell);
    Ok(())
}

fn prompt(label: &str) -> std::io::Result<String> {
    let term = Term::stdout();
    term.write_str(&format!("{label}: "))?;
    let value = term.read_line()?;
    Ok(value.trim().to_string())
}

fn finish(wizard: &Wizard, shell: &LocalShell) {
    crate::commands::accounts::print_accounts(wizard.accounts());

    if shell.install_enabled() {
        println!(
            "\n{} Setup complete; install is enabled. The configuration blob \
is at {}.",
            style("✓").green(),
            shell.path().display()
        );
    } else {
        println!(
            "\n{} No syncable groups were found; install stays disabled.",
            style("!").yellow()
        );
    }
}
