//! Account listing and blob management commands.

use console::style;
use enroller::config::{Account, FETCH_ACCOUNTS};
use enroller::shell::IntegrationShell;
use tabled::{Table, Tabled, settings::Style};

use crate::shell::LocalShell;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Public")]
    public: bool,
    #[tabled(rename = "Projects")]
    projects: u64,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            kind: account.kind.to_string(),
            public: account.public,
            projects: account.total_count,
        }
    }
}

/// Render the reconciled account table.
pub fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No syncable groups found.");
        return;
    }

    let rows: Vec<AccountRow> = accounts.iter().map(AccountRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Re-run the fetch-accounts validation against the stored credential
/// and print the reconciled table, folding the result back into the
/// blob the way the hosting platform would after a validate call.
pub async fn handle_accounts() -> Result<(), Box<dyn std::error::Error>> {
    let shell = LocalShell::open(LocalShell::default_path()?, true);
    let mut config = shell.configuration();

    if config.credential().is_none() {
        return Err("no stored credential; run `enroller setup` first".into());
    }

    config.action = Some(FETCH_ACCOUNTS.to_string());
    let result = shell.validate(&config).await?;
    print_accounts(&result.accounts);

    let mut map = config.accounts.take().unwrap_or_default();
    for account in &result.accounts {
        map.insert(account.id.clone(), account.clone());
    }
    config.accounts = Some(map);
    config.action = None;
    shell.set_configuration(&config)?;

    Ok(())
}

/// Print the stored configuration blob.
pub fn handle_show() -> Result<(), Box<dyn std::error::Error>> {
    let path = LocalShell::default_path()?;
    match std::fs::read_to_string(&path) {
        Ok(body) => println!("{}", body),
        Err(_) => println!("No configuration stored at {}.", path.display()),
    }
    Ok(())
}

/// Delete the stored configuration blob.
pub fn handle_reset() -> Result<(), Box<dyn std::error::Error>> {
    let path = LocalShell::default_path()?;
    if path.exists() {
        std::fs::remove_file(&path)?;
        println!("{} Removed {}.", style("✓").green(), path.display());
    } else {
        println!("Nothing to remove.");
    }
    Ok(())
}
