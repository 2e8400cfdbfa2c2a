//! Enroller CLI - drives the GitLab connector setup wizard from a
//! terminal, standing in for the hosting platform's panel.

mod callback;
mod commands;
mod settings;
mod shell;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enroller")]
#[command(version)]
#[command(about = "Setup wizard for the GitLab connector")]
#[command(
    long_about = "Enroller walks you through connecting GitLab: choose the \
cloud service or a self-managed instance, authorize, validate connectivity, \
and review the groups that will sync. The resulting configuration blob is \
stored in your state directory exactly as a hosting platform would store it."
)]
#[command(after_long_help = r#"EXAMPLES
    Connect to gitlab.com via the OAuth redirect:
        $ enroller setup cloud

    Connect to a self-managed instance:
        $ enroller setup self --base-url https://gitlab.example.com

    Refresh and list the syncable groups:
        $ enroller accounts

    Generate shell completions:
        $ enroller completions bash > ~/.local/share/bash-completion/completions/enroller

CONFIGURATION
    Enroller reads settings from:
      1. ~/.config/enroller/config.toml (or $XDG_CONFIG_HOME/enroller/config.toml)
      2. ./enroller.toml
      3. Environment variables (ENROLLER_* prefix)
      4. .env file in the current directory

ENVIRONMENT VARIABLES
    ENROLLER_GITLAB_HOST      Default host for self-managed setups
    ENROLLER_CALLBACK_PORT    Port for the OAuth redirect listener
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the setup wizard
    Setup {
        #[command(subcommand)]
        mode: SetupMode,
    },
    /// Refresh and list the syncable accounts
    Accounts,
    /// Print the stored configuration blob
    Show,
    /// Delete the stored configuration
    Reset,
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum SetupMode {
    /// Connect to gitlab.com via the OAuth redirect
    Cloud {
        /// Port for the local redirect listener
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Connect to a self-managed instance with an API key
    #[command(name = "self")]
    SelfManaged {
        /// Base URL of the GitLab instance
        #[arg(short = 'u', long)]
        base_url: Option<String>,
        /// API key (prompted for when omitted)
        #[arg(short = 'k', long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a terminal; the
    // interactive flow talks to the user directly.
    if !Term::stdout().is_term() {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("enroller=info,enroller_cli=info"));
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let settings = settings::Settings::load();
    let cli = Cli::parse();

    match cli.command {
        Commands::Setup { mode } => match mode {
            SetupMode::Cloud { port } => commands::setup::handle_cloud(&settings, port).await?,
            SetupMode::SelfManaged { base_url, api_key } => {
                commands::setup::handle_self_managed(&settings, base_url, api_key).await?
            }
        },
        Commands::Accounts => commands::accounts::handle_accounts().await?,
        Commands::Show => commands::accounts::handle_show()?,
        Commands::Reset => commands::accounts::handle_reset()?,
        Commands::Completions { shell } => commands::meta::handle_completions(shell)?,
    }

    Ok(())
}
