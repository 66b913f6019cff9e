use clap::{Parser, Subcommand};
use clap_complete::Shell;
use platform::DEFAULT_API_BASE;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::schema::Category;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile app hosting environments against a declared desired state", long_about = None)]
#[command(propagate_version = true)]
#[command(subcommand_precedence_over_arg = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show what would change without changing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Desired-state file
    #[arg(long, env = "DECKHAND_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Platform API base URL
    #[arg(long, env = "DECKHAND_API_URL", default_value = DEFAULT_API_BASE, global = true)]
    pub api_url: String,

    /// Credentials file (default: ~/.config/deckhand/credentials)
    #[arg(long, env = "DECKHAND_CREDENTIALS", global = true)]
    pub credentials: Option<PathBuf>,

    /// Platform CLI used in printed commands
    #[arg(long, env = "DECKHAND_CLI", default_value = "heroku", global = true)]
    pub cli: String,

    /// Environments to act on, or `all`
    #[arg(value_name = "ENVIRONMENT")]
    pub environments: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create apps missing on the platform
    #[command(name = "setup:apps")]
    SetupApps,

    /// Migrate apps to their desired stack
    #[command(name = "setup:stacks")]
    SetupStacks,

    /// Add desired collaborators, list stale ones
    #[command(name = "setup:collaborators")]
    SetupCollaborators,

    /// Set desired config vars, list stale ones
    #[command(name = "setup:config")]
    SetupConfig,

    /// Add desired add-ons, list stale ones
    #[command(name = "setup:addons")]
    SetupAddons,

    /// Add desired domains, list stale ones
    #[command(name = "setup:domains")]
    SetupDomains,

    /// Run every setup step in order
    Setup,

    /// Push the current branch, migrate and restart
    Deploy,

    /// Deploy with `git push --force`
    ForceDeploy,

    /// Run database migrations and restart
    Migrate,

    /// Restart every process
    Restart,

    /// Show live app information
    Info {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent log lines
    Logs {
        /// Number of lines
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: u32,
    },

    /// List configured environments and their repositories
    Apps,

    /// Add git remotes for the selected apps
    Remotes,

    /// Print the resolved desired state as JSON
    Show,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    /// Categories reconciled by a setup command.
    pub fn categories(&self) -> Option<&'static [Category]> {
        match self {
            Self::SetupApps => Some(&[Category::Apps]),
            Self::SetupStacks => Some(&[Category::Stacks]),
            Self::SetupCollaborators => Some(&[Category::Collaborators]),
            Self::SetupConfig => Some(&[Category::Config]),
            Self::SetupAddons => Some(&[Category::Addons]),
            Self::SetupDomains => Some(&[Category::Domains]),
            Self::Setup => Some(&Category::SETUP),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_environments_before_subcommand() {
        let cli = Cli::try_parse_from(["deckhand", "demo", "staging", "deploy"]).unwrap();
        assert_eq!(cli.environments, vec!["demo", "staging"]);
        assert!(matches!(cli.command, Command::Deploy));
    }

    #[test]
    fn test_setup_step_names() {
        let cli = Cli::try_parse_from(["deckhand", "all", "setup:addons", "--dry-run"]).unwrap();
        assert_eq!(cli.environments, vec!["all"]);
        assert!(cli.dry_run);
        assert_eq!(cli.command.categories(), Some(&[Category::Addons][..]));
    }

    #[test]
    fn test_no_environment() {
        let cli = Cli::try_parse_from(["deckhand", "-vv", "force-deploy"]).unwrap();
        assert!(cli.environments.is_empty());
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::ForceDeploy));
        assert!(cli.command.categories().is_none());
    }

    #[test]
    fn test_setup_runs_every_category() {
        let cli = Cli::try_parse_from(["deckhand", "production", "setup"]).unwrap();
        assert_eq!(cli.command.categories(), Some(&Category::SETUP[..]));
    }
}
