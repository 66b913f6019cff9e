mod cli;
mod commands;
mod config;
mod engine;
mod error;
mod runner;
mod schema;
mod selector;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use platform::Client;
use runner::SystemRunner;
use selector::EnvironmentSelector;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub dry_run: bool,
    pub settings: Settings,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            if let Some(platform_error) = e.downcast_ref::<platform::Error>() {
                ui::dim(platform_error.category().advice());
            }
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a command; `Ok(false)` means it ran but something failed.
fn run(cli: Cli) -> Result<bool> {
    if let Command::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "deckhand", &mut io::stdout());
        return Ok(true);
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        dry_run: cli.dry_run,
        settings: Settings::from_cli(&cli)?,
    };

    let state = config::load_desired_state(&ctx.settings.config_path);

    // `apps` lists everything unless told otherwise.
    let selector = match cli.command {
        Command::Apps if cli.environments.is_empty() => EnvironmentSelector::all(),
        _ => EnvironmentSelector::new(cli.environments),
    };
    let targets = selector.resolve(&state)?;
    if !ctx.quiet && selector.is_empty() && targets.len() == 1 {
        ui::info(&format!(
            "Defaulting to {} since only one environment is defined",
            targets[0].environment
        ));
    }

    let client = Client::new(ctx.settings.client_settings());

    if let Some(categories) = cli.command.categories() {
        let report = commands::setup::run(&ctx, &client, &state, &targets, categories)?;
        return Ok(report.is_success());
    }

    match cli.command {
        Command::Deploy => commands::deploy::deploy(&ctx, &SystemRunner, &state, &targets, false),
        Command::ForceDeploy => {
            commands::deploy::deploy(&ctx, &SystemRunner, &state, &targets, true)
        }
        Command::Migrate => commands::deploy::migrate(&ctx, &SystemRunner, &state, &targets),
        Command::Remotes => commands::deploy::remotes(&ctx, &SystemRunner, &targets),
        Command::Restart => commands::apps::restart(&ctx, &client, &targets),
        Command::Info { json } => commands::apps::info(&client, &targets, json),
        Command::Logs { lines } => commands::apps::logs(&client, &targets, lines),
        Command::Apps => commands::apps::list(&targets).map(|()| true),
        Command::Show => commands::apps::show(&state, &targets).map(|()| true),
        Command::SetupApps
        | Command::SetupStacks
        | Command::SetupCollaborators
        | Command::SetupConfig
        | Command::SetupAddons
        | Command::SetupDomains
        | Command::Setup
        | Command::Completions { .. } => Ok(true),
    }
}

/// Context for command tests
#[cfg(test)]
pub fn test_context(dry_run: bool) -> Context {
    Context {
        verbose: 0,
        quiet: true,
        dry_run,
        settings: Settings {
            config_path: config::DEFAULT_CONFIG_PATH.into(),
            api_base: platform::DEFAULT_API_BASE.to_string(),
            credentials_path: "/nonexistent/credentials".into(),
            cli: "heroku".to_string(),
        },
    }
}
