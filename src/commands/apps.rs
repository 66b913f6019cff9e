//! `apps`, `info`, `restart`, `logs` and `show`

use anyhow::Result;
use platform::{AppInfo, Client};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Context;
use crate::schema::{Category, DesiredState, Resolved};
use crate::selector::Target;
use crate::ui;

/// `apps` - configured environments and where they live
pub fn list(targets: &[Target]) -> Result<()> {
    ui::header("Configured Environments");
    for target in targets {
        println!();
        ui::info(&format!(
            "{} maps to the app {} located at:",
            target.environment, target.app
        ));
        ui::dim(&target.repo);
    }
    Ok(())
}

/// `info` - live information about each app
///
/// Apps that cannot be fetched are reported and skipped.
pub fn info(client: &Client, targets: &[Target], json: bool) -> Result<bool> {
    let mut ok = true;
    let mut infos: BTreeMap<&str, AppInfo> = BTreeMap::new();

    for target in targets {
        match client.app_info(&target.app) {
            Ok(info) => {
                infos.insert(&target.environment, info);
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                ui::error(&format!("{}: {e}", target.environment));
                ok = false;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(ok);
    }

    for target in targets {
        let Some(info) = infos.get(target.environment.as_str()) else {
            continue;
        };
        ui::header(&format!("{} ({})", target.environment, info.name));
        ui::kv("stack", info.stack.as_deref().unwrap_or("-"));
        ui::kv("owner", info.owner.as_deref().unwrap_or("-"));
        ui::kv("region", info.region.as_deref().unwrap_or("-"));
        ui::kv("web url", info.web_url.as_deref().unwrap_or("-"));
        ui::kv("git url", info.git_url.as_deref().unwrap_or(&target.repo));
        ui::kv("collaborators", &info.collaborators.join(", "));
    }

    Ok(ok)
}

/// `restart`
pub fn restart(ctx: &Context, client: &Client, targets: &[Target]) -> Result<bool> {
    let mut ok = true;

    for target in targets {
        ui::echo(&format!("{} restart --app {}", ctx.settings.cli, target.app));
        if ctx.dry_run {
            continue;
        }

        match client.restart(&target.app) {
            Ok(()) => ui::success(&format!("Restarted {}", target.app)),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                ui::error(&format!("{}: {e}", target.environment));
                ok = false;
            }
        }
    }

    Ok(ok)
}

/// `logs`
pub fn logs(client: &Client, targets: &[Target], lines: u32) -> Result<bool> {
    let mut ok = true;

    for target in targets {
        if targets.len() > 1 {
            ui::section(&target.environment);
        }
        match client.logs(&target.app, lines) {
            Ok(text) => print!("{text}"),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                ui::error(&format!("{}: {e}", target.environment));
                ok = false;
            }
        }
    }

    Ok(ok)
}

/// Resolved desired state of one environment
#[derive(Debug, Serialize)]
pub struct EnvironmentView {
    pub environment: String,
    pub repo: String,
    #[serde(flatten)]
    pub desired: BTreeMap<&'static str, Resolved>,
}

impl EnvironmentView {
    pub fn new(state: &DesiredState, target: &Target) -> Self {
        let desired = Category::SETUP
            .iter()
            .map(|category| (category.key(), state.resolve(*category, &target.environment)))
            .collect();
        Self {
            environment: target.environment.clone(),
            repo: target.repo.clone(),
            desired,
        }
    }
}

/// `show` - print the resolved desired state as JSON
pub fn show(state: &DesiredState, targets: &[Target]) -> Result<()> {
    let views: Vec<EnvironmentView> = targets
        .iter()
        .map(|target| EnvironmentView::new(state, target))
        .collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}
