//! `deploy`, `force-deploy`, `migrate` and `remotes` - local git and shell work
//!
//! These commands shell out exactly like an operator would: one combined
//! command line per environment, echoed before it runs.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::Context;
use crate::error::LocalStateError;
use crate::runner::CommandRunner;
use crate::schema::DesiredState;
use crate::selector::Target;
use crate::ui;

/// `* <branch>` line of `git branch` output
static CURRENT_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\* (.+)$").expect("regex for current branch"));

/// Find the checked-out branch in `git branch` output.
///
/// A detached HEAD (`* (HEAD detached at 1a2b3c)`) has no branch.
pub fn parse_branch(output: &str) -> Option<String> {
    let branch = CURRENT_BRANCH.captures(output)?.get(1)?.as_str().trim();
    if branch.is_empty() || branch.starts_with('(') {
        return None;
    }
    Some(branch.to_string())
}

/// The branch to deploy from.
pub fn current_branch(runner: &dyn CommandRunner) -> Result<String, LocalStateError> {
    let output = runner
        .run_capture("git", &["branch"])
        .map_err(|e| LocalStateError::Git {
            message: format!("{e:#}"),
        })?;
    parse_branch(&output).ok_or(LocalStateError::BranchUnresolvable)
}

/// `{cli} {rake} db:migrate --app {app} && {cli} restart --app {app}`
pub fn migrate_command(cli: &str, rake: &str, app: &str) -> String {
    format!("{cli} {rake} db:migrate --app {app} && {cli} restart --app {app}")
}

/// Push, migrate and restart, as one shell command line.
pub fn deploy_command(
    target: &Target,
    branch: &str,
    deploy_branch: &str,
    force: bool,
    cli: &str,
    rake: &str,
) -> String {
    let force = if force { " --force" } else { "" };
    format!(
        "git push {}{force} {branch}:{deploy_branch} && {}",
        target.repo,
        migrate_command(cli, rake, &target.app)
    )
}

/// Run one shell line per target, echoing it first.
///
/// A failing target does not stop the others; returns whether all passed.
fn run_lines(
    ctx: &Context,
    runner: &dyn CommandRunner,
    lines: impl IntoIterator<Item = (String, String)>,
) -> Result<bool> {
    let mut ok = true;

    for (environment, line) in lines {
        ui::echo(&line);
        if ctx.dry_run {
            continue;
        }

        if !runner.run_shell(&line)? {
            ui::error(&format!("{environment} failed"));
            ok = false;
        }
    }

    Ok(ok)
}

/// `deploy` / `force-deploy`
pub fn deploy(
    ctx: &Context,
    runner: &dyn CommandRunner,
    state: &DesiredState,
    targets: &[Target],
    force: bool,
) -> Result<bool> {
    let branch = current_branch(runner)?;
    let deploy_branch = state.policy().deploy_branch;

    ui::header(&format!("Deploying {branch}"));
    let lines = targets.iter().map(|target| {
        let line = deploy_command(
            target,
            &branch,
            &deploy_branch,
            force,
            &ctx.settings.cli,
            state.rake_command(&target.environment),
        );
        (target.environment.clone(), line)
    });

    let ok = run_lines(ctx, runner, lines)?;
    if ok && !ctx.dry_run {
        ui::success("Deployed");
    }
    Ok(ok)
}

/// `migrate`
pub fn migrate(
    ctx: &Context,
    runner: &dyn CommandRunner,
    state: &DesiredState,
    targets: &[Target],
) -> Result<bool> {
    let lines = targets.iter().map(|target| {
        let rake = state.rake_command(&target.environment);
        (
            target.environment.clone(),
            migrate_command(&ctx.settings.cli, rake, &target.app),
        )
    });
    run_lines(ctx, runner, lines)
}

/// `remotes` - `git remote add <app> <repo>` for each target
pub fn remotes(ctx: &Context, runner: &dyn CommandRunner, targets: &[Target]) -> Result<bool> {
    let mut ok = true;

    for target in targets {
        ui::echo(&format!("git remote add {} {}", target.app, target.repo));
        if ctx.dry_run {
            continue;
        }
        if !runner.run("git", &["remote", "add", &target.app, &target.repo])? {
            ui::warn(&format!("Could not add remote {}", target.app));
            ok = false;
        }
    }

    Ok(ok)
}
