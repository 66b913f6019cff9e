//! `setup` and `setup:<category>` - converge environments on the platform

use anyhow::Result;
use declarative::ExecuteOptions;
use platform::Client;

use crate::Context;
use crate::engine::{ReconcileContext, Reconciler, RunReport};
use crate::schema::{Category, DesiredState};
use crate::selector::Target;
use crate::ui::{self, UiProgress};

/// Reconcile `categories` for every target and print the run report.
///
/// Returns the report; a fatal platform error (authorization) is an `Err`.
pub fn run(
    ctx: &Context,
    client: &Client,
    state: &DesiredState,
    targets: &[Target],
    categories: &[Category],
) -> Result<RunReport> {
    let names: Vec<&str> = categories.iter().map(Category::key).collect();
    ui::header(&format!("Reconciling {}", names.join(", ")));
    if ctx.dry_run {
        ui::info("Dry run - changes are only printed");
    }

    let mut run = ReconcileContext::new(ExecuteOptions {
        dry_run: ctx.dry_run,
        verbose: ctx.verbose > 0,
        program: ctx.settings.cli.clone(),
    });
    let mut progress = UiProgress {
        verbose: ctx.verbose > 0,
    };

    Reconciler::new(client, state).run(targets, categories, &mut run, &mut progress)?;

    ui::run_report(&run.report, ctx.dry_run);
    Ok(run.report)
}
