//! Execution engine - applies additive actions and defers destructive ones

use crate::action::Action;
use crate::context::{ApplyContext, DestructiveQueue, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};

/// Execute a plan against a target
///
/// Destructive actions are rendered into `queue` first and never applied.
/// Additive actions are then applied sequentially; the first failure stops
/// the plan and every remaining additive action is counted as skipped.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `target` - What the actions are applied to
/// * `opts` - Execution options (dry_run, verbose, program)
/// * `progress` - Progress callback
/// * `queue` - Destination for destructive commands
///
/// # Returns
/// Summary of execution results
pub fn execute<A, P>(
    plan: ExecutionPlan<A>,
    target: &A::Target,
    opts: &ExecuteOptions,
    progress: &mut P,
    queue: &mut DestructiveQueue,
) -> ExecuteSummary
where
    A: Action,
    P: ProgressCallback,
{
    let mut summary = ExecuteSummary::default();

    for action in &plan.destructive {
        let command = opts.render(&action.command());
        log::debug!("deferring destructive action {}", action.id());
        progress.on_action_deferred(&action.id(), &command);
        queue.push(command);
        summary.deferred += 1;
    }

    let ctx = ApplyContext::new(opts.dry_run, opts.verbose);
    let mut actions = plan.additive.iter();

    for action in actions.by_ref() {
        let id = action.id();
        progress.on_action_start(&id, &opts.render(&action.command()));

        let result = apply_action(action, target, &ctx);
        progress.on_action_complete(&id, &result);
        summary.add_result(&result);

        if !result.is_success() {
            log::warn!("{} failed, abandoning the rest of this plan", action.description());
            break;
        }
    }

    for action in actions {
        let result = ApplyResult::Skipped {
            reason: "an earlier action failed".to_string(),
        };
        progress.on_action_complete(&action.id(), &result);
        summary.add_result(&result);
    }

    summary
}

/// Apply a single action, folding errors into the result
fn apply_action<A: Action>(action: &A, target: &A::Target, ctx: &ApplyContext) -> ApplyResult {
    match action.apply(target, ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{}: {e:#}", action.description()),
        },
    }
}
