//! Reconciler - diffs desired against live state and runs the plans
//!
//! Planning is pure: every `plan_*` function takes the desired and live
//! values of one category and returns an [`ExecutionPlan`] of mutations.
//! [`Reconciler::run`] fetches live state, plans, executes and reports.

use declarative::{
    DiffSummary, ExecutionPlan, MapDiff, ProgressCallback, ScalarDiff, SetDiff, dedup, execute,
};
use platform::{Client, ConfigVars};

use super::{Mutation, ReconcileContext};
use crate::schema::{Category, DesiredState, Policy};
use crate::selector::Target;
use crate::ui;

// ============================================================================
// Desired-state defaulting
// ============================================================================

/// Desired config with the environment key defaulted to the environment name.
pub fn desired_config(env: &str, mut config: ConfigVars, policy: &Policy) -> ConfigVars {
    if let Some(key) = &policy.environment_key {
        let unset = config.get(key).is_none_or(String::is_empty);
        if unset {
            config.insert(key.clone(), env.to_string());
        }
    }
    config
}

/// Desired collaborators plus the invoking user and the app owner.
pub fn desired_collaborators(
    configured: Vec<String>,
    user: &str,
    owner: Option<&str>,
) -> Vec<String> {
    let implicit = std::iter::once(user).chain(owner).map(str::to_string);
    dedup(configured.into_iter().chain(implicit))
}

/// Desired add-ons with the required families filled in.
///
/// For each required family (and the domain family when the environment
/// declares domains): if a desired add-on already belongs to the family
/// nothing changes; otherwise live members of the family are kept; if
/// there are none the family's default plan is added.
pub fn default_addons(
    desired: &[String],
    live: &[String],
    has_domains: bool,
    policy: &Policy,
) -> Vec<String> {
    let domain_family = policy.domain_addon.iter().filter(|_| has_domains);
    let mut addons = desired.to_vec();

    for requirement in policy.required_addons.iter().chain(domain_family) {
        if addons.iter().any(|a| requirement.satisfied_by(a)) {
            continue;
        }

        let live_members: Vec<&String> =
            live.iter().filter(|a| requirement.satisfied_by(a)).collect();
        if live_members.is_empty() {
            log::debug!("Adding default {} for family {}", requirement.default, requirement.family);
            addons.push(requirement.default.clone());
        } else {
            addons.extend(live_members.into_iter().cloned());
        }
    }

    dedup(addons)
}

// ============================================================================
// Planning
// ============================================================================

/// Create the app unless the platform already lists it.
pub fn plan_app(app: &str, stack: Option<String>, existing: &[String]) -> ExecutionPlan<Mutation> {
    let mut plan = ExecutionPlan::new();
    if !existing.iter().any(|a| a == app) {
        plan.add(Mutation::CreateApp {
            app: app.to_string(),
            stack,
        });
    }
    plan
}

/// One migration when the stacks differ; nothing when no stack is desired.
pub fn plan_stack(app: &str, desired: Option<&str>, live: Option<&str>) -> ExecutionPlan<Mutation> {
    let mut plan = ExecutionPlan::new();
    let Some(desired) = desired else {
        return plan;
    };

    if let ScalarDiff::Changed { from, to } = ScalarDiff::compute(Some(&desired), live.as_ref()) {
        log::debug!("{app}: stack {} -> {to}", from.unwrap_or("none"));
        plan.add(Mutation::MigrateStack {
            app: app.to_string(),
            stack: to.to_string(),
        });
    }
    plan
}

/// All overwrites in one mutation; live-only keys queued for removal
/// unless the platform manages them.
pub fn plan_config(
    app: &str,
    desired: &ConfigVars,
    live: &ConfigVars,
    policy: &Policy,
) -> ExecutionPlan<Mutation> {
    let diff = MapDiff::compute(desired, live);
    log_diff(app, "config", &DiffSummary::from(&diff));

    let mut plan = ExecutionPlan::new();
    if !diff.to_add.is_empty() {
        plan.add(Mutation::SetConfig {
            app: app.to_string(),
            vars: diff.to_add,
        });
    }
    plan.extend(
        diff.to_remove
            .into_iter()
            .filter(|key| !policy.is_managed_config(key))
            .map(|key| Mutation::UnsetConfig {
                app: app.to_string(),
                key,
            }),
    );
    plan
}

pub fn plan_collaborators(app: &str, desired: &[String], live: &[String]) -> ExecutionPlan<Mutation> {
    plan_set(
        app,
        desired,
        live,
        |app, email| Mutation::AddCollaborator { app, email },
        |app, email| Mutation::RemoveCollaborator { app, email },
    )
}

pub fn plan_addons(app: &str, desired: &[String], live: &[String]) -> ExecutionPlan<Mutation> {
    plan_set(
        app,
        desired,
        live,
        |app, addon| Mutation::AddAddon { app, addon },
        |app, addon| Mutation::RemoveAddon { app, addon },
    )
}

pub fn plan_domains(app: &str, desired: &[String], live: &[String]) -> ExecutionPlan<Mutation> {
    plan_set(
        app,
        desired,
        live,
        |app, domain| Mutation::AddDomain { app, domain },
        |app, domain| Mutation::RemoveDomain { app, domain },
    )
}

fn log_diff(app: &str, kind: &str, summary: &DiffSummary) {
    if summary.has_changes() {
        log::debug!(
            "{app}: {kind} differs in {} entries (+{} -{})",
            summary.total(),
            summary.additions,
            summary.removals
        );
    }
}

fn plan_set(
    app: &str,
    desired: &[String],
    live: &[String],
    add: impl Fn(String, String) -> Mutation,
    remove: impl Fn(String, String) -> Mutation,
) -> ExecutionPlan<Mutation> {
    let diff = SetDiff::compute(desired, live);
    log_diff(app, "set", &DiffSummary::from(&diff));

    let mut plan = ExecutionPlan::new();
    plan.extend(diff.to_add.into_iter().map(|item| add(app.to_string(), item)));
    plan.extend(diff.to_remove.into_iter().map(|item| remove(app.to_string(), item)));
    plan
}

// ============================================================================
// Running
// ============================================================================

/// Reconciles selected environments against the platform.
pub struct Reconciler<'a> {
    client: &'a Client,
    state: &'a DesiredState,
    policy: Policy,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a Client, state: &'a DesiredState) -> Self {
        Self {
            client,
            state,
            policy: state.policy(),
        }
    }

    /// Reconcile `categories` (in order) for every target.
    ///
    /// Only fatal platform errors are returned. Anything else abandons the
    /// current category of the current environment and is recorded in the
    /// context's report.
    pub fn run<P: ProgressCallback>(
        &self,
        targets: &[Target],
        categories: &[Category],
        ctx: &mut ReconcileContext,
        progress: &mut P,
    ) -> platform::Result<()> {
        let user = self.client.authorize()?.to_string();

        for &category in categories {
            ui::section(category.title());

            let existing = match category {
                Category::Apps => match self.client.list_apps() {
                    Ok(apps) => {
                        let declared = self.state.app_names();
                        log::debug!(
                            "{} of {} declared apps exist",
                            declared.iter().filter(|a| apps.contains(a)).count(),
                            declared.len()
                        );
                        apps
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        ui::error(&format!("Could not list apps: {e}"));
                        for target in targets {
                            ctx.report.record_failure(&target.environment, category, e.to_string());
                        }
                        continue;
                    }
                },
                _ => Vec::new(),
            };

            for target in targets {
                ui::target(&target.environment, &target.app);

                let plan = match self.plan(category, target, &user, &existing) {
                    Ok(plan) => plan,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        log::warn!("Skipping {category} for {}: {e}", target.environment);
                        ui::error(&format!("Could not read {category}: {e}"));
                        ctx.report
                            .record_failure(&target.environment, category, e.to_string());
                        continue;
                    }
                };

                if plan.is_empty() {
                    ui::dim("Up to date");
                    continue;
                }
                log::debug!(
                    "{}: {} actions planned for {category}, destructive: {}",
                    target.app,
                    plan.total_actions(),
                    plan.has_destructive()
                );

                let summary = execute(plan, self.client, &ctx.options, progress, &mut ctx.queue);
                ctx.report.record(&target.environment, category, &summary);

                if !ctx.queue.is_empty() {
                    ui::destructive_commands(&target.app, &ctx.queue.drain());
                }
            }
        }

        Ok(())
    }

    /// Fetch live state for one category and plan the changes.
    fn plan(
        &self,
        category: Category,
        target: &Target,
        user: &str,
        existing_apps: &[String],
    ) -> platform::Result<ExecutionPlan<Mutation>> {
        let env = target.environment.as_str();
        let app = target.app.as_str();

        let plan = match category {
            Category::Apps => plan_app(app, self.state.stack(env), existing_apps),
            Category::Stacks => {
                let live = self.client.app_info(app)?.stack;
                plan_stack(app, self.state.stack(env).as_deref(), live.as_deref())
            }
            Category::Config => {
                let desired = desired_config(env, self.state.config(env), &self.policy);
                let live = self.client.config_vars(app)?;
                plan_config(app, &desired, &live, &self.policy)
            }
            Category::Collaborators => {
                let info = self.client.app_info(app)?;
                let owner = info.owner.as_deref();
                let desired = desired_collaborators(self.state.collaborators(env), user, owner);
                let live = dedup(info.collaborators.iter().cloned().chain(info.owner.clone()));
                plan_collaborators(app, &desired, &live)
            }
            Category::Addons => {
                let live = self.client.addons(app)?;
                let has_domains = !self.state.domains(env).is_empty();
                let desired = default_addons(&self.state.addons(env), &live, has_domains, &self.policy);
                plan_addons(app, &desired, &live)
            }
            Category::Domains => {
                let live = self.client.domains(app)?;
                plan_domains(app, &self.state.domains(env), &live)
            }
        };

        Ok(plan)
    }
}
