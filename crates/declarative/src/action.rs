//! Action trait for declarative reconciliation
//!
//! An Action is one corrective step that moves a target towards its
//! desired state.

use crate::context::ApplyContext;
use crate::types::ApplyResult;
use anyhow::Result;
use std::fmt;

/// Core trait for corrective actions
///
/// Every action provides:
/// - Identity (id, description)
/// - A rendered command line, shown to the operator
/// - Whether it is destructive (deferred, never applied automatically)
/// - How to apply it to its target
///
/// # Example
///
/// ```ignore
/// use declarative::{Action, ApplyContext, ApplyResult};
///
/// #[derive(Debug)]
/// struct AddDomain { app: String, domain: String }
///
/// impl Action for AddDomain {
///     type Target = PlatformClient;
///
///     fn id(&self) -> String {
///         format!("domain:{}", self.domain)
///     }
///
///     fn description(&self) -> String {
///         format!("Add domain {} to {}", self.domain, self.app)
///     }
///
///     fn command(&self) -> String {
///         format!("domains:add {} --app {}", self.domain, self.app)
///     }
///
///     fn apply(&self, client: &PlatformClient, ctx: &ApplyContext) -> anyhow::Result<ApplyResult> {
///         if ctx.dry_run {
///             return Ok(ApplyResult::Skipped { reason: "Dry run".into() });
///         }
///         client.add_domain(&self.app, &self.domain)?;
///         Ok(ApplyResult::Created)
///     }
/// }
/// ```
pub trait Action: fmt::Debug {
    /// What the action is applied to (a platform client, a mock, ...)
    type Target: ?Sized;

    /// Unique identifier for this action within its plan
    ///
    /// Examples:
    /// - "addon:newrelic:bronze"
    /// - "config:FOO"
    fn id(&self) -> String;

    /// Human-readable description of what this action does
    fn description(&self) -> String;

    /// The equivalent command line, without the program name
    ///
    /// Destructive actions are surfaced to the operator in this form.
    fn command(&self) -> String;

    /// Whether applying this action may lose data
    ///
    /// Destructive actions are queued for manual execution and never
    /// passed to [`Action::apply`] by the executor.
    fn is_destructive(&self) -> bool {
        false
    }

    /// Apply the action to the target
    ///
    /// This method should:
    /// 1. Respect ctx.dry_run (return Skipped if true)
    /// 2. Make the change
    /// 3. Return the appropriate ApplyResult
    fn apply(&self, target: &Self::Target, ctx: &ApplyContext) -> Result<ApplyResult>;
}
