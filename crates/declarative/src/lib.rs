//! # Declarative
//!
//! A framework for declarative reconciliation.
//!
//! This crate provides the core abstractions for comparing a declared
//! desired state against an observed live state and converging the two
//! without ever destroying anything on its own.
//!
//! ## Core Concepts
//!
//! - **Diff**: `to_add` / `to_remove` for sets, overwrite semantics for maps,
//!   change detection for scalars
//! - **Action**: a single corrective mutation, either additive or destructive
//! - **ExecutionPlan**: actions grouped into additive (applied) and
//!   destructive (deferred)
//! - **Executor**: applies additive actions in order and queues destructive
//!   ones as commands for the operator
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     Action, ApplyContext, ApplyResult, DestructiveQueue, ExecuteOptions,
//!     ExecutionPlan, NoProgress, SetDiff, execute,
//! };
//!
//! #[derive(Debug)]
//! enum DomainAction { Add(String), Remove(String) }
//!
//! impl Action for DomainAction {
//!     type Target = Vec<String>;
//!
//!     fn id(&self) -> String { /* ... */ }
//!     fn description(&self) -> String { /* ... */ }
//!     fn command(&self) -> String { /* ... */ }
//!     fn is_destructive(&self) -> bool { matches!(self, Self::Remove(_)) }
//!
//!     fn apply(&self, target: &Vec<String>, ctx: &ApplyContext) -> anyhow::Result<ApplyResult> {
//!         Ok(ApplyResult::Created)
//!     }
//! }
//!
//! let diff = SetDiff::compute(&desired, &live);
//! let mut plan = ExecutionPlan::new();
//! plan.extend(diff.to_add.into_iter().map(DomainAction::Add));
//! plan.extend(diff.to_remove.into_iter().map(DomainAction::Remove));
//!
//! let mut queue = DestructiveQueue::new();
//! let summary = execute(plan, &target, &ExecuteOptions::default(), &mut NoProgress, &mut queue);
//! ```
//!
//! ## Provider Traits
//!
//! - [`Action`]: what a mutation is and how it is applied to its target
//! - [`ProgressCallback`]: receives progress updates
//!
//! This allows the crate to be used without hard dependencies on a specific
//! platform client or UI.

pub mod action;
pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod types;

// Re-export main types at crate root
pub use action::Action;
pub use context::{ApplyContext, DestructiveQueue, NoProgress, ProgressCallback};
pub use diff::{DiffSummary, MapDiff, ScalarDiff, SetDiff, dedup};
pub use executor::execute;
pub use planner::ExecutionPlan;
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary};
