//! Reconciliation engine for deckhand
//!
//! The engine:
//! 1. Plans - diffs desired against live state, one category at a time
//! 2. Applies - runs additive mutations through the platform client
//! 3. Defers - queues destructive commands for the operator

pub mod mutation;
pub mod reconciler;

pub use mutation::Mutation;
pub use reconciler::Reconciler;

use crate::schema::Category;
use declarative::{DestructiveQueue, ExecuteOptions, ExecuteSummary};

/// A category that could not be fully reconciled for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub environment: String,
    pub category: Category,
    pub message: String,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    summary: ExecuteSummary,
    failures: Vec<Failure>,
}

impl RunReport {
    /// Fold the summary of one executed plan into the report.
    pub fn record(&mut self, environment: &str, category: Category, summary: &ExecuteSummary) {
        self.summary.merge(summary);
        if !summary.is_success() {
            self.failures.push(Failure {
                environment: environment.to_string(),
                category,
                message: summary.errors.join("; "),
            });
        }
    }

    /// Record a failure that happened before anything was applied.
    pub fn record_failure(
        &mut self,
        environment: &str,
        category: Category,
        message: impl Into<String>,
    ) {
        self.failures.push(Failure {
            environment: environment.to_string(),
            category,
            message: message.into(),
        });
    }

    pub fn summary(&self) -> &ExecuteSummary {
        &self.summary
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Request-scoped state of one reconciliation run.
#[derive(Debug)]
pub struct ReconcileContext {
    /// How mutations are applied and rendered.
    pub options: ExecuteOptions,
    /// Destructive commands awaiting display.
    pub queue: DestructiveQueue,
    /// Accumulated results.
    pub report: RunReport,
}

impl ReconcileContext {
    pub fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            queue: DestructiveQueue::new(),
            report: RunReport::default(),
        }
    }
}
