//! Core types for declarative reconciliation

use serde::{Deserialize, Serialize};

/// Result of applying an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Something was created on the target
    Created,
    /// Something on the target was changed in place
    Modified,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    /// Destructive actions queued for the operator instead of applied
    pub deferred: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
    /// Messages of failed actions, in order
    pub errors: Vec<String>,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of actions processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.deferred + self.skipped + self.failed + self.no_change
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.deferred += other.deferred;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.no_change += other.no_change;
        self.errors.extend(other.errors.iter().cloned());
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Failed { error } => {
                self.failed += 1;
                self.errors.push(error.clone());
            }
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Program name prefixed to every rendered command (e.g. `heroku`)
    pub program: String,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            program: "heroku".to_string(),
        }
    }
}

impl ExecuteOptions {
    /// Render an action's command line with the program prefix
    pub fn render(&self, command: &str) -> String {
        if self.program.is_empty() {
            command.to_string()
        } else {
            format!("{} {}", self.program, command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_add_result_collects_errors() {
        let mut summary = ExecuteSummary::default();
        summary.add_result(&ApplyResult::Created);
        summary.add_result(&ApplyResult::Failed {
            error: "boom".into(),
        });
        summary.add_result(&ApplyResult::Skipped {
            reason: "dry run".into(),
        });

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, vec!["boom".to_string()]);
        assert!(!summary.is_success());
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_summary_merge() {
        let mut a = ExecuteSummary {
            created: 1,
            deferred: 2,
            ..Default::default()
        };
        let b = ExecuteSummary {
            modified: 1,
            failed: 1,
            errors: vec!["x".into()],
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.total_changes(), 2);
        assert_eq!(a.deferred, 2);
        assert_eq!(a.errors.len(), 1);
    }

    #[test]
    fn test_render_prefixes_program() {
        let opts = ExecuteOptions::default();
        assert_eq!(
            opts.render("domains:remove a.com --app demo"),
            "heroku domains:remove a.com --app demo"
        );

        let bare = ExecuteOptions {
            program: String::new(),
            ..Default::default()
        };
        assert_eq!(bare.render("restart"), "restart");
    }
}
