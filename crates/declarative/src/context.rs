//! Apply context, destructive queue and provider traits
//!
//! These let the declarative crate be used without depending on a
//! specific UI or platform.

use crate::types::ApplyResult;

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called before an additive action is applied, with its rendered command
    fn on_action_start(&mut self, id: &str, command: &str);

    /// Called when an action application completes
    fn on_action_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a destructive action is queued instead of applied
    fn on_action_deferred(&mut self, _id: &str, _command: &str) {}
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_action_start(&mut self, _id: &str, _command: &str) {}
    fn on_action_complete(&mut self, _id: &str, _result: &ApplyResult) {}
}

/// Context passed to action apply operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}

/// Accumulator of destructive commands awaiting manual execution
///
/// Commands are only ever rendered and shown; nothing in this crate runs
/// them. Duplicates are ignored.
#[derive(Debug, Clone, Default)]
pub struct DestructiveQueue {
    commands: Vec<String>,
}

impl DestructiveQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a rendered command
    pub fn push(&mut self, command: impl Into<String>) {
        let command = command.into();
        if !self.commands.contains(&command) {
            self.commands.push(command);
        }
    }

    /// Commands queued so far
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command, leaving the queue empty
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.commands)
    }
}
