// Platform reconciliation
pub mod setup;

// Local git and shell commands
pub mod deploy;

// Read-only and one-shot commands
pub mod apps;
