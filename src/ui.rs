use colored::Colorize;
use declarative::{ApplyResult, ProgressCallback};

use crate::engine::RunReport;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print the environment being worked on
pub fn target(environment: &str, app: &str) {
    println!("{} {} {}", "→".cyan(), environment.bold(), format!("({app})").dimmed());
}

/// Echo a command before it runs
pub fn echo(command: &str) {
    println!("  {} {}", "$".dimmed(), command);
}

// ============================================================================
// Destructive Commands
// ============================================================================

/// Print removals the operator has to run by hand
pub fn destructive_commands(app: &str, commands: &[String]) {
    if commands.is_empty() {
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Manual Removal".yellow().bold()
    );
    println!("│");
    println!(
        "│  {}  {} has things that are no longer in the desired state.",
        "⚠".yellow(),
        app
    );
    println!("│  If they are no longer necessary, run:");
    println!("│");

    for command in commands {
        println!("│    {command}");
    }

    println!("│");
    println!("│  These commands may cause data loss, so make sure they are necessary.");
    println!("└─────────────────────────────────────────────────────────────┘");
}

// ============================================================================
// Progress
// ============================================================================

/// Echoes each mutation and its outcome
pub struct UiProgress {
    pub verbose: bool,
}

impl ProgressCallback for UiProgress {
    fn on_action_start(&mut self, _id: &str, command: &str) {
        echo(command);
    }

    fn on_action_complete(&mut self, id: &str, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange | ApplyResult::Created | ApplyResult::Modified => {
                if self.verbose {
                    let mark = if result.is_change() { "✓".green() } else { "○".dimmed() };
                    println!("    {mark} {id}");
                }
            }
            ApplyResult::Failed { error } => println!("    {} {}", "✗".red(), error),
            ApplyResult::Skipped { reason } => {
                println!("    {} {}", "⊘".dimmed(), reason.dimmed());
            }
        }
    }

    fn on_action_deferred(&mut self, id: &str, _command: &str) {
        log::debug!("Deferred {id}");
    }
}

/// Print the end-of-run summary
pub fn run_report(report: &RunReport, dry_run: bool) {
    let summary = report.summary();

    println!();
    if dry_run {
        info(&format!("Dry run - {} steps checked, no changes made", summary.total()));
    }

    if report.is_success() {
        success(&format!(
            "{} changes applied, {} removals left for you",
            summary.total_changes(),
            summary.deferred
        ));
        return;
    }

    error(&format!(
        "{} of the requested steps failed ({} changes applied, {} skipped)",
        report.failures().len(),
        summary.total_changes(),
        summary.skipped
    ));
    for failure in report.failures() {
        eprintln!(
            "  {} {}: {}",
            format!("{}/{}", failure.environment, failure.category).bold(),
            "failed".red(),
            failure.message
        );
    }
}
