use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Runs local programs (git, shell pipelines)
pub trait CommandRunner {
    /// Run a command and inherit stdio (shows output in real-time)
    fn run(&self, cmd: &str, args: &[&str]) -> Result<bool>;

    /// Run a command and capture output
    fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String>;

    /// Run a command line through `sh -c`
    fn run_shell(&self, line: &str) -> Result<bool> {
        self.run("sh", &["-c", line])
    }
}

/// Runs commands on this machine
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<bool> {
        let status = Command::new(cmd)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;
        Ok(status.success())
    }

    fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(cmd)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Command failed: {}", stderr.trim())
        }
    }
}

/// Records commands instead of running them
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: std::cell::RefCell<Vec<String>>,
    /// Output returned by `run_capture`, keyed by the full command line
    pub outputs: std::collections::HashMap<String, String>,
    /// Commands that report failure
    pub failing: Vec<String>,
}

#[cfg(test)]
impl RecordingRunner {
    fn line(cmd: &str, args: &[&str]) -> String {
        std::iter::once(cmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[cfg(test)]
impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<bool> {
        let line = Self::line(cmd, args);
        let ok = !self.failing.iter().any(|f| line.contains(f.as_str()));
        self.calls.borrow_mut().push(line);
        Ok(ok)
    }

    fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let line = Self::line(cmd, args);
        self.calls.borrow_mut().push(line.clone());
        self.outputs
            .get(&line)
            .cloned()
            .with_context(|| format!("Command failed: {line}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_runner_capture() {
        let out = SystemRunner.run_capture("sh", &["-c", "echo hello"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_system_runner_reports_failure() {
        assert!(!SystemRunner.run_shell("exit 3").unwrap());
        assert!(SystemRunner.run_capture("sh", &["-c", "echo oops >&2; exit 1"]).is_err());
    }

    #[test]
    fn test_recording_runner_shell_line() {
        let runner = RecordingRunner::default();
        assert!(runner.run_shell("git push a b").unwrap());
        assert_eq!(runner.calls(), vec!["sh -c git push a b".to_string()]);
    }
}
