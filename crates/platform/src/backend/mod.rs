//! Backend abstraction for platform operations.
//!
//! The [`Backend`] trait defines the interface for talking to the hosting
//! platform, allowing for different implementations (the real HTTP API,
//! an in-memory mock for testing).
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use platform::backend::{Backend, MockApp, MockBackend};
//!
//! let mock = MockBackend::with_account("me@example.com");
//! mock.add_app("demo", MockApp::default());
//! mock.add_domain("demo", "demo.example.com").unwrap();
//!
//! assert_eq!(mock.domains("demo").unwrap(), vec!["demo.example.com".to_string()]);
//! assert_eq!(mock.calls(), vec!["add_domain demo demo.example.com".to_string()]);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{Account, AppInfo, ConfigVars};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Backend trait for platform operations.
///
/// Reads return normalized live-state records; mutations either succeed or
/// fail with [`Error::RemoteOperation`]. Implementations never retry.
pub trait Backend: Send + Sync {
    /// The account these credentials belong to.
    fn account(&self) -> Result<Account>;

    /// Identifiers of every app the account can see.
    fn list_apps(&self) -> Result<Vec<String>>;

    /// Stack, owner and collaborators of an app.
    fn app_info(&self, app: &str) -> Result<AppInfo>;

    /// Current config vars of an app.
    fn config_vars(&self, app: &str) -> Result<ConfigVars>;

    /// Installed add-on identifiers (plan names) of an app.
    fn addons(&self, app: &str) -> Result<Vec<String>>;

    /// Custom domains of an app.
    fn domains(&self, app: &str) -> Result<Vec<String>>;

    /// Create an app, optionally on a given stack.
    fn create_app(&self, app: &str, stack: Option<&str>) -> Result<()>;

    /// Move an app to another stack.
    fn migrate_stack(&self, app: &str, stack: &str) -> Result<()>;

    /// Set (add or overwrite) config vars.
    fn set_config_vars(&self, app: &str, vars: &ConfigVars) -> Result<()>;

    /// Remove a config var.
    fn unset_config_var(&self, app: &str, key: &str) -> Result<()>;

    /// Install an add-on.
    fn add_addon(&self, app: &str, addon: &str) -> Result<()>;

    /// Uninstall an add-on.
    fn remove_addon(&self, app: &str, addon: &str) -> Result<()>;

    /// Attach a custom domain.
    fn add_domain(&self, app: &str, domain: &str) -> Result<()>;

    /// Detach a custom domain.
    fn remove_domain(&self, app: &str, domain: &str) -> Result<()>;

    /// Grant a user access to an app.
    fn add_collaborator(&self, app: &str, email: &str) -> Result<()>;

    /// Revoke a user's access to an app.
    fn remove_collaborator(&self, app: &str, email: &str) -> Result<()>;

    /// Restart every process of an app.
    fn restart(&self, app: &str) -> Result<()>;

    /// Fetch the most recent log lines of an app.
    fn logs(&self, app: &str, lines: u32) -> Result<String>;
}

/// One app held by [`MockBackend`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockApp {
    pub stack: Option<String>,
    pub owner: Option<String>,
    pub collaborators: Vec<String>,
    pub config: ConfigVars,
    pub addons: Vec<String>,
    pub domains: Vec<String>,
    /// Number of restarts requested so far.
    pub restarts: usize,
}

#[derive(Debug, Default)]
struct MockState {
    account: Option<String>,
    apps: BTreeMap<String, MockApp>,
    calls: Vec<String>,
    failures: HashSet<String>,
}

/// Mock backend for testing without network access.
///
/// Apps live in memory and mutations change them, so a second
/// reconciliation pass sees the converged state. Every mutation is
/// recorded in [`MockBackend::calls`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a mock with no account (authorization fails).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock authorized as `email`.
    #[must_use]
    pub fn with_account(email: &str) -> Self {
        let mock = Self::new();
        mock.lock().account = Some(email.to_string());
        mock
    }

    /// Add or replace an app.
    pub fn add_app(&self, name: &str, app: MockApp) {
        self.lock().apps.insert(name.to_string(), app);
    }

    /// Snapshot of an app.
    #[must_use]
    pub fn app(&self, name: &str) -> Option<MockApp> {
        self.lock().apps.get(name).cloned()
    }

    /// Make every call of `operation` (e.g. `"add_domain"`) fail.
    pub fn fail_on(&self, operation: &str) {
        self.lock().failures.insert(operation.to_string());
    }

    /// Make `operation` fail for one app only.
    pub fn fail_on_app(&self, operation: &str, app: &str) {
        self.lock().failures.insert(format!("{operation} {app}"));
    }

    /// Mutations performed so far, as `"<operation> <app> <args>"`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read against an app, honoring injected failures.
    fn read<T>(&self, operation: &str, app: &str, f: impl FnOnce(&MockApp) -> T) -> Result<T> {
        let state = self.lock();
        check_failure(&state, operation, Some(app))?;
        state.apps.get(app).map(f).ok_or_else(|| not_found(operation, app))
    }

    /// Run a mutation against an app, recording it.
    fn mutate(
        &self,
        operation: &str,
        app: &str,
        args: &str,
        f: impl FnOnce(&mut MockApp) -> Result<()>,
    ) -> Result<()> {
        let mut state = self.lock();
        check_failure(&state, operation, Some(app))?;
        let target = state
            .apps
            .get_mut(app)
            .ok_or_else(|| not_found(operation, app))?;
        f(target)?;
        state.calls.push(format!("{operation} {app} {args}").trim_end().to_string());
        Ok(())
    }
}

fn check_failure(state: &MockState, operation: &str, app: Option<&str>) -> Result<()> {
    let for_app = app.is_some_and(|app| state.failures.contains(&format!("{operation} {app}")));
    if for_app || state.failures.contains(operation) {
        return Err(Error::remote(operation, Some(422), "mock failure"));
    }
    Ok(())
}

fn not_found(operation: &str, app: &str) -> Error {
    Error::remote(
        operation,
        Some(404),
        &format!(r#"{{"id":"not_found","message":"Couldn't find app {app}."}}"#),
    )
}

fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|i| i == item) {
        items.push(item.to_string());
    }
}

fn remove_existing(items: &mut Vec<String>, item: &str, operation: &str) -> Result<()> {
    let before = items.len();
    items.retain(|i| i != item);
    if items.len() == before {
        return Err(Error::remote(operation, Some(404), &format!("{item} not found")));
    }
    Ok(())
}

impl Backend for MockBackend {
    fn account(&self) -> Result<Account> {
        let state = self.lock();
        check_failure(&state, "account", None)?;
        state
            .account
            .clone()
            .map(|email| Account { email })
            .ok_or_else(|| Error::remote("account", Some(401), "Invalid credentials provided."))
    }

    fn list_apps(&self) -> Result<Vec<String>> {
        let state = self.lock();
        check_failure(&state, "list_apps", None)?;
        Ok(state.apps.keys().cloned().collect())
    }

    fn app_info(&self, app: &str) -> Result<AppInfo> {
        self.read("app_info", app, |a| AppInfo {
            name: app.to_string(),
            stack: a.stack.clone(),
            owner: a.owner.clone(),
            collaborators: a.collaborators.clone(),
            ..Default::default()
        })
    }

    fn config_vars(&self, app: &str) -> Result<ConfigVars> {
        self.read("config_vars", app, |a| a.config.clone())
    }

    fn addons(&self, app: &str) -> Result<Vec<String>> {
        self.read("addons", app, |a| a.addons.clone())
    }

    fn domains(&self, app: &str) -> Result<Vec<String>> {
        self.read("domains", app, |a| a.domains.clone())
    }

    fn create_app(&self, app: &str, stack: Option<&str>) -> Result<()> {
        let mut state = self.lock();
        check_failure(&state, "create_app", Some(app))?;
        if state.apps.contains_key(app) {
            return Err(Error::remote("create_app", Some(422), "Name is already taken"));
        }
        let owner = state.account.clone();
        state.apps.insert(
            app.to_string(),
            MockApp {
                stack: stack.map(str::to_string),
                collaborators: owner.iter().cloned().collect(),
                owner,
                ..Default::default()
            },
        );
        state
            .calls
            .push(format!("create_app {app} {}", stack.unwrap_or_default()).trim_end().to_string());
        Ok(())
    }

    fn migrate_stack(&self, app: &str, stack: &str) -> Result<()> {
        self.mutate("migrate_stack", app, stack, |a| {
            a.stack = Some(stack.to_string());
            Ok(())
        })
    }

    fn set_config_vars(&self, app: &str, vars: &ConfigVars) -> Result<()> {
        let args = vars
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.mutate("set_config_vars", app, &args, |a| {
            a.config.extend(vars.clone());
            Ok(())
        })
    }

    fn unset_config_var(&self, app: &str, key: &str) -> Result<()> {
        self.mutate("unset_config_var", app, key, |a| {
            a.config
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| Error::remote("unset_config_var", Some(404), "not set"))
        })
    }

    fn add_addon(&self, app: &str, addon: &str) -> Result<()> {
        self.mutate("add_addon", app, addon, |a| {
            push_unique(&mut a.addons, addon);
            Ok(())
        })
    }

    fn remove_addon(&self, app: &str, addon: &str) -> Result<()> {
        self.mutate("remove_addon", app, addon, |a| {
            remove_existing(&mut a.addons, addon, "remove_addon")
        })
    }

    fn add_domain(&self, app: &str, domain: &str) -> Result<()> {
        self.mutate("add_domain", app, domain, |a| {
            push_unique(&mut a.domains, domain);
            Ok(())
        })
    }

    fn remove_domain(&self, app: &str, domain: &str) -> Result<()> {
        self.mutate("remove_domain", app, domain, |a| {
            remove_existing(&mut a.domains, domain, "remove_domain")
        })
    }

    fn add_collaborator(&self, app: &str, email: &str) -> Result<()> {
        self.mutate("add_collaborator", app, email, |a| {
            push_unique(&mut a.collaborators, email);
            Ok(())
        })
    }

    fn remove_collaborator(&self, app: &str, email: &str) -> Result<()> {
        self.mutate("remove_collaborator", app, email, |a| {
            remove_existing(&mut a.collaborators, email, "remove_collaborator")
        })
    }

    fn restart(&self, app: &str) -> Result<()> {
        self.mutate("restart", app, "", |a| {
            a.restarts += 1;
            Ok(())
        })
    }

    fn logs(&self, app: &str, lines: u32) -> Result<String> {
        self.read("logs", app, |_| {
            format!("app[web.1]: mock log output ({lines} lines requested)\n")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock() -> MockBackend {
        let mock = MockBackend::with_account("me@example.com");
        mock.add_app(
            "demo",
            MockApp {
                stack: Some("cedar".into()),
                owner: Some("me@example.com".into()),
                collaborators: vec!["me@example.com".into()],
                ..Default::default()
            },
        );
        mock
    }

    #[test]
    fn test_account_without_credentials_fails() {
        assert!(MockBackend::new().account().is_err());
        assert_eq!(mock().account().unwrap().email, "me@example.com");
    }

    #[test]
    fn test_mutations_change_state_and_are_recorded() {
        let mock = mock();
        mock.add_addon("demo", "newrelic:bronze").unwrap();
        mock.set_config_vars(
            "demo",
            &ConfigVars::from([("FOO".to_string(), "1".to_string())]),
        )
        .unwrap();

        let app = mock.app("demo").unwrap();
        assert_eq!(app.addons, vec!["newrelic:bronze".to_string()]);
        assert_eq!(app.config.get("FOO").map(String::as_str), Some("1"));
        assert_eq!(
            mock.calls(),
            vec![
                "add_addon demo newrelic:bronze".to_string(),
                "set_config_vars demo FOO=1".to_string(),
            ]
        );
    }

    #[test]
    fn test_injected_failure() {
        let mock = mock();
        mock.fail_on("add_domain");

        let err = mock.add_domain("demo", "a.com").unwrap_err();
        assert!(matches!(err, Error::RemoteOperation { .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_injected_failure_for_one_app() {
        let mock = mock();
        mock.add_app("other", MockApp::default());
        mock.fail_on_app("add_domain", "demo");

        assert!(mock.add_domain("demo", "a.com").is_err());
        mock.add_domain("other", "b.com").unwrap();
        assert_eq!(mock.calls(), vec!["add_domain other b.com".to_string()]);
    }

    #[test]
    fn test_unknown_app_is_remote_error() {
        let err = mock().domains("nope").unwrap_err();
        assert!(err.to_string().contains("Couldn't find app nope"));
    }

    #[test]
    fn test_create_app_makes_account_owner() {
        let mock = mock();
        mock.create_app("fresh", Some("cedar-14")).unwrap();

        let app = mock.app("fresh").unwrap();
        assert_eq!(app.owner.as_deref(), Some("me@example.com"));
        assert_eq!(app.stack.as_deref(), Some("cedar-14"));
        assert!(mock.create_app("fresh", None).is_err());
    }
}
