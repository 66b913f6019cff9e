//! # platform
//!
//! Client adapter for the hosting platform that deckhand reconciles against.
//!
//! This crate provides:
//! - A [`Backend`](backend::Backend) trait covering the account, app, config
//!   var, add-on, domain and collaborator endpoints
//! - An HTTP implementation over the platform's JSON API
//! - An in-memory [`MockBackend`](backend::MockBackend) for tests
//! - A [`Client`] that authorizes lazily, once per process
//!
//! ## Example
//!
//! ```no_run
//! use platform::{Client, ClientSettings, DEFAULT_API_BASE};
//! use std::path::PathBuf;
//!
//! let client = Client::new(ClientSettings {
//!     api_base: DEFAULT_API_BASE.to_string(),
//!     credentials_path: PathBuf::from("/home/me/.config/deckhand/credentials"),
//! });
//!
//! // Nothing is read or sent until the first call.
//! let user = client.authorize().expect("not authorized");
//! println!("Signed in as {user}");
//!
//! for app in client.list_apps().unwrap() {
//!     println!("{app}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod credentials;
pub mod error;
pub mod types;

pub use credentials::Credentials;
pub use error::{Error, ErrorCategory, Result};
pub use types::{Account, AppInfo, ClientSettings, ConfigVars, DEFAULT_API_BASE};

use backend::Backend;
use backend::http::HttpBackend;
use std::sync::OnceLock;

/// High-level, lazily authorized platform client.
///
/// The first call that needs the platform loads the credentials, builds the
/// HTTP backend and looks up the account. The result is cached for the
/// lifetime of the client, so authorization happens at most once per run.
pub struct Client {
    settings: Option<ClientSettings>,
    backend: OnceLock<Box<dyn Backend>>,
    user: OnceLock<String>,
}

impl Client {
    /// Create a client for the given API and credentials file.
    #[must_use]
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings: Some(settings),
            backend: OnceLock::new(),
            user: OnceLock::new(),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(backend);
        Self {
            settings: None,
            backend: cell,
            user: OnceLock::new(),
        }
    }

    /// Authorize against the platform and return the invoking user.
    ///
    /// Any failure here is fatal: missing or invalid credentials, or an
    /// account lookup the platform rejects.
    pub fn authorize(&self) -> Result<&str> {
        if let Some(user) = self.user.get() {
            return Ok(user);
        }

        let backend = self.connect()?;
        let account = backend.account().map_err(|e| match e {
            e if e.is_fatal() => e,
            e => Error::Authorization {
                message: e.to_string(),
            },
        })?;
        log::debug!("Authorized as {}", account.email);

        Ok(self.user.get_or_init(|| account.email))
    }

    /// Build the backend on first use.
    fn connect(&self) -> Result<&dyn Backend> {
        if let Some(backend) = self.backend.get() {
            return Ok(backend.as_ref());
        }

        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| Error::Other("client has neither settings nor backend".to_string()))?;
        let credentials = Credentials::load(&settings.credentials_path)?;
        log::debug!(
            "Loaded credentials for {} from {}",
            credentials.identity,
            settings.credentials_path.display()
        );

        let backend = HttpBackend::new(settings.api_base.clone(), &credentials);
        log::debug!("Using platform API at {}", backend.api_base());
        let backend = self
            .backend
            .get_or_init(|| Box::new(backend) as Box<dyn Backend>);
        Ok(backend.as_ref())
    }

    /// Authorized backend for a platform call.
    fn backend(&self) -> Result<&dyn Backend> {
        self.authorize()?;
        self.connect()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Identifiers of every app visible to the invoking user.
    pub fn list_apps(&self) -> Result<Vec<String>> {
        log::debug!("Listing apps");
        self.backend()?.list_apps()
    }

    /// Stack, owner and collaborators of an app.
    pub fn app_info(&self, app: &str) -> Result<AppInfo> {
        log::debug!("Fetching info for {app}");
        self.backend()?.app_info(app)
    }

    /// Current config vars of an app.
    pub fn config_vars(&self, app: &str) -> Result<ConfigVars> {
        log::debug!("Fetching config vars for {app}");
        self.backend()?.config_vars(app)
    }

    /// Installed add-ons of an app.
    pub fn addons(&self, app: &str) -> Result<Vec<String>> {
        log::debug!("Fetching add-ons for {app}");
        self.backend()?.addons(app)
    }

    /// Custom domains of an app.
    pub fn domains(&self, app: &str) -> Result<Vec<String>> {
        log::debug!("Fetching domains for {app}");
        self.backend()?.domains(app)
    }

    /// Most recent log lines of an app.
    pub fn logs(&self, app: &str, lines: u32) -> Result<String> {
        self.backend()?.logs(app, lines)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create an app.
    pub fn create_app(&self, app: &str, stack: Option<&str>) -> Result<()> {
        log::debug!("Creating {app} (stack: {})", stack.unwrap_or("default"));
        self.backend()?.create_app(app, stack)
    }

    /// Migrate an app to another stack.
    pub fn migrate_stack(&self, app: &str, stack: &str) -> Result<()> {
        log::debug!("Migrating {app} to {stack}");
        self.backend()?.migrate_stack(app, stack)
    }

    /// Set config vars in one call.
    pub fn set_config_vars(&self, app: &str, vars: &ConfigVars) -> Result<()> {
        log::debug!("Setting {} config vars on {app}", vars.len());
        self.backend()?.set_config_vars(app, vars)
    }

    /// Remove a config var.
    pub fn unset_config_var(&self, app: &str, key: &str) -> Result<()> {
        log::debug!("Unsetting {key} on {app}");
        self.backend()?.unset_config_var(app, key)
    }

    /// Install an add-on.
    pub fn add_addon(&self, app: &str, addon: &str) -> Result<()> {
        log::debug!("Adding add-on {addon} to {app}");
        self.backend()?.add_addon(app, addon)
    }

    /// Uninstall an add-on.
    pub fn remove_addon(&self, app: &str, addon: &str) -> Result<()> {
        log::debug!("Removing add-on {addon} from {app}");
        self.backend()?.remove_addon(app, addon)
    }

    /// Attach a domain.
    pub fn add_domain(&self, app: &str, domain: &str) -> Result<()> {
        log::debug!("Adding domain {domain} to {app}");
        self.backend()?.add_domain(app, domain)
    }

    /// Detach a domain.
    pub fn remove_domain(&self, app: &str, domain: &str) -> Result<()> {
        log::debug!("Removing domain {domain} from {app}");
        self.backend()?.remove_domain(app, domain)
    }

    /// Grant a collaborator access.
    pub fn add_collaborator(&self, app: &str, email: &str) -> Result<()> {
        log::debug!("Adding collaborator {email} to {app}");
        self.backend()?.add_collaborator(app, email)
    }

    /// Revoke a collaborator's access.
    pub fn remove_collaborator(&self, app: &str, email: &str) -> Result<()> {
        log::debug!("Removing collaborator {email} from {app}");
        self.backend()?.remove_collaborator(app, email)
    }

    /// Restart an app.
    pub fn restart(&self, app: &str) -> Result<()> {
        log::debug!("Restarting {app}");
        self.backend()?.restart(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{MockApp, MockBackend};
    use std::path::PathBuf;

    fn client_with(mock: &MockBackend) -> Client {
        Client::with_backend(Box::new(mock.clone()))
    }

    #[test]
    fn test_authorize_caches_user() {
        let mock = MockBackend::with_account("me@example.com");
        let client = client_with(&mock);

        assert!(client.user.get().is_none());
        assert_eq!(client.authorize().unwrap(), "me@example.com");

        // A later failure of the account endpoint does not matter any more.
        mock.fail_on("account");
        assert_eq!(client.authorize().unwrap(), "me@example.com");
    }

    #[test]
    fn test_rejected_account_is_fatal() {
        let client = client_with(&MockBackend::new());

        let err = client.authorize().unwrap_err();
        assert!(matches!(err, Error::Authorization { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_calls_require_authorization() {
        let mock = MockBackend::new();
        mock.add_app("demo", MockApp::default());
        let client = client_with(&mock);

        assert!(client.domains("demo").unwrap_err().is_fatal());
    }

    #[test]
    fn test_missing_credentials_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new(ClientSettings {
            api_base: "http://127.0.0.1:9".to_string(),
            credentials_path: dir.path().join("credentials"),
        });

        let err = client.list_apps().unwrap_err();
        assert!(matches!(err, Error::CredentialsMissing { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unreadable_credentials_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new(ClientSettings {
            api_base: "http://127.0.0.1:9".to_string(),
            credentials_path: dir.path().to_path_buf(),
        });

        let err = client.authorize().unwrap_err();
        assert!(matches!(err, Error::CredentialsInvalid { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_delegates_to_backend() {
        let mock = MockBackend::with_account("me@example.com");
        mock.add_app("demo", MockApp::default());
        let client = client_with(&mock);

        client.add_domain("demo", "www.example.com").unwrap();
        client.restart("demo").unwrap();

        assert_eq!(client.domains("demo").unwrap(), vec!["www.example.com".to_string()]);
        assert_eq!(mock.app("demo").unwrap().restarts, 1);
        assert_eq!(client.list_apps().unwrap(), vec!["demo".to_string()]);
    }

    #[test]
    fn test_settings_paths_are_kept() {
        let settings = ClientSettings {
            api_base: DEFAULT_API_BASE.to_string(),
            credentials_path: PathBuf::from("/tmp/creds"),
        };
        let client = Client::new(settings.clone());
        assert_eq!(client.settings.as_ref(), Some(&settings));
    }
}
