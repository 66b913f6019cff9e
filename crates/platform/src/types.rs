//! Normalized live-state records returned by backends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Config vars of an app, keyed by name.
pub type ConfigVars = BTreeMap<String, String>;

/// The account the client is authorized as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Email identifying the invoking user.
    pub email: String,
}

/// Live information about one app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    /// App identifier on the platform.
    pub name: String,
    /// Stack the app builds on, if the platform reports one.
    pub stack: Option<String>,
    /// Owner's email.
    pub owner: Option<String>,
    /// Collaborator emails (the owner usually appears here too).
    pub collaborators: Vec<String>,
    /// Public URL of the app.
    pub web_url: Option<String>,
    /// Git URL of the app's repository on the platform.
    pub git_url: Option<String>,
    /// Region the app runs in.
    pub region: Option<String>,
}

/// Where a [`crate::Client`] finds the platform and its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the platform API.
    pub api_base: String,
    /// Path of the credentials file.
    pub credentials_path: PathBuf,
}

/// Default platform API.
pub const DEFAULT_API_BASE: &str = "https://api.heroku.com";
