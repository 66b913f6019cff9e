//! Settings and desired-state loading.
//!
//! The desired-state file is expanded through environment-variable
//! interpolation (`$VAR`, `${VAR}`, `${VAR:-default}`) before it is parsed
//! as YAML. A file that cannot be loaded is reported and treated as empty.

use anyhow::{Context, Result};
use platform::{ClientSettings, Credentials};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::schema::DesiredState;
use crate::ui;

/// Default location of the desired-state file, relative to the project.
pub const DEFAULT_CONFIG_PATH: &str = "config/deckhand.yml";

/// Where things are, resolved from flags and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Desired-state file.
    pub config_path: PathBuf,
    /// Platform API base URL.
    pub api_base: String,
    /// Credentials file.
    pub credentials_path: PathBuf,
    /// Platform CLI name used in rendered commands.
    pub cli: String,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let credentials_path = match &cli.credentials {
            Some(path) => path.clone(),
            None => Credentials::default_path().context("Could not determine home directory")?,
        };

        Ok(Self {
            config_path: cli.config.clone(),
            api_base: cli.api_url.clone(),
            credentials_path,
            cli: cli.cli.clone(),
        })
    }

    /// Settings for the platform client.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_base: self.api_base.clone(),
            credentials_path: self.credentials_path.clone(),
        }
    }
}

/// Expand environment variables in the document text.
///
/// Unset variables are left as written, so literal `$` in values (password
/// hashes, salts) survives. A set variable that is not valid UTF-8 is an error.
pub fn expand(text: &str, path: &Path) -> Result<String, ConfigError> {
    shellexpand::env_with_context(text, |name| match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e),
    })
    .map(|expanded| expanded.into_owned())
        .map_err(|e| ConfigError::Expand {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Expand and parse a desired-state document.
pub fn parse(text: &str, path: &Path) -> Result<DesiredState, ConfigError> {
    let expanded = expand(text, path)?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&expanded).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    DesiredState::from_value(value).map_err(|source| ConfigError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, expand and parse the desired-state file.
pub fn read(path: &Path) -> Result<DesiredState, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

/// Load the desired state, falling back to an empty document.
pub fn load_desired_state(path: &Path) -> DesiredState {
    match read(path) {
        Ok(state) => {
            log::debug!("Loaded desired state from {}", path.display());
            state
        }
        Err(e) => {
            log::debug!("{e:?}");
            ui::warn(&format!("{e}; continuing with an empty desired state"));
            DesiredState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_default() {
        let text = "apps:\n  production: ${DECKHAND_TEST_UNSET_APP:-shop}\n";
        let state = parse(text, Path::new("deckhand.yml")).unwrap();
        assert_eq!(state.app_id("production").as_deref(), Some("shop"));
    }

    #[test]
    fn test_unset_variable_is_kept_literally() {
        let text = "apps: {p: $DECKHAND_TEST_SURELY_UNSET}";
        let expanded = expand(text, Path::new("x.yml")).unwrap();
        assert_eq!(expanded, text);
    }

    #[test]
    fn test_dollar_in_config_value_survives() {
        let text = "apps:\n  production: shop\nconfig:\n  all:\n    BCRYPT_SALT: \"$2a$10$abcdef\"\n";
        let state = parse(text, Path::new("deckhand.yml")).unwrap();

        assert_eq!(state.app_environments(), vec!["production"]);
        assert_eq!(
            state.config("production").get("BCRYPT_SALT").map(String::as_str),
            Some("$2a$10$abcdef")
        );
    }

    #[test]
    fn test_malformed_yaml() {
        let err = parse("apps: [unclosed", Path::new("x.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_not_a_mapping() {
        let err = parse("just a string", Path::new("x.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deckhand.yml");
        fs::write(&path, "apps:\n  staging: shop-staging\n").unwrap();

        let state = load_desired_state(&path);
        assert_eq!(state.app_environments(), vec!["staging"]);
    }

    #[test]
    fn test_missing_file_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");

        assert!(matches!(read(&path), Err(ConfigError::Read { .. })));
        assert_eq!(load_desired_state(&path), DesiredState::default());
    }
}
