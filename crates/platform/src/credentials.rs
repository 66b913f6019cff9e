//! Local credentials file.
//!
//! The file holds two newline-separated tokens: the account identity
//! (email) and the API secret.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Identity and secret used to authorize against the platform.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account identity, usually an email.
    pub identity: String,
    secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from their two tokens.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Default location: `~/.config/deckhand/credentials`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("deckhand").join("credentials"))
    }

    /// Read credentials from a file.
    ///
    /// A missing file is [`Error::CredentialsMissing`], whose message tells
    /// the operator how to create it. Any other read failure (a directory,
    /// no permission) is [`Error::CredentialsInvalid`]. Both are fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::CredentialsMissing {
                path: path.to_path_buf(),
            },
            _ => Error::CredentialsInvalid {
                path: path.to_path_buf(),
                message: format!("could not be read: {e}"),
            },
        })?;
        Self::parse(&content, path)
    }

    /// Parse the two-line credentials format.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

        let invalid = |message: &str| Error::CredentialsInvalid {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        let identity = lines.next().ok_or_else(|| invalid("file is empty"))?;
        let secret = lines
            .next()
            .ok_or_else(|| invalid("expected the API key on the second line"))?;

        Ok(Self::new(identity, secret))
    }

    /// Value of the HTTP `Authorization` header.
    #[must_use]
    pub fn basic_auth(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.identity, self.secret));
        format!("Basic {token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_lines() {
        let creds = Credentials::parse("me@example.com\nsecret-key\n", Path::new("creds")).unwrap();
        assert_eq!(creds.identity, "me@example.com");
        assert_eq!(creds.basic_auth(), format!("Basic {}", STANDARD.encode("me@example.com:secret-key")));
    }

    #[test]
    fn test_parse_ignores_blank_lines_and_whitespace() {
        let creds = Credentials::parse("\n  me@example.com  \n\nkey\n", Path::new("creds")).unwrap();
        assert_eq!(creds, Credentials::new("me@example.com", "key"));
    }

    #[test]
    fn test_parse_missing_secret() {
        let err = Credentials::parse("me@example.com\n", Path::new("creds")).unwrap_err();
        assert!(matches!(err, Error::CredentialsInvalid { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        let err = Credentials::load(&path).unwrap_err();
        assert!(matches!(err, Error::CredentialsMissing { .. }));
    }

    #[test]
    fn test_load_unreadable_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let err = Credentials::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CredentialsInvalid { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, "ops@example.com\nabc123\n").unwrap();

        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.identity, "ops@example.com");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("me@example.com", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
