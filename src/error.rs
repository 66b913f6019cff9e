//! Error types for the deckhand binary.
//!
//! Platform errors live in the `platform` crate; these cover the
//! desired-state document, environment selection and the local checkout.

use std::io;
use std::path::PathBuf;

/// The raw document has the wrong shape.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The top level of the document is not a mapping.
    #[error("desired-state document must be a mapping of settings, found {found}")]
    NotAMapping { found: &'static str },
}

/// The desired-state document could not be loaded.
///
/// Never fatal: the caller warns and carries on with an empty document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not expand variables in {}: {message}", .path.display())]
    Expand { path: PathBuf, message: String },

    #[error("malformed YAML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// No usable set of environments for this invocation.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("{}", no_selection_message(.configured))]
    NoEnvironmentSelected { configured: Vec<String> },

    #[error("unknown environment '{name}' (configured: {})", list_or_none(.configured))]
    UnknownEnvironment {
        name: String,
        configured: Vec<String>,
    },
}

/// The local git checkout cannot be deployed from.
#[derive(Debug, thiserror::Error)]
pub enum LocalStateError {
    #[error(
        "unable to determine the current git branch, check out the branch you'd like to deploy"
    )]
    BranchUnresolvable,

    #[error("git failed: {message}")]
    Git { message: String },
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn no_selection_message(configured: &[String]) -> String {
    if configured.is_empty() {
        return "no environments are configured. Add an `apps` mapping of environment \
                names to app identifiers to the desired-state file and try again"
            .to_string();
    }

    format!(
        "you must first specify at least one environment:\n\
         \x20 deckhand <env> [<env>...] <command>\n\
         \x20 deckhand production restart\n\
         \x20 deckhand demo staging deploy\n\
         or target every environment of this project:\n\
         \x20 deckhand all setup\n\
         configured environments: {}",
        configured.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_selection_lists_syntax_and_environments() {
        let err = SelectionError::NoEnvironmentSelected {
            configured: vec!["staging".into(), "production".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("deckhand production restart"));
        assert!(msg.contains("deckhand all setup"));
        assert!(msg.contains("staging, production"));
    }

    #[test]
    fn test_no_selection_without_environments() {
        let err = SelectionError::NoEnvironmentSelected { configured: vec![] };
        assert!(err.to_string().contains("no environments are configured"));
    }

    #[test]
    fn test_unknown_environment_message() {
        let err = SelectionError::UnknownEnvironment {
            name: "qa".into(),
            configured: vec![],
        };
        assert_eq!(err.to_string(), "unknown environment 'qa' (configured: none)");
    }
}
