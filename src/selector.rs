//! Environment selection.
//!
//! Decides which environments an invocation targets: the names given on the
//! command line, every environment (`all`), or the only one configured.

use crate::error::SelectionError;
use crate::schema::{ALL_LAYER, DesiredState};
use declarative::dedup;
use serde::Serialize;

/// One environment to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Environment name, e.g. `production`.
    pub environment: String,
    /// App identifier on the platform.
    pub app: String,
    /// Git repository of the app.
    pub repo: String,
}

/// Environments requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSelector {
    names: Vec<String>,
}

impl EnvironmentSelector {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: dedup(names.into_iter().map(Into::into)),
        }
    }

    /// Select every configured environment.
    pub fn all() -> Self {
        Self::new([ALL_LAYER])
    }

    /// Whether nothing was named explicitly.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve the selection against the document.
    ///
    /// Explicit names keep the order given; `all` and the implicit default
    /// follow declaration order.
    pub fn resolve(&self, state: &DesiredState) -> Result<Vec<Target>, SelectionError> {
        let apps = state.apps();
        let configured = state.app_environments();
        let policy = state.policy();

        let target = |(environment, app): (String, String)| Target {
            repo: policy.repo_url(&app),
            environment,
            app,
        };

        if self.names.iter().any(|n| n == ALL_LAYER) {
            if apps.is_empty() {
                return Err(SelectionError::NoEnvironmentSelected { configured });
            }
            return Ok(apps.into_iter().map(target).collect());
        }

        if self.names.is_empty() {
            return match apps.len() {
                1 => {
                    let only = apps.into_iter().map(target).collect::<Vec<_>>();
                    log::debug!("Single environment {} selected implicitly", only[0].environment);
                    Ok(only)
                }
                _ => Err(SelectionError::NoEnvironmentSelected { configured }),
            };
        }

        self.names
            .iter()
            .map(|name| {
                apps.iter()
                    .find(|(env, _)| env == name)
                    .cloned()
                    .map(target)
                    .ok_or_else(|| SelectionError::UnknownEnvironment {
                        name: name.clone(),
                        configured: configured.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(yaml: &str) -> DesiredState {
        DesiredState::from_value(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    fn envs(targets: &[Target]) -> Vec<&str> {
        targets.iter().map(|t| t.environment.as_str()).collect()
    }

    const TWO: &str = "apps:\n  production: shop\n  staging: shop-staging\n";

    #[test]
    fn test_explicit_names_keep_given_order() {
        let targets = EnvironmentSelector::new(["staging", "production", "staging"])
            .resolve(&state(TWO))
            .unwrap();
        assert_eq!(envs(&targets), vec!["staging", "production"]);
        assert_eq!(targets[0].app, "shop-staging");
        assert_eq!(targets[0].repo, "git@heroku.com:shop-staging.git");
    }

    #[test]
    fn test_all_uses_declaration_order() {
        let targets = EnvironmentSelector::all().resolve(&state(TWO)).unwrap();
        assert_eq!(envs(&targets), vec!["production", "staging"]);
    }

    #[test]
    fn test_implicit_single_environment() {
        let targets = EnvironmentSelector::default()
            .resolve(&state("apps:\n  production: shop\n"))
            .unwrap();
        assert_eq!(envs(&targets), vec!["production"]);
    }

    #[test]
    fn test_no_selection_with_several_environments() {
        let err = EnvironmentSelector::default().resolve(&state(TWO)).unwrap_err();
        assert!(matches!(err, SelectionError::NoEnvironmentSelected { .. }));
    }

    #[test]
    fn test_no_selection_with_zero_environments() {
        let empty = DesiredState::default();
        assert!(matches!(
            EnvironmentSelector::default().resolve(&empty),
            Err(SelectionError::NoEnvironmentSelected { .. })
        ));
        assert!(matches!(
            EnvironmentSelector::all().resolve(&empty),
            Err(SelectionError::NoEnvironmentSelected { .. })
        ));
    }

    #[test]
    fn test_unknown_environment() {
        let err = EnvironmentSelector::new(["qa"]).resolve(&state(TWO)).unwrap_err();
        match err {
            SelectionError::UnknownEnvironment { name, configured } => {
                assert_eq!(name, "qa");
                assert_eq!(configured, vec!["production", "staging"]);
            }
            other => panic!("Expected UnknownEnvironment, got {other:?}"),
        }
    }

    #[test]
    fn test_repo_url_follows_policy() {
        let targets = EnvironmentSelector::new(["production"])
            .resolve(&state("apps: {production: shop}\npolicy: {git_host: git.example.com}\n"))
            .unwrap();
        assert_eq!(targets[0].repo, "git@git.example.com:shop.git");
    }
}
