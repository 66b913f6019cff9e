//! Desired-state document model.
//!
//! The document is a YAML mapping of setting categories. Each category maps
//! environment names (plus the `all` default layer) to values:
//!
//! ```yaml
//! apps:
//!   staging: shop-staging
//!   production: shop
//! stacks:
//!   all: cedar-14
//! config:
//!   all:
//!     BUNDLE_WITHOUT: "test:development"
//!   production:
//!     ASSET_HOST: cdn.example.com
//! collaborators:
//!   all: [ops@example.com]
//! addons:
//!   all: [newrelic:bronze]
//! domains:
//!   production: [shop.example.com]
//! ```
//!
//! Resolution is pure: nothing here mutates the raw document.

use crate::error::SchemaError;
use declarative::dedup;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the default layer merged into every environment.
pub const ALL_LAYER: &str = "all";

// ============================================================================
// Categories
// ============================================================================

/// A top-level setting category of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Apps,
    Stacks,
    Config,
    Collaborators,
    Addons,
    Domains,
}

impl Category {
    /// Every category, in the order `setup` reconciles them.
    pub const SETUP: [Self; 6] = [
        Self::Apps,
        Self::Stacks,
        Self::Config,
        Self::Collaborators,
        Self::Addons,
        Self::Domains,
    ];

    /// Document key of this category.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Apps => "apps",
            Self::Stacks => "stacks",
            Self::Config => "config",
            Self::Collaborators => "collaborators",
            Self::Addons => "addons",
            Self::Domains => "domains",
        }
    }

    /// Heading shown while reconciling this category.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Apps => "Apps",
            Self::Stacks => "Stacks",
            Self::Config => "Config vars",
            Self::Collaborators => "Collaborators",
            Self::Addons => "Add-ons",
            Self::Domains => "Domains",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A resolved category value for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    /// Override-or-default scalar (`apps`, `stacks`).
    Scalar(Option<String>),
    /// Merged mapping, environment wins (`config`).
    Map(BTreeMap<String, String>),
    /// Ordered, deduplicated sequence (`collaborators`, `addons`, `domains`).
    List(Vec<String>),
}

// ============================================================================
// Policy
// ============================================================================

/// An add-on family that must always be present, and what to install when
/// nothing from the family is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonRequirement {
    /// Family prefix, e.g. `shared-database`.
    pub family: String,
    /// Plan installed when the family is missing.
    pub default: String,
}

impl AddonRequirement {
    pub fn new(family: &str, default: &str) -> Self {
        Self {
            family: family.to_string(),
            default: default.to_string(),
        }
    }

    /// Whether `addon` belongs to this family (`family` or `family:<plan>`).
    pub fn satisfied_by(&self, addon: &str) -> bool {
        addon
            .strip_prefix(self.family.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
    }
}

/// Platform conventions, overridable under the document's `policy` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Add-on families every app gets.
    pub required_addons: Vec<AddonRequirement>,
    /// Family needed to serve custom domains; `null` disables it.
    pub domain_addon: Option<AddonRequirement>,
    /// Config key defaulted to the environment name; `null` disables it.
    pub environment_key: Option<String>,
    /// Config keys set by the platform itself, never proposed for removal.
    pub managed_config_prefixes: Vec<String>,
    /// Host of the platform's git remotes.
    pub git_host: String,
    /// Remote branch deploys push to.
    pub deploy_branch: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            required_addons: vec![AddonRequirement::new(
                "shared-database",
                "shared-database:5mb",
            )],
            domain_addon: Some(AddonRequirement::new("custom_domains", "custom_domains:basic")),
            environment_key: Some("RACK_ENV".to_string()),
            managed_config_prefixes: vec![
                "DATABASE_URL".to_string(),
                "SHARED_DATABASE_URL".to_string(),
            ],
            git_host: "heroku.com".to_string(),
            deploy_branch: "master".to_string(),
        }
    }
}

impl Policy {
    /// Git repository URL of an app.
    pub fn repo_url(&self, app: &str) -> String {
        format!("git@{}:{app}.git", self.git_host)
    }

    /// Whether a config key is owned by the platform.
    pub fn is_managed_config(&self, key: &str) -> bool {
        self.managed_config_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
    }
}

// ============================================================================
// Desired State
// ============================================================================

/// Parsed desired-state document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredState {
    raw: Mapping,
}

impl DesiredState {
    /// Wrap a parsed YAML value. `null` (an empty file) is an empty document.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Mapping(raw) => Ok(Self { raw }),
            Value::Null => Ok(Self::default()),
            other => Err(SchemaError::NotAMapping {
                found: kind(&other),
            }),
        }
    }

    /// Environment to app identifier, in declaration order.
    pub fn apps(&self) -> Vec<(String, String)> {
        let Some(apps) = self.section(Category::Apps) else {
            return Vec::new();
        };

        apps.iter()
            .filter_map(|(env, app)| match (scalar(env), scalar(app)) {
                (Some(env), Some(app)) => Some((env, app)),
                _ => {
                    log::warn!("Ignoring malformed apps entry {env:?}: {app:?}");
                    None
                }
            })
            .collect()
    }

    /// Environment names, in declaration order.
    pub fn app_environments(&self) -> Vec<String> {
        self.apps().into_iter().map(|(env, _)| env).collect()
    }

    /// App identifiers, in declaration order.
    pub fn app_names(&self) -> Vec<String> {
        self.apps().into_iter().map(|(_, app)| app).collect()
    }

    /// App identifier of an environment.
    pub fn app_id(&self, env: &str) -> Option<String> {
        self.layer(Category::Apps, env).and_then(scalar)
    }

    /// `stacks[env] ?? stacks[all]`
    pub fn stack(&self, env: &str) -> Option<String> {
        self.layer(Category::Stacks, env)
            .or_else(|| self.layer(Category::Stacks, ALL_LAYER))
            .and_then(scalar)
            .filter(|s| !s.is_empty())
    }

    /// `config[all]` merged with `config[env]`, environment values winning.
    pub fn config(&self, env: &str) -> BTreeMap<String, String> {
        let mut merged = self.map_layer(Category::Config, ALL_LAYER);
        merged.extend(self.map_layer(Category::Config, env));
        merged
    }

    /// `collaborators[all] + collaborators[env]`, deduplicated.
    pub fn collaborators(&self, env: &str) -> Vec<String> {
        self.union(Category::Collaborators, env)
    }

    /// `addons[all] + addons[env]`, deduplicated.
    ///
    /// Required add-on families are injected later, when live state is known.
    pub fn addons(&self, env: &str) -> Vec<String> {
        self.union(Category::Addons, env)
    }

    /// `domains[env]` only; the `all` layer does not apply to domains.
    pub fn domains(&self, env: &str) -> Vec<String> {
        dedup(self.list_layer(Category::Domains, env))
    }

    /// Platform conventions, defaulted field by field.
    pub fn policy(&self) -> Policy {
        match self.raw.get("policy") {
            None | Some(Value::Null) => Policy::default(),
            Some(value) => serde_yaml::from_value(value.clone()).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed policy section: {e}");
                Policy::default()
            }),
        }
    }

    /// Resolve any category for an environment.
    pub fn resolve(&self, category: Category, env: &str) -> Resolved {
        match category {
            Category::Apps => Resolved::Scalar(self.app_id(env)),
            Category::Stacks => Resolved::Scalar(self.stack(env)),
            Category::Config => Resolved::Map(self.config(env)),
            Category::Collaborators => Resolved::List(self.collaborators(env)),
            Category::Addons => Resolved::List(self.addons(env)),
            Category::Domains => Resolved::List(self.domains(env)),
        }
    }

    /// Prefix for running a rake task on the platform.
    ///
    /// Cedar-family stacks run tasks in a one-off process.
    pub fn rake_command(&self, env: &str) -> &'static str {
        let cedar = self
            .stack(env)
            .is_some_and(|s| s.to_ascii_lowercase().contains("cedar"));
        if cedar { "run rake" } else { "rake" }
    }

    // ------------------------------------------------------------------------
    // Raw access
    // ------------------------------------------------------------------------

    fn section(&self, category: Category) -> Option<&Mapping> {
        match self.raw.get(category.key())? {
            Value::Mapping(m) => Some(m),
            Value::Null => None,
            other => {
                log::warn!(
                    "Ignoring '{category}': expected a mapping of environments, found {}",
                    kind(other)
                );
                None
            }
        }
    }

    fn layer(&self, category: Category, env: &str) -> Option<&Value> {
        self.section(category)?
            .get(env)
            .filter(|v| !v.is_null())
    }

    fn map_layer(&self, category: Category, env: &str) -> BTreeMap<String, String> {
        let Some(value) = self.layer(category, env) else {
            return BTreeMap::new();
        };
        let Value::Mapping(map) = value else {
            log::warn!("Ignoring {category}.{env}: expected a mapping, found {}", kind(value));
            return BTreeMap::new();
        };

        map.iter()
            .filter_map(|(k, v)| match (scalar(k), scalar(v)) {
                (Some(k), Some(v)) => Some((k, v)),
                _ => {
                    log::warn!("Ignoring {category}.{env} entry {k:?}: value must be a scalar");
                    None
                }
            })
            .collect()
    }

    fn list_layer(&self, category: Category, env: &str) -> Vec<String> {
        match self.layer(category, env) {
            None => Vec::new(),
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|item| {
                    let s = scalar(item);
                    if s.is_none() {
                        log::warn!("Ignoring {category}.{env} item {item:?}: not a scalar");
                    }
                    s
                })
                .collect(),
            // A lone scalar is a one-item list.
            Some(value) => match scalar(value) {
                Some(s) => vec![s],
                None => {
                    log::warn!("Ignoring {category}.{env}: expected a list, found {}", kind(value));
                    Vec::new()
                }
            },
        }
    }

    fn union(&self, category: Category, env: &str) -> Vec<String> {
        let mut items = self.list_layer(category, ALL_LAYER);
        if env != ALL_LAYER {
            items.extend(self.list_layer(category, env));
        }
        dedup(items)
    }
}

/// Stringify a YAML scalar. Config values are opaque strings.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(yaml: &str) -> DesiredState {
        DesiredState::from_value(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    const EXAMPLE: &str = r#"
apps:
  production: shop
  staging: shop-staging
  legacy: shop-legacy
stacks:
  all: cedar-14
  legacy: bamboo-mri-1.9.2
config:
  all:
    BUNDLE_WITHOUT: "test:development"
    WORKERS: 2
  production:
    WORKERS: 8
    FORCE_SSL: true
collaborators:
  all: [ops@example.com, dev@example.com]
  production: [ops@example.com, cto@example.com]
addons:
  all: [newrelic:bronze]
  production: [pgbackups:auto-month]
domains:
  all: [ignored.example.com]
  production: [shop.example.com, www.shop.example.com]
"#;

    #[test]
    fn test_apps_keep_declaration_order() {
        let s = state(EXAMPLE);
        assert_eq!(s.app_environments(), vec!["production", "staging", "legacy"]);
        assert_eq!(s.app_names(), vec!["shop", "shop-staging", "shop-legacy"]);
        assert_eq!(s.app_id("staging").as_deref(), Some("shop-staging"));
        assert_eq!(s.app_id("qa"), None);
    }

    #[test]
    fn test_stack_override_or_default() {
        let s = state(EXAMPLE);
        assert_eq!(s.stack("production").as_deref(), Some("cedar-14"));
        assert_eq!(s.stack("legacy").as_deref(), Some("bamboo-mri-1.9.2"));
        assert_eq!(state("apps: {a: b}").stack("a"), None);
    }

    #[test]
    fn test_config_environment_overrides_all() {
        let s = state(EXAMPLE);
        let config = s.config("production");
        assert_eq!(config.get("WORKERS").map(String::as_str), Some("8"));
        assert_eq!(config.get("FORCE_SSL").map(String::as_str), Some("true"));
        assert_eq!(
            config.get("BUNDLE_WITHOUT").map(String::as_str),
            Some("test:development")
        );

        let staging = s.config("staging");
        assert_eq!(staging.get("WORKERS").map(String::as_str), Some("2"));
        assert!(!staging.contains_key("FORCE_SSL"));
    }

    #[test]
    fn test_lists_are_merged_and_deduplicated() {
        let s = state(EXAMPLE);
        assert_eq!(
            s.collaborators("production"),
            vec!["ops@example.com", "dev@example.com", "cto@example.com"]
        );
        assert_eq!(s.addons("staging"), vec!["newrelic:bronze"]);
        assert_eq!(
            s.addons("production"),
            vec!["newrelic:bronze", "pgbackups:auto-month"]
        );
    }

    #[test]
    fn test_domains_ignore_all_layer() {
        let s = state(EXAMPLE);
        assert_eq!(
            s.domains("production"),
            vec!["shop.example.com", "www.shop.example.com"]
        );
        assert!(s.domains("staging").is_empty());
    }

    #[test]
    fn test_absent_categories_are_empty() {
        let s = state("apps:\n  production: shop\n");
        assert!(s.config("production").is_empty());
        assert!(s.collaborators("production").is_empty());
        assert!(s.addons("production").is_empty());
        assert!(s.domains("production").is_empty());
    }

    #[test]
    fn test_wrong_shapes_are_treated_as_empty() {
        let s = state("apps: {production: shop}\nconfig: [1, 2]\naddons:\n  all: {a: b}\n");
        assert!(s.config("production").is_empty());
        assert!(s.addons("production").is_empty());
    }

    #[test]
    fn test_not_a_mapping() {
        let err = DesiredState::from_value(serde_yaml::from_str("- a\n- b\n").unwrap()).unwrap_err();
        assert!(matches!(err, SchemaError::NotAMapping { found: "a list" }));
        assert_eq!(
            DesiredState::from_value(Value::Null).unwrap(),
            DesiredState::default()
        );
    }

    #[test]
    fn test_resolve_matches_accessors() {
        let s = state(EXAMPLE);
        assert_eq!(
            s.resolve(Category::Stacks, "production"),
            Resolved::Scalar(Some("cedar-14".into()))
        );
        assert_eq!(
            s.resolve(Category::Config, "staging"),
            Resolved::Map(s.config("staging"))
        );
        assert_eq!(
            s.resolve(Category::Domains, "production"),
            Resolved::List(s.domains("production"))
        );
    }

    #[test]
    fn test_rake_command_depends_on_stack() {
        let s = state(EXAMPLE);
        assert_eq!(s.rake_command("production"), "run rake");
        assert_eq!(s.rake_command("legacy"), "rake");
    }

    #[test]
    fn test_policy_defaults_and_overrides() {
        assert_eq!(state("apps: {}").policy(), Policy::default());

        let s = state(
            "policy:\n  git_host: git.example.com\n  domain_addon: null\n  required_addons:\n    - {family: heroku-postgresql, default: \"heroku-postgresql:mini\"}\n",
        );
        let policy = s.policy();
        assert_eq!(policy.git_host, "git.example.com");
        assert_eq!(policy.deploy_branch, "master");
        assert!(policy.domain_addon.is_none());
        assert_eq!(policy.required_addons[0].family, "heroku-postgresql");
        assert_eq!(policy.repo_url("shop"), "git@git.example.com:shop.git");
    }

    #[test]
    fn test_addon_family_matching() {
        let req = AddonRequirement::new("shared-database", "shared-database:5mb");
        assert!(req.satisfied_by("shared-database:5mb"));
        assert!(req.satisfied_by("shared-database:20gb"));
        assert!(req.satisfied_by("shared-database"));
        assert!(!req.satisfied_by("shared-databases:5mb"));
        assert!(!req.satisfied_by("newrelic:bronze"));
    }

    #[test]
    fn test_managed_config_prefixes() {
        let policy = Policy::default();
        assert!(policy.is_managed_config("DATABASE_URL"));
        assert!(policy.is_managed_config("SHARED_DATABASE_URL"));
        assert!(!policy.is_managed_config("REDIS_URL"));
    }
}
