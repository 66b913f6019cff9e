//! Remote mutations emitted by the reconciler

use anyhow::{Context, Result};
use declarative::{Action, ApplyContext, ApplyResult};
use platform::{Client, ConfigVars};

/// One corrective change to an app on the platform
///
/// Removals are destructive: they are rendered as commands for the
/// operator and never applied by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateApp { app: String, stack: Option<String> },
    MigrateStack { app: String, stack: String },
    SetConfig { app: String, vars: ConfigVars },
    UnsetConfig { app: String, key: String },
    AddCollaborator { app: String, email: String },
    RemoveCollaborator { app: String, email: String },
    AddAddon { app: String, addon: String },
    RemoveAddon { app: String, addon: String },
    AddDomain { app: String, domain: String },
    RemoveDomain { app: String, domain: String },
}

impl Mutation {
    /// App the mutation applies to
    pub fn app(&self) -> &str {
        match self {
            Self::CreateApp { app, .. }
            | Self::MigrateStack { app, .. }
            | Self::SetConfig { app, .. }
            | Self::UnsetConfig { app, .. }
            | Self::AddCollaborator { app, .. }
            | Self::RemoveCollaborator { app, .. }
            | Self::AddAddon { app, .. }
            | Self::RemoveAddon { app, .. }
            | Self::AddDomain { app, .. }
            | Self::RemoveDomain { app, .. } => app,
        }
    }
}

/// Quote a config value for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl Action for Mutation {
    type Target = Client;

    fn id(&self) -> String {
        match self {
            Self::CreateApp { app, .. } => format!("app:{app}"),
            Self::MigrateStack { app, stack } => format!("stack:{app}:{stack}"),
            Self::SetConfig { app, .. } => format!("config:{app}"),
            Self::UnsetConfig { app, key } => format!("config:{app}:{key}"),
            Self::AddCollaborator { app, email } | Self::RemoveCollaborator { app, email } => {
                format!("collaborator:{app}:{email}")
            }
            Self::AddAddon { app, addon } | Self::RemoveAddon { app, addon } => {
                format!("addon:{app}:{addon}")
            }
            Self::AddDomain { app, domain } | Self::RemoveDomain { app, domain } => {
                format!("domain:{app}:{domain}")
            }
        }
    }

    fn description(&self) -> String {
        match self {
            Self::CreateApp { app, .. } => format!("Create app {app}"),
            Self::MigrateStack { app, stack } => format!("Migrate {app} to stack {stack}"),
            Self::SetConfig { app, vars } => {
                let keys: Vec<&str> = vars.keys().map(String::as_str).collect();
                format!("Set {} on {app}", keys.join(", "))
            }
            Self::UnsetConfig { app, key } => format!("Unset {key} on {app}"),
            Self::AddCollaborator { app, email } => format!("Add collaborator {email} to {app}"),
            Self::RemoveCollaborator { app, email } => {
                format!("Remove collaborator {email} from {app}")
            }
            Self::AddAddon { app, addon } => format!("Add add-on {addon} to {app}"),
            Self::RemoveAddon { app, addon } => format!("Remove add-on {addon} from {app}"),
            Self::AddDomain { app, domain } => format!("Add domain {domain} to {app}"),
            Self::RemoveDomain { app, domain } => format!("Remove domain {domain} from {app}"),
        }
    }

    fn command(&self) -> String {
        match self {
            Self::CreateApp { app, stack } => match stack {
                Some(stack) => format!("create {app} --stack {stack} --remote {app}"),
                None => format!("create {app} --remote {app}"),
            },
            Self::MigrateStack { app, stack } => format!("stack:migrate {stack} --app {app}"),
            Self::SetConfig { app, vars } => {
                let pairs: Vec<String> = vars
                    .iter()
                    .map(|(k, v)| format!("{k}={}", shell_quote(v)))
                    .collect();
                format!("config:set {} --app {app}", pairs.join(" "))
            }
            Self::UnsetConfig { app, key } => format!("config:unset {key} --app {app}"),
            Self::AddCollaborator { app, email } => format!("sharing:add {email} --app {app}"),
            Self::RemoveCollaborator { app, email } => {
                format!("sharing:remove {email} --app {app}")
            }
            Self::AddAddon { app, addon } => format!("addons:add {addon} --app {app}"),
            Self::RemoveAddon { app, addon } => format!("addons:remove {addon} --app {app}"),
            Self::AddDomain { app, domain } => format!("domains:add {domain} --app {app}"),
            Self::RemoveDomain { app, domain } => format!("domains:remove {domain} --app {app}"),
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::UnsetConfig { .. }
                | Self::RemoveCollaborator { .. }
                | Self::RemoveAddon { .. }
                | Self::RemoveDomain { .. }
        )
    }

    fn apply(&self, client: &Client, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let app = self.app();
        match self {
            Self::CreateApp { stack, .. } => {
                client.create_app(app, stack.as_deref())?;
                return Ok(ApplyResult::Created);
            }
            Self::MigrateStack { stack, .. } => client.migrate_stack(app, stack)?,
            Self::SetConfig { vars, .. } => client.set_config_vars(app, vars)?,
            Self::UnsetConfig { key, .. } => client.unset_config_var(app, key)?,
            Self::AddCollaborator { email, .. } => {
                client.add_collaborator(app, email)?;
                return Ok(ApplyResult::Created);
            }
            Self::RemoveCollaborator { email, .. } => client.remove_collaborator(app, email)?,
            Self::AddAddon { addon, .. } => {
                client
                    .add_addon(app, addon)
                    .with_context(|| format!("addon {addon} could not be provisioned"))?;
                return Ok(ApplyResult::Created);
            }
            Self::RemoveAddon { addon, .. } => client.remove_addon(app, addon)?,
            Self::AddDomain { domain, .. } => {
                client.add_domain(app, domain)?;
                return Ok(ApplyResult::Created);
            }
            Self::RemoveDomain { domain, .. } => client.remove_domain(app, domain)?,
        }

        Ok(ApplyResult::Modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::backend::{MockApp, MockBackend};

    fn client() -> (MockBackend, Client) {
        let mock = MockBackend::with_account("me@example.com");
        mock.add_app("shop", MockApp::default());
        let client = Client::with_backend(Box::new(mock.clone()));
        (mock, client)
    }

    #[test]
    fn test_commands_render_like_the_platform_cli() {
        let add = Mutation::AddAddon {
            app: "shop".into(),
            addon: "newrelic:bronze".into(),
        };
        assert_eq!(add.command(), "addons:add newrelic:bronze --app shop");
        assert!(!add.is_destructive());

        let remove = Mutation::RemoveDomain {
            app: "shop".into(),
            domain: "a.com".into(),
        };
        assert_eq!(remove.command(), "domains:remove a.com --app shop");
        assert!(remove.is_destructive());

        let create = Mutation::CreateApp {
            app: "shop".into(),
            stack: Some("cedar-14".into()),
        };
        assert_eq!(create.command(), "create shop --stack cedar-14 --remote shop");
    }

    #[test]
    fn test_config_values_are_shell_quoted() {
        let set = Mutation::SetConfig {
            app: "shop".into(),
            vars: ConfigVars::from([
                ("GREETING".to_string(), "it's here".to_string()),
                ("RACK_ENV".to_string(), "production".to_string()),
            ]),
        };
        assert_eq!(
            set.command(),
            r"config:set GREETING='it'\''s here' RACK_ENV='production' --app shop"
        );
    }

    #[test]
    fn test_apply_calls_client() {
        let (mock, client) = client();
        let ctx = ApplyContext::default();

        let result = Mutation::AddDomain {
            app: "shop".into(),
            domain: "shop.example.com".into(),
        }
        .apply(&client, &ctx)
        .unwrap();
        assert_eq!(result, ApplyResult::Created);

        let result = Mutation::MigrateStack {
            app: "shop".into(),
            stack: "cedar-14".into(),
        }
        .apply(&client, &ctx)
        .unwrap();
        assert_eq!(result, ApplyResult::Modified);

        assert_eq!(
            mock.calls(),
            vec![
                "add_domain shop shop.example.com".to_string(),
                "migrate_stack shop cedar-14".to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_dry_run_touches_nothing() {
        let (mock, client) = client();

        let result = Mutation::AddAddon {
            app: "shop".into(),
            addon: "newrelic:bronze".into(),
        }
        .apply(&client, &ApplyContext::new(true, false))
        .unwrap();

        assert!(matches!(result, ApplyResult::Skipped { .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_apply_failure_is_an_error() {
        let (mock, client) = client();
        mock.fail_on("add_addon");

        let err = Mutation::AddAddon {
            app: "shop".into(),
            addon: "newrelic:bronze".into(),
        }
        .apply(&client, &ApplyContext::default())
        .unwrap_err();

        assert!(format!("{err:#}").contains("could not be provisioned"));
    }
}
