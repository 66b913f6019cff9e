//! Platform REST API backend.
//!
//! This module provides the [`HttpBackend`] implementation that talks to
//! the platform's JSON API over blocking HTTP.
//!
//! Status codes are not turned into transport errors by the agent: every
//! non-2xx response is read so the platform's own error message reaches
//! [`Error::RemoteOperation`].

use crate::backend::Backend;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::types::{Account, AppInfo, ConfigVars};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use ureq::Body;
use ureq::http::Response;

/// Media type selecting version 3 of the API.
const ACCEPT: &str = "application/vnd.heroku+json; version=3";

/// User agent sent with every request.
const USER_AGENT: &str = concat!("deckhand/", env!("CARGO_PKG_VERSION"));

/// Domain kind the platform assigns to its own default hostname.
const PLATFORM_DOMAIN_KIND: &str = "heroku";

/// Platform REST API backend.
///
/// # Example
///
/// ```no_run
/// use platform::backend::Backend;
/// use platform::backend::http::HttpBackend;
/// use platform::Credentials;
///
/// let creds = Credentials::new("me@example.com", "api-key");
/// let backend = HttpBackend::new("https://api.heroku.com", &creds);
/// let apps = backend.list_apps().unwrap();
/// println!("Found {} apps", apps.len());
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, without trailing slash.
    api_base: String,
    /// Precomputed `Authorization` header.
    authorization: String,
}

impl HttpBackend {
    /// Create a backend for the given API and credentials.
    #[must_use]
    pub fn new(api_base: impl Into<String>, credentials: &Credentials) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        let api_base = api_base.into().trim_end_matches('/').to_string();

        Self {
            agent,
            api_base,
            authorization: credentials.basic_auth(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn get<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T> {
        log::debug!("GET {path}");
        let response = self
            .agent
            .get(&self.url(path))
            .header("Accept", ACCEPT)
            .header("Authorization", &self.authorization)
            .header("User-Agent", USER_AGENT)
            .call()?;
        read_json(operation, response)
    }

    fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        log::debug!("POST {path}");
        let response = self
            .agent
            .post(&self.url(path))
            .header("Accept", ACCEPT)
            .header("Authorization", &self.authorization)
            .header("User-Agent", USER_AGENT)
            .send_json(body)?;
        read_json(operation, response)
    }

    fn patch(&self, operation: &str, path: &str, body: &serde_json::Value) -> Result<()> {
        log::debug!("PATCH {path}");
        let response = self
            .agent
            .patch(&self.url(path))
            .header("Accept", ACCEPT)
            .header("Authorization", &self.authorization)
            .header("User-Agent", USER_AGENT)
            .send_json(body)?;
        check_status(operation, response).map(drop)
    }

    fn delete(&self, operation: &str, path: &str) -> Result<()> {
        log::debug!("DELETE {path}");
        let response = self
            .agent
            .delete(&self.url(path))
            .header("Accept", ACCEPT)
            .header("Authorization", &self.authorization)
            .header("User-Agent", USER_AGENT)
            .call()?;
        check_status(operation, response).map(drop)
    }

    fn app(&self, app: &str) -> Result<ApiApp> {
        self.get("app_info", &format!("/apps/{app}"))
    }

    fn addon_records(&self, app: &str) -> Result<Vec<ApiAddon>> {
        self.get("addons", &format!("/apps/{app}/addons"))
    }
}

/// Turn a non-2xx response into a remote operation error.
fn check_status(operation: &str, mut response: Response<Body>) -> Result<Response<Body>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(Error::remote(operation, Some(status.as_u16()), &body))
}

fn read_json<T: DeserializeOwned>(operation: &str, response: Response<Body>) -> Result<T> {
    let mut response = check_status(operation, response)?;
    let text = response.body_mut().read_to_string()?;
    Ok(serde_json::from_str(&text)?)
}

impl Backend for HttpBackend {
    fn account(&self) -> Result<Account> {
        let account: ApiUser = self.get("account", "/account")?;
        Ok(Account {
            email: account.email,
        })
    }

    fn list_apps(&self) -> Result<Vec<String>> {
        let apps: Vec<ApiApp> = self.get("list_apps", "/apps")?;
        Ok(apps.into_iter().map(|a| a.name).collect())
    }

    fn app_info(&self, app: &str) -> Result<AppInfo> {
        let record = self.app(app)?;
        let collaborators: Vec<ApiCollaborator> =
            self.get("app_info", &format!("/apps/{app}/collaborators"))?;

        let mut info = AppInfo::from(record);
        info.collaborators = collaborators.into_iter().map(|c| c.user.email).collect();
        Ok(info)
    }

    fn config_vars(&self, app: &str) -> Result<ConfigVars> {
        let vars: std::collections::BTreeMap<String, Option<String>> =
            self.get("config_vars", &format!("/apps/{app}/config-vars"))?;
        Ok(vars
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }

    fn addons(&self, app: &str) -> Result<Vec<String>> {
        Ok(self
            .addon_records(app)?
            .into_iter()
            .map(|a| a.plan.name)
            .collect())
    }

    fn domains(&self, app: &str) -> Result<Vec<String>> {
        let domains: Vec<ApiDomain> = self.get("domains", &format!("/apps/{app}/domains"))?;
        Ok(domains
            .into_iter()
            .filter(|d| d.kind != PLATFORM_DOMAIN_KIND)
            .map(|d| d.hostname)
            .collect())
    }

    fn create_app(&self, app: &str, stack: Option<&str>) -> Result<()> {
        let body = match stack {
            Some(stack) => json!({ "name": app, "stack": stack }),
            None => json!({ "name": app }),
        };
        let _: ApiApp = self.post("create_app", "/apps", &body)?;
        Ok(())
    }

    fn migrate_stack(&self, app: &str, stack: &str) -> Result<()> {
        self.patch(
            "migrate_stack",
            &format!("/apps/{app}"),
            &json!({ "build_stack": stack }),
        )
    }

    fn set_config_vars(&self, app: &str, vars: &ConfigVars) -> Result<()> {
        self.patch(
            "set_config_vars",
            &format!("/apps/{app}/config-vars"),
            &serde_json::to_value(vars)?,
        )
    }

    fn unset_config_var(&self, app: &str, key: &str) -> Result<()> {
        self.patch(
            "unset_config_var",
            &format!("/apps/{app}/config-vars"),
            &json!({ key: null }),
        )
    }

    fn add_addon(&self, app: &str, addon: &str) -> Result<()> {
        let _: ApiAddon = self.post(
            "add_addon",
            &format!("/apps/{app}/addons"),
            &json!({ "plan": addon }),
        )?;
        Ok(())
    }

    fn remove_addon(&self, app: &str, addon: &str) -> Result<()> {
        let record = self
            .addon_records(app)?
            .into_iter()
            .find(|a| a.plan.name == addon || a.name == addon)
            .ok_or_else(|| {
                Error::remote("remove_addon", Some(404), &format!("{addon} is not installed"))
            })?;
        self.delete("remove_addon", &format!("/apps/{app}/addons/{}", record.id))
    }

    fn add_domain(&self, app: &str, domain: &str) -> Result<()> {
        let _: ApiDomain = self.post(
            "add_domain",
            &format!("/apps/{app}/domains"),
            &json!({ "hostname": domain }),
        )?;
        Ok(())
    }

    fn remove_domain(&self, app: &str, domain: &str) -> Result<()> {
        self.delete("remove_domain", &format!("/apps/{app}/domains/{domain}"))
    }

    fn add_collaborator(&self, app: &str, email: &str) -> Result<()> {
        let _: ApiCollaborator = self.post(
            "add_collaborator",
            &format!("/apps/{app}/collaborators"),
            &json!({ "user": email, "silent": false }),
        )?;
        Ok(())
    }

    fn remove_collaborator(&self, app: &str, email: &str) -> Result<()> {
        self.delete(
            "remove_collaborator",
            &format!("/apps/{app}/collaborators/{email}"),
        )
    }

    fn restart(&self, app: &str) -> Result<()> {
        self.delete("restart", &format!("/apps/{app}/dynos"))
    }

    fn logs(&self, app: &str, lines: u32) -> Result<String> {
        let session: ApiLogSession = self.post(
            "logs",
            &format!("/apps/{app}/log-sessions"),
            &json!({ "lines": lines, "tail": false }),
        )?;

        let response = self
            .agent
            .get(&session.logplex_url)
            .header("User-Agent", USER_AGENT)
            .call()?;
        let mut response = check_status("logs", response)?;
        Ok(response.body_mut().read_to_string()?)
    }
}

// =============================================================================
// API response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ApiApp {
    name: String,
    #[serde(default)]
    stack: Option<Named>,
    #[serde(default)]
    build_stack: Option<Named>,
    #[serde(default)]
    owner: Option<ApiUser>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    git_url: Option<String>,
    #[serde(default)]
    region: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct ApiCollaborator {
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
struct ApiAddon {
    id: String,
    name: String,
    plan: Named,
}

#[derive(Debug, Deserialize)]
struct ApiDomain {
    hostname: String,
    #[serde(default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ApiLogSession {
    logplex_url: String,
}

impl From<ApiApp> for AppInfo {
    fn from(a: ApiApp) -> Self {
        // A pending migration shows up as build_stack before the next build.
        let stack = a.build_stack.or(a.stack).map(|s| s.name);

        Self {
            name: a.name,
            stack,
            owner: a.owner.map(|o| o.email),
            collaborators: Vec::new(),
            web_url: a.web_url,
            git_url: a.git_url,
            region: a.region.map(|r| r.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:5000/", &Credentials::new("a", "b"));
        assert_eq!(backend.api_base(), "http://localhost:5000");
        assert_eq!(backend.url("/apps"), "http://localhost:5000/apps");
    }

    #[test]
    fn test_app_record_prefers_build_stack() {
        let record: ApiApp = serde_json::from_str(
            r#"{
                "name": "demo",
                "stack": {"name": "heroku-20"},
                "build_stack": {"name": "heroku-22"},
                "owner": {"email": "owner@example.com"},
                "web_url": "https://demo.example.com/",
                "region": {"name": "eu"}
            }"#,
        )
        .unwrap();

        let info = AppInfo::from(record);
        assert_eq!(info.stack.as_deref(), Some("heroku-22"));
        assert_eq!(info.owner.as_deref(), Some("owner@example.com"));
        assert_eq!(info.region.as_deref(), Some("eu"));
        assert!(info.git_url.is_none());
    }

    #[test]
    fn test_domain_record_kind_defaults_empty() {
        let domain: ApiDomain = serde_json::from_str(r#"{"hostname": "www.example.com"}"#).unwrap();
        assert_eq!(domain.hostname, "www.example.com");
        assert_ne!(domain.kind, PLATFORM_DOMAIN_KIND);
    }
}
