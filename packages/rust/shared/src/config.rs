//! Application configuration for coursekit.
//!
//! Optional settings live in `coursekit.toml` (explicit path, then the working
//! directory, then `~/.coursekit/`). Credentials and target identifiers are
//! only ever read from the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CourseKitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursekit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursekit";

/// First synthetic key handed out to serialized menu nodes.
pub const DEFAULT_MENU_BASE_ID: u32 = 1000;

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

// ---------------------------------------------------------------------------
// Config structs (matching coursekit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Navigation labels and menu numbering.
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Publisher behaviour.
    #[serde(default)]
    pub publisher: PublisherSettings,

    /// Remediation handler behaviour.
    #[serde(default)]
    pub remediation: RemediationSettings,
}

/// `[navigation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Label of the first top-level entry.
    #[serde(default = "default_home_label")]
    pub home_label: String,

    /// Label of the second top-level entry.
    #[serde(default = "default_prerequisites_label")]
    pub prerequisites_label: String,

    /// Page name (without `.aspx`) the prerequisites entry links to.
    #[serde(default = "default_prerequisites_page")]
    pub prerequisites_page: String,

    /// Key assigned to the first serialized menu node.
    #[serde(default = "default_menu_base_id")]
    pub menu_base_id: u32,

    /// Week group key (`week-1`) → heading label.
    #[serde(default = "builtin_week_labels")]
    pub week_labels: BTreeMap<String, String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            home_label: default_home_label(),
            prerequisites_label: default_prerequisites_label(),
            prerequisites_page: default_prerequisites_page(),
            menu_base_id: default_menu_base_id(),
            week_labels: builtin_week_labels(),
        }
    }
}

impl NavigationConfig {
    /// Look up the configured heading label for a week group key.
    pub fn week_label(&self, week: &str) -> Option<&str> {
        self.week_labels.get(week).map(String::as_str)
    }

    /// Fill in built-in labels for any week the file did not override.
    pub fn merge_builtin_labels(&mut self) {
        for (week, label) in builtin_week_labels() {
            self.week_labels.entry(week).or_insert(label);
        }
    }
}

fn default_home_label() -> String {
    "🏠 Home".into()
}
fn default_prerequisites_label() -> String {
    "📋 Prerequisites".into()
}
fn default_prerequisites_page() -> String {
    "Prerequisites".into()
}
fn default_menu_base_id() -> u32 {
    DEFAULT_MENU_BASE_ID
}

/// The built-in week heading table. Labels carry no glyph; the navigation
/// builder adds it.
pub fn builtin_week_labels() -> BTreeMap<String, String> {
    [
        ("week-1", "Week 1: Foundations & Visibility"),
        ("week-2", "Week 2: Zero Trust Identity"),
        ("week-3", "Week 3: Network & Data Protection"),
        ("week-4", "Week 4: Detection & Response"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// `[publisher]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherSettings {
    /// Directory the lesson tree is discovered under.
    #[serde(default = "default_lessons_root")]
    pub lessons_root: String,

    /// Whether to rebuild site navigation after page upserts.
    #[serde(default = "default_true")]
    pub publish_navigation: bool,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            lessons_root: default_lessons_root(),
            publish_navigation: true,
        }
    }
}

fn default_lessons_root() -> String {
    ".".into()
}
fn default_true() -> bool {
    true
}

/// `[remediation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationSettings {
    /// Author recorded on Security Hub finding notes.
    #[serde(default = "default_updated_by")]
    pub updated_by: String,
}

impl Default for RemediationSettings {
    fn default() -> Self {
        Self {
            updated_by: default_updated_by(),
        }
    }
}

fn default_updated_by() -> String {
    "SOARRemediationLambda".into()
}

// ---------------------------------------------------------------------------
// Environment-sourced settings
// ---------------------------------------------------------------------------

/// Credentials and target site for the publisher, read from the environment.
#[derive(Clone)]
pub struct PublisherEnv {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Absolute site URL, e.g. `https://contoso.sharepoint.com/sites/training`.
    pub site_url: Url,
    /// Microsoft Graph root (overridable for mock servers).
    pub graph_base_url: String,
    /// Identity platform root (overridable for mock servers).
    pub login_base_url: String,
}

impl std::fmt::Debug for PublisherEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherEnv")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("site_url", &self.site_url.as_str())
            .field("graph_base_url", &self.graph_base_url)
            .field("login_base_url", &self.login_base_url)
            .finish()
    }
}

impl PublisherEnv {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        // `SHAREPOINT_*` wins; the `AZURE_*` names used by existing
        // workflows are accepted as aliases.
        let required = |name: &str, alias: Option<&str>| -> Result<String> {
            non_empty(name)
                .or_else(|| alias.and_then(|a| non_empty(a)))
                .ok_or_else(|| {
                    CourseKitError::config(format!(
                        "{name} is not set. Export it before running the publisher."
                    ))
                })
        };

        let tenant_id = required("SHAREPOINT_TENANT_ID", Some("AZURE_TENANT_ID"))?;
        let client_id = required("SHAREPOINT_CLIENT_ID", Some("AZURE_CLIENT_ID"))?;
        let client_secret = required("SHAREPOINT_CLIENT_SECRET", Some("AZURE_CLIENT_SECRET"))?;
        let site_url = parse_site_url(&required("SHAREPOINT_SITE_URL", None)?)?;

        let optional = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            site_url,
            graph_base_url: optional("GRAPH_BASE_URL", DEFAULT_GRAPH_BASE_URL),
            login_base_url: optional("LOGIN_BASE_URL", DEFAULT_LOGIN_BASE_URL),
        })
    }
}

/// Parse a site URL, requiring an http(s) scheme and a host.
pub fn parse_site_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| CourseKitError::config(format!("invalid site URL '{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(CourseKitError::config(format!(
            "invalid site URL '{raw}': expected an http(s) URL with a host"
        )));
    }

    Ok(url)
}

/// Notification target for the remediation handler.
#[derive(Debug, Clone, Default)]
pub struct RemediationEnv {
    /// SNS topic to notify after a mutation; `None` disables notifications.
    pub sns_topic_arn: Option<String>,
}

impl RemediationEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            sns_topic_arn: lookup("SNS_TOPIC_ARN").filter(|v| !v.trim().is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.coursekit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseKitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.coursekit/coursekit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve and load the application config.
///
/// An explicit path must exist. Otherwise `./coursekit.toml` is tried, then
/// the user config file; defaults are returned if neither exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    match config_file_path() {
        Ok(path) if path.exists() => load_config_from(&path),
        _ => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseKitError::io(path, e))?;

    let mut config: AppConfig = toml::from_str(&content).map_err(|e| {
        CourseKitError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.navigation.merge_builtin_labels();

    tracing::debug!(?path, "loaded config file");
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CourseKitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CourseKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseKitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SHAREPOINT_TENANT_ID", "tenant"),
            ("SHAREPOINT_CLIENT_ID", "client"),
            ("SHAREPOINT_CLIENT_SECRET", "secret"),
            ("SHAREPOINT_SITE_URL", "https://contoso.sharepoint.com/sites/training/"),
        ]
    }

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("menu_base_id = 1000"));
        assert!(toml_str.contains("week-1"));
    }

    #[test]
    fn file_labels_merge_over_builtin_table() {
        let tmp = std::env::temp_dir().join(format!("ck-config-{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(
            &tmp,
            r#"
[navigation]
home_label = "Start"

[navigation.week_labels]
week-2 = "Week Two"
week-9 = "Capstone"
"#,
        )
        .expect("write config");

        let config = load_config_from(&tmp).expect("load");
        let nav = &config.navigation;
        assert_eq!(nav.home_label, "Start");
        assert_eq!(nav.week_label("week-2"), Some("Week Two"));
        assert_eq!(nav.week_label("week-9"), Some("Capstone"));
        assert_eq!(nav.week_label("week-1"), Some("Week 1: Foundations & Visibility"));
        assert_eq!(nav.menu_base_id, DEFAULT_MENU_BASE_ID);

        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn publisher_env_loads_and_trims_site_url() {
        let env = PublisherEnv::from_lookup(lookup(&full_env())).expect("env");
        assert_eq!(env.site_url.as_str(), "https://contoso.sharepoint.com/sites/training");
        assert_eq!(env.graph_base_url, DEFAULT_GRAPH_BASE_URL);
        assert!(!format!("{env:?}").contains("secret\""));
    }

    #[test]
    fn publisher_env_missing_secret_is_fatal() {
        let vars: Vec<_> = full_env()
            .into_iter()
            .filter(|(k, _)| *k != "SHAREPOINT_CLIENT_SECRET")
            .collect();
        let err = PublisherEnv::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("SHAREPOINT_CLIENT_SECRET"));
    }

    #[test]
    fn azure_credential_names_are_accepted() {
        let vars = [
            ("AZURE_TENANT_ID", "tenant"),
            ("AZURE_CLIENT_ID", "client"),
            ("AZURE_CLIENT_SECRET", "secret"),
            ("SHAREPOINT_CLIENT_ID", "override"),
            ("SHAREPOINT_SITE_URL", "https://contoso.sharepoint.com/sites/training"),
        ];
        let env = PublisherEnv::from_lookup(lookup(&vars)).expect("env");
        assert_eq!(env.tenant_id, "tenant");
        assert_eq!(env.client_id, "override");
        assert_eq!(env.client_secret, "secret");
    }

    #[test]
    fn unparsable_site_url_is_fatal() {
        assert!(parse_site_url("not a url").is_err());
        assert!(parse_site_url("file:///tmp/site").is_err());
    }

    #[test]
    fn empty_topic_disables_notifications() {
        assert!(RemediationEnv::from_lookup(lookup(&[("SNS_TOPIC_ARN", "")])).sns_topic_arn.is_none());
        let env = RemediationEnv::from_lookup(lookup(&[("SNS_TOPIC_ARN", "arn:aws:sns:us-east-1:1:t")]));
        assert_eq!(env.sns_topic_arn.as_deref(), Some("arn:aws:sns:us-east-1:1:t"));
    }
}
