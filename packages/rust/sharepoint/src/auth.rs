//! OAuth2 client-credentials token acquisition against the Microsoft identity platform.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use coursekit_shared::{CourseKitError, PublisherEnv, Result};

/// Scope for Microsoft Graph application permissions.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// A bearer token for one resource.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: u64,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Service credentials for the client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn from_env(env: &PublisherEnv) -> Self {
        Self {
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                env.login_base_url, env.tenant_id
            ),
            client_id: env.client_id.clone(),
            client_secret: env.client_secret.clone(),
        }
    }

    /// Exchange the credentials for a token valid for `scope`.
    #[instrument(skip(self, client))]
    pub async fn acquire(&self, client: &Client, scope: &str) -> Result<AccessToken> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", scope)
            .finish();

        let response = client
            .post(&self.token_url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| CourseKitError::Network(format!("token request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CourseKitError::Network(format!("failed to read token response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenError>(&text)
                .map(|e| format!("{}: {}", e.error, e.error_description))
                .unwrap_or(text);
            return Err(CourseKitError::config(format!(
                "token request rejected (HTTP {status}): {detail}"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| CourseKitError::parse(format!("invalid token response: {e}")))?;

        debug!(expires_in = parsed.expires_in, "access token acquired");

        Ok(AccessToken {
            token: parsed.access_token,
            expires_in: parsed.expires_in,
        })
    }
}

/// Scope for SharePoint REST calls against the site's host.
pub fn sharepoint_scope(site_url: &url::Url) -> String {
    let host = site_url.host_str().unwrap_or_default();
    match site_url.port() {
        Some(port) => format!("{}://{host}:{port}/.default", site_url.scheme()),
        None => format!("{}://{host}/.default", site_url.scheme()),
    }
}
