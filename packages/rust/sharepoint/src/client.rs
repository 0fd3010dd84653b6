//! Microsoft Graph site-page client plus the SharePoint REST navigation call.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};
use url::Url;

use coursekit_shared::{CourseKitError, PublisherEnv, Result};

use crate::auth::{ClientCredentials, GRAPH_SCOPE, sharepoint_scope};
use crate::navigation::{MenuNode, MenuState, SaveMenuStateRequest};
use crate::{PageContent, PageSummary, SiteApi};

/// User-Agent string for all outbound requests.
const USER_AGENT: &str = concat!("coursekit/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Deserialize)]
struct SiteResponse {
    id: String,
}

#[derive(Deserialize)]
struct PageListResponse {
    #[serde(default)]
    value: Vec<PageSummary>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Authenticated client bound to one SharePoint site.
pub struct SharePointClient {
    http: Client,
    credentials: ClientCredentials,
    graph_token: String,
    graph_base_url: String,
    site_url: Url,
    site_id: String,
}

impl SharePointClient {
    /// Authenticate and resolve the Graph site id for `env.site_url`.
    #[instrument(skip_all, fields(site = %env.site_url))]
    pub async fn connect(env: &PublisherEnv) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CourseKitError::Network(format!("failed to build HTTP client: {e}")))?;

        let credentials = ClientCredentials::from_env(env);
        let graph_token = credentials.acquire(&http, GRAPH_SCOPE).await?.token;

        let mut client = Self {
            http,
            credentials,
            graph_token,
            graph_base_url: env.graph_base_url.clone(),
            site_url: env.site_url.clone(),
            site_id: String::new(),
        };
        client.site_id = client.resolve_site_id().await?;

        info!(site_id = %client.site_id, "connected to site");
        Ok(client)
    }

    /// Graph id of the bound site.
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Absolute URL a published page is served from.
    pub fn page_url(&self, name: &str) -> String {
        page_url(&self.site_url, name)
    }

    async fn resolve_site_id(&self) -> Result<String> {
        let host = self
            .site_url
            .host_str()
            .ok_or_else(|| CourseKitError::config(format!("site URL has no host: {}", self.site_url)))?;
        let site_path = self.site_url.path().trim_end_matches('/');

        let url = if site_path.is_empty() {
            format!("{}/sites/{host}", self.graph_base_url)
        } else {
            format!("{}/sites/{host}:{site_path}", self.graph_base_url)
        };

        let response = self.graph_get(&url).await?;
        let site: SiteResponse = parse_json(response).await?;
        Ok(site.id)
    }

    fn pages_url(&self) -> String {
        format!("{}/sites/{}/pages", self.graph_base_url, self.site_id)
    }

    async fn graph_get(&self, url: &str) -> Result<Response> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.graph_token)
            .send()
            .await
            .map_err(|e| CourseKitError::Network(format!("{url}: {e}")))?;
        ensure_success(response).await
    }

    async fn graph_send(&self, method: reqwest::Method, url: &str, body: Option<&Value>) -> Result<Response> {
        let mut request = self.http.request(method, url).bearer_auth(&self.graph_token);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_LENGTH, "0"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| CourseKitError::Network(format!("{url}: {e}")))?;
        ensure_success(response).await
    }
}

#[async_trait::async_trait]
impl SiteApi for SharePointClient {
    #[instrument(skip(self))]
    async fn list_pages(&self) -> Result<Vec<PageSummary>> {
        let mut pages = Vec::new();
        let mut next = Some(format!(
            "{}/microsoft.graph.sitePage?$select=id,name,title",
            self.pages_url()
        ));

        while let Some(url) = next {
            let response = self.graph_get(&url).await?;
            let batch: PageListResponse = parse_json(response).await?;
            pages.extend(batch.value);
            next = batch.next_link;
        }

        debug!(count = pages.len(), "listed site pages");
        Ok(pages)
    }

    #[instrument(skip(self, page), fields(name = %page.name))]
    async fn create_page(&self, page: &PageContent) -> Result<PageSummary> {
        let body = json!({
            "@odata.type": "#microsoft.graph.sitePage",
            "name": page_file_name(&page.name),
            "title": page.title,
            "pageLayout": "article",
            "showComments": false,
            "canvasLayout": canvas_layout(&page.html),
        });

        let response = self
            .graph_send(reqwest::Method::POST, &self.pages_url(), Some(&body))
            .await?;
        parse_json(response).await
    }

    #[instrument(skip(self, page), fields(name = %page.name))]
    async fn update_page(&self, id: &str, page: &PageContent) -> Result<()> {
        let url = format!("{}/{id}/microsoft.graph.sitePage", self.pages_url());
        let body = json!({
            "@odata.type": "#microsoft.graph.sitePage",
            "title": page.title,
            "canvasLayout": canvas_layout(&page.html),
        });

        self.graph_send(reqwest::Method::PATCH, &url, Some(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn publish_page(&self, id: &str) -> Result<()> {
        let url = format!("{}/{id}/microsoft.graph.sitePage/publish", self.pages_url());
        self.graph_send(reqwest::Method::POST, &url, None).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(top_level = nodes.len()))]
    async fn replace_navigation(&self, nodes: &[MenuNode]) -> Result<()> {
        let token = self
            .credentials
            .acquire(&self.http, &sharepoint_scope(&self.site_url))
            .await?;

        let site = self.site_url.as_str().trim_end_matches('/');
        let url = format!("{site}/_api/navigation/SaveMenuState");
        let body = SaveMenuStateRequest {
            menu_state: MenuState::for_site(self.site_url.path().trim_end_matches('/'), nodes.to_vec()),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.token)
            .header(reqwest::header::ACCEPT, "application/json;odata=nometadata")
            .json(&body)
            .send()
            .await
            .map_err(|e| CourseKitError::Network(format!("{url}: {e}")))?;
        ensure_success(response).await?;

        info!("navigation replaced");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Site page file name for a page name (`Week-1-Day-02` → `Week-1-Day-02.aspx`).
pub fn page_file_name(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".aspx") {
        name.to_string()
    } else {
        format!("{name}.aspx")
    }
}

/// Absolute URL of a page under `site_url`.
pub fn page_url(site_url: &Url, name: &str) -> String {
    format!(
        "{}/SitePages/{}",
        site_url.as_str().trim_end_matches('/'),
        page_file_name(name)
    )
}

/// One full-width section holding a single text web part.
fn canvas_layout(html: &str) -> Value {
    json!({
        "horizontalSections": [{
            "layout": "oneColumn",
            "id": "1",
            "emphasis": "none",
            "columns": [{
                "id": "1",
                "width": 12,
                "webparts": [{
                    "@odata.type": "#microsoft.graph.textWebPart",
                    "innerHtml": html,
                }],
            }],
        }],
    })
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CourseKitError::api(status.as_u16(), truncate(&body, 500)))
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let url = response.url().to_string();
    response
        .json::<T>()
        .await
        .map_err(|e| CourseKitError::parse(format!("{url}: unexpected response body: {e}")))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
