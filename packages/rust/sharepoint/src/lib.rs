//! SharePoint site access for the lesson publisher.
//!
//! [`SiteApi`] is the seam the publish pipeline talks to; [`SharePointClient`]
//! implements it over Microsoft Graph (pages) and the SharePoint REST API
//! (navigation).

pub mod auth;
mod client;
pub mod navigation;

use serde::{Deserialize, Serialize};

use coursekit_shared::Result;

pub use auth::{AccessToken, ClientCredentials};
pub use client::{SharePointClient, page_file_name, page_url};
pub use navigation::{MenuNode, MenuState, SaveMenuStateRequest};

/// A page as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: String,
    /// File name, e.g. `Week-1-Day-02.aspx`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PageSummary {
    /// Whether this page is the one identified by `page_name` (with or without `.aspx`).
    pub fn matches_name(&self, page_name: &str) -> bool {
        self.name.eq_ignore_ascii_case(&page_file_name(page_name))
    }
}

/// Content written to a page on create or update.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Stable page name without extension (`Week-1-Day-02`).
    pub name: String,
    pub title: String,
    pub html: String,
}

/// Operations the publisher needs from the hosting site.
#[async_trait::async_trait]
pub trait SiteApi: Send + Sync {
    /// Full page listing (all result pages).
    async fn list_pages(&self) -> Result<Vec<PageSummary>>;

    /// Create a new page in draft state.
    async fn create_page(&self, page: &PageContent) -> Result<PageSummary>;

    /// Overwrite title and content of an existing page.
    async fn update_page(&self, id: &str, page: &PageContent) -> Result<()>;

    /// Make the current version of a page visible.
    async fn publish_page(&self, id: &str) -> Result<()>;

    /// Replace the whole site navigation with `nodes`.
    async fn replace_navigation(&self, nodes: &[MenuNode]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_name_ignores_extension_and_case() {
        let page = PageSummary {
            id: "1".into(),
            name: "Week-1-Day-02.aspx".into(),
            title: None,
        };
        assert!(page.matches_name("Week-1-Day-02"));
        assert!(page.matches_name("week-1-day-02.aspx"));
        assert!(!page.matches_name("Week-1-Day-03"));
    }
}
