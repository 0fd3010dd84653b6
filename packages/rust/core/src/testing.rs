//! In-memory [`SiteApi`] used by the pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;

use coursekit_shared::{CourseKitError, Result};
use coursekit_sharepoint::{MenuNode, PageContent, PageSummary, SiteApi, page_file_name};

#[derive(Default)]
struct State {
    pages: Vec<(PageSummary, PageContent)>,
    updated: Vec<String>,
    published: Vec<String>,
    navigation: Option<Vec<MenuNode>>,
    next_id: u32,
}

#[derive(Default)]
pub(crate) struct FakeSite {
    state: Mutex<State>,
    fail_create: HashSet<String>,
    fail_publish: bool,
    fail_navigation: bool,
}

impl FakeSite {
    pub fn failing_create(mut self, name: &str) -> Self {
        self.fail_create.insert(name.to_string());
        self
    }

    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn page_names(&self) -> Vec<String> {
        self.lock().pages.iter().map(|(s, _)| s.name.clone()).collect()
    }

    pub fn page_html(&self, name: &str) -> Option<String> {
        self.lock()
            .pages
            .iter()
            .find(|(s, _)| s.matches_name(name))
            .map(|(_, c)| c.html.clone())
    }

    pub fn updated(&self) -> Vec<String> {
        self.lock().updated.clone()
    }

    pub fn published(&self) -> Vec<String> {
        self.lock().published.clone()
    }

    pub fn navigation(&self) -> Option<Vec<MenuNode>> {
        self.lock().navigation.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake site lock")
    }
}

#[async_trait::async_trait]
impl SiteApi for FakeSite {
    async fn list_pages(&self) -> Result<Vec<PageSummary>> {
        Ok(self.lock().pages.iter().map(|(s, _)| s.clone()).collect())
    }

    async fn create_page(&self, page: &PageContent) -> Result<PageSummary> {
        if self.fail_create.contains(&page.name) {
            return Err(CourseKitError::api(400, "invalidRequest"));
        }
        let mut state = self.lock();
        state.next_id += 1;
        let summary = PageSummary {
            id: format!("page-{}", state.next_id),
            name: page_file_name(&page.name),
            title: Some(page.title.clone()),
        };
        state.pages.push((summary.clone(), page.clone()));
        Ok(summary)
    }

    async fn update_page(&self, id: &str, page: &PageContent) -> Result<()> {
        let mut state = self.lock();
        let entry = state
            .pages
            .iter_mut()
            .find(|(s, _)| s.id == id)
            .ok_or_else(|| CourseKitError::api(404, "itemNotFound"))?;
        entry.1 = page.clone();
        state.updated.push(id.to_string());
        Ok(())
    }

    async fn publish_page(&self, id: &str) -> Result<()> {
        if self.fail_publish {
            return Err(CourseKitError::api(423, "locked"));
        }
        self.lock().published.push(id.to_string());
        Ok(())
    }

    async fn replace_navigation(&self, nodes: &[MenuNode]) -> Result<()> {
        if self.fail_navigation {
            return Err(CourseKitError::api(403, "accessDenied"));
        }
        self.lock().navigation = Some(nodes.to_vec());
        Ok(())
    }
}
