//! End-to-end publish run: changed lessons → pages, then full navigation rebuild.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use coursekit_lessons::{discover_lessons, is_lesson_path, page_name};
use coursekit_markdown::RenderOptions;
use coursekit_shared::{CourseKitError, NavigationConfig, Result, SideEffect};
use coursekit_sharepoint::{PageContent, SiteApi};

use crate::menu::serialize_navigation;
use crate::navigation::build_navigation;
use crate::upsert::{UpsertAction, upsert_page};

/// Configuration for a publish run.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Directory lessons are read and discovered from.
    pub lessons_root: PathBuf,
    /// Prefix stripped from changed paths to make them root-relative (e.g. `content`).
    pub changed_prefix: Option<String>,
    /// Site the pages live on; used for navigation URLs.
    pub site_url: Url,
    /// Labels and numbering of the navigation menu.
    pub navigation: NavigationConfig,
    /// Whether to rebuild navigation after the page upserts.
    pub publish_navigation: bool,
    /// Markdown rendering options.
    pub render: RenderOptions,
}

/// A lesson that was upserted.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedLesson {
    pub path: String,
    pub page_name: String,
    pub page_id: String,
    pub action: UpsertAction,
    pub publish: SideEffect,
}

/// A lesson whose upsert failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedLesson {
    pub path: String,
    pub error: String,
}

/// Summary of a publish run.
#[derive(Debug, Serialize)]
pub struct PublishReport {
    pub published: Vec<PublishedLesson>,
    pub failed: Vec<FailedLesson>,
    /// Changed paths that were not lessons or not present in the checkout.
    pub skipped: Vec<String>,
    pub navigation: SideEffect,
    #[serde(skip)]
    pub elapsed: std::time::Duration,
}

impl PublishReport {
    pub fn succeeded(&self) -> usize {
        self.published.len()
    }

    /// Whether any page failed; this alone decides the exit status.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each lesson is attempted.
    fn lesson_done(&self, path: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &PublishReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn lesson_done(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &PublishReport) {}
}

/// Read a newline-separated changed-files list.
pub fn read_changed_files(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseKitError::io(path, e))?;
    Ok(parse_changed_files(&content))
}

/// Split a changed-files list into trimmed, de-duplicated, non-empty entries.
pub fn parse_changed_files(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

/// Run the publish pipeline.
///
/// 1. Upsert + publish every changed lesson (failures are per lesson)
/// 2. Discover all lessons
/// 3. Build and serialize navigation
/// 4. Replace site navigation (best-effort, only when a lesson changed)
#[instrument(skip_all, fields(changed = changed.len()))]
pub async fn publish(
    config: &PublishConfig,
    api: &dyn SiteApi,
    changed: &[String],
    progress: &dyn ProgressReporter,
) -> PublishReport {
    let start = Instant::now();
    let mut published = Vec::new();
    let mut failed = Vec::new();
    let mut skipped = Vec::new();

    // --- Phase 1: Pages ---
    progress.phase("Publishing lessons");
    let mut lessons = Vec::new();
    for path in changed {
        match lesson_relative_path(path, config.changed_prefix.as_deref()) {
            Some(rel) => lessons.push(rel),
            None => {
                debug!(path = %path, "not a lesson file, skipping");
                skipped.push(path.clone());
            }
        }
    }

    let total = lessons.len();
    let mut claimed: HashMap<String, String> = HashMap::new();
    for (i, rel) in lessons.iter().enumerate() {
        if let Some(owner) = claimed.get(&page_name(rel)) {
            warn!(path = %rel, owner = %owner, "page name already written this run");
            failed.push(FailedLesson {
                path: rel.clone(),
                error: format!("page name collides with {owner}"),
            });
            progress.lesson_done(rel, i + 1, total);
            continue;
        }

        let source = config.lessons_root.join(rel);
        match std::fs::read_to_string(&source) {
            Ok(markdown) => match publish_lesson(api, rel, &markdown, &config.render).await {
                Ok(lesson) => {
                    claimed.insert(lesson.page_name.clone(), rel.clone());
                    published.push(lesson);
                }
                Err(e) => {
                    warn!(path = %rel, error = %e, "failed to publish lesson");
                    failed.push(FailedLesson {
                        path: rel.clone(),
                        error: e.to_string(),
                    });
                }
            },
            Err(e) => {
                warn!(path = %source.display(), error = %e, "lesson not found in checkout");
                failed.push(FailedLesson {
                    path: rel.clone(),
                    error: "not found in checkout".into(),
                });
            }
        }
        progress.lesson_done(rel, i + 1, total);
    }

    // --- Phase 2: Navigation ---
    let navigation = if config.publish_navigation && total > 0 {
        progress.phase("Rebuilding navigation");
        rebuild_navigation(config, api).await
    } else {
        SideEffect::Skipped
    };

    let report = PublishReport {
        published,
        failed,
        skipped,
        navigation,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        succeeded = report.succeeded(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "publish run complete"
    );

    report
}

async fn publish_lesson(
    api: &dyn SiteApi,
    rel: &str,
    markdown: &str,
    render: &RenderOptions,
) -> Result<PublishedLesson> {
    let rendered = coursekit_markdown::render(markdown, render);
    let content = PageContent {
        name: page_name(rel),
        title: rendered.title,
        html: rendered.html,
    };

    let outcome = upsert_page(api, &content).await?;

    Ok(PublishedLesson {
        path: rel.to_string(),
        page_name: content.name,
        page_id: outcome.page_id,
        action: outcome.action,
        publish: outcome.publish,
    })
}

/// Rebuild navigation from the full lesson set; failures are logged only.
pub async fn rebuild_navigation(config: &PublishConfig, api: &dyn SiteApi) -> SideEffect {
    let lessons = discover_lessons(&config.lessons_root);
    let tree = build_navigation(&lessons, &config.site_url, &config.navigation);
    let nodes = match serialize_navigation(&tree, config.navigation.menu_base_id) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(error = %e, "navigation not serialized; pages are still published");
            return SideEffect::Failed(e.to_string());
        }
    };

    match api.replace_navigation(&nodes).await {
        Ok(()) => {
            info!(lessons = lessons.len(), nodes = nodes.len(), "navigation updated");
            SideEffect::Succeeded
        }
        Err(e) => {
            warn!(error = %e, "navigation update failed; pages are still published");
            SideEffect::Failed(e.to_string())
        }
    }
}

/// The lesson files among `changed`, relative to the lessons root.
///
/// An empty result means there is nothing to publish and no reason to
/// contact the site at all.
pub fn changed_lessons(changed: &[String], prefix: Option<&str>) -> Vec<String> {
    changed
        .iter()
        .filter_map(|path| lesson_relative_path(path, prefix))
        .collect()
}

/// Map a changed path to a lessons-root-relative lesson path, if it is one.
fn lesson_relative_path(changed: &str, prefix: Option<&str>) -> Option<String> {
    let mut rel = changed.trim().trim_start_matches("./").replace('\\', "/");

    if let Some(prefix) = prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty() && *p != ".") {
        rel = rel.strip_prefix(&format!("{prefix}/"))?.to_string();
    }

    is_lesson_path(&rel).then_some(rel)
}
