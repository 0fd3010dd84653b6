//! Create-or-update of a single remote page, followed by publish.

use serde::Serialize;
use tracing::{info, instrument, warn};

use coursekit_shared::{Result, SideEffect};
use coursekit_sharepoint::{PageContent, SiteApi};

/// Which mutation the upsert performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub page_id: String,
    pub action: UpsertAction,
    /// Publish is best-effort: a failure here leaves the upsert successful.
    pub publish: SideEffect,
}

/// Upsert `page` by name, then publish it.
///
/// The page is looked up by scanning the full listing. Errors from listing,
/// creating or updating are returned; a publish error is logged and recorded
/// in [`UpsertOutcome::publish`].
#[instrument(skip_all, fields(name = %page.name))]
pub async fn upsert_page(api: &dyn SiteApi, page: &PageContent) -> Result<UpsertOutcome> {
    let existing = api
        .list_pages()
        .await?
        .into_iter()
        .find(|p| p.matches_name(&page.name));

    let (page_id, action) = match existing {
        Some(found) => {
            api.update_page(&found.id, page).await?;
            (found.id, UpsertAction::Updated)
        }
        None => {
            let created = api.create_page(page).await?;
            (created.id, UpsertAction::Created)
        }
    };

    let publish = SideEffect::from(api.publish_page(&page_id).await);
    if let SideEffect::Failed(reason) = &publish {
        warn!(page_id = %page_id, error = %reason, "page saved but publish failed");
    }

    info!(page_id = %page_id, ?action, "page upserted");

    Ok(UpsertOutcome {
        page_id,
        action,
        publish,
    })
}
