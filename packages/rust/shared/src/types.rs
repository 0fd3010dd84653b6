//! Core domain types shared by the publisher and the remediation handler.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LessonFile
// ---------------------------------------------------------------------------

/// One lesson discovered under the lessons root (`week-N/day-NN.md`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonFile {
    /// Path relative to the lessons root, `/`-separated (e.g. `week-1/day-02.md`).
    pub path: String,
    /// Group key taken from the parent directory (e.g. `week-1`).
    pub week: String,
    /// Day ordinal parsed from the filename; `0` when the name carries no number.
    pub day: u32,
    /// Title from the first H1, or a humanized filename.
    pub title: String,
}

// ---------------------------------------------------------------------------
// NavNode
// ---------------------------------------------------------------------------

/// A node in the site navigation tree.
///
/// Only two depths exist: top-level entries and, under week headings, one
/// leaf per lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    /// Label shown in the menu, possibly prefixed with a glyph.
    pub display_name: String,
    /// Absolute URL, or empty for non-clickable group headings.
    pub web_url: String,
    /// Ordered child entries (empty for leaves).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// A clickable entry without children.
    pub fn link(display_name: impl Into<String>, web_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            web_url: web_url.into(),
            children: Vec::new(),
        }
    }

    /// A grouping heading with no URL of its own.
    pub fn heading(display_name: impl Into<String>, children: Vec<NavNode>) -> Self {
        Self {
            display_name: display_name.into(),
            web_url: String::new(),
            children,
        }
    }

    /// Whether this node is a pure grouping label.
    pub fn is_heading(&self) -> bool {
        self.web_url.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SideEffect
// ---------------------------------------------------------------------------

/// Outcome of a best-effort action that never fails the primary one
/// (page publish, navigation replace, finding update, notification).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SideEffect {
    /// The action completed.
    Succeeded,
    /// The action was attempted and failed; the message was logged.
    Failed(String),
    /// The action was not attempted (not configured or not applicable).
    Skipped,
}

impl SideEffect {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<E: std::fmt::Display> From<std::result::Result<(), E>> for SideEffect {
    fn from(result: std::result::Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}
