//! Shared types, error model, and configuration for coursekit.
//!
//! This crate is the foundation depended on by all other coursekit crates.
//! It provides:
//! - [`CourseKitError`], the unified error type
//! - Domain types ([`LessonFile`], [`NavNode`], [`SideEffect`])
//! - Configuration ([`AppConfig`], [`PublisherEnv`], [`RemediationEnv`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_MENU_BASE_ID, NavigationConfig, PublisherEnv, PublisherSettings,
    RemediationEnv, RemediationSettings, builtin_week_labels, config_dir, config_file_path,
    init_config, load_config, load_config_from, parse_site_url,
};
pub use error::{CourseKitError, Result};
pub use types::{LessonFile, NavNode, SideEffect};
