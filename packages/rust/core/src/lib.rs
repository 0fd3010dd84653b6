//! Publish pipeline and navigation logic for coursekit.
//!
//! This crate ties together lesson discovery, Markdown rendering, and the
//! SharePoint client into the end-to-end `publish` run.

pub mod menu;
pub mod navigation;
pub mod pipeline;
pub mod upsert;

#[cfg(test)]
mod testing;
