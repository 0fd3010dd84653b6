//! Lesson discovery and naming.
//!
//! A lesson is a Markdown file two levels below the lessons root, named
//! `week-<N>/day-<NN>.md`. Discovery scans the working tree on every run; the
//! filesystem is the only source of truth.

pub mod naming;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use coursekit_shared::LessonFile;

pub use naming::{humanize, humanize_filename, ordinal, page_name, week_number};

/// Directory prefix identifying a week group.
const WEEK_PREFIX: &str = "week-";

/// Filename prefix identifying a daily lesson.
const DAY_PREFIX: &str = "day-";

/// Find every lesson under `root`, sorted by week ordinal, then day ordinal.
///
/// Names without a number get ordinal `0` and therefore sort first. A missing
/// or empty root yields an empty list.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover_lessons(root: &Path) -> Vec<LessonFile> {
    let mut lessons: Vec<LessonFile> = WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?;
            let rel = rel.to_string_lossy().replace('\\', "/");
            if !is_lesson_path(&rel) {
                return None;
            }
            Some(load_lesson(root, &rel))
        })
        .collect();

    sort_lessons(&mut lessons);
    let lessons = drop_page_name_collisions(lessons);

    debug!(count = lessons.len(), "lessons discovered");
    lessons
}

/// Keep one lesson per derived page name.
///
/// `day-02.md`, `day--02.md` and `day-02.MD` all map to the same page; the
/// all-lowercase, shortest path of such a set is kept and the rest are
/// dropped with a warning. Order of the survivors is unchanged.
pub fn drop_page_name_collisions(lessons: Vec<LessonFile>) -> Vec<LessonFile> {
    let mut winners: HashMap<String, usize> = HashMap::new();

    for (i, lesson) in lessons.iter().enumerate() {
        match winners.entry(page_name(&lesson.path)) {
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
            Entry::Occupied(mut slot) => {
                let current = &lessons[*slot.get()];
                let (kept, dropped) = if preference(&lesson.path) < preference(&current.path) {
                    slot.insert(i);
                    (lesson, current)
                } else {
                    (current, lesson)
                };
                warn!(
                    page = %slot.key(),
                    kept = %kept.path,
                    dropped = %dropped.path,
                    "lessons map to the same page name"
                );
            }
        }
    }

    let keep: HashSet<usize> = winners.into_values().collect();
    lessons
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, lesson)| lesson)
        .collect()
}

fn preference(path: &str) -> (bool, usize, &str) {
    (path.bytes().any(|b| b.is_ascii_uppercase()), path.len(), path)
}

/// Whether a relative path follows the `week-*/day-*.md` convention.
pub fn is_lesson_path(rel: &str) -> bool {
    let rel = rel.trim_start_matches("./");
    let mut parts = rel.split(['/', '\\']);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(week), Some(file), None) => {
            week.starts_with(WEEK_PREFIX)
                && file.starts_with(DAY_PREFIX)
                && file.to_ascii_lowercase().ends_with(".md")
        }
        _ => false,
    }
}

/// Build a [`LessonFile`] for a relative path, reading its title from disk.
pub fn load_lesson(root: &Path, rel: &str) -> LessonFile {
    let rel = rel.trim_start_matches("./").replace('\\', "/");
    let (week, file) = rel.split_once('/').unwrap_or(("", rel.as_str()));

    LessonFile {
        week: week.to_string(),
        day: ordinal(file),
        title: lesson_title(root, &rel),
        path: rel.clone(),
    }
}

/// Title of the lesson at `root/rel`.
///
/// Falls back to a humanized filename when the file is not present in the
/// checkout or cannot be read.
pub fn lesson_title(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    match std::fs::read_to_string(&path) {
        Ok(text) => coursekit_markdown::extract_title(&text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "lesson not readable, deriving title from filename");
            humanize_filename(rel)
        }
    }
}

/// Sort by (week ordinal, day ordinal, path).
pub fn sort_lessons(lessons: &mut [LessonFile]) {
    lessons.sort_by(|a, b| {
        ordinal(&a.week)
            .cmp(&ordinal(&b.week))
            .then(a.day.cmp(&b.day))
            .then_with(|| a.path.cmp(&b.path))
    });
}
