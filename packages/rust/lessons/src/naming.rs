//! Naming rules for lesson files: ordinals, page names, readable titles.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a week group key such as `week-3`.
static WEEK_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^week-(\d+)$").expect("week key regex"));

/// First run of digits in a name.
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("digits regex"));

/// Parse the number out of a well-formed week key (`week-12` → `12`).
///
/// Returns `None` for keys that don't follow the `week-N` shape.
pub fn week_number(key: &str) -> Option<u32> {
    WEEK_KEY_RE
        .captures(key)
        .and_then(|c| c[1].parse().ok())
}

/// Lenient ordinal: the first number found in `name`, or `0`.
pub fn ordinal(name: &str) -> u32 {
    DIGITS_RE
        .captures(name)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

/// Derive the remote page name for a lesson path.
///
/// `week-1/day-02.md` → `Week-1-Day-02`. Every hyphen- or space-separated
/// word is capitalized, spaces become hyphens, and any character outside
/// `[A-Za-z0-9_-]` is replaced with `-`. Only the last directory is used as
/// the group.
pub fn page_name(path: &str) -> String {
    let (group, file) = split_lesson_path(path);
    let base = strip_extension(file);

    match group {
        Some(group) => format!("{}-{}", url_safe_title(group), url_safe_title(base)),
        None => url_safe_title(base),
    }
}

/// Readable title from a filename: `day-02.md` → `Day 02`.
pub fn humanize_filename(path: &str) -> String {
    let (_, file) = split_lesson_path(path);
    humanize(strip_extension(file))
}

/// Readable label from a key: `week-10` → `Week 10`, `bonus_labs` → `Bonus Labs`.
pub fn humanize(key: &str) -> String {
    key.replace(['-', '_'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn split_lesson_path(path: &str) -> (Option<&str>, &str) {
    let trimmed = path.trim_matches(|c| c == '/' || c == '\\');
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => {
            let dir = &trimmed[..idx];
            let group = dir.rsplit(['/', '\\']).next().filter(|g| !g.is_empty());
            (group, &trimmed[idx + 1..])
        }
        None => (None, trimmed),
    }
}

fn strip_extension(file: &str) -> &str {
    match file.rfind('.') {
        Some(idx) if idx > 0 => &file[..idx],
        _ => file,
    }
}

fn url_safe_title(segment: &str) -> String {
    segment
        .trim()
        .split(['-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            capitalize(w)
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => {
            let upper: String = c.to_uppercase().collect();
            format!("{upper}{}", chars.as_str())
        }
        None => String::new(),
    }
}
