//! Navigation tree builder.
//!
//! Turns the discovered lesson set into the site menu: Home, Prerequisites,
//! then one heading per week holding that week's lessons.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, instrument};
use url::Url;

use coursekit_lessons::{humanize, page_name, week_number};
use coursekit_shared::{LessonFile, NavNode, NavigationConfig};
use coursekit_sharepoint::page_url;

/// Build the navigation tree for `lessons` under the site at `base_url`.
///
/// Weeks are ordered by number; keys that are not `week-N` come after all
/// numbered weeks, alphabetically. Lessons within a week are ordered by day.
#[instrument(skip_all, fields(lesson_count = lessons.len()))]
pub fn build_navigation(
    lessons: &[LessonFile],
    base_url: &Url,
    config: &NavigationConfig,
) -> Vec<NavNode> {
    let mut tree = vec![
        NavNode::link(&config.home_label, base_url.as_str().trim_end_matches('/')),
        NavNode::link(
            &config.prerequisites_label,
            page_url(base_url, &config.prerequisites_page),
        ),
    ];

    let mut weeks: BTreeMap<&str, Vec<&LessonFile>> = BTreeMap::new();
    for lesson in lessons {
        weeks.entry(lesson.week.as_str()).or_default().push(lesson);
    }

    let mut keys: Vec<&str> = weeks.keys().copied().collect();
    keys.sort_by(|a, b| compare_weeks(a, b));

    for key in keys {
        let mut week_lessons = weeks.remove(key).unwrap_or_default();
        week_lessons.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.path.cmp(&b.path)));

        let children = week_lessons
            .into_iter()
            .map(|lesson| NavNode::link(&lesson.title, page_url(base_url, &page_name(&lesson.path))))
            .collect();

        tree.push(NavNode::heading(week_label(key, config), children));
    }

    debug!(top_level = tree.len(), "navigation tree built");
    tree
}

/// Prefix shown before every week heading.
pub const WEEK_GLYPH: &str = "📅";

/// Heading label for a week: configured label, else a humanized key, always
/// behind [`WEEK_GLYPH`].
pub fn week_label(key: &str, config: &NavigationConfig) -> String {
    let label = config
        .week_label(key)
        .map(str::to_string)
        .unwrap_or_else(|| humanize(key));

    if label.starts_with(WEEK_GLYPH) {
        label
    } else {
        format!("{WEEK_GLYPH} {label}")
    }
}

/// Numbered weeks ascending, then unnumbered keys alphabetically.
fn compare_weeks(a: &str, b: &str) -> Ordering {
    match (week_number(a), week_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://contoso.sharepoint.com/sites/training").expect("url")
    }

    fn lesson(path: &str, title: &str) -> LessonFile {
        let (week, file) = path.split_once('/').expect("two-level path");
        LessonFile {
            path: path.into(),
            week: week.into(),
            day: coursekit_lessons::ordinal(file),
            title: title.into(),
        }
    }

    #[test]
    fn zero_lessons_yield_home_and_prerequisites() {
        let tree = build_navigation(&[], &base(), &NavigationConfig::default());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].display_name, "🏠 Home");
        assert_eq!(tree[0].web_url, "https://contoso.sharepoint.com/sites/training");
        assert_eq!(
            tree[1].web_url,
            "https://contoso.sharepoint.com/sites/training/SitePages/Prerequisites.aspx"
        );
        assert!(tree.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn weeks_are_ordered_numerically_regardless_of_input() {
        let lessons = vec![
            lesson("week-2/day-01.md", "W2D1"),
            lesson("week-10/day-01.md", "W10D1"),
            lesson("week-1/day-01.md", "W1D1"),
        ];
        let tree = build_navigation(&lessons, &base(), &NavigationConfig::default());
        let weeks: Vec<&str> = tree[2..].iter().map(|n| n.children[0].display_name.as_str()).collect();
        assert_eq!(weeks, vec!["W1D1", "W2D1", "W10D1"]);
    }

    #[test]
    fn days_are_ordered_within_week() {
        let lessons = vec![
            lesson("week-1/day-03.md", "Three"),
            lesson("week-1/day-01.md", "One"),
            lesson("week-1/day-02.md", "Two"),
        ];
        let tree = build_navigation(&lessons, &base(), &NavigationConfig::default());
        assert_eq!(tree.len(), 3);

        let week = &tree[2];
        assert!(week.is_heading());
        let days: Vec<&str> = week.children.iter().map(|n| n.display_name.as_str()).collect();
        assert_eq!(days, vec!["One", "Two", "Three"]);
        assert_eq!(
            week.children[1].web_url,
            "https://contoso.sharepoint.com/sites/training/SitePages/Week-1-Day-02.aspx"
        );
    }

    #[test]
    fn unnumbered_weeks_sort_last_alphabetically() {
        let lessons = vec![
            lesson("week-capstone/day-01.md", "Capstone"),
            lesson("week-bonus/day-01.md", "Bonus"),
            lesson("week-3/day-01.md", "W3"),
        ];
        let tree = build_navigation(&lessons, &base(), &NavigationConfig::default());
        let labels: Vec<&str> = tree[2..].iter().map(|n| n.display_name.as_str()).collect();
        assert_eq!(
            labels,
            vec!["📅 Week 3: Network & Data Protection", "📅 Week Bonus", "📅 Week Capstone"]
        );
    }

    #[test]
    fn week_label_lookup_and_fallback() {
        let mut config = NavigationConfig::default();
        config.week_labels.insert("week-5".into(), "Week 5 · Capstone".into());

        assert_eq!(week_label("week-5", &config), "📅 Week 5 · Capstone");
        assert_eq!(week_label("week-1", &config), "📅 Week 1: Foundations & Visibility");
        assert_eq!(week_label("week-4", &config), "📅 Week 4: Detection & Response");
        assert_eq!(week_label("week-6", &config), "📅 Week 6");
        assert_eq!(week_label("week-deep-dive", &config), "📅 Week Deep Dive");

        config.week_labels.insert("week-7".into(), "📅 Week 7".into());
        assert_eq!(week_label("week-7", &config), "📅 Week 7");
    }
}
