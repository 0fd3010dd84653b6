//! Markdown-to-HTML rendering for lesson pages.
//!
//! Lessons are parsed with `pulldown-cmark` (tables, strikethrough, task lists,
//! footnotes, front matter), rendered to HTML, and passed through a small
//! cleanup pipeline so the result is accepted by a SharePoint text web part.

mod cleanup;
mod title;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use tracing::{debug, instrument};

pub use title::{UNTITLED_LESSON, extract_title};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of rendering one lesson.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Final HTML fragment.
    pub html: String,
    /// Title taken from the first H1 (or [`UNTITLED_LESSON`]).
    pub title: String,
}

/// Options for the Markdown-to-HTML rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Drop the first H1 from the body (the page header already shows it).
    pub strip_title_heading: bool,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render a lesson's Markdown to an HTML fragment.
#[instrument(skip_all, fields(len = markdown.len()))]
pub fn render(markdown: &str, opts: &RenderOptions) -> RenderResult {
    let title = extract_title(markdown);

    let parser = Parser::new_ext(markdown, parser_options());
    let mut raw_html = String::with_capacity(markdown.len() * 3 / 2);

    if opts.strip_title_heading {
        html::push_html(&mut raw_html, skip_first_h1(parser));
    } else {
        html::push_html(&mut raw_html, parser);
    }

    let html = cleanup::run_pipeline(&raw_html);

    debug!(title = %title, html_len = html.len(), "lesson rendered");

    RenderResult { html, title }
}

pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Filter out the events of the first H1 heading.
fn skip_first_h1<'a>(events: impl Iterator<Item = Event<'a>>) -> impl Iterator<Item = Event<'a>> {
    let mut state = SkipState::Searching;

    events.filter(move |event| match state {
        SkipState::Searching => {
            if matches!(
                event,
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H1,
                    ..
                })
            ) {
                state = SkipState::Inside;
                false
            } else {
                true
            }
        }
        SkipState::Inside => {
            if matches!(event, Event::End(TagEnd::Heading(HeadingLevel::H1))) {
                state = SkipState::Done;
            }
            false
        }
        SkipState::Done => true,
    })
}

#[derive(Clone, Copy)]
enum SkipState {
    Searching,
    Inside,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON: &str = "\
# Day 1: Shared Responsibility

Cloud security is a **shared** responsibility.

| Layer | Owner |
|-------|-------|
| Hardware | Provider |

- [x] Read the intro
- [ ] Finish the lab
";

    #[test]
    fn render_produces_html_and_title() {
        let result = render(LESSON, &RenderOptions::default());
        assert_eq!(result.title, "Day 1: Shared Responsibility");
        assert!(result.html.contains("<h1>Day 1: Shared Responsibility</h1>"));
        assert!(result.html.contains("<strong>shared</strong>"));
        assert!(result.html.contains("<table>"));
        assert!(result.html.contains("checkbox"));
    }

    #[test]
    fn strip_title_heading_removes_only_first_h1() {
        let md = "# Title\n\nbody\n\n# Appendix\n";
        let result = render(
            md,
            &RenderOptions {
                strip_title_heading: true,
            },
        );
        assert_eq!(result.title, "Title");
        assert!(!result.html.contains("<h1>Title</h1>"));
        assert!(result.html.contains("<h1>Appendix</h1>"));
        assert!(result.html.contains("<p>body</p>"));
    }

    #[test]
    fn front_matter_is_not_rendered() {
        let md = "---\nauthor: team\n---\n\n# Lesson\n";
        let result = render(md, &RenderOptions::default());
        assert!(!result.html.contains("author"));
    }

    #[test]
    fn untitled_lesson_still_renders() {
        let result = render("just text", &RenderOptions::default());
        assert_eq!(result.title, UNTITLED_LESSON);
        assert!(result.html.contains("<p>just text</p>"));
    }
}
