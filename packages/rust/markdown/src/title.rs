//! Lesson title extraction.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Title used when a lesson has no top-level heading.
pub const UNTITLED_LESSON: &str = "Untitled Lesson";

/// Return the text of the first H1 heading, trimmed, or [`UNTITLED_LESSON`].
///
/// Both ATX (`# Title`) and setext (`Title\n===`) headings count. Headings
/// inside code blocks or front matter are ignored, and an H1 with no text is
/// skipped in favour of the next one.
pub fn extract_title(markdown: &str) -> String {
    find_h1(markdown).unwrap_or_else(|| UNTITLED_LESSON.to_string())
}

fn find_h1(markdown: &str) -> Option<String> {
    let mut current: Option<String> = None;

    for event in Parser::new_ext(markdown, crate::parser_options()) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => current = Some(String::new()),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(text) = current.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&t);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(buf) = current.as_mut() {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_h1_is_trimmed() {
        let md = "intro text\n\n#   Day 2: IAM Deep Dive   \n\n# Second\n";
        assert_eq!(extract_title(md), "Day 2: IAM Deep Dive");
    }

    #[test]
    fn missing_h1_returns_sentinel() {
        assert_eq!(extract_title("## Only a subheading\n\nbody"), UNTITLED_LESSON);
        assert_eq!(extract_title(""), UNTITLED_LESSON);
    }

    #[test]
    fn h1_inside_code_block_is_ignored() {
        let md = "```bash\n# not a heading\n```\n\n# Real Title\n";
        assert_eq!(extract_title(md), "Real Title");
    }

    #[test]
    fn inline_markup_is_flattened() {
        assert_eq!(extract_title("# Using `aws s3api` *safely*"), "Using aws s3api safely");
    }

    #[test]
    fn setext_heading_counts() {
        assert_eq!(extract_title("Threat Modeling\n===============\n"), "Threat Modeling");
    }

    #[test]
    fn front_matter_is_not_a_heading() {
        let md = "---\ntitle: ignored\n---\n\n# From Body\n";
        assert_eq!(extract_title(md), "From Body");
    }
}
