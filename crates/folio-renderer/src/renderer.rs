//! Markdown event rewriting and HTML generation.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html::push_html};

use crate::html;
use crate::sanitize::sanitize_html;

/// Image being collected between `Tag::Image` and `TagEnd::Image`.
struct PendingImage {
    src: String,
    title: String,
    alt: String,
    /// Nesting depth of images inside the alt text.
    depth: usize,
}

/// Markdown renderer producing sanitized HTML.
///
/// Line breaks inside a paragraph are kept as `<br>`, and images are emitted
/// with `loading="lazy"` and `decoding="async"`.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    gfm: bool,
    hard_breaks: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer with GFM extensions and hard line breaks enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gfm: true,
            hard_breaks: true,
        }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// When enabled, the parser supports tables, strikethrough, task lists,
    /// footnotes and smart punctuation.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Render single newlines inside a paragraph as `<br>`.
    #[must_use]
    pub fn with_hard_breaks(mut self, enabled: bool) -> Self {
        self.hard_breaks = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_SMART_PUNCTUATION
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render markdown to sanitized HTML.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let events = self.rewrite_events(parser);

        let mut raw = String::with_capacity(markdown.len() * 3 / 2);
        push_html(&mut raw, events.into_iter());

        sanitize_html(&raw)
    }

    fn rewrite_events<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut pending: Option<PendingImage> = None;

        for event in parser {
            if let Some(image) = pending.as_mut() {
                match event {
                    Event::Start(Tag::Image { .. }) => image.depth += 1,
                    Event::End(TagEnd::Image) if image.depth > 0 => image.depth -= 1,
                    Event::End(TagEnd::Image) => {
                        let mut tag = String::new();
                        html::image(&image.src, &image.alt, &image.title, &mut tag);
                        events.push(Event::InlineHtml(CowStr::from(tag)));
                        pending = None;
                    }
                    Event::Text(text) | Event::Code(text) => image.alt.push_str(&text),
                    Event::SoftBreak | Event::HardBreak => image.alt.push(' '),
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    pending = Some(PendingImage {
                        src: dest_url.into_string(),
                        title: title.into_string(),
                        alt: String::new(),
                        depth: 0,
                    });
                }
                Event::SoftBreak if self.hard_breaks => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_and_paragraph() {
        let html = MarkdownRenderer::new().render("# Hi\n\nSome **bold** text");
        assert_eq!(html, "<h1>Hi</h1>\n<p>Some <strong>bold</strong> text</p>\n");
    }

    #[test]
    fn test_soft_break_becomes_br() {
        let html = MarkdownRenderer::new().render("line one\nline two");
        assert!(html.contains("line one<br"));
    }

    #[test]
    fn test_soft_break_kept_when_disabled() {
        let html = MarkdownRenderer::new()
            .with_hard_breaks(false)
            .render("line one\nline two");
        assert!(!html.contains("<br"));
    }

    #[test]
    fn test_image_gets_lazy_async_hints() {
        let html = MarkdownRenderer::new().render("![A cat](/cat.png)");
        assert!(html.contains("<img"));
        assert!(html.contains(r#"src="/cat.png""#));
        assert!(html.contains(r#"alt="A cat""#));
        assert!(html.contains(r#"loading="lazy""#));
        assert!(html.contains(r#"decoding="async""#));
    }

    #[test]
    fn test_image_title_preserved() {
        let html = MarkdownRenderer::new().render(r#"![Logo](/logo.png "Our logo")"#);
        assert!(html.contains(r#"title="Our logo""#));
    }

    #[test]
    fn test_image_alt_flattens_formatting() {
        let html = MarkdownRenderer::new().render("![a *fancy* `cat`](/cat.png)");
        assert!(html.contains(r#"alt="a fancy cat""#));
    }

    #[test]
    fn test_image_without_destination_renders_alt() {
        let html = MarkdownRenderer::new().render("![just words]()");
        assert!(!html.contains("<img"));
        assert!(html.contains("just words"));
    }

    #[test]
    fn test_script_is_stripped() {
        let html = MarkdownRenderer::new().render("Hello\n\n<script>alert('x')</script>\n\nBye");
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert"));
        assert!(html.contains("Hello"));
        assert!(html.contains("Bye"));
    }

    #[test]
    fn test_event_handlers_are_stripped() {
        let html = MarkdownRenderer::new().render(r#"<img src="/x.png" onerror="alert(1)">"#);
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn test_tables_rendered() {
        let html = MarkdownRenderer::new().render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_strikethrough_requires_gfm() {
        let with = MarkdownRenderer::new().render("~~gone~~");
        let without = MarkdownRenderer::new().with_gfm(false).render("~~gone~~");
        assert!(with.contains("<del>gone</del>"));
        assert!(!without.contains("<del>"));
    }
}
