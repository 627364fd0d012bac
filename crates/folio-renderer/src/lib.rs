//! Markdown to sanitized HTML rendering.
//!
//! [`MarkdownRenderer`] parses a document with pulldown-cmark, rewrites the
//! event stream (hard line breaks, lazy images) and hands the result to the
//! sanitizer. Everything it returns is safe to embed into a page as is.
//!
//! # Example
//!
//! ```
//! use folio_renderer::MarkdownRenderer;
//!
//! let html = MarkdownRenderer::new().render("# Hello\n\n<script>alert(1)</script>");
//! assert!(html.contains("<h1>Hello</h1>"));
//! assert!(!html.contains("<script>"));
//! ```

mod html;
mod renderer;
mod sanitize;

pub use html::escape_html;
pub use renderer::MarkdownRenderer;
pub use sanitize::sanitize_html;

/// Render markdown text to sanitized HTML with default options.
pub fn render_markdown(markdown: &str) -> String {
    MarkdownRenderer::new().render(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_is_sanitized() {
        let html = render_markdown(
            "Line one\nline two\n\n![Diagram](/d.png)\n\n<img src=x onerror=alert(1)>",
        );

        assert!(html.contains("Line one<br"));
        assert!(html.contains(r#"alt="Diagram""#));
        assert!(html.contains(r#"loading="lazy""#));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn test_footnote_reference_target_survives() {
        let html = render_markdown("Claim[^src].\n\n[^src]: Source of the claim.\n");

        let start = html.find("href=\"#").unwrap() + "href=\"#".len();
        let len = html[start..].find('"').unwrap();
        let target = &html[start..start + len];

        assert!(
            html.contains(&format!("id=\"{target}\"")),
            "no anchor for #{target} in {html}"
        );
    }
}
