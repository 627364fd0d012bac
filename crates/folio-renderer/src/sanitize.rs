//! HTML sanitization.
//!
//! Ammonia's default allow-list, extended with the image attributes the
//! renderer emits, the disabled checkboxes produced by task lists and the
//! anchor ids footnote references link to.

use std::sync::LazyLock;

use ammonia::Builder;

static SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::default();
    builder
        .add_tags(&["img", "input"])
        .add_tag_attributes("img", &["src", "alt", "title", "loading", "decoding"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .add_tag_attributes("div", &["id"])
        .add_tag_attributes("sup", &["id"])
        .add_tag_attributes("li", &["id"]);
    builder
});

/// Strip every element and attribute outside the allow-list.
pub fn sanitize_html(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_lazy_image() {
        let html = r#"<img src="/a.png" alt="a" loading="lazy" decoding="async">"#;
        let clean = sanitize_html(html);
        assert!(clean.contains(r#"loading="lazy""#));
        assert!(clean.contains(r#"decoding="async""#));
        assert!(clean.contains(r#"alt="a""#));
    }

    #[test]
    fn test_drops_script_and_style() {
        let clean = sanitize_html("<p>ok</p><script>bad()</script><style>p{}</style>");
        assert_eq!(clean, "<p>ok</p>");
    }

    #[test]
    fn test_drops_javascript_urls() {
        let clean = sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!clean.contains("javascript:"));
    }

    #[test]
    fn test_keeps_footnote_anchor_ids() {
        let clean = sanitize_html(r#"<div class="footnote-definition" id="note"><p>x</p></div>"#);
        assert!(clean.contains(r#"id="note""#));
    }

    #[test]
    fn test_keeps_task_list_checkbox() {
        let clean = sanitize_html(r#"<input disabled="" type="checkbox" checked="">"#);
        assert!(clean.contains("checkbox"));
    }
}
