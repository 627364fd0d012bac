use std::fmt::Write;

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an image with lazy-loading hints.
///
/// An image without a destination degrades to its alt text.
pub(crate) fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    if src.is_empty() {
        out.push_str(&escape_html(alt));
        return;
    }
    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape_html(title))
    };
    write!(
        out,
        r#"<img src="{}" alt="{}"{title_attr} loading="lazy" decoding="async">"#,
        escape_html(src),
        escape_html(alt)
    )
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_image_with_title() {
        let mut out = String::new();
        image("/cat.png", "A cat", "Meow", &mut out);
        assert_eq!(
            out,
            r#"<img src="/cat.png" alt="A cat" title="Meow" loading="lazy" decoding="async">"#
        );
    }

    #[test]
    fn test_image_without_src_is_alt_text() {
        let mut out = String::new();
        image("", "a <b>", "", &mut out);
        assert_eq!(out, "a &lt;b&gt;");
    }
}
