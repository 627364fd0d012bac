//! HTML page assembly.
//!
//! Pages are self-contained: styling is inlined and the navigation sidebar is
//! rendered into every page.

use std::fmt::Write;

use folio_renderer::escape_html as escape;

use crate::nav::NavTree;

/// Path of the live reload event stream on the preview server.
pub const LIVE_RELOAD_PATH: &str = "/__livereload";

const STYLE: &str = r"
*, *::before, *::after { box-sizing: border-box; }
body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; color: #1f2937; line-height: 1.6; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 260px; flex-shrink: 0; padding: 1.5rem 1rem; border-right: 1px solid #e5e7eb; background: #f9fafb; position: sticky; top: 0; height: 100vh; overflow-y: auto; }
.sidebar ul { list-style: none; margin: 0; padding-left: 0; }
.sidebar ul ul { padding-left: 0.875rem; }
.sidebar li { margin: 0.125rem 0; }
.sidebar a, .sidebar .section { display: block; padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.875rem; color: #374151; text-decoration: none; }
.sidebar .section { font-weight: 600; color: #111827; }
.sidebar a:hover { background: #e5e7eb; }
.sidebar a.active { background: #dbeafe; color: #1d4ed8; font-weight: 500; }
main { flex: 1; min-width: 0; padding: 2rem 3rem; }
article { max-width: 48rem; }
article img { max-width: 100%; height: auto; }
article pre { background: #f3f4f6; padding: 1rem; border-radius: 6px; overflow-x: auto; }
article code { font-size: 0.875em; }
article table { border-collapse: collapse; }
article th, article td { border: 1px solid #d1d5db; padding: 0.375rem 0.75rem; }
article blockquote { margin-left: 0; padding-left: 1rem; border-left: 4px solid #d1d5db; color: #4b5563; }
@media (max-width: 768px) { .layout { flex-direction: column; } .sidebar { width: auto; height: auto; position: static; border-right: none; border-bottom: 1px solid #e5e7eb; } main { padding: 1.5rem 1rem; } }
";

/// Live reload client: reloads on `reload` and reconnects after errors.
fn live_reload_script() -> String {
    format!(
        r"<script>
(function () {{
  var retryDelay = 1000;
  function connect() {{
    var source = new EventSource('{LIVE_RELOAD_PATH}');
    source.onmessage = function (event) {{
      if (event.data === 'reload') {{
        window.location.reload();
      }}
    }};
    source.onerror = function () {{
      source.close();
      setTimeout(connect, retryDelay);
    }};
  }}
  connect();
}})();
</script>
"
    )
}

/// Everything needed to assemble one output page.
pub struct PageContext<'a> {
    /// Page title.
    pub title: &'a str,
    /// Sanitized content HTML.
    pub content: &'a str,
    /// Pre-rendered navigation fragment, see [`render_nav`].
    pub navigation: &'a str,
    /// Inject the live reload client.
    pub live_reload: bool,
}

/// Render a complete HTML page.
pub fn assemble_page(page: &PageContext<'_>) -> String {
    let mut html = String::with_capacity(page.content.len() + page.navigation.len() + 4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(page.title));
    html.push_str("<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<div class=\"layout\">\n");
    html.push_str("<aside class=\"sidebar\">\n<nav>\n");
    html.push_str(page.navigation);
    html.push_str("</nav>\n</aside>\n");

    html.push_str("<main>\n<article>\n");
    html.push_str(page.content);
    html.push_str("\n</article>\n</main>\n");
    html.push_str("</div>\n");

    if page.live_reload {
        html.push_str(&live_reload_script());
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render the navigation tree as nested lists.
///
/// The document whose web path equals `current_path` is marked with
/// `class="active"` and `aria-current="page"`. Directories without an index
/// page render as plain labels.
pub fn render_nav(tree: &NavTree, current_path: &str) -> String {
    let mut html = String::new();
    render_items(&mut html, tree, tree.roots(), current_path);
    html
}

fn render_items(html: &mut String, tree: &NavTree, items: &[usize], current_path: &str) {
    if items.is_empty() {
        return;
    }

    html.push_str("<ul>\n");
    for &idx in items {
        let node = tree.node(idx);
        html.push_str("<li>");

        if !node.is_navigable() {
            let _ = write!(html, "<span class=\"section\">{}</span>", escape(&node.title));
        } else if node.is_document() && node.path == current_path {
            let _ = write!(
                html,
                "<a href=\"{}\" class=\"active\" aria-current=\"page\">{}</a>",
                escape(&node.path),
                escape(&node.title)
            );
        } else {
            let _ = write!(
                html,
                "<a href=\"{}\">{}</a>",
                escape(&node.path),
                escape(&node.title)
            );
        }

        html.push('\n');
        render_items(html, tree, tree.children(idx), current_path);
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
}
