//! Site structure and page assembly for Folio.
//!
//! - [`NavTree`]: navigation model derived from the source directory layout
//! - [`render_nav`]: nested list markup with the current page highlighted
//! - [`assemble_page`]: complete HTML document around rendered content

mod nav;
mod page;

pub use nav::{
    DOCUMENT_EXTENSION, Entry, EntryKind, NavError, NavNode, NavTree, PLACEHOLDER_PATH,
    display_name, order_entries,
};
pub use page::{LIVE_RELOAD_PATH, PageContext, assemble_page, render_nav};
