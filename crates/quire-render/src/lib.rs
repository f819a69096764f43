//! Presentation for Quire.
//!
//! Two pieces sit between a populated [`Node`](quire_types::Node) and the
//! response body:
//!
//! - [`Markup`] turns stored document bytes into HTML. [`Markdown`] is the
//!   CommonMark implementation (tables, strikethrough, task lists,
//!   footnotes; raw HTML omitted).
//! - [`present`] lays the node out as a page. The page is chosen by a
//!   [`Layout`]: the edit form, or the view assembled from fixed
//!   [`Sections`] (history, past-revision banner, delete confirmation).
//!   Nothing is parsed per request.

pub mod error;
pub mod escape;
pub mod markdown;
pub mod page;

pub use error::{RenderError, RenderResult};
pub use escape::escape_html;
pub use markdown::{Markdown, Markup, RAW_HTML_OMITTED};
pub use page::{present, Layout, Sections};
