//! Markdown to HTML.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::error::{RenderError, RenderResult};

/// Emitted in place of raw HTML found in a document.
pub const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// A pure transform from stored document bytes to HTML.
pub trait Markup: Send + Sync {
    fn render(&self, source: &[u8]) -> RenderResult<String>;
}

/// CommonMark with the GitHub-flavoured extensions.
#[derive(Clone, Copy, Debug)]
pub struct Markdown {
    options: Options,
}

impl Markdown {
    pub fn new() -> Self {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;
        Self { options }
    }
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Markup for Markdown {
    fn render(&self, source: &[u8]) -> RenderResult<String> {
        let text = std::str::from_utf8(source)
            .map_err(|e| RenderError::InvalidUtf8 { valid_up_to: e.valid_up_to() })?;

        // Documents are untrusted: each HTML block collapses into one marker,
        // inline tags into one marker each.
        let events = Parser::new_ext(text, self.options).filter_map(|event| match event {
            Event::Start(Tag::HtmlBlock) => Some(Event::Html(CowStr::Borrowed("<!-- raw HTML omitted -->\n"))),
            Event::Html(_) | Event::End(TagEnd::HtmlBlock) => None,
            Event::InlineHtml(_) => Some(Event::Html(CowStr::Borrowed(RAW_HTML_OMITTED))),
            other => Some(other),
        });

        let mut out = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut out, events);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(s: &str) -> String {
        Markdown::new().render(s.as_bytes()).unwrap()
    }

    #[test]
    fn paragraph() {
        assert_eq!(render("Hello"), "<p>Hello</p>\n");
    }

    #[test]
    fn extensions_enabled() {
        assert!(render("| a | b |\n|---|---|\n| 1 | 2 |").contains("<table>"));
        assert!(render("~~gone~~").contains("<del>gone</del>"));
        assert!(render("- [x] done").contains("type=\"checkbox\""));
    }

    #[test]
    fn raw_html_is_omitted() {
        let block = render("<script>alert(1)</script>\n\ntext");
        assert!(!block.contains("<script>"));
        assert!(block.contains(RAW_HTML_OMITTED));
        assert!(block.contains("<p>text</p>"));

        let inline = render("a <b onclick=x>bold</b> c");
        assert!(!inline.contains("<b onclick"));
        assert!(inline.contains(RAW_HTML_OMITTED));
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(render("1 < 2 & 3"), "<p>1 &lt; 2 &amp; 3</p>\n");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = Markdown::new().render(&[b'o', b'k', 0xff]).unwrap_err();
        assert_eq!(err, RenderError::InvalidUtf8 { valid_up_to: 2 });
    }
}
