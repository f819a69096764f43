//! Page layouts.
//!
//! Every page is a fixed sequence of fragments: header, the optional view
//! sections, the body, footer. [`Layout`] decides which fragments appear.

use quire_types::{EntryKind, Node, Revision};

use crate::escape::escape_html;

const STYLE: &str = "body{font-family:sans-serif;max-width:60em;margin:0 auto;padding:0 1em}\
nav.dirs a{display:block}nav.dirs a.active{font-weight:bold}\
.depth-1{margin-left:1em}.depth-2{margin-left:2em}.depth-3{margin-left:3em}\
.revision-banner{background:#fff3cd;padding:.5em}\
.delete-confirm{background:#f8d7da;padding:.5em}\
textarea{width:100%;min-height:30em}";

/// Optional sections of the view page. Any combination is valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sections {
    /// The revision list.
    pub history: bool,
    /// Notice that a past revision is displayed.
    pub revision_banner: bool,
    /// Delete confirmation form.
    pub delete_confirm: bool,
}

/// How a node is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Raw content in an edit form.
    Edit,
    /// Rendered content with optional sections.
    View(Sections),
}

impl Layout {
    pub fn for_node(node: &Node) -> Self {
        if node.edit {
            return Self::Edit;
        }
        Self::View(Sections {
            history: node.show_revisions,
            revision_banner: node.is_past_revision(),
            delete_confirm: node.ask_delete,
        })
    }
}

/// Lay out `node` as a complete HTML page.
pub fn present(node: &Node, layout: Layout) -> String {
    let mut out = String::with_capacity(node.markup.len() + node.content.len() + 4096);
    header(&mut out, node);
    match layout {
        Layout::Edit => editor(&mut out, node),
        Layout::View(sections) => {
            if sections.delete_confirm {
                delete_confirm(&mut out, node);
            }
            if sections.history {
                revisions(&mut out, node);
            }
            if sections.revision_banner {
                revision_banner(&mut out, node);
            }
            out.push_str("<article class=\"document\">\n");
            out.push_str(&node.markup);
            out.push_str("</article>\n");
        }
    }
    footer(&mut out, node);
    out
}

fn header(out: &mut String, node: &Node) {
    let url = escape_html(&node.url());
    out.push_str(&format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<header>\n",
        escape_html(&node.title)
    ));
    out.push_str("<nav class=\"dirs\">\n");
    for entry in &node.dirs {
        let suffix = if entry.kind == EntryKind::Directory { "/" } else { "" };
        let active = if entry.active { " active" } else { "" };
        out.push_str(&format!(
            "<a class=\"depth-{}{active}\" href=\"{}{}\">{}{suffix}</a>\n",
            entry.depth,
            escape_html(&node.basepath),
            escape_html(&entry.path),
            escape_html(&entry.name),
        ));
    }
    out.push_str("</nav>\n<div class=\"actions\">\n");
    out.push_str(&format!("<a href=\"{url}\">View</a>\n"));
    out.push_str(&format!("<a href=\"{url}?edit=1\">Edit</a>\n"));
    out.push_str(&format!("<a href=\"{url}?revisions=1\">History</a>\n"));
    out.push_str(&format!("<a href=\"{url}?askdelete=1\">Delete</a>\n"));
    out.push_str("</div>\n</header>\n<main>\n");
}

fn footer(out: &mut String, node: &Node) {
    out.push_str("</main>\n<footer>\n");
    if let Some(head) = node.log.head() {
        out.push_str(&format!(
            "Last edited by {} on {}.\n",
            escape_html(&head.author),
            head.time.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    out.push_str("</footer>\n</body>\n</html>\n");
}

fn editor(out: &mut String, node: &Node) {
    out.push_str(&format!(
        "<form class=\"editor\" method=\"post\" action=\"{url}\">\n\
         <textarea name=\"content\">{content}</textarea>\n\
         <label>Changes <input name=\"msg\" value=\"{msg}\" required></label>\n\
         <label>Author <input name=\"author\" value=\"{author}\" required></label>\n\
         <button type=\"submit\">Save</button>\n\
         <a href=\"{url}\">Cancel</a>\n\
         </form>\n",
        url = escape_html(&node.url()),
        content = escape_html(&node.content),
        msg = escape_html(&node.changelog),
        author = escape_html(&node.author),
    ));
}

fn revert_form(out: &mut String, node: &Node, revision: &Revision) {
    out.push_str(&format!(
        "<form class=\"revert\" method=\"post\" action=\"{}\">\
         <input type=\"hidden\" name=\"revert\" value=\"{}\">\
         <input type=\"hidden\" name=\"author\" value=\"{}\">\
         <button type=\"submit\">Revert to this revision</button></form>\n",
        escape_html(&node.url()),
        escape_html(&revision.id),
        escape_html(&node.author),
    ));
}

fn revisions(out: &mut String, node: &Node) {
    let url = escape_html(&node.url());
    let shown = if node.revision.is_empty() {
        node.log.head().map(|r| r.id.as_str()).unwrap_or_default()
    } else {
        node.revision.as_str()
    };
    out.push_str("<section class=\"revisions\">\n<h2>History</h2>\n<ol>\n");
    for revision in &node.log {
        let id = escape_html(revision.short_id());
        let label = if revision.id == shown {
            format!("<strong>{id}</strong>")
        } else {
            format!("<a href=\"{url}?revision={}\">{id}</a>", escape_html(&revision.id))
        };
        out.push_str(&format!(
            "<li>{label} {} <span class=\"author\">{}</span> <time>{}</time></li>\n",
            escape_html(&revision.message),
            escape_html(&revision.author),
            revision.time.format("%Y-%m-%d %H:%M"),
        ));
    }
    out.push_str("</ol>\n</section>\n");
}

fn revision_banner(out: &mut String, node: &Node) {
    out.push_str("<div class=\"revision-banner\">\n");
    match node.log.find(&node.revision) {
        Some(revision) => {
            out.push_str(&format!(
                "Viewing revision <code>{}</code> by {} from {}, not the current version. \
                 <a href=\"{}\">Show current version</a>\n",
                escape_html(revision.short_id()),
                escape_html(&revision.author),
                revision.time.format("%Y-%m-%d %H:%M"),
                escape_html(&node.url()),
            ));
            revert_form(out, node, revision);
        }
        None => out.push_str(&format!(
            "Viewing revision <code>{}</code>, not the current version.\n",
            escape_html(&node.revision)
        )),
    }
    out.push_str("</div>\n");
}

fn delete_confirm(out: &mut String, node: &Node) {
    out.push_str(&format!(
        "<section class=\"delete-confirm\">\n\
         <p>Delete {name}? Its history is kept.</p>\n\
         <form method=\"post\" action=\"{url}\">\
         <input type=\"hidden\" name=\"delete\" value=\"1\">\
         <input type=\"hidden\" name=\"author\" value=\"{author}\">\
         <button type=\"submit\">Delete</button> <a href=\"{url}\">Cancel</a></form>\n\
         </section>\n",
        name = escape_html(node.doc.as_str()),
        url = escape_html(&node.url()),
        author = escape_html(&node.author),
    ));
}
