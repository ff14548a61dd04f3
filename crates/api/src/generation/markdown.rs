//! Markdown rendering for generated content.

use comrak::{Options, markdown_to_html};

/// Render Markdown to HTML.
///
/// Raw HTML in the source is escaped: bodies come from a language model and
/// end up on a public site.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.render.escape = true;

    markdown_to_html(markdown, &options)
}

/// Text of the first level-one heading, if the body starts with one.
#[must_use]
pub fn leading_title(markdown: &str) -> Option<String> {
    let first = markdown.lines().find(|l| !l.trim().is_empty())?;
    let title = first.trim().strip_prefix("# ")?.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Body without a leading level-one heading.
#[must_use]
pub fn strip_leading_title(markdown: &str) -> &str {
    let trimmed = markdown.trim_start();
    if trimmed.starts_with("# ") {
        trimmed
            .split_once('\n')
            .map_or("", |(_, rest)| rest)
            .trim_start()
    } else {
        trimmed
    }
}
