//! Markdown to plain text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Render markdown as plain text, keeping headings, list items, code and
/// table cells as separate lines and dropping markup.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len());

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Start(Tag::Item) => {
                ensure_newline(&mut out);
                out.push_str("- ");
            }
            Event::End(TagEnd::TableCell) => out.push_str(" | "),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote
                | TagEnd::List(_),
            ) => {
                ensure_newline(&mut out);
                out.push('\n');
            }
            Event::End(TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow) => {
                ensure_newline(&mut out);
            }
            Event::Rule => {
                ensure_newline(&mut out);
                out.push('\n');
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
