//! Message rendering
//!
//! Model replies are Markdown and become HTML with a copy control on every
//! code block. User text is shown literally.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::time::Duration;

/// Label of the copy control
pub const COPY_LABEL: &str = "Copy";

/// Label shown after a successful copy
pub const COPIED_LABEL: &str = "Copied!";

/// How long the copied label stays before reverting
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// A rendered message body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub html: String,
    /// Plain text of each code block, indexed by the control's `data-code-index`
    pub code_blocks: Vec<String>,
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render model Markdown to HTML.
///
/// Raw HTML in the source is escaped rather than passed through.
pub fn render_markdown(text: &str) -> RenderedMessage {
    let mut code_blocks = Vec::new();
    let mut events = Vec::new();
    let mut current: Option<(Option<String>, String)> = None;

    for event in Parser::new_ext(text, options()) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => language_class(&info),
                    CodeBlockKind::Indented => None,
                };
                current = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, code)) = current.take() {
                    let index = code_blocks.len();
                    events.push(Event::Html(CowStr::from(open_code(language.as_deref()))));
                    events.push(Event::Text(CowStr::from(code.clone())));
                    events.push(Event::Html(CowStr::from(close_code(index))));
                    code_blocks.push(strip_final_newline(code));
                }
            }
            Event::Text(t) if current.is_some() => {
                if let Some((_, code)) = current.as_mut() {
                    code.push_str(&t);
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    RenderedMessage {
        html: out,
        code_blocks,
    }
}

/// Render user input literally
pub fn render_user_text(text: &str) -> RenderedMessage {
    RenderedMessage {
        html: escape_text(text),
        code_blocks: Vec::new(),
    }
}

/// Escape text for an HTML body context
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    html::push_html(&mut out, std::iter::once(Event::Text(CowStr::from(text))));
    out
}

/// First word of a fence info string, restricted to characters safe in a
/// class attribute
fn language_class(info: &str) -> Option<String> {
    let word = info.split(|c: char| c.is_whitespace() || c == ',').next()?;
    let cleaned: String = word
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn open_code(language: Option<&str>) -> String {
    match language {
        Some(lang) => format!("<pre><code class=\"language-{lang}\">"),
        None => "<pre><code>".to_string(),
    }
}

fn close_code(index: usize) -> String {
    format!(
        "</code><button class=\"copy-code-btn\" type=\"button\" data-code-index=\"{index}\">{COPY_LABEL}</button></pre>\n"
    )
}

fn strip_final_newline(mut code: String) -> String {
    if code.ends_with('\n') {
        code.pop();
    }
    code
}
