//! Widget markup for documentation pages
//!
//! The snippet is the chat panel itself plus the tags that load the embedded
//! stylesheet and script. Element ids are fixed; the script binds to them.

use crate::config::ChatConfig;
use crate::render::{escape_text, COPIED_LABEL, COPY_FEEDBACK, COPY_LABEL};
use serde_json::json;

const BODY_END: &str = "</body>";

const CLEAR_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M6 19c0 1.1.9 2 2 2h8c1.1 0 2-.9 2-2V7H6v12zM19 4h-3.5l-1-1h-5l-1 1H5v2h14V4z"/></svg>"#;
const FULLSCREEN_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M7 14H5v5h5v-2H7v-3zm-2-4h2V7h3V5H5v5zm12 7h-3v2h5v-5h-2v3zM14 5v2h3v3h2V5h-5z"/></svg>"#;
const CLOSE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M19 6.41L17.59 5L12 10.59L6.41 5L5 6.41L10.59 12L5 17.59L6.41 19L12 13.41L17.59 19L19 17.59L13.41 12L19 6.41z"/></svg>"#;

/// Build the widget snippet for the given configuration
pub fn snippet(config: &ChatConfig) -> String {
    let title = escape_text(&config.title);
    let base = attribute_url(&config.asset_base);
    let settings = settings_json(config);

    format!(
        r#"
<div id="gemini-chatbot">
    <div id="chat-header">
        <span>{title}</span>
        <div class="header-buttons">
            <button id="clear-history-btn" title="Clear History">{CLEAR_ICON}</button>
            <button id="toggle-fullscreen-btn" title="Toggle Fullscreen">{FULLSCREEN_ICON}</button>
            <button id="close-chat" title="Close Chat">{CLOSE_ICON}</button>
        </div>
    </div>
    <div id="chat-messages"></div>
    <div id="chat-input-container">
        <input type="text" id="chat-input" placeholder="Ask a question...">
        <button id="send-chat">Send</button>
    </div>
</div>
<button id="open-chat">&#128172;</button>
<link href="{base}/assets/chatbot.css" rel="stylesheet">
<script>window.DOCS_CHAT = {settings};</script>
<script src="{base}/assets/chatbot.js"></script>
"#
    )
}

/// Insert the snippet before the closing body tag, or append it
pub fn inject(page_html: &str, snippet: &str) -> String {
    match page_html.rfind(BODY_END) {
        Some(at) => {
            let (head, tail) = page_html.split_at(at);
            format!("{head}{snippet}{tail}")
        }
        None => format!("{page_html}{snippet}"),
    }
}

/// Settings handed to the browser script
fn settings_json(config: &ChatConfig) -> String {
    let copy_feedback_ms = u64::try_from(COPY_FEEDBACK.as_millis()).unwrap_or(u64::MAX);
    json!({
        "apiBase": config.asset_base,
        "copyLabel": COPY_LABEL,
        "copiedLabel": COPIED_LABEL,
        "copyFeedbackMs": copy_feedback_ms,
    })
    .to_string()
    // Keep a `</script>` inside a value from closing the tag
    .replace("</", "<\\/")
}

fn attribute_url(url: &str) -> String {
    escape_text(url).replace('"', "%22")
}
