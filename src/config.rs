//! Service configuration from the environment

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONTENT_URL: &str = "http://127.0.0.1:8000/content.json";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TITLE: &str = "Chat with Gemini";
pub const DEFAULT_INITIAL_PROMPT: &str = "Hello! How can I help you with these documents?";
pub const DEFAULT_PORT: u16 = 8100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SESSION_TTL_HOURS: u64 = 24;

/// Everything the service reads at startup
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Where the crawled documentation JSON is served
    pub content_url: String,
    /// Completion API key; without one the chat is disabled
    pub api_key: Option<String>,
    pub model: String,
    /// Header title shown in the widget
    pub title: String,
    /// Greeting shown when a conversation starts
    pub initial_prompt: String,
    /// Override for the completion API base URL
    pub api_base: Option<String>,
    /// Prefix for widget asset URLs and API calls (empty for same origin)
    pub asset_base: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str, default: u64| {
            get(key)
                .and_then(|v| match v.trim().parse() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        tracing::warn!(key, value = %v, "Ignoring non-numeric setting");
                        None
                    }
                })
                .unwrap_or(default)
        };

        let db_path = get("DOCS_CHAT_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.docs-chat/sessions.db"))
            },
            PathBuf::from,
        );

        let port = u16::try_from(number("DOCS_CHAT_PORT", u64::from(DEFAULT_PORT)))
            .unwrap_or(DEFAULT_PORT);

        Self {
            content_url: get("DOCS_CHAT_CONTENT_URL")
                .unwrap_or_else(|| DEFAULT_CONTENT_URL.to_string()),
            api_key: get("GEMINI_API_KEY"),
            model: get("DOCS_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            title: get("DOCS_CHAT_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            initial_prompt: get("DOCS_CHAT_INITIAL_PROMPT")
                .unwrap_or_else(|| DEFAULT_INITIAL_PROMPT.to_string()),
            api_base: get("DOCS_CHAT_API_BASE"),
            asset_base: get("DOCS_CHAT_ASSET_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            port,
            db_path,
            request_timeout: Duration::from_secs(number(
                "DOCS_CHAT_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            session_ttl: Duration::from_secs(
                number("DOCS_CHAT_SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS) * 3600,
            ),
        }
    }
}
