//! Database schema

/// Session-scoped key-value items. A row lives as long as its browser
/// session; abandoned sessions are purged by age.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS session_storage (
    session_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (session_id, key)
);

CREATE INDEX IF NOT EXISTS idx_session_storage_updated
    ON session_storage(updated_at);
";
