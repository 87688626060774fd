//! SQL DDL for users, sites, their association and vendor sessions.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - UUID primary keys stored as hyphenated TEXT
/// - timestamps stored as RFC3339 TEXT
/// - `user_site_link` keyed by (`user_id`, `site_id`)
/// - `session.data` holding the vendor login payload as JSON TEXT
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    ivion_username TEXT NOT NULL,
    ivion_password TEXT NOT NULL,
    hashed_password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS site (
    id TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    name TEXT NOT NULL,
    instance_url TEXT NOT NULL,
    ivion_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_site_name ON site(name);

CREATE TABLE IF NOT EXISTS user_site_link (
    user_id TEXT NOT NULL REFERENCES user(id),
    site_id TEXT NOT NULL REFERENCES site(id),
    PRIMARY KEY (user_id, site_id)
);

-- No uniqueness on (user_id, site_id): every login exchange adds a row.
CREATE TABLE IF NOT EXISTS session (
    id TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL,
    expering_at TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES user(id),
    site_id TEXT NOT NULL REFERENCES site(id),
    data TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_session_user_site ON session(user_id, site_id)
"#;
