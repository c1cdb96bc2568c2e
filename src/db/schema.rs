//! Database schema and migrations for assetvault.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records how many have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: asset catalog
    r#"
CREATE TABLE assets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    filename    TEXT NOT NULL,
    path        TEXT NOT NULL UNIQUE,              -- directory + '/' + filename, or bare filename at root
    directory   TEXT NOT NULL DEFAULT '',          -- '' is the upload root
    mime_type   TEXT NOT NULL DEFAULT 'application/octet-stream',
    size        INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (directory, filename)
);

CREATE INDEX idx_assets_directory ON assets(directory);
CREATE INDEX idx_assets_created_at ON assets(created_at);
"#,
    // v2: filter queries select on the MIME prefix
    r#"
CREATE INDEX idx_assets_mime_type ON assets(mime_type);
"#,
];
