//! Database schema and migrations for depot.

/// Database migrations.
///
/// Each migration is a SQL script executed in order. The `schema_version`
/// table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: items table
    r#"
-- Files and directories. file_path is relative to the storage root.
CREATE TABLE items (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    is_directory  INTEGER NOT NULL,
    file_path     TEXT NOT NULL UNIQUE,
    parent_id     INTEGER REFERENCES items(id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Sibling names are unique, root items included (ids start at 1)
CREATE UNIQUE INDEX idx_items_sibling_name ON items(IFNULL(parent_id, 0), name);
CREATE INDEX idx_items_parent_id ON items(parent_id);
"#,
];
