//! `SQLite` schema for the entry store.

/// Key-value table holding the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Ingested entries. `authors` and `categories` hold JSON arrays.
pub const CREATE_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    origin TEXT NOT NULL,
    title TEXT NOT NULL,
    link TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    published TEXT,
    updated TEXT,
    authors TEXT NOT NULL DEFAULT '[]',
    categories TEXT NOT NULL DEFAULT '[]',
    fetched_at TEXT NOT NULL,
    fingerprint TEXT NOT NULL UNIQUE
)
";

/// Newest-first listings.
pub const CREATE_FETCHED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_fetched_at ON entries(fetched_at DESC)
";

/// Deduplication lookups.
pub const CREATE_FINGERPRINT_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_fingerprint ON entries(fingerprint)
";

/// Per-source listings and counts.
pub const CREATE_SOURCE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_source ON entries(source)
";

/// Columns selected for an [`crate::entry::Entry`], in row-mapping order.
pub const ENTRY_COLUMNS: &str =
    "id, source, origin, title, link, summary, published, updated, authors, categories, fetched_at, fingerprint";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_table_columns() {
        for column in ENTRY_COLUMNS.split(", ") {
            assert!(
                CREATE_ENTRIES_TABLE.contains(&format!("\n    {column} ")),
                "missing column {column}"
            );
        }
        assert!(CREATE_ENTRIES_TABLE.contains("fingerprint TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
