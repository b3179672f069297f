//! Storage layer for knowledge-manager.
//!
//! Entries live in a single `SQLite` database. Links are deduplicated by
//! fingerprint, so re-fetching a feed only stores what is new.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entry::{Entry, SourceKind};
use crate::error::{Error, Result};

use schema::ENTRY_COLUMNS;

/// Storage engine for entries.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Connection,
}

/// Outcome of inserting a batch of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertReport {
    /// Entries newly stored.
    pub inserted: usize,
    /// Entries skipped because their link was already stored.
    pub duplicates: usize,
}

/// Storage statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    /// Total number of entries.
    pub total_entries: i64,
    /// Entry counts per source, largest first.
    pub by_source: Vec<(SourceKind, i64)>,
    /// Fetch time of the oldest entry.
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Fetch time of the newest entry.
    pub newest_entry: Option<DateTime<Utc>>,
    /// Database file size in bytes.
    pub database_size_bytes: u64,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema
    /// cannot be brought up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        debug!(path = %path.display(), "Opening database");
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!(path = %path.display(), "Database opened");
        Ok(Self { path, conn })
    }

    /// Create an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path, conn })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert an entry.
    ///
    /// Returns the new row id, or `None` when an entry with the same
    /// fingerprint is already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert(&self, entry: &Entry) -> Result<Option<i64>> {
        insert_into(&self.conn, entry)
    }

    /// Insert entries in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is stored in that case.
    pub fn insert_many(&self, entries: &[Entry]) -> Result<InsertReport> {
        let tx = self.conn.unchecked_transaction()?;
        let mut report = InsertReport::default();
        for entry in entries {
            match insert_into(&tx, entry)? {
                Some(_) => report.inserted += 1,
                None => report.duplicates += 1,
            }
        }
        tx.commit()?;

        debug!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            "Stored entries"
        );
        Ok(report)
    }

    /// Get an entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, id: i64) -> Result<Option<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, [id], row_to_entry)
            .optional()?)
    }

    /// Most recently fetched entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_recent(&self, limit: usize) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY fetched_at DESC, id DESC LIMIT ?1"
            ),
            params![sql_limit(limit)],
        )
    }

    /// Most recent entries of one source, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_by_source(&self, source: SourceKind, limit: usize) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries WHERE source = ?1 \
                 ORDER BY fetched_at DESC, id DESC LIMIT ?2"
            ),
            params![source.to_string(), sql_limit(limit)],
        )
    }

    /// Search titles and summaries, case-insensitively.
    ///
    /// `%` and `_` in `query` match literally.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search(
        &self,
        query: &str,
        source: Option<SourceKind>,
        limit: usize,
    ) -> Result<Vec<Entry>> {
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries \
             WHERE (title LIKE ?1 ESCAPE '\\' OR summary LIKE ?1 ESCAPE '\\') \
             AND (?2 IS NULL OR source = ?2) \
             ORDER BY fetched_at DESC, id DESC LIMIT ?3"
        );
        self.query_entries(
            &sql,
            params![
                pattern,
                source.map(|s| s.to_string()),
                sql_limit(limit)
            ],
        )
    }

    /// Entries fetched within `[start, end]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries \
                 WHERE fetched_at >= ?1 AND fetched_at <= ?2 ORDER BY fetched_at ASC, id ASC"
            ),
            params![timestamp(&start), timestamp(&end)],
        )
    }

    /// Total number of entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?)
    }

    /// Delete an entry. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.conn.execute("DELETE FROM entries WHERE id = ?1", [id])? > 0)
    }

    /// Delete entries fetched more than `max_age` ago.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn prune_older_than(&self, max_age: Duration) -> Result<usize> {
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            return Ok(0);
        };
        let cutoff = timestamp(&cutoff);
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE fetched_at < ?1", [cutoff])?;
        if deleted > 0 {
            info!(deleted, "Pruned entries by age");
        }
        Ok(deleted)
    }

    /// Keep only the `keep` most recently fetched entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn prune_keep_recent(&self, keep: usize) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM entries WHERE id NOT IN \
             (SELECT id FROM entries ORDER BY fetched_at DESC, id DESC LIMIT ?1)",
            [sql_limit(keep)],
        )?;
        if deleted > 0 {
            info!(deleted, keep, "Pruned entries by count");
        }
        Ok(deleted)
    }

    /// Gather storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_entries = self.count()?;

        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) AS n FROM entries GROUP BY source ORDER BY n DESC, source",
        )?;
        let by_source = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .filter_map(|row| match row {
                Ok((source, n)) => match source.parse::<SourceKind>() {
                    Ok(kind) => Some(Ok((kind, n))),
                    Err(_) => {
                        warn!(%source, "Unknown source in database");
                        None
                    }
                },
                Err(e) => Some(Err(e.into())),
            })
            .collect::<Result<Vec<_>>>()?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(fetched_at), MAX(fetched_at) FROM entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let database_size_bytes = std::fs::metadata(&self.path).map_or(0, |m| m.len());

        Ok(StorageStats {
            total_entries,
            by_source,
            oldest_entry: oldest.as_deref().and_then(parse_timestamp),
            newest_entry: newest.as_deref().and_then(parse_timestamp),
            database_size_bytes,
        })
    }

    /// All entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn all(&self) -> Result<Vec<Entry>> {
        self.query_entries(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY fetched_at ASC, id ASC"),
            [],
        )
    }

    /// Write every entry to `path` as a pretty-printed JSON array.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns an error if the entries cannot be read or the file written.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let entries = self.all()?;
        let json = serde_json::to_string_pretty(&entries)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        info!(count = entries.len(), path = %path.display(), "Exported entries");
        Ok(entries.len())
    }

    fn query_entries(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Read a JSON array of entries written by [`Storage::export_json`].
///
/// A missing file yields an empty list. Stored ids are dropped so the
/// entries can be inserted into another database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid entry list.
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Entry file not found, nothing to load");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut entries: Vec<Entry> = serde_json::from_str(&content)?;
    for entry in &mut entries {
        entry.id = None;
    }
    Ok(entries)
}

fn insert_into(conn: &Connection, entry: &Entry) -> Result<Option<i64>> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO entries \
         (source, origin, title, link, summary, published, updated, authors, categories, fetched_at, fingerprint) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entry.source.to_string(),
            entry.origin,
            entry.title,
            entry.link,
            entry.summary,
            entry.published,
            entry.updated,
            serde_json::to_string(&entry.authors)?,
            serde_json::to_string(&entry.categories)?,
            timestamp(&entry.fetched_at),
            entry.fingerprint,
        ],
    )?;

    if changed == 0 {
        debug!(link = %entry.link, "Duplicate entry skipped");
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

/// Fixed-width UTC timestamp, so text order matches time order.
fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn json_list(row: &Row<'_>, index: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(index)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let source: String = row.get(1)?;
    let source = source.parse::<SourceKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let fetched_at: String = row.get(10)?;
    let fetched_at = parse_timestamp(&fetched_at).unwrap_or_else(Utc::now);

    Ok(Entry {
        id: Some(row.get(0)?),
        source,
        origin: row.get(2)?,
        title: row.get(3)?,
        link: row.get(4)?,
        summary: row.get(5)?,
        published: row.get(6)?,
        updated: row.get(7)?,
        authors: json_list(row, 8)?,
        categories: json_list(row, 9)?,
        fetched_at,
        fingerprint: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn entry(title: &str, link: &str) -> Entry {
        Entry::new(SourceKind::Rss, "https://example.com/rss", title, link)
    }

    fn entry_at(title: &str, link: &str, fetched_at: DateTime<Utc>) -> Entry {
        let mut e = entry(title, link);
        e.fetched_at = fetched_at;
        e
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let original = entry("Hello", "https://example.com/hello")
            .with_summary("A post")
            .with_authors(vec!["Ada".to_string(), "Grace".to_string()])
            .with_categories(vec!["rust".to_string()])
            .with_dates(Some("2024-05-01T10:00:00Z".to_string()), None);

        let id = storage.insert(&original).unwrap().unwrap();
        let stored = storage.get(id).unwrap().unwrap();

        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.title, "Hello");
        assert_eq!(stored.summary, "A post");
        assert_eq!(stored.authors, vec!["Ada", "Grace"]);
        assert_eq!(stored.categories, vec!["rust"]);
        assert_eq!(stored.published.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert!(stored.updated.is_none());
        assert_eq!(stored.fingerprint, original.fingerprint);
        assert_eq!(
            stored.fetched_at.timestamp_micros(),
            original.fetched_at.timestamp_micros()
        );
    }

    #[test]
    fn test_insert_duplicate_link() {
        let storage = create_test_storage();
        assert!(storage
            .insert(&entry("First", "https://example.com/a"))
            .unwrap()
            .is_some());
        assert!(storage
            .insert(&entry("Second", "https://example.com/a/"))
            .unwrap()
            .is_none());
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_insert_many_report() {
        let storage = create_test_storage();
        storage.insert(&entry("Old", "https://example.com/1")).unwrap();

        let report = storage
            .insert_many(&[
                entry("Dup", "https://example.com/1"),
                entry("New", "https://example.com/2"),
                entry("New again", "https://example.com/2"),
                entry("Other", "https://example.com/3"),
            ])
            .unwrap();

        assert_eq!(
            report,
            InsertReport {
                inserted: 2,
                duplicates: 2
            }
        );
        assert_eq!(storage.count().unwrap(), 3);
    }

    #[test]
    fn test_get_missing() {
        let storage = create_test_storage();
        assert!(storage.get(42).unwrap().is_none());
    }

    #[test]
    fn test_get_recent_order() {
        let storage = create_test_storage();
        let now = Utc::now();
        for i in 0..5 {
            storage
                .insert(&entry_at(
                    &format!("Entry {i}"),
                    &format!("https://example.com/{i}"),
                    now - Duration::minutes(5 - i),
                ))
                .unwrap();
        }

        let recent = storage.get_recent(3).unwrap();
        let titles: Vec<_> = recent.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Entry 4", "Entry 3", "Entry 2"]);
    }

    #[test]
    fn test_get_by_source() {
        let storage = create_test_storage();
        storage.insert(&entry("Feed", "https://example.com/f")).unwrap();
        storage
            .insert(&Entry::new(
                SourceKind::Arxiv,
                "llm",
                "Paper",
                "http://arxiv.org/abs/1",
            ))
            .unwrap();

        let papers = storage.get_by_source(SourceKind::Arxiv, 10).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].source, SourceKind::Arxiv);
        assert!(storage
            .get_by_source(SourceKind::Transcript, 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_search_title_and_summary() {
        let storage = create_test_storage();
        storage
            .insert(&entry("Rust async patterns", "https://example.com/1"))
            .unwrap();
        storage
            .insert(&entry("Weekly digest", "https://example.com/2").with_summary("all about RUST"))
            .unwrap();
        storage
            .insert(&entry("Python tips", "https://example.com/3"))
            .unwrap();

        assert_eq!(storage.search("rust", None, 10).unwrap().len(), 2);
        assert_eq!(storage.search("python", None, 10).unwrap().len(), 1);
        assert!(storage.search("golang", None, 10).unwrap().is_empty());
        assert!(storage
            .search("rust", Some(SourceKind::Arxiv), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let storage = create_test_storage();
        storage
            .insert(&entry("100% coverage", "https://example.com/1"))
            .unwrap();
        storage
            .insert(&entry("1000 coverage", "https://example.com/2"))
            .unwrap();

        let results = storage.search("0%", None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "100% coverage");
        assert_eq!(storage.search("_", None, 10).unwrap().len(), 0);
    }

    #[test]
    fn test_get_by_time_range() {
        let storage = create_test_storage();
        let now = Utc::now();
        storage
            .insert(&entry_at("old", "https://example.com/1", now - Duration::days(3)))
            .unwrap();
        storage
            .insert(&entry_at("mid", "https://example.com/2", now - Duration::days(1)))
            .unwrap();
        storage
            .insert(&entry_at("new", "https://example.com/3", now))
            .unwrap();

        let results = storage
            .get_by_time_range(now - Duration::days(2), now - Duration::hours(1))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "mid");
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let id = storage
            .insert(&entry("To delete", "https://example.com/d"))
            .unwrap()
            .unwrap();
        assert!(storage.delete(id).unwrap());
        assert!(storage.get(id).unwrap().is_none());
        assert!(!storage.delete(id).unwrap());
    }

    #[test]
    fn test_prune_older_than() {
        let storage = create_test_storage();
        let now = Utc::now();
        storage
            .insert(&entry_at("old", "https://example.com/1", now - Duration::days(40)))
            .unwrap();
        storage
            .insert(&entry_at("new", "https://example.com/2", now))
            .unwrap();

        assert_eq!(storage.prune_older_than(Duration::days(30)).unwrap(), 1);
        assert_eq!(storage.get_recent(10).unwrap()[0].title, "new");
    }

    #[test]
    fn test_prune_keep_recent() {
        let storage = create_test_storage();
        let now = Utc::now();
        for i in 0..10 {
            storage
                .insert(&entry_at(
                    &format!("Entry {i}"),
                    &format!("https://example.com/{i}"),
                    now - Duration::minutes(10 - i),
                ))
                .unwrap();
        }

        assert_eq!(storage.prune_keep_recent(4).unwrap(), 6);
        let remaining = storage.get_recent(10).unwrap();
        assert_eq!(remaining.len(), 4);
        assert_eq!(remaining[3].title, "Entry 6");
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_entries, 0);
        assert!(stats.by_source.is_empty());
        assert!(stats.oldest_entry.is_none());

        storage.insert(&entry("a", "https://example.com/1")).unwrap();
        storage.insert(&entry("b", "https://example.com/2")).unwrap();
        storage
            .insert(&Entry::new(SourceKind::Web, "s", "c", "https://example.com/3"))
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(
            stats.by_source,
            vec![(SourceKind::Rss, 2), (SourceKind::Web, 1)]
        );
        assert!(stats.oldest_entry.unwrap() <= stats.newest_entry.unwrap());
    }

    #[test]
    fn test_open_file_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("entries.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage.insert(&entry("kept", "https://example.com/k")).unwrap();
            assert_eq!(storage.path(), path);
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.stats().unwrap().database_size_bytes > 0);
    }

    #[test]
    fn test_export_and_load_json() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out").join("entries.json");

        let storage = create_test_storage();
        storage.insert(&entry("one", "https://example.com/1")).unwrap();
        storage.insert(&entry("two", "https://example.com/2")).unwrap();
        assert_eq!(storage.export_json(&file).unwrap(), 2);

        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("[\n"));

        let loaded = load_json(&file).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|e| e.id.is_none()));

        let other = create_test_storage();
        let report = other.insert_many(&loaded).unwrap();
        assert_eq!(report.inserted, 2);
    }

    #[test]
    fn test_load_json_missing_file() {
        let dir = TempDir::new().unwrap();
        let loaded = load_json(dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_json_malformed() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "{ not json").unwrap();
        assert!(matches!(load_json(&file), Err(Error::Json(_))));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
