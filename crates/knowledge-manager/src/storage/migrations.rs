//! Schema versioning.
//!
//! The version lives in the `metadata` table. Each migration is a batch of
//! statements applied in its own transaction, in version order.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_ENTRIES_TABLE, CREATE_FETCHED_AT_INDEX, CREATE_FINGERPRINT_INDEX,
    CREATE_METADATA_TABLE, CREATE_SOURCE_INDEX,
};

/// Key of the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Ordered migrations: `(version, statements)`.
const MIGRATIONS: &[(i32, &[&str])] = &[(
    1,
    &[
        CREATE_ENTRIES_TABLE,
        CREATE_FETCHED_AT_INDEX,
        CREATE_FINGERPRINT_INDEX,
        CREATE_SOURCE_INDEX,
    ],
)];

/// The schema version this build writes.
#[must_use]
pub fn current_version() -> i32 {
    MIGRATIONS.last().map_or(0, |(v, _)| *v)
}

/// Bring the database schema up to [`current_version`].
///
/// # Errors
///
/// Returns an error if a migration fails or the stored version is newer
/// than this build understands.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = schema_version(conn)?;
    let target = current_version();
    if version > target {
        return Err(Error::DatabaseMigration {
            message: format!("database schema version {version} is newer than supported {target}"),
        });
    }

    for (migration, statements) in MIGRATIONS.iter().filter(|(v, _)| *v > version) {
        let tx = conn.unchecked_transaction()?;
        for statement in *statements {
            tx.execute(statement, []).map_err(|e| Error::DatabaseMigration {
                message: format!("migration {migration} failed: {e}"),
            })?;
        }
        set_schema_version(&tx, *migration)?;
        tx.commit()?;
        info!(version = migration, "Applied schema migration");
    }

    Ok(())
}

/// Stored schema version; 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value.map_or(Ok(0), |v| {
        v.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {v}"),
        })
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
