use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{BinaryRecord, RenameRecord, SymbolKind, SymbolRecord};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// Counts reported by [`ProjectDb::import_symbols`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    /// Rows skipped because the address or the name was already bound.
    pub skipped: usize,
}

/// SQLite-backed project database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for querying and updating records.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a project database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a binary record and return its row id.
    pub fn insert_binary(&self, record: &BinaryRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO binaries (name, path, arch, hash)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![record.name, record.path, record.arch, record.hash],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List all binaries (ordered by id).
    pub fn list_binaries(&self) -> DbResult<Vec<BinaryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, path, arch, hash
            FROM binaries
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(BinaryRecord {
                name: row.get(0)?,
                path: row.get(1)?,
                arch: row.get(2)?,
                hash: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Find a binary by name.
    pub fn find_binary(&self, name: &str) -> DbResult<Option<BinaryRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT name, path, arch, hash FROM binaries WHERE name = ?1",
                params![name],
                |row| {
                    Ok(BinaryRecord {
                        name: row.get(0)?,
                        path: row.get(1)?,
                        arch: row.get(2)?,
                        hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Insert a single symbol. Fails on an address or name conflict.
    pub fn insert_symbol(&self, binary: &str, symbol: &SymbolRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO symbols (binary, address, name, kind)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![binary, symbol.address as i64, symbol.name, symbol.kind.as_str()],
        )?;
        Ok(())
    }

    /// Bulk-insert symbols in one transaction, skipping any that collide by address or name.
    pub fn import_symbols(&self, binary: &str, symbols: &[SymbolRecord]) -> DbResult<ImportStats> {
        let tx = self.conn.unchecked_transaction()?;
        let mut stats = ImportStats::default();
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO symbols (binary, address, name, kind)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for sym in symbols {
                let changed =
                    stmt.execute(params![binary, sym.address as i64, sym.name, sym.kind.as_str()])?;
                if changed == 0 {
                    stats.skipped += 1;
                } else {
                    stats.inserted += 1;
                }
            }
        }
        tx.commit()?;
        Ok(stats)
    }

    /// List all symbols of a binary ordered by address.
    pub fn list_symbols(&self, binary: &str) -> DbResult<Vec<SymbolRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT address, name, kind
            FROM symbols
            WHERE binary = ?1
            ORDER BY address
            "#,
        )?;
        let rows = stmt.query_map(params![binary], |row| {
            let address: i64 = row.get(0)?;
            let kind: String = row.get(2)?;
            Ok(SymbolRecord {
                address: address as u64,
                name: row.get(1)?,
                kind: SymbolKind::from_db_str(&kind),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Name bound to `address`, if any.
    pub fn symbol_at(&self, binary: &str, address: u64) -> DbResult<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM symbols WHERE binary = ?1 AND address = ?2",
                params![binary, address as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Address bound to `name`, if any.
    pub fn address_of(&self, binary: &str, name: &str) -> DbResult<Option<u64>> {
        let address: Option<i64> = self
            .conn
            .query_row(
                "SELECT address FROM symbols WHERE binary = ?1 AND name = ?2",
                params![binary, name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(address.map(|a| a as u64))
    }

    /// Bind `name` to `address`, creating the symbol if the address is unnamed.
    ///
    /// Renamed symbols become `SymbolKind::User`.
    pub fn upsert_symbol_name(&self, binary: &str, address: u64, name: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO symbols (binary, address, name, kind)
            VALUES (?1, ?2, ?3, 'user')
            ON CONFLICT(binary, address) DO UPDATE SET name = excluded.name, kind = 'user'
            "#,
            params![binary, address as i64, name],
        )?;
        Ok(())
    }

    /// Append a rename to the history and return its row id.
    pub fn insert_rename(&self, record: &RenameRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO rename_history (binary, address, old_name, new_name, clipboard, method, renamed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.binary,
                record.address as i64,
                record.old_name,
                record.new_name,
                record.clipboard,
                record.method,
                record.renamed_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List renames, oldest first, optionally for one binary.
    pub fn list_renames(&self, binary: Option<&str>) -> DbResult<Vec<RenameRecord>> {
        fn map_rename(row: &rusqlite::Row<'_>) -> rusqlite::Result<RenameRecord> {
            let address: i64 = row.get(1)?;
            Ok(RenameRecord {
                binary: row.get(0)?,
                address: address as u64,
                old_name: row.get(2)?,
                new_name: row.get(3)?,
                clipboard: row.get(4)?,
                method: row.get(5)?,
                renamed_at: row.get(6)?,
            })
        }

        let base = r#"
            SELECT binary, address, old_name, new_name, clipboard, method, renamed_at
            FROM rename_history
        "#;
        let mut out = Vec::new();
        if let Some(bin) = binary {
            let mut stmt = self.conn.prepare(&format!("{base} WHERE binary = ?1 ORDER BY id"))?;
            for row in stmt.query_map(params![bin], map_rename)? {
                out.push(row?);
            }
        } else {
            let mut stmt = self.conn.prepare(&format!("{base} ORDER BY id"))?;
            for row in stmt.query_map([], map_rename)? {
                out.push(row?);
            }
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: binaries
/// - 2: symbols (one namespace per binary)
/// - 3: rename_history
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS binaries (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                arch TEXT,
                hash TEXT
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS symbols (
                binary  TEXT NOT NULL,
                address INTEGER NOT NULL,
                name    TEXT NOT NULL,
                kind    TEXT NOT NULL,
                PRIMARY KEY(binary, address),
                UNIQUE(binary, name)
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
        current_version = 2;
    }

    if current_version < 3 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS rename_history (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                binary     TEXT NOT NULL,
                address    INTEGER NOT NULL,
                old_name   TEXT,
                new_name   TEXT NOT NULL,
                clipboard  TEXT NOT NULL,
                method     TEXT NOT NULL,
                renamed_at TEXT NOT NULL
            );

            PRAGMA user_version = 3;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
