//! Persistent product cache, scan history log and flat key-value area.
//!
//! Backed by a DuckDB database file (or an in-memory database for tests).
//! The connection is opened lazily on first access and reused for the
//! lifetime of the [`ProductStore`]. Opening provisions the schema inside a
//! single transaction, so repeated opens of the same file are idempotent.

use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use duckdb::Connection as DuckDbConnection;
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::SCHEMA_VERSION;
use crate::error::{FoodGradeError, Result};
use crate::identifier::Identifier;
use crate::models::{ProductRecord, ScanHistoryEntry};
use crate::timing::now_millis;

const SCHEMA_SQL: &str = "\
    CREATE TABLE IF NOT EXISTS schema_meta (version BIGINT NOT NULL); \
    CREATE TABLE IF NOT EXISTS products ( \
        barcode VARCHAR PRIMARY KEY, \
        record VARCHAR NOT NULL, \
        cached_at BIGINT NOT NULL); \
    CREATE TABLE IF NOT EXISTS scan_history ( \
        scanned_at BIGINT PRIMARY KEY, \
        barcode VARCHAR NOT NULL, \
        record VARCHAR NOT NULL); \
    CREATE TABLE IF NOT EXISTS kv_store ( \
        entry_key VARCHAR PRIMARY KEY, \
        entry_value VARCHAR NOT NULL);";

const SELECT_VALUE_SQL: &str = "SELECT entry_value FROM kv_store WHERE entry_key = ?";

// ---------------------------------------------------------------------------
// ProductCache — the storage seam used by the resolver and the ledger
// ---------------------------------------------------------------------------

/// Keyed product storage plus a flat key-value area.
///
/// Implemented by [`ProductStore`]; tests wrap it to count accesses.
pub trait ProductCache {
    /// Cached record for `id`, or `None`. A missing key is never an error.
    fn get(&self, id: &Identifier) -> Result<Option<ProductRecord>>;

    /// Upsert `record`, stamping `cached_at`. Returns the stored copy.
    fn put(&self, record: &ProductRecord) -> Result<ProductRecord>;

    /// Append a timestamped history entry. No deduplication happens here.
    fn append_history(&self, record: &ProductRecord) -> Result<ScanHistoryEntry>;

    /// Store a freshly resolved record and log it in the history.
    ///
    /// Implementations backed by a transactional store should make the pair
    /// atomic; the default runs the two writes in sequence.
    fn cache_resolved(&self, record: &ProductRecord) -> Result<ProductRecord> {
        let stored = self.put(record)?;
        self.append_history(&stored)?;
        Ok(stored)
    }

    /// Stored value for `key`. A missing or unreadable value is `None`.
    fn get_value(&self, key: &str) -> Result<Option<Value>>;

    fn put_value(&self, key: &str, value: &Value) -> Result<()>;

    /// Atomic read-modify-write of one key. `f` receives the current value
    /// and returns the value to store, which is also returned.
    fn update_value(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> Result<Value>,
    ) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// ProductStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

/// DuckDB-backed [`ProductCache`].
pub struct ProductStore {
    location: Location,
    conn: OnceCell<DuckDbConnection>,
}

impl ProductStore {
    /// Store persisted at `path`. Nothing is opened until first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            conn: OnceCell::new(),
        }
    }

    /// Store that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: OnceCell::new(),
        }
    }

    /// Path of the database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Open the database now instead of on first access.
    pub fn open(&self) -> Result<()> {
        self.conn().map(|_| ())
    }

    /// Lazy connection, opened and provisioned on first use.
    fn conn(&self) -> Result<&DuckDbConnection> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn);
        }
        let conn = self.connect()?;
        Ok(self.conn.get_or_init(|| conn))
    }

    fn connect(&self) -> Result<DuckDbConnection> {
        let conn = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        FoodGradeError::StorageUnavailable(format!(
                            "cannot create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                info!("Opening product store at {}", path.display());
                DuckDbConnection::open(path)?
            }
            Location::Memory => {
                debug!("Opening in-memory product store");
                DuckDbConnection::open_in_memory()?
            }
        };
        transaction(&conn, provision)?;
        Ok(conn)
    }

    fn in_transaction<T>(&self, f: impl FnOnce(&DuckDbConnection) -> Result<T>) -> Result<T> {
        transaction(self.conn()?, f)
    }

    /// History entries, newest first, optionally limited.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<ScanHistoryEntry>> {
        let conn = self.conn()?;
        let sql = match limit {
            Some(n) => format!(
                "SELECT record, scanned_at FROM scan_history ORDER BY scanned_at DESC LIMIT {n}"
            ),
            None => "SELECT record, scanned_at FROM scan_history ORDER BY scanned_at DESC"
                .to_string(),
        };
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            let timestamp: i64 = row.get(1)?;
            match serde_json::from_str::<ProductRecord>(&json) {
                Ok(product) => entries.push(ScanHistoryEntry { product, timestamp }),
                Err(e) => warn!("Skipping unreadable history entry at {timestamp}: {e}"),
            }
        }
        Ok(entries)
    }

    pub fn product_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn schema_version(&self) -> Result<i64> {
        let version: i64 = self
            .conn()?
            .query_row("SELECT MAX(version) FROM schema_meta", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Delete all products, history and key-value data. The schema stays.
    pub fn clear(&self) -> Result<()> {
        self.in_transaction(|conn| {
            conn.execute_batch(
                "DELETE FROM products; DELETE FROM scan_history; DELETE FROM kv_store;",
            )?;
            Ok(())
        })
    }

    pub fn remove_value(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM kv_store WHERE entry_key = ?", duckdb::params![key])?;
        Ok(removed > 0)
    }
}

impl ProductCache for ProductStore {
    fn get(&self, id: &Identifier) -> Result<Option<ProductRecord>> {
        let conn = self.conn()?;
        let json = query_text(
            conn,
            "SELECT record FROM products WHERE barcode = ?",
            id.as_str(),
        )?;
        let Some(json) = json else {
            debug!("Cache miss for {id}");
            return Ok(None);
        };
        match serde_json::from_str::<ProductRecord>(&json) {
            Ok(record) => {
                debug!("Cache hit for {id}");
                Ok(Some(record))
            }
            Err(e) => {
                // A row we cannot read is as good as absent; drop it so the
                // next resolve repopulates it.
                warn!("Corrupt cached product {id}: {e} -- removing");
                conn.execute(
                    "DELETE FROM products WHERE barcode = ?",
                    duckdb::params![id.as_str()],
                )?;
                Ok(None)
            }
        }
    }

    fn put(&self, record: &ProductRecord) -> Result<ProductRecord> {
        self.in_transaction(|conn| upsert_product(conn, record))
    }

    fn append_history(&self, record: &ProductRecord) -> Result<ScanHistoryEntry> {
        self.in_transaction(|conn| insert_history(conn, record))
    }

    fn cache_resolved(&self, record: &ProductRecord) -> Result<ProductRecord> {
        self.in_transaction(|conn| {
            let stored = upsert_product(conn, record)?;
            insert_history(conn, &stored)?;
            Ok(stored)
        })
    }

    fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let json = query_text(self.conn()?, SELECT_VALUE_SQL, key)?;
        Ok(json.and_then(|s| decode_value(key, &s)))
    }

    fn put_value(&self, key: &str, value: &Value) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.in_transaction(|conn| write_value(conn, key, &json))
    }

    fn update_value(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> Result<Value>,
    ) -> Result<Value> {
        self.in_transaction(|conn| {
            let current = query_text(conn, SELECT_VALUE_SQL, key)?
                .and_then(|s| decode_value(key, &s));
            let next = f(current)?;
            write_value(conn, key, &serde_json::to_string(&next)?)?;
            Ok(next)
        })
    }
}

impl fmt::Display for ProductStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::File(path) => write!(f, "ProductStore({})", path.display()),
            Location::Memory => write!(f, "ProductStore(:memory:)"),
        }
    }
}

// ---------------------------------------------------------------------------
// SQL helpers
// ---------------------------------------------------------------------------

/// Run `f` between `BEGIN` and `COMMIT`, rolling back on any error.
fn transaction<T>(
    conn: &DuckDbConnection,
    f: impl FnOnce(&DuckDbConnection) -> Result<T>,
) -> Result<T> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    let result = f(conn).and_then(|value| {
        conn.execute_batch("COMMIT")?;
        Ok(value)
    });
    if result.is_err() {
        if let Err(e) = conn.execute_batch("ROLLBACK") {
            warn!("Rollback failed: {e}");
        }
    }
    result
}

fn provision(conn: &DuckDbConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    let existing: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_meta", [], |row| row.get(0))?;
    match existing {
        None => {
            conn.execute(
                "INSERT INTO schema_meta (version) VALUES (?)",
                duckdb::params![SCHEMA_VERSION],
            )?;
            info!("Provisioned product store schema v{SCHEMA_VERSION}");
            Ok(())
        }
        Some(version) if version > SCHEMA_VERSION => Err(FoodGradeError::StorageUnavailable(
            format!("store schema v{version} is newer than supported v{SCHEMA_VERSION}"),
        )),
        Some(_) => Ok(()),
    }
}

fn query_text(conn: &DuckDbConnection, sql: &str, param: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(duckdb::params![param])?;
    let text = match rows.next()? {
        Some(row) => Some(row.get::<_, String>(0)?),
        None => None,
    };
    Ok(text)
}

fn upsert_product(conn: &DuckDbConnection, record: &ProductRecord) -> Result<ProductRecord> {
    let cached_at = now_millis();
    let stored = ProductRecord {
        cached_at: Some(cached_at),
        ..record.clone()
    };
    let json = serde_json::to_string(&stored)?;
    conn.execute(
        "INSERT OR REPLACE INTO products (barcode, record, cached_at) VALUES (?, ?, ?)",
        duckdb::params![stored.barcode.as_str(), json, cached_at],
    )?;
    debug!("Cached product {}", stored.barcode);
    Ok(stored)
}

/// History is keyed by timestamp, so a second append within the same
/// millisecond is moved one past the latest key.
fn insert_history(conn: &DuckDbConnection, record: &ProductRecord) -> Result<ScanHistoryEntry> {
    let latest: i64 = conn.query_row(
        "SELECT COALESCE(MAX(scanned_at), 0) FROM scan_history",
        [],
        |row| row.get(0),
    )?;
    let timestamp = now_millis().max(latest + 1);
    conn.execute(
        "INSERT INTO scan_history (scanned_at, barcode, record) VALUES (?, ?, ?)",
        duckdb::params![timestamp, record.barcode.as_str(), serde_json::to_string(record)?],
    )?;
    Ok(ScanHistoryEntry {
        product: record.clone(),
        timestamp,
    })
}

/// A stored value that is not valid JSON reads as absent, like a corrupt
/// product row; the next write replaces it.
fn decode_value(key: &str, json: &str) -> Option<Value> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Corrupt stored value for {key}: {e} -- ignoring");
            None
        }
    }
}

fn write_value(conn: &DuckDbConnection, key: &str, json: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv_store (entry_key, entry_value) VALUES (?, ?)",
        duckdb::params![key, json],
    )?;
    Ok(())
}
