use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use crate::demo_mode::DEMO_MODE_KEY;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a connection with the per-connection pragmas. Does not touch the schema.
pub fn open_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
    Ok(conn)
}

pub fn open_db(db_path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = open_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            uid_rfid TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS devices(
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            device_id TEXT,
            scanned_at TEXT NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('on_time', 'late')),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(device_id) REFERENCES devices(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_scanned_at ON attendance(scanned_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS system_settings(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO system_settings(key, value) VALUES(?, 'false')",
        [DEMO_MODE_KEY],
    )?;

    Ok(())
}

pub fn settings_get(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM system_settings WHERE key = ?",
        [key],
        |r| r.get(0),
    )
    .optional()
}

pub fn settings_set(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO system_settings(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProbeInfo {
    pub sqlite_version: String,
    pub server_time: String,
}

/// Cheap round trip used at startup and by the health endpoint.
pub fn probe(conn: &Connection) -> rusqlite::Result<ProbeInfo> {
    conn.query_row(
        "SELECT sqlite_version(), strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        [],
        |r| {
            Ok(ProbeInfo {
                sqlite_version: r.get(0)?,
                server_time: r.get(1)?,
            })
        },
    )
}

pub fn table_count(conn: &Connection, table: &str) -> anyhow::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}
