//! Attendance records: append one row per scan, read back newest first.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::clock;
use crate::pool::PoolError;
use crate::status::AttendanceStatus;

/// Device code assumed when a scan arrives without one, and the label shown
/// for records that have no device attached.
pub const DEFAULT_DEVICE_CODE: &str = "GATE-01";

const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("student with uid {uid} is not registered")]
    StudentNotFound { uid: String },
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub uid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: String,
    pub student: Student,
    pub device: Option<Device>,
    pub scanned_at: DateTime<Utc>,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn device_label(&self) -> &str {
        self.device
            .as_ref()
            .map(|d| d.code.as_str())
            .unwrap_or(DEFAULT_DEVICE_CODE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRange {
    All,
    Today,
    Week,
}

impl QueryRange {
    /// Unrecognized values fall back to `All`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "today" => Self::Today,
            "week" => Self::Week,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
        }
    }

    /// Earliest `scanned_at` included in the range, if any.
    pub fn lower_bound(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Today => Some(clock::civil_day_start(now)),
            Self::Week => Some(now - TimeDelta::days(7)),
        }
    }
}

pub fn to_db_timestamp(t: DateTime<Utc>) -> String {
    t.format(DB_TIMESTAMP_FORMAT).to_string()
}

fn parse_db_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn find_student_by_uid(conn: &Connection, uid: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        "SELECT id, uid_rfid, name FROM students WHERE uid_rfid = ?",
        [uid],
        |r| {
            Ok(Student {
                id: r.get(0)?,
                uid: r.get(1)?,
                name: r.get(2)?,
            })
        },
    )
    .optional()
}

pub fn find_device_by_code(conn: &Connection, code: &str) -> rusqlite::Result<Option<Device>> {
    conn.query_row(
        "SELECT id, code, name FROM devices WHERE code = ?",
        [code],
        |r| {
            Ok(Device {
                id: r.get(0)?,
                code: r.get(1)?,
                name: r.get(2)?,
            })
        },
    )
    .optional()
}

/// Appends one attendance row for the student holding `student_uid`.
///
/// `resolve_status` runs only once the student is known, so a rejected scan
/// leaves no trace at all (not even a tick of the demo alternator). An
/// unknown `device_code` is stored as a record without a device.
pub fn record_scan<F>(
    conn: &Connection,
    student_uid: &str,
    device_code: &str,
    scanned_at: DateTime<Utc>,
    resolve_status: F,
) -> Result<AttendanceRecord, StoreError>
where
    F: FnOnce(DateTime<Utc>) -> AttendanceStatus,
{
    let student = find_student_by_uid(conn, student_uid)?.ok_or_else(|| {
        StoreError::StudentNotFound {
            uid: student_uid.to_string(),
        }
    })?;
    let device = find_device_by_code(conn, device_code)?;

    let scanned_at = scanned_at.trunc_subsecs(3);
    let status = resolve_status(scanned_at);
    let id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO attendance(id, student_id, device_id, scanned_at, status)
         VALUES(?, ?, ?, ?, ?)",
        (
            &id,
            &student.id,
            device.as_ref().map(|d| d.id.as_str()),
            to_db_timestamp(scanned_at),
            status,
        ),
    )?;

    Ok(AttendanceRecord {
        id,
        student,
        device,
        scanned_at,
        status,
    })
}

fn map_record(r: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    let scanned_raw: String = r.get(1)?;
    let device_id: Option<String> = r.get(6)?;
    let device = match device_id {
        Some(id) => Some(Device {
            id,
            code: r.get(7)?,
            name: r.get(8)?,
        }),
        None => None,
    };
    Ok(AttendanceRecord {
        id: r.get(0)?,
        scanned_at: parse_db_timestamp(1, &scanned_raw)?,
        status: r.get(2)?,
        student: Student {
            id: r.get(3)?,
            uid: r.get(4)?,
            name: r.get(5)?,
        },
        device,
    })
}

/// Records in `range` as of `now`, newest first, at most `limit` of them.
/// Records sharing a timestamp come back in reverse insertion order.
pub fn query_range(
    conn: &Connection,
    range: QueryRange,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<AttendanceRecord>, StoreError> {
    let lower = range.lower_bound(now).map(to_db_timestamp);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(
        "SELECT a.id, a.scanned_at, a.status,
                s.id, s.uid_rfid, s.name,
                d.id, d.code, d.name
         FROM attendance a
         JOIN students s ON s.id = a.student_id
         LEFT JOIN devices d ON d.id = a.device_id
         WHERE ?1 IS NULL OR a.scanned_at >= ?1
         ORDER BY a.scanned_at DESC, a.rowid DESC
         LIMIT ?2",
    )?;
    let records = stmt
        .query_map((lower, limit), map_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
