//! Sample roster for demos and local testing: `attendd seed [--with-scans]`.

use anyhow::anyhow;
use chrono::{TimeDelta, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::clock;
use crate::config::Config;
use crate::db;
use crate::demo_mode::DemoMode;
use crate::status;
use crate::store;

pub const SAMPLE_STUDENTS: &[(&str, &str)] = &[
    ("Ahmad Fauzi", "A1B2C3D4"),
    ("Budi Santoso", "E5F6G7H8"),
    ("Citra Kirana", "I9J0K1L2"),
    ("Dewi Lestari", "M3N4O5P6"),
    ("Eko Prasetyo", "Q7R8S9T0"),
    ("Fajar Nugraha", "U1V2W3X4"),
    ("Gita Gutawa", "Y5Z6A7B8"),
    ("Hendra Wijaya", "C9D0E1F2"),
    ("Indah Permata", "G3H4I5J6"),
    ("Joko Anwar", "K7L8M9N0"),
];

pub const SAMPLE_DEVICES: &[(&str, &str)] = &[
    ("GATE-01", "Main Gate Entrance"),
    ("GATE-02", "Back Gate Entrance"),
    ("LIB-01", "Library Entrance"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub students: i64,
    pub devices: i64,
    pub attendance: i64,
    pub on_time: i64,
    pub late: i64,
}

impl SeedSummary {
    pub fn to_json(self) -> serde_json::Value {
        json!({
            "students": self.students,
            "devices": self.devices,
            "attendance": self.attendance,
            "onTime": self.on_time,
            "late": self.late,
        })
    }
}

pub fn run(args: &[String]) -> anyhow::Result<()> {
    let mut with_scans = false;
    for arg in args {
        match arg.as_str() {
            "--with-scans" => with_scans = true,
            other => return Err(anyhow!("unknown seed option: {other}")),
        }
    }

    let config = Config::load()?;
    info!(path = %config.database_path.display(), "seeding database");
    let conn = db::open_db(&config.database_path)?;
    let summary = seed(&conn, with_scans)?;
    info!(
        students = summary.students,
        devices = summary.devices,
        attendance = summary.attendance,
        "seed complete"
    );
    println!("{}", summary.to_json());
    Ok(())
}

/// Inserts the sample roster (existing UIDs and device codes are left alone)
/// and, with `with_scans`, one scan per student for today between 06:30 and
/// 07:29 civil time.
pub fn seed(conn: &Connection, with_scans: bool) -> anyhow::Result<SeedSummary> {
    for (name, uid) in SAMPLE_STUDENTS {
        conn.execute(
            "INSERT INTO students(id, name, uid_rfid) VALUES(?, ?, ?)
             ON CONFLICT(uid_rfid) DO NOTHING",
            (Uuid::new_v4().to_string(), name, uid),
        )?;
    }
    for (code, name) in SAMPLE_DEVICES {
        conn.execute(
            "INSERT INTO devices(id, code, name) VALUES(?, ?, ?)
             ON CONFLICT(code) DO NOTHING",
            (Uuid::new_v4().to_string(), code, name),
        )?;
    }

    if with_scans {
        let first_tap = clock::civil_day_start(Utc::now()) + TimeDelta::minutes(6 * 60 + 30);
        let live = DemoMode::default();
        for (i, (_, uid)) in SAMPLE_STUDENTS.iter().enumerate() {
            let offset = (i as i64 * 7) % 60;
            let (device_code, _) = SAMPLE_DEVICES[i % SAMPLE_DEVICES.len()];
            store::record_scan(
                conn,
                uid,
                device_code,
                first_tap + TimeDelta::minutes(offset),
                |t| status::resolve_status(t, &live),
            )?;
        }
    }

    summarize(conn)
}

fn summarize(conn: &Connection) -> anyhow::Result<SeedSummary> {
    let count_status = |s: &str| -> anyhow::Result<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM attendance WHERE status = ?",
            [s],
            |r| r.get(0),
        )?)
    };
    Ok(SeedSummary {
        students: db::table_count(conn, "students")?,
        devices: db::table_count(conn, "devices")?,
        attendance: db::table_count(conn, "attendance")?,
        on_time: count_status("on_time")?,
        late: count_status("late")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{query_range, QueryRange};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_db(prefix: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!(
                "{}-{}",
                prefix,
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("clock")
                    .as_nanos()
            ))
            .join("attendance.sqlite3")
    }

    #[test]
    fn seeding_twice_does_not_duplicate_roster() {
        let conn = db::open_db(&temp_db("attendd-seed-idempotent")).expect("open db");
        let first = seed(&conn, false).expect("seed");
        let second = seed(&conn, false).expect("seed again");
        assert_eq!(first, second);
        assert_eq!(first.students, SAMPLE_STUDENTS.len() as i64);
        assert_eq!(first.devices, SAMPLE_DEVICES.len() as i64);
        assert_eq!(first.attendance, 0);
    }

    #[test]
    fn sample_scans_land_today_with_live_statuses() {
        let conn = db::open_db(&temp_db("attendd-seed-scans")).expect("open db");
        let summary = seed(&conn, true).expect("seed");
        assert_eq!(summary.attendance, SAMPLE_STUDENTS.len() as i64);
        assert_eq!(summary.on_time + summary.late, summary.attendance);

        let today = query_range(&conn, QueryRange::Today, Utc::now(), 100).expect("query");
        assert_eq!(today.len(), SAMPLE_STUDENTS.len());
        for rec in &today {
            let expected = if status::is_late_civil(&clock::to_civil(rec.scanned_at)) {
                status::AttendanceStatus::Late
            } else {
                status::AttendanceStatus::OnTime
            };
            assert_eq!(rec.status, expected);
            assert!(rec.device.is_some());
        }
    }
}
