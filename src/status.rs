use std::fmt;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::demo_mode::DemoMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    OnTime,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTime => "on_time",
            Self::Late => "late",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "on_time" => Some(Self::OnTime),
            "late" => Some(Self::Late),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AttendanceStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AttendanceStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown status {s:?}").into()))
    }
}

/// The lateness cutoff, evaluated on civil (UTC+7) wall-clock time.
///
/// Late means hour 7 with minutes past zero, so 07:00:59 is on time and
/// 07:01:00 is late. Scans at 08:00 or later are *not* flagged.
// TODO: confirm with the school whether hours >= 8 should count as late.
pub fn is_late_civil(local: &DateTime<FixedOffset>) -> bool {
    local.hour() == 7 && local.minute() > 0
}

pub fn resolve_status(scanned_at: DateTime<Utc>, demo: &DemoMode) -> AttendanceStatus {
    if demo.is_enabled() {
        return demo.next_alternating_status();
    }
    if is_late_civil(&clock::to_civil(scanned_at)) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::OnTime
    }
}
