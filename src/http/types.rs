use serde::{Deserialize, Serialize};

use crate::clock;
use crate::config::Config;
use crate::demo_mode::DemoMode;
use crate::pool::DbPool;
use crate::status::AttendanceStatus;
use crate::store::AttendanceRecord;

pub struct AppState {
    pub config: Config,
    pub pool: DbPool,
    pub demo_mode: DemoMode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub device_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub name: String,
    pub status: AttendanceStatus,
    pub timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub id: String,
    pub name: String,
    pub uid: String,
    pub timestamp: String,
    pub status: AttendanceStatus,
    pub device_id: String,
}

impl From<&AttendanceRecord> for AttendanceRow {
    fn from(r: &AttendanceRecord) -> Self {
        Self {
            id: r.id.clone(),
            name: r.student.name.clone(),
            uid: r.student.uid.clone(),
            timestamp: clock::format_civil(r.scanned_at),
            status: r.status,
            device_id: r.device_label().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoModeResponse {
    pub demo_mode: bool,
}
