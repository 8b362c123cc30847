use std::sync::atomic::{AtomicBool, Ordering};

use crate::status::AttendanceStatus;

pub const DEMO_MODE_KEY: &str = "demo_mode";

/// Process-wide demo switch plus the alternating status generator used while
/// it is on.
///
/// Both flags use relaxed atomics and nothing else: two toggles racing each
/// other may both report the same new value, and whichever persists last wins.
/// Toggling is an operator action, so that is acceptable here.
#[derive(Debug, Default)]
pub struct DemoMode {
    enabled: AtomicBool,
    alternator: AtomicBool,
}

impl DemoMode {
    /// Only the exact string `"true"` enables demo mode.
    pub fn initialize(persisted: &str) -> Self {
        Self {
            enabled: AtomicBool::new(persisted == "true"),
            alternator: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flips the switch and returns the new value. Persisting it is up to the caller.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip first, then read: a fresh generator yields on_time, late, on_time, ...
    pub fn next_alternating_status(&self) -> AttendanceStatus {
        let flag = !self.alternator.fetch_xor(true, Ordering::Relaxed);
        if flag {
            AttendanceStatus::OnTime
        } else {
            AttendanceStatus::Late
        }
    }

    /// Settings-table form of a flag value, e.g. the one `toggle` returned.
    pub fn persisted_value(enabled: bool) -> &'static str {
        if enabled {
            "true"
        } else {
            "false"
        }
    }
}
