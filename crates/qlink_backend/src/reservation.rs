//! Job limits and reservations.
//!
//! Both are read-only snapshots fetched per call and never cached. The wire
//! sentinel `maximum_jobs == -1` ("no limit") is mapped to `None` here so it
//! cannot be mistaken for a real bound.

use chrono::{DateTime, Local};
use qlink_client::{JobLimitResponse, ReservationResponse};

/// Per-account job limit for a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLimit {
    /// Maximum number of concurrent active jobs; `None` means unlimited
    pub maximum_jobs: Option<i64>,

    /// Current number of active jobs
    pub active_jobs: i64,
}

impl JobLimit {
    /// Decode from the wire format, mapping the -1 sentinel to `None`
    pub fn from_api(api: JobLimitResponse) -> Self {
        Self {
            maximum_jobs: if api.maximum_jobs == -1 {
                None
            } else {
                Some(api.maximum_jobs)
            },
            active_jobs: api.active_jobs,
        }
    }

    /// Jobs that can still be submitted before hitting the limit
    pub fn remaining(&self) -> Option<i64> {
        self.maximum_jobs.map(|max| max - self.active_jobs)
    }
}

/// A backend reservation window, local time
#[derive(Debug, Clone)]
pub struct Reservation {
    /// Reservation start
    pub start: DateTime<Local>,

    /// Reservation end
    pub end: DateTime<Local>,

    /// Scheduling mode, only visible to the reservation owner
    pub mode: Option<String>,

    /// Reservation id, only visible to the reservation owner
    pub id: Option<String>,
}

impl Reservation {
    /// Decode from the wire format (UTC → local)
    pub fn from_api(api: ReservationResponse) -> Self {
        Self {
            start: api.start_datetime.with_timezone(&Local),
            end: api.end_datetime.with_timezone(&Local),
            mode: api.mode,
            id: api.id,
        }
    }

    /// Reservation duration in seconds
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}
