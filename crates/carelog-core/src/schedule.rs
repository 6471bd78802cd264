//! Due-scheduling engine.
//!
//! Pure computation of "time until due" for one resident. The caller injects
//! "now", so results are deterministic and the boundary cases are directly
//! testable. Due/overdue is always relative to the most recent completion
//! event; there is no concept of multiple pending occurrences.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Residents within this many minutes of their next due time count as
/// "due soon" (shared with the notification throttler).
pub const DUE_SOON_HORIZON_MIN: i64 = 5;

/// Coarse classification of a due status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DueClass {
    Overdue,
    DueSoon,
    Ok,
}

impl DueClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueClass::Overdue => "overdue",
            DueClass::DueSoon => "dueSoon",
            DueClass::Ok => "ok",
        }
    }
}

/// Result of a due computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DueStatus {
    pub overdue: bool,
    /// Minutes until the next occurrence is due; negative when overdue.
    pub minutes_until_due: i64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Compute the due status for one resident.
///
/// With no completion history the resident is immediately due: a configured
/// interval without any events means "due now", never "unscheduled".
/// Otherwise `next_due = last + interval` and the remaining time is rounded
/// to whole minutes.
///
/// # Errors
/// Rejects a non-positive interval; callers validate intervals before
/// persisting a preference, so this only guards direct misuse.
pub fn compute_due_status(
    latest_event_at: Option<DateTime<Utc>>,
    interval_min: i64,
    now: DateTime<Utc>,
) -> Result<DueStatus, ValidationError> {
    if interval_min <= 0 {
        return Err(ValidationError::InvalidValue {
            field: "interval_min".to_string(),
            message: "interval must be a positive number of minutes".to_string(),
        });
    }

    let Some(last) = latest_event_at else {
        return Ok(DueStatus {
            overdue: true,
            minutes_until_due: 0,
            last_completed_at: None,
        });
    };

    let next_due = last + Duration::minutes(interval_min);
    let minutes_until_due = round_minutes(next_due - now);
    Ok(DueStatus {
        overdue: minutes_until_due < 0,
        minutes_until_due,
        last_completed_at: Some(last),
    })
}

/// Classify a due status for notification purposes.
pub fn classify(status: &DueStatus) -> DueClass {
    if status.overdue {
        DueClass::Overdue
    } else if status.minutes_until_due <= DUE_SOON_HORIZON_MIN {
        DueClass::DueSoon
    } else {
        DueClass::Ok
    }
}

/// Round a duration to whole minutes, half away from zero.
pub(crate) fn round_minutes(d: Duration) -> i64 {
    (d.num_seconds() as f64 / 60.0).round() as i64
}
