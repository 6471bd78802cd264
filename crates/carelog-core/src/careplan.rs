//! Care plans: recurring scheduled items beyond repositioning.
//!
//! Frequency uses compact notation (`q2h` = every 2 hours, `q45m` = every
//! 45 minutes); due computation reuses the scheduling engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::resident::Resident;
use crate::schedule::{compute_due_status, DueStatus};
use crate::store::{Database, DocumentKind};

/// A recurring care item for one resident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarePlan {
    pub id: String,
    pub resident_id: String,
    pub title: String,
    /// Compact frequency notation, e.g. `q2h`.
    pub frequency: String,
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DocumentKind for CarePlan {
    const DOC_TYPE: &'static str = "care_plan";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

/// Immutable completion note for a care plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarePlanEvent {
    pub id: String,
    pub care_plan_id: String,
    pub resident_id: String,
    #[serde(default)]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

impl DocumentKind for CarePlanEvent {
    const DOC_TYPE: &'static str = "care_plan_event";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

/// Parse a frequency string into minutes.
///
/// # Errors
/// Rejects anything that is not `q<N>h` or `q<N>m` with a positive N.
pub fn parse_frequency(s: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        field: "frequency".to_string(),
        message: format!("'{s}' is not a frequency (expected q<N>h or q<N>m)"),
    };

    let rest = s
        .trim()
        .to_ascii_lowercase()
        .strip_prefix('q')
        .map(str::to_string)
        .ok_or_else(invalid)?;
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let (digits, unit) = rest.split_at(rest.len().saturating_sub(1));
    let n: i64 = digits.parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }
    match unit {
        "h" => Ok(n * 60),
        "m" => Ok(n),
        _ => Err(invalid()),
    }
}

impl CarePlan {
    /// Create a care plan, validating the frequency notation.
    pub fn new(
        resident_id: &str,
        title: &str,
        frequency: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        parse_frequency(frequency)?;
        if title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                message: "title is required".to_string(),
            });
        }
        Ok(Self {
            id: format!("cp:{}", Uuid::new_v4()),
            resident_id: resident_id.to_string(),
            title: title.trim().to_string(),
            frequency: frequency.trim().to_ascii_lowercase(),
            last_completed_at: None,
            created_at: now,
        })
    }

    /// Due status of this plan at `now`, via the scheduling engine.
    pub fn due_status(&self, now: DateTime<Utc>) -> Result<DueStatus, ValidationError> {
        let interval_min = parse_frequency(&self.frequency)?;
        compute_due_status(self.last_completed_at, interval_min, now)
    }
}

/// Create a care plan for an existing resident.
pub fn create(
    db: &Database,
    resident_id: &str,
    title: &str,
    frequency: &str,
    now: DateTime<Utc>,
) -> Result<CarePlan, CoreError> {
    if db.load::<Resident>(resident_id)?.is_none() {
        return Err(DatabaseError::NotFound {
            id: resident_id.to_string(),
        }
        .into());
    }
    let plan = CarePlan::new(resident_id, title, frequency, now)?;
    db.insert(&plan)?;
    Ok(plan)
}

/// Record a completion: appends an immutable event and stamps the plan's
/// `last_completed_at`.
pub fn complete(
    db: &Database,
    plan_id: &str,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<CarePlanEvent, CoreError> {
    let Some((mut plan, revision)) = db.load::<CarePlan>(plan_id)? else {
        return Err(DatabaseError::NotFound {
            id: plan_id.to_string(),
        }
        .into());
    };

    let event = CarePlanEvent {
        id: format!("cp_event:{plan_id}:{}", Uuid::new_v4()),
        care_plan_id: plan_id.to_string(),
        resident_id: plan.resident_id.clone(),
        note,
        at: now,
    };
    db.insert(&event)?;

    plan.last_completed_at = Some(now);
    db.update(&plan, revision)?;
    Ok(event)
}
