//! Repositioning preferences and completion events.
//!
//! A preference holds the configured interval for one resident (at most one
//! active preference per resident, enforced by lookup-before-write plus a
//! deterministic document id). Events are immutable append-only facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::guidance::Guidance;
use crate::resident::Resident;
use crate::store::{Database, DocumentKind};

/// Configured reposition interval for one resident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositionPreference {
    pub id: String,
    pub resident_id: String,
    pub interval_min: i64,
    pub updated_at: DateTime<Utc>,
}

impl DocumentKind for RepositionPreference {
    const DOC_TYPE: &'static str = "reposition_pref";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

/// An immutable completed-reposition fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositionEvent {
    pub id: String,
    pub resident_id: String,
    pub at: DateTime<Utc>,
    /// Optional technique/guidance payload recorded at completion.
    #[serde(default)]
    pub guidance: Option<Guidance>,
}

impl DocumentKind for RepositionEvent {
    const DOC_TYPE: &'static str = "reposition";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

/// The most recent event for a resident (max by timestamp).
pub fn latest_event_for<'a>(
    events: &'a [RepositionEvent],
    resident_id: &str,
) -> Option<&'a RepositionEvent> {
    events
        .iter()
        .filter(|e| e.resident_id == resident_id)
        .max_by_key(|e| e.at)
}

/// The active preference for a resident, if configured.
pub fn preference_for<'a>(
    preferences: &'a [RepositionPreference],
    resident_id: &str,
) -> Option<&'a RepositionPreference> {
    preferences.iter().find(|p| p.resident_id == resident_id)
}

/// Create or update the preference for a resident.
///
/// The store has no native uniqueness constraint, so this looks up the
/// existing preference (and its revision) before writing.
///
/// # Errors
/// Rejects a non-positive interval; fails with NotFound when the resident
/// does not exist.
pub fn upsert_preference(
    db: &Database,
    resident_id: &str,
    interval_min: i64,
    now: DateTime<Utc>,
) -> Result<RepositionPreference, CoreError> {
    if interval_min <= 0 {
        return Err(ValidationError::InvalidValue {
            field: "interval_min".to_string(),
            message: "interval must be a positive number of minutes".to_string(),
        }
        .into());
    }
    require_resident(db, resident_id)?;

    let pref = RepositionPreference {
        id: format!("rpref:{resident_id}"),
        resident_id: resident_id.to_string(),
        interval_min,
        updated_at: now,
    };

    let existing = db.list_by_type_and_field(
        RepositionPreference::DOC_TYPE,
        "resident_id",
        resident_id,
    )?;
    match existing.first() {
        Some(doc) => db.update(&pref, doc.revision)?,
        None => db.insert(&pref)?,
    };
    Ok(pref)
}

/// Append a completion event for a resident.
///
/// # Errors
/// Fails with NotFound when the resident does not exist.
pub fn log_event(
    db: &Database,
    resident_id: &str,
    guidance: Option<Guidance>,
    at: DateTime<Utc>,
) -> Result<RepositionEvent, CoreError> {
    require_resident(db, resident_id)?;
    let event = RepositionEvent {
        id: format!("repo:{resident_id}:{}", Uuid::new_v4()),
        resident_id: resident_id.to_string(),
        at,
        guidance,
    };
    db.insert(&event)?;
    Ok(event)
}

fn require_resident(db: &Database, resident_id: &str) -> Result<(), CoreError> {
    match db.load::<Resident>(resident_id)? {
        Some(_) => Ok(()),
        None => Err(DatabaseError::NotFound {
            id: resident_id.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resident::Mobility;

    fn db_with_resident() -> (Database, String) {
        let db = Database::open_memory().unwrap();
        let r = Resident::new("Ama Mensah", Mobility::Low, "low-sodium", vec![], Utc::now())
            .unwrap();
        db.insert(&r).unwrap();
        (db, r.id)
    }

    #[test]
    fn upsert_rejects_non_positive_interval() {
        let (db, rid) = db_with_resident();
        for bad in [0, -30] {
            let err = upsert_preference(&db, &rid, bad, Utc::now()).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[test]
    fn upsert_is_unique_per_resident() {
        let (db, rid) = db_with_resident();
        upsert_preference(&db, &rid, 120, Utc::now()).unwrap();
        upsert_preference(&db, &rid, 90, Utc::now()).unwrap();

        let prefs: Vec<RepositionPreference> = db.load_all().unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].interval_min, 90);
    }

    #[test]
    fn upsert_requires_existing_resident() {
        let db = Database::open_memory().unwrap();
        let err = upsert_preference(&db, "resident:ghost", 60, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn latest_event_picks_max_timestamp() {
        let base = Utc::now();
        let mk = |rid: &str, offset_min: i64| RepositionEvent {
            id: format!("repo:{rid}:{offset_min}"),
            resident_id: rid.to_string(),
            at: base + chrono::Duration::minutes(offset_min),
            guidance: None,
        };
        let events = vec![mk("r1", 10), mk("r1", 40), mk("r2", 90), mk("r1", 25)];

        let latest = latest_event_for(&events, "r1").unwrap();
        assert_eq!(latest.at, base + chrono::Duration::minutes(40));
        assert!(latest_event_for(&events, "r3").is_none());
    }

    #[test]
    fn log_event_appends() {
        let (db, rid) = db_with_resident();
        log_event(&db, &rid, None, Utc::now()).unwrap();
        log_event(&db, &rid, None, Utc::now()).unwrap();
        let events: Vec<RepositionEvent> = db.load_all().unwrap();
        assert_eq!(events.len(), 2);
    }
}
