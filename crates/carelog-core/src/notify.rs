//! Throttled repositioning reminders.
//!
//! Each tick classifies every tracked resident as overdue, due-soon, or ok
//! and emits a notification unless the same `(resident, status)` pair fired
//! within the cooldown. The two statuses throttle independently, so a
//! resident sliding from due-soon into overdue is notified again
//! immediately. Last-fired timestamps persist in the key-value port between
//! ticks (and between processes).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DatabaseError};
use crate::reposition::{latest_event_for, preference_for, RepositionEvent, RepositionPreference};
use crate::resident::Resident;
use crate::schedule::{classify, compute_due_status, DueClass};
use crate::store::{Database, KeyValueStore};

/// kv key holding the throttle map.
pub const THROTTLE_KEY: &str = "mNotifyThrottle";

/// Minimum minutes between repeat notifications for one (resident, status).
pub const RENOTIFY_COOLDOWN_MIN: i64 = 15;

/// Persisted map of `"<residentId>:<status>"` to last-fired epoch millis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrottleState {
    #[serde(flatten)]
    last_fired_ms: HashMap<String, i64>,
}

impl ThrottleState {
    /// Load from the kv port; a missing or corrupt entry reads as empty.
    pub fn load(kv: &dyn KeyValueStore) -> Result<Self, DatabaseError> {
        let Some(json) = kv.kv_get(THROTTLE_KEY)? else {
            return Ok(Self::default());
        };
        Ok(serde_json::from_str(&json).unwrap_or_default())
    }

    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        kv.kv_set(THROTTLE_KEY, &json)
    }

    fn key(resident_id: &str, class: DueClass) -> String {
        format!("{resident_id}:{}", class.as_str())
    }

    fn within_cooldown(&self, key: &str, now: DateTime<Utc>, cooldown_min: i64) -> bool {
        match self.last_fired_ms.get(key) {
            Some(last) => now.timestamp_millis() - last < cooldown_min * 60_000,
            None => false,
        }
    }

    fn mark(&mut self, key: String, now: DateTime<Utc>) {
        self.last_fired_ms.insert(key, now.timestamp_millis());
    }
}

/// A reminder ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub resident_id: String,
    pub resident_name: String,
    pub status: DueClass,
    pub minutes_until_due: i64,
    pub title: String,
    pub body: String,
}

/// Cooldown-enforced reminder emitter.
#[derive(Debug, Clone)]
pub struct NotificationThrottler {
    pub cooldown_min: i64,
}

impl Default for NotificationThrottler {
    fn default() -> Self {
        Self {
            cooldown_min: RENOTIFY_COOLDOWN_MIN,
        }
    }
}

impl NotificationThrottler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick over an in-memory snapshot, mutating the throttle map.
    ///
    /// Pure apart from the map: the caller decides when to persist it.
    pub fn tick(
        &self,
        residents: &[Resident],
        preferences: &[RepositionPreference],
        events: &[RepositionEvent],
        throttle: &mut ThrottleState,
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        let mut out = Vec::new();
        for resident in residents {
            let Some(pref) = preference_for(preferences, &resident.id) else {
                continue;
            };
            let latest = latest_event_for(events, &resident.id).map(|e| e.at);
            let Ok(status) = compute_due_status(latest, pref.interval_min, now) else {
                // Invalid stored interval; skip rather than abort the tick.
                continue;
            };
            let class = classify(&status);
            if class == DueClass::Ok {
                continue;
            }

            let key = ThrottleState::key(&resident.id, class);
            if throttle.within_cooldown(&key, now, self.cooldown_min) {
                continue;
            }
            throttle.mark(key, now);
            out.push(build_notification(resident, class, status.minutes_until_due));
        }
        out
    }
}

fn build_notification(resident: &Resident, class: DueClass, minutes_until_due: i64) -> Notification {
    let (title, body) = match class {
        DueClass::Overdue => (
            format!("Reposition overdue: {}", resident.name),
            format!("Overdue by {} min", minutes_until_due.abs()),
        ),
        _ => (
            format!("Reposition due soon: {}", resident.name),
            format!("Due in {} min", minutes_until_due),
        ),
    };
    Notification {
        resident_id: resident.id.clone(),
        resident_name: resident.name.clone(),
        status: class,
        minutes_until_due,
        title,
        body,
    }
}

/// Load the snapshot and throttle state, run one tick, persist the state.
///
/// This is the driver entry point invoked once per poll cadence; the next
/// tick is only armed after this returns, so ticks never overlap.
pub fn run_tick(db: &Database, now: DateTime<Utc>) -> Result<Vec<Notification>, CoreError> {
    let residents: Vec<Resident> = db.load_all()?;
    let preferences: Vec<RepositionPreference> = db.load_all()?;
    let events: Vec<RepositionEvent> = db.load_all()?;

    let mut throttle = ThrottleState::load(db)?;
    let notifications =
        NotificationThrottler::new().tick(&residents, &preferences, &events, &mut throttle, now);
    if !notifications.is_empty() {
        throttle.save(db)?;
    }
    Ok(notifications)
}
