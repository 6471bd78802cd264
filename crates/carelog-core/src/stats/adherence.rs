//! Rolling-window repositioning adherence analytics.
//!
//! For each resident with a configured interval the analyzer compares
//! expected against actual completions within a trailing window and scores
//! how many consecutive gaps landed within the interval plus a fixed grace.
//! Rows sort worst-first so at-risk residents surface. A companion trend
//! computation buckets in-window events for sparkline rendering.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reposition::{preference_for, RepositionEvent, RepositionPreference};
use crate::resident::Resident;
use crate::schedule::round_minutes;

/// Consecutive-gap grace tolerance in minutes. Fixed pending a product
/// decision on per-tenant configuration.
pub const ON_TIME_GRACE_MIN: i64 = 5;

/// Default trend resolution: 24 hourly buckets over a 24 h window.
pub const DEFAULT_TREND_BUCKETS: usize = 24;

/// Adherence figures for one resident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdherenceRow {
    pub resident_id: String,
    pub name: String,
    pub interval_min: i64,
    /// Occurrences the interval demands over the window (at least 1).
    pub expected: u32,
    /// In-window completions.
    pub actual: u32,
    /// actual/expected capped at 1.0; over-performing is not rewarded.
    pub adherence: f64,
    /// Percentage of consecutive gaps within interval + grace; 100 with
    /// fewer than two in-window events (vacuously on time).
    pub on_time_pct: f64,
}

/// Complete adherence report over one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdherenceReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Rows sorted ascending by adherence (worst first).
    pub rows: Vec<AdherenceRow>,
    /// Per-resident bucketed in-window event counts.
    pub trends: HashMap<String, Vec<u32>>,
}

impl AdherenceReport {
    fn empty(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            window_start,
            window_end,
            rows: Vec::new(),
            trends: HashMap::new(),
        }
    }
}

/// Analyzer for windowed adherence reports.
#[derive(Debug, Clone)]
pub struct AdherenceAnalyzer {
    /// Number of trend buckets the window is divided into.
    pub trend_buckets: usize,
}

impl Default for AdherenceAnalyzer {
    fn default() -> Self {
        Self {
            trend_buckets: DEFAULT_TREND_BUCKETS,
        }
    }
}

impl AdherenceAnalyzer {
    /// Create an analyzer with the default trend resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the adherence report for every resident with a preference.
    ///
    /// An inverted or empty window yields an empty report, not an error.
    /// Preferences whose resident is missing from the snapshot are silently
    /// skipped, as are non-positive stored intervals.
    pub fn compute_report(
        &self,
        residents: &[Resident],
        preferences: &[RepositionPreference],
        events: &[RepositionEvent],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> AdherenceReport {
        if window_end <= window_start {
            return AdherenceReport::empty(window_start, window_end);
        }
        let window_ms = (window_end - window_start).num_milliseconds();

        let mut rows = Vec::new();
        let mut trends = HashMap::new();

        for resident in residents {
            let Some(pref) = preference_for(preferences, &resident.id) else {
                continue;
            };
            if pref.interval_min <= 0 {
                continue;
            }

            let mut times: Vec<DateTime<Utc>> = events
                .iter()
                .filter(|e| {
                    e.resident_id == resident.id
                        && e.at >= window_start
                        && e.at <= window_end
                })
                .map(|e| e.at)
                .collect();
            times.sort();

            let interval_ms = pref.interval_min * 60_000;
            let expected = ((window_ms + interval_ms - 1) / interval_ms).max(1) as u32;
            let actual = times.len() as u32;
            let adherence = (f64::from(actual) / f64::from(expected)).min(1.0);

            let on_time_pct = if times.len() < 2 {
                100.0
            } else {
                let on_time = times
                    .windows(2)
                    .filter(|pair| {
                        round_minutes(pair[1] - pair[0]) <= pref.interval_min + ON_TIME_GRACE_MIN
                    })
                    .count();
                on_time as f64 / (times.len() - 1) as f64 * 100.0
            };

            trends.insert(
                resident.id.clone(),
                self.bucket_counts(&times, window_start, window_end),
            );
            rows.push(AdherenceRow {
                resident_id: resident.id.clone(),
                name: resident.name.clone(),
                interval_min: pref.interval_min,
                expected,
                actual,
                adherence,
                on_time_pct,
            });
        }

        // Worst adherence first; name as tie-break for stable output.
        rows.sort_by(|a, b| {
            a.adherence
                .total_cmp(&b.adherence)
                .then_with(|| a.name.cmp(&b.name))
        });

        AdherenceReport {
            window_start,
            window_end,
            rows,
            trends,
        }
    }

    /// Bucket event timestamps into fixed-width counts across the window.
    /// Indices clamp into range, so an event exactly at `window_end` lands
    /// in the last bucket.
    fn bucket_counts(
        &self,
        times: &[DateTime<Utc>],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Vec<u32> {
        let buckets = self.trend_buckets.max(1);
        let mut counts = vec![0u32; buckets];
        let window_ms = (window_end - window_start).num_milliseconds();
        if window_ms <= 0 {
            return counts;
        }
        let bucket_ms = (window_ms / buckets as i64).max(1);
        for t in times {
            let offset_ms = (*t - window_start).num_milliseconds();
            let idx = (offset_ms / bucket_ms).clamp(0, buckets as i64 - 1) as usize;
            counts[idx] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resident::Mobility;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
    }

    fn resident(id: &str, name: &str) -> Resident {
        Resident {
            id: id.to_string(),
            name: name.to_string(),
            mobility: Mobility::Low,
            diet: String::new(),
            allergies: vec![],
            created_at: t0(),
            updated_at: t0(),
        }
    }

    fn pref(resident_id: &str, interval_min: i64) -> RepositionPreference {
        RepositionPreference {
            id: format!("rpref:{resident_id}"),
            resident_id: resident_id.to_string(),
            interval_min,
            updated_at: t0(),
        }
    }

    fn event(resident_id: &str, at: DateTime<Utc>) -> RepositionEvent {
        RepositionEvent {
            id: format!("repo:{resident_id}:{at}"),
            resident_id: resident_id.to_string(),
            at,
            guidance: None,
        }
    }

    #[test]
    fn six_hour_interval_over_24h_window() {
        // interval 360 over 24 h: expected 4; 3 events => adherence 0.75
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 360)];
        let events: Vec<_> = [2, 9, 16]
            .iter()
            .map(|h| event("r1", start + Duration::hours(*h)))
            .collect();

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &events, start, end);
        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.expected, 4);
        assert_eq!(row.actual, 3);
        assert!((row.adherence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn gap_beyond_grace_is_not_on_time() {
        // two events 70 min apart with interval 60 (grace 5): 70 > 65
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 60)];
        let events = vec![
            event("r1", start + Duration::minutes(60)),
            event("r1", start + Duration::minutes(130)),
        ];

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &events, start, end);
        assert_eq!(report.rows[0].on_time_pct, 0.0);
    }

    #[test]
    fn gap_within_grace_is_on_time() {
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 60)];
        let events = vec![
            event("r1", start + Duration::minutes(60)),
            event("r1", start + Duration::minutes(125)), // 65 = 60 + grace
        ];

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &events, start, end);
        assert_eq!(report.rows[0].on_time_pct, 100.0);
    }

    #[test]
    fn single_event_is_vacuously_on_time() {
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 120)];
        let events = vec![event("r1", start + Duration::hours(3))];

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &events, start, end);
        assert_eq!(report.rows[0].on_time_pct, 100.0);
    }

    #[test]
    fn zero_events_still_produces_a_row() {
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 120)];

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &[], start, end);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].adherence, 0.0);
        assert_eq!(report.rows[0].on_time_pct, 100.0);
    }

    #[test]
    fn rows_sort_worst_first() {
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah"), resident("r2", "Kwesi Boateng")];
        let prefs = vec![pref("r1", 120), pref("r2", 120)];
        // r1 gets many events, r2 none
        let events: Vec<_> = (0..12)
            .map(|h| event("r1", start + Duration::hours(h * 2)))
            .collect();

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &events, start, end);
        assert_eq!(report.rows[0].resident_id, "r2");
        assert_eq!(report.rows[1].resident_id, "r1");
    }

    #[test]
    fn inverted_window_is_empty_not_error() {
        let start = t0();
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 120)];
        let report =
            AdherenceAnalyzer::new().compute_report(&residents, &prefs, &[], start, start);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn preference_without_resident_is_skipped() {
        let start = t0();
        let end = start + Duration::hours(24);
        let prefs = vec![pref("ghost", 120)];
        let report = AdherenceAnalyzer::new().compute_report(&[], &prefs, &[], start, end);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn trend_buckets_clamp_and_count() {
        let start = t0();
        let end = start + Duration::hours(24);
        let residents = vec![resident("r1", "Ama Mensah")];
        let prefs = vec![pref("r1", 120)];
        let events = vec![
            event("r1", start),                          // bucket 0
            event("r1", start + Duration::minutes(90)),  // bucket 1
            event("r1", end),                            // clamped to bucket 23
        ];

        let report = AdherenceAnalyzer::new().compute_report(&residents, &prefs, &events, start, end);
        let trend = &report.trends["r1"];
        assert_eq!(trend.len(), 24);
        assert_eq!(trend[0], 1);
        assert_eq!(trend[1], 1);
        assert_eq!(trend[23], 1);
        assert_eq!(trend.iter().sum::<u32>(), 3);
    }

    proptest! {
        /// Adherence stays in [0, 1] and never decreases as in-window
        /// events are added.
        #[test]
        fn adherence_bounded_and_monotone(
            interval in 1i64..2_000,
            offsets in proptest::collection::vec(0i64..1_440, 0..40),
        ) {
            let start = t0();
            let end = start + Duration::hours(24);
            let residents = vec![resident("r1", "A")];
            let prefs = vec![pref("r1", interval)];

            let mut events = Vec::new();
            let mut prev = 0.0f64;
            let analyzer = AdherenceAnalyzer::new();
            for m in offsets {
                events.push(event("r1", start + Duration::minutes(m)));
                let report = analyzer.compute_report(&residents, &prefs, &events, start, end);
                let adherence = report.rows[0].adherence;
                prop_assert!((0.0..=1.0).contains(&adherence));
                prop_assert!(adherence >= prev - f64::EPSILON);
                prev = adherence;
            }
        }
    }
}
