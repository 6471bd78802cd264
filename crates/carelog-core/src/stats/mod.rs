//! Statistics module for CareLog
//!
//! This module provides analytics over the document snapshot: the rolling-
//! window repositioning adherence report and the facility-wide summary
//! cards.

mod adherence;
mod summary;

pub use adherence::{
    AdherenceAnalyzer, AdherenceReport, AdherenceRow, DEFAULT_TREND_BUCKETS, ON_TIME_GRACE_MIN,
};

pub use summary::{compute_summary, FacilitySummary, SummarySnapshot};
