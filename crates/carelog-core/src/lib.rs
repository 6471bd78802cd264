//! # CareLog Core Library
//!
//! This library provides the core business logic for CareLog, a local-first
//! care-facility logging and scheduling toolkit. It implements a CLI-first
//! philosophy where all operations are available via a standalone CLI binary;
//! any GUI shell would be a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Document Store**: SQLite-backed document + key-value storage with
//!   revision-checked updates and query-by-type
//! - **Scheduling Engine**: pure due/overdue computation for periodic care
//!   tasks; the caller supplies "now"
//! - **Adherence Aggregator**: rolling-window expected-vs-actual statistics
//!   with hourly trend buckets
//! - **Notification Throttler**: cooldown-enforced reminder emission keyed by
//!   resident and status
//!
//! ## Key Components
//!
//! - [`Database`]: document and key-value persistence
//! - [`compute_due_status`]: the due-scheduling primitive
//! - [`AdherenceAnalyzer`]: rolling-window adherence reporting
//! - [`NotificationThrottler`]: throttled reminder ticks

pub mod assistant;
pub mod careplan;
pub mod error;
pub mod export;
pub mod guidance;
pub mod meal;
pub mod notify;
pub mod reposition;
pub mod resident;
pub mod schedule;
pub mod stats;
pub mod store;
pub mod task;

pub use assistant::{scripted_reply, ConversationEntry, Role};
pub use careplan::{CarePlan, CarePlanEvent};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use guidance::{GuideFlow, Guidance};
pub use meal::{Meal, MealFeedback, Sentiment};
pub use notify::{Notification, NotificationThrottler, ThrottleState};
pub use reposition::{RepositionEvent, RepositionPreference};
pub use resident::{Mobility, Resident};
pub use schedule::{compute_due_status, DueClass, DueStatus};
pub use stats::{AdherenceAnalyzer, AdherenceReport, AdherenceRow, FacilitySummary};
pub use store::{Config, Database, Document, KeyValueStore};
pub use task::{Task, TaskEvent, TaskStatus};
