use clap::Subcommand;

use carelog_core::export::adherence_to_csv;
use carelog_core::reposition::{RepositionEvent, RepositionPreference};
use carelog_core::stats::{compute_summary, SummarySnapshot};
use carelog_core::store::DocumentKind;
use carelog_core::{AdherenceAnalyzer, Database, Resident};
use chrono::{Duration, Utc};

/// Rows shown by default before `--full` expands the table.
const TOP_N: usize = 5;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Rolling-window adherence report (worst residents first)
    Adherence {
        /// Restrict to a single resident id
        #[arg(long)]
        resident: Option<String>,
        /// Show every row instead of the top risk rows
        #[arg(long)]
        full: bool,
        /// Window length in hours
        #[arg(long, default_value = "24")]
        hours: i64,
        /// Emit the dashboard CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },
    /// Facility-wide summary cards
    Summary,
}

/// Failed collection reads degrade to an empty table with a warning rather
/// than aborting the whole report.
fn load_or_empty<T: DocumentKind>(db: &Database, what: &str) -> Vec<T> {
    match db.load_all() {
        Ok(values) => values,
        Err(e) => {
            eprintln!("warning: failed to read {what}: {e}");
            Vec::new()
        }
    }
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        StatsAction::Adherence {
            resident,
            full,
            hours,
            csv,
        } => {
            if hours <= 0 {
                return Err("window must be a positive number of hours".into());
            }
            let residents: Vec<Resident> = load_or_empty(&db, "residents");
            let preferences: Vec<RepositionPreference> = load_or_empty(&db, "preferences");
            let events: Vec<RepositionEvent> = load_or_empty(&db, "events");

            let mut report = AdherenceAnalyzer::new().compute_report(
                &residents,
                &preferences,
                &events,
                now - Duration::hours(hours),
                now,
            );

            // Filtering and truncation are presentation choices layered on
            // the computed rows.
            if let Some(rid) = resident {
                report.rows.retain(|r| r.resident_id == rid);
            }
            if !full {
                report.rows.truncate(TOP_N);
            }
            report
                .trends
                .retain(|rid, _| report.rows.iter().any(|r| &r.resident_id == rid));

            if csv {
                println!("{}", adherence_to_csv(&report));
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        StatsAction::Summary => {
            let snapshot = SummarySnapshot::load(&db).unwrap_or_else(|e| {
                eprintln!("warning: failed to read snapshot: {e}");
                SummarySnapshot::default()
            });
            let summary = compute_summary(&snapshot, now);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            for (title, value) in summary.cards() {
                eprintln!("{title}: {value}");
            }
        }
    }
    Ok(())
}
