use clap::Subcommand;
use serde::Serialize;

use carelog_core::guidance::{self, GuideFlow, GUIDE_STEPS};
use carelog_core::reposition::{
    self, latest_event_for, preference_for, RepositionEvent, RepositionPreference,
};
use carelog_core::schedule::{classify, compute_due_status, DueClass, DueStatus};
use carelog_core::{Database, Mobility, Resident};
use chrono::Utc;

use super::resident::split_list;

#[derive(Subcommand)]
pub enum RepositionAction {
    /// Set (or change) the reposition interval for a resident
    SetInterval {
        resident_id: String,
        /// Interval in minutes, must be positive
        minutes: i64,
    },
    /// Due status for one resident as JSON
    Status { resident_id: String },
    /// Log a completed reposition
    Complete {
        resident_id: String,
        #[arg(long, default_value = "Logged completion")]
        technique: String,
    },
    /// Rounds view: every tracked resident, most urgent first
    Rounds {
        /// Restrict to a single resident
        #[arg(long)]
        resident: Option<String>,
    },
    /// Technique recommendation from weight/mobility/pain
    Recommend {
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
        #[arg(long, default_value = "low")]
        mobility: String,
        /// Comma-separated pain points
        #[arg(long, default_value = "")]
        pain: String,
        /// Also log a completion for this resident with the guidance
        #[arg(long)]
        resident: Option<String>,
    },
    /// Step-by-step guided completion flow
    Guide {
        #[command(subcommand)]
        action: GuideAction,
    },
}

#[derive(Subcommand)]
pub enum GuideAction {
    /// Begin a flow for a resident (replaces any in-progress flow)
    Start { resident_id: String },
    /// Show the current step and its checks
    Show,
    /// Confirm a safety check on the current step
    Check {
        check_id: String,
        /// Unconfirm instead
        #[arg(long)]
        off: bool,
    },
    /// Advance to the next step
    Next,
    /// Step back
    Back,
    /// Finish the flow and log the completion event
    Complete,
}

#[derive(Serialize)]
struct RoundsRow<'a> {
    resident_id: &'a str,
    name: &'a str,
    mobility: Mobility,
    interval_min: i64,
    status: DueClass,
    #[serde(flatten)]
    due: DueStatus,
}

pub fn run(action: RepositionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        RepositionAction::SetInterval {
            resident_id,
            minutes,
        } => {
            let pref = reposition::upsert_preference(&db, &resident_id, minutes, now)?;
            println!(
                "Repositioning interval saved: {} every {} min",
                pref.resident_id, pref.interval_min
            );
        }
        RepositionAction::Status { resident_id } => {
            let preferences: Vec<RepositionPreference> = db.load_all()?;
            let Some(pref) = preference_for(&preferences, &resident_id) else {
                return Err("no interval set; use reposition set-interval first".into());
            };
            let events: Vec<RepositionEvent> = db.load_all()?;
            let latest = latest_event_for(&events, &resident_id).map(|e| e.at);
            let status = compute_due_status(latest, pref.interval_min, now)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        RepositionAction::Complete {
            resident_id,
            technique,
        } => {
            let event = reposition::log_event(
                &db,
                &resident_id,
                Some(guidance::Guidance {
                    technique,
                    steps: vec![],
                }),
                now,
            )?;
            println!("Reposition completion logged: {}", event.id);
        }
        RepositionAction::Rounds { resident } => {
            let residents: Vec<Resident> = db.load_all()?;
            let preferences: Vec<RepositionPreference> = db.load_all()?;
            let events: Vec<RepositionEvent> = db.load_all()?;

            let mut rows = Vec::new();
            for r in &residents {
                if let Some(filter) = &resident {
                    if &r.id != filter {
                        continue;
                    }
                }
                let Some(pref) = preference_for(&preferences, &r.id) else {
                    continue;
                };
                let latest = latest_event_for(&events, &r.id).map(|e| e.at);
                let Ok(due) = compute_due_status(latest, pref.interval_min, now) else {
                    continue;
                };
                rows.push(RoundsRow {
                    resident_id: &r.id,
                    name: &r.name,
                    mobility: r.mobility,
                    interval_min: pref.interval_min,
                    status: classify(&due),
                    due,
                });
            }
            // Overdue first, then most urgent (smallest minutes) at the top.
            rows.sort_by(|a, b| {
                b.due
                    .overdue
                    .cmp(&a.due.overdue)
                    .then(a.due.minutes_until_due.cmp(&b.due.minutes_until_due))
            });
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        RepositionAction::Recommend {
            weight,
            mobility,
            pain,
            resident,
        } => {
            let guidance =
                guidance::recommend(weight, Mobility::parse(&mobility), &split_list(&pain));
            println!("{}", serde_json::to_string_pretty(&guidance)?);
            if let Some(resident_id) = resident {
                let event = reposition::log_event(&db, &resident_id, Some(guidance), now)?;
                println!("Reposition completion logged: {}", event.id);
            }
        }
        RepositionAction::Guide { action } => run_guide(&db, action)?,
    }
    Ok(())
}

fn run_guide(db: &Database, action: GuideAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    match action {
        GuideAction::Start { resident_id } => {
            if db.load::<Resident>(&resident_id)?.is_none() {
                return Err(format!("no resident with id {resident_id}").into());
            }
            let flow = GuideFlow::start(&resident_id);
            flow.save(db)?;
            print_step(&flow);
        }
        GuideAction::Show => {
            let flow = load_flow(db)?;
            print_step(&flow);
        }
        GuideAction::Check { check_id, off } => {
            let mut flow = load_flow(db)?;
            flow.set_check(&check_id, !off)?;
            flow.save(db)?;
            print_step(&flow);
        }
        GuideAction::Next => {
            let mut flow = load_flow(db)?;
            flow.advance()?;
            flow.save(db)?;
            print_step(&flow);
        }
        GuideAction::Back => {
            let mut flow = load_flow(db)?;
            flow.back();
            flow.save(db)?;
            print_step(&flow);
        }
        GuideAction::Complete => {
            let flow = load_flow(db)?;
            let guidance = flow.finish()?;
            let event = reposition::log_event(db, &flow.resident_id, Some(guidance), now)?;
            GuideFlow::clear(db)?;
            println!("Reposition completion logged: {}", event.id);
        }
    }
    Ok(())
}

fn load_flow(db: &Database) -> Result<GuideFlow, Box<dyn std::error::Error>> {
    GuideFlow::load(db)?
        .ok_or_else(|| "no guided flow in progress; use reposition guide start".into())
}

fn print_step(flow: &GuideFlow) {
    let step = flow.current_step();
    let total = GUIDE_STEPS.len();
    println!(
        "[{} of {total}] {}: {}",
        flow.step_index + 1,
        step.title,
        step.text
    );
    for check in step.checks {
        let mark = if flow.is_checked(check.id) { "x" } else { " " };
        println!("  [{mark}] {}: {}", check.id, check.label);
    }
    if flow.step_complete() {
        println!("All checks confirmed.");
    }
}
