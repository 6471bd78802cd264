use clap::Subcommand;
use serde::Serialize;

use carelog_core::careplan::{self, CarePlan};
use carelog_core::schedule::{classify, DueClass, DueStatus};
use carelog_core::Database;
use chrono::Utc;

#[derive(Subcommand)]
pub enum CareplanAction {
    /// Add a care plan for a resident
    Add {
        resident_id: String,
        title: String,
        /// Frequency notation, e.g. q2h or q45m
        #[arg(long, default_value = "q2h")]
        frequency: String,
    },
    /// List care plans with due information
    List {
        /// Restrict to a single resident
        #[arg(long)]
        resident: Option<String>,
    },
    /// Record a completion
    Complete {
        plan_id: String,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Serialize)]
struct PlanRow {
    #[serde(flatten)]
    plan: CarePlan,
    status: Option<DueClass>,
    due: Option<DueStatus>,
}

pub fn run(action: CareplanAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        CareplanAction::Add {
            resident_id,
            title,
            frequency,
        } => {
            let plan = careplan::create(&db, &resident_id, &title, &frequency, now)?;
            println!("Care plan created: {}", plan.id);
        }
        CareplanAction::List { resident } => {
            let plans: Vec<CarePlan> = match &resident {
                Some(rid) => db.load_where("resident_id", rid)?,
                None => db.load_all()?,
            };
            let mut due_soon = 0usize;
            let mut overdue = 0usize;
            let rows: Vec<PlanRow> = plans
                .into_iter()
                .map(|plan| {
                    // A bad stored frequency renders without due info rather
                    // than failing the listing.
                    let due = plan.due_status(now).ok();
                    let status = due.as_ref().map(classify);
                    match status {
                        Some(DueClass::Overdue) => overdue += 1,
                        Some(DueClass::DueSoon) => due_soon += 1,
                        _ => {}
                    }
                    PlanRow { plan, status, due }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            eprintln!(
                "Showing {} item(s) | Due soon: {due_soon} | Overdue: {overdue}",
                rows.len()
            );
        }
        CareplanAction::Complete { plan_id, note } => {
            let event = careplan::complete(&db, &plan_id, note, now)?;
            println!("Care plan completion logged: {}", event.id);
        }
    }
    Ok(())
}
