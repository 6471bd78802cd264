use clap::Subcommand;
use serde::Serialize;

use carelog_core::task::{self, Task, TaskStatus};
use carelog_core::Database;
use chrono::{DateTime, Utc};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        assignee: Option<String>,
        /// Shift label: day, evening, night, ...
        #[arg(long)]
        shift: Option<String>,
        /// Due time as RFC 3339, e.g. 2026-08-06T14:00:00Z
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks as JSON
    List {
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        shift: Option<String>,
    },
    /// Move a task to in_progress
    Start { id: String },
    /// Move a task to done
    Done { id: String },
    /// Record a nudge for a task
    Nudge { id: String },
}

#[derive(Serialize)]
struct TaskRow {
    #[serde(flatten)]
    task: Task,
    overdue: bool,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        TaskAction::Add {
            title,
            assignee,
            shift,
            due,
        } => {
            let due_at = match due {
                Some(text) => Some(parse_rfc3339(&text)?),
                None => None,
            };
            let task = Task::new(&title, assignee, shift, due_at, now)?;
            db.insert(&task)?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List { assignee, shift } => {
            let tasks: Vec<Task> = db.load_all()?;
            let rows: Vec<TaskRow> = tasks
                .into_iter()
                .filter(|t| match &assignee {
                    Some(a) => t
                        .assignee
                        .as_deref()
                        .is_some_and(|x| x.to_lowercase().contains(&a.to_lowercase())),
                    None => true,
                })
                .filter(|t| match &shift {
                    Some(s) => t.shift.as_deref().is_some_and(|x| x.eq_ignore_ascii_case(s)),
                    None => true,
                })
                .map(|task| TaskRow {
                    overdue: task.is_overdue(now),
                    task,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        TaskAction::Start { id } => {
            let task = task::set_status(&db, &id, TaskStatus::InProgress)?;
            println!("Task {}: {}", task.status.as_str(), task.id);
        }
        TaskAction::Done { id } => {
            let task = task::set_status(&db, &id, TaskStatus::Done)?;
            println!("Task {}: {}", task.status.as_str(), task.id);
        }
        TaskAction::Nudge { id } => {
            let event = task::nudge(&db, &id, now)?;
            println!("Nudge sent: {}", event.id);
        }
    }
    Ok(())
}

fn parse_rfc3339(text: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    Ok(DateTime::parse_from_rfc3339(text)
        .map_err(|e| format!("invalid due time '{text}': {e}"))?
        .with_timezone(&Utc))
}
