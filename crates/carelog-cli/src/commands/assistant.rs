use clap::Subcommand;

use carelog_core::assistant::{ConversationEntry, Role};
use carelog_core::store::DocumentKind;
use carelog_core::Database;
use chrono::Utc;

#[derive(Subcommand)]
pub enum AssistantAction {
    /// Send a message and print the scripted reply
    Send {
        message: String,
        /// Speaker role: resident or caregiver
        #[arg(long, default_value = "resident")]
        role: String,
    },
    /// Print the logged transcript, newest first
    Transcript {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Delete the stored transcript
    Clear,
}

pub fn run(action: AssistantAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        AssistantAction::Send { message, role } => {
            let entry = ConversationEntry::new(Role::parse(&role), &message, now);
            db.insert(&entry)?;
            println!("{}", entry.reply);
        }
        AssistantAction::Transcript { limit } => {
            let mut entries: Vec<ConversationEntry> = db.load_all()?;
            entries.sort_by(|a, b| b.at.cmp(&a.at));
            entries.truncate(limit);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        AssistantAction::Clear => {
            let docs = db.list_by_type(ConversationEntry::DOC_TYPE)?;
            let count = docs.len();
            for doc in docs {
                db.remove(&doc.id, doc.revision)?;
            }
            println!("Transcript cleared ({count} entries)");
        }
    }
    Ok(())
}
