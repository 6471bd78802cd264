use clap::Subcommand;

use carelog_core::notify::run_tick;
use carelog_core::{Config, Database};
use chrono::Utc;

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Run exactly one reminder tick and print what fired
    Tick,
    /// Poll on a fixed cadence, printing reminders as they fire
    Watch {
        /// Override the configured cadence in seconds
        #[arg(long)]
        cadence: Option<u64>,
    },
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        NotifyAction::Tick => {
            let db = Database::open()?;
            let fired = run_tick(&db, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&fired)?);
        }
        NotifyAction::Watch { cadence } => {
            let config = Config::load()?;
            if !config.notifications.enabled {
                println!("Notifications are disabled (notifications.enabled = false)");
                return Ok(());
            }
            let cadence_secs = cadence.unwrap_or(config.notifications.poll_cadence_secs).max(1);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            return runtime.block_on(watch_loop(cadence_secs));
        }
    }
    Ok(())
}

/// One tick per cadence; the next sleep is only armed after the previous
/// tick (including its persistence) finishes, so ticks never overlap.
/// Store failures are reported and retried on the next tick.
async fn watch_loop(cadence_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match Database::open().and_then(|db| run_tick(&db, Utc::now())) {
            Ok(fired) => {
                for n in &fired {
                    println!("{} | {}", n.title, n.body);
                }
            }
            Err(e) => eprintln!("tick failed (will retry): {e}"),
        }
        tokio::time::sleep(std::time::Duration::from_secs(cadence_secs)).await;
    }
}
