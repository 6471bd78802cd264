use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "carelog", version, about = "CareLog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resident records
    Resident {
        #[command(subcommand)]
        action: commands::resident::ResidentAction,
    },
    /// Repositioning schedule, completions, and guidance
    Reposition {
        #[command(subcommand)]
        action: commands::reposition::RepositionAction,
    },
    /// Care plan management
    Careplan {
        #[command(subcommand)]
        action: commands::careplan::CareplanAction,
    },
    /// Staff task tracking
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Meals and feedback
    Meal {
        #[command(subcommand)]
        action: commands::meal::MealAction,
    },
    /// Scripted assistant
    Assistant {
        #[command(subcommand)]
        action: commands::assistant::AssistantAction,
    },
    /// Adherence analytics and summary
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Reminder ticks and the watch loop
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Seed the demo dataset into an empty store
    Seed,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Resident { action } => commands::resident::run(action),
        Commands::Reposition { action } => commands::reposition::run(action),
        Commands::Careplan { action } => commands::careplan::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Meal { action } => commands::meal::run(action),
        Commands::Assistant { action } => commands::assistant::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Seed => commands::seed::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
