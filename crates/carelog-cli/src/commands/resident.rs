use clap::Subcommand;

use carelog_core::{export, Database, Mobility, Resident};
use chrono::Utc;

#[derive(Subcommand)]
pub enum ResidentAction {
    /// Add a resident
    Add {
        name: String,
        /// Mobility level: low, medium, or high
        #[arg(long, default_value = "low")]
        mobility: String,
        /// Dietary preference
        #[arg(long, default_value = "")]
        diet: String,
        /// Comma-separated allergies
        #[arg(long, default_value = "")]
        allergies: String,
    },
    /// List residents as JSON
    List,
    /// Show one resident
    Show { id: String },
    /// Update fields of a resident
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mobility: Option<String>,
        #[arg(long)]
        diet: Option<String>,
        /// Comma-separated allergies (replaces the stored set)
        #[arg(long)]
        allergies: Option<String>,
    },
    /// Remove a resident
    Remove { id: String },
    /// Export residents to stdout
    Export {
        /// Output format: csv or json
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Import residents from a .csv or .json file
    Import { path: String },
}

pub fn run(action: ResidentAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        ResidentAction::Add {
            name,
            mobility,
            diet,
            allergies,
        } => {
            let resident = Resident::new(
                &name,
                Mobility::parse(&mobility),
                &diet,
                split_list(&allergies),
                now,
            )?;
            db.insert(&resident)?;
            println!("Resident created: {}", resident.id);
        }
        ResidentAction::List => {
            let residents: Vec<Resident> = db.load_all()?;
            println!("{}", serde_json::to_string_pretty(&residents)?);
        }
        ResidentAction::Show { id } => {
            let Some((resident, _)) = db.load::<Resident>(&id)? else {
                return Err(format!("no resident with id {id}").into());
            };
            println!("{}", serde_json::to_string_pretty(&resident)?);
        }
        ResidentAction::Update {
            id,
            name,
            mobility,
            diet,
            allergies,
        } => {
            let Some((mut resident, revision)) = db.load::<Resident>(&id)? else {
                return Err(format!("no resident with id {id}").into());
            };
            if let Some(name) = name {
                resident.name = name;
            }
            if let Some(mobility) = mobility {
                resident.mobility = Mobility::parse(&mobility);
            }
            if let Some(diet) = diet {
                resident.diet = diet;
            }
            if let Some(allergies) = allergies {
                resident.allergies = split_list(&allergies);
            }
            resident.updated_at = now;
            db.update(&resident, revision)?;
            println!("Resident saved: {}", resident.id);
        }
        ResidentAction::Remove { id } => {
            let Some((_, revision)) = db.load::<Resident>(&id)? else {
                return Err(format!("no resident with id {id}").into());
            };
            db.remove(&id, revision)?;
            println!("Resident deleted: {id}");
        }
        ResidentAction::Export { format } => {
            let residents: Vec<Resident> = db.load_all()?;
            match format.as_str() {
                "csv" => println!("{}", export::residents_to_csv(&residents)),
                "json" => println!("{}", export::residents_to_json(&residents)?),
                other => return Err(format!("unknown format '{other}' (csv or json)").into()),
            }
        }
        ResidentAction::Import { path } => {
            let text = std::fs::read_to_string(&path)?;
            let drafts = if path.to_ascii_lowercase().ends_with(".json") {
                export::parse_residents_json(&text)?
            } else {
                export::parse_residents_csv(&text)
            };
            let summary = export::import_residents(&db, &drafts, now)?;
            println!(
                "Imported {} resident(s). Skipped {}.",
                summary.imported, summary.skipped
            );
        }
    }
    Ok(())
}

pub(crate) fn split_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
