use clap::Subcommand;

use carelog_core::meal::{Meal, MealFeedback};
use carelog_core::{Database, Resident};
use chrono::Utc;

use super::resident::split_list;

#[derive(Subcommand)]
pub enum MealAction {
    /// Record a served meal
    Add {
        name: String,
        #[arg(long, default_value = "0")]
        kcal: u32,
        /// Comma-separated allergens
        #[arg(long, default_value = "")]
        allergens: String,
    },
    /// List meals as JSON
    List,
    /// Record resident feedback on a meal
    Feedback {
        meal_id: String,
        resident_id: String,
        /// Rating 1..=5
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },
}

pub fn run(action: MealAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        MealAction::Add {
            name,
            kcal,
            allergens,
        } => {
            let meal = Meal::new(&name, kcal, split_list(&allergens), now)?;
            db.insert(&meal)?;
            println!("Meal created: {}", meal.id);
        }
        MealAction::List => {
            let meals: Vec<Meal> = db.load_all()?;
            println!("{}", serde_json::to_string_pretty(&meals)?);
        }
        MealAction::Feedback {
            meal_id,
            resident_id,
            rating,
            comment,
        } => {
            if db.load::<Meal>(&meal_id)?.is_none() {
                return Err(format!("no meal with id {meal_id}").into());
            }
            if db.load::<Resident>(&resident_id)?.is_none() {
                return Err(format!("no resident with id {resident_id}").into());
            }
            let feedback = MealFeedback::new(&meal_id, &resident_id, rating, &comment, now)?;
            db.insert(&feedback)?;
            println!(
                "Feedback recorded: {} ({})",
                feedback.id,
                serde_json::to_string(&feedback.sentiment)?
            );
        }
    }
    Ok(())
}
