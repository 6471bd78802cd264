//! First-run demo dataset.

use chrono::Utc;

use crate::assistant::{ConversationEntry, Role};
use crate::careplan::CarePlan;
use crate::error::CoreError;
use crate::meal::Meal;
use crate::resident::{Mobility, Resident};
use crate::task::Task;

use super::database::Database;

/// Seed the demo dataset into an empty store.
///
/// A store that already holds any document is left untouched; returns the
/// number of documents inserted.
pub fn seed_demo(db: &Database) -> Result<usize, CoreError> {
    if db.count_documents()? > 0 {
        return Ok(0);
    }
    let now = Utc::now();
    let mut inserted = 0;

    let ama = Resident {
        id: "resident:1".to_string(),
        name: "Ama Mensah".to_string(),
        mobility: Mobility::Low,
        diet: "low-sodium".to_string(),
        allergies: vec!["shellfish".to_string()],
        created_at: now,
        updated_at: now,
    };
    let kwesi = Resident {
        id: "resident:2".to_string(),
        name: "Kwesi Boateng".to_string(),
        mobility: Mobility::Medium,
        diet: "diabetic".to_string(),
        allergies: vec!["fish".to_string()],
        created_at: now,
        updated_at: now,
    };
    db.insert(&ama)?;
    db.insert(&kwesi)?;
    inserted += 2;

    for (id, name, kcal, allergens) in [
        ("meal:1", "Jollof Rice", 650u32, vec![]),
        ("meal:2", "Light Soup", 350u32, vec!["fish".to_string()]),
    ] {
        db.insert(&Meal {
            id: id.to_string(),
            name: name.to_string(),
            kcal,
            allergens,
            served_at: now,
        })?;
        inserted += 1;
    }

    let mut t1 = Task::new(
        "Reposition Ama",
        Some("Nurse A".to_string()),
        Some("day".to_string()),
        Some(now),
        now,
    )?;
    t1.id = "task:1".to_string();
    let mut t2 = Task::new(
        "Check Kwesi BP",
        Some("Nurse B".to_string()),
        Some("evening".to_string()),
        Some(now),
        now,
    )?;
    t2.id = "task:2".to_string();
    t2.status = crate::task::TaskStatus::InProgress;
    db.insert(&t1)?;
    db.insert(&t2)?;
    inserted += 2;

    let mut log = ConversationEntry::new(Role::Resident, "I feel cold", now);
    log.id = "log:1".to_string();
    db.insert(&log)?;
    inserted += 1;

    let mut plan = CarePlan::new(&ama.id, "Turn schedule (q2h)", "q2h", now)?;
    plan.id = "cp:1".to_string();
    db.insert(&plan)?;
    inserted += 1;

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_only_an_empty_store() {
        let db = Database::open_memory().unwrap();
        let first = seed_demo(&db).unwrap();
        assert_eq!(first, 8);
        let again = seed_demo(&db).unwrap();
        assert_eq!(again, 0);
        assert_eq!(db.count_documents().unwrap(), 8);
    }

    #[test]
    fn seeded_residents_are_loadable() {
        let db = Database::open_memory().unwrap();
        seed_demo(&db).unwrap();
        let residents: Vec<Resident> = db.load_all().unwrap();
        assert_eq!(residents.len(), 2);
        assert!(residents.iter().any(|r| r.name == "Ama Mensah"));
    }
}
