use carelog_core::store::seed::seed_demo;
use carelog_core::Database;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let inserted = seed_demo(&db)?;
    if inserted == 0 {
        println!("Store is not empty; nothing seeded");
    } else {
        println!("Seeded {inserted} demo document(s)");
    }
    Ok(())
}
