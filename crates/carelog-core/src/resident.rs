//! Resident records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::store::DocumentKind;

/// Mobility level of a resident, used by repositioning guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mobility {
    Low,
    Medium,
    High,
}

impl Mobility {
    /// Parse a mobility level from a stored string, defaulting to `Low`.
    pub fn parse(s: &str) -> Mobility {
        match s.to_ascii_lowercase().as_str() {
            "medium" => Mobility::Medium,
            "high" => Mobility::High,
            _ => Mobility::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mobility::Low => "low",
            Mobility::Medium => "medium",
            Mobility::High => "high",
        }
    }
}

/// A person under care.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: String,
    pub name: String,
    pub mobility: Mobility,
    /// Dietary preference, free text ("low-sodium", "diabetic", ...).
    #[serde(default)]
    pub diet: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentKind for Resident {
    const DOC_TYPE: &'static str = "resident";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

impl Resident {
    /// Create a new resident record.
    ///
    /// # Errors
    /// Rejects an empty name.
    pub fn new(
        name: &str,
        mobility: Mobility,
        diet: &str,
        allergies: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: "name is required".to_string(),
            });
        }
        Ok(Self {
            id: format!("resident:{}", Uuid::new_v4()),
            name: name.to_string(),
            mobility,
            diet: diet.trim().to_string(),
            allergies,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Look up a resident by id within an in-memory snapshot.
pub fn find_by_id<'a>(residents: &'a [Resident], id: &str) -> Option<&'a Resident> {
    residents.iter().find(|r| r.id == id)
}
