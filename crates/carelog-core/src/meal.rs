//! Meals and meal feedback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::store::DocumentKind;

/// Keyword-derived sentiment of a feedback comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// A served meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub kcal: u32,
    #[serde(default)]
    pub allergens: Vec<String>,
    pub served_at: DateTime<Utc>,
}

impl DocumentKind for Meal {
    const DOC_TYPE: &'static str = "meal";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

impl Meal {
    pub fn new(
        name: &str,
        kcal: u32,
        allergens: Vec<String>,
        served_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: "name is required".to_string(),
            });
        }
        Ok(Self {
            id: format!("meal:{}", Uuid::new_v4()),
            name: name.trim().to_string(),
            kcal,
            allergens,
            served_at,
        })
    }
}

/// Resident feedback on a meal, with keyword-derived sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealFeedback {
    pub id: String,
    pub meal_id: String,
    pub resident_id: String,
    /// Rating 1..=5.
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub sentiment: Sentiment,
    pub at: DateTime<Utc>,
}

impl DocumentKind for MealFeedback {
    const DOC_TYPE: &'static str = "meal_feedback";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

impl MealFeedback {
    /// Create feedback, deriving sentiment from the comment.
    ///
    /// # Errors
    /// Rejects ratings outside 1..=5.
    pub fn new(
        meal_id: &str,
        resident_id: &str,
        rating: u8,
        comment: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&rating) {
            return Err(ValidationError::InvalidValue {
                field: "rating".to_string(),
                message: "rating must be between 1 and 5".to_string(),
            });
        }
        Ok(Self {
            id: format!("feedback:{}", Uuid::new_v4()),
            meal_id: meal_id.to_string(),
            resident_id: resident_id.to_string(),
            rating,
            comment: comment.trim().to_string(),
            sentiment: crate::assistant::classify_sentiment(comment),
            at,
        })
    }
}
