//! Scripted conversational assistant.
//!
//! A fixed keyword-to-reply lookup -- there is deliberately no NLU here.
//! The same keyword approach classifies meal-feedback comments into a
//! coarse sentiment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::meal::Sentiment;
use crate::store::DocumentKind;

/// Who is speaking to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Resident,
    Caregiver,
}

impl Role {
    /// Parse a role from a stored string, defaulting to `Resident`.
    pub fn parse(s: &str) -> Role {
        match s.to_ascii_lowercase().as_str() {
            "caregiver" => Role::Caregiver,
            _ => Role::Resident,
        }
    }
}

/// One logged exchange with the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub reply: String,
    pub at: DateTime<Utc>,
}

impl DocumentKind for ConversationEntry {
    const DOC_TYPE: &'static str = "conversation";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

impl ConversationEntry {
    /// Log an exchange: the scripted reply is derived from the message.
    pub fn new(role: Role, text: &str, at: DateTime<Utc>) -> Self {
        let reply = scripted_reply(text, role);
        Self {
            id: format!("log:{}", Uuid::new_v4()),
            role,
            text: text.to_string(),
            reply,
            at,
        }
    }
}

/// Fixed keyword-to-reply lookup.
pub fn scripted_reply(text: &str, role: Role) -> String {
    let t = text.to_lowercase();
    let reply = if t.contains("pain") || t.contains("hurt") {
        "I understand you feel pain. I will notify a caregiver and suggest a gentle turn to the left with pillow support."
    } else if t.contains("water") || t.contains("drink") {
        "I can request water for you. A caregiver will bring it shortly."
    } else if t.contains("cold") {
        "I will request a blanket and check room temperature settings."
    } else if t.contains("dizzy") || t.contains("dizziness") {
        "Please sit or lie down. I will alert staff to check vitals and ensure safety."
    } else {
        match role {
            Role::Resident => "Thank you. I will inform staff and log your request.",
            Role::Caregiver => "Acknowledged. I will log the note for this resident.",
        }
    };
    reply.to_string()
}

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "tasty", "delicious", "love", "loved", "enjoy", "enjoyed", "excellent",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "awful", "cold", "salty", "bland", "hate", "hated", "dislike", "dry", "stale",
];

/// Classify a feedback comment by fixed keyword lists; negative words win
/// over positive ones, anything else is neutral.
pub fn classify_sentiment(comment: &str) -> Sentiment {
    let c = comment.to_lowercase();
    let hit = |words: &[&str]| {
        c.split(|ch: char| !ch.is_alphanumeric())
            .any(|w| words.contains(&w))
    };
    if hit(NEGATIVE_WORDS) {
        Sentiment::Negative
    } else if hit(POSITIVE_WORDS) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}
