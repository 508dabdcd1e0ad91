use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{MindmateError, MindmateResult};
use crate::sentiment::Sentiment;

/// Shortest body the entry form accepts.
pub const MIN_CONTENT_LEN: usize = 3;

/// Self-reported mood, 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodRating(u8);

impl MoodRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> MindmateResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(MoodRating(value))
        } else {
            Err(MindmateError::Validation(format!(
                "mood rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = MoodRating> {
        (Self::MIN..=Self::MAX).map(MoodRating)
    }

    pub fn label(self) -> &'static str {
        mood_label(self.0).unwrap_or("Neutral")
    }

    pub fn description(self) -> &'static str {
        match self.0 {
            1 => "Having a very difficult day",
            2 => "Feeling down",
            3 => "Neutral - neither good nor bad",
            4 => "Feeling pretty good",
            _ => "Having a great day!",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self.0 {
            1 => "😞",
            2 => "😟",
            3 => "😐",
            4 => "🙂",
            _ => "😃",
        }
    }

    pub fn increment(self) -> Self {
        MoodRating((self.0 + 1).min(Self::MAX))
    }

    pub fn decrement(self) -> Self {
        MoodRating((self.0 - 1).max(Self::MIN))
    }
}

/// Label for a rounded mood level; `None` for 0 ("no entry") or anything out of range.
pub fn mood_label(level: u8) -> Option<&'static str> {
    match level {
        1 => Some("Very Bad"),
        2 => Some("Bad"),
        3 => Some("Neutral"),
        4 => Some("Good"),
        5 => Some("Very Good"),
        _ => None,
    }
}

impl Default for MoodRating {
    fn default() -> Self {
        MoodRating(3)
    }
}

impl TryFrom<u8> for MoodRating {
    type Error = MindmateError;

    fn try_from(value: u8) -> MindmateResult<Self> {
        MoodRating::new(value)
    }
}

impl From<MoodRating> for u8 {
    fn from(rating: MoodRating) -> u8 {
        rating.0
    }
}

impl fmt::Display for MoodRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub content: String,
    pub mood: MoodRating,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Local>,
    pub modified_at: Option<DateTime<Local>>,
    pub user_id: Option<String>,
}

impl JournalEntry {
    /// Case-insensitive substring match against the body and every tag.
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.content.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    pub fn first_line(&self) -> &str {
        self.content.lines().next().unwrap_or("")
    }

    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            content: self.content.clone(),
            mood: self.mood,
            tags: self.tags.clone(),
            is_private: self.is_private,
            user_id: self.user_id.clone(),
        }
    }
}

/// The user-editable part of an entry, as submitted by the entry form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub content: String,
    pub mood: MoodRating,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
    pub user_id: Option<String>,
}

impl EntryDraft {
    pub fn new(content: impl Into<String>, mood: MoodRating) -> Self {
        EntryDraft {
            content: content.into(),
            mood,
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    pub fn owned_by(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn validate(&self) -> MindmateResult<()> {
        if self.content.trim().is_empty() {
            return Err(MindmateError::Validation("entry text is required".into()));
        }
        if self.content.chars().count() < MIN_CONTENT_LEN {
            return Err(MindmateError::Validation(format!(
                "entry text must be at least {MIN_CONTENT_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Splits the comma-separated tag field, trimming pieces and dropping empty ones.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_rating_rejects_out_of_range() {
        assert!(MoodRating::new(0).is_err());
        assert!(MoodRating::new(6).is_err());
        for value in 1..=5 {
            assert_eq!(MoodRating::new(value).unwrap().value(), value);
        }
    }

    #[test]
    fn mood_rating_steps_are_clamped() {
        let low = MoodRating::new(1).unwrap();
        let high = MoodRating::new(5).unwrap();
        assert_eq!(low.decrement(), low);
        assert_eq!(high.increment(), high);
        assert_eq!(low.increment().value(), 2);
    }

    #[test]
    fn mood_rating_deserialization_is_checked() {
        let ok: MoodRating = serde_json::from_str("4").unwrap();
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<MoodRating>("9").is_err());
    }

    #[test]
    fn parse_tags_trims_and_drops_empty() {
        assert_eq!(
            parse_tags(" work, ,gratitude ,, mental health "),
            vec!["work", "gratitude", "mental health"]
        );
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn draft_validation() {
        let mood = MoodRating::default();
        assert!(EntryDraft::new("   ", mood).validate().is_err());
        assert!(EntryDraft::new("ok", mood).validate().is_err());
        assert!(EntryDraft::new("fine", mood).validate().is_ok());
    }
}
