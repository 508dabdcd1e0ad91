use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MindmateError;
use crate::journal_entry::MoodRating;

/// Text shorter than this is not classified.
pub const MIN_CLASSIFY_LEN: usize = 5;

pub const POSITIVE_WORDS: [&str; 20] = [
    "happy", "good", "great", "excellent", "joy", "love", "beautiful", "pleased", "glad",
    "delighted", "wonderful", "success", "achieve", "accomplish", "peaceful", "relaxed", "calm",
    "hope", "confident", "proud",
];

pub const NEGATIVE_WORDS: [&str; 20] = [
    "sad", "bad", "terrible", "awful", "angry", "upset", "hate", "annoyed", "disappointed",
    "frustrated", "worried", "anxious", "stress", "unhappy", "regret", "fail", "miserable",
    "depressed", "fear", "hurt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    /// The authoritative mapping used whenever an entry is stored.
    pub fn from_mood(mood: MoodRating) -> Self {
        match mood.value() {
            0..=2 => Sentiment::Negative,
            3 => Sentiment::Neutral,
            _ => Sentiment::Positive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sentiment {
    type Err = MindmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            other => Err(MindmateError::Validation(format!("unknown sentiment '{other}'"))),
        }
    }
}

/// Keyword-count classification of free text. `None` when the text is too short.
pub fn classify_text(text: &str) -> Option<Sentiment> {
    if text.chars().count() < MIN_CLASSIFY_LEN {
        return None;
    }

    let lowered = text.to_lowercase();
    let mut positive = 0usize;
    let mut negative = 0usize;
    for word in lowered.split(|c: char| !is_word_char(c)) {
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }

    Some(match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Live feedback shown while an entry is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentPreview {
    pub detected: Option<Sentiment>,
    pub mood_sentiment: Sentiment,
    pub mismatch: bool,
}

impl SentimentPreview {
    pub fn new(text: &str, mood: MoodRating) -> Self {
        let detected = classify_text(text);
        let mood_sentiment = Sentiment::from_mood(mood);
        // unclassified text is compared as Neutral
        let mismatch = mood_sentiment != detected.unwrap_or(Sentiment::Neutral);
        SentimentPreview {
            detected,
            mood_sentiment,
            mismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood(value: u8) -> MoodRating {
        MoodRating::new(value).unwrap()
    }

    #[test]
    fn mood_thresholds() {
        assert_eq!(Sentiment::from_mood(mood(1)), Sentiment::Negative);
        assert_eq!(Sentiment::from_mood(mood(2)), Sentiment::Negative);
        assert_eq!(Sentiment::from_mood(mood(3)), Sentiment::Neutral);
        assert_eq!(Sentiment::from_mood(mood(4)), Sentiment::Positive);
        assert_eq!(Sentiment::from_mood(mood(5)), Sentiment::Positive);
    }

    #[test]
    fn short_text_is_not_classified() {
        assert_eq!(classify_text(""), None);
        assert_eq!(classify_text("sad"), None);
        assert_eq!(classify_text("good"), None);
    }

    #[test]
    fn keyword_majority_wins() {
        assert_eq!(
            classify_text("Had a great day, really happy but a bit worried"),
            Some(Sentiment::Positive)
        );
        assert_eq!(
            classify_text("Angry and upset. Such a terrible, awful day."),
            Some(Sentiment::Negative)
        );
    }

    #[test]
    fn ties_and_no_keywords_are_neutral() {
        assert_eq!(classify_text("good and bad in equal parts"), Some(Sentiment::Neutral));
        assert_eq!(classify_text("went to the shop"), Some(Sentiment::Neutral));
    }

    #[test]
    fn only_whole_words_count() {
        // "stressed" and "goodness" are not keywords
        assert_eq!(classify_text("stressed about goodness"), Some(Sentiment::Neutral));
        assert_eq!(classify_text("GOOD, good_day GOOD!"), Some(Sentiment::Positive));
    }

    #[test]
    fn preview_flags_mismatch() {
        let preview = SentimentPreview::new("I am so happy and proud today", mood(1));
        assert_eq!(preview.detected, Some(Sentiment::Positive));
        assert_eq!(preview.mood_sentiment, Sentiment::Negative);
        assert!(preview.mismatch);

        let preview = SentimentPreview::new("hi", mood(3));
        assert_eq!(preview.detected, None);
        assert!(!preview.mismatch);
    }

    #[test]
    fn parses_sentiment_names() {
        assert_eq!("Positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!(" neutral ".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
        assert!("meh".parse::<Sentiment>().is_err());
    }
}
