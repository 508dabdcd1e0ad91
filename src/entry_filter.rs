use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use crate::journal_entry::{JournalEntry, MoodRating};
use crate::sentiment::Sentiment;

/// Composed criteria used by the journal list. An unset criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub search: String,
    pub mood: Option<MoodRating>,
    pub sentiment: Option<Sentiment>,
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
}

impl EntryFilter {
    pub fn search(text: impl Into<String>) -> Self {
        EntryFilter {
            search: text.into(),
            ..Default::default()
        }
    }

    pub fn mood(mood: MoodRating) -> Self {
        EntryFilter {
            mood: Some(mood),
            ..Default::default()
        }
    }

    pub fn sentiment(sentiment: Sentiment) -> Self {
        EntryFilter {
            sentiment: Some(sentiment),
            ..Default::default()
        }
    }

    pub fn date_range(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        EntryFilter {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.mood.is_some()
            || self.sentiment.is_some()
            || self.start.is_some()
            || self.end.is_some()
    }

    pub fn reset(&mut self) {
        *self = EntryFilter::default();
    }

    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if self.mood.is_some_and(|m| m != entry.mood) {
            return false;
        }
        if self.sentiment.is_some_and(|s| s != entry.sentiment) {
            return false;
        }
        if self.start.is_some_and(|start| entry.created_at < start) {
            return false;
        }
        if self.end.is_some_and(|end| entry.created_at > end) {
            return false;
        }
        self.search.is_empty() || entry.matches_text(&self.search)
    }

    /// Keeps the input order.
    pub fn apply(&self, entries: &[JournalEntry]) -> Vec<JournalEntry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    /// Short human description of the active criteria, for the list header.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.search.is_empty() {
            parts.push(format!("text \"{}\"", self.search));
        }
        if let Some(mood) = self.mood {
            parts.push(format!("mood {mood}"));
        }
        if let Some(sentiment) = self.sentiment {
            parts.push(format!("sentiment {sentiment}"));
        }
        if let Some(start) = self.start {
            parts.push(format!("from {}", start.format("%Y-%m-%d")));
        }
        if let Some(end) = self.end {
            parts.push(format!("to {}", end.format("%Y-%m-%d")));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// First instant of `date` in local time.
pub fn start_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&date.and_time(NaiveTime::MIN)).earliest()
}

/// Last representable instant of `date` in local time.
pub fn end_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?;
    Local.from_local_datetime(&date.and_time(last)).latest()
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// Zero-based page slice; out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return items;
    }
    let start = page.saturating_mul(page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(id: &str, content: &str, mood: u8, tags: &[&str], created_at: DateTime<Local>) -> JournalEntry {
        let mood = MoodRating::new(mood).unwrap();
        JournalEntry {
            id: id.to_string(),
            content: content.to_string(),
            mood,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_private: false,
            sentiment: Sentiment::from_mood(mood),
            created_at,
            modified_at: None,
            user_id: None,
        }
    }

    fn sample() -> Vec<JournalEntry> {
        let now = Local::now();
        vec![
            entry("1", "Great walk in the park", 5, &["outdoors"], now - Duration::days(3)),
            entry("2", "Deadline stress at work", 2, &["Work"], now - Duration::days(1)),
            entry("3", "Quiet evening", 3, &[], now),
        ]
    }

    #[test]
    fn default_filter_matches_everything() {
        let entries = sample();
        let filter = EntryFilter::default();
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&entries), entries);
    }

    #[test]
    fn criteria_compose() {
        let entries = sample();
        let mut filter = EntryFilter::search("work");
        assert_eq!(filter.apply(&entries).len(), 1);

        filter.sentiment = Some(Sentiment::Positive);
        assert!(filter.apply(&entries).is_empty());

        filter.reset();
        filter.mood = Some(MoodRating::new(3).unwrap());
        let found = filter.apply(&entries);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "3");
    }

    #[test]
    fn date_range_is_inclusive() {
        let entries = sample();
        let filter = EntryFilter::date_range(entries[0].created_at, entries[1].created_at);
        let ids: Vec<_> = filter.apply(&entries).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn search_matches_tags_case_insensitively() {
        let entries = sample();
        let found = EntryFilter::search("OUTDOOR").apply(&entries);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let start = start_of_day(date).unwrap();
        let end = end_of_day(date).unwrap();
        assert_eq!(start.date_naive(), date);
        assert_eq!(end.date_naive(), date);
        assert!(start < end);
    }

    #[test]
    fn pagination() {
        let items: Vec<u32> = (0..23).collect();
        assert_eq!(page_count(items.len(), 10), 3);
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(paginate(&items, 0, 10), &items[0..10]);
        assert_eq!(paginate(&items, 2, 10), &items[20..23]);
        assert!(paginate(&items, 5, 10).is_empty());
    }
}
