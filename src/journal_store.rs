use chrono::{DateTime, Duration, Local};
use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::entry_filter::EntryFilter;
use crate::error::{MindmateError, MindmateResult};
use crate::journal_entry::{EntryDraft, JournalEntry, MoodRating};
use crate::sentiment::Sentiment;

const SAMPLE_TEXTS: [&str; 7] = [
    "Had a great day today! The weather was beautiful and I accomplished a lot of tasks at work.",
    "Feeling a bit down today. Nothing seems to be going right and I'm struggling to focus.",
    "Neutral day today. Nothing particularly good or bad happened, just the usual routine.",
    "Very excited about my upcoming vacation! Can't wait to relax and recharge.",
    "Stressed about the upcoming presentation. I hope I've prepared enough.",
    "Feeling grateful for my friends who supported me through a difficult time.",
    "Disappointed with the outcome of the project, but trying to see it as a learning experience.",
];

const SAMPLE_TAGS: [&[&str]; 7] = [
    &["work", "productivity", "happy"],
    &["stress", "mental health"],
    &["routine", "neutral"],
    &["vacation", "planning", "excited"],
    &["work", "anxiety", "presentation"],
    &["friends", "gratitude", "support"],
    &["work", "learning", "reflection"],
];

/// Sent once per successful mutation, in mutation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    Created(String),
    Updated(String),
    Deleted(String),
}

impl JournalEvent {
    pub fn entry_id(&self) -> &str {
        match self {
            JournalEvent::Created(id) | JournalEvent::Updated(id) | JournalEvent::Deleted(id) => id,
        }
    }
}

/// In-memory journal. Owned by the application and lost on exit.
pub struct JournalStore {
    entries: Vec<JournalEntry>,
    next_id: u64,
    events: broadcast::Sender<JournalEvent>,
}

impl JournalStore {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        JournalStore {
            entries: Vec::new(),
            next_id: 1,
            events,
        }
    }

    /// A store pre-filled with `count` sample entries, one per day going back from today.
    pub fn with_sample_entries<R: Rng>(count: usize, rng: &mut R, event_capacity: usize) -> Self {
        let mut store = JournalStore::new(event_capacity);
        let now = Local::now();

        for day in 0..count {
            let created_at = now - Duration::days(day as i64);
            let mood = MoodRating::new(rng.gen_range(MoodRating::MIN..=MoodRating::MAX))
                .unwrap_or_default();
            let index = rng.gen_range(0..SAMPLE_TEXTS.len());

            let mut tags: Vec<String> = SAMPLE_TAGS[index].iter().map(|t| t.to_string()).collect();
            tags.push(
                match Sentiment::from_mood(mood) {
                    Sentiment::Positive => "good day",
                    Sentiment::Negative => "bad day",
                    Sentiment::Neutral => "neutral day",
                }
                .to_string(),
            );

            let id = store.allocate_id();
            store.entries.push(JournalEntry {
                id,
                content: SAMPLE_TEXTS[index].to_string(),
                mood,
                tags,
                is_private: rng.gen_bool(0.3),
                sentiment: Sentiment::from_mood(mood),
                created_at,
                modified_at: Some(created_at),
                user_id: None,
            });
        }

        debug!(count = store.entries.len(), "seeded sample journal entries");
        store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JournalEvent> {
        self.events.subscribe()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, newest first.
    pub fn list(&self) -> Vec<JournalEntry> {
        let mut entries = self.entries.clone();
        sort_newest_first(&mut entries);
        entries
    }

    pub fn get(&self, id: &str) -> MindmateResult<JournalEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| MindmateError::NotFound(id.to_string()))
    }

    pub fn create(&mut self, draft: EntryDraft) -> MindmateResult<JournalEntry> {
        draft.validate()?;

        let now = Local::now();
        let entry = JournalEntry {
            id: self.allocate_id(),
            content: draft.content,
            mood: draft.mood,
            tags: draft.tags,
            is_private: draft.is_private,
            sentiment: Sentiment::from_mood(draft.mood),
            created_at: now,
            modified_at: Some(now),
            user_id: draft.user_id,
        };

        self.entries.push(entry.clone());
        debug!(id = %entry.id, mood = %entry.mood, "created journal entry");
        self.notify(JournalEvent::Created(entry.id.clone()));
        Ok(entry)
    }

    pub fn update(&mut self, id: &str, draft: EntryDraft) -> MindmateResult<JournalEntry> {
        let index = self.position(id)?;
        draft.validate()?;

        let now = Local::now();
        let entry = &mut self.entries[index];
        entry.content = draft.content;
        entry.mood = draft.mood;
        entry.tags = draft.tags;
        entry.is_private = draft.is_private;
        entry.sentiment = Sentiment::from_mood(draft.mood);
        entry.modified_at = Some(entry.modified_at.map_or(now, |previous| previous.max(now)));

        let updated = entry.clone();
        debug!(id = %updated.id, mood = %updated.mood, "updated journal entry");
        self.notify(JournalEvent::Updated(updated.id.clone()));
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> MindmateResult<()> {
        let index = self.position(id)?;
        self.entries.remove(index);
        debug!(id, "deleted journal entry");
        self.notify(JournalEvent::Deleted(id.to_string()));
        Ok(())
    }

    /// Entries created within `[start, end]`.
    pub fn filter_by_date_range(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Vec<JournalEntry> {
        self.filter(&EntryFilter::date_range(start, end))
    }

    pub fn filter_by_sentiment(&self, sentiment: Sentiment) -> Vec<JournalEntry> {
        self.filter(&EntryFilter::sentiment(sentiment))
    }

    pub fn filter_by_mood(&self, mood: MoodRating) -> Vec<JournalEntry> {
        self.filter(&EntryFilter::mood(mood))
    }

    pub fn search(&self, query: &str) -> Vec<JournalEntry> {
        self.filter(&EntryFilter::search(query))
    }

    pub fn filter(&self, filter: &EntryFilter) -> Vec<JournalEntry> {
        let found = filter.apply(&self.entries);
        debug!(criteria = %filter.describe(), found = found.len(), "filtered journal entries");
        found
    }

    fn position(&self, id: &str) -> MindmateResult<usize> {
        self.entries.iter().position(|e| e.id == id).ok_or_else(|| {
            warn!(id, "journal entry not found");
            MindmateError::NotFound(id.to_string())
        })
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    fn notify(&self, event: JournalEvent) {
        // no subscribers is fine
        if self.events.send(event).is_err() {
            debug!("journal change had no listeners");
        }
    }
}

pub fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
