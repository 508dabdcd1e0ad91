//! Dashboard aggregation.
//!
//! Every pass here is a pure function of the entry slice (and `today`), so the
//! passes can run in any order over the same input.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Days, Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::journal_entry::{mood_label, JournalEntry};
use crate::journal_store::sort_newest_first;
use crate::sentiment::Sentiment;

pub const CALENDAR_CELLS: usize = 35;
pub const TREND_DAYS: u64 = 14;
/// Each tag occurrence counts as this many word occurrences.
pub const TAG_WEIGHT: usize = 3;
/// Tokens this short or shorter are ignored.
pub const MIN_WORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "should", "now",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_entries: usize,
    pub average_mood: f64,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// 0 when there is no entry, otherwise 1-5.
    pub mood_level: u8,
    pub tooltip: String,
    pub is_current_month: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub date: NaiveDate,
    pub label: String,
    /// `None` marks a day without entries; it is a gap, never interpolated.
    pub mood: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub text: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub recent_entries: usize,
    pub top_words: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        DashboardOptions {
            recent_entries: 6,
            top_words: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Local>,
    pub summary: SummaryStats,
    pub recent_entries: Vec<JournalEntry>,
    pub calendar: Vec<CalendarDay>,
    pub mood_trend: Vec<MoodPoint>,
    pub common_words: Vec<WordCount>,
}

impl DashboardSnapshot {
    pub fn build(entries: &[JournalEntry], now: DateTime<Local>, options: DashboardOptions) -> Self {
        let today = now.date_naive();
        let snapshot = DashboardSnapshot {
            generated_at: now,
            summary: summarize(entries),
            recent_entries: recent_entries(entries, options.recent_entries),
            calendar: calendar_grid(entries, today),
            mood_trend: mood_trend(entries, today),
            common_words: word_frequency(entries, options.top_words),
        };
        debug!(
            entries = entries.len(),
            words = snapshot.common_words.len(),
            "built dashboard snapshot"
        );
        snapshot
    }
}

pub fn summarize(entries: &[JournalEntry]) -> SummaryStats {
    if entries.is_empty() {
        return SummaryStats::default();
    }

    let sum: u32 = entries.iter().map(|e| u32::from(e.mood.value())).sum();
    let count_of = |s: Sentiment| entries.iter().filter(|e| e.sentiment == s).count();

    SummaryStats {
        total_entries: entries.len(),
        average_mood: round_to_tenth(f64::from(sum) / entries.len() as f64),
        positive: count_of(Sentiment::Positive),
        neutral: count_of(Sentiment::Neutral),
        negative: count_of(Sentiment::Negative),
    }
}

pub fn recent_entries(entries: &[JournalEntry], limit: usize) -> Vec<JournalEntry> {
    let mut sorted = entries.to_vec();
    sort_newest_first(&mut sorted);
    sorted.truncate(limit);
    sorted
}

/// Month grid for the month containing `today`, weeks starting on Sunday.
///
/// Leading days of the previous month complete the first week and days of the
/// next month pad the grid to [`CALENDAR_CELLS`]. A month that needs a sixth row
/// keeps all of its days and gets no padding.
///
/// Several entries on one day are folded with a running pairwise average in
/// entry order, so three or more entries do not give a true mean.
pub fn calendar_grid(entries: &[JournalEntry], today: NaiveDate) -> Vec<CalendarDay> {
    let mut by_day: HashMap<NaiveDate, f64> = HashMap::new();
    for entry in entries {
        let mood = f64::from(entry.mood.value());
        by_day
            .entry(entry.created_at.date_naive())
            .and_modify(|avg| *avg = (*avg + mood) / 2.0)
            .or_insert(mood);
    }

    let Some(first) = today.with_day(1) else {
        return Vec::new();
    };
    let leading = u64::from(first.weekday().num_days_from_sunday());
    let cells = CALENDAR_CELLS.max((leading + u64::from(days_in_month(first))) as usize);
    let Some(grid_start) = first.checked_sub_days(Days::new(leading)) else {
        return Vec::new();
    };

    grid_start
        .iter_days()
        .take(cells)
        .map(|date| {
            let mood_level = by_day.get(&date).map_or(0, |avg| avg.round() as u8);
            CalendarDay {
                date,
                mood_level,
                tooltip: date_tooltip(date, mood_level),
                is_current_month: date.year() == today.year() && date.month() == today.month(),
            }
        })
        .collect()
}

pub fn date_tooltip(date: NaiveDate, mood_level: u8) -> String {
    let day = date.format("%a, %b %-d");
    match mood_label(mood_level) {
        Some(label) => format!("{day} - Mood: {label} ({mood_level}/5)"),
        None => format!("{day} - No entry"),
    }
}

/// One point per day for the [`TREND_DAYS`] days ending on `today`.
pub fn mood_trend(entries: &[JournalEntry], today: NaiveDate) -> Vec<MoodPoint> {
    let Some(start) = today.checked_sub_days(Days::new(TREND_DAYS - 1)) else {
        return Vec::new();
    };

    let mut by_day: HashMap<NaiveDate, Vec<u8>> = HashMap::new();
    for entry in entries {
        let date = entry.created_at.date_naive();
        if date >= start && date <= today {
            by_day.entry(date).or_default().push(entry.mood.value());
        }
    }

    start
        .iter_days()
        .take(TREND_DAYS as usize)
        .map(|date| MoodPoint {
            date,
            label: date.format("%b %-d").to_string(),
            mood: by_day.get(&date).map(|moods| {
                let sum: u32 = moods.iter().map(|&m| u32::from(m)).sum();
                round_to_tenth(f64::from(sum) / moods.len() as f64)
            }),
        })
        .collect()
}

/// Most frequent meaningful words across all bodies, with tags weighted by [`TAG_WEIGHT`].
/// Ties keep first-seen order.
pub fn word_frequency(entries: &[JournalEntry], limit: usize) -> Vec<WordCount> {
    let mut counts: Vec<WordCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut bump = |word: String, by: usize| match index.get(&word) {
        Some(&i) => counts[i].count += by,
        None => {
            index.insert(word.clone(), counts.len());
            counts.push(WordCount { text: word, count: by });
        }
    };

    let text: String = entries
        .iter()
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    for word in text.split_whitespace() {
        if word.len() > MIN_WORD_LEN && !STOP_WORDS.contains(&word) {
            bump(word.to_string(), 1);
        }
    }
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        bump(tag.to_lowercase(), TAG_WEIGHT);
    }

    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// De-bounces dashboard recomputation.
#[derive(Debug)]
pub struct RefreshGate {
    min_interval: Duration,
    last_refresh: Option<Instant>,
}

impl RefreshGate {
    pub fn new(min_interval: Duration) -> Self {
        RefreshGate {
            min_interval,
            last_refresh: None,
        }
    }

    pub fn should_refresh(&mut self, force: bool) -> bool {
        self.should_refresh_at(force, Instant::now())
    }

    pub fn should_refresh_at(&mut self, force: bool, now: Instant) -> bool {
        let due = match self.last_refresh {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.min_interval,
        };
        if force || due {
            self.last_refresh = Some(now);
            true
        } else {
            debug!("dashboard refresh skipped, too soon since last refresh");
            false
        }
    }
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal_entry::MoodRating;
    use chrono::{NaiveTime, TimeZone};

    fn at(date: NaiveDate, hour: u32) -> DateTime<Local> {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        Local.from_local_datetime(&date.and_time(time)).earliest().unwrap()
    }

    fn entry(id: usize, content: &str, mood: u8, tags: &[&str], created_at: DateTime<Local>) -> JournalEntry {
        let mood = MoodRating::new(mood).unwrap();
        JournalEntry {
            id: id.to_string(),
            content: content.to_string(),
            mood,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_private: false,
            sentiment: Sentiment::from_mood(mood),
            created_at,
            modified_at: Some(created_at),
            user_id: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        assert_eq!(summarize(&[]), SummaryStats::default());
        let stats = summarize(&[]);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.average_mood, 0.0);
        assert_eq!(stats.positive + stats.neutral + stats.negative, 0);
    }

    #[test]
    fn summary_rounds_average_to_one_decimal() {
        let day = date(2026, 5, 10);
        let entries = vec![
            entry(1, "a", 5, &[], at(day, 9)),
            entry(2, "b", 4, &[], at(day, 10)),
            entry(3, "c", 2, &[], at(day, 11)),
        ];
        let stats = summarize(&entries);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.average_mood, 3.7);
        assert_eq!((stats.positive, stats.neutral, stats.negative), (2, 0, 1));
    }

    #[test]
    fn calendar_averages_pairwise() {
        let today = date(2026, 10, 19);
        let entries = vec![
            entry(1, "x", 2, &[], at(today, 8)),
            entry(2, "y", 4, &[], at(today, 20)),
        ];
        let grid = calendar_grid(&entries, today);
        let cell = grid.iter().find(|d| d.date == today).unwrap();
        assert_eq!(cell.mood_level, 3);
        assert_eq!(cell.tooltip, "Mon, Oct 19 - Mood: Neutral (3/5)");
    }

    #[test]
    fn calendar_pairwise_average_depends_on_order() {
        let today = date(2026, 10, 19);
        // ((1 + 1) / 2 + 5) / 2 = 3, a true mean would be 2.33
        let entries = vec![
            entry(1, "x", 1, &[], at(today, 8)),
            entry(2, "y", 1, &[], at(today, 9)),
            entry(3, "z", 5, &[], at(today, 10)),
        ];
        let grid = calendar_grid(&entries, today);
        assert_eq!(grid.iter().find(|d| d.date == today).unwrap().mood_level, 3);
    }

    #[test]
    fn calendar_pads_to_35_cells() {
        // October 2026 starts on a Thursday: 4 leading + 31 days
        let grid = calendar_grid(&[], date(2026, 10, 1));
        assert_eq!(grid.len(), CALENDAR_CELLS);
        assert_eq!(grid[0].date, date(2026, 9, 27));
        assert!(!grid[0].is_current_month);
        assert!(grid[4].is_current_month);
        assert_eq!(grid[34].date, date(2026, 10, 31));
        assert!(grid.iter().all(|d| d.mood_level == 0));
        assert_eq!(grid[4].tooltip, "Thu, Oct 1 - No entry");

        // February 2026 starts on a Sunday: no leading days, 7 trailing
        let grid = calendar_grid(&[], date(2026, 2, 14));
        assert_eq!(grid.len(), CALENDAR_CELLS);
        assert_eq!(grid[0].date, date(2026, 2, 1));
        assert_eq!(grid[34].date, date(2026, 3, 7));
        assert_eq!(grid.iter().filter(|d| d.is_current_month).count(), 28);
    }

    #[test]
    fn calendar_keeps_whole_month_when_it_needs_six_rows() {
        // August 2026 starts on a Saturday: 6 leading + 31 days
        let grid = calendar_grid(&[], date(2026, 8, 3));
        assert_eq!(grid.len(), 37);
        assert_eq!(grid.last().unwrap().date, date(2026, 8, 31));
    }

    #[test]
    fn trend_has_gaps_for_empty_days() {
        let today = date(2026, 10, 19);
        let entries = vec![
            entry(1, "a", 2, &[], at(today, 9)),
            entry(2, "b", 5, &[], at(today, 18)),
            entry(3, "c", 4, &[], at(date(2026, 10, 10), 12)),
            entry(4, "too old", 1, &[], at(date(2026, 10, 5), 12)),
        ];
        let trend = mood_trend(&entries, today);
        assert_eq!(trend.len(), 14);
        assert_eq!(trend[0].date, date(2026, 10, 6));
        assert_eq!(trend[13].label, "Oct 19");
        assert_eq!(trend[13].mood, Some(3.5));
        assert_eq!(trend[4].mood, Some(4.0));
        assert_eq!(trend.iter().filter(|p| p.mood.is_none()).count(), 12);
    }

    #[test]
    fn word_frequency_orders_by_count() {
        let now = at(date(2026, 10, 19), 12);
        let entries = vec![entry(1, "happy happy gloomy", 4, &[], now)];
        let words = word_frequency(&entries, 25);
        assert_eq!(
            words,
            vec![
                WordCount { text: "happy".into(), count: 2 },
                WordCount { text: "gloomy".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn word_frequency_drops_short_and_stop_words() {
        let now = at(date(2026, 10, 19), 12);
        let entries = vec![entry(1, "happy happy sad. Before THEIR walk, walk!", 4, &[], now)];
        let words = word_frequency(&entries, 25);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["happy", "walk"]);
    }

    #[test]
    fn tags_are_weighted() {
        let now = at(date(2026, 10, 19), 12);
        let entries = vec![
            entry(1, "work work work work", 3, &["Gym"], now),
            entry(2, "long meeting", 3, &["work"], now),
        ];
        let words = word_frequency(&entries, 2);
        assert_eq!(words[0], WordCount { text: "work".into(), count: 7 });
        assert_eq!(words[1], WordCount { text: "gym".into(), count: 3 });
    }

    #[test]
    fn recent_entries_are_newest_first_and_capped() {
        let base = date(2026, 10, 1);
        let entries: Vec<_> = (0..8)
            .map(|i| entry(i, "entry", 3, &[], at(base + Days::new(i as u64), 12)))
            .collect();
        let recent = recent_entries(&entries, 6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].id, "7");
        assert_eq!(recent[5].id, "2");
    }

    #[test]
    fn refresh_gate_debounces_unless_forced() {
        let mut gate = RefreshGate::new(Duration::from_secs(2));
        let start = Instant::now();
        assert!(gate.should_refresh_at(false, start));
        assert!(!gate.should_refresh_at(false, start + Duration::from_millis(500)));
        assert!(gate.should_refresh_at(true, start + Duration::from_millis(600)));
        assert!(!gate.should_refresh_at(false, start + Duration::from_millis(1500)));
        assert!(gate.should_refresh_at(false, start + Duration::from_secs(3)));
    }

    #[test]
    fn snapshot_runs_every_pass() {
        let now = at(date(2026, 10, 19), 12);
        let entries = vec![entry(1, "walking outside today", 4, &["outdoors"], now)];
        let snapshot = DashboardSnapshot::build(&entries, now, DashboardOptions::default());
        assert_eq!(snapshot.summary.total_entries, 1);
        assert_eq!(snapshot.recent_entries.len(), 1);
        assert_eq!(snapshot.calendar.len(), CALENDAR_CELLS);
        assert_eq!(snapshot.mood_trend.len(), 14);
        assert_eq!(snapshot.common_words[0].text, "outdoors");
        assert!(serde_json::to_string(&snapshot).is_ok());
    }
}
