//! Application configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::dashboard::DashboardOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindmateConfig {
    /// Number of sample entries generated at startup
    #[serde(default = "default_sample_entries")]
    pub sample_entries: usize,

    /// Seed for sample data; random when unset
    #[serde(default)]
    pub sample_seed: Option<u64>,

    /// Minimum time between unforced dashboard refreshes
    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,

    /// Entries per page in the journal list
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Entries shown under "Recent" on the dashboard
    #[serde(default = "default_recent_entries")]
    pub recent_entries: usize,

    /// Length of the word frequency list
    #[serde(default = "default_top_words")]
    pub top_words: usize,

    /// Buffered journal change events per listener
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Log destination while the terminal UI is running
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_sample_entries() -> usize { 10 }
fn default_refresh_debounce_ms() -> u64 { 2000 }
fn default_page_size() -> usize { 10 }
fn default_recent_entries() -> usize { 6 }
fn default_top_words() -> usize { 25 }
fn default_event_capacity() -> usize { 16 }
fn default_log_file() -> PathBuf { PathBuf::from("mindmate.log") }
fn default_log_filter() -> String { "mindmate=info".to_string() }

impl Default for MindmateConfig {
    fn default() -> Self {
        Self {
            sample_entries: default_sample_entries(),
            sample_seed: None,
            refresh_debounce_ms: default_refresh_debounce_ms(),
            page_size: default_page_size(),
            recent_entries: default_recent_entries(),
            top_words: default_top_words(),
            event_capacity: default_event_capacity(),
            log_file: default_log_file(),
            log_filter: default_log_filter(),
        }
    }
}

impl MindmateConfig {
    /// Reads `path` as TOML, or returns defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            recent_entries: self.recent_entries,
            top_words: self.top_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MindmateConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, MindmateConfig::default());
        assert_eq!(config.refresh_debounce(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample_entries = 3\nsample_seed = 99\npage_size = 5").unwrap();

        let config = MindmateConfig::load(file.path()).unwrap();
        assert_eq!(config.sample_entries, 3);
        assert_eq!(config.sample_seed, Some(99));
        assert_eq!(config.page_size, 5);
        assert_eq!(config.top_words, 25);
        assert_eq!(config.log_filter, "mindmate=info");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = \"ten\"").unwrap();
        assert!(MindmateConfig::load(file.path()).is_err());
    }
}
