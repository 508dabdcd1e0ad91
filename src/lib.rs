//! MindMate: a terminal mood journal.
//!
//! Entries carry a 1-5 mood rating and a sentiment derived from it. The
//! dashboard aggregates them into summary counts, a month calendar, a
//! 14-day trend and a word cloud.

pub mod app;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod entry_filter;
pub mod error;
pub mod journal_entry;
pub mod journal_store;
pub mod sentiment;
pub mod session;
pub mod ui;
