use chrono::Local;
use color_eyre::Result;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config::MindmateConfig;
use crate::contact::{self, ContactMessage};
use crate::dashboard::{DashboardSnapshot, RefreshGate};
use crate::entry_filter::{end_of_day, page_count, paginate, start_of_day, EntryFilter};
use crate::journal_entry::{EntryDraft, MoodRating};
use crate::journal_store::{sort_newest_first, JournalEvent, JournalStore};
use crate::sentiment::Sentiment;
use crate::session::{validate_new_password, Session};
use crate::ui::{
    parse_date_input, today_input, AuthOutcome, Credentials, DashboardAction, DetailAction, ListAction, ListView,
    ProfileAction, UI,
};

/// Screens of the terminal UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    JournalList,
    EntryDetail(String),
    NewEntry,
    EditEntry(String),
    Profile,
    About,
    Contact,
}

impl Route {
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::Register | Route::About | Route::Contact)
    }
}

/// Where the user actually lands when asking for `route`.
pub fn guard(route: Route, session: &Session) -> Route {
    match route {
        route if route.requires_auth() && !session.is_authenticated() => Route::Login,
        Route::Login | Route::Register if session.is_authenticated() => Route::Dashboard,
        route => route,
    }
}

pub struct App {
    config: MindmateConfig,
    store: JournalStore,
    session: Session,
    changes: broadcast::Receiver<JournalEvent>,
    refresh_gate: RefreshGate,
    dashboard: DashboardSnapshot,
    filter: EntryFilter,
    page: usize,
    route: Route,
    status: Option<String>,
}

impl App {
    pub fn new(config: MindmateConfig, store: JournalStore) -> Self {
        let changes = store.subscribe();
        let mut refresh_gate = RefreshGate::new(config.refresh_debounce());
        refresh_gate.should_refresh(true);
        let dashboard = DashboardSnapshot::build(store.entries(), Local::now(), config.dashboard_options());

        App {
            config,
            store,
            session: Session::new(),
            changes,
            refresh_gate,
            dashboard,
            filter: EntryFilter::default(),
            page: 0,
            route: Route::Login,
            status: None,
        }
    }

    pub fn run(&mut self, ui: &mut UI) -> Result<()> {
        loop {
            self.route = guard(self.route.clone(), &self.session);
            if self.drain_changes() {
                self.refresh_dashboard(true);
            }

            let next = match self.route.clone() {
                Route::Login => self.auth(ui, false)?,
                Route::Register => self.auth(ui, true)?,
                Route::Dashboard => self.dashboard(ui)?,
                Route::JournalList => self.journal_list(ui)?,
                Route::EntryDetail(id) => self.entry_detail(ui, &id)?,
                Route::NewEntry => self.new_entry(ui)?,
                Route::EditEntry(id) => self.edit_entry(ui, &id)?,
                Route::Profile => self.profile(ui)?,
                Route::About => {
                    ui.about_screen()?;
                    Some(Route::Dashboard)
                }
                Route::Contact => self.contact(ui)?,
            };

            match next {
                Some(route) => {
                    debug!(from = ?self.route, to = ?route, "navigating");
                    self.route = route;
                }
                None => break,
            }
        }

        info!("leaving MindMate");
        Ok(())
    }

    fn auth(&mut self, ui: &mut UI, register: bool) -> Result<Option<Route>> {
        let credentials = match ui.auth_form(register, self.status.take().as_deref())? {
            AuthOutcome::Quit => return Ok(None),
            AuthOutcome::About => return Ok(Some(Route::About)),
            AuthOutcome::Switch => {
                return Ok(Some(if register { Route::Login } else { Route::Register }));
            }
            AuthOutcome::Submit(credentials) => credentials,
        };

        Ok(Some(self.complete_auth(&credentials, register)))
    }

    /// Registration checks the password rules before any session change.
    fn complete_auth(&mut self, credentials: &Credentials, register: bool) -> Route {
        let outcome = if register {
            validate_new_password(&credentials.password, &credentials.confirm)
                .and_then(|()| self.session.register(&credentials.username, &credentials.password))
        } else {
            self.session.login(&credentials.username, &credentials.password)
        };

        match outcome {
            Ok(_) if register => {
                self.status = Some("Account created. Welcome to MindMate!".to_string());
                Route::Dashboard
            }
            Ok(_) => Route::Dashboard,
            Err(e) => {
                self.status = Some(e.to_string());
                if register { Route::Register } else { Route::Login }
            }
        }
    }

    fn dashboard(&mut self, ui: &mut UI) -> Result<Option<Route>> {
        self.refresh_dashboard(false);
        let username = self
            .session
            .current_user()
            .map(|u| u.username.clone())
            .unwrap_or_default();

        let action = ui.dashboard_screen(&self.dashboard, &username, self.status.take().as_deref())?;
        Ok(match action {
            DashboardAction::Write => Some(Route::NewEntry),
            DashboardAction::Journal => Some(Route::JournalList),
            DashboardAction::Refresh => {
                self.refresh_dashboard(true);
                Some(Route::Dashboard)
            }
            DashboardAction::Profile => Some(Route::Profile),
            DashboardAction::About => Some(Route::About),
            DashboardAction::Contact => Some(Route::Contact),
            DashboardAction::Logout => {
                self.session.logout();
                Some(Route::Login)
            }
            DashboardAction::Quit => None,
        })
    }

    fn journal_list(&mut self, ui: &mut UI) -> Result<Option<Route>> {
        let mut matching = self.store.filter(&self.filter);
        sort_newest_first(&mut matching);
        let pages = page_count(matching.len(), self.config.page_size);
        self.page = self.page.min(pages - 1);

        let filter = self.filter.is_active().then(|| self.filter.describe());
        let status = self.status.take();
        let view = ListView {
            page: self.page,
            pages,
            matching: matching.len(),
            total: self.store.len(),
            filter: filter.as_deref(),
            status: status.as_deref(),
        };
        let action = ui.journal_list(paginate(&matching, self.page, self.config.page_size), &view)?;

        let next = match action {
            ListAction::Open(id) => Route::EntryDetail(id),
            ListAction::Edit(id) => Route::EditEntry(id),
            ListAction::Delete(id) => self.delete_entry(ui, &id)?,
            ListAction::New => Route::NewEntry,
            ListAction::Search => {
                if let Some(query) = ui.prompt("Search Entries", "Text or tag", &self.filter.search)? {
                    self.filter.search = query.trim().to_string();
                    self.page = 0;
                }
                Route::JournalList
            }
            ListAction::FilterMood => {
                let mut options = vec!["Any mood".to_string()];
                options.extend(MoodRating::all().map(|m| format!("{m} - {}", m.label())));
                if let Some(choice) = ui.choose("Filter by mood", &options)? {
                    self.filter.mood = match choice {
                        0 => None,
                        n => Some(MoodRating::new(n as u8)?),
                    };
                    self.page = 0;
                }
                Route::JournalList
            }
            ListAction::FilterSentiment => {
                let mut options = vec!["Any sentiment".to_string()];
                options.extend(Sentiment::ALL.iter().map(|s| s.label().to_string()));
                if let Some(choice) = ui.choose("Filter by sentiment", &options)? {
                    self.filter.sentiment = choice.checked_sub(1).map(|i| Sentiment::ALL[i]);
                    self.page = 0;
                }
                Route::JournalList
            }
            ListAction::FilterDates => {
                self.prompt_date_range(ui)?;
                Route::JournalList
            }
            ListAction::ClearFilters => {
                self.filter.reset();
                self.page = 0;
                Route::JournalList
            }
            ListAction::NextPage => {
                if self.page + 1 < pages {
                    self.page += 1;
                }
                Route::JournalList
            }
            ListAction::PrevPage => {
                self.page = self.page.saturating_sub(1);
                Route::JournalList
            }
            ListAction::Back => Route::Dashboard,
            ListAction::Quit => return Ok(None),
        };
        Ok(Some(next))
    }

    fn prompt_date_range(&mut self, ui: &mut UI) -> Result<()> {
        let Some(from) = ui.prompt("Filter by date", "From (YYYY-MM-DD, blank for none)", "")? else {
            return Ok(());
        };
        let Some(to) = ui.prompt("Filter by date", "To (YYYY-MM-DD, blank for none)", &today_input())? else {
            return Ok(());
        };

        match (parse_date_input(&from), parse_date_input(&to)) {
            (Ok(from), Ok(to)) => {
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        self.status = Some("The start date is after the end date".to_string());
                        return Ok(());
                    }
                }
                self.filter.start = from.and_then(start_of_day);
                self.filter.end = to.and_then(end_of_day);
                self.page = 0;
            }
            _ => self.status = Some("Dates must look like 2026-10-19".to_string()),
        }
        Ok(())
    }

    fn entry_detail(&mut self, ui: &mut UI, id: &str) -> Result<Option<Route>> {
        let entry = match self.store.get(id) {
            Ok(entry) => entry,
            Err(e) => {
                self.status = Some(e.to_string());
                return Ok(Some(Route::JournalList));
            }
        };

        Ok(Some(match ui.entry_detail(&entry)? {
            DetailAction::Edit => Route::EditEntry(entry.id),
            DetailAction::Delete => self.delete_entry(ui, &entry.id)?,
            DetailAction::Back => Route::JournalList,
        }))
    }

    fn new_entry(&mut self, ui: &mut UI) -> Result<Option<Route>> {
        let Some(draft) = ui.entry_form("New Journal Entry", &EntryDraft::default())? else {
            return Ok(Some(Route::Dashboard));
        };

        match self.store.create(draft.owned_by(self.session.user_id())) {
            Ok(_) => {
                self.status = Some("Journal entry created successfully!".to_string());
                Ok(Some(Route::Dashboard))
            }
            Err(e) => {
                self.status = Some(e.to_string());
                Ok(Some(Route::JournalList))
            }
        }
    }

    fn edit_entry(&mut self, ui: &mut UI, id: &str) -> Result<Option<Route>> {
        let entry = match self.store.get(id) {
            Ok(entry) => entry,
            Err(e) => {
                self.status = Some(e.to_string());
                return Ok(Some(Route::JournalList));
            }
        };

        let Some(draft) = ui.entry_form("Edit Journal Entry", &entry.to_draft())? else {
            return Ok(Some(Route::EntryDetail(entry.id)));
        };

        match self.store.update(&entry.id, draft) {
            Ok(updated) => {
                self.status = Some("Journal entry updated successfully!".to_string());
                Ok(Some(Route::EntryDetail(updated.id)))
            }
            Err(e) => {
                self.status = Some(e.to_string());
                Ok(Some(Route::JournalList))
            }
        }
    }

    /// Asks for confirmation, then deletes. Lands on the journal list either way.
    fn delete_entry(&mut self, ui: &mut UI, id: &str) -> Result<Route> {
        let confirmed = ui.confirm("Are you sure you want to delete this journal entry?")?;
        Ok(self.finish_delete(id, confirmed))
    }

    fn finish_delete(&mut self, id: &str, confirmed: bool) -> Route {
        if confirmed {
            self.status = Some(match self.store.delete(id) {
                Ok(()) => "Journal entry deleted".to_string(),
                Err(e) => e.to_string(),
            });
        }
        Route::JournalList
    }

    fn contact(&mut self, ui: &mut UI) -> Result<Option<Route>> {
        let fields = [("Name", false), ("Email", false), ("Subject", false), ("Message", false)];
        let Some(values) = ui.form("Contact Us", &fields, self.status.take().as_deref())? else {
            return Ok(Some(Route::Dashboard));
        };

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let message = ContactMessage {
            name: next(),
            email: next(),
            subject: next(),
            message: next(),
        };
        Ok(Some(self.submit_contact(&message)))
    }

    /// Invalid messages reopen the form with the reason in the status line.
    fn submit_contact(&mut self, message: &ContactMessage) -> Route {
        match contact::send(message) {
            Ok(sent) => {
                self.status = Some(sent.to_string());
                Route::Dashboard
            }
            Err(e) => {
                self.status = Some(e.to_string());
                Route::Contact
            }
        }
    }

    fn profile(&mut self, ui: &mut UI) -> Result<Option<Route>> {
        let profile = self.session.profile()?;

        let next = match ui.profile_screen(&profile, self.status.take().as_deref())? {
            ProfileAction::ChangePassword => {
                let fields = [
                    ("Current password", true),
                    ("New password", true),
                    ("Confirm new password", true),
                ];
                if let Some(values) = ui.form("Change Password", &fields, None)? {
                    self.status = Some(
                        match self.session.change_password(&values[0], &values[1], &values[2]) {
                            Ok(()) => "Password changed".to_string(),
                            Err(e) => e.to_string(),
                        },
                    );
                }
                Route::Profile
            }
            ProfileAction::DeleteAccount => {
                if ui.confirm("Delete your account? This cannot be undone.")? {
                    self.session.delete_account("")?;
                    self.status = Some("Your account has been deleted".to_string());
                    Route::Login
                } else {
                    Route::Profile
                }
            }
            ProfileAction::Logout => {
                self.session.logout();
                Route::Login
            }
            ProfileAction::Back => Route::Dashboard,
        };
        Ok(Some(next))
    }

    /// Consumes pending store events. True when anything changed, including
    /// events lost to lag.
    fn drain_changes(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(event) => {
                    debug!(id = event.entry_id(), ?event, "journal changed");
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed journal change events");
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        changed
    }

    fn refresh_dashboard(&mut self, force: bool) {
        if self.refresh_gate.should_refresh(force) {
            self.dashboard =
                DashboardSnapshot::build(self.store.entries(), Local::now(), self.config.dashboard_options());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(entries: usize, capacity: usize) -> App {
        let config = MindmateConfig {
            event_capacity: capacity,
            ..MindmateConfig::default()
        };
        let mut store = JournalStore::new(config.event_capacity);
        for i in 0..entries {
            store
                .create(EntryDraft::new(format!("entry number {i}"), MoodRating::default()))
                .unwrap();
        }
        App::new(config, store)
    }

    #[test]
    fn anonymous_users_are_sent_to_login() {
        let session = Session::new();
        for route in [
            Route::Dashboard,
            Route::JournalList,
            Route::EntryDetail("1".into()),
            Route::NewEntry,
            Route::EditEntry("1".into()),
            Route::Profile,
        ] {
            assert_eq!(guard(route, &session), Route::Login);
        }
        assert_eq!(guard(Route::Register, &session), Route::Register);
        assert_eq!(guard(Route::About, &session), Route::About);
        assert_eq!(guard(Route::Contact, &session), Route::Contact);
    }

    #[test]
    fn signed_in_users_skip_the_auth_screens() {
        let mut session = Session::new();
        session.login("alice", "pw").unwrap();
        assert_eq!(guard(Route::Login, &session), Route::Dashboard);
        assert_eq!(guard(Route::Register, &session), Route::Dashboard);
        assert_eq!(guard(Route::JournalList, &session), Route::JournalList);
        assert_eq!(guard(Route::About, &session), Route::About);
    }

    #[test]
    fn store_mutations_are_seen_once() {
        let mut app = app_with(0, 16);
        assert!(!app.drain_changes());

        app.store
            .create(EntryDraft::new("a calm evening", MoodRating::default()))
            .unwrap();
        assert!(app.drain_changes());
        assert!(!app.drain_changes());
    }

    #[test]
    fn lagged_listener_still_reports_a_change() {
        let mut app = app_with(0, 1);
        for i in 0..3 {
            app.store
                .create(EntryDraft::new(format!("note {i}"), MoodRating::default()))
                .unwrap();
        }
        assert!(app.drain_changes());
        assert!(!app.drain_changes());
    }

    #[test]
    fn forced_refresh_rebuilds_the_dashboard() {
        let mut app = app_with(2, 16);
        assert_eq!(app.dashboard.summary.total_entries, 2);

        app.store
            .create(EntryDraft::new("one more thing", MoodRating::default()))
            .unwrap();
        app.refresh_dashboard(false);
        assert_eq!(app.dashboard.summary.total_entries, 2);

        app.refresh_dashboard(true);
        assert_eq!(app.dashboard.summary.total_entries, 3);
    }

    fn credentials(password: &str, confirm: &str) -> Credentials {
        Credentials {
            username: "frank".into(),
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    #[test]
    fn deleting_a_missing_entry_still_lands_on_the_list() {
        let mut app = app_with(1, 16);
        assert_eq!(app.finish_delete("42", true), Route::JournalList);
        assert_eq!(app.status.as_deref(), Some("Entry not found: 42"));
        assert_eq!(app.store.len(), 1);
    }

    #[test]
    fn confirmed_delete_removes_the_entry() {
        let mut app = app_with(2, 16);
        assert_eq!(app.finish_delete("1", true), Route::JournalList);
        assert_eq!(app.status.as_deref(), Some("Journal entry deleted"));
        assert!(app.store.get("1").is_err());
        assert_eq!(app.store.len(), 1);
    }

    #[test]
    fn declined_delete_keeps_the_entry() {
        let mut app = app_with(1, 16);
        assert_eq!(app.finish_delete("1", false), Route::JournalList);
        assert_eq!(app.status, None);
        assert!(app.store.get("1").is_ok());
    }

    #[test]
    fn register_rejects_short_password_before_signing_in() {
        let mut app = app_with(0, 16);
        assert_eq!(app.complete_auth(&credentials("abc", "abc"), true), Route::Register);
        assert!(!app.session.is_authenticated());
        assert!(app.status.as_deref().is_some_and(|s| s.contains("at least 6")));
    }

    #[test]
    fn register_rejects_mismatched_confirmation() {
        let mut app = app_with(0, 16);
        assert_eq!(
            app.complete_auth(&credentials("secret1", "secret2"), true),
            Route::Register
        );
        assert!(!app.session.is_authenticated());
    }

    #[test]
    fn register_and_login_reach_the_dashboard() {
        let mut app = app_with(0, 16);
        assert_eq!(
            app.complete_auth(&credentials("secret1", "secret1"), true),
            Route::Dashboard
        );
        assert_eq!(app.session.user_id().as_deref(), Some("2"));

        app.session.logout();
        assert_eq!(app.complete_auth(&credentials("x", ""), false), Route::Dashboard);
        assert_eq!(app.session.user_id().as_deref(), Some("1"));
    }

    #[test]
    fn contact_form_reopens_until_valid() {
        let mut app = app_with(0, 16);
        let mut message = ContactMessage {
            name: "Grace".into(),
            email: "not-an-address".into(),
            subject: "Hi".into(),
            message: "Thanks!".into(),
        };
        assert_eq!(app.submit_contact(&message), Route::Contact);
        assert!(app.status.is_some());

        message.email = "grace@example.com".into();
        assert_eq!(app.submit_contact(&message), Route::Dashboard);
        assert_eq!(app.status.as_deref(), Some(contact::SENT_MESSAGE));
    }
}
