use std::io::{stdout, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDate};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::dashboard::{CalendarDay, DashboardSnapshot, TREND_DAYS};
use crate::journal_entry::{parse_tags, EntryDraft, JournalEntry, MoodRating};
use crate::sentiment::{Sentiment, SentimentPreview};
use crate::session::UserProfile;

const BLINK_INTERVAL: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub enum AuthOutcome {
    Submit(Credentials),
    Switch,
    About,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub confirm: String,
}

pub enum DashboardAction {
    Write,
    Journal,
    Refresh,
    Profile,
    About,
    Contact,
    Logout,
    Quit,
}

pub enum ListAction {
    Open(String),
    Edit(String),
    Delete(String),
    New,
    Search,
    FilterMood,
    FilterSentiment,
    FilterDates,
    ClearFilters,
    NextPage,
    PrevPage,
    Back,
    Quit,
}

pub enum DetailAction {
    Edit,
    Delete,
    Back,
}

pub enum ProfileAction {
    ChangePassword,
    DeleteAccount,
    Logout,
    Back,
}

/// What the journal list header shows about the current query.
pub struct ListView<'a> {
    pub page: usize,
    pub pages: usize,
    pub matching: usize,
    pub total: usize,
    /// `None` when no criterion is set.
    pub filter: Option<&'a str>,
    pub status: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Content,
    Tags,
    Mood,
    Private,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Content => FormField::Tags,
            FormField::Tags => FormField::Mood,
            FormField::Mood => FormField::Private,
            FormField::Private => FormField::Content,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Content => FormField::Private,
            FormField::Tags => FormField::Content,
            FormField::Mood => FormField::Tags,
            FormField::Private => FormField::Mood,
        }
    }
}

/// Single or multi-line text field with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    chars: Vec<char>,
    cursor: usize,
    multiline: bool,
}

impl TextInput {
    pub fn new(text: &str, multiline: bool) -> Self {
        let chars: Vec<char> = text.chars().collect();
        TextInput {
            cursor: chars.len(),
            chars,
            multiline,
        }
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Applies an editing key. Returns false for keys the field does not use.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.chars.insert(self.cursor, c);
                self.cursor += 1;
            }
            KeyCode::Enter if self.multiline => {
                self.chars.insert(self.cursor, '\n');
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.chars.remove(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.chars.len() {
                    self.chars.remove(self.cursor);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.chars.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.chars.len(),
            _ => return false,
        }
        true
    }

    pub fn render(&self, show_cursor: bool) -> String {
        let mut text: String = self.chars[..self.cursor].iter().collect();
        if show_cursor {
            text.push('|');
        }
        text.extend(&self.chars[self.cursor..]);
        text
    }

    pub fn masked(&self, show_cursor: bool) -> String {
        let mut text = "*".repeat(self.cursor);
        if show_cursor {
            text.push('|');
        }
        text.push_str(&"*".repeat(self.chars.len() - self.cursor));
        text
    }
}

/// Cuts `text` to at most `max_width` terminal columns, marking the cut with "...".
pub fn truncate_text(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(3);
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cursor_visible: bool,
    last_cursor_update: Instant,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
        })
    }

    pub fn auth_form(&mut self, register: bool, status: Option<&str>) -> Result<AuthOutcome> {
        let mut fields = vec![TextInput::new("", false), TextInput::new("", false)];
        if register {
            fields.push(TextInput::new("", false));
        }
        let mut focus = 0;
        let mut error = status.map(str::to_string);

        loop {
            let show_cursor = self.cursor_visible;
            let title = if register { "Create an Account" } else { "Sign in to MindMate" };
            let labels: &[&str] = if register {
                &["Username", "Password", "Confirm Password"]
            } else {
                &["Username", "Password"]
            };
            let rendered: Vec<(String, String)> = fields
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let cursor = show_cursor && i == focus;
                    let value = if i == 0 { field.render(cursor) } else { field.masked(cursor) };
                    (labels[i].to_string(), value)
                })
                .collect();
            let hint = if register {
                "Tab: Next field, Enter: Register, F2: Sign in instead, F1: About, Esc: Quit"
            } else {
                "Tab: Next field, Enter: Sign in, F2: Register instead, F1: About, Esc: Quit"
            };

            self.terminal.draw(|f| {
                draw_form(f, title, &rendered, focus, error.as_deref(), hint);
            })?;

            let Some(key) = self.poll_key()? else { continue };
            match key.code {
                KeyCode::Esc => return Ok(AuthOutcome::Quit),
                KeyCode::F(1) => return Ok(AuthOutcome::About),
                KeyCode::F(2) => return Ok(AuthOutcome::Switch),
                KeyCode::Tab | KeyCode::Down => focus = (focus + 1) % fields.len(),
                KeyCode::BackTab | KeyCode::Up => focus = (focus + fields.len() - 1) % fields.len(),
                KeyCode::Enter => {
                    if fields[0].value().trim().is_empty() || fields[1].is_empty() {
                        error = Some("Username and password are required".to_string());
                        continue;
                    }
                    return Ok(AuthOutcome::Submit(Credentials {
                        username: fields[0].value().trim().to_string(),
                        password: fields[1].value(),
                        confirm: fields.get(2).map(TextInput::value).unwrap_or_default(),
                    }));
                }
                _ => {
                    fields[focus].handle_key(key);
                }
            }
        }
    }

    pub fn dashboard_screen(
        &mut self,
        snapshot: &DashboardSnapshot,
        username: &str,
        status: Option<&str>,
    ) -> Result<DashboardAction> {
        self.terminal.draw(|f| draw_dashboard(f, snapshot, username, status))?;

        loop {
            let key = self.next_key()?;
            let action = match key.code {
                KeyCode::Char('n') | KeyCode::Char('w') => DashboardAction::Write,
                KeyCode::Char('j') | KeyCode::Char('v') => DashboardAction::Journal,
                KeyCode::Char('r') => DashboardAction::Refresh,
                KeyCode::Char('p') => DashboardAction::Profile,
                KeyCode::Char('a') => DashboardAction::About,
                KeyCode::Char('c') => DashboardAction::Contact,
                KeyCode::Char('l') => DashboardAction::Logout,
                KeyCode::Char('q') | KeyCode::Esc => DashboardAction::Quit,
                _ => continue,
            };
            return Ok(action);
        }
    }

    pub fn journal_list(&mut self, entries: &[JournalEntry], view: &ListView) -> Result<ListAction> {
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = screen_chunks(f.area(), 10);

                f.render_widget(title_bar("Journal Entries"), chunks[0]);

                let width = chunks[1].width.saturating_sub(6) as usize;
                let items: Vec<ListItem> = entries.iter().map(|e| entry_item(e, width)).collect();
                let heading = list_heading(view);
                let entries_list = List::new(items)
                    .block(Block::default().borders(Borders::ALL).title(heading))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");

                f.render_stateful_widget(
                    entries_list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(
                    footer(
                        view.status,
                        "Enter: View, e: Edit, d: Delete, n: New, s: Search, m: Mood, t: Sentiment, \
                         f: Dates, c: Clear, [/]: Page, Esc: Back",
                    ),
                    chunks[2],
                );
            })?;

            let key = self.next_key()?;
            let selected = entries.get(selected_index).map(|e| e.id.clone());
            let action = match key.code {
                KeyCode::Up => {
                    selected_index = selected_index.saturating_sub(1);
                    continue;
                }
                KeyCode::Down => {
                    if selected_index + 1 < entries.len() {
                        selected_index += 1;
                    }
                    continue;
                }
                KeyCode::Enter => match selected {
                    Some(id) => ListAction::Open(id),
                    None => continue,
                },
                KeyCode::Char('e') => match selected {
                    Some(id) => ListAction::Edit(id),
                    None => continue,
                },
                KeyCode::Char('d') => match selected {
                    Some(id) => ListAction::Delete(id),
                    None => continue,
                },
                KeyCode::Char('n') => ListAction::New,
                KeyCode::Char('s') | KeyCode::Char('/') => ListAction::Search,
                KeyCode::Char('m') => ListAction::FilterMood,
                KeyCode::Char('t') => ListAction::FilterSentiment,
                KeyCode::Char('f') => ListAction::FilterDates,
                KeyCode::Char('c') => ListAction::ClearFilters,
                KeyCode::Char(']') | KeyCode::PageDown => ListAction::NextPage,
                KeyCode::Char('[') | KeyCode::PageUp => ListAction::PrevPage,
                KeyCode::Esc | KeyCode::Char('b') => ListAction::Back,
                KeyCode::Char('q') => ListAction::Quit,
                _ => continue,
            };
            return Ok(action);
        }
    }

    pub fn entry_detail(&mut self, entry: &JournalEntry) -> Result<DetailAction> {
        self.terminal.draw(|f| {
            let chunks = screen_chunks(f.area(), 10);

            f.render_widget(
                title_bar(&format!("Entry from {}", entry.created_at.format("%Y-%m-%d %H:%M"))),
                chunks[0],
            );

            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(4), Constraint::Min(3)].as_ref())
                .split(chunks[1]);

            let modified = entry
                .modified_at
                .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            let meta = vec![
                Line::from(vec![
                    Span::styled(
                        format!("{} {} ({}/5)", entry.mood.emoji(), entry.mood.label(), entry.mood),
                        Style::default().fg(mood_color(entry.mood.value())),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        entry.sentiment.label(),
                        Style::default().fg(sentiment_color(entry.sentiment)),
                    ),
                    Span::raw(if entry.is_private { "  [private]" } else { "" }),
                ]),
                Line::from(format!("Tags: {}", entry.tags.join(", "))),
                Line::from(format!("Last modified: {modified}")),
            ];
            f.render_widget(
                Paragraph::new(meta).block(Block::default().borders(Borders::BOTTOM)),
                body[0],
            );

            let content = Paragraph::new(entry.content.clone())
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Content"));
            f.render_widget(content, body[1]);

            f.render_widget(footer(None, "e: Edit, d: Delete, Esc: Back"), chunks[2]);
        })?;

        loop {
            let key = self.next_key()?;
            let action = match key.code {
                KeyCode::Char('e') => DetailAction::Edit,
                KeyCode::Char('d') => DetailAction::Delete,
                KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') => DetailAction::Back,
                _ => continue,
            };
            return Ok(action);
        }
    }

    /// Create/edit form with a live sentiment preview. `None` when cancelled.
    pub fn entry_form(&mut self, title: &str, initial: &EntryDraft) -> Result<Option<EntryDraft>> {
        let mut content = TextInput::new(&initial.content, true);
        let mut tags = TextInput::new(&initial.tags.join(", "), false);
        let mut mood = initial.mood;
        let mut is_private = initial.is_private;
        let mut focus = FormField::Content;
        let mut error: Option<String> = None;

        loop {
            let preview = SentimentPreview::new(&content.value(), mood);
            let show_cursor = self.cursor_visible;
            let content_text = content.render(show_cursor && focus == FormField::Content);
            let tags_text = tags.render(show_cursor && focus == FormField::Tags);

            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Min(8),
                            Constraint::Length(3),
                            Constraint::Length(4),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                f.render_widget(title_bar(title), chunks[0]);

                let content_input = Paragraph::new(content_text)
                    .wrap(Wrap { trim: false })
                    .block(field_block("Content", focus == FormField::Content));
                f.render_widget(content_input, chunks[1]);

                let tags_input = Paragraph::new(tags_text)
                    .block(field_block("Tags (comma-separated)", focus == FormField::Tags));
                f.render_widget(tags_input, chunks[2]);

                let row = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
                    .split(chunks[3]);

                let mood_lines = vec![
                    Line::from(Span::styled(
                        format!("{} {} ({}/5)", mood.emoji(), mood.label(), mood),
                        Style::default()
                            .fg(mood_color(mood.value()))
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!(
                        "{}   private: {}",
                        mood.description(),
                        if is_private { "yes" } else { "no" }
                    )),
                ];
                let mood_title = if focus == FormField::Private { "Privacy (Space)" } else { "Mood (1-5, +/-)" };
                f.render_widget(
                    Paragraph::new(mood_lines).block(field_block(
                        mood_title,
                        matches!(focus, FormField::Mood | FormField::Private),
                    )),
                    row[0],
                );

                f.render_widget(
                    Paragraph::new(preview_lines(&preview))
                        .block(Block::default().borders(Borders::ALL).title("Detected sentiment")),
                    row[1],
                );

                f.render_widget(
                    footer(error.as_deref(), "Tab: Next field, Ctrl+S: Save, Esc: Cancel"),
                    chunks[4],
                );
            })?;

            let Some(key) = self.poll_key()? else { continue };
            match (key.code, focus) {
                (KeyCode::Esc, _) => return Ok(None),
                (KeyCode::Tab, _) => focus = focus.next(),
                (KeyCode::BackTab, _) => focus = focus.prev(),
                (KeyCode::Char('s'), _) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let draft = EntryDraft {
                        content: content.value(),
                        mood,
                        tags: parse_tags(&tags.value()),
                        is_private,
                        user_id: initial.user_id.clone(),
                    };
                    if let Err(e) = draft.validate() {
                        error = Some(e.to_string());
                        continue;
                    }
                    if needs_save_confirmation(&preview)
                        && !self.confirm(
                            "The sentiment detected in your text seems inconsistent with your \
                             mood rating. Save anyway?",
                        )?
                    {
                        continue;
                    }
                    return Ok(Some(draft));
                }
                (KeyCode::Up | KeyCode::Right | KeyCode::Char('+'), FormField::Mood) => {
                    mood = mood.increment()
                }
                (KeyCode::Down | KeyCode::Left | KeyCode::Char('-'), FormField::Mood) => {
                    mood = mood.decrement()
                }
                (KeyCode::Char(c @ '1'..='5'), FormField::Mood) => {
                    mood = MoodRating::new(c as u8 - b'0').unwrap_or(mood)
                }
                (KeyCode::Char(' ') | KeyCode::Enter, FormField::Private) => is_private = !is_private,
                (_, FormField::Content) => {
                    if content.handle_key(key) {
                        error = None;
                    }
                }
                (_, FormField::Tags) => {
                    tags.handle_key(key);
                }
                _ => {}
            }
        }
    }

    /// Generic form; returns the field values in order, or `None` when cancelled.
    pub fn form(
        &mut self,
        title: &str,
        fields: &[(&str, bool)],
        status: Option<&str>,
    ) -> Result<Option<Vec<String>>> {
        let mut inputs: Vec<TextInput> = fields.iter().map(|_| TextInput::new("", false)).collect();
        self.run_form(title, fields, &mut inputs, status)
    }

    pub fn prompt(&mut self, title: &str, label: &str, initial: &str) -> Result<Option<String>> {
        let mut inputs = vec![TextInput::new(initial, false)];
        Ok(self
            .run_form(title, &[(label, false)], &mut inputs, None)?
            .and_then(|mut values| values.pop()))
    }

    fn run_form(
        &mut self,
        title: &str,
        fields: &[(&str, bool)],
        inputs: &mut [TextInput],
        status: Option<&str>,
    ) -> Result<Option<Vec<String>>> {
        let mut focus = 0;

        loop {
            let show_cursor = self.cursor_visible;
            let rendered: Vec<(String, String)> = fields
                .iter()
                .zip(inputs.iter())
                .enumerate()
                .map(|(i, ((label, masked), input))| {
                    let cursor = show_cursor && i == focus;
                    let value = if *masked { input.masked(cursor) } else { input.render(cursor) };
                    (label.to_string(), value)
                })
                .collect();

            self.terminal.draw(|f| {
                draw_form(f, title, &rendered, focus, status, "Tab: Next field, Enter: Submit, Esc: Cancel");
            })?;

            let Some(key) = self.poll_key()? else { continue };
            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Enter => return Ok(Some(inputs.iter().map(TextInput::value).collect())),
                KeyCode::Tab | KeyCode::Down => focus = (focus + 1) % inputs.len(),
                KeyCode::BackTab | KeyCode::Up => focus = (focus + inputs.len() - 1) % inputs.len(),
                _ => {
                    inputs[focus].handle_key(key);
                }
            }
        }
    }

    /// Pick one of `options`; `None` when cancelled.
    pub fn choose(&mut self, title: &str, options: &[String]) -> Result<Option<usize>> {
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = screen_chunks(f.area(), 5);
                f.render_widget(title_bar(title), chunks[0]);

                let items: Vec<ListItem> = options.iter().map(|o| ListItem::new(o.clone())).collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(footer(None, "Up/Down: Navigate, Enter: Select, Esc: Cancel"), chunks[2]);
            })?;

            let key = self.next_key()?;
            match key.code {
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => {
                    if selected_index + 1 < options.len() {
                        selected_index += 1;
                    }
                }
                KeyCode::Enter => return Ok(Some(selected_index)),
                KeyCode::Esc => return Ok(None),
                _ => {}
            }
        }
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        self.terminal.draw(|f| {
            let area = centered_rect(60, 7, f.area());
            let dialog = Paragraph::new(vec![
                Line::from(question.to_string()),
                Line::from(""),
                Line::from(Span::styled(
                    "y: Yes, n: No",
                    Style::default().fg(Color::Yellow),
                )),
            ])
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Confirm"));
            f.render_widget(dialog, area);
        })?;

        loop {
            let key = self.next_key()?;
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }

    pub fn profile_screen(&mut self, profile: &UserProfile, status: Option<&str>) -> Result<ProfileAction> {
        self.terminal.draw(|f| {
            let chunks = screen_chunks(f.area(), 6);
            f.render_widget(title_bar("Profile"), chunks[0]);

            let info = vec![
                Line::from(format!("Username:   {}", profile.username)),
                Line::from(format!("User ID:    {}", profile.id)),
                Line::from(format!("Name:       {} {}", profile.first_name, profile.last_name)),
                Line::from(format!("Email:      {}", profile.email)),
                Line::from(format!("Joined:     {}", profile.join_date.format("%B %-d, %Y"))),
            ];
            f.render_widget(
                Paragraph::new(info).block(Block::default().borders(Borders::ALL).title("Account")),
                chunks[1],
            );

            f.render_widget(
                footer(status, "c: Change password, x: Delete account, l: Log out, Esc: Back"),
                chunks[2],
            );
        })?;

        loop {
            let key = self.next_key()?;
            let action = match key.code {
                KeyCode::Char('c') => ProfileAction::ChangePassword,
                KeyCode::Char('x') => ProfileAction::DeleteAccount,
                KeyCode::Char('l') => ProfileAction::Logout,
                KeyCode::Esc | KeyCode::Char('b') => ProfileAction::Back,
                _ => continue,
            };
            return Ok(action);
        }
    }

    pub fn about_screen(&mut self) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = screen_chunks(f.area(), 6);
            f.render_widget(title_bar("About MindMate"), chunks[0]);

            let text = vec![
                Line::from("MindMate is a mood journal for the terminal."),
                Line::from(""),
                Line::from("Write entries, rate your mood from 1 to 5 and watch the trends on the dashboard."),
                Line::from("Entries live in memory only and are gone when the program exits."),
            ];
            f.render_widget(
                Paragraph::new(text)
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
            f.render_widget(footer(None, "Press any key to go back"), chunks[2]);
        })?;

        self.next_key()?;
        Ok(())
    }

    /// Blocks until a key is pressed.
    fn next_key(&mut self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(key);
                }
            }
        }
    }

    /// Waits briefly for a key while keeping the text cursor blinking.
    fn poll_key(&mut self) -> Result<Option<KeyEvent>> {
        let now = Instant::now();
        if now.duration_since(self.last_cursor_update) >= BLINK_INTERVAL {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_update = now;
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.cursor_visible = true;
                    self.last_cursor_update = Instant::now();
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

fn screen_chunks(area: Rect, body_min: u16) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(body_min),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area)
}

fn title_bar(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

/// Key help, with a status or error message above it when there is one.
fn footer(status: Option<&str>, help: &str) -> Paragraph<'static> {
    let mut lines = Vec::new();
    if let Some(status) = status {
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        help.to_string(),
        Style::default().fg(Color::Yellow),
    )));
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
}

fn field_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title.to_string())
}

fn draw_form(
    f: &mut Frame,
    title: &str,
    fields: &[(String, String)],
    focus: usize,
    error: Option<&str>,
    hint: &str,
) {
    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(f.area());

    f.render_widget(title_bar(title), chunks[0]);
    for (i, (label, value)) in fields.iter().enumerate() {
        f.render_widget(
            Paragraph::new(value.clone()).block(field_block(label, i == focus)),
            chunks[i + 1],
        );
    }
    f.render_widget(footer(error, hint), chunks[chunks.len() - 1]);
}

fn draw_dashboard(f: &mut Frame, snapshot: &DashboardSnapshot, username: &str, status: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(10),
                Constraint::Min(6),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.area());

    f.render_widget(title_bar(&format!("MindMate - {username}'s dashboard")), chunks[0]);

    let stats = &snapshot.summary;
    let average_level = stats.average_mood.round() as u8;
    let summary = Line::from(vec![
        Span::raw(format!("Entries: {}   ", stats.total_entries)),
        Span::raw("Average mood: "),
        Span::styled(
            format!("{:.1}", stats.average_mood),
            Style::default()
                .fg(mood_color(average_level))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("Positive {}", stats.positive),
            Style::default().fg(sentiment_color(Sentiment::Positive)),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Neutral {}", stats.neutral),
            Style::default().fg(sentiment_color(Sentiment::Neutral)),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Negative {}", stats.negative),
            Style::default().fg(sentiment_color(Sentiment::Negative)),
        ),
    ]);
    f.render_widget(
        Paragraph::new(summary)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Summary")),
        chunks[1],
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)].as_ref())
        .split(chunks[2]);

    let today = snapshot.generated_at.date_naive();
    let month = today.format("%B %Y").to_string();
    f.render_widget(
        Paragraph::new(calendar_lines(&snapshot.calendar, today))
            .block(Block::default().borders(Borders::ALL).title(month)),
        middle[0],
    );

    let points: Vec<(f64, f64)> = snapshot
        .mood_trend
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.mood.map(|m| (i as f64, m)))
        .collect();
    let x_labels: Vec<Span> = [0, snapshot.mood_trend.len() / 2, snapshot.mood_trend.len().saturating_sub(1)]
        .iter()
        .filter_map(|&i| snapshot.mood_trend.get(i))
        .map(|p| Span::raw(p.label.clone()))
        .collect();
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title("Mood, last 14 days"))
        .x_axis(
            Axis::default()
                .bounds([0.0, (TREND_DAYS - 1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .bounds([1.0, 5.0])
                .labels(vec![Span::raw("1"), Span::raw("3"), Span::raw("5")]),
        );
    f.render_widget(chart, middle[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(chunks[3]);

    let width = bottom[0].width.saturating_sub(4) as usize;
    let recent: Vec<ListItem> = snapshot
        .recent_entries
        .iter()
        .map(|e| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", e.mood.emoji()),
                    Style::default().fg(mood_color(e.mood.value())),
                ),
                Span::raw(truncate_text(
                    &format!("{} {}", e.created_at.format("%b %-d"), e.first_line()),
                    width.saturating_sub(3),
                )),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(recent).block(Block::default().borders(Borders::ALL).title("Recent entries")),
        bottom[0],
    );

    let top_count = snapshot.common_words.first().map_or(1, |w| w.count.max(1));
    let words: Vec<Span> = snapshot
        .common_words
        .iter()
        .map(|w| {
            let style = if w.count * 2 >= top_count {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Span::styled(format!("{} ({})  ", w.text, w.count), style)
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(words))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Common words")),
        bottom[1],
    );

    f.render_widget(
        footer(
            status,
            "n: New entry, j: Journal, r: Refresh, p: Profile, a: About, c: Contact, l: Log out, q: Quit",
        ),
        chunks[4],
    );
}

fn calendar_lines(days: &[CalendarDay], today: NaiveDate) -> Vec<Line<'static>> {
    let header: Vec<Span> = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
        .iter()
        .map(|d| Span::styled(format!(" {d} "), Style::default().add_modifier(Modifier::BOLD)))
        .collect();

    let mut lines = vec![Line::from(header)];
    for week in days.chunks(7) {
        let cells: Vec<Span> = week
            .iter()
            .map(|day| {
                let mut style = if day.mood_level == 0 {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default().fg(Color::Black).bg(mood_color(day.mood_level))
                };
                if !day.is_current_month {
                    style = style.add_modifier(Modifier::DIM);
                }
                if day.date == today {
                    style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                }
                Span::styled(format!("{:>3} ", day.date.day()), style)
            })
            .collect();
        lines.push(Line::from(cells));
    }
    lines
}

fn entry_item(entry: &JournalEntry, width: usize) -> ListItem<'static> {
    ListItem::new(vec![
        Line::from(vec![
            Span::raw(format!("[{}] ", entry.created_at.format("%Y-%m-%d %H:%M"))),
            Span::styled(
                format!("{} {}/5 ", entry.mood.emoji(), entry.mood),
                Style::default().fg(mood_color(entry.mood.value())),
            ),
            Span::styled(
                entry.sentiment.label(),
                Style::default().fg(sentiment_color(entry.sentiment)),
            ),
            Span::raw(if entry.is_private { " [private]" } else { "" }),
        ]),
        Line::from(Span::raw(truncate_text(entry.first_line(), width))),
        Line::from(Span::styled(
            truncate_text(&format!("Tags: {}", entry.tags.join(", ")), width),
            Style::default().fg(Color::DarkGray),
        )),
    ])
}

fn preview_lines(preview: &SentimentPreview) -> Vec<Line<'static>> {
    let detected = match preview.detected {
        Some(sentiment) => Span::styled(
            sentiment.label(),
            Style::default().fg(sentiment_color(sentiment)),
        ),
        None => Span::styled("(keep typing)", Style::default().fg(Color::DarkGray)),
    };
    let mut lines = vec![Line::from(vec![Span::raw("Text: "), detected])];
    if preview.mismatch {
        lines.push(Line::from(Span::styled(
            format!("Mood says {}", preview.mood_sentiment),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines
}

/// Saving text whose detected sentiment disagrees with the mood asks first.
pub fn needs_save_confirmation(preview: &SentimentPreview) -> bool {
    preview.mismatch
}

fn list_heading(view: &ListView) -> String {
    let mut heading = format!(
        "Page {}/{} - {} of {} entries",
        view.page + 1,
        view.pages,
        view.matching,
        view.total
    );
    if let Some(filter) = view.filter {
        heading.push_str(" - filters: ");
        heading.push_str(filter);
    }
    heading
}

fn mood_color(level: u8) -> Color {
    match level {
        1 => Color::Red,
        2 => Color::LightRed,
        3 => Color::Yellow,
        4 => Color::LightGreen,
        5 => Color::Green,
        _ => Color::DarkGray,
    }
}

fn sentiment_color(sentiment: Sentiment) -> Color {
    match sentiment {
        Sentiment::Negative => Color::Red,
        Sentiment::Neutral => Color::Yellow,
        Sentiment::Positive => Color::Green,
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let scaled = u32::from(area.width) * u32::from(percent_x.min(100)) / 100;
    let width = u16::try_from(scaled).unwrap_or(area.width);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height: height.min(area.height),
    }
}

/// Date typed into a filter prompt; blank means "no bound".
pub fn parse_date_input(input: &str) -> std::result::Result<Option<NaiveDate>, chrono::ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map(Some)
}

/// Today's date in the format the date prompts expect.
pub fn today_input() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
