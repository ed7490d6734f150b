// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use userdesk_app::{SessionEvent, User, UserApi, UserField, UserForm, UserId, UserListSession};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const EDIT_CURSOR: &str = "▏";
const COLLAPSED_MARK: &str = "▸";
const EXPANDED_MARK: &str = "▾";
const COLUMN_TITLES: [&str; 9] = [
    "ID",
    "Name",
    "Birthdate",
    "Birth Place",
    "Mother's Name",
    "SSN",
    "TIN",
    "Email",
    "Details",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected_row: usize,
    edit_field: usize,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<A: UserApi>(session: &mut UserListSession<A>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let events = session.refresh();
    apply_events(session, &mut view_data, &internal_tx, &events);
    tracing::debug!(rows = session.users().len(), "event loop started");

    let mut result = Ok(());
    loop {
        process_internal_events(session, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, session, &view_data)) {
            tracing::warn!(%error, "failed to draw frame");
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(session, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    tracing::debug!("event loop stopped");
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                session.clear_status();
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        if sender.send(InternalEvent::ClearStatus { token }).is_err() {
            tracing::debug!(token, "status clear dropped after the event loop closed");
        }
    });
}

fn emit_status<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    let message = message.into();
    tracing::debug!(status = %message, "status line set");
    session.set_status(message);
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn apply_events<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[SessionEvent],
) {
    clamp_selection(session, view_data);
    if let Some(message) = status_for_events(events) {
        emit_status(session, view_data, internal_tx, message);
    }
}

/// A failure anywhere in the batch wins over the success messages.
fn status_for_events(events: &[SessionEvent]) -> Option<String> {
    let failure = events.iter().find_map(|event| match event {
        SessionEvent::RemoteFailed { operation, message } => {
            Some(format!("{} failed: {message}", operation.as_str()))
        }
        _ => None,
    });
    failure.or_else(|| events.iter().find_map(status_for_event))
}

fn status_for_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Refreshed { count } => Some(format!(
            "loaded {count} user{}",
            if *count == 1 { "" } else { "s" }
        )),
        SessionEvent::EditChanged(Some(id)) => Some(format!("editing user {id}")),
        SessionEvent::EditChanged(None) => Some("edit off".to_owned()),
        SessionEvent::EditReverted(id) => Some(format!("changes to user {id} reverted")),
        SessionEvent::Saved(id) => Some(format!("saved user {id}")),
        SessionEvent::Created => Some("user created".to_owned()),
        SessionEvent::Deleted(id) => Some(format!("deleted user {id}")),
        SessionEvent::FormOpened => Some("new user".to_owned()),
        SessionEvent::RemoteFailed { operation, message } => {
            Some(format!("{} failed: {message}", operation.as_str()))
        }
        SessionEvent::ExpandToggled { .. }
        | SessionEvent::FieldEdited { .. }
        | SessionEvent::FormClosed => None,
    }
}

fn handle_key_event<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if session.form().is_some() {
        handle_form_key(session, view_data, internal_tx, key);
        return false;
    }

    if let Some(editing) = session.rows().editing() {
        handle_edit_key(session, view_data, internal_tx, editing, key);
        return false;
    }

    handle_nav_key(session, view_data, internal_tx, key);
    false
}

fn handle_nav_key<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j') | KeyCode::Down, _) => move_selection(session, view_data, 1),
        (KeyCode::Char('k') | KeyCode::Up, _) => move_selection(session, view_data, -1),
        (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
            view_data.selected_row = 0;
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            view_data.selected_row = session.users().len().saturating_sub(1);
        }
        (KeyCode::Enter, _) => toggle_expand_selected(session, view_data, internal_tx),
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            toggle_edit_selected(session, view_data, internal_tx);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            let events = session.open_form();
            apply_events(session, view_data, internal_tx, &events);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let Some(id) = selected_user_id(session, view_data) else {
                emit_status(session, view_data, internal_tx, "no user selected");
                return;
            };
            let events = session.delete(id);
            apply_events(session, view_data, internal_tx, &events);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            let events = session.refresh();
            apply_events(session, view_data, internal_tx, &events);
        }
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        _ => {}
    }
}

fn handle_edit_key<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    editing: UserId,
    key: KeyEvent,
) {
    let field_count = UserField::ALL.len();
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            let events = session.cancel_edit();
            apply_events(session, view_data, internal_tx, &events);
        }
        (KeyCode::Char('s'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            save_edited_row(session, view_data, internal_tx, editing);
        }
        (KeyCode::Char('e'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            toggle_edit_selected(session, view_data, internal_tx);
        }
        (KeyCode::Tab, _) => {
            view_data.edit_field = (view_data.edit_field + 1) % field_count;
        }
        (KeyCode::BackTab, _) => {
            view_data.edit_field = (view_data.edit_field + field_count - 1) % field_count;
        }
        (KeyCode::Down, _) => move_selection(session, view_data, 1),
        (KeyCode::Up, _) => move_selection(session, view_data, -1),
        (KeyCode::Enter, _) => toggle_expand_selected(session, view_data, internal_tx),
        (KeyCode::Backspace, _) => {
            edit_focused_field(session, view_data, internal_tx, editing, None);
        }
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            edit_focused_field(session, view_data, internal_tx, editing, Some(ch));
        }
        _ => {}
    }
}

fn handle_form_key<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            session.cancel_form();
            emit_status(session, view_data, internal_tx, "new user canceled");
        }
        (KeyCode::Enter, _) => submit_form(session, view_data, internal_tx),
        (KeyCode::Char('s'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            submit_form(session, view_data, internal_tx);
        }
        (KeyCode::Char('a'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(form) = session.form_mut() {
                form.add_address();
            }
        }
        (KeyCode::Char('p'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(form) = session.form_mut() {
                form.add_phone_number();
            }
        }
        (KeyCode::Tab, _) => {
            if let Some(form) = session.form_mut() {
                form.next_field();
            }
        }
        (KeyCode::BackTab, _) => {
            if let Some(form) = session.form_mut() {
                form.prev_field();
            }
        }
        (KeyCode::Backspace, _) => {
            if let Some(form) = session.form_mut() {
                form.pop_char();
            }
        }
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            if let Some(form) = session.form_mut() {
                form.push_char(ch);
            }
        }
        _ => {}
    }
}

fn submit_form<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match session.submit_form() {
        Ok(events) => apply_events(session, view_data, internal_tx, &events),
        Err(error) => emit_status(session, view_data, internal_tx, format!("{error:#}")),
    }
}

fn save_edited_row<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    editing: UserId,
) {
    let Some(index) = session.index_of(editing) else {
        let events = session.clear_edit();
        apply_events(session, view_data, internal_tx, &events);
        emit_status(
            session,
            view_data,
            internal_tx,
            format!("user {editing} is no longer listed"),
        );
        return;
    };
    match session.save(index) {
        Ok(events) => apply_events(session, view_data, internal_tx, &events),
        Err(error) => emit_status(session, view_data, internal_tx, format!("{error:#}")),
    }
}

/// `None` removes the last character of the focused field.
fn edit_focused_field<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    editing: UserId,
    ch: Option<char>,
) {
    let Some(index) = session.index_of(editing) else {
        return;
    };
    let Some(user) = session.users().get(index) else {
        return;
    };
    let field = focused_edit_field(view_data);
    let mut value = user.field(field).to_owned();
    match ch {
        Some(ch) => value.push(ch),
        None => {
            value.pop();
        }
    }
    if let Err(error) = session.set_field(index, field, value) {
        emit_status(session, view_data, internal_tx, format!("{error:#}"));
    }
}

fn toggle_expand_selected<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = selected_user_id(session, view_data) else {
        emit_status(session, view_data, internal_tx, "no user selected");
        return;
    };
    session.toggle_expand(id);
}

fn toggle_edit_selected<A: UserApi>(
    session: &mut UserListSession<A>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = selected_user_id(session, view_data) else {
        emit_status(session, view_data, internal_tx, "no user selected");
        return;
    };
    view_data.edit_field = 0;
    let events = session.toggle_edit(id);
    apply_events(session, view_data, internal_tx, &events);
}

fn move_selection<A: UserApi>(
    session: &UserListSession<A>,
    view_data: &mut ViewData,
    delta: isize,
) {
    let len = session.users().len();
    if len == 0 {
        view_data.selected_row = 0;
        return;
    }
    let next = view_data.selected_row.saturating_add_signed(delta);
    view_data.selected_row = next.min(len - 1);
}

fn clamp_selection<A: UserApi>(session: &UserListSession<A>, view_data: &mut ViewData) {
    let len = session.users().len();
    view_data.selected_row = view_data.selected_row.min(len.saturating_sub(1));
}

fn selected_user_id<A: UserApi>(
    session: &UserListSession<A>,
    view_data: &ViewData,
) -> Option<UserId> {
    session
        .users()
        .get(view_data.selected_row)
        .map(|user| user.id)
}

fn focused_edit_field(view_data: &ViewData) -> UserField {
    UserField::ALL[view_data.edit_field % UserField::ALL.len()]
}

fn render<A: UserApi>(
    frame: &mut ratatui::Frame<'_>,
    session: &UserListSession<A>,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(frame.area());

    render_table(frame, layout[0], session, view_data);

    let status_widget = Paragraph::new(status_text(session, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[1]);

    if let Some(form) = session.form() {
        let area = centered_rect(70, 80, frame.area());
        frame.render_widget(Clear, area);
        let (text, focus_line) = form_overlay_text(form);
        let visible = area.height.saturating_sub(2);
        let scroll = focus_line.saturating_sub(visible.saturating_sub(1));
        let overlay = Paragraph::new(text).scroll((scroll, 0)).block(
            Block::default()
                .title("add new user")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table<A: UserApi>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    session: &UserListSession<A>,
    view_data: &ViewData,
) {
    let header = Row::new(COLUMN_TITLES.iter().map(|title| {
        Cell::from(*title).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let widths = [
        Constraint::Length(5),
        Constraint::Min(10),
        Constraint::Length(10),
        Constraint::Min(8),
        Constraint::Min(8),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Min(12),
        Constraint::Min(24),
    ];

    let mut rows = Vec::new();
    let mut selected_display_row = None;
    for (index, user) in session.users().iter().enumerate() {
        let selected = index == view_data.selected_row;
        let editing = session.rows().is_editing(user.id);
        let expanded = session.rows().is_expanded(user.id);
        if selected {
            selected_display_row = Some(rows.len());
        }

        let mut cells = vec![Cell::from(user.id.to_string())];
        for (position, field) in UserField::ALL.iter().enumerate() {
            let value = user.field(*field);
            if editing && position == view_data.edit_field {
                cells.push(Cell::from(format!("{value}{EDIT_CURSOR}")).style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                cells.push(Cell::from(value.to_owned()));
            }
        }
        cells.push(Cell::from(details_label(user, expanded)));

        let mut style = Style::default();
        if editing {
            style = style.fg(Color::Yellow);
        }
        if selected {
            style = style.bg(Color::DarkGray);
        }
        rows.push(Row::new(cells).style(style));

        if expanded {
            let lines = detail_lines(user);
            let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
            let mut cells = vec![Cell::from(""); COLUMN_TITLES.len() - 1];
            cells.push(Cell::from(lines.join("\n")));
            rows.push(
                Row::new(cells)
                    .height(height)
                    .style(Style::default().fg(Color::Gray)),
            );
        }
    }

    let mut title = format!("userdesk | users ({})", session.users().len());
    if let Some(id) = session.rows().editing() {
        title.push_str(&format!(" | editing {id}"));
    }
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    let mut table_state = TableState::default().with_selected(selected_display_row);
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn details_label(user: &User, expanded: bool) -> String {
    let mark = if expanded {
        EXPANDED_MARK
    } else {
        COLLAPSED_MARK
    };
    format!(
        "{mark} {} addr, {} phone",
        user.addresses.len(),
        user.phone_numbers.len()
    )
}

fn detail_lines(user: &User) -> Vec<String> {
    let mut lines = vec!["Addresses".to_owned()];
    if user.addresses.is_empty() {
        lines.push("  none".to_owned());
    }
    lines.extend(
        user.addresses
            .iter()
            .map(|address| format!("  {}", address.summary())),
    );
    lines.push("Phone Numbers".to_owned());
    if user.phone_numbers.is_empty() {
        lines.push("  none".to_owned());
    }
    lines.extend(
        user.phone_numbers
            .iter()
            .map(|phone| format!("  {}", phone.phone_number)),
    );
    lines
}

/// Returns the overlay text and the line holding the focused field.
fn form_overlay_text(form: &UserForm) -> (String, u16) {
    let mut lines = vec![
        "tab/shift+tab field | ctrl+a address | ctrl+p phone | enter submit | esc cancel".to_owned(),
        String::new(),
    ];
    let mut focus_line = 0;
    for (position, field) in form.fields().into_iter().enumerate() {
        let focused = position == form.focus_index();
        if focused {
            focus_line = lines.len();
        }
        let marker = if focused { ">" } else { " " };
        let cursor = if focused { EDIT_CURSOR } else { "" };
        lines.push(format!(
            "{marker} {}: {}{cursor}",
            field.label(),
            form.value(field)
        ));
        if let Some(hint) = form.hint_for(field) {
            lines.push(format!("    ! {}", hint.message));
        }
    }
    (
        lines.join("\n"),
        u16::try_from(focus_line).unwrap_or(u16::MAX),
    )
}

fn status_text<A: UserApi>(session: &UserListSession<A>, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let (mode, hints) = if session.form().is_some() {
        ("FORM", "enter/ctrl+s submit | esc cancel".to_owned())
    } else if session.rows().editing().is_some() {
        (
            "EDIT",
            format!(
                "field: {} | tab/shift+tab field | ctrl+s save | esc revert | ctrl+e done",
                focused_edit_field(view_data).label()
            ),
        )
    } else {
        (
            "NAV",
            "j/k g/G | enter details | e edit | a add | d del | r refresh | ? help | ctrl+q"
                .to_owned(),
        )
    };

    match session.status_line() {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k or up/down move | g/G first/last | enter show/hide details\n\
nav: e edit row | a add user | d delete row | r refresh\n\
edit: type to change the field | backspace | tab/shift+tab field\n\
edit: ctrl+s save | esc revert and leave | ctrl+e leave (keeps changes) or switch row\n\
form: tab/shift+tab field | ctrl+a add address | ctrl+p add phone\n\
form: enter or ctrl+s submit | esc cancel"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        InternalEvent, ViewData, detail_lines, form_overlay_text, handle_key_event,
        process_internal_events, render, status_for_events, status_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use userdesk_app::{
        Address, PhoneNumber, RemoteOperation, SessionEvent, User, UserField, UserId,
        UserListSession,
    };
    use userdesk_testkit::{MemoryUserApi, UserFaker};

    fn named(id: i64, name: &str) -> User {
        let mut user = UserFaker::new(id as u64).user(id);
        user.name = name.to_owned();
        user
    }

    fn loaded_session() -> UserListSession<MemoryUserApi> {
        let mut session = UserListSession::new(MemoryUserApi::new(vec![
            named(1, "Alice"),
            named(2, "Bob"),
            named(3, "Cara"),
        ]));
        session.refresh();
        session
    }

    fn view_data_for_test() -> ViewData {
        ViewData::default()
    }

    fn internal_channel() -> (
        mpsc::Sender<InternalEvent>,
        mpsc::Receiver<InternalEvent>,
    ) {
        mpsc::channel()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn chars(text: &str) -> Vec<KeyEvent> {
        text.chars().map(|ch| key(KeyCode::Char(ch))).collect()
    }

    fn run_key_script(
        session: &mut UserListSession<MemoryUserApi>,
        view_data: &mut ViewData,
        tx: &mpsc::Sender<InternalEvent>,
        rx: &mpsc::Receiver<InternalEvent>,
        keys: &[KeyEvent],
    ) {
        for key in keys {
            let _ = handle_key_event(session, view_data, tx, *key);
            process_internal_events(session, view_data, rx);
        }
    }

    fn rendered(session: &UserListSession<MemoryUserApi>, view_data: &ViewData) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 40)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, session, view_data))
            .expect("draw frame");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn ctrl_q_quits() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, _rx) = internal_channel();
        assert!(handle_key_event(&mut session, &mut view_data, &tx, ctrl('q')));
        assert!(!handle_key_event(
            &mut session,
            &mut view_data,
            &tx,
            key(KeyCode::Char('q'))
        ));
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        run_key_script(
            &mut session,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('k')), key(KeyCode::Down)],
        );
        assert_eq!(view_data.selected_row, 1);

        run_key_script(
            &mut session,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('G')), key(KeyCode::Char('j'))],
        );
        assert_eq!(view_data.selected_row, 2);

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Char('g'))]);
        assert_eq!(view_data.selected_row, 0);
    }

    #[test]
    fn enter_toggles_details_of_selected_row() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        run_key_script(
            &mut session,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('j')), key(KeyCode::Enter)],
        );
        assert!(session.rows().is_expanded(UserId::new(2)));
        assert!(rendered(&session, &view_data).contains("Phone Numbers"));

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Enter)]);
        assert!(session.rows().expanded().is_empty());
        assert!(!rendered(&session, &view_data).contains("Phone Numbers"));
    }

    #[test]
    fn edit_typing_then_ctrl_s_saves_and_leaves_edit_mode() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Char('e'))]);
        assert_eq!(session.rows().editing(), Some(UserId::new(1)));
        assert_eq!(session.status_line(), Some("editing user 1"));

        let mut keys = vec![key(KeyCode::Backspace)];
        keys.extend(chars("a"));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);
        assert_eq!(session.users()[0].name, "Alica");
        assert_eq!(session.api().users()[0].name, "Alice");

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[ctrl('s')]);
        assert_eq!(session.rows().editing(), None);
        assert_eq!(session.api().users()[0].name, "Alica");
        assert_eq!(session.status_line(), Some("saved user 1"));
    }

    #[test]
    fn tab_moves_the_edited_field() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();
        let before = session.users()[0].birthdate.clone();

        let mut keys = vec![
            key(KeyCode::Char('e')),
            key(KeyCode::Tab),
            key(KeyCode::Tab),
            key(KeyCode::BackTab),
        ];
        keys.extend(chars("x"));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);

        assert_eq!(session.users()[0].birthdate, format!("{before}x"));
        assert_eq!(session.users()[0].name, "Alice");
        assert!(status_text(&session, &view_data).contains("field: Birthdate"));
    }

    #[test]
    fn esc_reverts_local_edits() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        let mut keys = vec![key(KeyCode::Char('e'))];
        keys.extend(chars("zzz"));
        keys.push(key(KeyCode::Esc));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);

        assert_eq!(session.rows().editing(), None);
        assert_eq!(session.users()[0].name, "Alice");
        assert_eq!(session.status_line(), Some("changes to user 1 reverted"));
    }

    #[test]
    fn ctrl_e_on_another_row_switches_the_edit_target() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        let mut keys = vec![key(KeyCode::Char('e'))];
        keys.extend(chars("!"));
        keys.push(key(KeyCode::Down));
        keys.push(ctrl('e'));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);

        assert_eq!(session.rows().editing(), Some(UserId::new(2)));
        assert_eq!(session.users()[0].name, "Alice!");

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[ctrl('e')]);
        assert_eq!(session.rows().editing(), None);
    }

    #[test]
    fn failed_save_stays_in_edit_mode_with_status() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();
        session.api_mut().fail_next(RemoteOperation::Update, 1);

        let mut keys = vec![key(KeyCode::Char('e'))];
        keys.extend(chars("!"));
        keys.push(ctrl('s'));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);

        assert_eq!(session.rows().editing(), Some(UserId::new(1)));
        assert_eq!(session.users()[0].name, "Alice!");
        assert!(
            session
                .status_line()
                .is_some_and(|status| status.starts_with("save failed"))
        );
    }

    #[test]
    fn d_deletes_selected_row_and_clamps_selection() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        run_key_script(
            &mut session,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('G')), key(KeyCode::Char('d'))],
        );

        assert_eq!(session.users().len(), 2);
        assert_eq!(view_data.selected_row, 1);
        assert_eq!(session.status_line(), Some("deleted user 3"));
    }

    #[test]
    fn form_submit_creates_user_and_refreshes() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        let mut keys = vec![key(KeyCode::Char('a'))];
        keys.extend(chars("Dana Reed"));
        keys.push(ctrl('p'));
        keys.extend(chars("555-0199"));
        keys.push(key(KeyCode::Enter));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);

        assert!(session.form().is_none());
        assert_eq!(session.users().len(), 4);
        let created = &session.users()[3];
        assert_eq!(created.name, "Dana Reed");
        assert_eq!(created.phone_numbers.len(), 2);
        assert_eq!(created.phone_numbers[1].phone_number, "555-0199");
        assert_eq!(session.status_line(), Some("user created"));
    }

    #[test]
    fn invalid_form_stays_open_with_hint() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        let mut keys = vec![key(KeyCode::Char('a'))];
        keys.extend(chars("Bo"));
        keys.push(key(KeyCode::Enter));
        run_key_script(&mut session, &mut view_data, &tx, &rx, &keys);

        assert!(session.form().is_some());
        assert_eq!(session.api().users().len(), 3);
        assert!(
            session
                .status_line()
                .is_some_and(|status| status.contains("Name needs at least 4"))
        );

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Esc)]);
        assert!(session.form().is_none());
    }

    #[test]
    fn form_overlay_marks_focus_and_hints() {
        let mut session = loaded_session();
        session.open_form();
        let form = session.form_mut().expect("form open");
        form.push_char('B');
        form.next_field();

        let (text, focus_line) = form_overlay_text(form);
        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines.contains(&"  Name: B"));
        assert!(lines.iter().any(|line| line.contains("! Name needs at least 4")));
        assert!(lines[usize::from(focus_line)].starts_with("> Birthdate:"));
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        run_key_script(
            &mut session,
            &mut view_data,
            &tx,
            &rx,
            &[key(KeyCode::Char('?')), key(KeyCode::Char('d'))],
        );
        assert!(view_data.help_visible);
        assert_eq!(session.users().len(), 3);
        assert_eq!(status_text(&session, &view_data), "");

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Esc)]);
        assert!(!view_data.help_visible);
    }

    #[test]
    fn status_clears_only_for_current_token() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();

        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Char('r'))]);
        assert_eq!(session.status_line(), Some("loaded 3 users"));

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token - 1,
        })
        .expect("send stale token");
        process_internal_events(&mut session, &view_data, &rx);
        assert!(session.status_line().is_some());

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token,
        })
        .expect("send current token");
        process_internal_events(&mut session, &view_data, &rx);
        assert_eq!(session.status_line(), None);
    }

    #[test]
    fn failure_status_wins_over_success_messages() {
        let events = vec![
            SessionEvent::FormClosed,
            SessionEvent::Created,
            SessionEvent::RemoteFailed {
                operation: RemoteOperation::Refresh,
                message: "server returned 503".to_owned(),
            },
        ];
        assert_eq!(
            status_for_events(&events).as_deref(),
            Some("refresh failed: server returned 503")
        );
        assert_eq!(
            status_for_events(&[SessionEvent::Saved(UserId::new(4)), SessionEvent::Refreshed {
                count: 1
            }])
            .as_deref(),
            Some("saved user 4")
        );
    }

    #[test]
    fn detail_lines_list_addresses_then_phones() {
        let mut user = named(9, "Eve");
        user.addresses = vec![Address {
            street: "Ring".to_owned(),
            number: "1".to_owned(),
            city: "Vienna".to_owned(),
            postal_code: "1010".to_owned(),
            country: "Austria".to_owned(),
        }];
        user.phone_numbers = vec![PhoneNumber {
            phone_number: "+43 1 111".to_owned(),
        }];
        assert_eq!(
            detail_lines(&user),
            vec![
                "Addresses",
                "  Ring 1, Vienna, 1010, Austria",
                "Phone Numbers",
                "  +43 1 111",
            ]
        );

        user.addresses.clear();
        user.phone_numbers.clear();
        assert_eq!(
            detail_lines(&user),
            vec!["Addresses", "  none", "Phone Numbers", "  none"]
        );
    }

    #[test]
    fn table_shows_edit_cursor_on_focused_field() {
        let mut session = loaded_session();
        let mut view_data = view_data_for_test();
        let (tx, rx) = internal_channel();
        run_key_script(&mut session, &mut view_data, &tx, &rx, &[key(KeyCode::Char('e'))]);

        let screen = rendered(&session, &view_data);
        assert!(screen.contains("Alice▏"));
        assert!(screen.contains("editing 1"));
        assert_eq!(view_data.edit_field, 0);
        assert_eq!(super::focused_edit_field(&view_data), UserField::Name);
    }
}
