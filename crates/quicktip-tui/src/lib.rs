// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use quicktip_app::{
    AppCommand, AppEvent, AppState, DEFAULT_CURRENCY_SYMBOL, DayGroup, FormField, FormState,
    NewTipRecord, PRESET_PERCENTAGES, Screen, TipRecord, TipRecordId, format_currency,
    format_percent, group_by_day, percent_option_label,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

pub trait AppRuntime {
    fn load_history(&mut self) -> Result<Vec<TipRecord>>;
    fn record_tip(&mut self, record: &NewTipRecord) -> Result<TipRecordId>;
    fn delete_tip(&mut self, id: TipRecordId) -> Result<bool>;
    // Bumped on every stored change; the UI reloads on an unseen value.
    fn revision(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    pub currency_symbol: String,
    pub utc_offset: UtcOffset,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_owned(),
            utc_offset: UtcOffset::UTC,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    settings: UiSettings,
    groups: Vec<DayGroup>,
    record_count: usize,
    cursor: usize,
    loaded_revision: Option<u64>,
    status_token: u64,
}

impl ViewData {
    fn new(settings: UiSettings) -> Self {
        Self {
            settings,
            groups: Vec::new(),
            record_count: 0,
            cursor: 0,
            loaded_revision: None,
            status_token: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryRow {
    text: String,
    selected: bool,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    settings: UiSettings,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut terminal = setup_or_restore(
        || {
            let mut stdout = io::stdout();
            execute!(stdout, terminal::EnterAlternateScreen)
                .context("enter alternate screen")?;
            Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")
        },
        restore_terminal,
    )?;

    let mut view_data = ViewData::new(settings);
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        sync_history(state, runtime, &mut view_data, &internal_tx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    restore_terminal()?;
    result
}

// Raw mode is already on when `setup` runs, so a failed setup must undo it.
fn setup_or_restore<T>(
    setup: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    match setup() {
        Ok(value) => Ok(value),
        Err(error) => {
            if let Err(restore_error) = restore() {
                tracing::warn!("restore terminal after failed setup: {restore_error:#}");
            }
            Err(error)
        }
    }
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    Ok(())
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_command(
        state,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn dispatch_command(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    let quit = match state.screen {
        Screen::Calculator => handle_calculator_key(state, runtime, view_data, internal_tx, key),
        Screen::History => handle_history_key(state, runtime, view_data, internal_tx, key),
    };
    sync_history(state, runtime, view_data, internal_tx);
    quit
}

fn handle_calculator_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Enter => {
            record_current_tip(state, runtime, view_data, internal_tx);
            return false;
        }
        KeyCode::Left => {
            dispatch_command(state, view_data, internal_tx, AppCommand::RotatePercent(-1));
            return false;
        }
        KeyCode::Right => {
            dispatch_command(state, view_data, internal_tx, AppCommand::RotatePercent(1));
            return false;
        }
        KeyCode::Tab => {
            let next = next_focus(&state.form);
            dispatch_command(state, view_data, internal_tx, AppCommand::Focus(next));
            return false;
        }
        _ => {}
    }

    if state.form.focus.is_some() {
        match key.code {
            KeyCode::Esc => {
                dispatch_command(state, view_data, internal_tx, AppCommand::ClearFocus);
            }
            KeyCode::Backspace => {
                dispatch_command(state, view_data, internal_tx, AppCommand::Backspace);
            }
            KeyCode::Char(ch) if !has_command_modifier(key.modifiers) => {
                dispatch_command(state, view_data, internal_tx, AppCommand::Input(ch));
            }
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('h') => {
            dispatch_command(
                state,
                view_data,
                internal_tx,
                AppCommand::ShowScreen(Screen::History),
            );
        }
        KeyCode::Char('b') => {
            dispatch_command(
                state,
                view_data,
                internal_tx,
                AppCommand::Focus(FormField::Bill),
            );
        }
        KeyCode::Char('c') => {
            dispatch_command(
                state,
                view_data,
                internal_tx,
                AppCommand::Focus(FormField::CustomPercent),
            );
        }
        KeyCode::Char(ch) => {
            if let Some(index) = percent_index_for_key(ch) {
                dispatch_command(
                    state,
                    view_data,
                    internal_tx,
                    AppCommand::SelectPercent(index),
                );
            }
        }
        _ => {}
    }
    false
}

fn handle_history_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Tab => {
            dispatch_command(
                state,
                view_data,
                internal_tx,
                AppCommand::ShowScreen(Screen::Calculator),
            );
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let last = view_data.record_count.saturating_sub(1);
            view_data.cursor = (view_data.cursor + 1).min(last);
        }
        KeyCode::Char('g') => view_data.cursor = 0,
        KeyCode::Char('G') => view_data.cursor = view_data.record_count.saturating_sub(1),
        KeyCode::Char('d') => delete_selected_tip(state, runtime, view_data, internal_tx),
        _ => {}
    }
    false
}

fn has_command_modifier(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

// `1`..`4` pick a preset, the next digit picks custom.
fn percent_index_for_key(ch: char) -> Option<usize> {
    let digit = ch.to_digit(10)? as usize;
    (1..=PRESET_PERCENTAGES.len() + 1)
        .contains(&digit)
        .then(|| digit - 1)
}

fn next_focus(form: &FormState) -> FormField {
    match form.focus {
        Some(FormField::Bill) if form.is_custom_selected() => FormField::CustomPercent,
        _ => FormField::Bill,
    }
}

fn record_current_tip<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(record) = state.form.record(OffsetDateTime::now_utc()) else {
        emit_status(
            state,
            view_data,
            internal_tx,
            "enter a bill amount before recording",
        );
        return;
    };

    match runtime.record_tip(&record) {
        Ok(id) => {
            tracing::info!(id = id.get(), percent = record.tip_percent, "tip recorded");
            dispatch_command(state, view_data, internal_tx, AppCommand::ResetForm);
            let symbol = view_data.settings.currency_symbol.clone();
            emit_status(
                state,
                view_data,
                internal_tx,
                format!(
                    "recorded {} tip on {}",
                    format_currency(record.tip_amount, &symbol),
                    format_currency(record.bill_amount, &symbol),
                ),
            );
        }
        Err(error) => {
            tracing::error!("record tip failed: {error:#}");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("record failed: {error}; press enter to retry"),
            );
        }
    }
}

fn delete_selected_tip<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = selected_record(view_data).map(|record| record.id) else {
        emit_status(state, view_data, internal_tx, "nothing to delete");
        return;
    };

    match runtime.delete_tip(id) {
        Ok(true) => emit_status(state, view_data, internal_tx, "deleted"),
        Ok(false) => emit_status(state, view_data, internal_tx, "already deleted"),
        Err(error) => {
            tracing::error!(id = id.get(), "delete tip failed: {error:#}");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("delete failed: {error}"),
            );
        }
    }
}

fn selected_record(view_data: &ViewData) -> Option<&TipRecord> {
    view_data
        .groups
        .iter()
        .flat_map(|group| group.records.iter())
        .nth(view_data.cursor)
}

fn sync_history<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let revision = runtime.revision();
    if view_data.loaded_revision == Some(revision) {
        return;
    }
    if let Err(error) = refresh_history(runtime, view_data) {
        tracing::error!("load history failed: {error:#}");
        // Don't retry every frame; the next store change triggers a reload.
        view_data.loaded_revision = Some(revision);
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
    }
}

fn refresh_history<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    let revision = runtime.revision();
    let records = runtime.load_history()?;
    view_data.groups = group_by_day(&records, view_data.settings.utc_offset);
    view_data.record_count = records.len();
    view_data.cursor = view_data.cursor.min(records.len().saturating_sub(1));
    view_data.loaded_revision = Some(revision);
    Ok(())
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = Screen::ALL
        .iter()
        .position(|screen| *screen == state.screen)
        .unwrap_or(0);
    let titles = Screen::ALL
        .iter()
        .map(|screen| screen.label().to_owned())
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("quicktip").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.screen {
        Screen::Calculator => {
            let body = Paragraph::new(calculator_text(state, &view_data.settings))
                .block(Block::default().borders(Borders::ALL).title("calculate"));
            frame.render_widget(body, layout[1]);
        }
        Screen::History => {
            let rows = history_rows(view_data);
            let visible = usize::from(layout[1].height.saturating_sub(2)).max(1);
            let selected_row = rows.iter().position(|row| row.selected).unwrap_or(0);
            let scroll = selected_row.saturating_sub(visible - 1);
            let lines = rows
                .into_iter()
                .map(|row| {
                    if row.selected {
                        Line::styled(
                            row.text,
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        Line::from(row.text)
                    }
                })
                .collect::<Vec<Line<'_>>>();
            let body = Paragraph::new(lines)
                .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
                .block(Block::default().borders(Borders::ALL).title("history"));
            frame.render_widget(body, layout[1]);
        }
    }

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn calculator_text(state: &AppState, settings: &UiSettings) -> String {
    let form = &state.form;
    let mut lines = vec![
        format!(
            "bill amount  {}",
            field_text(&form.bill_input, form.focus == Some(FormField::Bill))
        ),
        format!("tip          {}", percent_picker_text(form)),
    ];
    if form.is_custom_selected() {
        lines.push(format!(
            "custom tip   {}%",
            field_text(
                &form.custom_percent_input,
                form.focus == Some(FormField::CustomPercent)
            )
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "tip amount   {}",
        format_currency(form.tip_amount(), &settings.currency_symbol)
    ));
    lines.push(String::new());
    lines.push(if form.can_record() {
        "enter: record tip".to_owned()
    } else {
        "enter a bill amount to record".to_owned()
    });
    lines.join("\n")
}

fn field_text(value: &str, focused: bool) -> String {
    let cursor = if focused { "_" } else { "" };
    format!("[{value}{cursor}]")
}

fn percent_picker_text(form: &FormState) -> String {
    (0..=PRESET_PERCENTAGES.len())
        .map(|index| {
            let label = percent_option_label(index);
            if index == form.selected_percent_index {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn history_rows(view_data: &ViewData) -> Vec<HistoryRow> {
    if view_data.groups.is_empty() {
        return vec![HistoryRow {
            text: "no tips recorded yet".to_owned(),
            selected: false,
        }];
    }

    let symbol = view_data.settings.currency_symbol.as_str();
    let time_format = format_description!("[hour]:[minute]");
    let mut rows = Vec::new();
    let mut index = 0usize;
    for (group_index, group) in view_data.groups.iter().enumerate() {
        if group_index > 0 {
            rows.push(HistoryRow {
                text: String::new(),
                selected: false,
            });
        }
        rows.push(HistoryRow {
            text: format!(
                "{}  tips {} on {}",
                group.label,
                format_currency(group.tip_total(), symbol),
                format_currency(group.bill_total(), symbol),
            ),
            selected: false,
        });
        for record in &group.records {
            let selected = index == view_data.cursor;
            let marker = if selected { ">" } else { " " };
            let time = record
                .timestamp
                .to_offset(view_data.settings.utc_offset)
                .format(&time_format)
                .unwrap_or_default();
            rows.push(HistoryRow {
                text: format!(
                    "{marker} {time}  {:>12}  {:>4}  {:>10}",
                    format_currency(record.bill_amount, symbol),
                    format_percent(record.tip_percent),
                    format_currency(record.tip_amount, symbol),
                ),
                selected,
            });
            index += 1;
        }
    }
    rows
}

#[cfg(test)]
fn history_text(view_data: &ViewData) -> String {
    history_rows(view_data)
        .into_iter()
        .map(|row| row.text)
        .collect::<Vec<String>>()
        .join("\n")
}

fn status_text(state: &AppState) -> String {
    let editing = state.screen == Screen::Calculator && state.form.focus.is_some();
    let mode = if editing { "EDIT" } else { "NAV" };
    let hints = match state.screen {
        Screen::Calculator if editing => {
            "type to edit | ←/→ tip | tab field | esc done | enter record | ctrl+q"
        }
        Screen::Calculator => "b/c field | ←/→ 1-5 tip | enter record | h history | q quit",
        Screen::History => "↑/↓ move | d delete | esc back | q quit",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}
