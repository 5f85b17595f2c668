// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FormField, FormState, Screen};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub form: FormState,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Calculator,
            form: FormState::default(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ShowScreen(Screen),
    ToggleScreen,
    Focus(FormField),
    ClearFocus,
    SelectPercent(usize),
    RotatePercent(isize),
    Input(char),
    Backspace,
    ResetForm,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    FocusChanged(Option<FormField>),
    PercentChanged(usize),
    FormEdited,
    FormReset,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ShowScreen(screen) => self.show_screen(screen),
            AppCommand::ToggleScreen => {
                let next = match self.screen {
                    Screen::Calculator => Screen::History,
                    Screen::History => Screen::Calculator,
                };
                self.show_screen(next)
            }
            AppCommand::Focus(field) => match self.form.focus(field) {
                Ok(()) => vec![AppEvent::FocusChanged(self.form.focus)],
                Err(error) => vec![self.set_status(&error.to_string())],
            },
            AppCommand::ClearFocus => {
                self.form.clear_focus();
                vec![AppEvent::FocusChanged(None)]
            }
            AppCommand::SelectPercent(index) => {
                let focus_before = self.form.focus;
                self.form.select_percent(index);
                self.percent_events(focus_before)
            }
            AppCommand::RotatePercent(delta) => {
                let focus_before = self.form.focus;
                self.form.rotate_percent(delta);
                self.percent_events(focus_before)
            }
            AppCommand::Input(ch) => {
                if self.form.insert_char(ch) {
                    vec![AppEvent::FormEdited]
                } else {
                    Vec::new()
                }
            }
            AppCommand::Backspace => {
                if self.form.backspace() {
                    vec![AppEvent::FormEdited]
                } else {
                    Vec::new()
                }
            }
            AppCommand::ResetForm => {
                self.form.reset();
                vec![
                    AppEvent::FormReset,
                    AppEvent::FocusChanged(self.form.focus),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn show_screen(&mut self, screen: Screen) -> Vec<AppEvent> {
        self.screen = screen;
        if screen == Screen::History {
            self.form.clear_focus();
        }
        vec![AppEvent::ScreenChanged(screen)]
    }

    fn percent_events(&self, focus_before: Option<FormField>) -> Vec<AppEvent> {
        let mut events = vec![AppEvent::PercentChanged(self.form.selected_percent_index)];
        if self.form.focus != focus_before {
            events.push(AppEvent::FocusChanged(self.form.focus));
        }
        events
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
