// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::OffsetDateTime;

use crate::{
    CUSTOM_PERCENT_INDEX, FormField, NewTipRecord, PRESET_PERCENTAGES, parse_bill, resolve_percent,
};

/// Transient calculator input. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub bill_input: String,
    pub selected_percent_index: usize,
    pub custom_percent_input: String,
    pub focus: Option<FormField>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            bill_input: String::new(),
            selected_percent_index: 0,
            custom_percent_input: String::new(),
            focus: Some(FormField::Bill),
        }
    }
}

impl FormState {
    pub fn resolved_bill(&self) -> f64 {
        parse_bill(&self.bill_input)
    }

    pub fn resolved_percent(&self) -> i32 {
        resolve_percent(self.selected_percent_index, &self.custom_percent_input)
    }

    pub fn tip_amount(&self) -> f64 {
        crate::tip_amount(self.resolved_bill(), self.resolved_percent())
    }

    pub fn is_custom_selected(&self) -> bool {
        self.selected_percent_index == CUSTOM_PERCENT_INDEX
    }

    pub fn can_record(&self) -> bool {
        !self.bill_input.is_empty()
    }

    pub fn focus(&mut self, field: FormField) -> Result<()> {
        if field == FormField::CustomPercent && !self.is_custom_selected() {
            bail!("custom tip is hidden -- select the custom option first");
        }
        self.focus = Some(field);
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    pub fn select_percent(&mut self, index: usize) {
        self.selected_percent_index = index.min(CUSTOM_PERCENT_INDEX);
        if !self.is_custom_selected() && self.focus == Some(FormField::CustomPercent) {
            self.focus = Some(FormField::Bill);
        }
    }

    /// Moves the picker by `delta`, wrapping across the presets and the
    /// custom option.
    pub fn rotate_percent(&mut self, delta: isize) {
        let len = (PRESET_PERCENTAGES.len() + 1) as isize;
        let next = (self.selected_percent_index as isize + delta).rem_euclid(len) as usize;
        self.select_percent(next);
    }

    /// Types a character into the focused field. Returns false when nothing
    /// has focus or the field rejects the character.
    pub fn insert_char(&mut self, ch: char) -> bool {
        match self.focus {
            Some(FormField::Bill) => {
                let accepted = ch.is_ascii_digit() || (ch == '.' && !self.bill_input.contains('.'));
                if accepted {
                    self.bill_input.push(ch);
                }
                accepted
            }
            Some(FormField::CustomPercent) => {
                let accepted = ch.is_ascii_digit();
                if accepted {
                    self.custom_percent_input.push(ch);
                }
                accepted
            }
            None => false,
        }
    }

    pub fn backspace(&mut self) -> bool {
        match self.focus {
            Some(FormField::Bill) => self.bill_input.pop().is_some(),
            Some(FormField::CustomPercent) => self.custom_percent_input.pop().is_some(),
            None => false,
        }
    }

    /// Builds the record for the current input. `None` while recording is
    /// disabled.
    pub fn record(&self, now: OffsetDateTime) -> Option<NewTipRecord> {
        if !self.can_record() {
            return None;
        }
        Some(NewTipRecord::new(
            self.resolved_bill(),
            self.resolved_percent(),
            now,
        ))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::FormState;
    use crate::{CUSTOM_PERCENT_INDEX, FormField};
    use time::OffsetDateTime;

    fn form(bill: &str, index: usize, custom: &str) -> FormState {
        FormState {
            bill_input: bill.to_owned(),
            selected_percent_index: index,
            custom_percent_input: custom.to_owned(),
            ..FormState::default()
        }
    }

    #[test]
    fn preset_fifteen_on_forty_two_fifty() {
        let state = form("42.50", 1, "");
        assert_eq!(state.resolved_percent(), 15);
        assert_eq!(state.tip_amount(), 6.375);
    }

    #[test]
    fn empty_bill_yields_zero_and_disables_record() {
        for index in 0..=CUSTOM_PERCENT_INDEX {
            let state = form("", index, "18");
            assert_eq!(state.tip_amount(), 0.0);
            assert!(!state.can_record());
            assert!(state.record(OffsetDateTime::UNIX_EPOCH).is_none());
        }
    }

    #[test]
    fn non_numeric_custom_percent_yields_zero_tip() {
        let state = form("20", CUSTOM_PERCENT_INDEX, "abc");
        assert_eq!(state.resolved_percent(), 0);
        assert_eq!(state.tip_amount(), 0.0);
    }

    #[test]
    fn record_captures_resolved_values() {
        let state = form("80", CUSTOM_PERCENT_INDEX, "18");
        let record = state
            .record(OffsetDateTime::UNIX_EPOCH)
            .expect("record enabled");
        assert_eq!(record.bill_amount, 80.0);
        assert_eq!(record.tip_percent, 18);
        assert_eq!(record.tip_amount, 14.4);
        assert_eq!(record.timestamp, OffsetDateTime::UNIX_EPOCH);
    }

    #[test]
    fn twenty_digit_bill_formats_without_clamping() {
        let state = form("100000000000000000000", 0, "");
        let record = state
            .record(OffsetDateTime::UNIX_EPOCH)
            .expect("record enabled");
        assert_eq!(record.tip_amount, 1e19);
        assert_eq!(
            crate::format_currency(state.tip_amount(), "$"),
            "$10,000,000,000,000,000,000.00"
        );
    }

    #[test]
    fn reset_restores_initial_state_and_bill_focus() {
        let mut state = form("12", CUSTOM_PERCENT_INDEX, "7");
        state.focus = Some(FormField::CustomPercent);
        state.reset();
        assert_eq!(state, FormState::default());
        assert_eq!(state.focus, Some(FormField::Bill));
    }

    #[test]
    fn custom_field_needs_custom_selection() {
        let mut state = FormState::default();
        assert!(state.focus(FormField::CustomPercent).is_err());

        state.select_percent(CUSTOM_PERCENT_INDEX);
        assert!(state.focus(FormField::CustomPercent).is_ok());
        assert_eq!(state.focus, Some(FormField::CustomPercent));

        state.select_percent(2);
        assert_eq!(state.focus, Some(FormField::Bill));
    }

    #[test]
    fn rotate_percent_wraps_through_custom() {
        let mut state = FormState::default();
        state.rotate_percent(-1);
        assert_eq!(state.selected_percent_index, CUSTOM_PERCENT_INDEX);
        state.rotate_percent(1);
        assert_eq!(state.selected_percent_index, 0);
    }

    #[test]
    fn bill_field_filters_input() {
        let mut state = FormState::default();
        for ch in "4a2.5.0".chars() {
            state.insert_char(ch);
        }
        assert_eq!(state.bill_input, "42.50");

        assert!(state.backspace());
        assert_eq!(state.bill_input, "42.5");
    }

    #[test]
    fn custom_field_accepts_digits_only() {
        let mut state = form("", CUSTOM_PERCENT_INDEX, "");
        state.focus = Some(FormField::CustomPercent);
        assert!(state.insert_char('1'));
        assert!(!state.insert_char('.'));
        assert!(state.insert_char('8'));
        assert_eq!(state.custom_percent_input, "18");
    }

    #[test]
    fn typing_without_focus_is_ignored() {
        let mut state = FormState::default();
        state.clear_focus();
        assert!(!state.insert_char('5'));
        assert!(!state.backspace());
        assert!(state.bill_input.is_empty());
    }
}
