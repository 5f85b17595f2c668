// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use time::macros::format_description;
use time::{Date, UtcOffset};

use crate::TipRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: Date,
    pub label: String,
    pub records: Vec<TipRecord>,
}

impl DayGroup {
    pub fn bill_total(&self) -> f64 {
        self.records.iter().map(|record| record.bill_amount).sum()
    }

    pub fn tip_total(&self) -> f64 {
        self.records.iter().map(|record| record.tip_amount).sum()
    }
}

/// Partitions records by calendar day in `offset`. Days come back most
/// recent first; records keep the order they were given in.
pub fn group_by_day(records: &[TipRecord], offset: UtcOffset) -> Vec<DayGroup> {
    let mut days: BTreeMap<Date, Vec<TipRecord>> = BTreeMap::new();
    for record in records {
        let day = record.timestamp.to_offset(offset).date();
        days.entry(day).or_default().push(record.clone());
    }

    days.into_iter()
        .rev()
        .map(|(date, records)| DayGroup {
            date,
            label: day_label(date),
            records,
        })
        .collect()
}

/// Medium date style, e.g. `Mar 15, 2023`.
pub fn day_label(date: Date) -> String {
    date.format(&format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}
