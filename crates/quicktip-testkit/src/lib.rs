// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use quicktip_app::{NewTipRecord, PRESET_PERCENTAGES};
use std::path::PathBuf;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const CUSTOM_PERCENTAGES: [i32; 4] = [12, 18, 22, 30];

const MIN_BILL_CENTS: i64 = 8_00;
const MAX_BILL_CENTS: i64 = 180_00;
const MAX_TIPS_PER_DAY: usize = 3;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for plausible tip records.
#[derive(Debug, Clone)]
pub struct TipFaker {
    rng: DeterministicRng,
}

impl TipFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn bill_amount(&mut self) -> f64 {
        let cents = self.int_range_i64(MIN_BILL_CENTS, MAX_BILL_CENTS);
        cents as f64 / 100.0
    }

    /// Mostly presets, with the occasional custom percentage.
    pub fn tip_percent(&mut self) -> i32 {
        if self.rng.int_n(5) == 0 {
            CUSTOM_PERCENTAGES[self.rng.int_n(CUSTOM_PERCENTAGES.len())]
        } else {
            PRESET_PERCENTAGES[self.rng.int_n(PRESET_PERCENTAGES.len())]
        }
    }

    pub fn tip_at(&mut self, timestamp: OffsetDateTime) -> NewTipRecord {
        let bill_amount = self.bill_amount();
        let tip_percent = self.tip_percent();
        NewTipRecord::new(bill_amount, tip_percent, timestamp)
    }

    /// Records spread over the `days` days ending at `now`, oldest first.
    /// Some days are left empty.
    pub fn history(&mut self, now: OffsetDateTime, days: u32) -> Vec<NewTipRecord> {
        let mut records = Vec::new();
        for day in 0..i64::from(days) {
            if day > 0 && self.rng.bool() && self.rng.bool() {
                continue;
            }
            let count = 1 + self.rng.int_n(MAX_TIPS_PER_DAY);
            for _ in 0..count {
                let minutes_back = self.int_range_i64(0, 10 * 60);
                let timestamp = now - Duration::days(day) - Duration::minutes(minutes_back);
                records.push(self.tip_at(timestamp));
            }
        }
        records.sort_by_key(|record| record.timestamp);
        records
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("quicktip.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> OffsetDateTime {
    datetime!(2023-03-15 12:34:56 UTC)
}
