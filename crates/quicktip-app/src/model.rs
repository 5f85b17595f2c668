// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Calculator,
    History,
}

impl Screen {
    pub const ALL: [Self; 2] = [Self::Calculator, Self::History];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Calculator => "calculate",
            Self::History => "history",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormField {
    Bill,
    CustomPercent,
}

impl FormField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bill => "bill amount",
            Self::CustomPercent => "custom tip",
        }
    }
}

/// A recorded tip. `tip_amount` is stored alongside its inputs so history
/// keeps showing what was recorded even if the calculation ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipRecord {
    pub id: TipRecordId,
    pub bill_amount: f64,
    pub tip_percent: i32,
    pub tip_amount: f64,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTipRecord {
    pub bill_amount: f64,
    pub tip_percent: i32,
    pub tip_amount: f64,
    pub timestamp: OffsetDateTime,
}

impl NewTipRecord {
    pub fn new(bill_amount: f64, tip_percent: i32, timestamp: OffsetDateTime) -> Self {
        Self {
            bill_amount,
            tip_percent,
            tip_amount: crate::tip_amount(bill_amount, tip_percent),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreChange {
    Appended(TipRecordId),
    Deleted(TipRecordId),
    Cleared,
}
