//! Interest rate timeline.

use crate::error::{Result, ScheduleError};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// An annual rate effective from `date` onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateEntry {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Step function of the annual interest rate, one entry per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTimeline {
    entries: BTreeMap<NaiveDate, Decimal>,
}

impl RateTimeline {
    pub fn new() -> Self {
        RateTimeline {
            entries: BTreeMap::new(),
        }
    }

    /// Stores the rate effective from `date`, replacing any rate already set
    /// on that date.
    pub fn add_rate(&mut self, date: NaiveDate, rate: Decimal) -> Result<()> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(ScheduleError::NegativeRate { date, rate });
        }
        self.entries.insert(date, rate);
        debug!("Rate {} effective from {}", rate, date);
        Ok(())
    }

    /// Rate on `date`: the latest entry dated on or before it, or zero.
    pub fn rate_at(&self, date: NaiveDate) -> Decimal {
        self.entries
            .range(..=date)
            .next_back()
            .map(|(_, rate)| *rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// Iterates over entries in ascending date order.
    pub fn entries(&self) -> impl Iterator<Item = RateEntry> + '_ {
        self.entries
            .iter()
            .map(|(date, rate)| RateEntry {
                date: *date,
                rate: *rate,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
