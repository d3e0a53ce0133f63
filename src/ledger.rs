//! Flow ledger and the derived engagement (outstanding balance) timeline.
//!
//! Maintains one [`FlowEntry`] per calendar date. The engagement timeline is a
//! right-continuous step function: a flow dated `D` changes the engagement
//! starting on `D + 1`.

use crate::error::{Result, ScheduleError};
use crate::money::Money;
use chrono::{Duration, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Which component of a [`FlowEntry`] a flow updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Capital drawn by the borrower.
    Payment,

    /// Capital returned by the borrower. May be negative as a correction.
    Repayment,
}

/// Net payment/repayment activity of a single day.
///
/// # Invariants
///
/// - `payment >= 0`
/// - `balance() == payment - repayment`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry {
    pub date: NaiveDate,
    pub payment: Money,
    pub repayment: Money,
}

impl FlowEntry {
    /// Creates an empty entry for a day.
    pub fn new(date: NaiveDate) -> Self {
        FlowEntry {
            date,
            payment: Money::ZERO,
            repayment: Money::ZERO,
        }
    }

    /// Net change of the outstanding balance caused by this day.
    pub fn balance(&self) -> Money {
        self.payment - self.repayment
    }
}

/// Day-keyed record of draws and repayments, always sorted by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowLedger {
    entries: BTreeMap<NaiveDate, FlowEntry>,
}

impl FlowLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        FlowLedger {
            entries: BTreeMap::new(),
        }
    }

    /// Records a flow on `date`.
    ///
    /// A zero amount is a no-op. Negative draws are rejected; negative
    /// repayments are accepted as corrections. With `overwrite` the matching
    /// component of the day's entry is replaced instead of added to.
    pub fn add_flow(
        &mut self,
        date: NaiveDate,
        amount: Money,
        kind: FlowKind,
        overwrite: bool,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if kind == FlowKind::Payment && amount.is_negative() {
            return Err(ScheduleError::NegativePayment { date, amount });
        }

        let entry = self
            .entries
            .entry(date)
            .or_insert_with(|| FlowEntry::new(date));
        let component = match kind {
            FlowKind::Payment => &mut entry.payment,
            FlowKind::Repayment => &mut entry.repayment,
        };
        if overwrite {
            *component = amount;
        } else {
            *component += amount;
        }

        debug!("{:?} of {} recorded on {}", kind, amount, date);
        Ok(())
    }

    /// Records a draw on `date`.
    pub fn add_payment(&mut self, date: NaiveDate, amount: Money, overwrite: bool) -> Result<()> {
        self.add_flow(date, amount, FlowKind::Payment, overwrite)
    }

    /// Records a repayment on `date`.
    pub fn add_repayment(&mut self, date: NaiveDate, amount: Money, overwrite: bool) -> Result<()> {
        self.add_flow(date, amount, FlowKind::Repayment, overwrite)
    }

    /// Books capital scheduled by a repayment style on top of any repayment
    /// already recorded that day.
    pub(crate) fn schedule_repayment(&mut self, date: NaiveDate, amount: Money) {
        if amount.is_zero() {
            return;
        }
        self.entries
            .entry(date)
            .or_insert_with(|| FlowEntry::new(date))
            .repayment += amount;
    }

    /// Returns the entry recorded on `date`, if any.
    pub fn get(&self, date: NaiveDate) -> Option<&FlowEntry> {
        self.entries.get(&date)
    }

    /// Iterates over entries in ascending date order.
    pub fn entries(&self) -> impl Iterator<Item = &FlowEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all draws.
    pub fn total_payments(&self) -> Money {
        self.entries().map(|e| e.payment).sum()
    }

    /// Sum of all repayments.
    pub fn total_repayments(&self) -> Money {
        self.entries().map(|e| e.repayment).sum()
    }

    /// Total net principal: draws minus repayments.
    pub fn net_principal(&self) -> Money {
        self.total_payments() - self.total_repayments()
    }

    /// Net balance of every flow dated on or before `date`.
    pub fn balance_through(&self, date: NaiveDate) -> Money {
        self.entries.range(..=date).map(|(_, e)| e.balance()).sum()
    }

    /// Sum of repayments dated within `[first, last]`.
    pub fn repayments_between(&self, first: NaiveDate, last: NaiveDate) -> Money {
        self.entries
            .range(first..=last)
            .map(|(_, e)| e.repayment)
            .sum()
    }

    /// Derives the engagement timeline.
    ///
    /// Walks the entries in date order accumulating the running balance and
    /// records it on the day after each flow.
    pub fn engagements(&self) -> EngagementTimeline {
        let mut points = BTreeMap::new();
        let mut running = Money::ZERO;

        for entry in self.entries() {
            running += entry.balance();
            points.insert(entry.date + Duration::days(1), running);
        }

        EngagementTimeline { points }
    }
}

/// Outstanding balance as a step function of the date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementTimeline {
    points: BTreeMap<NaiveDate, Money>,
}

impl EngagementTimeline {
    /// Engagement on `date`: the value at the latest point `<= date`, or zero
    /// before the first point.
    pub fn at(&self, date: NaiveDate) -> Money {
        self.points
            .range(..=date)
            .next_back()
            .map(|(_, value)| *value)
            .unwrap_or(Money::ZERO)
    }

    /// Iterates over `(effective date, balance)` change points.
    pub fn points(&self) -> impl Iterator<Item = (&NaiveDate, &Money)> {
        self.points.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
