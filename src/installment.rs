//! Installments and the ordered, gapless installment series.

use crate::error::{Result, ScheduleError};
use crate::money::Money;
use crate::period::{Period, PeriodType, ScheduleWindow};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// One period's accrual unit.
///
/// Amounts are written only by the schedule calculation; callers get
/// read-only access.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Installment {
    order: usize,
    period: Period,
    interest: Money,
    capital: Money,
}

impl Installment {
    fn new(order: usize, period: Period) -> Self {
        Installment {
            order,
            period,
            interest: Money::ZERO,
            capital: Money::ZERO,
        }
    }

    /// 1-based position in the series.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn name(&self) -> &str {
        &self.period.name
    }

    pub fn first_day(&self) -> NaiveDate {
        self.period.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.period.last_day
    }

    pub fn length(&self) -> u32 {
        self.period.length
    }

    pub fn interest(&self) -> Money {
        self.interest
    }

    pub fn capital(&self) -> Money {
        self.capital
    }

    /// Interest plus capital.
    pub fn total(&self) -> Money {
        self.interest + self.capital
    }

    pub(crate) fn set_amounts(&mut self, interest: Money, capital: Money) {
        self.interest = interest;
        self.capital = capital;
    }
}

/// Installments covering a schedule window, in calendar order.
///
/// # Invariants
///
/// - the first installment starts on `window.start`, the last ends on `window.end`
/// - `installment[i].last_day + 1 == installment[i + 1].first_day`
/// - `installment[i].order() == i + 1`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallmentSeries {
    installments: Vec<Installment>,
    by_name: HashMap<String, usize>,
}

impl InstallmentSeries {
    /// Builds the series by stepping one bucket at a time from `window.start`
    /// until no further period fits in the window.
    pub fn build(window: &ScheduleWindow, period_type: PeriodType) -> Self {
        let mut series = InstallmentSeries::default();
        let mut anchor = Some(window.start);

        while let Some(period) = anchor.and_then(|a| Period::containing(a, window, period_type)) {
            anchor = period.next_anchor();
            let order = series.installments.len() + 1;
            debug!(
                "Installment {} {} covers {}..{}",
                order, period.name, period.first_day, period.last_day
            );
            series.by_name.insert(period.name.clone(), order - 1);
            series.installments.push(Installment::new(order, period));
        }

        series
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Installment> {
        self.installments.iter()
    }

    pub fn as_slice(&self) -> &[Installment] {
        &self.installments
    }

    pub fn first(&self) -> Option<&Installment> {
        self.installments.first()
    }

    pub fn last(&self) -> Option<&Installment> {
        self.installments.last()
    }

    /// Looks up an installment by period name, e.g. `2020M02`.
    pub fn get(&self, name: &str) -> Option<&Installment> {
        self.by_name
            .get(name)
            .and_then(|idx| self.installments.get(*idx))
    }

    /// Returns the installment whose period covers `date`.
    pub fn for_date(&self, date: NaiveDate) -> Result<&Installment> {
        self.installments
            .iter()
            .find(|i| i.period.contains(date))
            .ok_or(ScheduleError::InstallmentNotFound { date })
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Installment> {
        self.installments.get_mut(index)
    }

    /// Clears every computed amount.
    pub(crate) fn reset(&mut self) {
        for installment in &mut self.installments {
            installment.set_amounts(Money::ZERO, Money::ZERO);
        }
    }

    pub fn total_interest(&self) -> Money {
        self.iter().map(|i| i.interest).sum()
    }

    pub fn total_capital(&self) -> Money {
        self.iter().map(|i| i.capital).sum()
    }

    pub fn total(&self) -> Money {
        self.total_interest() + self.total_capital()
    }
}
