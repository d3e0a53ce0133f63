//! Interest accrual over an installment window.
//!
//! The window is sampled day by day; consecutive days sharing the same
//! `(engagement, rate)` pair collapse into one [`Tick`]. Tick weights are the
//! share of the window each run covers and always sum to exactly one.

use crate::ledger::EngagementTimeline;
use crate::money::Money;
use crate::period::{days_between, Period};
use crate::rates::RateTimeline;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A maximal run of days with identical engagement and rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub days: u32,
    pub engagement: Money,
    pub rate: Decimal,
    /// Share of the sampled window covered by this run.
    pub weight: Decimal,
}

/// Day-count basis used to turn a weighted rate into period interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AccrualBasis {
    /// Fraction of the period's share of a year (`percent_of_year`),
    /// prorated for a clipped bucket.
    #[default]
    Period,

    /// Actual days over the actual days of the year (365 or 366).
    Daily,
}

/// Compresses `[first, last]` into ticks.
///
/// Returns an empty vector when `first > last`.
pub fn compress_ticks(
    first: NaiveDate,
    last: NaiveDate,
    engagements: &EngagementTimeline,
    rates: &RateTimeline,
) -> Vec<Tick> {
    let mut ticks: Vec<Tick> = Vec::new();
    if first > last {
        return ticks;
    }

    for day in first.iter_days().take_while(|d| *d <= last) {
        let engagement = engagements.at(day);
        let rate = rates.rate_at(day);

        match ticks.last_mut() {
            Some(tick) if tick.engagement == engagement && tick.rate == rate => {
                tick.last_day = day;
                tick.days += 1;
            }
            _ => ticks.push(Tick {
                first_day: day,
                last_day: day,
                days: 1,
                engagement,
                rate,
                weight: Decimal::ZERO,
            }),
        }
    }

    normalize_weights(&mut ticks, days_between(first, last));
    ticks
}

/// Sets `weight = days / total_days` and hands the rounding residual to the
/// last tick so the weights sum to exactly one.
fn normalize_weights(ticks: &mut [Tick], total_days: u32) {
    let total = Decimal::from(total_days);
    let mut assigned = Decimal::ZERO;

    if let Some((last, rest)) = ticks.split_last_mut() {
        for tick in rest {
            tick.weight = Decimal::from(tick.days) / total;
            assigned += tick.weight;
        }
        last.weight = Decimal::ONE - assigned;
    }
}

/// Interest accrued over `period` given its ticks.
pub fn accrue_interest(period: &Period, ticks: &[Tick], basis: AccrualBasis) -> Money {
    let weighted: Decimal = ticks
        .iter()
        .map(|t| t.weight * t.engagement.amount() * t.rate)
        .sum();

    let year_fraction = match basis {
        AccrualBasis::Daily => {
            Decimal::from(period.length) / Decimal::from(period.days_in_year())
        }
        AccrualBasis::Period => period.percent_of_year * period.percent_of_bucket,
    };

    Money::new(weighted * year_fraction)
}
