//! Credit schedule orchestration.
//!
//! A [`Schedule`] owns the flow ledger, the rate timeline, the window and the
//! installment series. [`Schedule::calc`] is the single point where derived
//! state (engagement timeline, installment amounts) is recomputed.

use crate::accrual::{accrue_interest, compress_ticks, AccrualBasis, Tick};
use crate::error::{Result, ScheduleError};
use crate::installment::{Installment, InstallmentSeries};
use crate::ledger::{EngagementTimeline, FlowLedger};
use crate::money::Money;
use crate::period::{Period, PeriodType, ScheduleWindow};
use crate::rates::RateTimeline;
use crate::repayment::{CapitalContext, RepaymentStyle};
use chrono::{Duration, NaiveDate};
use log::debug;
use rust_decimal::Decimal;

/// Period-by-period amortization schedule of a credit.
///
/// # Lifecycle
///
/// Constructed once with an initial draw and rate; flows and rates may be
/// added any number of times, then [`Schedule::calc`] derives every
/// installment. `calc` is idempotent and always overwrites previous results.
///
/// Mutators and `calc` take `&mut self`, so a schedule shared across threads
/// must be serialized by the caller; a calculated schedule can be read from
/// any number of shared references.
#[derive(Debug, Clone)]
pub struct Schedule {
    window: ScheduleWindow,
    period_type: PeriodType,
    first_repayment_date: Option<NaiveDate>,
    style: RepaymentStyle,
    basis: AccrualBasis,
    flows: FlowLedger,
    rates: RateTimeline,
    engagements: EngagementTimeline,
    installments: InstallmentSeries,
}

impl Schedule {
    /// Creates a schedule starting the day after `today`.
    ///
    /// The initial draw of `principal` and the initial `rate` are registered
    /// on `today`, so both are in effect from the first schedule day.
    pub fn new(
        principal: Money,
        rate: Decimal,
        today: NaiveDate,
        end: NaiveDate,
        period_type: PeriodType,
    ) -> Result<Self> {
        let window = ScheduleWindow::new(today + Duration::days(1), end)?;

        let mut flows = FlowLedger::new();
        flows.add_payment(today, principal, false)?;
        let mut rates = RateTimeline::new();
        rates.add_rate(today, rate)?;

        let installments = InstallmentSeries::build(&window, period_type);
        debug!(
            "Schedule {}..{} ({}) with {} installments",
            window.start,
            window.end,
            period_type,
            installments.len()
        );

        Ok(Schedule {
            window,
            period_type,
            first_repayment_date: None,
            style: RepaymentStyle::default(),
            basis: AccrualBasis::default(),
            flows,
            rates,
            engagements: EngagementTimeline::default(),
            installments,
        })
    }

    /// Same as [`Schedule::new`] with the granularity given as a plan token
    /// (`monthly`, `quarterly`, `halfYearly`, `yearly`).
    pub fn with_period_token(
        principal: Money,
        rate: Decimal,
        today: NaiveDate,
        end: NaiveDate,
        token: &str,
    ) -> Result<Self> {
        let period_type = token.parse::<PeriodType>()?;
        Schedule::new(principal, rate, today, end, period_type)
    }

    // ----- flows and rates -----

    /// Registers a draw on `date`, adding to (or with `overwrite`, replacing)
    /// the draw already recorded that day.
    pub fn add_payment(&mut self, date: NaiveDate, amount: Money, overwrite: bool) -> Result<()> {
        self.flows.add_payment(date, amount, overwrite)
    }

    /// Registers a repayment on `date`. Negative amounts act as corrections.
    pub fn add_repayment(&mut self, date: NaiveDate, amount: Money, overwrite: bool) -> Result<()> {
        self.flows.add_repayment(date, amount, overwrite)
    }

    /// Sets the annual rate effective from `date`.
    pub fn add_rate(&mut self, date: NaiveDate, rate: Decimal) -> Result<()> {
        self.rates.add_rate(date, rate)
    }

    // ----- window and options -----

    /// Moves the first schedule day and rebuilds the installment series.
    pub fn set_start(&mut self, start: NaiveDate) -> Result<()> {
        self.set_window(ScheduleWindow::new(start, self.window.end)?)
    }

    /// Moves the last schedule day and rebuilds the installment series.
    pub fn set_end(&mut self, end: NaiveDate) -> Result<()> {
        self.set_window(ScheduleWindow::new(self.window.start, end)?)
    }

    fn set_window(&mut self, window: ScheduleWindow) -> Result<()> {
        if let Some(date) = self.first_repayment_date {
            check_first_repayment(date, &window)?;
        }
        self.window = window;
        self.installments = InstallmentSeries::build(&window, self.period_type);
        self.engagements = EngagementTimeline::default();
        Ok(())
    }

    /// Sets the grace boundary: installments ending before `date` repay no
    /// capital under the automatic styles.
    pub fn set_first_repayment_date(&mut self, date: NaiveDate) -> Result<()> {
        check_first_repayment(date, &self.window)?;
        self.first_repayment_date = Some(date);
        Ok(())
    }

    pub fn clear_first_repayment_date(&mut self) {
        self.first_repayment_date = None;
    }

    /// Selects day-exact accrual (`true`) or period-level accrual (`false`).
    pub fn set_is_calc_daily(&mut self, daily: bool) {
        self.basis = if daily {
            AccrualBasis::Daily
        } else {
            AccrualBasis::Period
        };
    }

    pub fn set_repayment_style(&mut self, style: RepaymentStyle) {
        self.style = style;
    }

    pub fn set_manual(&mut self) {
        self.style = RepaymentStyle::Manual;
    }

    pub fn set_linear(&mut self) {
        self.style = RepaymentStyle::Linear;
    }

    pub fn set_balloon(&mut self) {
        self.style = RepaymentStyle::Balloon;
    }

    pub fn set_annuity(&mut self, first_capital: Option<Money>) {
        self.style = RepaymentStyle::Annuity { first_capital };
    }

    // ----- calculation -----

    /// Derives the engagement timeline and every installment's interest and
    /// capital, in installment order.
    ///
    /// Capital scheduled by an automatic style is booked as a repayment on
    /// the installment's last day of a working copy of the ledger, so later
    /// installments accrue on the reduced balance. The caller's ledger is
    /// never modified.
    pub fn calc(&mut self) {
        self.installments.reset();

        let principal = self.flows.net_principal();
        let mut working = self.flows.clone();
        let mut engagements = working.engagements();
        let mut annuity = self.style.annuity_state();

        let periods: Vec<Period> = self.installments.iter().map(|i| i.period().clone()).collect();
        let eligible_total = periods
            .iter()
            .filter(|p| is_eligible(p, self.first_repayment_date))
            .count() as u32;
        let mut eligible_left = eligible_total;
        let mut scheduled = Money::ZERO;

        for (index, period) in periods.iter().enumerate() {
            let ticks = compress_ticks(period.first_day, period.last_day, &engagements, &self.rates);
            let interest = accrue_interest(period, &ticks, self.basis);
            let eligible = is_eligible(period, self.first_repayment_date);

            let ctx = CapitalContext {
                period,
                interest,
                rate: self.rates.rate_at(period.first_day),
                principal,
                remaining: principal - scheduled,
                outstanding: working.balance_through(period.last_day),
                eligible,
                eligible_total,
                eligible_left,
                registered_repayments: self
                    .flows
                    .repayments_between(period.first_day, period.last_day),
            };
            let capital = self.style.capital(&ctx, &mut annuity);

            debug!(
                "{} #{}: {} tick(s), interest {}, capital {}",
                period.name,
                index + 1,
                ticks.len(),
                interest,
                capital
            );

            if let Some(installment) = self.installments.get_mut(index) {
                installment.set_amounts(interest, capital);
            }
            if eligible {
                eligible_left = eligible_left.saturating_sub(1);
            }
            scheduled += capital;

            if self.style.schedules_capital() && !capital.is_zero() {
                working.schedule_repayment(period.last_day, capital);
                engagements = working.engagements();
            }
        }

        self.engagements = engagements;
    }

    // ----- accessors -----

    pub fn start(&self) -> NaiveDate {
        self.window.start
    }

    pub fn end(&self) -> NaiveDate {
        self.window.end
    }

    pub fn window(&self) -> ScheduleWindow {
        self.window
    }

    pub fn period_type(&self) -> PeriodType {
        self.period_type
    }

    pub fn first_repayment_date(&self) -> Option<NaiveDate> {
        self.first_repayment_date
    }

    pub fn repayment_style(&self) -> RepaymentStyle {
        self.style
    }

    pub fn is_calc_daily(&self) -> bool {
        self.basis == AccrualBasis::Daily
    }

    pub fn flows(&self) -> &FlowLedger {
        &self.flows
    }

    pub fn rates(&self) -> &RateTimeline {
        &self.rates
    }

    pub fn installments(&self) -> &InstallmentSeries {
        &self.installments
    }

    /// Looks up an installment by period name.
    pub fn installment(&self, name: &str) -> Option<&Installment> {
        self.installments.get(name)
    }

    /// Returns the installment covering `date`.
    pub fn installment_for_date(&self, date: NaiveDate) -> Result<&Installment> {
        self.installments.for_date(date)
    }

    /// Net principal: all draws minus all registered repayments.
    pub fn principal(&self) -> Money {
        self.flows.net_principal()
    }

    pub fn total_interest(&self) -> Money {
        self.installments.total_interest()
    }

    pub fn total_capital(&self) -> Money {
        self.installments.total_capital()
    }

    pub fn total(&self) -> Money {
        self.installments.total()
    }

    pub fn rate_at(&self, date: NaiveDate) -> Decimal {
        self.rates.rate_at(date)
    }

    /// Outstanding balance on `date` as derived by the last [`Schedule::calc`],
    /// including capital scheduled by the repayment style.
    pub fn capital_engagement_at(&self, date: NaiveDate) -> Money {
        self.engagements.at(date)
    }

    /// Run-compressed rate and engagement history over `[from, to]`.
    pub fn rate_engagement_report(&self, from: NaiveDate, to: NaiveDate) -> Vec<Tick> {
        compress_ticks(from, to, &self.engagements, &self.rates)
    }
}

fn is_eligible(period: &Period, first_repayment_date: Option<NaiveDate>) -> bool {
    first_repayment_date.map_or(true, |date| period.last_day >= date)
}

fn check_first_repayment(date: NaiveDate, window: &ScheduleWindow) -> Result<()> {
    if window.contains(date) {
        Ok(())
    } else {
        Err(ScheduleError::FirstRepaymentExceedsSchedule {
            date,
            start: window.start,
            end: window.end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year_2020() -> Schedule {
        Schedule::new(
            Money::from_units(1000),
            dec!(0.05),
            date(2019, 12, 31),
            date(2020, 12, 31),
            PeriodType::Month,
        )
        .unwrap()
    }

    #[test]
    fn test_start_is_day_after_today() {
        let schedule = year_2020();
        assert_eq!(schedule.start(), date(2020, 1, 1));
        assert_eq!(schedule.end(), date(2020, 12, 31));
        assert_eq!(schedule.installments().len(), 12);
        assert_eq!(schedule.principal(), Money::from_units(1000));
    }

    #[test]
    fn test_constructor_validation() {
        let err = Schedule::new(
            Money::from_units(1000),
            dec!(0.05),
            date(2020, 12, 30),
            date(2020, 12, 31),
            PeriodType::Month,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::StartIsLaterOrEqualToEnd { .. }));

        let err = Schedule::new(
            Money::from_units(1000),
            dec!(-0.05),
            date(2019, 12, 31),
            date(2020, 12, 31),
            PeriodType::Month,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::NegativeRate { .. }));

        let err = Schedule::with_period_token(
            Money::from_units(1000),
            dec!(0.05),
            date(2019, 12, 31),
            date(2020, 12, 31),
            "weekly",
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownPeriodType { .. }));
    }

    #[test]
    fn test_balloon_full_year() {
        let mut schedule = year_2020();
        schedule.set_balloon();
        schedule.calc();

        let installments = schedule.installments().as_slice();
        for installment in &installments[..11] {
            assert_eq!(installment.capital(), Money::ZERO);
        }
        assert_eq!(installments[11].capital(), Money::from_units(1000));
        // 1000 * 5% / 12 every month
        assert_eq!(installments[0].interest().to_string(), "4.17");
        assert_eq!(schedule.total_capital(), Money::from_units(1000));
    }

    #[test]
    fn test_linear_reduces_engagement() {
        let mut schedule = year_2020();
        schedule.set_linear();
        schedule.calc();

        let first = schedule.installment("2020M01").unwrap();
        assert_eq!(first.capital().to_string(), "83.33");
        assert_eq!(schedule.capital_engagement_at(date(2020, 1, 31)), Money::from_units(1000));
        assert_eq!(schedule.capital_engagement_at(date(2020, 2, 1)).to_string(), "916.67");
        assert_eq!(schedule.installment("2020M12").unwrap().capital().to_string(), "83.37");
        assert_eq!(schedule.total_capital(), Money::from_units(1000));
        assert_eq!(schedule.capital_engagement_at(date(2021, 1, 1)), Money::ZERO);
    }

    #[test]
    fn test_grace_period_is_interest_only() {
        let mut schedule = year_2020();
        schedule.set_first_repayment_date(date(2020, 7, 15)).unwrap();
        schedule.set_linear();
        schedule.calc();

        for name in ["2020M01", "2020M06"] {
            let installment = schedule.installment(name).unwrap();
            assert_eq!(installment.capital(), Money::ZERO);
            assert!(!installment.interest().is_zero());
        }
        assert_eq!(schedule.installment("2020M07").unwrap().capital().to_string(), "166.66");
        assert_eq!(schedule.installment("2020M12").unwrap().capital().to_string(), "166.70");
        assert_eq!(schedule.total_capital(), Money::from_units(1000));
    }

    #[test]
    fn test_first_repayment_outside_window() {
        let mut schedule = year_2020();
        let err = schedule.set_first_repayment_date(date(2021, 1, 1)).unwrap_err();
        assert!(matches!(err, ScheduleError::FirstRepaymentExceedsSchedule { .. }));

        schedule.set_first_repayment_date(date(2020, 11, 1)).unwrap();
        let err = schedule.set_end(date(2020, 10, 31)).unwrap_err();
        assert!(matches!(err, ScheduleError::FirstRepaymentExceedsSchedule { .. }));
        assert_eq!(schedule.end(), date(2020, 12, 31));
    }

    #[test]
    fn test_window_setters_rebuild_series() {
        let mut schedule = year_2020();
        schedule.set_end(date(2021, 6, 30)).unwrap();
        assert_eq!(schedule.installments().len(), 18);

        schedule.set_start(date(2020, 4, 15)).unwrap();
        assert_eq!(schedule.installments().first().unwrap().name(), "2020M04");
        assert_eq!(schedule.installments().len(), 15);

        let err = schedule.set_start(date(2021, 6, 30)).unwrap_err();
        assert!(matches!(err, ScheduleError::StartIsLaterOrEqualToEnd { .. }));
    }

    #[test]
    fn test_manual_capital_from_repayments() {
        let mut schedule = year_2020();
        schedule.add_repayment(date(2020, 3, 31), Money::from_units(400), false).unwrap();
        schedule.add_repayment(date(2020, 12, 31), Money::from_units(600), false).unwrap();
        schedule.calc();

        assert_eq!(schedule.installment("2020M03").unwrap().capital(), Money::from_units(400));
        assert_eq!(schedule.installment("2020M12").unwrap().capital(), Money::from_units(600));
        assert_eq!(schedule.total_capital(), Money::from_units(1000));
        assert_eq!(schedule.capital_engagement_at(date(2020, 4, 1)), Money::from_units(600));
    }

    #[test]
    fn test_calc_is_idempotent() {
        let mut schedule = year_2020();
        schedule.add_rate(date(2020, 6, 1), dec!(0.08)).unwrap();
        schedule.set_annuity(None);
        schedule.calc();
        let first: Vec<Installment> = schedule.installments().iter().cloned().collect();
        schedule.calc();
        let second: Vec<Installment> = schedule.installments().iter().cloned().collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_linear_waits_for_late_draw() {
        let mut schedule = year_2020();
        schedule.add_payment(date(2020, 11, 1), Money::from_units(11_000), false).unwrap();
        schedule.set_linear();
        schedule.calc();

        assert_eq!(schedule.installment("2020M01").unwrap().capital(), Money::from_units(1000));
        for name in ["2020M02", "2020M06", "2020M10"] {
            let installment = schedule.installment(name).unwrap();
            assert_eq!(installment.capital(), Money::ZERO, "{name}");
            assert!(!installment.interest().is_negative(), "{name}");
        }
        assert_eq!(schedule.installment("2020M11").unwrap().capital(), Money::from_units(1000));
        assert_eq!(schedule.installment("2020M12").unwrap().capital(), Money::from_units(10_000));
        assert_eq!(schedule.total_capital(), Money::from_units(12_000));

        let mut day = date(2020, 1, 1);
        while day <= date(2021, 1, 1) {
            assert!(!schedule.capital_engagement_at(day).is_negative(), "{day}");
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_annuity_high_rate_over_long_horizon() {
        let mut schedule = Schedule::new(
            Money::from_units(1_000_000),
            dec!(2.0),
            date(2019, 12, 31),
            date(2049, 12, 31),
            PeriodType::Month,
        )
        .unwrap();
        schedule.set_annuity(None);
        schedule.calc();

        assert_eq!(schedule.installments().len(), 360);
        assert_eq!(schedule.total_capital(), Money::from_units(1_000_000));
        assert!(schedule.installments().iter().all(|i| !i.capital().is_negative()));
    }

    #[test]
    fn test_daily_flag() {
        let mut schedule = year_2020();
        assert!(!schedule.is_calc_daily());
        schedule.set_is_calc_daily(true);
        assert!(schedule.is_calc_daily());
        schedule.set_balloon();
        schedule.calc();

        // 1000 * 5% * 31 / 366
        assert_eq!(schedule.installment("2020M01").unwrap().interest().to_string(), "4.23");
    }

    #[test]
    fn test_rate_engagement_report() {
        let mut schedule = year_2020();
        schedule.add_rate(date(2020, 1, 20), dec!(0.07)).unwrap();
        schedule.calc();

        let report = schedule.rate_engagement_report(date(2019, 12, 30), date(2020, 1, 31));
        let shape: Vec<_> = report.iter().map(|t| (t.days, t.engagement, t.rate)).collect();
        assert_eq!(
            shape,
            vec![
                (1, Money::ZERO, Decimal::ZERO),
                (1, Money::ZERO, dec!(0.05)),
                (19, Money::from_units(1000), dec!(0.05)),
                (12, Money::from_units(1000), dec!(0.07)),
            ]
        );
    }
}
